use deep_research::config::SearchConfig;
use deep_research::models::ResearchStatus;
use deep_research::search::TavilyClient;
use deep_research::settings::SettingsStorage;
use deep_research::storage::ResearchArchive;
use deep_research::{ResearchService, RunOutcome};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn service_for(server: &mockito::Server, dir: &TempDir) -> Arc<ResearchService> {
    let search = SearchConfig {
        api_key: "tvly-test".to_string(),
        base_url: server.url(),
        timeout_secs: 5,
        max_results: 10,
    };
    let gateway = TavilyClient::from_config(&search).expect("gateway builds");
    Arc::new(ResearchService::new(
        Arc::new(gateway),
        ResearchArchive::new(dir.path().join("archive")),
        Arc::new(SettingsStorage::with_dir(dir.path().to_path_buf())),
        Duration::ZERO,
    ))
}

#[tokio::test]
async fn climate_change_query_completes_with_ranked_answer() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "query": "climate change",
                "search_id": "s-1",
                "results": [
                    {
                        "title": "Secondary report",
                        "url": "https://example.org/secondary",
                        "content": "Regional impacts vary widely.",
                        "score": 0.4
                    },
                    {
                        "title": "Primary assessment",
                        "url": "https://example.org/primary",
                        "content": "Global temperatures have risen about 1.1C.",
                        "score": 0.8
                    }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let service = service_for(&server, &dir);

    let outcome = service.research("climate change").await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(_)));

    let snapshot = service.snapshot();
    let current = snapshot.current.expect("current session");
    assert_eq!(current.status, ResearchStatus::Complete);
    assert_eq!(current.sources.len(), 2);
    assert_eq!(snapshot.history.len(), 1);

    let primary = current
        .answer
        .find("Global temperatures have risen about 1.1C.")
        .expect("primary snippet present");
    let secondary = current
        .answer
        .find("Regional impacts vary widely.")
        .expect("secondary snippet present");
    assert!(primary < secondary);
    assert!(current.answer.contains("particular emphasis on Primary assessment"));
}

#[tokio::test]
async fn failed_search_ends_in_error_without_history() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/search")
        .with_status(401)
        .with_body("Unauthorized: missing or invalid API key.")
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let service = service_for(&server, &dir);

    let outcome = service.research("climate change").await.unwrap();
    assert!(matches!(outcome, RunOutcome::Failed(_)));

    let snapshot = service.snapshot();
    let current = snapshot.current.expect("current session");
    assert_eq!(current.status, ResearchStatus::Error);
    assert_eq!(
        current.error.as_deref(),
        Some("Tavily API error: 401 - Unauthorized: missing or invalid API key.")
    );
    assert!(snapshot.history.is_empty());
}

#[tokio::test]
async fn restarting_mid_run_keeps_only_the_latest_session() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/search")
        .with_status(200)
        .with_body(r#"{"results": []}"#)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let service = service_for(&server, &dir);

    let first = service.start("x").unwrap();
    let second = service.start("y").unwrap();
    assert!(first.cancel.is_cancelled());

    let (stale, fresh) = tokio::join!(service.run(first), service.run(second));
    assert!(matches!(stale, RunOutcome::Superseded));
    assert!(matches!(fresh, RunOutcome::Completed(_)));

    let snapshot = service.snapshot();
    assert_eq!(snapshot.current.unwrap().query, "y");
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.history[0].session.query, "y");
}
