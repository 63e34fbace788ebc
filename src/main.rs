use clap::{Parser, Subcommand};
use deep_research::{
    config::Config,
    create_router,
    models::{AppState, Phase},
    settings::SettingsStorage,
    utils::init_logger,
    ResearchService, RunOutcome,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API for the browser front end
    Serve,
    /// Run one research session in the foreground and print the answer
    Ask {
        /// The research question
        query: String,

        /// Override the pause between simulated steps
        #[arg(long)]
        step_delay_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Ask {
            query,
            step_delay_ms,
        } => {
            if let Some(ms) = step_delay_ms {
                config.pipeline.step_delay_ms = ms;
            }
            ask(config, &query).await
        }
    }
}

fn build_service(config: &Config) -> anyhow::Result<(Arc<ResearchService>, Arc<SettingsStorage>)> {
    let settings = Arc::new(SettingsStorage::new(config.storage.settings_path()));
    let service = ResearchService::from_config(config, settings.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialise research service: {}", e))?;
    Ok((Arc::new(service), settings))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let (service, settings) = build_service(&config)?;
    service.restore_history().await?;

    let state = AppState {
        config: config.clone(),
        service,
        settings,
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn ask(config: Config, query: &str) -> anyhow::Result<()> {
    let (service, _settings) = build_service(&config)?;
    let ticket = service.start(query)?;

    // Echo phase progress while the run is in flight.
    let store = service.store().clone();
    let watcher = tokio::spawn(async move {
        let mut last = (String::new(), String::new());
        loop {
            let snapshot = store.snapshot();
            let research = &snapshot.research_agent.current_step;
            let drafting = &snapshot.drafting_agent.current_step;
            if *research != last.0 && !research.is_empty() {
                info!(phase = ?Phase::Research, progress = snapshot.research_agent.progress, "{}", research);
            }
            if *drafting != last.1 && !drafting.is_empty() {
                info!(phase = ?Phase::Drafting, progress = snapshot.drafting_agent.progress, "{}", drafting);
            }
            last = (research.clone(), drafting.clone());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    });

    let outcome = service.run(ticket).await;
    watcher.abort();

    match outcome {
        RunOutcome::Completed(entry) => {
            println!("{}\n", entry.session.answer);
            println!("Sources:");
            for (i, source) in entry.session.sources.iter().enumerate() {
                println!(
                    "  {}. {} ({:.2})\n     {}",
                    i + 1,
                    source.title,
                    source.relevance_score,
                    source.url
                );
            }
            Ok(())
        }
        RunOutcome::Failed(e) => Err(anyhow::anyhow!(e.user_message())),
        RunOutcome::Superseded => Err(anyhow::anyhow!("Research run was cancelled")),
    }
}
