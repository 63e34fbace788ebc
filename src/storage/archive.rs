//! Research Archive
//!
//! Durable copy of saved history entries: one pretty-printed JSON file per
//! entry, named `<entry id>.json`, under the archive directory.

use crate::models::HistoryEntry;
use crate::types::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

pub struct ResearchArchive {
    dir: PathBuf,
}

impl ResearchArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, id: &str) -> AppResult<PathBuf> {
        // Ids are uuids; anything that could escape the directory is refused.
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(AppError::InvalidRequest(format!("Invalid entry id: {}", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    pub async fn save(&self, entry: &HistoryEntry) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.entry_path(&entry.id)?;
        let content = serde_json::to_string_pretty(entry)?;
        fs::write(&path, content).await?;

        info!(entry_id = %entry.id, path = ?path, "Archived research entry");
        Ok(path)
    }

    pub async fn load(&self, id: &str) -> AppResult<HistoryEntry> {
        let path = self.entry_path(id)?;
        if !path.exists() {
            return Err(AppError::NotFound(format!("archived entry {}", id)));
        }
        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Remove an archived entry. Returns false when there was nothing to remove.
    pub async fn remove(&self, id: &str) -> AppResult<bool> {
        let path = self.entry_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(entry_id = %id, "Removed archived research entry");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Every readable entry in the archive. Unreadable files are skipped.
    pub async fn list(&self) -> AppResult<Vec<HistoryEntry>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let parsed = match fs::read_to_string(&path).await {
                Ok(content) => serde_json::from_str::<HistoryEntry>(&content).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match parsed {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(path = ?path, error = %e, "Skipping unreadable archive file"),
            }
        }

        entries.sort_by(|a, b| b.session.timestamp.cmp(&a.session.timestamp));
        Ok(entries)
    }
}
