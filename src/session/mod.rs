//! Report persistence
//!
//! Optional external store: pretty-printed JSON, one file per report id.
//! Saves are at-least-once: a failure is surfaced to the caller and must be
//! retried explicitly, and the in-memory report is never touched by a failed
//! save or load.

use std::path::PathBuf;

use tokio::fs;
use tracing::info;

use crate::error::ReportError;
use crate::report::ReportState;

pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, report_id: &str) -> Result<PathBuf, ReportError> {
        let id = report_id.trim();
        if id.is_empty() || id.contains(['/', '\\', '.']) {
            return Err(ReportError::InputValidation(format!(
                "'{report_id}' is not a usable report id"
            )));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    pub async fn save(&self, report_id: &str, state: &ReportState) -> Result<(), ReportError> {
        let path = self.path_for(report_id)?;
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| ReportError::Persistence(format!("could not serialize report: {e}")))?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ReportError::Persistence(format!("could not create store dir: {e}")))?;
        fs::write(&path, json)
            .await
            .map_err(|e| ReportError::Persistence(format!("could not write {}: {e}", path.display())))?;

        info!(report_id, "report saved");
        Ok(())
    }

    pub async fn load(&self, report_id: &str) -> Result<Option<ReportState>, ReportError> {
        let path = self.path_for(report_id)?;
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .await
            .map_err(|e| ReportError::Persistence(format!("could not read {}: {e}", path.display())))?;
        let state = serde_json::from_str(&json)
            .map_err(|e| ReportError::Persistence(format!("corrupt report file {}: {e}", path.display())))?;
        Ok(Some(state))
    }

    /// Ids of all stored reports.
    pub async fn list(&self) -> Result<Vec<String>, ReportError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| ReportError::Persistence(format!("could not list store dir: {e}")))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ReportError::Persistence(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Removes a stored report. Returns whether it existed.
    pub async fn delete(&self, report_id: &str) -> Result<bool, ReportError> {
        let path = self.path_for(report_id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .await
            .map_err(|e| ReportError::Persistence(format!("could not delete {}: {e}", path.display())))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SectionKey;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = ReportStore::new(dir.path());

        let mut state = ReportState::new();
        state.set(SectionKey::D0, "title", "Cracked housing").unwrap();
        state.set(SectionKey::D1, "leader", "Ana").unwrap();

        store.save("claim-118", &state).await.unwrap();
        let loaded = store.load("claim-118").await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        assert!(store.load("nothing-here").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let dir = tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        store.save("b", &ReportState::new()).await.unwrap();
        store.save("a", &ReportState::new()).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["a", "b"]);

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let err = store.save("../escape", &ReportState::new()).await.unwrap_err();
        assert!(matches!(err, ReportError::InputValidation(_)));
    }
}
