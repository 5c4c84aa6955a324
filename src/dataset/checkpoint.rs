use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointState {
    last_processed: Option<String>,
}

/// Resume marker for long batch runs.
///
/// Stores the file name of the last successfully processed archive as JSON.
/// Saves go through a temporary file followed by a rename, so a crash
/// mid-write leaves the previous marker intact instead of a truncated one.
#[derive(Debug)]
pub struct Checkpoint {
    path: PathBuf,
    state: CheckpointState,
}

impl Checkpoint {
    /// Load a checkpoint from disk, or start fresh if the file does not
    /// exist or cannot be parsed.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self { path, state }
    }

    /// File name of the last successfully processed archive, if any.
    pub fn last_processed(&self) -> Option<&str> {
        self.state.last_processed.as_deref()
    }

    /// Record a successfully processed archive and persist the marker.
    pub fn record(&mut self, item: &str) -> Result<()> {
        self.state.last_processed = Some(item.to_string());
        self.save()
    }

    /// Drop the marker so the next run starts from the beginning.
    pub fn clear(&mut self) -> Result<()> {
        self.state.last_processed = None;
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("cannot remove {}", self.path.display()))?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("cannot create {}", parent.display()))?;
            }
        }

        let content = serde_json::to_string_pretty(&self.state)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content).with_context(|| format!("cannot write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("cannot replace {}", self.path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_fresh_checkpoint_is_empty() {
        let dir = tempdir().expect("failed to create temp directory");
        let checkpoint = Checkpoint::load(dir.path().join("checkpoint.json"));

        assert_eq!(checkpoint.last_processed(), None);
    }

    #[test]
    fn test_record_and_reload() {
        let dir = tempdir().expect("failed to create temp directory");
        let path = dir.path().join("checkpoint.json");

        let mut checkpoint = Checkpoint::load(&path);
        checkpoint.record("song_042.osz").expect("record failed");

        let reloaded = Checkpoint::load(&path);
        assert_eq!(reloaded.last_processed(), Some("song_042.osz"));
    }

    #[test]
    fn test_corrupt_marker_starts_fresh() {
        let dir = tempdir().expect("failed to create temp directory");
        let path = dir.path().join("checkpoint.json");
        fs::write(&path, "{not json").expect("failed to write file");

        let checkpoint = Checkpoint::load(&path);
        assert_eq!(checkpoint.last_processed(), None);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempdir().expect("failed to create temp directory");
        let path = dir.path().join("checkpoint.json");

        let mut checkpoint = Checkpoint::load(&path);
        checkpoint.record("a.osz").expect("record failed");
        checkpoint.record("b.osz").expect("record failed");

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_clear_removes_marker() {
        let dir = tempdir().expect("failed to create temp directory");
        let path = dir.path().join("checkpoint.json");

        let mut checkpoint = Checkpoint::load(&path);
        checkpoint.record("a.osz").expect("record failed");
        checkpoint.clear().expect("clear failed");

        assert!(!path.exists());
        assert_eq!(Checkpoint::load(&path).last_processed(), None);
    }
}
