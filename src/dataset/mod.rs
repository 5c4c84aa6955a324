// Batch pipelines over folders of .osz archives. Each item is processed in
// isolation: one bad beatmap is logged and skipped, never aborting the run.

mod checkpoint;
mod convert;
mod info;
mod partition;
mod timing;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use checkpoint::Checkpoint;
pub use convert::{convert_directory, write_annotations};
pub use info::{SongInfoRow, export_song_info};
pub use partition::{PartitionSummary, TimingClass, partition_directory};
pub use timing::export_timing_points;

/// List the .osz archives in a directory, sorted by file name so runs are
/// deterministic and checkpoints line up between invocations.
pub(crate) fn list_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("cannot read directory {}", dir.display()))?;

    let mut archives = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_osz = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("osz"));
        if path.is_file() && is_osz {
            archives.push(path);
        }
    }
    archives.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

    Ok(archives)
}

/// Dataset identifier for an archive: its file name without the extension.
pub(crate) fn song_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
