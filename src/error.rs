use std::path::PathBuf;

use thiserror::Error;

/// Per-beatmap failure taxonomy. Every variant is terminal for the item it
/// occurred on; the batch drivers log it and move to the next archive.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("not a valid beatmap archive: {path}")]
    MalformedArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("no .osu chart found in {archive}")]
    MissingChartFile { archive: PathBuf },

    #[error("audio file '{name}' not found in {archive}")]
    MissingAudioFile { archive: PathBuf, name: String },

    #[error("cannot read audio duration: {path}")]
    UnreadableAudio {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    #[error("invalid timing point: {0}")]
    InvalidBreakpoint(String),
}
