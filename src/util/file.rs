use std::path::{Path, PathBuf};

/// Locate a file inside a directory, tolerating case mismatches.
///
/// Beatmap archives regularly reference their audio with the wrong case
/// ("Audio.mp3" on disk, "audio.mp3" in the chart). This tries:
/// 1. The exact name
/// 2. The lowercased name
/// 3. A directory scan comparing names case-insensitively
pub fn find_file_case_insensitive(dir: &Path, filename: &str) -> Option<PathBuf> {
    let exact = dir.join(filename);
    if exact.is_file() {
        return Some(exact);
    }

    let lower = dir.join(filename.to_lowercase());
    if lower.is_file() {
        return Some(lower);
    }

    for entry in std::fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if path.is_file()
            && entry
                .file_name()
                .to_string_lossy()
                .eq_ignore_ascii_case(filename)
        {
            return Some(path);
        }
    }

    None
}
