//! Music directory scanning

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use crate::decode::AUDIO_EXTENSIONS;

/// Check whether a file has a supported audio extension
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively collect audio files under `root`, sorted by path
pub fn scan(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    scan_into(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_into(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        if path.is_dir() {
            // one unreadable subdirectory should not hide the rest
            if let Err(e) = scan_into(&path, files) {
                log::warn!("Skipping {}: {}", path.display(), e);
            }
        } else if is_audio_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Name shown for a track: its path relative to the library root
pub fn display_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}
