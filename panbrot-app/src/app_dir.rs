//! Locations next to the executable. Preferences and snapshots live beside
//! the binary so a copied build carries its own settings.

use std::path::{Path, PathBuf};

/// Directory of the running executable, or an empty (relative) path when it
/// cannot be determined, which resolves against the working directory.
pub fn exe_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Where snapshots go when no `--output` is given.
pub fn images_directory() -> PathBuf {
    exe_directory().join("images")
}

/// Default preferences file.
pub fn preferences_path() -> PathBuf {
    exe_directory().join("preferences.json")
}
