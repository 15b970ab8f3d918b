use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use panbrot_render::ExplorerConfig;

/// Host settings read at startup. The view itself is never stored; every
/// run starts from the configured default view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppPreferences {
    /// Surface width in layout units.
    pub surface_width: f64,
    /// Surface height in layout units.
    pub surface_height: f64,
    pub device_pixel_ratio: f64,
    /// Snapshot file name used when no `--output` is given.
    pub snapshot_name: String,
    pub explorer: ExplorerConfig,
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            surface_width: 800.0,
            surface_height: 600.0,
            device_pixel_ratio: 1.0,
            snapshot_name: "panbrot.png".to_string(),
            explorer: ExplorerConfig::default(),
        }
    }
}

impl AppPreferences {
    /// Load preferences from `path`, falling back to defaults.
    ///
    /// A missing file is normal; an unreadable or malformed one is logged
    /// and ignored.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No preferences file at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<AppPreferences>(&json) {
                Ok(prefs) => {
                    info!("Loaded preferences from {}", path.display());
                    prefs
                }
                Err(e) => {
                    warn!("Failed to parse preferences, using defaults: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read preferences file, using defaults: {e}");
                Self::default()
            }
        }
    }
}
