mod app_dir;
mod preferences;
mod script;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use panbrot_render::{export_png, Explorer, RenderError, SnapshotMetadata};

use preferences::AppPreferences;
use script::{Replay, ScriptStep};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("failed to read script {}: {source}", .path.display())]
    ReadScript {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid script {}: {source}", .path.display())]
    ParseScript {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to create {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("nothing to snapshot: the surface was never sized")]
    NoSurface,
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Parser, Debug)]
#[command(
    name = "panbrot",
    about = "Replay a scripted pan/zoom session through the Mandelbrot explorer and save the result"
)]
struct Cli {
    /// JSON script of input steps. Without one the default view is rendered.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Surface width in layout units (overrides preferences).
    #[arg(long)]
    width: Option<f64>,

    /// Surface height in layout units (overrides preferences).
    #[arg(long)]
    height: Option<f64>,

    /// Device pixel ratio (overrides preferences).
    #[arg(long)]
    dpr: Option<f64>,

    /// Where to write the final visible surface as PNG.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Preferences file. Defaults to `preferences.json` next to the executable.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let prefs_path = cli.config.clone().unwrap_or_else(app_dir::preferences_path);
    let prefs = AppPreferences::load(&prefs_path);

    let steps = match &cli.script {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };

    let mut replay = Replay::new(Explorer::new(prefs.explorer));
    replay.resize(
        cli.width.unwrap_or(prefs.surface_width),
        cli.height.unwrap_or(prefs.surface_height),
        cli.dpr.unwrap_or(prefs.device_pixel_ratio),
    );
    replay.run(&steps);
    replay.settle();

    let explorer = replay.explorer();
    info!(steps = steps.len(), frames = replay.frames(), "Replay finished");
    info!("{}", explorer.status_line());

    let output = match cli.output {
        Some(path) => path,
        None => {
            let dir = app_dir::images_directory();
            std::fs::create_dir_all(&dir).map_err(|source| AppError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            dir.join(&prefs.snapshot_name)
        }
    };

    let Some(surface) = explorer.surface() else {
        return Err(AppError::NoSurface);
    };
    let metadata = SnapshotMetadata::new(*explorer.view(), surface.device_pixel_ratio);
    export_png(&output, replay.visible(), &metadata)?;
    info!("Wrote {}", output.display());
    Ok(())
}

fn load_script(path: &Path) -> Result<Vec<ScriptStep>, AppError> {
    let json = std::fs::read_to_string(path).map_err(|source| AppError::ReadScript {
        path: path.to_path_buf(),
        source,
    })?;
    script::parse(&json).map_err(|source| AppError::ParseScript {
        path: path.to_path_buf(),
        source,
    })
}
