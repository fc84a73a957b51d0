/// Command-line arguments and the optional TOML settings file
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::state::viewer::DEFAULT_ZOOM_STEP;

#[derive(Parser, Debug, Default)]
#[command(name = "media-sorter", about = "Sort a folder of images into destination folders")]
pub struct Args {
    /// Folder to load at startup
    #[arg(long, env = "MEDIA_SORTER_SOURCE")]
    pub source: Option<PathBuf>,

    /// Where the catalog database lives (defaults to the platform data dir)
    #[arg(long, env = "MEDIA_SORTER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Settings file (defaults to <config dir>/media-sorter/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub autosave_interval_secs: u64,
    pub zoom_step: f32,
    pub feedback_ms: u64,
    pub error_feedback_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autosave_interval_secs: 30,
            zoom_step: DEFAULT_ZOOM_STEP,
            feedback_ms: 2000,
            error_feedback_ms: 4000,
        }
    }
}

impl Config {
    /// Read settings from `path`, or the default location when `None`.
    ///
    /// A missing file yields defaults. A file that does not parse is logged
    /// and ignored.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(default_path) {
            Some(path) => path,
            None => return Self::default(),
        };

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No config at {}, using defaults", path.display());
                return Self::default();
            }
        };

        match Self::parse(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️  Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Self>(raw).map(Self::sanitized)
    }

    /// Pull out-of-range values back to something usable.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.zoom_step > 0.0 && self.zoom_step <= 1.0) {
            self.zoom_step = defaults.zoom_step;
        }
        self.autosave_interval_secs = self.autosave_interval_secs.max(1);
        self
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("media-sorter").join("config.toml"))
}
