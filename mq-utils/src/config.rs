use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "mannequin.toml";
pub const DEFAULT_MODEL_PATH: &str = "models/mannequin/scene.gltf";
pub const DEFAULT_SKIN_COLOR: &str = "#FFE0BD";
pub const DEFAULT_SCREENSHOT_PATH: &str = "ootd-fit.png";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// How a painted garment is rendered onto matching meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintMode {
    /// Flat color taken from the photo's dominant color.
    Solid,
    /// The photo itself as the base color texture.
    #[default]
    Hybrid,
}

/// Which meshes a target region selects when painting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// `UpperBody` / `LowerBody` substrings in the raw mesh name.
    #[default]
    NameMarker,
    /// The region tag assigned by the classifier.
    ClassifiedRegion,
}

/// Panel vs body paint for an incoming garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStrategy {
    Panel,
    /// Body paint for everything except shoes, which stay a panel.
    Paint,
    /// Paint when any mesh matches (never for shoes), otherwise a panel.
    #[default]
    Auto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "mannequin".to_string(),
            width: 720.0,
            height: 960.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FittingConfig {
    pub window: WindowConfig,
    pub assets_root: Option<PathBuf>,
    /// Model path, relative to the asset root.
    pub model_path: String,
    /// Image proxy endpoint; the garment URL is passed as `?url=`.
    pub proxy_endpoint: Option<String>,
    pub request_timeout_secs: u64,
    pub paint_mode: PaintMode,
    pub match_policy: MatchPolicy,
    pub strategy: FitStrategy,
    pub skin_color: String,
    /// Amplitude (radians) of the idle sway.
    pub idle_sway: f32,
    pub screenshot_path: PathBuf,
}

impl Default for FittingConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            assets_root: None,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            proxy_endpoint: None,
            request_timeout_secs: 15,
            paint_mode: PaintMode::default(),
            match_policy: MatchPolicy::default(),
            strategy: FitStrategy::default(),
            skin_color: DEFAULT_SKIN_COLOR.to_string(),
            idle_sway: 0.05,
            screenshot_path: PathBuf::from(DEFAULT_SCREENSHOT_PATH),
        }
    }
}

impl FittingConfig {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Explicit path must exist; otherwise `mannequin.toml` is used when
    /// present and defaults when not.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            Self::load(fallback)
        } else {
            Ok(Self::default())
        }
    }

    pub fn resolved_assets_root(&self) -> PathBuf {
        match &self.assets_root {
            Some(root) => root.clone(),
            None => crate::mannequin_assets_root(),
        }
    }
}
