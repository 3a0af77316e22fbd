//! Config — a TOML file under the user's config dir, overlaid by environment variables.

use crate::error::{ScanError, ScanResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const API_URL_ENV: &str = "MEDSCAN_API_URL";
pub const VISION_MODEL_ENV: &str = "MEDSCAN_VISION_MODEL";
pub const TEXT_MODEL_ENV: &str = "MEDSCAN_TEXT_MODEL";
pub const STAGING_DIR_ENV: &str = "MEDSCAN_STAGING_DIR";

const MISSING_KEY: &str = "OpenAI API Key is missing.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service credential. Usually supplied through `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Model used for the image analysis; must accept image input.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    /// Text-only model used for the simplified explanation.
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_vision_model() -> String {
    "gpt-4-vision-preview".into()
}
fn default_text_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_max_tokens() -> u32 {
    1500
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_staging_dir() -> String {
    std::env::temp_dir().join("medscan").to_string_lossy().into_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            vision_model: default_vision_model(),
            text_model: default_text_model(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            staging_dir: default_staging_dir(),
        }
    }
}

/// Load a `.env` file into the process environment: `path`, or `./.env` when `None`.
///
/// A missing file is fine. A file that exists but cannot be read or parsed is
/// returned as the error.
pub fn load_env_file(path: Option<&Path>) -> Result<(), dotenvy::Error> {
    let loaded = match path {
        Some(p) => dotenvy::from_path(p),
        None => dotenvy::dotenv().map(drop),
    };
    match loaded {
        Err(e) if e.not_found() => Ok(()),
        other => other,
    }
}

impl Config {
    /// `<config dir>/medscan/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "medscan").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path` (or the default location when it exists), then apply
    /// environment overrides. An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> ScanResult<Self> {
        let mut config = match path {
            Some(p) => {
                let expanded = shellexpand::tilde(&p.to_string_lossy()).to_string();
                Self::from_file(Path::new(&expanded))?
            }
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> ScanResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScanError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> ScanResult<Self> {
        toml::from_str(text).map_err(|e| ScanError::Configuration(format!("invalid config: {e}")))
    }

    /// Overlay values from an environment-style lookup. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(url) = get(API_URL_ENV) {
            self.api_url = url;
        }
        if let Some(model) = get(VISION_MODEL_ENV) {
            self.vision_model = model;
        }
        if let Some(model) = get(TEXT_MODEL_ENV) {
            self.text_model = model;
        }
        if let Some(dir) = get(STAGING_DIR_ENV) {
            self.staging_dir = dir;
        }
    }

    pub fn api_key(&self) -> ScanResult<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ScanError::Configuration(MISSING_KEY.into()))
    }

    /// Checked once at startup; nothing calls the service before this passes.
    pub fn validate(&self) -> ScanResult<()> {
        self.api_key()?;
        if self.api_url.trim().is_empty() {
            return Err(ScanError::Configuration("api_url must not be empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(ScanError::Configuration("max_tokens must be greater than 0".into()));
        }
        Ok(())
    }

    /// Copy safe to print: the key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(key) = copy.api_key.as_mut() {
            *key = "***".into();
        }
        copy
    }
}
