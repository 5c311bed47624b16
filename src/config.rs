//! Configuration loader and validator for the block CMS admin core.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable that overrides `preview.secret`.
pub const PREVIEW_SECRET_ENV: &str = "BLOCKCMS_PREVIEW_SECRET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub preview: Preview,
    #[serde(default)]
    pub editor: Editor,
    pub backend: Backend,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    /// Public origin used to build absolute links, e.g. `https://cms.example.com`.
    pub origin: String,
    pub data_dir: String,
}

/// Draft preview settings.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preview {
    pub secret: String,
    /// Secrets from earlier rotations that are still accepted.
    #[serde(default)]
    pub previous_secrets: Vec<String>,
}

// Secrets stay out of logs and panics.
impl std::fmt::Debug for Preview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preview")
            .field("secret", &"[REDACTED]")
            .field("previous_secrets", &self.previous_secrets.len())
            .finish()
    }
}

/// Block editor settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Editor {
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
}

impl Default for Editor {
    fn default() -> Self {
        Self {
            max_tags: default_max_tags(),
        }
    }
}

fn default_max_tags() -> usize {
    10
}

/// Data backend connection settings.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Backend {
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// Default SQLite location for tab session storage.
    pub fn session_database_url(&self) -> String {
        format!(
            "sqlite://{}/sessions.db",
            self.app.data_dir.trim_end_matches('/')
        )
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
/// - `BLOCKCMS_PREVIEW_SECRET`, when set and non-empty, replaces `preview.secret`.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    if let Ok(secret) = std::env::var(PREVIEW_SECRET_ENV) {
        apply_secret_override(&mut cfg, &secret);
    }
    validate(&cfg)?;
    Ok(cfg)
}

fn apply_secret_override(cfg: &mut Config, secret: &str) {
    let secret = secret.trim();
    if !secret.is_empty() {
        cfg.preview.secret = secret.to_string();
    }
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.origin.trim().is_empty() {
        return Err(ConfigError::Invalid("app.origin must be non-empty"));
    }
    if reqwest::Url::parse(&cfg.app.origin).is_err() {
        return Err(ConfigError::Invalid("app.origin must be an absolute URL"));
    }
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }

    if cfg.preview.secret.trim().is_empty() {
        return Err(ConfigError::Invalid("preview.secret must be non-empty"));
    }
    if cfg
        .preview
        .previous_secrets
        .iter()
        .any(|s| s.trim().is_empty())
    {
        return Err(ConfigError::Invalid(
            "preview.previous_secrets must not contain empty entries",
        ));
    }

    if cfg.editor.max_tags == 0 {
        return Err(ConfigError::Invalid("editor.max_tags must be > 0"));
    }

    if cfg.backend.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("backend.base_url must be non-empty"));
    }
    if cfg.backend.api_key.trim().is_empty() {
        return Err(ConfigError::Invalid("backend.api_key must be non-empty"));
    }

    Ok(())
}

/// Example configuration document.
pub fn example() -> &'static str {
    r#"app:
  origin: "https://cms.example.com"
  data_dir: "./data"

preview:
  # Prefer setting BLOCKCMS_PREVIEW_SECRET in the environment.
  secret: "CHANGE_ME_PREVIEW_SECRET"
  previous_secrets: []

editor:
  max_tags: 10

backend:
  base_url: "https://backend.example.com/"
  api_key: "YOUR_BACKEND_API_KEY"
"#
}
