//! Draft preview: secret-gated preview links and per-tab preview state.
//!
//! A preview link carries the shared secret in plaintext, so it works as a
//! capability token: whoever holds it can view any unpublished article. The
//! tab state is two session keys, `previewMode` and `previewArticleId`, and
//! the article id is only ever exposed while the flag reads `"enabled"`.

pub mod route;
pub mod store;

use crate::config::{Config, ConfigError};
use crate::model::Article;
use reqwest::Url;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use route::{PreviewOutcome, PreviewRoute};
pub use store::{MemoryStore, SessionStore, SqliteSessionStore, StoreError};

pub const PREVIEW_MODE_KEY: &str = "previewMode";
pub const PREVIEW_ARTICLE_ID_KEY: &str = "previewArticleId";
pub const PREVIEW_MODE_ENABLED: &str = "enabled";
pub const PREVIEW_PATH: &str = "/preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Inactive,
    PreviewActive { article_id: Option<Uuid> },
}

pub struct PreviewManager<S> {
    store: S,
    origin: Url,
    secret: String,
    previous_secrets: Vec<String>,
}

impl<S> std::fmt::Debug for PreviewManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewManager")
            .field("origin", &self.origin.as_str())
            .finish_non_exhaustive()
    }
}

impl<S: SessionStore> PreviewManager<S> {
    pub fn new(store: S, origin: Url, secret: impl Into<String>) -> Self {
        Self {
            store,
            origin,
            secret: secret.into(),
            previous_secrets: Vec::new(),
        }
    }

    pub fn from_config(store: S, cfg: &Config) -> Result<Self, ConfigError> {
        let origin = Url::parse(&cfg.app.origin)
            .map_err(|_| ConfigError::Invalid("app.origin must be an absolute URL"))?;
        Ok(Self::new(store, origin, cfg.preview.secret.clone())
            .with_previous_secrets(cfg.preview.previous_secrets.clone()))
    }

    /// Secrets from earlier rotations keep validating; new links use the current one.
    pub fn with_previous_secrets(mut self, previous: Vec<String>) -> Self {
        self.previous_secrets = previous.into_iter().filter(|s| !s.is_empty()).collect();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Scheme, host and port of the public site, without a trailing slash.
    pub fn origin(&self) -> String {
        self.origin.origin().ascii_serialization()
    }

    /// Fails closed: absent or empty input never validates. Any accepted
    /// secret unlocks every slug.
    pub fn validate_preview_request(&self, secret: Option<&str>, slug: Option<&str>) -> bool {
        let (Some(secret), Some(slug)) = (secret, slug) else {
            return false;
        };
        if secret.is_empty() || slug.is_empty() {
            return false;
        }
        let mut ok = constant_time_eq(secret.as_bytes(), self.secret.as_bytes());
        for previous in &self.previous_secrets {
            ok |= constant_time_eq(secret.as_bytes(), previous.as_bytes());
        }
        ok
    }

    /// `<origin>/preview?slug=..&secret=..&draft=true`, or `None` without an article slug.
    pub fn generate_preview_url(&self, article: Option<&Article>) -> Option<String> {
        let article = article?;
        self.preview_url_for_slug(&article.slug)
    }

    /// Query values are form-encoded; URL-safe slugs come through unchanged.
    pub fn preview_url_for_slug(&self, slug: &str) -> Option<String> {
        if slug.is_empty() {
            return None;
        }
        let mut url = match self.origin.join(PREVIEW_PATH) {
            Ok(url) => url,
            Err(err) => {
                warn!(?err, "cannot build preview url from origin");
                return None;
            }
        };
        url.query_pairs_mut()
            .append_pair("slug", slug)
            .append_pair("secret", &self.secret)
            .append_pair("draft", "true");
        Some(url.to_string())
    }

    /// Storage failures read as "not in preview".
    pub async fn is_draft_mode_enabled(&self) -> bool {
        match self.store.get(PREVIEW_MODE_KEY).await {
            Ok(value) => value.as_deref() == Some(PREVIEW_MODE_ENABLED),
            Err(err) => {
                warn!(?err, "failed to read preview mode; treating as disabled");
                false
            }
        }
    }

    pub async fn get_preview_article_id(&self) -> Option<Uuid> {
        if !self.is_draft_mode_enabled().await {
            return None;
        }
        let raw = match self.store.get(PREVIEW_ARTICLE_ID_KEY).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(?err, "failed to read preview article id");
                return None;
            }
        };
        match Uuid::parse_str(&raw) {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(raw = %raw, "ignoring malformed preview article id");
                None
            }
        }
    }

    pub async fn state(&self) -> PreviewState {
        if self.is_draft_mode_enabled().await {
            PreviewState::PreviewActive {
                article_id: self.get_preview_article_id().await,
            }
        } else {
            PreviewState::Inactive
        }
    }

    /// `Inactive -> PreviewActive`; only call after the request validated.
    pub async fn enter_preview_mode(&self, article_id: Uuid) -> Result<(), StoreError> {
        self.store
            .set(PREVIEW_ARTICLE_ID_KEY, &article_id.to_string())
            .await?;
        self.store.set(PREVIEW_MODE_KEY, PREVIEW_MODE_ENABLED).await?;
        info!(%article_id, "entered preview mode");
        Ok(())
    }

    /// Idempotent; clears the flag first so a half-finished exit never
    /// exposes the article id.
    pub async fn exit_preview_mode(&self) -> Result<(), StoreError> {
        self.store.delete(PREVIEW_MODE_KEY).await?;
        self.store.delete(PREVIEW_ARTICLE_ID_KEY).await?;
        debug!("exited preview mode");
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
