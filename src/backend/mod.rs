//! Data backend collaborator: auth session plus article, block and media storage.
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blocks::Block;
use crate::listing::ArticleQuery;
use crate::model::{Article, Media};

pub mod auth;
pub mod client;

pub use auth::{AuthEvent, AuthHandler, AuthListeners, Unsubscribe};
pub use client::HttpBackend;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|t| t <= now).unwrap_or(false)
    }
}

/// Fields the editor supplies when creating an article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub author_id: Uuid,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

#[async_trait]
pub trait DataBackend: Send + Sync {
    async fn get_session(&self) -> Result<Option<Session>>;

    fn on_auth_state_change(&self, handler: AuthHandler) -> Unsubscribe;

    async fn sign_out(&self) -> Result<()>;

    async fn list_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>>;

    /// `include_drafts = false` only ever returns published articles.
    async fn get_article_by_slug(&self, slug: &str, include_drafts: bool) -> Result<Option<Article>>;

    async fn create_article(&self, article: &NewArticle) -> Result<Article>;

    async fn update_article(&self, article: &Article) -> Result<Article>;

    async fn list_blocks(&self, article_id: Uuid) -> Result<Vec<Block>>;

    async fn save_blocks(&self, article_id: Uuid, blocks: &[Block]) -> Result<()>;

    async fn list_media(&self) -> Result<Vec<Media>>;
}
