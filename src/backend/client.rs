//! REST client for the data backend.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::auth::{AuthEvent, AuthHandler, AuthListeners, Unsubscribe};
use super::{DataBackend, NewArticle, Session};
use crate::blocks::Block;
use crate::config::Config;
use crate::listing::ArticleQuery;
use crate::model::{Article, Media};

pub struct HttpBackend {
    http: Client,
    base_url: Url,
    api_key: String,
    session: RwLock<Option<Session>>,
    listeners: AuthListeners,
}

impl fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    pub fn new(base_url: Url, api_key: String) -> Result<Self> {
        let http = Client::builder()
            .user_agent("blockcms/0.1")
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url,
            api_key,
            session: RwLock::new(None),
            listeners: AuthListeners::new(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let mut base = cfg.backend.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).context("invalid backend.base_url")?;
        Self::new(base_url, cfg.backend.api_key.clone())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid backend path {}", path))
    }

    fn endpoint_with_segments(&self, path: &str, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("backend base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Authenticated with the user's access token when signed in, else the API key.
    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.api_key.clone(),
        };
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    pub async fn build_list_articles_request(&self, query: &ArticleQuery) -> Result<reqwest::Request> {
        let mut url = self.endpoint("v1/articles")?;
        url.query_pairs_mut()
            .extend_pairs(query.to_query_pairs().iter().map(|(k, v)| (*k, v.as_str())));
        self.request(Method::GET, url)
            .await
            .build()
            .context("failed to build list request")
    }

    /// The signed-in session, unless it has expired by `now`. An expired
    /// session is forgotten so the next request falls back to the API key.
    pub async fn cached_session(&self, now: DateTime<Utc>) -> Option<Session> {
        let mut slot = self.session.write().await;
        if slot.as_ref().is_some_and(|s| s.is_expired(now)) {
            debug!("cached session expired");
            *slot = None;
        }
        slot.clone()
    }
}

async fn check_status(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    warn!(%status, "backend error");
    Err(anyhow!("backend error {}: {}", status, body))
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T> {
    let res = check_status(res).await?;
    res.json::<T>()
        .await
        .context("invalid backend response JSON")
}

#[async_trait]
impl DataBackend for HttpBackend {
    #[instrument(skip_all)]
    async fn get_session(&self) -> Result<Option<Session>> {
        if let Some(session) = self.cached_session(Utc::now()).await {
            return Ok(Some(session));
        }
        let url = self.endpoint("v1/session")?;
        let res = self
            .request(Method::GET, url)
            .await
            .send()
            .await
            .context("failed to reach backend")?;
        if matches!(res.status(), StatusCode::UNAUTHORIZED | StatusCode::NO_CONTENT) {
            return Ok(None);
        }
        let session: Option<Session> = read_json(res).await?;
        if let Some(s) = &session {
            *self.session.write().await = Some(s.clone());
        }
        Ok(session)
    }

    fn on_auth_state_change(&self, handler: AuthHandler) -> Unsubscribe {
        self.listeners.subscribe(handler)
    }

    #[instrument(skip_all)]
    async fn sign_out(&self) -> Result<()> {
        let url = self.endpoint("v1/session/sign-out")?;
        let res = self
            .request(Method::POST, url)
            .await
            .send()
            .await
            .context("failed to reach backend")?;
        check_status(res).await?;
        *self.session.write().await = None;
        info!("signed out");
        self.listeners.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    #[instrument(skip_all)]
    async fn list_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>> {
        let request = self.build_list_articles_request(query).await?;
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach backend")?;
        let articles: Vec<Article> = read_json(res).await?;
        debug!(count = articles.len(), "listed articles");
        Ok(articles)
    }

    #[instrument(skip_all, fields(%slug))]
    async fn get_article_by_slug(&self, slug: &str, include_drafts: bool) -> Result<Option<Article>> {
        let mut url = self.endpoint_with_segments("v1/articles/by-slug", &[slug])?;
        url.query_pairs_mut()
            .append_pair("include_drafts", if include_drafts { "true" } else { "false" });
        let res = self
            .request(Method::GET, url)
            .await
            .send()
            .await
            .context("failed to reach backend")?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let article: Article = read_json(res).await?;
        if !include_drafts && !article.is_published() {
            return Ok(None);
        }
        Ok(Some(article))
    }

    #[instrument(skip_all)]
    async fn create_article(&self, article: &NewArticle) -> Result<Article> {
        let url = self.endpoint("v1/articles")?;
        let res = self
            .request(Method::POST, url)
            .await
            .json(article)
            .send()
            .await
            .context("failed to reach backend")?;
        read_json(res).await
    }

    #[instrument(skip_all, fields(article_id = %article.id))]
    async fn update_article(&self, article: &Article) -> Result<Article> {
        let id = article.id.to_string();
        let url = self.endpoint_with_segments("v1/articles", &[&id])?;
        let res = self
            .request(Method::PUT, url)
            .await
            .json(article)
            .send()
            .await
            .context("failed to reach backend")?;
        read_json(res).await
    }

    #[instrument(skip_all, fields(%article_id))]
    async fn list_blocks(&self, article_id: Uuid) -> Result<Vec<Block>> {
        let id = article_id.to_string();
        let url = self.endpoint_with_segments("v1/articles", &[&id, "blocks"])?;
        let res = self
            .request(Method::GET, url)
            .await
            .send()
            .await
            .context("failed to reach backend")?;
        read_json(res).await
    }

    #[instrument(skip_all, fields(%article_id, count = blocks.len()))]
    async fn save_blocks(&self, article_id: Uuid, blocks: &[Block]) -> Result<()> {
        let id = article_id.to_string();
        let url = self.endpoint_with_segments("v1/articles", &[&id, "blocks"])?;
        let res = self
            .request(Method::PUT, url)
            .await
            .json(blocks)
            .send()
            .await
            .context("failed to reach backend")?;
        check_status(res).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn list_media(&self) -> Result<Vec<Media>> {
        let url = self.endpoint("v1/media")?;
        let res = self
            .request(Method::GET, url)
            .await
            .send()
            .await
            .context("failed to reach backend")?;
        read_json(res).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArticleStatus;

    fn backend() -> HttpBackend {
        HttpBackend::new(
            Url::parse("https://backend.example.com/api/").unwrap(),
            "key-123".into(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn list_request_carries_query_and_api_key() {
        let b = backend();
        let q = ArticleQuery {
            status: Some(ArticleStatus::Draft),
            search: Some("hello".into()),
            ..ArticleQuery::default()
        };
        let req = b.build_list_articles_request(&q).await.unwrap();
        let url = req.url().as_str();
        assert!(url.starts_with("https://backend.example.com/api/v1/articles?"));
        assert!(url.contains("status=draft"));
        assert!(url.contains("search=hello"));
        assert_eq!(req.headers()["apikey"], "key-123");
        assert_eq!(req.headers()["Authorization"], "Bearer key-123");
    }

    #[test]
    fn slug_segments_are_escaped() {
        let b = backend();
        let url = b
            .endpoint_with_segments("v1/articles/by-slug", &["a/b c"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://backend.example.com/api/v1/articles/by-slug/a%2Fb%20c"
        );
    }

    #[test]
    fn from_config_normalizes_base_url() {
        let mut cfg: Config = serde_yaml::from_str(crate::config::example()).unwrap();
        cfg.backend.base_url = "https://backend.example.com/api".into();
        let b = HttpBackend::from_config(&cfg).unwrap();
        assert_eq!(
            b.endpoint("v1/media").unwrap().as_str(),
            "https://backend.example.com/api/v1/media"
        );
        assert!(!format!("{:?}", b).contains("YOUR_BACKEND_API_KEY"));
    }

    #[tokio::test]
    async fn expired_session_is_dropped() {
        let b = backend();
        let now = Utc::now();
        let session = Session {
            user_id: Uuid::new_v4(),
            email: None,
            access_token: "token-1".into(),
            expires_at: Some(now + chrono::Duration::minutes(5)),
        };
        *b.session.write().await = Some(session.clone());

        assert_eq!(b.cached_session(now).await, Some(session));
        let req = b
            .build_list_articles_request(&ArticleQuery::default())
            .await
            .unwrap();
        assert_eq!(req.headers()["Authorization"], "Bearer token-1");

        assert_eq!(b.cached_session(now + chrono::Duration::minutes(10)).await, None);
        let req = b
            .build_list_articles_request(&ArticleQuery::default())
            .await
            .unwrap();
        assert_eq!(req.headers()["Authorization"], "Bearer key-123");
    }
}
