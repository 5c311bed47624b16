//! `GET /preview?slug=..&secret=..&draft=true`
use anyhow::{Context, Result};
use reqwest::Url;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{PreviewManager, SessionStore};
use crate::backend::DataBackend;
use crate::model::Article;

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewOutcome {
    /// Secret accepted; draft content may be shown and the tab is now in preview mode.
    Draft(Article),
    /// Secret rejected, but a published version exists.
    Published(Article),
    NotFound,
}

/// Query parameters of a preview link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewParams {
    pub slug: Option<String>,
    pub secret: Option<String>,
    pub draft: bool,
}

impl PreviewParams {
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "slug" => params.slug = Some(value.into_owned()),
                "secret" => params.secret = Some(value.into_owned()),
                "draft" => params.draft = value == "true",
                _ => {}
            }
        }
        params
    }
}

pub struct PreviewRoute<B, S> {
    backend: Arc<B>,
    preview: Arc<PreviewManager<S>>,
}

impl<B: DataBackend, S: SessionStore> PreviewRoute<B, S> {
    pub fn new(backend: Arc<B>, preview: Arc<PreviewManager<S>>) -> Self {
        Self { backend, preview }
    }

    pub async fn handle_url(&self, url: &Url) -> Result<PreviewOutcome> {
        self.handle(&PreviewParams::from_url(url)).await
    }

    /// Validate before any draft content is fetched. A rejected secret falls
    /// back to the public view of the same slug.
    #[instrument(skip_all, fields(slug = params.slug.as_deref().unwrap_or("")))]
    pub async fn handle(&self, params: &PreviewParams) -> Result<PreviewOutcome> {
        let slug = params.slug.as_deref();
        if self
            .preview
            .validate_preview_request(params.secret.as_deref(), slug)
        {
            let slug = slug.unwrap_or_default();
            let article = self
                .backend
                .get_article_by_slug(slug, true)
                .await
                .context("failed to load draft article")?;
            return match article {
                Some(article) => {
                    self.preview
                        .enter_preview_mode(article.id)
                        .await
                        .context("failed to enter preview mode")?;
                    info!("serving draft preview");
                    Ok(PreviewOutcome::Draft(article))
                }
                None => Ok(PreviewOutcome::NotFound),
            };
        }

        info!("preview request rejected; falling back to public view");
        let Some(slug) = slug.filter(|s| !s.is_empty()) else {
            return Ok(PreviewOutcome::NotFound);
        };
        let article = self
            .backend
            .get_article_by_slug(slug, false)
            .await
            .context("failed to load published article")?;
        Ok(match article {
            Some(article) if article.is_published() => PreviewOutcome::Published(article),
            _ => PreviewOutcome::NotFound,
        })
    }
}
