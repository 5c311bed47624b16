//! One article editing view: local article + blocks + keywords, synced
//! through the data backend.
//!
//! Backend failures become toasts and leave the local copy as the backend
//! still holds it; successful calls replace it with what the backend returned.
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::backend::DataBackend;
use crate::blocks::{BlockPayload, BlockTree, BlockType};
use crate::model::{Article, ArticleStatus, Media};
use crate::notify::Toasts;
use crate::preview::{PreviewManager, SessionStore};
use crate::scope::{ScopeHandle, ViewScope};
use crate::tags::TagsInput;

pub struct ArticleEditor<B, S> {
    backend: Arc<B>,
    preview: Arc<PreviewManager<S>>,
    scope: Arc<ViewScope>,
    toasts: Toasts,
    article: Option<Article>,
    blocks: BlockTree,
    tags: TagsInput,
    media: Vec<Media>,
}

impl<B: DataBackend, S: SessionStore> ArticleEditor<B, S> {
    pub fn new(backend: Arc<B>, preview: Arc<PreviewManager<S>>, max_tags: usize) -> Self {
        Self {
            backend,
            preview,
            scope: Arc::new(ViewScope::new()),
            toasts: Toasts::new(),
            article: None,
            blocks: BlockTree::default(),
            tags: TagsInput::new(max_tags),
            media: Vec::new(),
        }
    }

    pub fn article(&self) -> Option<&Article> {
        self.article.as_ref()
    }

    pub fn blocks(&self) -> &BlockTree {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut BlockTree {
        &mut self.blocks
    }

    pub fn tags(&self) -> &TagsInput {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagsInput {
        &mut self.tags
    }

    pub fn media(&self) -> &[Media] {
        &self.media
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut Toasts {
        &mut self.toasts
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Handle for view teardown; closing it aborts whatever request is in flight.
    pub fn close_handle(&self) -> ScopeHandle {
        ScopeHandle::new(self.scope.clone())
    }

    /// Add an empty block of `kind` at the end of the top level.
    pub fn add_block(&mut self, kind: BlockType) -> Option<Uuid> {
        if self.article.is_none() {
            self.toasts.error_message("No article loaded", "Load an article before adding blocks");
            return None;
        }
        self.blocks.append(None, BlockPayload::default_for(kind)).ok()
    }

    /// Load an article (drafts included) with its blocks.
    #[instrument(skip(self))]
    pub async fn load(&mut self, slug: &str) -> bool {
        let loaded = self.fetch(slug).await;
        match loaded {
            Ok(Some((article, blocks))) => {
                let max_tags = self.tags.max_tags();
                self.tags = TagsInput::from_keywords(
                    article.keywords.clone().unwrap_or_default(),
                    max_tags,
                );
                self.blocks = blocks;
                self.article = Some(article);
                true
            }
            Ok(None) => {
                self.toasts
                    .error_message("Article not found", format!("No article with slug '{}'", slug));
                false
            }
            Err(err) => {
                self.toasts.error("Failed to load article", &err);
                false
            }
        }
    }

    async fn fetch(&self, slug: &str) -> Result<Option<(Article, BlockTree)>> {
        let Some(article) = self
            .scope
            .run(self.backend.get_article_by_slug(slug, true))
            .await??
        else {
            return Ok(None);
        };
        let blocks = self
            .scope
            .run(self.backend.list_blocks(article.id))
            .await??;
        let tree = BlockTree::from_blocks(article.id, blocks);
        Ok(Some((article, tree)))
    }

    /// Media for the gallery picker.
    pub async fn load_media(&mut self) -> bool {
        match self.scope.run(self.backend.list_media()).await {
            Ok(Ok(media)) => {
                self.media = media;
                true
            }
            Ok(Err(err)) => {
                self.toasts.error("Failed to load media", &err);
                false
            }
            Err(err) => {
                self.toasts.error("Failed to load media", &err.into());
                false
            }
        }
    }

    /// Append a picked media item to a gallery block; returns the new image id.
    pub fn add_media_to_gallery(&mut self, block_id: Uuid, media_id: Uuid) -> Option<String> {
        let Some(media) = self.media.iter().find(|m| m.id == media_id).cloned() else {
            self.toasts
                .error_message("Media not found", "Reload the media library and try again");
            return None;
        };
        if !media.is_image() {
            self.toasts
                .error_message("Cannot add media", format!("{} is not an image", media.filename));
            return None;
        }
        match self.blocks.get_mut(block_id).map(|b| &mut b.payload) {
            Some(BlockPayload::Gallery(gallery)) => Some(gallery.add_media(&media)),
            _ => {
                self.toasts
                    .error_message("Cannot add image", "Selected block is not a gallery");
                None
            }
        }
    }

    /// Validate and persist the article, its keywords and its blocks.
    #[instrument(skip_all)]
    pub async fn save(&mut self, now: DateTime<Utc>) -> bool {
        let Some(current) = self.article.clone() else {
            self.toasts.error_message("Nothing to save", "No article is loaded");
            return false;
        };
        let mut updated = current;
        updated.keywords = if self.tags.is_empty() {
            None
        } else {
            Some(self.tags.tags().to_vec())
        };
        updated.updated_at = now;
        self.persist(updated, "Article saved").await
    }

    /// Publish on a copy; the local article only changes once the backend accepted it.
    #[instrument(skip_all)]
    pub async fn publish(&mut self, now: DateTime<Utc>) -> bool {
        let Some(mut updated) = self.article.clone() else {
            self.toasts.error_message("Nothing to publish", "No article is loaded");
            return false;
        };
        updated.set_status(ArticleStatus::Published, now);
        self.persist(updated, "Article published").await
    }

    async fn persist(&mut self, updated: Article, success: &str) -> bool {
        if let Err(err) = self.blocks.validate() {
            self.toasts.error_message("Cannot save blocks", err.to_string());
            return false;
        }
        let result = self.write(&updated).await;
        match result {
            Ok(saved) => {
                info!(article_id = %saved.id, status = saved.status.as_str(), "article persisted");
                self.article = Some(saved);
                self.toasts.success(success);
                true
            }
            Err(err) => {
                self.toasts.error("Failed to save article", &err);
                self.resync(&updated).await;
                false
            }
        }
    }

    /// A failed write may still have landed on the backend; adopt whatever
    /// it holds now so a retry starts from the stored article.
    async fn resync(&mut self, attempted: &Article) {
        let fetched = self
            .scope
            .run(self.backend.get_article_by_slug(&attempted.slug, true))
            .await;
        match fetched {
            Ok(Ok(Some(remote))) if remote.id == attempted.id => {
                if self.article.as_ref() != Some(&remote) {
                    info!(article_id = %remote.id, "adopting stored article after failed save");
                    self.article = Some(remote);
                }
            }
            Ok(Err(err)) => warn!(?err, "failed to re-read article after failed save"),
            _ => {}
        }
    }

    /// Blocks go first and the article last, so a failed block save leaves
    /// the stored article untouched. A failed article update after that only
    /// leaves the backend holding the blocks this view already shows.
    async fn write(&self, updated: &Article) -> Result<Article> {
        self.scope
            .run(self.backend.save_blocks(updated.id, self.blocks.blocks()))
            .await??;
        let saved = self
            .scope
            .run(self.backend.update_article(updated))
            .await??;
        Ok(saved)
    }

    /// Shareable preview link for the loaded article.
    pub fn preview_link(&mut self) -> Option<String> {
        let url = self.preview.generate_preview_url(self.article.as_ref());
        if url.is_none() {
            self.toasts.error_message(
                "Cannot create preview link",
                "Save the article with a slug before previewing",
            );
        }
        url
    }

    pub async fn exit_preview(&mut self) {
        if let Err(err) = self.preview.exit_preview_mode().await {
            self.toasts.error("Failed to exit preview mode", &err.into());
        }
    }
}

impl<B, S> Drop for ArticleEditor<B, S> {
    fn drop(&mut self) {
        self.scope.cancel_all();
    }
}
