use anyhow::{anyhow, Result};
use blockcms::backend::{AuthEvent, AuthHandler, AuthListeners, DataBackend, NewArticle, Session, Unsubscribe};
use blockcms::blocks::{Block, BlockPayload, BlockType};
use blockcms::config;
use blockcms::editor::ArticleEditor;
use blockcms::listing::ArticleQuery;
use blockcms::model::{Article, ArticleStatus, Media};
use blockcms::notify::ToastLevel;
use blockcms::preview::{MemoryStore, PreviewManager, PreviewOutcome, PreviewRoute, PreviewState};
use chrono::{TimeZone, Utc};
use reqwest::Url;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    GetBySlug { slug: String, include_drafts: bool },
    Update { id: Uuid, status: ArticleStatus, keywords: Option<Vec<String>> },
    ListBlocks(Uuid),
    SaveBlocks { article_id: Uuid, count: usize },
    ListMedia,
}

#[derive(Default)]
struct RecordingBackend {
    articles: Mutex<Vec<Article>>,
    blocks: Mutex<HashMap<Uuid, Vec<Block>>>,
    media: Mutex<Vec<Media>>,
    update_failures: Mutex<VecDeque<String>>,
    // Update applied, but the reply is lost.
    lost_update_replies: Mutex<VecDeque<String>>,
    block_failures: Mutex<VecDeque<String>>,
    stall_lookups: AtomicBool,
    calls: Mutex<Vec<Call>>,
    listeners: AuthListeners,
}

impl RecordingBackend {
    fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            articles: Mutex::new(articles),
            ..Default::default()
        }
    }

    async fn fail_next_update(&self, message: &str) {
        self.update_failures.lock().await.push_back(message.to_string());
    }

    async fn fail_next_block_save(&self, message: &str) {
        self.block_failures.lock().await.push_back(message.to_string());
    }

    async fn lose_next_update_reply(&self, message: &str) {
        self.lost_update_replies.lock().await.push_back(message.to_string());
    }

    async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn stored(&self, id: Uuid) -> Option<Article> {
        self.articles.lock().await.iter().find(|a| a.id == id).cloned()
    }
}

#[async_trait::async_trait]
impl DataBackend for RecordingBackend {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(None)
    }

    fn on_auth_state_change(&self, handler: AuthHandler) -> Unsubscribe {
        self.listeners.subscribe(handler)
    }

    async fn sign_out(&self) -> Result<()> {
        self.listeners.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    async fn list_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>> {
        Ok(query.apply(&self.articles.lock().await))
    }

    async fn get_article_by_slug(&self, slug: &str, include_drafts: bool) -> Result<Option<Article>> {
        self.calls.lock().await.push(Call::GetBySlug {
            slug: slug.to_string(),
            include_drafts,
        });
        if self.stall_lookups.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        Ok(self
            .articles
            .lock()
            .await
            .iter()
            .find(|a| a.slug == slug && (include_drafts || a.is_published()))
            .cloned())
    }

    async fn create_article(&self, article: &NewArticle) -> Result<Article> {
        let mut created = Article::new_draft(article.author_id, &article.title, Utc::now());
        created.slug = article.slug.clone();
        created.keywords = article.keywords.clone();
        self.articles.lock().await.push(created.clone());
        Ok(created)
    }

    async fn update_article(&self, article: &Article) -> Result<Article> {
        self.calls.lock().await.push(Call::Update {
            id: article.id,
            status: article.status,
            keywords: article.keywords.clone(),
        });
        if let Some(message) = self.update_failures.lock().await.pop_front() {
            return Err(anyhow!(message));
        }
        let mut articles = self.articles.lock().await;
        let slot = articles
            .iter_mut()
            .find(|a| a.id == article.id)
            .ok_or_else(|| anyhow!("article {} not found", article.id))?;
        *slot = article.clone();
        drop(articles);
        if let Some(message) = self.lost_update_replies.lock().await.pop_front() {
            return Err(anyhow!(message));
        }
        Ok(article.clone())
    }

    async fn list_blocks(&self, article_id: Uuid) -> Result<Vec<Block>> {
        self.calls.lock().await.push(Call::ListBlocks(article_id));
        Ok(self
            .blocks
            .lock()
            .await
            .get(&article_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_blocks(&self, article_id: Uuid, blocks: &[Block]) -> Result<()> {
        self.calls.lock().await.push(Call::SaveBlocks {
            article_id,
            count: blocks.len(),
        });
        if let Some(message) = self.block_failures.lock().await.pop_front() {
            return Err(anyhow!(message));
        }
        self.blocks.lock().await.insert(article_id, blocks.to_vec());
        Ok(())
    }

    async fn list_media(&self) -> Result<Vec<Media>> {
        self.calls.lock().await.push(Call::ListMedia);
        Ok(self.media.lock().await.clone())
    }
}

fn ts(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap()
}

fn article(slug: &str, status: ArticleStatus) -> Article {
    let mut a = Article::new_draft(Uuid::new_v4(), slug, ts(1));
    a.slug = slug.to_string();
    a.set_status(status, ts(2));
    a
}

fn preview_manager(store: MemoryStore) -> Arc<PreviewManager<MemoryStore>> {
    let mut cfg: config::Config = serde_yaml::from_str(config::example()).unwrap();
    cfg.app.origin = "https://cms.example.com".into();
    cfg.preview.secret = "S".into();
    Arc::new(PreviewManager::from_config(store, &cfg).unwrap())
}

fn route(
    backend: &Arc<RecordingBackend>,
    store: &MemoryStore,
) -> PreviewRoute<RecordingBackend, MemoryStore> {
    PreviewRoute::new(backend.clone(), preview_manager(store.clone()))
}

#[tokio::test]
async fn preview_link_round_trip_enters_preview_mode() {
    let draft = article("hello-world", ArticleStatus::Draft);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft.clone()]));
    let store = MemoryStore::new();
    let preview = preview_manager(store.clone());

    let link = preview.generate_preview_url(Some(&draft)).unwrap();
    assert_eq!(
        link,
        "https://cms.example.com/preview?slug=hello-world&secret=S&draft=true"
    );

    let route = PreviewRoute::new(backend.clone(), preview.clone());
    let outcome = route.handle_url(&Url::parse(&link).unwrap()).await.unwrap();
    assert_eq!(outcome, PreviewOutcome::Draft(draft.clone()));

    assert!(preview.is_draft_mode_enabled().await);
    assert_eq!(preview.get_preview_article_id().await, Some(draft.id));
    assert_eq!(
        backend.calls().await,
        vec![Call::GetBySlug {
            slug: "hello-world".into(),
            include_drafts: true
        }]
    );

    preview.exit_preview_mode().await.unwrap();
    assert_eq!(preview.state().await, PreviewState::Inactive);
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn wrong_secret_never_touches_drafts() {
    let draft = article("hello-world", ArticleStatus::Draft);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft]));
    let store = MemoryStore::new();

    let url = Url::parse("https://cms.example.com/preview?slug=hello-world&secret=wrong&draft=true")
        .unwrap();
    let outcome = route(&backend, &store).handle_url(&url).await.unwrap();

    assert_eq!(outcome, PreviewOutcome::NotFound);
    assert!(store.snapshot().await.is_empty());
    assert_eq!(
        backend.calls().await,
        vec![Call::GetBySlug {
            slug: "hello-world".into(),
            include_drafts: false
        }]
    );
}

#[tokio::test]
async fn wrong_secret_falls_back_to_published_article() {
    let published = article("launch", ArticleStatus::Published);
    let backend = Arc::new(RecordingBackend::with_articles(vec![published.clone()]));
    let store = MemoryStore::new();

    let url = Url::parse("https://cms.example.com/preview?slug=launch").unwrap();
    let outcome = route(&backend, &store).handle_url(&url).await.unwrap();

    assert_eq!(outcome, PreviewOutcome::Published(published));
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn valid_secret_for_unknown_slug_is_not_found() {
    let backend = Arc::new(RecordingBackend::default());
    let store = MemoryStore::new();

    let url = Url::parse("https://cms.example.com/preview?slug=missing&secret=S&draft=true").unwrap();
    let outcome = route(&backend, &store).handle_url(&url).await.unwrap();

    assert_eq!(outcome, PreviewOutcome::NotFound);
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn editor_loads_article_blocks_and_keywords() {
    let mut draft = article("tagged", ArticleStatus::Draft);
    draft.keywords = Some(vec!["rust".into(), "cms".into()]);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft.clone()]));
    backend.blocks.lock().await.insert(
        draft.id,
        vec![Block::new(draft.id, None, 0, BlockPayload::default_for(BlockType::Text))],
    );

    let mut editor = ArticleEditor::new(backend.clone(), preview_manager(MemoryStore::new()), 10);
    assert!(editor.load("tagged").await);

    assert_eq!(editor.article().map(|a| a.id), Some(draft.id));
    assert_eq!(editor.tags().tags(), ["rust", "cms"]);
    assert_eq!(editor.blocks().blocks().len(), 1);
    assert_eq!(
        backend.calls().await,
        vec![
            Call::GetBySlug {
                slug: "tagged".into(),
                include_drafts: true
            },
            Call::ListBlocks(draft.id),
        ]
    );
}

#[tokio::test]
async fn editor_missing_article_shows_toast() {
    let backend = Arc::new(RecordingBackend::default());
    let mut editor = ArticleEditor::new(backend, preview_manager(MemoryStore::new()), 10);

    assert!(!editor.load("nope").await);
    assert!(editor.article().is_none());
    let toasts = editor.toasts_mut().drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Article not found");
}

#[tokio::test]
async fn failed_save_keeps_local_state_and_reports() {
    let draft = article("draft", ArticleStatus::Draft);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft.clone()]));
    let mut editor = ArticleEditor::new(backend.clone(), preview_manager(MemoryStore::new()), 10);
    assert!(editor.load("draft").await);

    backend.fail_next_update("backend error 503").await;
    assert!(!editor.publish(ts(5)).await);

    let local = editor.article().unwrap();
    assert_eq!(local.status, ArticleStatus::Draft);
    assert!(local.published_at.is_none());
    assert_eq!(backend.stored(draft.id).await, Some(draft.clone()));

    let toasts = editor.toasts_mut().drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Error);
    assert_eq!(toasts[0].title, "Failed to save article");
    assert_eq!(toasts[0].description.as_deref(), Some("backend error 503"));

    // Blocks are written before the article, then the article is re-read.
    let calls = backend.calls().await;
    assert!(matches!(calls[2], Call::SaveBlocks { article_id, .. } if article_id == draft.id));
    assert!(matches!(calls[3], Call::Update { status: ArticleStatus::Published, .. }));
    assert!(matches!(calls[4], Call::GetBySlug { include_drafts: true, .. }));
}

#[tokio::test]
async fn failed_block_save_leaves_article_untouched() {
    let draft = article("blocks", ArticleStatus::Draft);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft.clone()]));
    let mut editor = ArticleEditor::new(backend.clone(), preview_manager(MemoryStore::new()), 10);
    assert!(editor.load("blocks").await);

    backend.fail_next_block_save("blocks 503").await;
    assert!(!editor.publish(ts(5)).await);

    assert_eq!(backend.stored(draft.id).await, Some(draft.clone()));
    assert_eq!(editor.article(), Some(&draft));
    assert!(!backend
        .calls()
        .await
        .iter()
        .any(|c| matches!(c, Call::Update { .. })));
    let toasts = editor.toasts_mut().drain();
    assert_eq!(toasts[0].title, "Failed to save article");
    assert_eq!(toasts[0].description.as_deref(), Some("blocks 503"));

    // The retry is the first real transition, so it stamps its own time.
    assert!(editor.publish(ts(6)).await);
    assert_eq!(backend.stored(draft.id).await.unwrap().published_at, Some(ts(6)));
}

#[tokio::test]
async fn lost_reply_adopts_stored_article() {
    let draft = article("flaky", ArticleStatus::Draft);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft.clone()]));
    let mut editor = ArticleEditor::new(backend.clone(), preview_manager(MemoryStore::new()), 10);
    assert!(editor.load("flaky").await);

    backend.lose_next_update_reply("gateway timeout").await;
    assert!(!editor.publish(ts(5)).await);

    let stored = backend.stored(draft.id).await.unwrap();
    assert_eq!(stored.published_at, Some(ts(5)));
    assert_eq!(editor.article(), Some(&stored));

    assert!(editor.publish(ts(7)).await);
    let stored = backend.stored(draft.id).await.unwrap();
    assert_eq!(stored.published_at, Some(ts(5)));
    assert_eq!(stored.updated_at, ts(7));
}

#[tokio::test]
async fn publish_stamps_once_and_saves_blocks() {
    let draft = article("news", ArticleStatus::Draft);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft.clone()]));
    let mut editor = ArticleEditor::new(backend.clone(), preview_manager(MemoryStore::new()), 10);
    assert!(editor.load("news").await);
    editor.add_block(BlockType::Gallery).unwrap();
    assert!(editor.tags_mut().add("  release "));

    assert!(editor.publish(ts(5)).await);
    let published = editor.article().unwrap().clone();
    assert_eq!(published.status, ArticleStatus::Published);
    assert_eq!(published.published_at, Some(ts(5)));

    editor.toasts_mut().drain();
    assert!(editor.save(ts(6)).await);
    let saved = backend.stored(draft.id).await.unwrap();
    assert_eq!(saved.published_at, Some(ts(5)));
    assert_eq!(saved.updated_at, ts(6));
    assert_eq!(saved.keywords, Some(vec!["release".to_string()]));

    let toasts = editor.toasts_mut().drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Success);
    assert_eq!(backend.blocks.lock().await[&draft.id].len(), 1);
}

#[tokio::test]
async fn invalid_blocks_are_not_saved() {
    let draft = article("quoted", ArticleStatus::Draft);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft]));
    let mut editor = ArticleEditor::new(backend.clone(), preview_manager(MemoryStore::new()), 10);
    assert!(editor.load("quoted").await);
    editor.add_block(BlockType::Quote).unwrap();

    assert!(!editor.save(ts(4)).await);
    assert!(!backend
        .calls()
        .await
        .iter()
        .any(|c| matches!(c, Call::Update { .. })));
    assert_eq!(editor.toasts().pending()[0].title, "Cannot save blocks");
}

#[tokio::test]
async fn gallery_takes_picked_media() {
    let draft = article("photos", ArticleStatus::Draft);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft]));
    let photo = Media {
        id: Uuid::new_v4(),
        filename: "sunset.jpg".into(),
        mime_type: "image/jpeg".into(),
        size: 2048,
        url: "https://cdn.example.com/sunset.jpg".into(),
        alt_text: None,
        caption: None,
        user_id: Uuid::new_v4(),
    };
    backend.media.lock().await.push(photo.clone());

    let mut editor = ArticleEditor::new(backend, preview_manager(MemoryStore::new()), 10);
    assert!(editor.load("photos").await);
    assert!(editor.load_media().await);
    let block_id = editor.add_block(BlockType::Gallery).unwrap();

    let image_id = editor.add_media_to_gallery(block_id, photo.id).unwrap();
    assert!(image_id.starts_with("img-"));
    match &editor.blocks().get(block_id).unwrap().payload {
        BlockPayload::Gallery(g) => {
            assert_eq!(g.images.len(), 1);
            assert_eq!(g.images[0].alt, "sunset.jpg");
            assert_eq!(g.images[0].media_id, Some(photo.id));
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[tokio::test]
async fn gallery_rejects_non_image_media() {
    let draft = article("clips", ArticleStatus::Draft);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft]));
    let clip = Media {
        id: Uuid::new_v4(),
        filename: "intro.mp4".into(),
        mime_type: "video/mp4".into(),
        size: 4096,
        url: "https://cdn.example.com/intro.mp4".into(),
        alt_text: None,
        caption: None,
        user_id: Uuid::new_v4(),
    };
    backend.media.lock().await.push(clip.clone());

    let mut editor = ArticleEditor::new(backend, preview_manager(MemoryStore::new()), 10);
    assert!(editor.load("clips").await);
    assert!(editor.load_media().await);
    let block_id = editor.add_block(BlockType::Gallery).unwrap();

    assert!(editor.add_media_to_gallery(block_id, clip.id).is_none());
    assert_eq!(editor.toasts().pending()[0].title, "Cannot add media");
}

#[tokio::test]
async fn preview_link_requires_loaded_article() {
    let backend = Arc::new(RecordingBackend::default());
    let mut editor = ArticleEditor::new(backend, preview_manager(MemoryStore::new()), 10);

    assert!(editor.preview_link().is_none());
    assert_eq!(editor.toasts().pending().len(), 1);
    assert_eq!(editor.toasts().pending()[0].level, ToastLevel::Error);
}

#[tokio::test]
async fn closed_view_aborts_requests() {
    let draft = article("closing", ArticleStatus::Draft);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft]));
    let mut editor = ArticleEditor::new(backend.clone(), preview_manager(MemoryStore::new()), 10);
    editor.scope().cancel_all();

    assert!(!editor.load("closing").await);
    assert!(editor.article().is_none());
    assert!(backend.calls().await.is_empty());
    let toasts = editor.toasts_mut().drain();
    assert_eq!(toasts[0].title, "Failed to load article");
}

#[tokio::test]
async fn closing_view_aborts_pending_load() {
    let draft = article("slow", ArticleStatus::Draft);
    let backend = Arc::new(RecordingBackend::with_articles(vec![draft]));
    backend.stall_lookups.store(true, Ordering::SeqCst);
    let mut editor = ArticleEditor::new(backend.clone(), preview_manager(MemoryStore::new()), 10);
    let handle = editor.close_handle();

    let (loaded, _) = tokio::join!(editor.load("slow"), async {
        while backend.calls().await.is_empty() {
            tokio::task::yield_now().await;
        }
        handle.close();
    });

    assert!(!loaded);
    assert!(handle.is_closed());
    assert!(editor.article().is_none());
    assert_eq!(editor.scope().in_flight(), 0);
    let toasts = editor.toasts_mut().drain();
    assert_eq!(toasts[0].title, "Failed to load article");
    assert_eq!(
        toasts[0].description.as_deref(),
        Some("request aborted: view was closed")
    );
}

#[tokio::test]
async fn auth_listeners_unsubscribe() {
    let backend = RecordingBackend::default();
    let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = seen.clone();
    let sub = backend.on_auth_state_change(Box::new(move |event, session| {
        assert_eq!(event, AuthEvent::SignedOut);
        assert!(session.is_none());
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }));

    backend.sign_out().await.unwrap();
    assert!(sub.unsubscribe());
    backend.sign_out().await.unwrap();
    assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);
}
