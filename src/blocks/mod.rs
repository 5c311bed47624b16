//! Block payload contracts.
//!
//! Every block type owns a typed payload; `BlockPayload` is the closed union
//! over them, serialized as `{"type": "<camelCase>", "data": {...}}` so a
//! stored block keeps its `type`/`data` columns. Pure editor transforms live
//! next to the payload they operate on.

pub mod accordion;
pub mod basic;
pub mod gallery;
pub mod hero;
pub mod layout;
pub mod media;
pub mod render;
pub mod tree;
pub mod widgets;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use accordion::{AccordionBlock, AccordionItem, AccordionState, AccordionStyle};
pub use basic::{
    ButtonBlock, CodeBlock, DividerBlock, DividerStyle, HeadingBlock, HtmlBlock, ListBlock,
    QuoteBlock, TableBlock, TextBlock,
};
pub use gallery::{GalleryBlock, GalleryColumns, GalleryImage};
pub use hero::{HeroAlignment, HeroBlock, HeroButton, HeroHeight};
pub use layout::{LayoutBlock, NavLink, NavigationBlock, SocialBlock, SocialLink};
pub use media::{AudioBlock, CalendarBlock, EmbedBlock, ImageBlock, MapBlock, VideoBlock};
pub use tree::BlockTree;
pub use widgets::{
    CountdownBlock, FormBlock, FormField, FormFieldKind, PricingBlock, PricingPlan,
    RecentPostsBlock, SearchBlock,
};

#[derive(Debug, Error, PartialEq)]
pub enum BlockError {
    #[error("invalid {block} block: {reason}")]
    Invalid { block: &'static str, reason: String },
    #[error("duplicate order {order} among siblings of {parent:?}")]
    DuplicateOrder { parent: Option<Uuid>, order: i32 },
    #[error("block {0} not found")]
    NotFound(Uuid),
    #[error("block {block} references missing parent {parent}")]
    MissingParent { block: Uuid, parent: Uuid },
    #[error("{kind} block {parent} cannot contain other blocks")]
    NotContainer { parent: Uuid, kind: &'static str },
}

pub(crate) fn invalid(block: BlockType, reason: impl Into<String>) -> BlockError {
    BlockError::Invalid {
        block: block.as_str(),
        reason: reason.into(),
    }
}

pub(crate) fn require_non_empty(block: BlockType, field: &str, value: &str) -> Result<(), BlockError> {
    if value.trim().is_empty() {
        return Err(invalid(block, format!("{} must be non-empty", field)));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    Text,
    Heading,
    List,
    Quote,
    Button,
    Divider,
    Navigation,
    Image,
    Gallery,
    Video,
    Audio,
    Hero,
    Embed,
    Code,
    Social,
    Map,
    Columns,
    Group,
    Row,
    Stack,
    RecentPosts,
    Search,
    Form,
    Calendar,
    Accordion,
    Pricing,
    Countdown,
    Html,
    Table,
}

impl BlockType {
    pub const ALL: [BlockType; 29] = [
        BlockType::Text,
        BlockType::Heading,
        BlockType::List,
        BlockType::Quote,
        BlockType::Button,
        BlockType::Divider,
        BlockType::Navigation,
        BlockType::Image,
        BlockType::Gallery,
        BlockType::Video,
        BlockType::Audio,
        BlockType::Hero,
        BlockType::Embed,
        BlockType::Code,
        BlockType::Social,
        BlockType::Map,
        BlockType::Columns,
        BlockType::Group,
        BlockType::Row,
        BlockType::Stack,
        BlockType::RecentPosts,
        BlockType::Search,
        BlockType::Form,
        BlockType::Calendar,
        BlockType::Accordion,
        BlockType::Pricing,
        BlockType::Countdown,
        BlockType::Html,
        BlockType::Table,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Heading => "heading",
            BlockType::List => "list",
            BlockType::Quote => "quote",
            BlockType::Button => "button",
            BlockType::Divider => "divider",
            BlockType::Navigation => "navigation",
            BlockType::Image => "image",
            BlockType::Gallery => "gallery",
            BlockType::Video => "video",
            BlockType::Audio => "audio",
            BlockType::Hero => "hero",
            BlockType::Embed => "embed",
            BlockType::Code => "code",
            BlockType::Social => "social",
            BlockType::Map => "map",
            BlockType::Columns => "columns",
            BlockType::Group => "group",
            BlockType::Row => "row",
            BlockType::Stack => "stack",
            BlockType::RecentPosts => "recentPosts",
            BlockType::Search => "search",
            BlockType::Form => "form",
            BlockType::Calendar => "calendar",
            BlockType::Accordion => "accordion",
            BlockType::Pricing => "pricing",
            BlockType::Countdown => "countdown",
            BlockType::Html => "html",
            BlockType::Table => "table",
        }
    }

    /// Container types may parent other blocks.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            BlockType::Columns | BlockType::Group | BlockType::Row | BlockType::Stack
        )
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spacing shared by galleries and layout containers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gap {
    Small,
    #[default]
    Medium,
    Large,
}

impl Gap {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gap::Small => "small",
            Gap::Medium => "medium",
            Gap::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    #[default]
    Primary,
    Secondary,
    Outline,
}

impl ButtonStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonStyle::Primary => "primary",
            ButtonStyle::Secondary => "secondary",
            ButtonStyle::Outline => "outline",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum BlockPayload {
    Text(TextBlock),
    Heading(HeadingBlock),
    List(ListBlock),
    Quote(QuoteBlock),
    Button(ButtonBlock),
    Divider(DividerBlock),
    Navigation(NavigationBlock),
    Image(ImageBlock),
    Gallery(GalleryBlock),
    Video(VideoBlock),
    Audio(AudioBlock),
    Hero(HeroBlock),
    Embed(EmbedBlock),
    Code(CodeBlock),
    Social(SocialBlock),
    Map(MapBlock),
    Columns(LayoutBlock),
    Group(LayoutBlock),
    Row(LayoutBlock),
    Stack(LayoutBlock),
    RecentPosts(RecentPostsBlock),
    Search(SearchBlock),
    Form(FormBlock),
    Calendar(CalendarBlock),
    Accordion(AccordionBlock),
    Pricing(PricingBlock),
    Countdown(CountdownBlock),
    Html(HtmlBlock),
    Table(TableBlock),
}

impl BlockPayload {
    /// Empty payload the editor inserts when a block of `kind` is added.
    pub fn default_for(kind: BlockType) -> Self {
        match kind {
            BlockType::Text => Self::Text(TextBlock::default()),
            BlockType::Heading => Self::Heading(HeadingBlock::default()),
            BlockType::List => Self::List(ListBlock::default()),
            BlockType::Quote => Self::Quote(QuoteBlock::default()),
            BlockType::Button => Self::Button(ButtonBlock::default()),
            BlockType::Divider => Self::Divider(DividerBlock::default()),
            BlockType::Navigation => Self::Navigation(NavigationBlock::default()),
            BlockType::Image => Self::Image(ImageBlock::default()),
            BlockType::Gallery => Self::Gallery(GalleryBlock::default()),
            BlockType::Video => Self::Video(VideoBlock::default()),
            BlockType::Audio => Self::Audio(AudioBlock::default()),
            BlockType::Hero => Self::Hero(HeroBlock::default()),
            BlockType::Embed => Self::Embed(EmbedBlock::default()),
            BlockType::Code => Self::Code(CodeBlock::default()),
            BlockType::Social => Self::Social(SocialBlock::default()),
            BlockType::Map => Self::Map(MapBlock::default()),
            BlockType::Columns => Self::Columns(LayoutBlock::columns()),
            BlockType::Group => Self::Group(LayoutBlock::default()),
            BlockType::Row => Self::Row(LayoutBlock::default()),
            BlockType::Stack => Self::Stack(LayoutBlock::default()),
            BlockType::RecentPosts => Self::RecentPosts(RecentPostsBlock::default()),
            BlockType::Search => Self::Search(SearchBlock::default()),
            BlockType::Form => Self::Form(FormBlock::default()),
            BlockType::Calendar => Self::Calendar(CalendarBlock::default()),
            BlockType::Accordion => Self::Accordion(AccordionBlock::default()),
            BlockType::Pricing => Self::Pricing(PricingBlock::default()),
            BlockType::Countdown => Self::Countdown(CountdownBlock::default()),
            BlockType::Html => Self::Html(HtmlBlock::default()),
            BlockType::Table => Self::Table(TableBlock::default()),
        }
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Text(_) => BlockType::Text,
            Self::Heading(_) => BlockType::Heading,
            Self::List(_) => BlockType::List,
            Self::Quote(_) => BlockType::Quote,
            Self::Button(_) => BlockType::Button,
            Self::Divider(_) => BlockType::Divider,
            Self::Navigation(_) => BlockType::Navigation,
            Self::Image(_) => BlockType::Image,
            Self::Gallery(_) => BlockType::Gallery,
            Self::Video(_) => BlockType::Video,
            Self::Audio(_) => BlockType::Audio,
            Self::Hero(_) => BlockType::Hero,
            Self::Embed(_) => BlockType::Embed,
            Self::Code(_) => BlockType::Code,
            Self::Social(_) => BlockType::Social,
            Self::Map(_) => BlockType::Map,
            Self::Columns(_) => BlockType::Columns,
            Self::Group(_) => BlockType::Group,
            Self::Row(_) => BlockType::Row,
            Self::Stack(_) => BlockType::Stack,
            Self::RecentPosts(_) => BlockType::RecentPosts,
            Self::Search(_) => BlockType::Search,
            Self::Form(_) => BlockType::Form,
            Self::Calendar(_) => BlockType::Calendar,
            Self::Accordion(_) => BlockType::Accordion,
            Self::Pricing(_) => BlockType::Pricing,
            Self::Countdown(_) => BlockType::Countdown,
            Self::Html(_) => BlockType::Html,
            Self::Table(_) => BlockType::Table,
        }
    }

    /// Check the payload against its type's constraints. Freshly inserted
    /// default payloads may fail here until the editor fills them in.
    pub fn validate(&self) -> Result<(), BlockError> {
        match self {
            Self::Text(_) | Self::Divider(_) | Self::Search(_) => Ok(()),
            Self::Heading(b) => b.validate(),
            Self::List(b) => b.validate(),
            Self::Quote(b) => b.validate(),
            Self::Button(b) => b.validate(),
            Self::Navigation(b) => b.validate(),
            Self::Image(b) => b.validate(),
            Self::Gallery(b) => b.validate(),
            Self::Video(b) => b.validate(),
            Self::Audio(b) => b.validate(),
            Self::Hero(b) => b.validate(),
            Self::Embed(b) => b.validate(),
            Self::Code(b) => b.validate(),
            Self::Social(b) => b.validate(),
            Self::Map(b) => b.validate(),
            Self::Columns(b) => b.validate(BlockType::Columns),
            Self::Group(b) => b.validate(BlockType::Group),
            Self::Row(b) => b.validate(BlockType::Row),
            Self::Stack(b) => b.validate(BlockType::Stack),
            Self::RecentPosts(b) => b.validate(),
            Self::Form(b) => b.validate(),
            Self::Calendar(b) => b.validate(),
            Self::Accordion(b) => b.validate(),
            Self::Pricing(b) => b.validate(),
            Self::Countdown(b) => b.validate(),
            Self::Html(b) => b.validate(),
            Self::Table(b) => b.validate(),
        }
    }

    /// Editor preview markup for the block types that have a preview
    /// contract. `None` means nothing is rendered.
    pub fn render_preview(&self) -> Option<String> {
        match self {
            Self::Text(b) => Some(b.render()),
            Self::Hero(b) => b.render_preview(),
            Self::Gallery(b) => Some(b.render_preview()),
            Self::Accordion(b) => Some(b.render_preview(&AccordionState::initial(b))),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub id: Uuid,
    pub article_id: Uuid,
    pub order: i32,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(flatten)]
    pub payload: BlockPayload,
}

impl Block {
    pub fn new(article_id: Uuid, parent_id: Option<Uuid>, order: i32, payload: BlockPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            article_id,
            order,
            parent_id,
            payload,
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.payload.block_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn block_type_names_match_wire_format() {
        for kind in BlockType::ALL {
            let wire = serde_json::to_value(kind).unwrap();
            assert_eq!(wire, json!(kind.as_str()));
        }
        assert_eq!(BlockType::RecentPosts.to_string(), "recentPosts");
    }

    #[test]
    fn default_payload_has_matching_type() {
        for kind in BlockType::ALL {
            assert_eq!(BlockPayload::default_for(kind).block_type(), kind);
        }
    }

    #[test]
    fn block_serializes_type_and_data_inline() {
        let article_id = Uuid::new_v4();
        let block = Block::new(
            article_id,
            None,
            0,
            BlockPayload::Text(TextBlock {
                content: "<p>hi</p>".into(),
            }),
        );
        let v = serde_json::to_value(&block).unwrap();
        assert_eq!(v["type"], "text");
        assert_eq!(v["data"]["content"], "<p>hi</p>");
        assert_eq!(v["order"], 0);

        let back: Block = serde_json::from_value(v).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn unknown_block_type_is_rejected() {
        let v = json!({
            "id": Uuid::new_v4(),
            "article_id": Uuid::new_v4(),
            "order": 1,
            "type": "carousel",
            "data": {}
        });
        assert!(serde_json::from_value::<Block>(v).is_err());
    }

    #[test]
    fn gallery_payload_from_wire() {
        let v = json!({
            "type": "gallery",
            "data": {
                "images": [{"id": "a", "url": "https://x/a.png", "alt": "A"}],
                "columns": 4,
                "gap": "small",
                "cropImages": true,
                "imageBorderRadius": 8
            }
        });
        let payload: BlockPayload = serde_json::from_value(v).unwrap();
        let BlockPayload::Gallery(g) = &payload else {
            panic!("expected gallery");
        };
        assert_eq!(g.columns, GalleryColumns::Four);
        assert_eq!(g.gap, Gap::Small);
        assert_eq!(g.image_border_radius, Some(8));
        payload.validate().unwrap();
    }

    #[test]
    fn gallery_columns_outside_enum_rejected() {
        let v = json!({
            "type": "gallery",
            "data": {"images": [], "columns": 5, "gap": "small"}
        });
        assert!(serde_json::from_value::<BlockPayload>(v).is_err());
    }

    #[test]
    fn validation_errors_name_the_block() {
        let err = BlockPayload::Hero(HeroBlock {
            overlay_opacity: Some(1.5),
            ..HeroBlock::default()
        })
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("hero"));
    }

    #[test]
    fn only_contract_blocks_render_preview() {
        assert!(BlockPayload::default_for(BlockType::Code)
            .render_preview()
            .is_none());
        // Empty hero renders nothing at all.
        assert!(BlockPayload::default_for(BlockType::Hero)
            .render_preview()
            .is_none());
        assert!(BlockPayload::default_for(BlockType::Gallery)
            .render_preview()
            .is_some());
    }
}
