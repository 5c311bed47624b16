//! Gallery payload: image list editing and preview.
use super::render::{html_attr, html_escape};
use super::{invalid, BlockError, BlockType, Gap};
use crate::model::Media;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub const MAX_IMAGE_BORDER_RADIUS: u8 = 24;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum GalleryColumns {
    Two,
    #[default]
    Three,
    Four,
}

impl TryFrom<u8> for GalleryColumns {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(GalleryColumns::Two),
            3 => Ok(GalleryColumns::Three),
            4 => Ok(GalleryColumns::Four),
            other => Err(format!("gallery columns must be 2, 3 or 4, got {}", other)),
        }
    }
}

impl From<GalleryColumns> for u8 {
    fn from(value: GalleryColumns) -> Self {
        match value {
            GalleryColumns::Two => 2,
            GalleryColumns::Three => 3,
            GalleryColumns::Four => 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GalleryBlock {
    #[serde(default)]
    pub images: Vec<GalleryImage>,
    #[serde(default)]
    pub columns: GalleryColumns,
    #[serde(default)]
    pub gap: Gap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_images: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_border_radius: Option<u8>,
}

impl GalleryBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        if let Some(radius) = self.image_border_radius {
            if radius > MAX_IMAGE_BORDER_RADIUS {
                return Err(invalid(
                    BlockType::Gallery,
                    format!("imageBorderRadius must be 0-{}", MAX_IMAGE_BORDER_RADIUS),
                ));
            }
        }
        let mut seen = HashSet::new();
        for image in &self.images {
            if image.url.trim().is_empty() {
                return Err(invalid(BlockType::Gallery, "image url must be non-empty"));
            }
            if !seen.insert(image.id.as_str()) {
                return Err(invalid(
                    BlockType::Gallery,
                    format!("duplicate image id '{}'", image.id),
                ));
            }
        }
        Ok(())
    }

    /// Move the image at `from` so it ends up at index `to`. Returns false
    /// (and leaves the list untouched) when either index is out of range.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.images.len();
        if from >= len || to >= len {
            return false;
        }
        let image = self.images.remove(from);
        self.images.insert(to, image);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<GalleryImage> {
        if index >= self.images.len() {
            return None;
        }
        Some(self.images.remove(index))
    }

    /// Append a picked media item under a fresh id and return that id.
    pub fn add_media(&mut self, media: &Media) -> String {
        let id = self.fresh_id();
        let alt = media
            .alt_text
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| media.filename.clone());
        self.images.push(GalleryImage {
            id: id.clone(),
            url: media.url.clone(),
            alt,
            media_id: Some(media.id),
        });
        id
    }

    fn fresh_id(&self) -> String {
        loop {
            let candidate = format!("img-{}", Uuid::new_v4().simple());
            if !self.images.iter().any(|i| i.id == candidate) {
                return candidate;
            }
        }
    }

    pub fn render_preview(&self) -> String {
        let columns: u8 = self.columns.into();
        let crop = if self.crop_images.unwrap_or(false) {
            " gallery-crop"
        } else {
            ""
        };
        let radius = self.image_border_radius.unwrap_or(0);
        let mut body = String::new();
        for image in &self.images {
            body.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" style=\"border-radius: {}px\" />",
                html_attr(&image.url),
                html_attr(&image.alt),
                radius
            ));
        }
        let caption = match self.caption.as_deref().filter(|c| !c.is_empty()) {
            Some(c) => format!("<figcaption>{}</figcaption>", html_escape(c)),
            None => String::new(),
        };
        format!(
            "<figure class=\"gallery gallery-cols-{} gallery-gap-{}{}\">{}{}</figure>",
            columns,
            self.gap.as_str(),
            crop,
            body,
            caption
        )
    }
}
