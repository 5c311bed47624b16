use super::{invalid, require_non_empty, BlockError, BlockType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageBlock {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<Uuid>,
}

impl ImageBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        require_non_empty(BlockType::Image, "url", &self.url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VideoBlock {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default)]
    pub autoplay: bool,
}

impl VideoBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        require_non_empty(BlockType::Video, "url", &self.url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AudioBlock {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl AudioBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        require_non_empty(BlockType::Audio, "url", &self.url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EmbedBlock {
    #[serde(default)]
    pub url: String,
}

impl EmbedBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        require_non_empty(BlockType::Embed, "url", &self.url)?;
        if reqwest::Url::parse(&self.url).is_err() {
            return Err(invalid(BlockType::Embed, "url must be absolute"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MapBlock {
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

fn default_zoom() -> u8 {
    14
}

impl Default for MapBlock {
    fn default() -> Self {
        Self {
            address: String::new(),
            zoom: default_zoom(),
        }
    }
}

impl MapBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        require_non_empty(BlockType::Map, "address", &self.address)?;
        if !(1..=20).contains(&self.zoom) {
            return Err(invalid(BlockType::Map, "zoom must be 1-20"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CalendarBlock {
    #[serde(default)]
    pub url: String,
}

impl CalendarBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        require_non_empty(BlockType::Calendar, "url", &self.url)
    }
}
