//! Containers and link lists.
use super::{invalid, require_non_empty, BlockError, BlockType, Gap};
use serde::{Deserialize, Serialize};

/// Settings shared by `columns`, `group`, `row` and `stack`. Children hang
/// off the container through their `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LayoutBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u8>,
    #[serde(default)]
    pub gap: Gap,
}

impl LayoutBlock {
    pub fn columns() -> Self {
        Self {
            columns: Some(2),
            gap: Gap::default(),
        }
    }

    pub fn validate(&self, kind: BlockType) -> Result<(), BlockError> {
        match (kind, self.columns) {
            (BlockType::Columns, None) => Err(invalid(kind, "columns must be set")),
            (BlockType::Columns, Some(n)) if !(1..=6).contains(&n) => {
                Err(invalid(kind, "columns must be 1-6"))
            }
            (BlockType::Columns, Some(_)) => Ok(()),
            (_, Some(_)) => Err(invalid(kind, "only columns blocks take a column count")),
            (_, None) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NavLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NavigationBlock {
    #[serde(default)]
    pub links: Vec<NavLink>,
}

impl NavigationBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        for link in &self.links {
            require_non_empty(BlockType::Navigation, "link label", &link.label)?;
            require_non_empty(BlockType::Navigation, "link url", &link.url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SocialBlock {
    #[serde(default)]
    pub links: Vec<SocialLink>,
}

impl SocialBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        for link in &self.links {
            require_non_empty(BlockType::Social, "platform", &link.platform)?;
            require_non_empty(BlockType::Social, "url", &link.url)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_count_only_on_columns() {
        LayoutBlock::columns().validate(BlockType::Columns).unwrap();
        assert!(LayoutBlock::default().validate(BlockType::Columns).is_err());
        assert!(LayoutBlock::columns().validate(BlockType::Stack).is_err());
        LayoutBlock::default().validate(BlockType::Row).unwrap();
    }
}
