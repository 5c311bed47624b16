//! Sibling ordering and nesting for an article's blocks.
use super::{Block, BlockError, BlockPayload};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockTree {
    article_id: Uuid,
    blocks: Vec<Block>,
}

impl BlockTree {
    pub fn new(article_id: Uuid) -> Self {
        Self {
            article_id,
            blocks: Vec::new(),
        }
    }

    pub fn from_blocks(article_id: Uuid, blocks: Vec<Block>) -> Self {
        Self { article_id, blocks }
    }

    pub fn article_id(&self) -> Uuid {
        self.article_id
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn get(&self, id: Uuid) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// Children of `parent` (top level when `None`) in render order.
    pub fn siblings(&self, parent: Option<Uuid>) -> Vec<&Block> {
        let mut out: Vec<&Block> = self
            .blocks
            .iter()
            .filter(|b| b.parent_id == parent)
            .collect();
        out.sort_by_key(|b| b.order);
        out
    }

    /// Add a block after its last sibling and return its id.
    pub fn append(&mut self, parent: Option<Uuid>, payload: BlockPayload) -> Result<Uuid, BlockError> {
        if let Some(parent_id) = parent {
            let parent_block = self.get(parent_id).ok_or(BlockError::NotFound(parent_id))?;
            check_container(parent_block)?;
        }
        let last = self.siblings(parent).last().map(|b| b.order);
        let order = match last {
            None => 0,
            Some(last) => match last.checked_add(1) {
                Some(next) => next,
                // Orders are exhausted at the top; compact the level first.
                None => {
                    let ids: Vec<Uuid> = self.siblings(parent).iter().map(|b| b.id).collect();
                    self.renumber(&ids);
                    ids.len() as i32
                }
            },
        };
        let block = Block::new(self.article_id, parent, order, payload);
        let id = block.id;
        self.blocks.push(block);
        Ok(id)
    }

    /// Move a block to `to_index` among its siblings and renumber that
    /// sibling level densely from zero. Out-of-range targets are a no-op.
    pub fn move_block(&mut self, id: Uuid, to_index: usize) -> Result<bool, BlockError> {
        let parent = self.get(id).ok_or(BlockError::NotFound(id))?.parent_id;
        let mut ids: Vec<Uuid> = self.siblings(parent).iter().map(|b| b.id).collect();
        if to_index >= ids.len() {
            return Ok(false);
        }
        let from = ids.iter().position(|s| *s == id).ok_or(BlockError::NotFound(id))?;
        let moved = ids.remove(from);
        ids.insert(to_index, moved);
        self.renumber(&ids);
        Ok(true)
    }

    /// Remove a block together with everything nested under it.
    pub fn remove(&mut self, id: Uuid) -> Result<Vec<Block>, BlockError> {
        let parent = self.get(id).ok_or(BlockError::NotFound(id))?.parent_id;
        let mut doomed = HashSet::from([id]);
        loop {
            let before = doomed.len();
            for b in &self.blocks {
                if let Some(p) = b.parent_id {
                    if doomed.contains(&p) {
                        doomed.insert(b.id);
                    }
                }
            }
            if doomed.len() == before {
                break;
            }
        }
        let (removed, kept): (Vec<Block>, Vec<Block>) = std::mem::take(&mut self.blocks)
            .into_iter()
            .partition(|b| doomed.contains(&b.id));
        self.blocks = kept;
        let remaining: Vec<Uuid> = self.siblings(parent).iter().map(|b| b.id).collect();
        self.renumber(&remaining);
        Ok(removed)
    }

    fn renumber(&mut self, ordered_ids: &[Uuid]) {
        for (order, id) in ordered_ids.iter().enumerate() {
            if let Some(block) = self.get_mut(*id) {
                block.order = order as i32;
            }
        }
    }

    /// Sibling orders are distinct and parents exist and are containers.
    pub fn validate_structure(&self) -> Result<(), BlockError> {
        let mut seen: HashMap<(Option<Uuid>, i32), Uuid> = HashMap::new();
        for b in &self.blocks {
            if let Some(parent) = b.parent_id {
                let Some(parent_block) = self.get(parent) else {
                    return Err(BlockError::MissingParent { block: b.id, parent });
                };
                check_container(parent_block)?;
            }
            if seen.insert((b.parent_id, b.order), b.id).is_some() {
                return Err(BlockError::DuplicateOrder {
                    parent: b.parent_id,
                    order: b.order,
                });
            }
        }
        Ok(())
    }

    /// Structure plus every payload.
    pub fn validate(&self) -> Result<(), BlockError> {
        self.validate_structure()?;
        for b in &self.blocks {
            b.payload.validate()?;
        }
        Ok(())
    }
}

fn check_container(parent: &Block) -> Result<(), BlockError> {
    let kind = parent.block_type();
    if !kind.is_container() {
        return Err(BlockError::NotContainer {
            parent: parent.id,
            kind: kind.as_str(),
        });
    }
    Ok(())
}
