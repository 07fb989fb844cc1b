use std::collections::HashMap;

use hecs::Entity;

use crate::util::Hierarchy;

/// The parent of every bone in a skin, by bone index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoneTree {
    parents: Vec<Option<usize>>,
}

impl BoneTree {
    /// Create a tree from the parent of each bone index
    pub fn new(parents: Vec<Option<usize>>) -> Self {
        Self { parents }
    }

    /// Build the tree for a skin's `joints`. A joint's parent is its nearest ancestor that is also one
    /// of the joints, so nodes that aren't part of the skin are stepped over.
    pub fn from_hierarchy(hierarchy: &Hierarchy, joints: &[Entity]) -> Self {
        let indices: HashMap<Entity, usize> =
            joints.iter().enumerate().map(|(i, j)| (*j, i)).collect();
        let parents = joints
            .iter()
            .map(|joint| {
                hierarchy
                    .ancestors(*joint)
                    .into_iter()
                    .find_map(|a| indices.get(&a).copied())
            })
            .collect();
        Self { parents }
    }

    /// Number of bones
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Does the tree have no bones?
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Parent of `bone`. Bones outside the tree have no parent.
    pub fn parent(&self, bone: usize) -> Option<usize> {
        self.parents.get(bone).copied().flatten()
    }

    /// Walk up from `bone` (inclusive) and return the position in `cut_bones` of the first cut bone
    /// found, if any.
    pub fn nearest_cut(&self, bone: usize, cut_bones: &[usize]) -> Option<usize> {
        let mut current = bone;
        for _ in 0..=self.parents.len() {
            if let Some(cut) = cut_bones.iter().position(|c| *c == current) {
                return Some(cut);
            }
            current = self.parent(current)?;
        }
        None
    }
}
