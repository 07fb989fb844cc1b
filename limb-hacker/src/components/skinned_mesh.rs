use std::sync::Arc;

use crate::mesh::SkinnedMeshData;

/// Component that gives an entity skinned geometry. The data is shared and never mutated in place:
/// slicing produces new [`SkinnedMeshData`] and swaps it in.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinnedMesh {
    /// The geometry
    pub data: Arc<SkinnedMeshData>,
}

impl SkinnedMesh {
    /// Wrap some mesh data
    pub fn new(data: SkinnedMeshData) -> Self {
        Self {
            data: Arc::new(data),
        }
    }
}
