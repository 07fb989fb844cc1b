use hecs::Entity;

/// The bone table of a skinned renderer. Bone indices stored in a mesh's
/// [`crate::mesh::BoneWeight`]s index into `joints`.
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    /// The bone entity for each bone index
    pub joints: Vec<Entity>,
}

impl Skin {
    /// Bone index of `entity`, if it is part of this skin
    pub fn index_of(&self, entity: Entity) -> Option<usize> {
        self.joints.iter().position(|j| *j == entity)
    }
}
