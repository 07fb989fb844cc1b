use hecs::{ComponentError, Entity, NoSuchEntity};
use thiserror::Error;

/// Everything that can go wrong while hacking a character apart.
///
/// Expected absences (a bone that isn't there yet, a slot with no mesh, a stale selection) are not
/// errors - they are skipped. These variants are reserved for input that is genuinely broken.
#[derive(Error, Debug)]
pub enum LimbHackerError {
    /// A component the operation cannot do without was missing
    #[error("Entity {entity:?} has no {component} component")]
    MissingComponent {
        /// The entity that was inspected
        entity: Entity,
        /// Name of the missing component
        component: &'static str,
    },
    /// The hackable has no skinned renderer beneath it
    #[error("No skinned renderer was found beneath {0:?}")]
    NoRenderer(Entity),
    /// The mesh data is inconsistent
    #[error("The mesh data is malformed: {0}")]
    InvalidMesh(String),
    /// A bone index does not exist in the bone tree
    #[error("Bone index {index} is out of range for a skeleton of {len} bones")]
    InvalidBone {
        /// The offending index
        index: usize,
        /// Number of bones in the tree
        len: usize,
    },
    /// The entity was despawned underneath us
    #[error(transparent)]
    NoSuchEntity(#[from] NoSuchEntity),
    /// A component could not be borrowed
    #[error(transparent)]
    Component(#[from] ComponentError),
    /// Something else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LimbHackerError {
    pub(crate) fn missing<T>(entity: Entity) -> Self {
        let component = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or("unknown");
        LimbHackerError::MissingComponent { entity, component }
    }
}
