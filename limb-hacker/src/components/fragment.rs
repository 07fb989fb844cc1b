use hecs::Entity;

use crate::systems::ragdoll_handoff::HandoffState;

/// Component added to the root of every severed piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// The hackable this piece was cut from
    pub source: Entity,
    /// The bone (on the source) the cut was made at
    pub cut_bone: Entity,
    /// How far ragdoll handoff has progressed
    pub handoff: HandoffState,
}
