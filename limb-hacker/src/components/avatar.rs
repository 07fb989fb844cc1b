//! Components owned by the avatar system. limb-hacker doesn't drive them, but it has to switch them off
//! on severed fragments so a fragment doesn't try to rebuild or re-animate itself.

/// Drives building of the character from its recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarBuilder {
    /// Rebuild the character whenever its recipe changes?
    pub build_enabled: bool,
}

impl Default for AvatarBuilder {
    fn default() -> Self {
        Self {
            build_enabled: true,
        }
    }
}

/// Switches the character between animated and ragdoll physics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsAvatar {
    /// Layer the character's bones are moved to when it ragdolls
    pub ragdoll_layer: u32,
}

impl Default for PhysicsAvatar {
    fn default() -> Self {
        Self {
            ragdoll_layer: crate::DEFAULT_RAGDOLL_LAYER,
        }
    }
}

/// Plays animations on the skeleton
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animator {
    /// Is the animator running?
    pub enabled: bool,
    /// Name of the state the animator is currently in
    pub current_state: String,
}

impl Default for Animator {
    fn default() -> Self {
        Self {
            enabled: true,
            current_state: Default::default(),
        }
    }
}

/// Present while the avatar system is still constructing the character
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnderConstruction {}
