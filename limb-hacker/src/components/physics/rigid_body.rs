use rapier3d::prelude::RigidBodyType as RapierBodyType;

/// A component that puts this entity in the physics simulation.
///
/// Bones of an animated character carry kinematic bodies: the animation moves them and the physics
/// simulation follows. Once a limb is severed, ragdoll handoff flips the bodies it needs to
/// [`BodyType::Dynamic`] so the physics simulation takes over.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    /// How the physics simulation should treat this body
    pub body_type: BodyType,
}

/// The kind of body, mirroring [`rapier3d::prelude::RigidBodyType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Moved by setting its position
    KinematicPositionBased,
    /// Moved by setting its velocity
    KinematicVelocityBased,
    /// Moved by the physics simulation
    Dynamic,
    /// Doesn't move
    Fixed,
}

impl From<BodyType> for RapierBodyType {
    fn from(r: BodyType) -> Self {
        match r {
            BodyType::KinematicPositionBased => RapierBodyType::KinematicPositionBased,
            BodyType::KinematicVelocityBased => RapierBodyType::KinematicVelocityBased,
            BodyType::Dynamic => RapierBodyType::Dynamic,
            BodyType::Fixed => RapierBodyType::Fixed,
        }
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
        }
    }
}

impl RigidBody {
    /// A body driven by animation
    pub fn kinematic_position_based() -> Self {
        Self {
            body_type: BodyType::KinematicPositionBased,
        }
    }

    /// Is this body moved by something other than the physics simulation?
    pub fn is_kinematic(&self) -> bool {
        matches!(
            self.body_type,
            BodyType::KinematicPositionBased | BodyType::KinematicVelocityBased
        )
    }

    /// Hand this body to (or take it back from) the physics simulation. Fixed bodies stay fixed.
    pub fn set_kinematic(&mut self, kinematic: bool) {
        match (kinematic, self.body_type) {
            (_, BodyType::Fixed) => {}
            (true, BodyType::Dynamic) => self.body_type = BodyType::KinematicPositionBased,
            (false, BodyType::KinematicPositionBased | BodyType::KinematicVelocityBased) => {
                self.body_type = BodyType::Dynamic
            }
            _ => {}
        }
    }
}
