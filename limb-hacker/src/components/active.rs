/// The Active component determines whether a given entity takes part in the simulation.
///
/// An entity without it is switched off: it isn't animated, and its rigid body and collider are ignored
/// by the physics system.
///
/// Basic usage:
/// ```ignore
/// world.insert_one(entity, Active {})
/// world.remove_one::<Active>(entity)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Active {}
