use hecs::Entity;

use crate::systems::{
    fragment_assembler::HackTemplate, severable_selector::SeverableSelector, slice::InfillMode,
};

/// Component that makes a character hackable. Lives on the character's root entity.
#[derive(Debug, Clone, Default)]
pub struct Hackable {
    /// The bone entities limbs may be cut at, resolved from the selector's selection
    pub severables: Vec<Entity>,
    /// How to cap the cuts. `None` leaves them open.
    pub infill: Option<InfillMode>,
    /// What to strip from and add to each severed piece
    pub template: HackTemplate,
    /// Which bones of the character's archetype are severable
    pub selector: SeverableSelector,
}

impl Hackable {
    /// Create a hackable that caps its cuts with `infill`
    pub fn new(infill: Option<InfillMode>) -> Self {
        Self {
            infill,
            ..Default::default()
        }
    }

    /// Add a bone to the runtime severables, unless it's already there
    pub fn add_severable(&mut self, bone: Entity) {
        if !self.severables.contains(&bone) {
            self.severables.push(bone);
        }
    }

    /// Remove a bone from the runtime severables
    pub fn remove_severable(&mut self, bone: Entity) {
        self.severables.retain(|b| *b != bone);
    }

    /// Forget every selected bone, both the selection and the resolved severables
    pub fn clear_selected_severables(&mut self) {
        self.severables.clear();
        self.selector.clear_selection();
    }
}

/// Back-reference from a collider-bearing entity to the hackable it belongs to, so collision handlers
/// can work out what they hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildOfHackable {
    /// The hackable's root entity
    pub parent_hackable: Entity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        archetype::{ArchetypeId, Recipe, RigArchetype, SlotData},
        bone::BoneIdentity,
    };
    use hecs::World;

    #[test]
    pub fn test_severables_are_not_duplicated() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn(());

        let mut hackable = Hackable::default();
        hackable.add_severable(a);
        hackable.add_severable(b);
        hackable.add_severable(a);
        assert_eq!(hackable.severables, vec![a, b]);

        hackable.remove_severable(a);
        assert_eq!(hackable.severables, vec![b]);

        let body = SlotData::with_bones("Body", vec![BoneIdentity::new("LeftLeg")]);
        let archetype = RigArchetype::new(ArchetypeId(1), "Human", Recipe::new(vec![Some(body)]));
        hackable.selector.refresh(&archetype, &[]);
        assert!(hackable.selector.select(BoneIdentity::new("LeftLeg")));
        hackable.clear_selected_severables();
        assert!(hackable.severables.is_empty());
        assert!(hackable.selector.selected().is_empty());
    }
}
