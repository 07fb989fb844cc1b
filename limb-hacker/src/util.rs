use std::collections::HashMap;

use hecs::{Entity, World};

use crate::components::{Active, Info, Parent};

/// A snapshot of the transform hierarchy, built from every [`Parent`] component in the world.
///
/// Children are ordered by their [`Info::node_id`] (then by entity id), so walks are stable no matter
/// what order the entities were spawned in. The snapshot goes stale as soon as the hierarchy changes -
/// take a new one.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    children: HashMap<Entity, Vec<Entity>>,
    parents: HashMap<Entity, Entity>,
}

impl Hierarchy {
    /// Build a snapshot of the world's hierarchy
    pub fn snapshot(world: &World) -> Self {
        let mut children: HashMap<Entity, Vec<(usize, Entity)>> = HashMap::new();
        let mut parents = HashMap::new();

        for (entity, (parent, info)) in world.query::<(&Parent, Option<&Info>)>().iter() {
            let order = info.map(|i| i.node_id).unwrap_or(usize::MAX);
            children.entry(parent.0).or_default().push((order, entity));
            parents.insert(entity, parent.0);
        }

        let children = children
            .into_iter()
            .map(|(parent, mut kids)| {
                kids.sort_by_key(|(order, entity)| (*order, entity.id()));
                (parent, kids.into_iter().map(|(_, e)| e).collect())
            })
            .collect();

        Self { children, parents }
    }

    /// The direct children of `entity`
    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.children
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The parent of `entity`, if it has one
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.parents.get(&entity).copied()
    }

    /// Every descendant of `entity` (not including `entity`), depth first, pre-order
    pub fn descendants(&self, entity: Entity) -> Vec<Entity> {
        let mut descendants = Vec::new();
        let mut stack: Vec<Entity> = self.children(entity).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            descendants.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        descendants
    }

    /// Every ancestor of `entity`, nearest first
    pub fn ancestors(&self, entity: Entity) -> Vec<Entity> {
        let mut ancestors = Vec::new();
        let mut current = entity;
        // Bounded by the number of parent links, so a malformed cycle can't hang us
        while ancestors.len() < self.parents.len() {
            match self.parent(current) {
                Some(p) => {
                    ancestors.push(p);
                    current = p;
                }
                None => break,
            }
        }
        ancestors
    }

    /// Is `ancestor` somewhere above `entity`?
    pub fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        self.ancestors(entity).contains(&ancestor)
    }

    /// The first direct child of `entity` named `name`
    pub fn find_child(&self, world: &World, entity: Entity, name: &str) -> Option<Entity> {
        self.children(entity)
            .iter()
            .copied()
            .find(|child| has_name(world, *child, name))
    }

    /// The first descendant of `entity` named `name`, depth first
    pub fn find_descendant(&self, world: &World, entity: Entity, name: &str) -> Option<Entity> {
        self.descendants(entity)
            .into_iter()
            .find(|d| has_name(world, *d, name))
    }
}

/// Does `entity` have an [`Info`] named `name`?
pub fn has_name(world: &World, entity: Entity, name: &str) -> bool {
    world
        .get::<&Info>(entity)
        .map(|info| info.name == name)
        .unwrap_or(false)
}

/// The name of `entity`, or a placeholder if it has none
pub fn name_of(world: &World, entity: Entity) -> String {
    world
        .get::<&Info>(entity)
        .map(|info| info.name.clone())
        .unwrap_or_else(|_| format!("{entity:?}"))
}

/// Switch `entity` on. Despawned entities are ignored.
pub fn activate(world: &mut World, entity: Entity) {
    let _ = world.insert_one(entity, Active {});
}

/// Switch `entity` off. Entities that are already off are ignored.
pub fn deactivate(world: &mut World, entity: Entity) {
    let _ = world.remove_one::<Active>(entity);
}

/// Is `entity` switched on?
pub fn is_active(world: &World, entity: Entity) -> bool {
    world
        .entity(entity)
        .map(|e| e.has::<Active>())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_hierarchy_walk_is_ordered() {
        let mut world = World::new();
        let root = world.spawn((Info::new("Root", 0),));
        // Spawn the children out of order; node_id decides.
        let b = world.spawn((Info::new("B", 2), Parent(root)));
        let a = world.spawn((Info::new("A", 1), Parent(root)));
        let a_child = world.spawn((Info::new("A.1", 3), Parent(a)));
        let b_child = world.spawn((Info::new("B.1", 4), Parent(b)));

        let hierarchy = Hierarchy::snapshot(&world);
        assert_eq!(hierarchy.children(root), &[a, b]);
        assert_eq!(hierarchy.descendants(root), vec![a, a_child, b, b_child]);
        assert!(hierarchy.descendants(a_child).is_empty());
        assert_eq!(hierarchy.parent(b_child), Some(b));
        assert!(hierarchy.is_ancestor(root, b_child));
        assert!(!hierarchy.is_ancestor(a, b_child));
        assert_eq!(hierarchy.ancestors(b_child), vec![b, root]);
        assert!(hierarchy.ancestors(root).is_empty());

        assert_eq!(hierarchy.find_child(&world, root, "B"), Some(b));
        assert_eq!(hierarchy.find_child(&world, root, "B.1"), None);
        assert_eq!(hierarchy.find_descendant(&world, root, "B.1"), Some(b_child));
    }

    #[test]
    pub fn test_activation() {
        let mut world = World::new();
        let entity = world.spawn((Info::new("Bone", 0),));
        assert!(!is_active(&world, entity));
        activate(&mut world, entity);
        assert!(is_active(&world, entity));
        deactivate(&mut world, entity);
        deactivate(&mut world, entity);
        assert!(!is_active(&world, entity));
        assert_eq!(name_of(&world, entity), "Bone");
    }
}
