use std::{collections::HashMap, f32::consts::TAU};

use glam::{Vec2, Vec3};
use hecs::{Entity, EntityBuilder, World};
use log::warn;
use rapier3d::prelude::SharedShape;

use crate::{
    archetype::{ArchetypeId, Recipe, RigArchetype, SlotData},
    bone::BoneIdentity,
    components::{
        Active, Animator, AvatarBuilder, Collider, Info, Parent, PhysicsAvatar, RigidBody, Skin,
        SkinnedMesh, SliceHandler,
    },
    mesh::{BoneWeight, SkinnedMeshData},
    SKELETON_ROOT_NAME,
};

const RING_SEGMENTS: u32 = 8;

#[derive(Debug, Clone)]
struct BoneSpec {
    name: String,
    parent: String,
    offset: Vec3,
    physics: bool,
}

/// Builds a character out of thin air: a bone hierarchy, a tube of skinned geometry wrapped around it and
/// an archetype describing it.
///
/// ```
/// use limb_hacker::{archetype::ArchetypeId, hecs::World, rig_builder::RigBuilder};
///
/// let mut world = World::new();
/// let rig = RigBuilder::humanoid("Human", ArchetypeId(1)).build(&mut world);
/// assert!(rig.bone("LeftLeg").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct RigBuilder {
    name: String,
    archetype_id: ArchetypeId,
    renderer_name: String,
    parent: Option<Entity>,
    ring_radius: f32,
    bones: Vec<BoneSpec>,
}

/// A character built by a [`RigBuilder`]
#[derive(Debug, Clone)]
pub struct Rig {
    /// The character's root entity
    pub root: Entity,
    /// The node the skeleton hangs off
    pub skeleton_root: Entity,
    /// The skinned renderer
    pub renderer: Entity,
    /// The archetype the character was built from
    pub archetype: RigArchetype,
    bones: HashMap<String, Entity>,
}

impl Rig {
    /// The bone named `name`
    pub fn bone(&self, name: &str) -> Option<Entity> {
        self.bones.get(name).copied()
    }
}

impl RigBuilder {
    /// A character with nothing but a skeleton root
    pub fn new(name: &str, archetype_id: ArchetypeId) -> Self {
        Self {
            name: name.to_string(),
            archetype_id,
            renderer_name: "Body".to_string(),
            parent: None,
            ring_radius: 0.06,
            bones: Vec::new(),
        }
    }

    /// A humanoid with the bookkeeping bones most rigs carry: `Global` and `Position` above the hips, and
    /// an `Adjust` bone on the head.
    pub fn humanoid(name: &str, archetype_id: ArchetypeId) -> Self {
        let mut builder = Self::new(name, archetype_id);
        builder
            .marker("Global", SKELETON_ROOT_NAME, Vec3::ZERO)
            .marker("Position", "Global", Vec3::ZERO)
            .bone("Hips", "Position", Vec3::new(0., 1., 0.))
            .bone("Spine", "Hips", Vec3::new(0., 0.25, 0.))
            .bone("Chest", "Spine", Vec3::new(0., 0.25, 0.))
            .bone("Neck", "Chest", Vec3::new(0., 0.2, 0.))
            .bone("Head", "Neck", Vec3::new(0., 0.1, 0.))
            .marker("HeadAdjust", "Head", Vec3::new(0., 0.1, 0.));
        for (side, x) in [("Left", 1.), ("Right", -1.)] {
            builder
                .bone(&format!("{side}Arm"), "Chest", Vec3::new(0.2 * x, 0.15, 0.))
                .bone(
                    &format!("{side}ForeArm"),
                    &format!("{side}Arm"),
                    Vec3::new(0.3 * x, 0., 0.),
                )
                .bone(
                    &format!("{side}Hand"),
                    &format!("{side}ForeArm"),
                    Vec3::new(0.25 * x, 0., 0.),
                )
                .bone(&format!("{side}UpLeg"), "Hips", Vec3::new(0.1 * x, -0.05, 0.))
                .bone(
                    &format!("{side}Leg"),
                    &format!("{side}UpLeg"),
                    Vec3::new(0., -0.45, 0.),
                )
                .bone(
                    &format!("{side}Foot"),
                    &format!("{side}Leg"),
                    Vec3::new(0., -0.45, 0.),
                );
        }
        builder
    }

    /// Add a bone with a body, a collider and a ring of geometry. `offset` is from the parent bone.
    pub fn bone(&mut self, name: &str, parent: &str, offset: Vec3) -> &mut Self {
        self.push(name, parent, offset, true)
    }

    /// Add a bone with no physics and no geometry of its own
    pub fn marker(&mut self, name: &str, parent: &str, offset: Vec3) -> &mut Self {
        self.push(name, parent, offset, false)
    }

    fn push(&mut self, name: &str, parent: &str, offset: Vec3, physics: bool) -> &mut Self {
        self.bones.push(BoneSpec {
            name: name.to_string(),
            parent: parent.to_string(),
            offset,
            physics,
        });
        self
    }

    /// Name the skinned renderer
    pub fn renderer_name(&mut self, name: &str) -> &mut Self {
        self.renderer_name = name.to_string();
        self
    }

    /// Put the character inside another entity
    pub fn parent(&mut self, parent: Entity) -> &mut Self {
        self.parent = Some(parent);
        self
    }

    /// Set the radius of the tube of geometry
    pub fn ring_radius(&mut self, radius: f32) -> &mut Self {
        self.ring_radius = radius;
        self
    }

    /// The archetype describing this character
    pub fn archetype(&self) -> RigArchetype {
        let bones = self
            .bones
            .iter()
            .map(|b| BoneIdentity::with_parent(&b.name, &b.parent))
            .collect();
        RigArchetype::new(
            self.archetype_id,
            &self.name,
            Recipe::new(vec![Some(SlotData::with_bones(&self.renderer_name, bones))]),
        )
    }

    /// Spawn the character into `world`
    pub fn build(&self, world: &mut World) -> Rig {
        let mut root = EntityBuilder::new();
        root.add(Info::new(&self.name, 0))
            .add(Active {})
            .add(AvatarBuilder::default())
            .add(PhysicsAvatar::default())
            .add(Animator::default())
            .add(SliceHandler::default())
            .add(RigidBody::kinematic_position_based())
            .add(Collider::new(SharedShape::capsule_y(0.6, 0.3)));
        if let Some(parent) = self.parent {
            root.add(Parent(parent));
        }
        let root = world.spawn(root.build());
        let skeleton_root = world.spawn((Info::new(SKELETON_ROOT_NAME, 1), Parent(root), Active {}));

        let mut bones = HashMap::new();
        let mut positions: HashMap<&str, Vec3> = HashMap::new();
        let mut joints = Vec::with_capacity(self.bones.len());
        for (i, spec) in self.bones.iter().enumerate() {
            let parent = match bones.get(&spec.parent) {
                Some(parent) => *parent,
                None => {
                    if spec.parent != SKELETON_ROOT_NAME {
                        warn!(
                            "[LIMB_HACKER] {} has an unknown parent {}, hanging it off the skeleton root",
                            spec.name, spec.parent
                        );
                    }
                    skeleton_root
                }
            };
            let parent_position = positions
                .get(spec.parent.as_str())
                .copied()
                .unwrap_or(Vec3::ZERO);
            positions.insert(&spec.name, parent_position + spec.offset);

            let mut bone = EntityBuilder::new();
            bone.add(Info::new(&spec.name, i + 2))
                .add(Parent(parent))
                .add(Active {});
            if spec.physics {
                let half_height = (spec.offset.length() * 0.5).max(0.05);
                bone.add(RigidBody::kinematic_position_based()).add(Collider::disabled(
                    SharedShape::capsule_y(half_height, self.ring_radius),
                ));
            }
            let bone = world.spawn(bone.build());
            bones.insert(spec.name.clone(), bone);
            joints.push(bone);
        }

        let mesh = self.tube(&positions);
        let renderer = world.spawn((
            Info::new(&self.renderer_name, self.bones.len() + 2),
            Parent(root),
            Active {},
            Skin { joints },
            SkinnedMesh::new(mesh),
        ));

        Rig {
            root,
            skeleton_root,
            renderer,
            archetype: self.archetype(),
            bones,
        }
    }

    /// A ring of vertices around every bone with physics, each joined to the ring of the nearest ancestor
    /// that has one.
    fn tube(&self, positions: &HashMap<&str, Vec3>) -> SkinnedMeshData {
        let mut mesh = SkinnedMeshData::default();
        let mut rings: HashMap<&str, u32> = HashMap::new();
        let bone_count = self.bones.len().max(1) as f32;

        for (joint, spec) in self.bones.iter().enumerate() {
            if !spec.physics {
                continue;
            }
            let centre = positions
                .get(spec.name.as_str())
                .copied()
                .unwrap_or_default();
            let direction = spec.offset.try_normalize().unwrap_or(Vec3::Y);
            let u = direction.any_orthonormal_vector();
            let v = direction.cross(u);

            let first = mesh.positions.len() as u32;
            for segment in 0..RING_SEGMENTS {
                let angle = segment as f32 / RING_SEGMENTS as f32 * TAU;
                let outward = u * angle.cos() + v * angle.sin();
                mesh.positions.push(centre + outward * self.ring_radius);
                mesh.normals.push(outward);
                mesh.uvs.push(Vec2::new(
                    segment as f32 / RING_SEGMENTS as f32,
                    joint as f32 / bone_count,
                ));
                mesh.bone_weights.push(BoneWeight::single(joint as u32));
            }

            if let Some(parent_ring) = self.nearest_ring(&spec.parent, &rings) {
                for segment in 0..RING_SEGMENTS {
                    let next = (segment + 1) % RING_SEGMENTS;
                    let (a, b) = (parent_ring + segment, parent_ring + next);
                    let (c, d) = (first + next, first + segment);
                    mesh.indices.extend([a, b, c, a, c, d]);
                }
            }
            rings.insert(&spec.name, first);
        }

        mesh
    }

    fn nearest_ring(&self, bone: &str, rings: &HashMap<&str, u32>) -> Option<u32> {
        let mut current = bone;
        for _ in 0..=self.bones.len() {
            if let Some(ring) = rings.get(current) {
                return Some(*ring);
            }
            current = self.bones.iter().find(|b| b.name == current)?.parent.as_str();
        }
        None
    }
}
