use limb_hacker::{
    archetype::ArchetypeId,
    bone::BoneIdentity,
    components::{
        BodyType, Fragment, Hackable, Info, PhysicsAvatar, PhysicsLayer, RigidBody, Skin,
        SkinnedMesh,
    },
    hecs::World,
    mesh::BoneWeight,
    resources::AvatarRig,
    rig_builder::{Rig, RigBuilder},
    systems::{slice::InfillMode, ArchetypeCheck, ComponentRemoval, HandoffState},
    util::{is_active, Hierarchy},
    LimbHacker, SliceOutcome, SliceRequest,
};

/// A humanoid that has finished building, with `selected` marked as severable
fn ready_human(world: &mut World, selected: &[&str]) -> (Rig, AvatarRig, LimbHacker) {
    let rig = RigBuilder::humanoid("Human", ArchetypeId(1)).build(world);
    world
        .insert_one(rig.root, Hackable::new(Some(InfillMode::Sloppy)))
        .unwrap();
    let mut avatar = AvatarRig::new(rig.root, rig.archetype.clone());
    avatar.finish_build(world, "Root");

    let hacker = LimbHacker::default();
    assert_eq!(
        hacker.init_hackable(world, &avatar).unwrap(),
        ArchetypeCheck::Changed
    );
    {
        let mut hackable = world.get::<&mut Hackable>(rig.root).unwrap();
        for name in selected {
            assert!(hackable.selector.select(BoneIdentity::new(name)));
        }
    }
    assert!(hacker.sync_severables(world, &avatar).unwrap());
    (rig, avatar, hacker)
}

fn sliced(outcome: SliceOutcome) -> limb_hacker::SliceReport {
    match outcome {
        SliceOutcome::Sliced(report) => report,
        SliceOutcome::Deferred => panic!("Slice was deferred"),
    }
}

#[test]
pub fn test_hack_off_a_leg() {
    let mut world = World::new();
    let (rig, avatar, hacker) = ready_human(&mut world, &["LeftUpLeg"]);
    let leg = rig.bone("LeftUpLeg").unwrap();
    let vertices_before = world
        .get::<&SkinnedMesh>(rig.renderer)
        .unwrap()
        .data
        .vertex_count();

    let report = sliced(
        hacker
            .request_slice(&mut world, &avatar, &SliceRequest::new(rig.root, vec![leg]))
            .unwrap(),
    );
    assert_eq!(report.fragments.len(), 1);
    assert_eq!(report.states, vec![HandoffState::Finalized]);
    assert!(report.skipped.is_empty());

    let fragment = report.fragments[0];
    {
        let tagged = world.get::<&Fragment>(fragment).unwrap();
        assert_eq!(tagged.source, rig.root);
        assert_eq!(tagged.cut_bone, leg);
        assert_eq!(tagged.handoff, HandoffState::Finalized);
    }
    assert_eq!(
        *world.get::<&PhysicsLayer>(fragment).unwrap(),
        PhysicsLayer(limb_hacker::DEFAULT_RAGDOLL_LAYER)
    );

    // The fragment's leg has been handed to physics, the body's leg is still animated
    let hierarchy = Hierarchy::snapshot(&world);
    let fragment_leg = hierarchy
        .find_descendant(&world, fragment, "LeftUpLeg")
        .unwrap();
    assert!(is_active(&world, fragment_leg));
    assert_eq!(
        world.get::<&RigidBody>(fragment_leg).unwrap().body_type,
        BodyType::Dynamic
    );
    assert_eq!(
        world.get::<&RigidBody>(leg).unwrap().body_type,
        BodyType::KinematicPositionBased
    );

    // The body lost the leg's geometry but gained a cap
    let kept = world.get::<&SkinnedMesh>(rig.renderer).unwrap().data.clone();
    assert!(kept.vertex_count() < vertices_before);
    assert!(!kept.infill_indices.is_empty());

    // The leg can't be cut off twice
    assert!(world.get::<&Hackable>(rig.root).unwrap().severables.is_empty());
    let report = sliced(
        hacker
            .request_slice(&mut world, &avatar, &SliceRequest::new(rig.root, vec![leg]))
            .unwrap(),
    );
    assert!(report.fragments.is_empty());
    assert_eq!(report.skipped, vec![leg]);
}

#[test]
pub fn test_slice_is_deferred_while_building() {
    let mut world = World::new();
    let (rig, mut avatar, hacker) = ready_human(&mut world, &["LeftArm"]);
    avatar.change_archetype(ArchetypeId(1));

    let entities = world.len();
    let mesh = world.get::<&SkinnedMesh>(rig.renderer).unwrap().data.clone();
    assert_eq!(
        hacker
            .request_slice(&mut world, &avatar, &SliceRequest::everything(rig.root))
            .unwrap(),
        SliceOutcome::Deferred
    );
    assert_eq!(world.len(), entities);
    assert_eq!(
        world.get::<&SkinnedMesh>(rig.renderer).unwrap().data,
        mesh
    );
    assert_eq!(
        world.get::<&Hackable>(rig.root).unwrap().severables,
        vec![rig.bone("LeftArm").unwrap()]
    );

    avatar.finish_build(&world, "Root");
    let report = sliced(
        hacker
            .request_slice(&mut world, &avatar, &SliceRequest::everything(rig.root))
            .unwrap(),
    );
    assert_eq!(report.fragments.len(), 1);
}

#[test]
pub fn test_everything_cuts_every_severable() {
    let mut world = World::new();
    let (rig, avatar, hacker) = ready_human(&mut world, &["LeftForeArm", "RightLeg", "Head"]);

    let report = sliced(
        hacker
            .request_slice(&mut world, &avatar, &SliceRequest::everything(rig.root))
            .unwrap(),
    );
    assert_eq!(report.fragments.len(), 3);
    assert!(report
        .states
        .iter()
        .all(|state| *state == HandoffState::Finalized));

    let mut cut_bones: Vec<_> = report
        .fragments
        .iter()
        .map(|f| world.get::<&Fragment>(*f).unwrap().cut_bone)
        .collect();
    cut_bones.sort();
    let mut expected = vec![
        rig.bone("LeftForeArm").unwrap(),
        rig.bone("RightLeg").unwrap(),
        rig.bone("Head").unwrap(),
    ];
    expected.sort();
    assert_eq!(cut_bones, expected);
}

#[test]
pub fn test_bones_that_arent_severable_are_skipped() {
    let mut world = World::new();
    let (rig, avatar, hacker) = ready_human(&mut world, &["LeftHand"]);
    let hand = rig.bone("LeftHand").unwrap();
    let global = rig.bone("Global").unwrap();

    let report = sliced(
        hacker
            .request_slice(
                &mut world,
                &avatar,
                &SliceRequest::new(rig.root, vec![global, hand]),
            )
            .unwrap(),
    );
    assert_eq!(report.skipped, vec![global]);
    assert_eq!(report.fragments.len(), 1);
}

#[test]
pub fn test_selection_survives_an_archetype_round_trip() {
    let mut world = World::new();
    let (rig, mut avatar, hacker) = ready_human(&mut world, &["LeftLeg"]);
    avatar.add_archetype(RigBuilder::humanoid("Orc", ArchetypeId(2)).archetype());

    avatar.change_archetype(ArchetypeId(2));
    assert_eq!(
        hacker.update(&mut world, &avatar).unwrap(),
        ArchetypeCheck::Deferred
    );
    avatar.finish_build(&world, "Root");
    assert_eq!(
        hacker.update(&mut world, &avatar).unwrap(),
        ArchetypeCheck::Changed
    );

    // The orc has the same bones, so it starts from the human's selection
    {
        let mut hackable = world.get::<&mut Hackable>(rig.root).unwrap();
        assert!(hackable.selector.is_selected(BoneIdentity::new("LeftLeg").hash));
        assert!(hackable.selector.select(BoneIdentity::new("RightLeg")));
    }
    assert!(hacker.sync_severables(&mut world, &avatar).unwrap());
    assert_eq!(world.get::<&Hackable>(rig.root).unwrap().severables.len(), 2);

    // Back to the human: its own selection comes back
    avatar.change_archetype(ArchetypeId(1));
    avatar.finish_build(&world, "Root");
    assert_eq!(
        hacker.update(&mut world, &avatar).unwrap(),
        ArchetypeCheck::Changed
    );
    let hackable = world.get::<&Hackable>(rig.root).unwrap();
    assert_eq!(
        hackable.selector.selected(),
        &[BoneIdentity::new("LeftLeg")]
    );
    assert_eq!(hackable.severables, vec![rig.bone("LeftLeg").unwrap()]);
}

#[test]
pub fn test_stripped_avatar_still_picks_the_ragdoll_layer() {
    let mut world = World::new();
    let (rig, avatar, hacker) = ready_human(&mut world, &["LeftUpLeg"]);
    world
        .insert_one(rig.root, PhysicsAvatar { ragdoll_layer: 11 })
        .unwrap();
    world
        .get::<&mut Hackable>(rig.root)
        .unwrap()
        .template
        .components_to_remove
        .push(ComponentRemoval::of::<PhysicsAvatar>());

    let report = sliced(
        hacker
            .request_slice(&mut world, &avatar, &SliceRequest::everything(rig.root))
            .unwrap(),
    );
    assert_eq!(report.states, vec![HandoffState::Finalized]);
    let fragment = report.fragments[0];
    assert!(world.get::<&PhysicsAvatar>(fragment).is_err());
    assert_eq!(*world.get::<&PhysicsLayer>(fragment).unwrap(), PhysicsLayer(11));
}

#[test]
pub fn test_props_the_mesh_is_weighted_to_stay_kinematic() {
    let mut world = World::new();
    let (rig, avatar, hacker) = ready_human(&mut world, &["LeftUpLeg"]);
    let leg = rig.bone("LeftUpLeg").unwrap();
    let prop = world.spawn((Info::new("Sword", 0), RigidBody::kinematic_position_based()));

    let mut joints = world.get::<&Skin>(rig.renderer).unwrap().joints.clone();
    let leg_index = joints.iter().position(|j| *j == leg).unwrap();
    joints.push(prop);
    let prop_index = (joints.len() - 1) as u32;
    let mut mesh = (*world.get::<&SkinnedMesh>(rig.renderer).unwrap().data).clone();
    for weight in &mut mesh.bone_weights {
        if weight.dominant_bone() == Some(leg_index) {
            *weight = BoneWeight::new([leg_index as u32, prop_index, 0, 0], [0.9, 0.1, 0., 0.]);
        }
    }
    world.insert_one(rig.renderer, Skin { joints }).unwrap();
    world.insert_one(rig.renderer, SkinnedMesh::new(mesh)).unwrap();

    let report = sliced(
        hacker
            .request_slice(&mut world, &avatar, &SliceRequest::new(rig.root, vec![leg]))
            .unwrap(),
    );
    assert_eq!(report.states, vec![HandoffState::Finalized]);
    assert_eq!(
        world.get::<&RigidBody>(prop).unwrap().body_type,
        BodyType::KinematicPositionBased
    );
    assert!(world.get::<&PhysicsLayer>(prop).is_err());
}
