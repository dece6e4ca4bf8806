use super::*;
use crate::constraint::{Axis, BoneAxis, ConstraintKind};
use crate::host::{HostArmature, MemoryArmature};
use crate::math::mirror_x;
use pretty_assertions::assert_eq;
use std::f64::consts::FRAC_PI_2;

fn approx(a: DVec3, b: DVec3) -> bool {
    a.abs_diff_eq(b, 1e-9)
}

fn two_bone_chain() -> MetaBoneCollection {
    let mut c = MetaBoneCollection::new();
    let a = c.new_bone("upper").unwrap();
    a.head = DVec3::new(0.1, 0.0, 1.0);
    a.tail = DVec3::new(0.4, 0.0, 1.0);
    let b = c.new_bone("lower").unwrap();
    b.head = DVec3::new(0.4, 0.0, 1.0);
    b.tail = DVec3::new(0.7, 0.1, 1.0);
    b.parent = Some("upper".into());
    b.use_connect = true;
    c
}

#[test]
fn test_duplicate_insert_leaves_collection_unchanged() {
    let mut c = two_bone_chain();
    let before: Vec<String> = c.names().map(String::from).collect();
    let err = c.new_bone("upper").unwrap_err();
    assert_eq!(err, RigError::DuplicateBone { name: "upper".into() });
    assert_eq!(c.len(), 2);
    assert_eq!(c.names().map(String::from).collect::<Vec<_>>(), before);
    assert!(approx(c.get("upper").unwrap().tail, DVec3::new(0.4, 0.0, 1.0)));
}

#[test]
fn test_require_reports_missing_bone() {
    let c = MetaBoneCollection::new();
    assert_eq!(c.require("foot.L").unwrap_err(), RigError::missing_bone("foot.L"));
}

#[test]
fn test_transform_length_pairs_chain() {
    let pairs = [
        (DMat4::IDENTITY, 0.5),
        (DMat4::from_rotation_x(0.3), 0.25),
        (DMat4::from_rotation_x(-0.2), 0.125),
    ];
    let chain = MetaBoneCollection::from_transform_length_pairs("finger2", &pairs);
    assert_eq!(chain.len(), 3);
    assert_eq!(
        chain.names().collect::<Vec<_>>(),
        vec!["finger2-1", "finger2-2", "finger2-3"]
    );

    let first = chain.get("finger2-1").unwrap();
    assert!(!first.use_connect);
    assert_eq!(first.parent, None);
    for name in ["finger2-2", "finger2-3"] {
        let bone = chain.get(name).unwrap();
        assert!(bone.use_connect);
        let parent = chain.get(bone.parent.as_deref().unwrap()).unwrap();
        assert!(approx(parent.tail, bone.head));
    }

    let total: f64 = chain.iter().map(MetaBone::length).sum();
    assert!((total - 0.875).abs() < 1e-12);
}

#[test]
fn test_angle_length_pairs_curl_about_x() {
    let chain = MetaBoneCollection::from_angle_length_pairs("toe1", &[(0.0, 1.0), (FRAC_PI_2, 1.0)]);
    let second = chain.get("toe1-2").unwrap();
    assert!(approx(second.head, DVec3::Y));
    assert!(approx(second.tail, DVec3::new(0.0, 1.0, 1.0)));
}

#[test]
fn test_bake_suffixes_and_remaps_parents() {
    let part = two_bone_chain();
    let baked = MetaBoneCollection::from_bakedata(&[
        BakeData::new(&part, DMat4::IDENTITY, Some('L')),
        BakeData::new(&part, mirror_x(), Some('R')),
    ])
    .unwrap();

    assert_eq!(baked.len(), 4);
    assert_eq!(baked.get("lower.L").unwrap().parent.as_deref(), Some("upper.L"));
    assert_eq!(baked.get("lower.R").unwrap().parent.as_deref(), Some("upper.R"));
    assert!(approx(baked.get("upper.R").unwrap().head, DVec3::new(-0.1, 0.0, 1.0)));
    assert!(baked.get("lower.R").unwrap().use_connect);
}

#[test]
fn test_mirror_bake_round_trip() {
    let part = two_bone_chain();
    let mirrored = MetaBoneCollection::from_bakedata(&[BakeData::new(&part, mirror_x(), None)]).unwrap();
    let back = MetaBoneCollection::from_bakedata(&[BakeData::new(&mirrored, mirror_x(), None)]).unwrap();
    for bone in part.iter() {
        let other = back.get(&bone.name).unwrap();
        assert!(approx(bone.head, other.head));
        assert!(approx(bone.tail, other.tail));
        assert!(approx(bone.align_roll, other.align_roll));
    }
}

#[test]
fn test_bake_collision_is_fatal() {
    let part = two_bone_chain();
    let err = MetaBoneCollection::from_bakedata(&[
        BakeData::new(&part, DMat4::IDENTITY, None),
        BakeData::new(&part, mirror_x(), None),
    ])
    .unwrap_err();
    assert_eq!(err, RigError::DuplicateBone { name: "upper".into() });
}

#[test]
fn test_bone_by_fraction() {
    let mut c = two_bone_chain();
    let twist = c.new_bone_by_fraction("upper-anchor", "upper", 0.0, 0.5).unwrap();
    assert!(approx(twist.head, DVec3::new(0.1, 0.0, 1.0)));
    assert!(approx(twist.tail, DVec3::new(0.25, 0.0, 1.0)));
    assert!(c.new_bone_by_fraction("x", "missing", 0.0, 1.0).is_err());
}

#[test]
fn test_rename_rewrites_parents_and_constraints() {
    let mut c = two_bone_chain();
    c.get_mut("upper").unwrap().add_constraint(
        "lower",
        ConstraintKind::RevoluteJoint {
            free_axis: BoneAxis::new("upper", Axis::X),
        },
    );
    c.rename("upper", "MCH-upper").unwrap();

    assert!(c.get("upper").is_none());
    let upper = c.get("MCH-upper").unwrap();
    assert_eq!(upper.name, "MCH-upper");
    assert_eq!(c.get("lower").unwrap().parent.as_deref(), Some("MCH-upper"));
    match &upper.constraints[0].kind {
        ConstraintKind::RevoluteJoint { free_axis } => assert_eq!(free_axis.bone, "MCH-upper"),
        other => panic!("unexpected kind {:?}", other),
    }

    assert!(matches!(c.rename("lower", "MCH-upper"), Err(RigError::DuplicateBone { .. })));
}

#[test]
fn test_remove_orphans_children() {
    let mut c = two_bone_chain();
    let removed = c.remove("upper").unwrap();
    assert_eq!(removed.name, "upper");
    assert_eq!(c.len(), 1);
    let lower = c.get("lower").unwrap();
    assert_eq!(lower.parent, None);
    assert!(!lower.use_connect);
    assert!(c.remove("upper").is_none());
}

#[test]
fn test_hierarchy_order_puts_parents_first() {
    let mut c = MetaBoneCollection::new();
    c.new_bone("child").unwrap().parent = Some("parent".into());
    c.new_bone("parent").unwrap().parent = Some("root".into());
    c.new_bone("root").unwrap();
    assert_eq!(c.hierarchy_order().unwrap(), vec!["root", "parent", "child"]);
}

#[test]
fn test_hierarchy_order_rejects_dangling_parent() {
    let mut c = MetaBoneCollection::new();
    c.new_bone("a").unwrap().parent = Some("ghost".into());
    assert_eq!(
        c.hierarchy_order().unwrap_err(),
        RigError::DanglingParent {
            bone: "a".into(),
            parent: "ghost".into()
        }
    );
}

#[test]
fn test_assign_connectivity() {
    let mut c = two_bone_chain();
    c.get_mut("lower").unwrap().use_connect = false;
    let extra = c.new_bone("offset").unwrap();
    extra.head = DVec3::new(0.5, 0.0, 1.0);
    extra.tail = DVec3::new(0.6, 0.0, 1.0);
    extra.parent = Some("upper".into());
    extra.use_connect = true;

    c.assign_connectivity();
    assert!(c.get("lower").unwrap().use_connect);
    assert!(!c.get("offset").unwrap().use_connect);
    assert!(!c.get("upper").unwrap().use_connect);
}

#[test]
fn test_push_requires_edit_mode() {
    let c = two_bone_chain();
    let mut host = MemoryArmature::new("Meta Armature");
    assert_eq!(
        c.push(&mut host).unwrap_err(),
        RigError::WrongHostMode {
            expected: HostMode::Edit,
            actual: HostMode::Object
        }
    );
}

#[test]
fn test_push_skips_invalid_bones_and_existing_constraints() {
    let mut c = two_bone_chain();
    let stub = c.new_bone("stub").unwrap();
    stub.tail = stub.head;
    c.get_mut("upper").unwrap().add_constraint(
        "lower",
        ConstraintKind::TwistJoint {
            axis_a: BoneAxis::new("upper", Axis::Y),
            axis_b: BoneAxis::new("lower", Axis::Y),
        },
    );

    let mut host = MemoryArmature::new("Rig");
    host.set_mode(HostMode::Edit);
    let stats = c.push(&mut host).unwrap();
    assert_eq!(stats.bones_created, 2);
    assert_eq!(stats.constraints_added, 1);
    assert_eq!(host.mode(), HostMode::Pose);
    assert!(host.bone("stub").is_none());
    assert_eq!(host.bone("lower").unwrap().parent.as_deref(), Some("upper"));

    host.set_mode(HostMode::Edit);
    let again = c.push(&mut host).unwrap();
    assert_eq!(again.bones_created, 0);
    assert_eq!(again.constraints_added, 0);
    assert_eq!(again.constraints_skipped, 1);
    assert_eq!(host.bone("upper").unwrap().constraints.len(), 1);
}

#[test]
fn test_push_failure_leaves_host_untouched() {
    let mut c = two_bone_chain();
    let rollless = c.new_bone("rollless").unwrap();
    rollless.tail = DVec3::Y;
    rollless.align_roll = DVec3::ZERO;

    let mut host = MemoryArmature::new("Rig");
    host.set_mode(HostMode::Edit);
    let err = c.push(&mut host).unwrap_err();

    assert_eq!(err, RigError::DegenerateRoll { bone: "rollless".into() });
    assert!(host.bones().is_empty());
    assert!(host.bone("upper").is_none());
    assert_eq!(host.mode(), HostMode::Edit);
}

#[test]
fn test_pull_requires_pose_mode() {
    let host = MemoryArmature::new("Rig");
    assert!(matches!(
        MetaBoneCollection::pull(&host),
        Err(RigError::WrongHostMode {
            expected: HostMode::Pose,
            ..
        })
    ));
}

#[test]
fn test_control_targets() {
    let mut c = two_bone_chain();
    c.new_bone("lower-target").unwrap();
    c.get_mut("lower")
        .unwrap()
        .add_named_constraint("lower-target", "lower-target", ConstraintKind::control(0.0, 2.0, 0.1));
    let targets = c.control_targets();
    assert!(targets.contains("lower-target"));
    assert_eq!(targets.len(), 1);
    assert_eq!(c.constraint_count(), 1);
}
