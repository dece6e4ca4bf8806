//! Push/pull round trips against the in-memory host.

use autorig_meta::layers::ArmatureLayer;
use autorig_meta::{
    Axis, BoneAxis, BonePoint, ConstraintKind, HostArmature, HostMode, LayerSet, MemoryArmature,
    MetaBoneCollection, RigError,
};
use glam::DVec3;
use pretty_assertions::assert_eq;

fn arm() -> MetaBoneCollection {
    let mut bones = MetaBoneCollection::new();

    let upper = bones.new_bone("uparm.L").unwrap();
    upper.head = DVec3::new(0.17, 0.02, 1.45);
    upper.tail = DVec3::new(0.42, 0.04, 1.45);
    upper.align_roll = DVec3::Z;
    upper.use_deform = true;
    upper.head_radius = Some(0.02);
    upper.layers = LayerSet::from_layers(&[ArmatureLayer::ArmL, ArmatureLayer::Animatable]);

    let lower = bones.new_bone("loarm.L").unwrap();
    lower.head = DVec3::new(0.42, 0.04, 1.45);
    lower.tail = DVec3::new(0.70, 0.03, 1.45);
    lower.parent = Some("uparm.L".into());
    lower.use_connect = true;
    lower.pose.use_bepuik = true;
    lower.bbone_segments = 32;

    let upper = bones.get_mut("uparm.L").unwrap();
    upper.add_constraint(
        "loarm.L",
        ConstraintKind::SwingLimit {
            axis_a: BoneAxis::new("loarm.L", Axis::X),
            axis_b: BoneAxis::new("loarm.L", Axis::Y),
            max_swing: 90.0,
        },
    );
    upper.add_constraint(
        "loarm.L",
        ConstraintKind::BallSocketJoint {
            anchor: BonePoint::new("loarm.L", 0.0),
        },
    );
    bones
}

#[test]
fn push_then_pull_preserves_bones() {
    let bones = arm();
    let mut host = MemoryArmature::new("Rig");
    host.set_mode(HostMode::Edit);
    bones.push(&mut host).unwrap();

    let pulled = MetaBoneCollection::pull(&host).unwrap();
    assert_eq!(pulled.len(), 2);

    let lower = pulled.get("loarm.L").unwrap();
    assert_eq!(lower.parent.as_deref(), Some("uparm.L"));
    assert!(lower.use_connect);
    assert!(lower.pose.use_bepuik);
    assert_eq!(lower.bbone_segments, 32);

    let upper = pulled.get("uparm.L").unwrap();
    assert_eq!(upper.head_radius, Some(0.02));
    assert!((upper.envelope_distance.unwrap() - 0.3).abs() < 1e-12);
    assert!(upper.layers.contains(ArmatureLayer::ArmL));

    // The pulled align vector is the bone's z axis.
    let original_z = bones.get("uparm.L").unwrap().z_axis().unwrap();
    assert!(upper.align_roll.abs_diff_eq(original_z, 1e-12));
    assert!(upper.z_axis().unwrap().abs_diff_eq(original_z, 1e-12));
}

#[test]
fn pulled_constraints_match_authored() {
    let bones = arm();
    let mut host = MemoryArmature::new("Rig");
    host.set_mode(HostMode::Edit);
    bones.push(&mut host).unwrap();

    let pulled = MetaBoneCollection::pull(&host).unwrap();
    let authored = &bones.get("uparm.L").unwrap().constraints;
    let read_back = &pulled.get("uparm.L").unwrap().constraints;
    assert_eq!(read_back.len(), authored.len());
    assert_eq!(read_back[0].name, "bepuik_swing_limit_1");
    assert_eq!(read_back[1], authored[1]);
    match &read_back[0].kind {
        ConstraintKind::SwingLimit { max_swing, .. } => assert!((max_swing - 90.0).abs() < 1e-9),
        other => panic!("unexpected kind {:?}", other),
    }
}

#[test]
fn pull_from_edit_mode_is_rejected() {
    let mut host = MemoryArmature::new("Rig");
    host.set_mode(HostMode::Edit);
    assert_eq!(
        MetaBoneCollection::pull(&host).unwrap_err(),
        RigError::WrongHostMode {
            expected: HostMode::Pose,
            actual: HostMode::Edit
        }
    );
}

#[test]
fn host_dump_survives_json() {
    let bones = arm();
    let mut host = MemoryArmature::new("Rig");
    host.set_mode(HostMode::Edit);
    bones.push(&mut host).unwrap();

    let json = serde_json::to_string(&host).unwrap();
    let restored: MemoryArmature = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, host);
}
