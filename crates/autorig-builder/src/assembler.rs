//! Full-body assembly of the meta-armature.
//!
//! Bilateral parts are authored once and baked twice: as-is for the left
//! side and mirrored across X for the right side.

use autorig_meta::math::{mirror_x, translation_of};
use autorig_meta::{ArmatureFlags, BakeData, LayerSet, MetaBoneCollection, PoseSink, PushStats, RigResult};
use glam::DMat4;
use log::{debug, info};

use crate::config::BodyParams;
use crate::parts;

/// Builds the merged meta-armature collection.
pub fn build_meta_armature(params: &BodyParams) -> RigResult<MetaBoneCollection> {
    params.validate()?;

    let arm = parts::build_arm(params)?;
    let leg = parts::build_leg(params)?;
    let spine = parts::build_spine(params)?;
    let face = parts::build_face(params)?;
    let fingers = parts::build_fingers(params)?;
    let toes = parts::build_toes(params)?;

    let left = DMat4::IDENTITY;
    let right = mirror_x();

    let arm_to_fingers = DMat4::from_translation(arm.require("loarm")?.tail);
    let leg_to_toes = DMat4::from_translation(leg.require("foot")?.tail);
    let wrist = DMat4::from_rotation_z(params.wrist_yaw.to_radians())
        * DMat4::from_rotation_x(params.wrist_pitch.to_radians())
        * DMat4::from_rotation_y(params.wrist_roll.to_radians());
    // Toes are authored along +Y; the feet point along -Y.
    let half_turn = DMat4::from_rotation_z(std::f64::consts::PI);

    debug!(
        "Wrist origin {:?}, toe origin {:?}",
        translation_of(&arm_to_fingers),
        translation_of(&leg_to_toes)
    );

    let mut bones = MetaBoneCollection::from_bakedata(&[
        BakeData::new(&arm, left, Some('L')),
        BakeData::new(&arm, right, Some('R')),
        BakeData::new(&leg, left, Some('L')),
        BakeData::new(&leg, right, Some('R')),
        BakeData::new(&spine, DMat4::IDENTITY, None),
        BakeData::new(&face, DMat4::IDENTITY, None),
        BakeData::new(&fingers, left * arm_to_fingers * wrist, Some('L')),
        BakeData::new(&fingers, right * arm_to_fingers * wrist, Some('R')),
        BakeData::new(&toes, left * leg_to_toes * half_turn, Some('L')),
        BakeData::new(&toes, right * leg_to_toes * half_turn, Some('R')),
    ])?;
    bones.assign_connectivity();

    debug!("Assembled {} meta-bones", bones.len());
    Ok(bones)
}

/// Builds the meta-armature and writes it into `host`.
///
/// The host must be in edit mode and is left in pose mode, flagged as a
/// meta-armature with every layer visible.
pub fn create_meta_armature<H: PoseSink + ?Sized>(host: &mut H, params: &BodyParams) -> RigResult<PushStats> {
    let bones = build_meta_armature(params)?;
    let stats = bones.push(host)?;

    host.set_visible_layers(LayerSet::all());
    host.set_flags(ArmatureFlags {
        is_meta_armature: true,
        is_auto_rig: false,
        use_thumb: params.use_thumb,
        use_simple_toe: params.use_simple_toe,
    });

    info!(
        "Created meta-armature '{}' with {} bones",
        host.name(),
        stats.bones_created
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorig_meta::{HostArmature, HostMode, MemoryArmature};
    use glam::DVec3;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_body_bone_count() {
        let bones = build_meta_armature(&BodyParams::default()).unwrap();
        // arms 2x3, legs 2x5, spine 7, face 3, fingers 2x20, toes 2x1
        assert_eq!(bones.len(), 6 + 10 + 7 + 3 + 40 + 2);
        bones.hierarchy_order().unwrap();
    }

    #[test]
    fn test_sides_are_mirror_images() {
        let bones = build_meta_armature(&BodyParams::default()).unwrap();
        for bone in bones.iter().filter(|b| b.name.ends_with(".L")) {
            let right_name = format!("{}.R", &bone.name[..bone.name.len() - 2]);
            let right = bones.get(&right_name).unwrap();
            let mirrored = DVec3::new(-bone.head.x, bone.head.y, bone.head.z);
            assert!(right.head.abs_diff_eq(mirrored, 1e-9), "{}", bone.name);
        }
    }

    #[test]
    fn test_fingers_start_at_wrist_and_toes_point_forward() {
        let params = BodyParams::default();
        let bones = build_meta_armature(&params).unwrap();
        let wrist = bones.get("loarm.L").unwrap().tail;
        let third = bones.get("finger3-1.L").unwrap();
        assert!(third.head.abs_diff_eq(wrist, 1e-9));
        // Default yaw swings the finger chains out along +X.
        assert!(third.y_axis().unwrap().x > 0.9);

        let toe = bones.get("toe1-1.L").unwrap();
        assert!(toe.head.abs_diff_eq(bones.get("foot.L").unwrap().tail, 1e-9));
        assert!(toe.y_axis().unwrap().y < -0.9);
    }

    #[test]
    fn test_connected_exactly_where_head_meets_parent_tail() {
        for num_fingers in 1..=5 {
            let params = BodyParams {
                num_fingers,
                ..BodyParams::default()
            };
            let bones = build_meta_armature(&params).unwrap();
            for bone in bones.iter() {
                let meets_parent = bone
                    .parent
                    .as_deref()
                    .and_then(|p| bones.get(p))
                    .is_some_and(|p| (p.tail - bone.head).length() < 1e-4);
                assert_eq!(bone.use_connect, meets_parent, "{} with {} fingers", bone.name, num_fingers);
            }
        }
    }

    #[test]
    fn test_create_meta_armature_sets_flags() {
        let mut host = MemoryArmature::new("Meta Armature");
        host.set_mode(HostMode::Edit);
        let params = BodyParams::default();
        let stats = create_meta_armature(&mut host, &params).unwrap();

        assert_eq!(stats.bones_created, host.bones().len());
        assert_eq!(host.mode(), HostMode::Pose);
        assert!(host.flags.is_meta_armature);
        assert!(host.flags.use_thumb);
        assert_eq!(host.visible_layers, LayerSet::all());
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let mut params = BodyParams::default();
        params.num_toes = 0;
        assert!(build_meta_armature(&params).is_err());
    }
}
