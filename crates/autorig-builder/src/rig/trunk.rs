//! Root, face and spine regions.

use autorig_meta::widget::{WIDGET_EYE_TARGET, WIDGET_ROOT};
use autorig_meta::{ConstraintKind, GenericConstraint, GenericKind, RigResult};
use glam::DVec3;

use super::joints::{swing_limit, twist_joint, twist_limit};
use super::{RigSession, ROOT_BONE};
use crate::parts::SPINE_NAMES;

pub(super) const EYE_TARGET: &str = "eye_target";

impl RigSession<'_> {
    pub(super) fn add_root(&mut self) -> RigResult<()> {
        let root = self.bones.new_bone(ROOT_BONE)?;
        root.head = DVec3::ZERO;
        root.tail = DVec3::Y;
        root.align_roll = DVec3::Z;
        self.assign_widget(ROOT_BONE, WIDGET_ROOT, None)
    }

    /// A bar in front of the eyes, as wide as both eyes together.
    pub(super) fn add_eye_target(&mut self) -> RigResult<()> {
        let left = self.bones.require("eye.L")?;
        let right = self.bones.require("eye.R")?;
        let head = DVec3::new(0.0, left.tail.y - self.config.eye_target_distance, left.tail.z);
        let width = left.length() + right.length();
        self.bones.require(ROOT_BONE)?;

        let target = self.bones.new_bone(EYE_TARGET)?;
        target.head = head;
        target.tail = head - DVec3::Y * width;
        target.parent = Some(ROOT_BONE.to_string());
        self.assign_widget(EYE_TARGET, WIDGET_EYE_TARGET, None)
    }

    pub(super) fn rig_jaw(&mut self) -> RigResult<()> {
        self.bones.require("head")?;
        let jaw = self.bones.require_mut("jaw")?;
        jaw.use_deform = true;
        jaw.pose.locks.location = [true; 3];
        jaw.align_roll = DVec3::Z;
        jaw.parent = Some("head".to_string());
        Ok(())
    }

    pub(super) fn rig_spine(&mut self) -> RigResult<()> {
        let [hips, spine, chest, neck, head] = SPINE_NAMES;
        for name in SPINE_NAMES {
            self.bones.require(name)?;
        }
        self.bones.require(ROOT_BONE)?;

        for rib in ["ribs.L", "ribs.R"] {
            let rib = self.bones.require_mut(rib)?;
            rib.parent = Some(chest.to_string());
            rib.use_deform = true;
            rib.align_roll = DVec3::NEG_Y;
        }

        let config = self.config;
        let mut previous: Option<&str> = None;
        for name in SPINE_NAMES {
            let bone = self.bones.require_mut(name)?;
            bone.use_deform = true;
            bone.pose.use_bepuik = true;
            bone.align_roll = DVec3::NEG_Y;
            if let Some(parent) = previous {
                bone.use_connect = true;
                bone.pose.ball_socket_rigidity = config.ball_socket_rigidity;
                bone.parent = Some(parent.to_string());
            }
            previous = Some(name);
        }

        let tuning = &config.spine;

        let neck_bone = self.bones.require_mut(neck)?;
        neck_bone.bbone_in = tuning.neck_bbone_in;
        neck_bone.bbone_out = 1.0;
        neck_bone.bbone_segments = tuning.neck_bbone_segments;

        let spine_bone = self.bones.require_mut(spine)?;
        spine_bone.bbone_segments = tuning.spine_bbone_segments;
        spine_bone.bbone_in = 1.0;
        spine_bone.bbone_out = 1.0;
        spine_bone.pose.rotational_heaviness = tuning.spine_heaviness;

        let hips_bone = self.bones.require_mut(hips)?;
        hips_bone.pose.rotational_heaviness = tuning.hips_heaviness;
        hips_bone.parent = Some(ROOT_BONE.to_string());

        let bones = &mut self.bones;
        twist_limit(bones, hips, chest, tuning.hips_chest_twist)?;
        twist_limit(bones, chest, head, tuning.chest_head_twist)?;

        swing_limit(bones, hips, spine, tuning.hips_spine_swing)?;
        swing_limit(bones, spine, chest, tuning.spine_chest_swing)?;
        swing_limit(bones, chest, neck, tuning.chest_neck_swing)?;
        swing_limit(bones, neck, head, tuning.neck_head_swing)?;

        twist_joint(bones, hips, spine, None)?;
        twist_joint(bones, chest, neck, None)
    }

    pub(super) fn add_torso_pullers(&mut self) -> RigResult<()> {
        self.point_puller("hips-target", "hips", ROOT_BONE, 0.0)?;
        self.point_puller("chest-target", "chest", ROOT_BONE, 0.0)?;
        self.point_puller("head-target", "head", ROOT_BONE, 0.0)
    }

    /// Eyes track the shared eye target.
    pub(super) fn rig_eye(&mut self, side: char) -> RigResult<()> {
        let name = format!("eye.{}", side);
        self.bones.require(EYE_TARGET)?;
        self.bones.require("head")?;

        let eye = self.bones.require_mut(&name)?;
        eye.add_constraint(
            EYE_TARGET,
            ConstraintKind::Generic(GenericConstraint::new(GenericKind::DampedTrack)),
        );
        eye.use_deform = true;
        eye.align_roll = DVec3::Z;
        eye.parent = Some("head".to_string());
        Ok(())
    }
}
