//! Arm, shoulder, hand and finger regions.

use autorig_meta::math::mean_point;
use autorig_meta::naming::digit_segment_name;
use autorig_meta::widget::WIDGET_HAND;
use autorig_meta::{Axis, BoneAxis, ConstraintKind, RigError, RigResult, WidgetShape};
use glam::DVec3;

use super::joints::{
    add, antiparallel_limiter, flag_deforming_ballsocket, flag_mechanical, rest_angle, revolute_swing_center,
    swing_2d, twist_joint, twist_limit,
};
use super::{segment_siblings, swing_center_name, RigSession, ROOT_BONE};
use crate::config::DigitTuning;

const FINGER: &str = "finger";
const FINGER_SEGMENTS: usize = 4;

impl RigSession<'_> {
    /// Shoulder, upper arm and forearm, then the shoulder's attachment to the chest.
    pub(super) fn rig_arm(&mut self, side: char) -> RigResult<()> {
        let shoulder = format!("shoulder.{}", side);
        let uparm = format!("uparm.{}", side);
        let loarm = format!("loarm.{}", side);
        let relative_x = Axis::relative_x(side);
        let config = self.config;
        let tuning = &config.arm;

        let bone = self.bones.require_mut(&shoulder)?;
        bone.align_roll = DVec3::Z;
        bone.pose.use_bepuik = true;
        bone.use_deform = true;
        bone.pose.ball_socket_rigidity = 0.0;
        bone.pose.rotational_heaviness = tuning.shoulder_heaviness;

        let bone = self.bones.require_mut(&uparm)?;
        bone.align_roll = DVec3::Z;
        bone.use_connect = true;
        bone.flag_deforming_ballsocket(config.ball_socket_rigidity);

        let bone = self.bones.require_mut(&loarm)?;
        bone.bbone_segments = tuning.forearm_bbone_segments;
        bone.bbone_in = 0.0;
        bone.bbone_out = 0.0;
        bone.align_roll = DVec3::Z;
        bone.use_connect = true;
        bone.flag_deforming_ballsocket(config.ball_socket_rigidity);

        let bones = &mut self.bones;
        antiparallel_limiter(bones, &shoulder, &uparm, tuning.shoulder_antiparallel)?;
        add(
            bones,
            &shoulder,
            &uparm,
            ConstraintKind::TwistLimit {
                axis_a: BoneAxis::new(&shoulder, Axis::Y),
                axis_b: BoneAxis::new(&uparm, Axis::Y),
                measurement_axis_a: BoneAxis::new(&shoulder, Axis::Z),
                measurement_axis_b: BoneAxis::new(&shoulder, Axis::Z),
                max_twist: tuning.shoulder_twist,
            },
        )?;
        add(
            bones,
            &uparm,
            &loarm,
            ConstraintKind::SwingLimit {
                axis_a: BoneAxis::new(&loarm, relative_x),
                axis_b: BoneAxis::new(&loarm, Axis::Y),
                max_swing: tuning.elbow_swing,
            },
        )?;
        antiparallel_limiter(bones, &uparm, &loarm, config.antiparallel_margin)?;
        add(
            bones,
            &uparm,
            &loarm,
            ConstraintKind::RevoluteJoint {
                free_axis: BoneAxis::new(&uparm, Axis::Z),
            },
        )?;

        self.rig_chest_to_shoulder(side)?;

        if let Some(segments) = config.forearm_twist_bbone_segments {
            self.twist_chain(&loarm, &uparm, segments)?;
            // The proxy deforms in the forearm's place.
            self.bones.require_mut(&loarm)?.use_deform = false;
        }
        Ok(())
    }

    /// The clavicle: twist about the shoulder's own axis plus three swing caps.
    pub(super) fn rig_chest_to_shoulder(&mut self, side: char) -> RigResult<()> {
        let chest = "chest";
        let shoulder = format!("shoulder.{}", side);
        let relative_x = Axis::relative_x(side);
        let config = self.config;
        let tuning = &config.arm;

        self.bones.require(chest)?;
        let bone = self.bones.require_mut(&shoulder)?;
        bone.parent = Some(chest.to_string());
        bone.use_connect = false;
        bone.pose.ball_socket_rigidity = config.ball_socket_rigidity;

        let bones = &mut self.bones;
        twist_joint(bones, chest, &shoulder, Some(shoulder.as_str()))?;
        for (axis_a, axis_b, max_swing) in [
            (Axis::Y, Axis::Y, tuning.clavicle_swing),
            (Axis::Z, Axis::Y, tuning.clavicle_raise_swing),
            (relative_x, relative_x, tuning.clavicle_side_swing),
        ] {
            add(
                bones,
                chest,
                &shoulder,
                ConstraintKind::SwingLimit {
                    axis_a: BoneAxis::new(&shoulder, axis_a),
                    axis_b: BoneAxis::new(&shoulder, axis_b),
                    max_swing,
                },
            )?;
        }
        Ok(())
    }

    /// Adds the hand, its target and widgets, then rigs every complete finger.
    pub(super) fn rig_hand(&mut self, side: char) -> RigResult<()> {
        let loarm = format!("loarm.{}", side);
        let hand = format!("hand.{}", side);
        let hand_target = format!("hand-target.{}", side);
        let config = self.config;
        let tuning = &config.hand;

        let palm_bones = segment_siblings(&self.bones, FINGER, 1, side);
        let s2_bones = segment_siblings(&self.bones, FINGER, 2, side);
        if palm_bones.is_empty() || s2_bones.is_empty() {
            return Err(RigError::missing_bone(digit_segment_name(FINGER, 1, 2, side)));
        }

        let s2_tails = s2_bones
            .iter()
            .map(|name| self.bones.require(name).map(|b| b.tail))
            .collect::<RigResult<Vec<_>>>()?;
        let tail = mean_point(&s2_tails).ok_or_else(|| RigError::missing_bone(&s2_bones[0]))?;
        let head = self.bones.require(&loarm)?.tail;

        let first = self.bones.require(&palm_bones[0])?;
        let last = self.bones.require(&palm_bones[palm_bones.len() - 1])?;
        let hand_width = (first.head - last.head).length().max((first.tail - last.tail).length());

        let bone = self.bones.new_bone(&hand)?;
        bone.parent = Some(loarm.clone());
        bone.head = head;
        bone.tail = tail;
        bone.align_roll = DVec3::Z;
        bone.pose.use_bepuik = true;
        bone.pose.ball_socket_rigidity = config.ball_socket_rigidity;
        bone.use_connect = true;
        let hand_width_local = hand_width / bone.length();

        antiparallel_limiter(&mut self.bones, &loarm, &hand, tuning.wrist_antiparallel)?;
        twist_limit(&mut self.bones, &loarm, &hand, tuning.wrist_twist)?;

        let hand_widget = format!("{}.{}", WIDGET_HAND, side);
        let hand_shape = WidgetShape::pad(
            hand_width_local * tuning.widget_scale,
            tuning.widget_scale,
            0.0,
        )
        .with_subsurface(1);
        self.assign_widget(&hand, &hand_widget, Some(hand_shape))?;

        self.bones.require(ROOT_BONE)?;
        let target = self.bones.new_bone(&hand_target)?;
        target.parent = Some(ROOT_BONE.to_string());
        target.head = head;
        target.tail = tail;
        target.align_roll = DVec3::Z;

        let target_widget = format!("{}-target.{}", WIDGET_HAND, side);
        let target_shape = WidgetShape::pad(
            hand_width_local * tuning.target_widget_scale,
            tuning.target_widget_scale,
            0.1,
        );
        self.assign_widget(&hand_target, &target_widget, Some(target_shape))?;
        self.control(&hand_target, &hand)?;

        for digit in 1..=5 {
            let segments: Vec<String> = (1..=FINGER_SEGMENTS)
                .map(|segment| digit_segment_name(FINGER, digit, segment, side))
                .collect();
            let present = segments.iter().filter(|name| self.bones.contains(name)).count();
            if present == 0 {
                continue;
            }
            if present < FINGER_SEGMENTS {
                self.warn(format!(
                    "Finger {} on side {} has {} of {} segments; skipped",
                    digit, side, present, FINGER_SEGMENTS
                ));
                continue;
            }

            let is_thumb = digit == 1 && self.flags.use_thumb;
            let digit_tuning = if is_thumb { &tuning.thumb } else { &tuning.finger };
            // The thumb is rolled to face forward.
            let align = if is_thumb { DVec3::NEG_Y } else { DVec3::Z };
            self.rig_finger(
                &hand,
                digit,
                side,
                &segments,
                tuning.palm_swings[digit - 1],
                digit_tuning,
                align,
            )?;
        }
        Ok(())
    }

    /// Rigs one four-segment finger onto `hand`.
    ///
    /// A palm segment with a non-zero swing hinges on the hand; otherwise it
    /// becomes a locked mechanical bone and the next segment attaches to the
    /// hand directly.
    #[allow(clippy::too_many_arguments)]
    fn rig_finger(
        &mut self,
        hand: &str,
        digit: usize,
        side: char,
        segments: &[String],
        palm_swing: f64,
        tuning: &DigitTuning,
        align: DVec3,
    ) -> RigResult<()> {
        let rigidity = self.config.ball_socket_rigidity;
        let bones = &mut self.bones;
        let (s2, s3, s4) = (&segments[1], &segments[2], &segments[3]);

        bones.require_mut(hand)?.align_roll = align;
        for name in segments {
            bones.require_mut(name)?.align_roll = align;
        }
        bones.require_mut(&segments[0])?.parent = Some(hand.to_string());

        let (s1, s2_parent) = if palm_swing != 0.0 {
            let s1 = segments[0].clone();
            flag_deforming_ballsocket(bones, &s1, rigidity)?;
            add(
                bones,
                hand,
                &s1,
                ConstraintKind::RevoluteJoint {
                    free_axis: BoneAxis::new(hand, Axis::X),
                },
            )?;
            let max_swing = rest_angle(bones, hand, &s1)?.max(palm_swing);
            add(
                bones,
                hand,
                &s1,
                ConstraintKind::SwingLimit {
                    axis_a: BoneAxis::new(hand, Axis::Y),
                    axis_b: BoneAxis::new(&s1, Axis::Y),
                    max_swing,
                },
            )?;
            bones.require_mut(s2)?.use_connect = true;
            (s1.clone(), s1)
        } else {
            bones.require_mut(&segments[0])?.use_deform = true;
            let s1 = flag_mechanical(bones, &segments[0])?;
            bones.require_mut(s2)?.use_connect = false;
            (s1, hand.to_string())
        };

        bones.require_mut(s2)?.parent = Some(s2_parent.clone());
        twist_joint(bones, &s2_parent, s2, None)?;
        swing_2d(bones, &s2_parent, s2, &s1, tuning.base_swing)?;
        flag_deforming_ballsocket(bones, s2, rigidity)?;

        for (parent, child, segment, range) in [(s2, s3, 3, tuning.middle), (s3, s4, 4, tuning.tip)] {
            twist_joint(bones, parent, child, None)?;
            revolute_swing_center(bones, parent, child, &swing_center_name(FINGER, digit, segment, side), range)?;
            flag_deforming_ballsocket(bones, child, rigidity)?;
            let bone = bones.require_mut(child)?;
            bone.use_connect = true;
            bone.parent = Some(parent.clone());
        }
        Ok(())
    }
}
