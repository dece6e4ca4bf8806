//! Leg, foot, toe and hip regions.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use autorig_meta::math::{degrees_between, mean_point};
use autorig_meta::naming::{digit_segment_name, suffixed};
use autorig_meta::widget::WIDGET_FOOT;
use autorig_meta::{Axis, BoneAxis, ConstraintKind, RigError, RigResult, WidgetShape};
use glam::{DMat4, DVec3};

use super::joints::{
    add, antiparallel_limiter, ballsocket_joint, flag_deforming_ballsocket, flag_mechanical, rest_angle,
    rest_angle_to, revolute_swing_center, swing_2d, target_affected, twist_joint,
};
use super::{segment_siblings, swing_center_name, RigSession, FOOT_WIDTH_BONE, ROOT_BONE};

const TOE: &str = "toe";
const WIDGET_TOES_TARGET: &str = "Widget-Toes-target";

impl RigSession<'_> {
    /// Hip to ankle: a knee hinge plus ankle twist and swing caps.
    pub(super) fn rig_leg(&mut self, side: char) -> RigResult<()> {
        let upleg = format!("upleg.{}", side);
        let loleg = format!("loleg.{}", side);
        let foot = format!("foot.{}", side);
        let relative_x = Axis::relative_x(side);
        let config = self.config;
        let tuning = &config.leg;

        let bone = self.bones.require_mut(&upleg)?;
        bone.align_roll = DVec3::NEG_Y;
        bone.flag_deforming_ballsocket(config.ball_socket_rigidity);

        let bone = self.bones.require_mut(&loleg)?;
        bone.align_roll = DVec3::NEG_Y;
        bone.flag_deforming_ballsocket(tuning.knee_rigidity);
        bone.use_connect = true;

        let bone = self.bones.require_mut(&foot)?;
        bone.align_roll = DVec3::Z;
        bone.flag_deforming_ballsocket(tuning.ankle_rigidity);
        bone.use_connect = true;

        let bones = &mut self.bones;
        add(
            bones,
            &upleg,
            &loleg,
            ConstraintKind::RevoluteJoint {
                free_axis: BoneAxis::new(&upleg, Axis::X),
            },
        )?;
        antiparallel_limiter(bones, &upleg, &loleg, config.antiparallel_margin)?;

        // Never tighter than the rest bend, so the knee cannot lock straight.
        let upleg_down = -bones.require(&upleg)?.z_axis()?;
        let knee_bend = rest_angle_to(bones, upleg_down, &loleg)?;
        add(
            bones,
            &upleg,
            &loleg,
            ConstraintKind::SwingLimit {
                axis_a: BoneAxis::new(&upleg, Axis::NegativeZ),
                axis_b: BoneAxis::new(&loleg, Axis::Y),
                max_swing: knee_bend.max(tuning.knee_min_swing),
            },
        )?;
        bones.require_mut(&loleg)?.parent = Some(upleg.clone());

        add(
            bones,
            &loleg,
            &foot,
            ConstraintKind::TwistLimit {
                axis_a: BoneAxis::new(&foot, Axis::Y),
                axis_b: BoneAxis::new(&foot, Axis::Y),
                measurement_axis_a: BoneAxis::new(&foot, Axis::Z),
                measurement_axis_b: BoneAxis::new(&foot, Axis::Z),
                max_twist: tuning.ankle_twist,
            },
        )?;
        add(
            bones,
            &loleg,
            &foot,
            ConstraintKind::SwingLimit {
                axis_a: BoneAxis::new(&foot, Axis::Y),
                axis_b: BoneAxis::new(&foot, Axis::Y),
                max_swing: tuning.ankle_swing,
            },
        )?;
        add(
            bones,
            &loleg,
            &foot,
            ConstraintKind::SwingLimit {
                axis_a: BoneAxis::new(&loleg, relative_x),
                axis_b: BoneAxis::new(&loleg, relative_x),
                max_swing: tuning.ankle_side_swing,
            },
        )?;
        bones.require_mut(&foot)?.parent = Some(loleg.clone());

        self.region(&format!("foot target.{}", side), |s| s.attach_foot_target(side))
    }

    /// The heel-pivot target is only present when the leg builder found a
    /// ground crossing.
    fn attach_foot_target(&mut self, side: char) -> RigResult<()> {
        let foot = format!("foot.{}", side);
        let foot_target = format!("foot-target.{}", side);
        self.bones.require(ROOT_BONE)?;
        self.bones.require_mut(&foot_target)?.parent = Some(ROOT_BONE.to_string());
        self.control(&foot_target, &foot)
    }

    /// Toes, the toes target and the foot-ball puller.
    pub(super) fn rig_foot(&mut self, side: char) -> RigResult<()> {
        let foot = format!("foot.{}", side);
        let foot_target = format!("foot-target.{}", side);
        let foot_width_bone = suffixed(FOOT_WIDTH_BONE, Some(side));
        let toes_target = format!("toes-target.{}", side);
        let config = self.config;
        let tuning = &config.foot;

        let foot_bone = self.bones.require(&foot)?;
        let foot_tail = foot_bone.tail;
        let foot_length = foot_bone.length();
        self.bones.require(ROOT_BONE)?;

        let s1_bones = segment_siblings(&self.bones, TOE, 1, side);
        let foot_width = if s1_bones.len() > 1 {
            let first = self.bones.require(&s1_bones[0])?;
            let last = self.bones.require(&s1_bones[s1_bones.len() - 1])?;
            (first.head - last.head).length()
        } else if let Some(width) = self.bones.get(&foot_width_bone) {
            width.length()
        } else {
            foot_length / 2.0
        };
        // Only single-toed feet need the width reference.
        self.bones.remove(&foot_width_bone);

        let final_tails = (1..=5)
            .filter_map(|digit| {
                [3, 2, 1]
                    .into_iter()
                    .find_map(|segment| self.bones.get(&digit_segment_name(TOE, digit, segment, side)))
            })
            .map(|bone| bone.tail)
            .collect::<Vec<_>>();
        let toes_tail =
            mean_point(&final_tails).ok_or_else(|| RigError::missing_bone(digit_segment_name(TOE, 1, 1, side)))?;

        let direction = match self.bones.get(&foot_target) {
            Some(target) => {
                let length = target.length();
                let direction = target.y_axis()?;
                let shape = WidgetShape::pad(
                    foot_width / length,
                    tuning.target_widget_length,
                    tuning.target_widget_mid,
                );
                self.assign_widget(&foot_target, &format!("{}-target.{}", WIDGET_FOOT, side), Some(shape))?;
                direction
            }
            None => (toes_tail - foot_tail).normalize_or_zero(),
        };

        let toes_length = (toes_tail - foot_tail).length();
        let target = self.bones.new_bone(&toes_target)?;
        target.head = foot_tail;
        target.tail = foot_tail + direction * toes_length;
        target.parent = Some(ROOT_BONE.to_string());
        let toes_width_local = foot_width / target.length();

        let shape = WidgetShape::pad(
            toes_width_local * tuning.toes_widget_scale,
            tuning.toes_widget_scale,
            0.1,
        );
        self.assign_widget(&toes_target, &format!("{}.{}", WIDGET_TOES_TARGET, side), Some(shape))?;

        for digit in 1..=5 {
            let s1 = digit_segment_name(TOE, digit, 1, side);
            if !self.bones.contains(&s1) {
                continue;
            }
            let bones = &mut self.bones;
            twist_joint(bones, &foot, &s1, None)?;
            ballsocket_joint(bones, &foot, &s1)?;
            swing_2d(bones, &foot, &s1, &s1, tuning.toe.base_swing)?;
            self.rig_toe(digit, side)?;
            self.bones.require_mut(&s1)?.parent = Some(foot.clone());
        }

        for s1 in &s1_bones {
            target_affected(&mut self.bones, &toes_target, s1, 0.0, 0.0, 0.0)?;
        }

        self.point_puller(&format!("foot-ball-target.{}", side), &foot, ROOT_BONE, 1.0)
    }

    /// Chains the segments of one toe behind its first segment.
    fn rig_toe(&mut self, digit: usize, side: char) -> RigResult<()> {
        let rigidity = self.config.ball_socket_rigidity;
        let tuning = self.config.foot.toe;
        let bones = &mut self.bones;
        let s1 = digit_segment_name(TOE, digit, 1, side);

        let bone = bones.require_mut(&s1)?;
        bone.align_roll = DVec3::Z;
        bone.flag_deforming_ballsocket(rigidity);

        let mut parent = s1;
        for (segment, range) in [(2, tuning.middle), (3, tuning.tip)] {
            let child = digit_segment_name(TOE, digit, segment, side);
            let Some(bone) = bones.get_mut(&child) else {
                break;
            };
            bone.use_connect = true;
            bone.parent = Some(parent.clone());
            bone.align_roll = DVec3::Z;

            twist_joint(bones, &parent, &child, None)?;
            revolute_swing_center(bones, &parent, &child, &swing_center_name(TOE, digit, segment, side), range)?;
            flag_deforming_ballsocket(bones, &child, rigidity)?;
            parent = child;
        }
        Ok(())
    }

    /// Hip joint: a twist measured against a mechanical axis below the hips
    /// and a swing cone splayed outwards from straight down.
    pub(super) fn rig_hips_to_upleg(&mut self, side: char) -> RigResult<()> {
        let hips = "hips";
        let upleg = format!("upleg.{}", side);
        let legcone = format!("MCH-legcone.{}", side);
        let measure = format!("MCH-legtwistmeasureaxis.{}", side);
        let config = self.config;
        let tuning = &config.leg;

        self.bones.require(&upleg)?;
        let hips_down = self.bones.require(hips)?.matrix()? * DMat4::from_rotation_z(PI);
        let splay = if side == 'R' {
            -tuning.legcone_splay
        } else {
            tuning.legcone_splay
        };
        let splay = DMat4::from_rotation_z(splay.to_radians());
        let legcone_frame = hips_down * DMat4::from_rotation_x(FRAC_PI_4) * splay;
        let measure_frame = hips_down * DMat4::from_rotation_x(FRAC_PI_2) * splay;

        let bones = &mut self.bones;
        bones.new_bone_transformed(&measure, &measure_frame)?;
        bones.new_bone_transformed(&legcone, &legcone_frame)?;
        let measure = flag_mechanical(bones, &measure)?;
        bones.require_mut(&measure)?.parent = Some(hips.to_string());
        let legcone = flag_mechanical(bones, &legcone)?;
        bones.require_mut(&legcone)?.parent = Some(hips.to_string());

        let bone = bones.require_mut(&upleg)?;
        bone.use_deform = true;
        bone.parent = Some(hips.to_string());

        let upleg_z = bones.require(&upleg)?.z_axis()?;
        let measure_y = bones.require(&measure)?.y_axis()?;
        add(
            bones,
            hips,
            &upleg,
            ConstraintKind::TwistLimit {
                axis_a: BoneAxis::new(hips, Axis::NegativeY),
                axis_b: BoneAxis::new(&upleg, Axis::Y),
                measurement_axis_a: BoneAxis::new(&measure, Axis::Y),
                measurement_axis_b: BoneAxis::new(&upleg, Axis::Z),
                max_twist: tuning
                    .hip_min_twist
                    .max(degrees_between(upleg_z, measure_y) + tuning.hip_margin),
            },
        )?;

        // The upper leg is parented straight to the hips, so the ball socket
        // comes from the bone's own solver flag.
        flag_deforming_ballsocket(bones, &upleg, config.ball_socket_rigidity)?;

        let cone_angle = rest_angle(bones, &upleg, &legcone)?;
        add(
            bones,
            hips,
            &upleg,
            ConstraintKind::SwingLimit {
                axis_a: BoneAxis::new(&legcone, Axis::Y),
                axis_b: BoneAxis::new(&upleg, Axis::Y),
                max_swing: tuning.hip_min_swing.max(cone_angle + tuning.hip_margin),
            },
        )
    }
}
