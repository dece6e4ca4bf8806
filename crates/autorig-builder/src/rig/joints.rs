//! Bone-to-bone joint authoring.
//!
//! Every helper adds constraints to the owning bone `a` that target `b`.
//! Angles are degrees.

use autorig_meta::math::degrees_between;
use autorig_meta::naming::mechanical_name;
use autorig_meta::{Axis, BoneAxis, BonePoint, ConstraintKind, MetaBoneCollection, RigResult};
use glam::{DMat4, DVec3};

use crate::config::{SwingAxes, SwingRange};

/// Adds a constraint on `owner` after checking that `target` exists.
pub fn add(bones: &mut MetaBoneCollection, owner: &str, target: &str, kind: ConstraintKind) -> RigResult<()> {
    bones.require(target)?;
    bones.require_mut(owner)?.add_constraint(target, kind);
    Ok(())
}

/// Makes `target` drive the point at `head_tail` along `affected`.
///
/// The control is named after the target, and the target gets a wire
/// display with locked scale.
pub fn target_affected(
    bones: &mut MetaBoneCollection,
    target: &str,
    affected: &str,
    head_tail: f64,
    position_rigidity: f64,
    orientation_rigidity: f64,
) -> RigResult<()> {
    let target_bone = bones.require_mut(target)?;
    target_bone.pose.show_wire = true;
    target_bone.pose.locks.scale = [true; 3];

    bones.require_mut(affected)?.add_named_constraint(
        target,
        target,
        ConstraintKind::control(head_tail, position_rigidity, orientation_rigidity),
    );
    Ok(())
}

/// Twist about the shared Y axis, measured between the bones' Z axes.
pub fn twist_limit(bones: &mut MetaBoneCollection, a: &str, b: &str, max_twist: f64) -> RigResult<()> {
    add(
        bones,
        a,
        b,
        ConstraintKind::TwistLimit {
            axis_a: BoneAxis::new(a, Axis::Y),
            axis_b: BoneAxis::new(b, Axis::Y),
            measurement_axis_a: BoneAxis::new(a, Axis::Z),
            measurement_axis_b: BoneAxis::new(b, Axis::Z),
            max_twist,
        },
    )
}

pub fn swing_limit(bones: &mut MetaBoneCollection, a: &str, b: &str, max_swing: f64) -> RigResult<()> {
    add(
        bones,
        a,
        b,
        ConstraintKind::SwingLimit {
            axis_a: BoneAxis::new(a, Axis::Y),
            axis_b: BoneAxis::new(b, Axis::Y),
            max_swing,
        },
    )
}

/// Keeps two chained bones at least `margin` degrees from pointing in
/// opposite directions.
pub fn antiparallel_limiter(bones: &mut MetaBoneCollection, a: &str, b: &str, margin: f64) -> RigResult<()> {
    swing_limit(bones, a, b, 180.0 - margin)
}

/// Twist joint between `a` (or the override's Y axis) and `b`.
pub fn twist_joint(bones: &mut MetaBoneCollection, a: &str, b: &str, axis_a_override: Option<&str>) -> RigResult<()> {
    add(
        bones,
        a,
        b,
        ConstraintKind::TwistJoint {
            axis_a: BoneAxis::new(axis_a_override.unwrap_or(a), Axis::Y),
            axis_b: BoneAxis::new(b, Axis::Y),
        },
    )
}

/// Ball-socket anchored at the head of `b`.
pub fn ballsocket_joint(bones: &mut MetaBoneCollection, a: &str, b: &str) -> RigResult<()> {
    add(
        bones,
        a,
        b,
        ConstraintKind::BallSocketJoint {
            anchor: BonePoint::new(b, 0.0),
        },
    )
}

/// Independent Y and X swing limits of `b`, measured from `axis_a_bone`.
/// A zero angle adds no limit for that axis.
pub fn swing_2d(
    bones: &mut MetaBoneCollection,
    a: &str,
    b: &str,
    axis_a_bone: &str,
    swing: SwingAxes,
) -> RigResult<()> {
    if swing.y != 0.0 {
        add(
            bones,
            a,
            b,
            ConstraintKind::SwingLimit {
                axis_a: BoneAxis::new(axis_a_bone, Axis::Y),
                axis_b: BoneAxis::new(b, Axis::Y),
                max_swing: swing.y,
            },
        )?;
    }
    if swing.x != 0.0 {
        add(
            bones,
            a,
            b,
            ConstraintKind::SwingLimit {
                axis_a: BoneAxis::new(axis_a_bone, Axis::X),
                axis_b: BoneAxis::new(b, Axis::X),
                max_swing: swing.x,
            },
        )?;
    }
    Ok(())
}

/// Locks every channel and gives the bone the mechanical prefix.
///
/// Returns the bone's new name.
pub fn flag_mechanical(bones: &mut MetaBoneCollection, name: &str) -> RigResult<String> {
    bones.require_mut(name)?.pose.lock_all();
    let renamed = mechanical_name(name);
    bones.rename(name, &renamed)?;
    Ok(renamed)
}

pub fn flag_deforming_ballsocket(bones: &mut MetaBoneCollection, name: &str, rigidity: f64) -> RigResult<()> {
    bones.require_mut(name)?.flag_deforming_ballsocket(rigidity);
    Ok(())
}

/// Hinges `fb` on `fa`'s X axis and limits its swing to `range`.
///
/// The range is expressed around a mechanical swing-center bone named
/// `center`, hanging off `fa`'s tail and rotated to the middle of the range.
/// Returns the swing center's name.
pub fn revolute_swing_center(
    bones: &mut MetaBoneCollection,
    fa: &str,
    fb: &str,
    center: &str,
    range: SwingRange,
) -> RigResult<String> {
    add(
        bones,
        fa,
        fb,
        ConstraintKind::RevoluteJoint {
            free_axis: BoneAxis::new(fa, Axis::X),
        },
    )?;

    let parent = bones.require(fa)?;
    let frame = parent.matrix()? * DMat4::from_rotation_x(range.center().to_radians());
    let head = parent.tail;
    let tail = head + frame.y_axis.truncate() * parent.length();

    let swing_center = bones.new_bone(center)?;
    swing_center.head = head;
    swing_center.tail = tail;
    swing_center.parent = Some(fa.to_string());
    let center = flag_mechanical(bones, center)?;

    add(
        bones,
        fa,
        fb,
        ConstraintKind::SwingLimit {
            axis_a: BoneAxis::new(&center, Axis::Y),
            axis_b: BoneAxis::new(fb, Axis::Y),
            max_swing: range.half_width(),
        },
    )?;
    Ok(center)
}

/// Rest-pose angle between two bones' Y axes.
pub fn rest_angle(bones: &MetaBoneCollection, a: &str, b: &str) -> RigResult<f64> {
    bones.require(a)?.degrees_to(bones.require(b)?)
}

/// Rest-pose angle between a direction and a bone's Y axis.
pub fn rest_angle_to(bones: &MetaBoneCollection, direction: DVec3, bone: &str) -> RigResult<f64> {
    Ok(degrees_between(direction, bones.require(bone)?.y_axis()?))
}
