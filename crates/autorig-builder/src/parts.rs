//! Parametric part builders.
//!
//! Each builder is a pure function of [`BodyParams`] returning a
//! self-contained, unsuffixed collection in the part's own space. The
//! assembler mirrors and positions the parts.

use autorig_meta::math::{intersect_line_plane, mirror_x, vec3};
use autorig_meta::{BakeData, MetaBoneCollection, RigError, RigResult};
use glam::{DMat4, DVec3};

use crate::config::BodyParams;

/// Names of the spine chain, bottom up.
pub const SPINE_NAMES: [&str; 5] = ["hips", "spine", "chest", "neck", "head"];

const THUMB_LENGTHS: [f64; 4] = [0.024, 0.0376, 0.040, 0.0339];
const FINGER_LENGTHS: [f64; 4] = [0.089, 0.0318, 0.02632, 0.0247];
/// Length scale per finger, thumb to little finger.
const FINGER_SCALES: [f64; 5] = [0.7, 0.9, 1.0, 0.9, 0.7];

const BIG_TOE_LENGTHS: [f64; 2] = [0.02955, 0.02653];
const LITTLE_TOE_LENGTHS: [f64; 3] = [0.028, 0.01628, 0.015];
/// Each toe after the first is this much shorter than its neighbour.
const TOE_SCALE_FALLOFF: f64 = 0.8;

/// Foot target length relative to the foot.
const FOOT_TARGET_SCALE: f64 = 1.1;

// =============================================================================
// Limbs
// =============================================================================

/// `shoulder`, `uparm` and `loarm`.
///
/// The elbow is placed at a fraction of the shoulder-to-wrist vector and
/// pushed back along Y by a fraction of the arm length.
pub fn build_arm(params: &BodyParams) -> RigResult<MetaBoneCollection> {
    let mut bones = MetaBoneCollection::new();

    let shoulder_tail = vec3(params.shoulder_tail);
    let wrist = vec3(params.wrist);
    let arm_vec = wrist - shoulder_tail;
    let arm_up = arm_vec.cross(DVec3::Y);

    let mut elbow = arm_vec * params.elbow[0] + shoulder_tail;
    elbow.y += params.elbow[1] * arm_vec.length();

    let shoulder = bones.new_bone("shoulder")?;
    shoulder.use_deform = true;
    shoulder.head = vec3(params.shoulder_head);
    shoulder.tail = shoulder_tail;

    let uparm = bones.new_bone("uparm")?;
    uparm.head = shoulder_tail;
    uparm.tail = elbow;
    uparm.parent = Some("shoulder".into());
    uparm.align_roll = arm_up;
    uparm.use_connect = true;

    let loarm = bones.new_bone("loarm")?;
    loarm.head = elbow;
    loarm.tail = wrist;
    loarm.parent = Some("uparm".into());
    loarm.align_roll = arm_up;
    loarm.use_connect = true;

    Ok(bones)
}

/// `upleg`, `loleg`, `foot`, plus the `foot-target` heel pivot and the
/// `foot-width` reference across the sole.
///
/// The heel is where the lower leg's line meets the ground plane at toe
/// height. When that line never reaches the plane the pivot bones are left
/// out.
pub fn build_leg(params: &BodyParams) -> RigResult<MetaBoneCollection> {
    let mut bones = MetaBoneCollection::new();

    let knee = vec3(params.knee);
    let ankle = vec3(params.ankle);
    let toe = vec3(params.toe);

    let upleg = bones.new_bone("upleg")?;
    upleg.use_deform = true;
    upleg.head = vec3(params.upleg);
    upleg.tail = knee;
    upleg.align_roll = DVec3::NEG_Y;

    let loleg = bones.new_bone("loleg")?;
    loleg.head = knee;
    loleg.tail = ankle;
    loleg.parent = Some("upleg".into());
    loleg.align_roll = DVec3::NEG_Y;
    loleg.use_connect = true;

    let foot = bones.new_bone("foot")?;
    foot.head = ankle;
    foot.tail = toe;
    foot.parent = Some("loleg".into());
    foot.pose.ball_socket_rigidity = 1000.0;
    foot.use_connect = true;

    let loleg_vec = ankle - knee;
    let foot_vec = toe - ankle;
    let to_heel = loleg_vec.normalize_or_zero() * ((loleg_vec.length() + foot_vec.length()) * 2.0);

    if let Some(heel) = intersect_line_plane(knee, knee + to_heel, toe, DVec3::Z) {
        let ball_to_heel = (heel - toe).normalize_or_zero();

        let target = bones.new_bone("foot-target")?;
        target.head = toe + ball_to_heel * foot_vec.length() * FOOT_TARGET_SCALE;
        target.tail = toe;
        let target_head = target.head;
        let target_length = target.length();
        let axes = target.axes()?;

        let width = bones.new_bone("foot-width")?;
        width.head = target_head + axes.y * target_length + axes.x * params.foot_width / 2.0;
        width.tail = width.head - axes.x * params.foot_width;
    }

    Ok(bones)
}

// =============================================================================
// Trunk and Face
// =============================================================================

/// The spine chain bottom up from `spine_start`, plus the two rib stubs on
/// the chest.
pub fn build_spine(params: &BodyParams) -> RigResult<MetaBoneCollection> {
    let mut bones = MetaBoneCollection::new();
    let mut cursor = vec3(params.spine_start);

    for (i, (name, length)) in SPINE_NAMES.iter().zip(&params.spine_lengths).enumerate() {
        let bone = bones.new_bone(*name)?;
        bone.head = cursor;
        cursor.z += length;
        bone.tail = cursor;
        bone.align_roll = DVec3::NEG_Y;
        if i > 0 {
            bone.parent = Some(SPINE_NAMES[i - 1].to_string());
            bone.use_connect = true;
        }
    }

    let chest = bones.require("chest")?;
    let chest_length = chest.length();
    let rib_head_z = chest.head.z + chest_length * 0.2;
    let rib_tail_z = chest.tail.z - chest_length * 0.4;

    for (name, sign) in [("ribs.L", 1.0), ("ribs.R", -1.0)] {
        let rib = bones.new_bone(name)?;
        rib.head = DVec3::new(0.074 * sign, -0.086, rib_head_z);
        rib.tail = DVec3::new(0.102 * sign, -0.024, rib_tail_z);
        rib.align_roll = DVec3::NEG_Y;
        rib.parent = Some("chest".into());
    }

    Ok(bones)
}

/// Both eyes (mirrored about X) and the unconnected jaw.
pub fn build_face(params: &BodyParams) -> RigResult<MetaBoneCollection> {
    let mut side = MetaBoneCollection::new();
    let center = vec3(params.eye_center);
    let eye = side.new_bone("eye")?;
    eye.head = center;
    eye.tail = center + DVec3::new(0.0, -params.eye_radius, 0.0);

    let mut face = MetaBoneCollection::from_bakedata(&[
        BakeData::new(&side, DMat4::IDENTITY, Some('L')),
        BakeData::new(&side, mirror_x(), Some('R')),
    ])?;

    let jaw = face.new_bone("jaw")?;
    jaw.head = vec3(params.jaw);
    jaw.tail = vec3(params.chin);
    jaw.use_connect = false;

    Ok(face)
}

// =============================================================================
// Digits
// =============================================================================

/// One digit chain: the first segment uncurled, every later one curled.
fn digit_chain(name: &str, curl_degrees: f64, lengths: &[f64], scale: f64) -> MetaBoneCollection {
    let curl = curl_degrees.to_radians();
    let pairs: Vec<(f64, f64)> = lengths
        .iter()
        .enumerate()
        .map(|(i, length)| (if i == 0 { 0.0 } else { curl }, length * scale))
        .collect();
    MetaBoneCollection::from_angle_length_pairs(name, &pairs)
}

/// Start point and step for spreading `count` digits across `width` along X.
fn digit_spread(count: u32, width: f64) -> (f64, f64, f64) {
    if count > 1 {
        (width, width / 2.0, width / f64::from(count - 1))
    } else {
        (0.0, 0.0, 0.0)
    }
}

/// Fingers `finger1` .. `fingerN` spread across the wrist along X, pointing
/// along +Y. With `use_thumb` the first finger is a thumb with its own splay
/// and tilt.
pub fn build_fingers(params: &BodyParams) -> RigResult<MetaBoneCollection> {
    if !(1..=5).contains(&params.num_fingers) {
        return Err(RigError::invalid_parameter("num_fingers", "must be between 1 and 5"));
    }

    let first_lengths: &[f64] = if params.use_thumb { &THUMB_LENGTHS } else { &FINGER_LENGTHS };
    let chains: Vec<MetaBoneCollection> = (0..params.num_fingers as usize)
        .map(|i| {
            let lengths: &[f64] = if i == 0 { first_lengths } else { &FINGER_LENGTHS };
            digit_chain(&format!("finger{}", i + 1), params.finger_curl, lengths, FINGER_SCALES[i])
        })
        .collect();

    let (width, mut x, step) = digit_spread(params.num_fingers, params.wrist_width);
    let splay = params.finger_splay.to_radians();
    let mut transforms = Vec::with_capacity(chains.len());
    for i in 0..chains.len() {
        let point = DVec3::new(x, 0.0, 0.0);
        let transform = if i == 0 && params.use_thumb {
            DMat4::from_translation(point)
                * DMat4::from_rotation_y(90f64.to_radians())
                * DMat4::from_rotation_x(params.thumb_splay.to_radians())
                * DMat4::from_rotation_z(params.thumb_tilt.to_radians())
        } else {
            let factor = if width > 0.0 { x / width / 2.0 } else { x };
            DMat4::from_translation(point) * DMat4::from_rotation_z(factor * splay)
        };
        transforms.push(transform);
        x -= step;
    }

    let bakes: Vec<BakeData<'_>> = chains
        .iter()
        .zip(transforms)
        .map(|(chain, transform)| BakeData::new(chain, transform, None))
        .collect();
    MetaBoneCollection::from_bakedata(&bakes)
}

/// Toes `toe1` (big toe) .. `toeN` spread across the foot along X, pointing
/// along +Y. Simple toes collapse each chain into one segment.
pub fn build_toes(params: &BodyParams) -> RigResult<MetaBoneCollection> {
    if !(1..=5).contains(&params.num_toes) {
        return Err(RigError::invalid_parameter("num_toes", "must be between 1 and 5"));
    }

    let (big, little): (Vec<f64>, Vec<f64>) = if params.use_simple_toe {
        (vec![BIG_TOE_LENGTHS.iter().sum()], vec![LITTLE_TOE_LENGTHS.iter().sum()])
    } else {
        (BIG_TOE_LENGTHS.to_vec(), LITTLE_TOE_LENGTHS.to_vec())
    };

    let mut scale = 1.0;
    let mut chains = Vec::with_capacity(params.num_toes as usize);
    for i in 0..params.num_toes as usize {
        let lengths = if i == 0 { &big } else { &little };
        chains.push(digit_chain(&format!("toe{}", i + 1), params.toe_curl, lengths, scale));
        scale *= TOE_SCALE_FALLOFF;
    }

    let (_, mut x, step) = digit_spread(params.num_toes, params.foot_width);
    let mut bakes = Vec::with_capacity(chains.len());
    for chain in &chains {
        bakes.push(BakeData::new(chain, DMat4::from_translation(DVec3::new(x, 0.0, 0.0)), None));
        x -= step;
    }
    MetaBoneCollection::from_bakedata(&bakes)
}
