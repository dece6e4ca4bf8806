//! Body proportions and joint tuning.
//!
//! Every angle in this module is in degrees and every point is `[x, y, z]`
//! in meters. Defaults describe a ~1.8 m biped in a T-pose: arms along ±X,
//! facing −Y, Z up.

use autorig_meta::{RigError, RigResult};
use serde::{Deserialize, Serialize};

// =============================================================================
// Top Level
// =============================================================================

/// Proportions and tuning for one meta-armature plus rig build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoRigConfig {
    #[serde(default)]
    pub body: BodyParams,
    #[serde(default)]
    pub rig: RigConfig,
}

impl AutoRigConfig {
    pub fn validate(&self) -> RigResult<()> {
        self.body.validate()?;
        self.rig.validate()
    }
}

// =============================================================================
// Body Proportions
// =============================================================================

/// Parameters of the meta-armature part builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyParams {
    /// Fingers per hand, the thumb included.
    #[serde(default = "default_num_fingers")]
    pub num_fingers: u32,
    /// Toes per foot.
    #[serde(default = "default_num_toes")]
    pub num_toes: u32,
    /// Build each toe as a single segment.
    #[serde(default = "default_true")]
    pub use_simple_toe: bool,
    /// Treat the first finger as an opposable thumb.
    #[serde(default = "default_true")]
    pub use_thumb: bool,

    /// Distance between the outer toes.
    #[serde(default = "default_foot_width")]
    pub foot_width: f64,
    /// Distance between the outer finger roots.
    #[serde(default = "default_wrist_width")]
    pub wrist_width: f64,
    #[serde(default = "default_wrist_yaw")]
    pub wrist_yaw: f64,
    #[serde(default)]
    pub wrist_pitch: f64,
    #[serde(default)]
    pub wrist_roll: f64,
    /// Curl of every finger segment after the first.
    #[serde(default = "default_finger_curl")]
    pub finger_curl: f64,
    /// Curl of every toe segment after the first.
    #[serde(default = "default_toe_curl")]
    pub toe_curl: f64,
    /// Total fan angle across the fingers.
    #[serde(default = "default_finger_splay")]
    pub finger_splay: f64,
    #[serde(default = "default_thumb_splay")]
    pub thumb_splay: f64,
    #[serde(default = "default_thumb_tilt")]
    pub thumb_tilt: f64,

    #[serde(default = "default_shoulder_head")]
    pub shoulder_head: [f64; 3],
    #[serde(default = "default_shoulder_tail")]
    pub shoulder_tail: [f64; 3],
    /// Elbow as `[fraction along shoulder-to-wrist, backward offset fraction]`.
    #[serde(default = "default_elbow")]
    pub elbow: [f64; 2],
    #[serde(default = "default_wrist")]
    pub wrist: [f64; 3],

    #[serde(default = "default_spine_start")]
    pub spine_start: [f64; 3],
    /// Lengths of hips, spine, chest, neck and head, bottom up.
    #[serde(default = "default_spine_lengths")]
    pub spine_lengths: Vec<f64>,

    #[serde(default = "default_upleg")]
    pub upleg: [f64; 3],
    #[serde(default = "default_knee")]
    pub knee: [f64; 3],
    #[serde(default = "default_ankle")]
    pub ankle: [f64; 3],
    #[serde(default = "default_toe")]
    pub toe: [f64; 3],

    #[serde(default = "default_eye_center")]
    pub eye_center: [f64; 3],
    #[serde(default = "default_eye_radius")]
    pub eye_radius: f64,
    #[serde(default = "default_jaw")]
    pub jaw: [f64; 3],
    #[serde(default = "default_chin")]
    pub chin: [f64; 3],
}

fn default_true() -> bool {
    true
}

fn default_num_fingers() -> u32 {
    5
}

fn default_num_toes() -> u32 {
    1
}

fn default_foot_width() -> f64 {
    0.08
}

fn default_wrist_width() -> f64 {
    0.05
}

fn default_wrist_yaw() -> f64 {
    -90.0
}

fn default_finger_curl() -> f64 {
    -8.5
}

fn default_toe_curl() -> f64 {
    -4.0
}

fn default_finger_splay() -> f64 {
    -43.1
}

fn default_thumb_splay() -> f64 {
    27.3
}

fn default_thumb_tilt() -> f64 {
    -23.0
}

fn default_shoulder_head() -> [f64; 3] {
    [0.03, -0.02, 1.46]
}

fn default_shoulder_tail() -> [f64; 3] {
    [0.17, 0.02, 1.45]
}

fn default_elbow() -> [f64; 2] {
    [0.45, 0.04]
}

fn default_wrist() -> [f64; 3] {
    [0.70, 0.03, 1.45]
}

fn default_spine_start() -> [f64; 3] {
    [0.0, 0.0, 0.93]
}

fn default_spine_lengths() -> Vec<f64> {
    vec![0.15, 0.16, 0.30, 0.11, 0.17]
}

fn default_upleg() -> [f64; 3] {
    [0.09, 0.0, 0.96]
}

fn default_knee() -> [f64; 3] {
    [0.09, -0.02, 0.52]
}

fn default_ankle() -> [f64; 3] {
    [0.09, 0.03, 0.09]
}

fn default_toe() -> [f64; 3] {
    [0.09, -0.10, 0.02]
}

fn default_eye_center() -> [f64; 3] {
    [0.031, -0.094, 1.71]
}

fn default_eye_radius() -> f64 {
    0.0166
}

fn default_jaw() -> [f64; 3] {
    [0.0, -0.03, 1.67]
}

fn default_chin() -> [f64; 3] {
    [0.0, -0.12, 1.62]
}

impl Default for BodyParams {
    fn default() -> Self {
        Self {
            num_fingers: default_num_fingers(),
            num_toes: default_num_toes(),
            use_simple_toe: true,
            use_thumb: true,
            foot_width: default_foot_width(),
            wrist_width: default_wrist_width(),
            wrist_yaw: default_wrist_yaw(),
            wrist_pitch: 0.0,
            wrist_roll: 0.0,
            finger_curl: default_finger_curl(),
            toe_curl: default_toe_curl(),
            finger_splay: default_finger_splay(),
            thumb_splay: default_thumb_splay(),
            thumb_tilt: default_thumb_tilt(),
            shoulder_head: default_shoulder_head(),
            shoulder_tail: default_shoulder_tail(),
            elbow: default_elbow(),
            wrist: default_wrist(),
            spine_start: default_spine_start(),
            spine_lengths: default_spine_lengths(),
            upleg: default_upleg(),
            knee: default_knee(),
            ankle: default_ankle(),
            toe: default_toe(),
            eye_center: default_eye_center(),
            eye_radius: default_eye_radius(),
            jaw: default_jaw(),
            chin: default_chin(),
        }
    }
}

impl BodyParams {
    /// Rejects counts and sizes the part builders cannot work with.
    pub fn validate(&self) -> RigResult<()> {
        if !(1..=5).contains(&self.num_fingers) {
            return Err(RigError::invalid_parameter("num_fingers", "must be between 1 and 5"));
        }
        if !(1..=5).contains(&self.num_toes) {
            return Err(RigError::invalid_parameter("num_toes", "must be between 1 and 5"));
        }
        if !(3..=5).contains(&self.spine_lengths.len()) {
            return Err(RigError::invalid_parameter(
                "spine_lengths",
                format!("expected 3 to 5 lengths, got {}", self.spine_lengths.len()),
            ));
        }
        if let Some(i) = self.spine_lengths.iter().position(|l| *l <= 0.0) {
            return Err(RigError::invalid_parameter(
                "spine_lengths",
                format!("length {} is not positive", i),
            ));
        }
        for (name, value) in [
            ("foot_width", self.foot_width),
            ("wrist_width", self.wrist_width),
            ("eye_radius", self.eye_radius),
        ] {
            if value <= 0.0 {
                return Err(RigError::invalid_parameter(name, "must be positive"));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Joint Tuning
// =============================================================================

/// Two-axis swing limit on a digit's base segment. Zero disables an axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwingAxes {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Asymmetric swing range, centred by a mechanical swing-center bone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwingRange {
    pub max: f64,
    pub min: f64,
}

impl SwingRange {
    pub const fn new(max: f64, min: f64) -> Self {
        Self { max, min }
    }

    /// Angle the swing-center bone is rotated by.
    pub fn center(&self) -> f64 {
        (self.max + self.min) / 2.0
    }

    /// Half-width of the range.
    pub fn half_width(&self) -> f64 {
        (self.max - self.min).abs() / 2.0
    }
}

/// Limits for one digit: base swing, then the ranges of the next two segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DigitTuning {
    pub base_swing: SwingAxes,
    pub middle: SwingRange,
    pub tip: SwingRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpineTuning {
    pub hips_chest_twist: f64,
    pub chest_head_twist: f64,
    pub hips_spine_swing: f64,
    pub spine_chest_swing: f64,
    pub chest_neck_swing: f64,
    pub neck_head_swing: f64,
    pub hips_heaviness: f64,
    pub spine_heaviness: f64,
    pub spine_bbone_segments: u32,
    pub neck_bbone_segments: u32,
    pub neck_bbone_in: f64,
}

impl Default for SpineTuning {
    fn default() -> Self {
        Self {
            hips_chest_twist: 45.0,
            chest_head_twist: 100.0,
            hips_spine_swing: 45.0,
            spine_chest_swing: 45.0,
            chest_neck_swing: 60.0,
            neck_head_swing: 80.0,
            hips_heaviness: 20.0,
            spine_heaviness: 40.0,
            spine_bbone_segments: 8,
            neck_bbone_segments: 7,
            neck_bbone_in: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArmTuning {
    pub shoulder_heaviness: f64,
    pub shoulder_antiparallel: f64,
    pub shoulder_twist: f64,
    pub elbow_swing: f64,
    pub forearm_bbone_segments: u32,
    pub clavicle_swing: f64,
    pub clavicle_raise_swing: f64,
    pub clavicle_side_swing: f64,
}

impl Default for ArmTuning {
    fn default() -> Self {
        Self {
            shoulder_heaviness: 35.0,
            shoulder_antiparallel: 30.0,
            shoulder_twist: 100.0,
            elbow_swing: 90.0,
            forearm_bbone_segments: 32,
            clavicle_swing: 45.0,
            clavicle_raise_swing: 95.0,
            clavicle_side_swing: 22.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandTuning {
    pub wrist_antiparallel: f64,
    pub wrist_twist: f64,
    /// Swing of each finger's palm segment; zero makes the segment mechanical.
    pub palm_swings: [f64; 5],
    pub thumb: DigitTuning,
    pub finger: DigitTuning,
    pub widget_scale: f64,
    pub target_widget_scale: f64,
}

impl Default for HandTuning {
    fn default() -> Self {
        Self {
            wrist_antiparallel: 80.0,
            wrist_twist: 170.0,
            palm_swings: [0.0, 0.0, 0.0, 3.0, 3.0],
            thumb: DigitTuning {
                base_swing: SwingAxes { x: 0.0, y: 30.0 },
                middle: SwingRange::new(20.0, -85.0),
                tip: SwingRange::new(80.0, -60.0),
            },
            finger: DigitTuning {
                base_swing: SwingAxes { x: 30.0, y: 90.0 },
                middle: SwingRange::new(0.0, -135.0),
                tip: SwingRange::new(45.0, -95.0),
            },
            widget_scale: 0.75,
            target_widget_scale: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LegTuning {
    pub knee_rigidity: f64,
    pub ankle_rigidity: f64,
    pub knee_min_swing: f64,
    pub ankle_twist: f64,
    pub ankle_swing: f64,
    pub ankle_side_swing: f64,
    pub hip_min_twist: f64,
    pub hip_min_swing: f64,
    /// Added to rest-pose angles when they exceed the hip minimums.
    pub hip_margin: f64,
    /// Splay of the leg cone around the hips' down axis.
    pub legcone_splay: f64,
}

impl Default for LegTuning {
    fn default() -> Self {
        Self {
            knee_rigidity: 50.0,
            ankle_rigidity: 200.0,
            knee_min_swing: 85.0,
            ankle_twist: 30.0,
            ankle_swing: 45.0,
            ankle_side_swing: 22.0,
            hip_min_twist: 80.0,
            hip_min_swing: 47.0,
            hip_margin: 2.0,
            legcone_splay: 36.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FootTuning {
    pub toe: DigitTuning,
    pub target_widget_length: f64,
    pub target_widget_mid: f64,
    pub toes_widget_scale: f64,
}

impl Default for FootTuning {
    fn default() -> Self {
        Self {
            toe: DigitTuning {
                base_swing: SwingAxes { x: 20.0, y: 45.0 },
                middle: SwingRange::new(0.0, -90.0),
                tip: SwingRange::new(70.0, -20.0),
            },
            target_widget_length: 1.0,
            target_widget_mid: 0.3,
            toes_widget_scale: 1.2,
        }
    }
}

/// Constants used while authoring the rig's constraint graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigConfig {
    #[serde(default = "default_ball_socket_rigidity")]
    pub ball_socket_rigidity: f64,
    #[serde(default = "default_target_position_rigidity")]
    pub target_position_rigidity: f64,
    #[serde(default = "default_target_orientation_rigidity")]
    pub target_orientation_rigidity: f64,
    /// Default closest approach to antiparallel for chained bones.
    #[serde(default = "default_antiparallel_margin")]
    pub antiparallel_margin: f64,
    /// Puller length as a fraction of the pulled bone.
    #[serde(default = "default_puller_scale")]
    pub puller_scale: f64,
    #[serde(default = "default_puller_min_size")]
    pub puller_min_size: f64,
    /// How far in front of the eyes the eye target sits.
    #[serde(default = "default_eye_target_distance")]
    pub eye_target_distance: f64,
    /// Adds a forearm twist chain with this many bbone segments.
    #[serde(default)]
    pub forearm_twist_bbone_segments: Option<u32>,
    #[serde(default)]
    pub spine: SpineTuning,
    #[serde(default)]
    pub arm: ArmTuning,
    #[serde(default)]
    pub hand: HandTuning,
    #[serde(default)]
    pub leg: LegTuning,
    #[serde(default)]
    pub foot: FootTuning,
}

fn default_ball_socket_rigidity() -> f64 {
    16.0
}

fn default_target_position_rigidity() -> f64 {
    2.0
}

fn default_target_orientation_rigidity() -> f64 {
    0.1
}

fn default_antiparallel_margin() -> f64 {
    20.0
}

fn default_puller_scale() -> f64 {
    0.1
}

fn default_puller_min_size() -> f64 {
    0.005
}

fn default_eye_target_distance() -> f64 {
    0.5
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            ball_socket_rigidity: default_ball_socket_rigidity(),
            target_position_rigidity: default_target_position_rigidity(),
            target_orientation_rigidity: default_target_orientation_rigidity(),
            antiparallel_margin: default_antiparallel_margin(),
            puller_scale: default_puller_scale(),
            puller_min_size: default_puller_min_size(),
            eye_target_distance: default_eye_target_distance(),
            forearm_twist_bbone_segments: None,
            spine: SpineTuning::default(),
            arm: ArmTuning::default(),
            hand: HandTuning::default(),
            leg: LegTuning::default(),
            foot: FootTuning::default(),
        }
    }
}

impl RigConfig {
    pub fn validate(&self) -> RigResult<()> {
        for (name, value) in [
            ("ball_socket_rigidity", self.ball_socket_rigidity),
            ("target_position_rigidity", self.target_position_rigidity),
            ("target_orientation_rigidity", self.target_orientation_rigidity),
            ("leg.knee_rigidity", self.leg.knee_rigidity),
            ("leg.ankle_rigidity", self.leg.ankle_rigidity),
        ] {
            if value < 0.0 {
                return Err(RigError::invalid_parameter(name, "must not be negative"));
            }
        }
        if !(0.0..180.0).contains(&self.antiparallel_margin) {
            return Err(RigError::invalid_parameter(
                "antiparallel_margin",
                "must be in [0, 180)",
            ));
        }
        if self.puller_scale <= 0.0 || self.puller_min_size <= 0.0 {
            return Err(RigError::invalid_parameter("puller_scale", "puller sizes must be positive"));
        }
        if self.hand.palm_swings.iter().any(|s| *s < 0.0) {
            return Err(RigError::invalid_parameter("hand.palm_swings", "must not be negative"));
        }
        if self.forearm_twist_bbone_segments == Some(0) {
            return Err(RigError::invalid_parameter(
                "forearm_twist_bbone_segments",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_validate() {
        AutoRigConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "body": { "num_fingers": 3, "spine_lengths": [0.2, 0.2, 0.3] } }"#;
        let config: AutoRigConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.body.num_fingers, 3);
        assert_eq!(config.body.num_toes, 1);
        assert_eq!(config.body.spine_lengths.len(), 3);
        assert_eq!(config.rig, RigConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_nested_tuning_override() {
        let json = r#"{ "rig": { "leg": { "knee_min_swing": 95.0 } } }"#;
        let config: AutoRigConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.rig.leg.knee_min_swing, 95.0);
        assert_eq!(config.rig.leg.ankle_rigidity, 200.0);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{ "body": { "num_arms": 4 } }"#;
        assert!(serde_json::from_str::<AutoRigConfig>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_counts() {
        let mut body = BodyParams::default();
        body.num_fingers = 6;
        assert!(matches!(
            body.validate(),
            Err(RigError::InvalidParameter { ref name, .. }) if name == "num_fingers"
        ));

        let mut body = BodyParams::default();
        body.spine_lengths = vec![0.2, 0.2];
        assert!(body.validate().is_err());

        let mut body = BodyParams::default();
        body.spine_lengths[2] = 0.0;
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_swing_range_center() {
        let range = SwingRange::new(20.0, -85.0);
        assert_eq!(range.center(), -32.5);
        assert_eq!(range.half_width(), 52.5);
    }

    #[test]
    fn test_rig_validate() {
        let mut rig = RigConfig::default();
        rig.antiparallel_margin = 180.0;
        assert!(rig.validate().is_err());

        let mut rig = RigConfig::default();
        rig.forearm_twist_bbone_segments = Some(0);
        assert!(rig.validate().is_err());
    }
}
