//! Pose presets: rigidity setups for common posing tasks on one side of a rig.
//!
//! Presets edit the control records of an existing rig in place. They only
//! touch rigidities, never geometry or hierarchy.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use autorig_meta::naming::split_suffix;
use autorig_meta::{ConstraintEditor, ConstraintRecord, ConstraintType, ParamValue, RigError};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

const FINGER_PATTERN: &str = r"^finger\d+-\d+";
const PALM_PATTERN: &str = r"^finger\d+-1$";
const TOE_PATTERN: &str = r"^toe\d+-\d+";

static FINGER_REGEX: OnceLock<Regex> = OnceLock::new();
static PALM_REGEX: OnceLock<Regex> = OnceLock::new();
static TOE_REGEX: OnceLock<Regex> = OnceLock::new();

fn finger_regex() -> &'static Regex {
    FINGER_REGEX.get_or_init(|| Regex::new(FINGER_PATTERN).expect("invalid regex pattern"))
}

fn palm_regex() -> &'static Regex {
    PALM_REGEX.get_or_init(|| Regex::new(PALM_PATTERN).expect("invalid regex pattern"))
}

fn toe_regex() -> &'static Regex {
    TOE_REGEX.get_or_init(|| Regex::new(TOE_PATTERN).expect("invalid regex pattern"))
}

/// A named rigidity setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PosePreset {
    /// Frees the fingers for tweaking while the hand stays put.
    TweakFingers,
    /// The foot pivots on the heel.
    PivotHeel,
    /// The foot pivots on the toes.
    PivotToes,
}

/// Result of applying a preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetOutcome {
    /// The preset was applied; `active` is the bone to hand to the animator.
    Finished { active: Option<String> },
    /// Bones the preset needs are missing; nothing was changed.
    Cancelled,
}

impl PosePreset {
    pub const ALL: [PosePreset; 3] = [PosePreset::TweakFingers, PosePreset::PivotHeel, PosePreset::PivotToes];

    pub fn as_str(self) -> &'static str {
        match self {
            PosePreset::TweakFingers => "tweak-fingers",
            PosePreset::PivotHeel => "pivot-heel",
            PosePreset::PivotToes => "pivot-toes",
        }
    }

    /// Applies the preset to the bones of `side` on `host`.
    pub fn apply<H: ConstraintEditor + ?Sized>(self, host: &mut H, side: char) -> PresetOutcome {
        let outcome = match self {
            PosePreset::TweakFingers => tweak_fingers(host, side),
            PosePreset::PivotHeel => pivot_heel(host, side),
            PosePreset::PivotToes => pivot_toes(host, side),
        };
        debug!("preset {} on side {}: {:?}", self, side, outcome);
        outcome
    }
}

impl fmt::Display for PosePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PosePreset {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PosePreset::ALL.into_iter().find(|p| p.as_str() == s).ok_or_else(|| {
            RigError::invalid_parameter("preset", format!("unknown preset '{}'", s))
        })
    }
}

// =============================================================================
// Presets
// =============================================================================

fn tweak_fingers<H: ConstraintEditor + ?Sized>(host: &mut H, side: char) -> PresetOutcome {
    let hand = format!("hand.{}", side);
    let suffix = format!(".{}", side);

    for finger in side_bones(host, finger_regex(), side) {
        clear_controls(host, &finger);
    }

    // Palm bones may carry a rotation target named `<base>-rot<suffix>`.
    for palm in side_bones(host, palm_regex(), side) {
        let target = format!("{}-rot{}", split_suffix(&palm).0, suffix);
        update_control(host, &palm, &target, |record| {
            record.set("orientation_rigidity", ParamValue::Float(1.0));
        });
    }

    update_control(host, &hand, &format!("hand-target.{}", side), |record| {
        record.set("bepuik_rigidity", ParamValue::Float(0.0));
        record.set("orientation_rigidity", ParamValue::Float(0.0));
        record.set("use_hard_rigidity", ParamValue::Bool(true));
    });

    PresetOutcome::Finished { active: None }
}

fn pivot_heel<H: ConstraintEditor + ?Sized>(host: &mut H, side: char) -> PresetOutcome {
    let foot = format!("foot.{}", side);
    let foot_target = format!("foot-target.{}", side);
    let toes = side_bones(host, toe_regex(), side);

    if !has_bone(host, &foot) || !has_bone(host, &foot_target) || toes.is_empty() {
        return PresetOutcome::Cancelled;
    }

    clear_foot(host, &foot, &toes);
    update_control(host, &foot, &foot_target, set_hard);
    pin_floor(host, side);

    PresetOutcome::Finished {
        active: Some(foot_target),
    }
}

fn pivot_toes<H: ConstraintEditor + ?Sized>(host: &mut H, side: char) -> PresetOutcome {
    let foot = format!("foot.{}", side);
    let toes_target = format!("toes-target.{}", side);
    let ball_target = format!("foot-ball-target.{}", side);
    let toes = side_bones(host, toe_regex(), side);

    if !has_bone(host, &foot) || !has_bone(host, &toes_target) || !has_bone(host, &ball_target) || toes.is_empty() {
        return PresetOutcome::Cancelled;
    }

    clear_foot(host, &foot, &toes);
    update_control(host, &foot, &ball_target, |record| {
        record.set("orientation_rigidity", ParamValue::Float(1.0));
    });
    for toe in &toes {
        update_control(host, toe, &toes_target, set_hard);
    }
    pin_floor(host, side);

    PresetOutcome::Finished {
        active: Some(ball_target),
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn has_bone<H: ConstraintEditor + ?Sized>(host: &H, name: &str) -> bool {
    host.read_bone(name).is_some()
}

/// Bones of `side` whose name matches `pattern`.
fn side_bones<H: ConstraintEditor + ?Sized>(host: &H, pattern: &Regex, side: char) -> Vec<String> {
    let suffix = format!(".{}", side);
    host.bone_names()
        .into_iter()
        .filter(|name| name.ends_with(&suffix) && pattern.is_match(split_suffix(name).0))
        .collect()
}

fn clear_controls<H: ConstraintEditor + ?Sized>(host: &mut H, bone: &str) {
    if let Some(records) = host.constraints_mut(bone) {
        records.iter_mut().for_each(ConstraintRecord::clear_control_rigidities);
    }
}

fn clear_foot<H: ConstraintEditor + ?Sized>(host: &mut H, foot: &str, toes: &[String]) {
    clear_controls(host, foot);
    for toe in toes {
        clear_controls(host, toe);
    }
}

/// Edits the control on `bone` that targets `target`; returns false when there is none.
fn update_control<H, F>(host: &mut H, bone: &str, target: &str, edit: F) -> bool
where
    H: ConstraintEditor + ?Sized,
    F: FnOnce(&mut ConstraintRecord),
{
    let record = host.constraints_mut(bone).and_then(|records| {
        records
            .iter_mut()
            .find(|r| r.constraint_type == ConstraintType::BepuikControl && r.target == target)
    });
    match record {
        Some(record) => {
            edit(record);
            true
        }
        None => false,
    }
}

fn set_hard(record: &mut ConstraintRecord) {
    record.set("use_hard_rigidity", ParamValue::Bool(true));
}

/// Pins a hand-made `floor.<side>` bone to its `foot-floor-target.<side>` when both exist.
fn pin_floor<H: ConstraintEditor + ?Sized>(host: &mut H, side: char) {
    let floor_target = format!("foot-floor-target.{}", side);
    if has_bone(host, &floor_target) {
        update_control(host, &format!("floor.{}", side), &floor_target, set_hard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorig_meta::{ConstraintKind, HostArmature, HostMode, MemoryArmature, MetaBoneCollection, MetaConstraint};
    use glam::DVec3;
    use pretty_assertions::assert_eq;

    fn add_bone(bones: &mut MetaBoneCollection, name: &str, x: f64) {
        let bone = bones.new_bone(name).unwrap();
        bone.head = DVec3::new(x, 0.0, 0.0);
        bone.tail = DVec3::new(x, 0.1, 0.0);
    }

    fn control(bones: &mut MetaBoneCollection, bone: &str, target: &str, head_tail: f64) {
        bones
            .get_mut(bone)
            .unwrap()
            .constraints
            .push(MetaConstraint::new(target, target, ConstraintKind::control(head_tail, 2.0, 0.5)));
    }

    /// A left foot with two toes, its targets and a floor pin.
    fn foot_host() -> MemoryArmature {
        let mut bones = MetaBoneCollection::new();
        for (i, name) in [
            "foot.L",
            "toe1-1.L",
            "toe2-1.L",
            "foot-target.L",
            "toes-target.L",
            "foot-ball-target.L",
            "floor.L",
            "foot-floor-target.L",
            "toe1-1.R",
        ]
        .into_iter()
        .enumerate()
        {
            add_bone(&mut bones, name, i as f64);
        }
        control(&mut bones, "foot.L", "foot-target.L", 0.0);
        control(&mut bones, "foot.L", "foot-ball-target.L", 1.0);
        control(&mut bones, "toe1-1.L", "toes-target.L", 0.0);
        control(&mut bones, "toe2-1.L", "toes-target.L", 0.0);
        control(&mut bones, "floor.L", "foot-floor-target.L", 0.0);
        control(&mut bones, "toe1-1.R", "toes-target.L", 0.0);

        let mut host = MemoryArmature::new("Rig");
        host.set_mode(HostMode::Edit);
        bones.push(&mut host).unwrap();
        host
    }

    fn record<'a>(host: &'a MemoryArmature, bone: &str, target: &str) -> &'a ConstraintRecord {
        host.bone(bone)
            .unwrap()
            .constraints
            .iter()
            .find(|r| r.target == target)
            .unwrap()
    }

    #[test]
    fn test_parse_preset_names() {
        assert_eq!("pivot-heel".parse::<PosePreset>().unwrap(), PosePreset::PivotHeel);
        assert_eq!(PosePreset::TweakFingers.to_string(), "tweak-fingers");
        assert_eq!("pivot".parse::<PosePreset>().unwrap_err().code(), "RIG_009");
    }

    #[test]
    fn test_pivot_heel() {
        let mut host = foot_host();
        let outcome = PosePreset::PivotHeel.apply(&mut host, 'L');
        assert_eq!(
            outcome,
            PresetOutcome::Finished {
                active: Some("foot-target.L".into())
            }
        );

        let heel = record(&host, "foot.L", "foot-target.L");
        assert!(heel.bool("use_hard_rigidity").unwrap());
        assert_eq!(heel.float("bepuik_rigidity").unwrap(), 0.0);
        assert_eq!(record(&host, "foot.L", "foot-ball-target.L").float("bepuik_rigidity").unwrap(), 0.0);
        assert_eq!(record(&host, "toe1-1.L", "toes-target.L").float("bepuik_rigidity").unwrap(), 0.0);
        assert!(record(&host, "floor.L", "foot-floor-target.L").bool("use_hard_rigidity").unwrap());
        // The other side is untouched.
        assert_eq!(record(&host, "toe1-1.R", "toes-target.L").float("bepuik_rigidity").unwrap(), 2.0);
    }

    #[test]
    fn test_pivot_toes() {
        let mut host = foot_host();
        let outcome = PosePreset::PivotToes.apply(&mut host, 'L');
        assert_eq!(
            outcome,
            PresetOutcome::Finished {
                active: Some("foot-ball-target.L".into())
            }
        );

        let ball = record(&host, "foot.L", "foot-ball-target.L");
        assert_eq!(ball.float("orientation_rigidity").unwrap(), 1.0);
        assert!(!ball.bool("use_hard_rigidity").unwrap());
        assert!(record(&host, "toe2-1.L", "toes-target.L").bool("use_hard_rigidity").unwrap());
        assert!(!record(&host, "foot.L", "foot-target.L").bool("use_hard_rigidity").unwrap());
    }

    #[test]
    fn test_missing_bones_cancel() {
        let mut host = foot_host();
        assert_eq!(PosePreset::PivotToes.apply(&mut host, 'R'), PresetOutcome::Cancelled);
        assert_eq!(PosePreset::PivotHeel.apply(&mut host, 'R'), PresetOutcome::Cancelled);
        assert_eq!(record(&host, "toe1-1.R", "toes-target.L").float("bepuik_rigidity").unwrap(), 2.0);
    }

    #[test]
    fn test_tweak_fingers() {
        let mut bones = MetaBoneCollection::new();
        for (i, name) in ["hand.L", "hand-target.L", "finger2-1.L", "finger2-1-rot.L", "finger2-2.L"]
            .into_iter()
            .enumerate()
        {
            add_bone(&mut bones, name, i as f64);
        }
        control(&mut bones, "hand.L", "hand-target.L", 0.0);
        control(&mut bones, "finger2-1.L", "finger2-1-rot.L", 0.0);
        control(&mut bones, "finger2-2.L", "hand-target.L", 1.0);
        let mut host = MemoryArmature::new("Rig");
        host.set_mode(HostMode::Edit);
        bones.push(&mut host).unwrap();

        let outcome = PosePreset::TweakFingers.apply(&mut host, 'L');
        assert_eq!(outcome, PresetOutcome::Finished { active: None });

        let hand = record(&host, "hand.L", "hand-target.L");
        assert!(hand.bool("use_hard_rigidity").unwrap());
        assert_eq!(hand.float("bepuik_rigidity").unwrap(), 0.0);

        let palm = record(&host, "finger2-1.L", "finger2-1-rot.L");
        assert_eq!(palm.float("orientation_rigidity").unwrap(), 1.0);
        assert_eq!(palm.float("bepuik_rigidity").unwrap(), 0.0);
        assert_eq!(record(&host, "finger2-2.L", "hand-target.L").float("bepuik_rigidity").unwrap(), 0.0);
    }
}
