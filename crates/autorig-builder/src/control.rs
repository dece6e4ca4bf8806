//! Control lookup and creation for individual bones.
//!
//! A control is a `Control` constraint on the controlled bone whose target is
//! another bone of the same armature. These helpers let a rig be extended by
//! hand after [`crate::RigBuilder`] has run.

use std::collections::HashSet;

use autorig_meta::naming::basename;
use autorig_meta::widget::WIDGET_CUBE;
use autorig_meta::{
    classify_bone, ArmatureFlags, ArmatureSource, AssetLookup, ConstraintKind, HostMode, MetaBoneCollection,
    MetaConstraint, PoseSink, RigResult,
};
use glam::DVec3;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::rig::ROOT_BONE;

/// Distance under which a parent's tail and a child's head count as joined.
const JOINED_EPSILON: f64 = 1e-4;

// =============================================================================
// Lookup
// =============================================================================

/// First control on `bone` pulling exactly `point` toward a bone that exists.
fn control_with_pulled_point<'a>(
    bones: &'a MetaBoneCollection,
    bone: &str,
    point: DVec3,
) -> Option<&'a MetaConstraint> {
    bones.get(bone)?.constraints.iter().find(|c| {
        matches!(c.kind, ConstraintKind::Control { pulled_point, .. } if pulled_point == point)
            && bones.contains(&c.target)
    })
}

/// Finds a control acting on the head of `bone`.
///
/// Either the bone's own head control, or its parent's tail control when the
/// parent's tail meets this bone's head.
pub fn head_control<'a>(bones: &'a MetaBoneCollection, bone: &str) -> Option<&'a MetaConstraint> {
    if let Some(control) = control_with_pulled_point(bones, bone, DVec3::ZERO) {
        return Some(control);
    }
    let this = bones.get(bone)?;
    let parent = bones.get(this.parent.as_deref()?)?;
    if parent.tail.distance(this.head) > JOINED_EPSILON {
        return None;
    }
    control_with_pulled_point(bones, &parent.name, DVec3::Y)
}

/// Finds a control acting on the tail of `bone`.
///
/// Either the bone's own tail control, or the head control of a child whose
/// head meets this bone's tail.
pub fn tail_control<'a>(bones: &'a MetaBoneCollection, bone: &str) -> Option<&'a MetaConstraint> {
    if let Some(control) = control_with_pulled_point(bones, bone, DVec3::Y) {
        return Some(control);
    }
    let tail = bones.get(bone)?.tail;
    bones
        .iter()
        .filter(|child| child.parent.as_deref() == Some(bone) && child.head.distance(tail) <= JOINED_EPSILON)
        .find_map(|child| control_with_pulled_point(bones, &child.name, DVec3::ZERO))
}

// =============================================================================
// Creation
// =============================================================================

fn default_scale() -> f64 {
    0.15
}

fn default_widget() -> String {
    WIDGET_CUBE.to_string()
}

/// Options of [`create_control`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlOptions {
    /// Position of the target along the controlled bone, 0 at the head.
    #[serde(default)]
    pub head_tail: f64,

    #[serde(default = "default_widget")]
    pub widget: String,

    /// Target length as a fraction of the controlled bone's length.
    #[serde(default = "default_scale")]
    pub scale: f64,

    #[serde(default)]
    pub lock_rotation: [bool; 3],

    #[serde(default)]
    pub lock_rotation_w: bool,

    #[serde(default)]
    pub lock_rotations_4d: bool,

    /// Base name of the new targets; defaults to each controlled bone's base name.
    #[serde(default)]
    pub name: Option<String>,

    /// Inserted between base name and side suffix; chosen from `head_tail`
    /// when unset and the plain name is taken.
    #[serde(default)]
    pub presuffix: Option<String>,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            head_tail: 0.0,
            widget: default_widget(),
            scale: default_scale(),
            lock_rotation: [false; 3],
            lock_rotation_w: false,
            lock_rotations_4d: false,
            name: None,
            presuffix: None,
        }
    }
}

impl ControlOptions {
    fn default_presuffix(&self) -> &'static str {
        if self.head_tail == 0.0 {
            "target"
        } else if self.head_tail == 1.0 {
            "tail-target"
        } else {
            "mid-target"
        }
    }

    /// Whether `bone` already has a control at the requested end.
    fn is_controlled(&self, bones: &MetaBoneCollection, bone: &str) -> bool {
        if self.head_tail == 0.0 {
            head_control(bones, bone).is_some()
        } else if self.head_tail == 1.0 {
            tail_control(bones, bone).is_some()
        } else {
            false
        }
    }

    fn target_name(&self, bones: &MetaBoneCollection, bone: &str) -> String {
        let base = basename(bone);
        let suffix = &bone[base.len()..];
        let (base, mut needs_presuffix) = match &self.name {
            Some(name) => (name.as_str(), false),
            None => (base, true),
        };
        if bones.contains(&format!("{}{}", base, suffix)) {
            needs_presuffix = true;
        }
        match &self.presuffix {
            Some(presuffix) => format!("{}-{}{}", base, presuffix, suffix),
            None if needs_presuffix => format!("{}-{}{}", base, self.default_presuffix(), suffix),
            None => format!("{}{}", base, suffix),
        }
    }
}

/// Adds a target bone and a control for each of `selected`.
///
/// Bones that already have a control at the requested end, or whose target
/// name is taken, are skipped. Targets hang off the root bone when there is
/// one. On an auto-rig, each target is classified into the controlled
/// bone's layers. Returns the names of the new targets.
pub fn create_control(
    bones: &mut MetaBoneCollection,
    selected: &[&str],
    options: &ControlOptions,
    flags: ArmatureFlags,
    assets: &mut dyn AssetLookup,
) -> RigResult<Vec<String>> {
    let skip: HashSet<&str> = selected
        .iter()
        .copied()
        .filter(|bone| options.is_controlled(bones, bone))
        .collect();
    let parent = bones.contains(ROOT_BONE).then(|| ROOT_BONE.to_string());

    let mut created = Vec::new();
    for &bone in selected {
        let controlled = bones.require(bone)?;
        let target_name = options.target_name(bones, bone);
        if skip.contains(bone) || bones.contains(&target_name) {
            debug!("'{}' already has a control; skipped", bone);
            continue;
        }

        let head = controlled.point_at(options.head_tail);
        let direction = controlled.y_axis()?;
        let length = controlled.length() * options.scale;
        let align = controlled.align_roll;

        let widget = assets.get_or_create_widget(&options.widget, None);
        if widget.is_none() {
            warn!("Widget '{}' for bone '{}' could not be resolved", options.widget, target_name);
        }

        let target = bones.new_bone(&target_name)?;
        target.head = head;
        target.tail = head + direction * length;
        target.align_roll = align;
        target.parent = parent.clone();
        target.pose.show_wire = true;
        target.pose.custom_shape = widget.map(|h| h.0);
        target.pose.locks.scale = [true; 3];
        target.pose.locks.rotation = options.lock_rotation;
        target.pose.locks.rotation_w = options.lock_rotation_w;
        target.pose.locks.rotations_4d = options.lock_rotations_4d;
        if flags.is_auto_rig {
            target.layers = classify_bone(target, Some(basename(bone)), true);
        }

        bones.require_mut(bone)?.add_named_constraint(
            &target_name,
            &target_name,
            ConstraintKind::control(options.head_tail, 0.0, 0.0),
        );
        created.push(target_name);
    }
    Ok(created)
}

/// Runs [`create_control`] against a host armature in pose mode.
///
/// The host is switched to edit mode for the write and left in pose mode.
pub fn create_control_on_host<H>(
    host: &mut H,
    selected: &[&str],
    options: &ControlOptions,
    assets: &mut dyn AssetLookup,
) -> RigResult<Vec<String>>
where
    H: ArmatureSource + PoseSink + ?Sized,
{
    let mut bones = MetaBoneCollection::pull(host)?;
    let created = create_control(&mut bones, selected, options, host.flags(), assets)?;
    host.set_mode(HostMode::Edit);
    bones.push(host)?;
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorig_meta::{ArmatureLayer, HostArmature, MemoryArmature, MemoryAssets, MetaBone};
    use pretty_assertions::assert_eq;

    fn bone(name: &str, head: DVec3, tail: DVec3) -> MetaBone {
        let mut bone = MetaBone::new(name);
        bone.head = head;
        bone.tail = tail;
        bone
    }

    /// root, upleg.L and loleg.L joined at the knee.
    fn leg() -> MetaBoneCollection {
        let mut bones = MetaBoneCollection::new();
        bones.insert(bone("root", DVec3::ZERO, DVec3::Y)).unwrap();
        bones
            .insert(bone("upleg.L", DVec3::new(0.1, 0.0, 1.0), DVec3::new(0.1, 0.0, 0.5)))
            .unwrap();
        let mut loleg = bone("loleg.L", DVec3::new(0.1, 0.0, 0.5), DVec3::new(0.1, 0.0, 0.1));
        loleg.parent = Some("upleg.L".into());
        bones.insert(loleg).unwrap();
        bones
    }

    fn auto_rig() -> ArmatureFlags {
        ArmatureFlags {
            is_auto_rig: true,
            ..ArmatureFlags::default()
        }
    }

    #[test]
    fn test_head_control_through_parent_tail() {
        let mut bones = leg();
        bones.insert(bone("knee", DVec3::ZERO, DVec3::Y)).unwrap();
        bones
            .get_mut("upleg.L")
            .unwrap()
            .add_named_constraint("knee", "knee", ConstraintKind::control(1.0, 1.0, 0.0));

        assert_eq!(head_control(&bones, "loleg.L").map(|c| c.target.as_str()), Some("knee"));
        assert_eq!(tail_control(&bones, "upleg.L").map(|c| c.target.as_str()), Some("knee"));
        assert!(head_control(&bones, "upleg.L").is_none());
    }

    #[test]
    fn test_tail_control_through_child_head() {
        let mut bones = leg();
        bones.insert(bone("shin", DVec3::ZERO, DVec3::Y)).unwrap();
        bones
            .get_mut("loleg.L")
            .unwrap()
            .add_named_constraint("shin", "shin", ConstraintKind::control(0.0, 1.0, 0.0));

        assert_eq!(tail_control(&bones, "upleg.L").map(|c| c.target.as_str()), Some("shin"));
        assert!(tail_control(&bones, "loleg.L").is_none());
    }

    #[test]
    fn test_control_to_missing_target_is_ignored() {
        let mut bones = leg();
        bones
            .get_mut("loleg.L")
            .unwrap()
            .add_named_constraint("gone", "gone", ConstraintKind::control(0.0, 1.0, 0.0));
        assert!(head_control(&bones, "loleg.L").is_none());
    }

    #[test]
    fn test_create_control_names_and_placement() {
        let mut bones = leg();
        let mut assets = MemoryAssets::new();
        let options = ControlOptions {
            head_tail: 0.5,
            ..ControlOptions::default()
        };

        let created = create_control(&mut bones, &["loleg.L"], &options, auto_rig(), &mut assets).unwrap();
        assert_eq!(created, vec!["loleg-mid-target.L".to_string()]);

        let target = bones.get("loleg-mid-target.L").unwrap();
        assert!(target.head.abs_diff_eq(DVec3::new(0.1, 0.0, 0.3), 1e-12));
        assert!((target.length() - 0.4 * 0.15).abs() < 1e-12);
        assert_eq!(target.parent.as_deref(), Some("root"));
        assert_eq!(target.pose.custom_shape.as_deref(), Some(WIDGET_CUBE));
        assert!(target.layers.contains(ArmatureLayer::Target));
        assert!(target.layers.contains(ArmatureLayer::LegL));

        let control = bones.get("loleg.L").unwrap().constraint("loleg-mid-target.L").unwrap();
        assert_eq!(control.pulled_point(), Some(DVec3::new(0.0, 0.5, 0.0)));
    }

    #[test]
    fn test_create_control_skips_controlled_bones() {
        let mut bones = leg();
        let mut assets = MemoryAssets::new();
        let options = ControlOptions::default();

        let created = create_control(&mut bones, &["upleg.L"], &options, auto_rig(), &mut assets).unwrap();
        assert_eq!(created, vec!["upleg-target.L".to_string()]);

        // The head control is found the second time round.
        let created = create_control(&mut bones, &["upleg.L"], &options, auto_rig(), &mut assets).unwrap();
        assert!(created.is_empty());
    }

    #[test]
    fn test_explicit_name_and_presuffix() {
        let mut bones = leg();
        let mut assets = MemoryAssets::new();
        let options = ControlOptions {
            name: Some("knee".into()),
            ..ControlOptions::default()
        };
        let created = create_control(&mut bones, &["loleg.L"], &options, auto_rig(), &mut assets).unwrap();
        assert_eq!(created, vec!["knee.L".to_string()]);

        let options = ControlOptions {
            head_tail: 1.0,
            presuffix: Some("ik".into()),
            ..ControlOptions::default()
        };
        let created = create_control(&mut bones, &["loleg.L"], &options, auto_rig(), &mut assets).unwrap();
        assert_eq!(created, vec!["loleg-ik.L".to_string()]);
    }

    #[test]
    fn test_create_control_on_host() {
        let bones = leg();
        let mut host = MemoryArmature::new("Rig");
        host.set_mode(HostMode::Edit);
        bones.push(&mut host).unwrap();

        let mut assets = MemoryAssets::new();
        let created =
            create_control_on_host(&mut host, &["upleg.L"], &ControlOptions::default(), &mut assets).unwrap();

        assert_eq!(created, vec!["upleg-target.L".to_string()]);
        assert_eq!(host.mode(), HostMode::Pose);
        assert_eq!(host.bone("upleg-target.L").unwrap().parent.as_deref(), Some("root"));
        assert!(host.control_target_names().contains("upleg-target.L"));
    }
}
