//! In-memory host armature and widget library.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::{
    ArmatureFlags, ArmatureSource, AssetHandle, AssetLookup, BoneSink, ConstraintEditor, ConstraintOutcome,
    EditBoneData, HostArmature, HostBone, HostMode, PoseSink,
};
use crate::constraint::ConstraintRecord;
use crate::error::{RigError, RigResult};
use crate::layers::LayerSet;
use crate::metabone::PoseSettings;
use crate::widget::WidgetShape;

/// A host armature held entirely in memory.
///
/// Bone handles are indices into the bone list; bones are never removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ArmatureDump", into = "ArmatureDump")]
pub struct MemoryArmature {
    pub name: String,
    pub mode: HostMode,
    pub flags: ArmatureFlags,
    pub visible_layers: LayerSet,
    bones: Vec<HostBone>,
    index: HashMap<String, usize>,
}

/// Serialized form of [`MemoryArmature`]; the name index is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct ArmatureDump {
    name: String,
    mode: HostMode,
    flags: ArmatureFlags,
    visible_layers: LayerSet,
    bones: Vec<HostBone>,
}

impl From<ArmatureDump> for MemoryArmature {
    fn from(dump: ArmatureDump) -> Self {
        let index = dump
            .bones
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();
        Self {
            name: dump.name,
            mode: dump.mode,
            flags: dump.flags,
            visible_layers: dump.visible_layers,
            bones: dump.bones,
            index,
        }
    }
}

impl From<MemoryArmature> for ArmatureDump {
    fn from(arm: MemoryArmature) -> Self {
        Self {
            name: arm.name,
            mode: arm.mode,
            flags: arm.flags,
            visible_layers: arm.visible_layers,
            bones: arm.bones,
        }
    }
}

impl PartialEq for MemoryArmature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.mode == other.mode
            && self.flags == other.flags
            && self.visible_layers == other.visible_layers
            && self.bones == other.bones
    }
}

impl MemoryArmature {
    /// Creates an empty armature in object mode.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Bones in creation order.
    pub fn bones(&self) -> &[HostBone] {
        &self.bones
    }

    /// Looks up a bone by name.
    pub fn bone(&self, name: &str) -> Option<&HostBone> {
        self.index_of(name).map(|i| &self.bones[i])
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Names of every bone some control constraint targets.
    pub fn control_target_names(&self) -> BTreeSet<&str> {
        self.bones
            .iter()
            .flat_map(|b| b.constraints.iter())
            .filter(|c| c.constraint_type == crate::constraint::ConstraintType::BepuikControl)
            .map(|c| c.target.as_str())
            .collect()
    }
}

impl HostArmature for MemoryArmature {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> HostMode {
        self.mode
    }

    fn set_mode(&mut self, mode: HostMode) {
        self.mode = mode;
    }

    fn flags(&self) -> ArmatureFlags {
        self.flags
    }

    fn set_flags(&mut self, flags: ArmatureFlags) {
        self.flags = flags;
    }

    fn set_visible_layers(&mut self, layers: LayerSet) {
        self.visible_layers = layers;
    }
}

impl ArmatureSource for MemoryArmature {
    fn bone_names(&self) -> Vec<String> {
        self.bones.iter().map(|b| b.name.clone()).collect()
    }

    fn read_bone(&self, name: &str) -> Option<HostBone> {
        self.bone(name).cloned()
    }
}

impl BoneSink for MemoryArmature {
    type Handle = usize;

    fn exists(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    fn handle(&self, name: &str) -> Option<usize> {
        self.index_of(name)
    }

    fn create_bone(&mut self, name: &str) -> RigResult<usize> {
        if self.exists(name) {
            return Err(RigError::DuplicateBone { name: name.to_string() });
        }
        self.index.insert(name.to_string(), self.bones.len());
        self.bones.push(HostBone {
            name: name.to_string(),
            parent: None,
            edit: EditBoneData::default(),
            pose: PoseSettings::default(),
            layers: LayerSet::empty(),
            constraints: Vec::new(),
        });
        Ok(self.bones.len() - 1)
    }

    fn set_edit_data(&mut self, bone: usize, data: &EditBoneData) {
        if let Some(b) = self.bones.get_mut(bone) {
            b.edit = data.clone();
        }
    }

    fn set_parent(&mut self, bone: usize, parent: Option<usize>) {
        let parent_name = parent.and_then(|p| self.bones.get(p)).map(|p| p.name.clone());
        if let Some(b) = self.bones.get_mut(bone) {
            b.parent = parent_name;
        }
    }
}

impl PoseSink for MemoryArmature {
    fn set_pose(&mut self, bone: usize, pose: &PoseSettings) {
        if let Some(b) = self.bones.get_mut(bone) {
            b.pose = pose.clone();
        }
    }

    fn set_layers(&mut self, bone: usize, layers: LayerSet) {
        if let Some(b) = self.bones.get_mut(bone) {
            b.layers = layers;
        }
    }

    fn add_constraint(&mut self, bone: usize, record: ConstraintRecord) -> ConstraintOutcome {
        let Some(b) = self.bones.get_mut(bone) else {
            return ConstraintOutcome::UnknownBone;
        };
        if b.constraints.iter().any(|c| c.name == record.name) {
            return ConstraintOutcome::AlreadyExists;
        }
        b.constraints.push(record);
        ConstraintOutcome::Added
    }
}

impl ConstraintEditor for MemoryArmature {
    fn constraints_mut(&mut self, bone: &str) -> Option<&mut Vec<ConstraintRecord>> {
        let i = self.index_of(bone)?;
        Some(&mut self.bones[i].constraints)
    }
}

/// Widget library keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryAssets {
    pub widgets: BTreeMap<String, WidgetShape>,
    /// Names that never resolve.
    #[serde(default)]
    pub unavailable: BTreeSet<String>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a widget name as unresolvable.
    pub fn with_unavailable(mut self, name: impl Into<String>) -> Self {
        self.unavailable.insert(name.into());
        self
    }
}

impl AssetLookup for MemoryAssets {
    fn get_or_create_widget(&mut self, name: &str, shape: Option<&WidgetShape>) -> Option<AssetHandle> {
        if self.unavailable.contains(name) {
            return None;
        }
        let shape = shape.cloned().or_else(|| self.widgets.get(name).cloned()).or_else(|| WidgetShape::builtin(name))?;
        self.widgets.insert(name.to_string(), shape);
        Some(AssetHandle(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintKind, MetaConstraint};
    use crate::widget::WIDGET_CUBE;

    #[test]
    fn test_create_bone_rejects_duplicates() {
        let mut arm = MemoryArmature::new("Rig");
        let a = arm.create_bone("a").unwrap();
        assert_eq!(arm.handle("a"), Some(a));
        assert_eq!(
            arm.create_bone("a"),
            Err(RigError::DuplicateBone { name: "a".into() })
        );
        assert_eq!(arm.bones().len(), 1);
    }

    #[test]
    fn test_parent_is_stored_by_name() {
        let mut arm = MemoryArmature::new("Rig");
        let a = arm.create_bone("a").unwrap();
        let b = arm.create_bone("b").unwrap();
        arm.set_parent(b, Some(a));
        assert_eq!(arm.bone("b").unwrap().parent.as_deref(), Some("a"));
    }

    #[test]
    fn test_add_constraint_is_idempotent_by_name() {
        let mut arm = MemoryArmature::new("Rig");
        let a = arm.create_bone("a").unwrap();
        let record = MetaConstraint::new("t", "t", ConstraintKind::control(0.0, 0.0, 0.0))
            .to_record("a")
            .unwrap();
        assert_eq!(arm.add_constraint(a, record.clone()), ConstraintOutcome::Added);
        assert_eq!(arm.add_constraint(a, record), ConstraintOutcome::AlreadyExists);
        assert_eq!(arm.bone("a").unwrap().constraints.len(), 1);
        assert!(arm.control_target_names().contains("t"));
    }

    #[test]
    fn test_add_constraint_to_unknown_handle() {
        let mut arm = MemoryArmature::new("Rig");
        arm.create_bone("a").unwrap();
        let record = MetaConstraint::new("t", "t", ConstraintKind::control(0.0, 0.0, 0.0))
            .to_record("a")
            .unwrap();
        assert_eq!(arm.add_constraint(7, record), ConstraintOutcome::UnknownBone);
        assert!(arm.bone("a").unwrap().constraints.is_empty());
    }

    #[test]
    fn test_lookup_by_name_after_reload() {
        let mut arm = MemoryArmature::new("Rig");
        for name in ["a", "b", "c"] {
            arm.create_bone(name).unwrap();
        }
        let json = serde_json::to_string(&arm).unwrap();
        let mut restored: MemoryArmature = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, arm);
        assert_eq!(restored.handle("c"), Some(2));
        assert!(restored.constraints_mut("b").is_some());
        assert_eq!(restored.create_bone("d"), Ok(3));
        assert_eq!(restored.bone("d").unwrap().name, "d");
    }

    #[test]
    fn test_widget_resolution() {
        let mut assets = MemoryAssets::new().with_unavailable("Widget-Missing");
        assert!(assets.get_or_create_widget(WIDGET_CUBE, None).is_some());
        assert!(assets.get_or_create_widget("Widget-Unknown", None).is_none());
        assert!(assets.get_or_create_widget("Widget-Missing", Some(&WidgetShape::Cube)).is_none());

        let pad = WidgetShape::pad(1.0, 1.0, 0.3);
        assert!(assets.get_or_create_widget("Widget-Foot-target.L", Some(&pad)).is_some());
        assert_eq!(assets.widgets.get("Widget-Foot-target.L"), Some(&pad));
    }
}
