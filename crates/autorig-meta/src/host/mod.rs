//! Host adapter boundary.
//!
//! The rig generator never talks to a concrete 3D application. It reads bones
//! through [`ArmatureSource`], writes them through [`BoneSink`] and
//! [`PoseSink`], edits constraint records through [`ConstraintEditor`] and
//! resolves display widgets through [`AssetLookup`].
//!
//! [`memory`] provides an in-process reference host used by the CLI and tests.

pub mod memory;

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::constraint::ConstraintRecord;
use crate::error::RigResult;
use crate::layers::LayerSet;
use crate::metabone::PoseSettings;
use crate::widget::WidgetShape;

pub use memory::{MemoryArmature, MemoryAssets};

/// Interaction mode of a host armature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostMode {
    #[default]
    Object,
    Edit,
    Pose,
}

impl fmt::Display for HostMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HostMode::Object => "object",
            HostMode::Edit => "edit",
            HostMode::Pose => "pose",
        };
        f.write_str(s)
    }
}

/// Generator flags stored on a host armature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmatureFlags {
    /// Armature holds body proportions, ready to be rigged.
    pub is_meta_armature: bool,
    /// Armature is a generated rig.
    pub is_auto_rig: bool,
    pub use_thumb: bool,
    pub use_simple_toe: bool,
}

/// Rest geometry of a host bone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditBoneData {
    pub head: DVec3,
    pub tail: DVec3,
    /// The bone's z axis; encodes roll.
    pub z_axis: DVec3,
    pub head_radius: f64,
    pub tail_radius: f64,
    pub bbone_x: f64,
    pub bbone_z: f64,
    pub bbone_in: f64,
    pub bbone_out: f64,
    pub bbone_segments: u32,
    pub envelope_distance: f64,
    pub use_envelope_multiply: bool,
    pub use_connect: bool,
    pub use_deform: bool,
}

/// Everything a host knows about one bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostBone {
    pub name: String,
    pub parent: Option<String>,
    pub edit: EditBoneData,
    pub pose: PoseSettings,
    pub layers: LayerSet,
    #[serde(default)]
    pub constraints: Vec<ConstraintRecord>,
}

/// Result of adding a constraint to a host bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOutcome {
    Added,
    /// A constraint with that name is already on the bone; nothing changed.
    AlreadyExists,
    /// The handle does not name a bone on the host.
    UnknownBone,
}

/// State shared by every host armature.
pub trait HostArmature {
    /// Name of the armature object.
    fn name(&self) -> &str;
    fn mode(&self) -> HostMode;
    fn set_mode(&mut self, mode: HostMode);
    fn flags(&self) -> ArmatureFlags;
    fn set_flags(&mut self, flags: ArmatureFlags);
    /// Sets which layers the armature displays.
    fn set_visible_layers(&mut self, layers: LayerSet);
}

/// Read access to host bones.
pub trait ArmatureSource: HostArmature {
    /// Bone names in host order.
    fn bone_names(&self) -> Vec<String>;
    fn read_bone(&self, name: &str) -> Option<HostBone>;
}

/// Incremental creation of host bones.
pub trait BoneSink: HostArmature {
    type Handle: Copy + Eq + fmt::Debug;

    fn exists(&self, name: &str) -> bool;
    fn handle(&self, name: &str) -> Option<Self::Handle>;
    /// Creates an empty bone. Fails with `DuplicateBone` if the name is taken.
    fn create_bone(&mut self, name: &str) -> RigResult<Self::Handle>;
    fn set_edit_data(&mut self, bone: Self::Handle, data: &EditBoneData);
    fn set_parent(&mut self, bone: Self::Handle, parent: Option<Self::Handle>);
}

/// Pose-level data on host bones.
pub trait PoseSink: BoneSink {
    fn set_pose(&mut self, bone: Self::Handle, pose: &PoseSettings);
    fn set_layers(&mut self, bone: Self::Handle, layers: LayerSet);
    fn add_constraint(&mut self, bone: Self::Handle, record: ConstraintRecord) -> ConstraintOutcome;
}

/// In-place editing of constraint records on an existing rig.
pub trait ConstraintEditor: ArmatureSource {
    fn constraints_mut(&mut self, bone: &str) -> Option<&mut Vec<ConstraintRecord>>;
}

/// Opaque handle to a host display asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle(pub String);

/// Resolves display widgets by name.
pub trait AssetLookup {
    /// Returns the widget called `name`, creating it from `shape` when absent.
    ///
    /// `None` means the widget cannot be resolved; callers treat that as
    /// cosmetic and carry on.
    fn get_or_create_widget(&mut self, name: &str, shape: Option<&WidgetShape>) -> Option<AssetHandle>;
}
