//! The host-independent description of a single skeletal segment.

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::constraint::{ConstraintKind, MetaConstraint};
use crate::error::{RigError, RigResult};
use crate::host::EditBoneData;
use crate::layers::LayerSet;
use crate::math::{self, Axes, POINT_EPSILON};

/// Rotation representation of a pose channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    #[default]
    Quaternion,
    AxisAngle,
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

impl RotationMode {
    /// Returns true for the four-component representations.
    pub fn is_4d(self) -> bool {
        matches!(self, RotationMode::Quaternion | RotationMode::AxisAngle)
    }
}

/// Per-axis transform locks of a pose channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFlags {
    pub location: [bool; 3],
    pub rotation: [bool; 3],
    /// Lock of the W component, honoured only when `rotations_4d` is set.
    pub rotation_w: bool,
    pub rotations_4d: bool,
    pub scale: [bool; 3],
}

/// Pose-side settings of a bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSettings {
    /// Whether the external solver drives this bone.
    pub use_bepuik: bool,
    pub use_bepuik_always_solve: bool,
    pub ball_socket_rigidity: f64,
    pub rotational_heaviness: f64,
    pub locks: LockFlags,
    pub rotation_mode: RotationMode,
    /// Display widget name.
    pub custom_shape: Option<String>,
    pub show_wire: bool,
}

impl Default for PoseSettings {
    fn default() -> Self {
        Self {
            use_bepuik: false,
            use_bepuik_always_solve: false,
            ball_socket_rigidity: 0.0,
            rotational_heaviness: 2.5,
            locks: LockFlags::default(),
            rotation_mode: RotationMode::Quaternion,
            custom_shape: None,
            show_wire: false,
        }
    }
}

impl PoseSettings {
    /// Locks every location, rotation and scale channel.
    pub fn lock_all(&mut self) {
        self.locks.location = [true; 3];
        self.locks.rotation = [true; 3];
        self.locks.rotation_w = true;
        self.locks.scale = [true; 3];
    }

    /// True when no channel can be animated.
    pub fn is_fully_locked(&self) -> bool {
        let locks = &self.locks;
        let rotation_locked = if self.rotation_mode.is_4d() && locks.rotations_4d {
            locks.rotation.iter().all(|l| *l) && locks.rotation_w
        } else {
            locks.rotation.iter().all(|l| *l)
        };
        rotation_locked && locks.scale.iter().all(|l| *l) && locks.location.iter().all(|l| *l)
    }
}

/// One skeletal segment plus the constraints authored on it.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaBone {
    pub name: String,
    pub head: DVec3,
    pub tail: DVec3,
    /// Vector the bone's z axis is rolled towards.
    pub align_roll: DVec3,
    pub head_radius: Option<f64>,
    pub tail_radius: Option<f64>,
    pub bbone_x: Option<f64>,
    pub bbone_z: Option<f64>,
    pub bbone_in: f64,
    pub bbone_out: f64,
    pub bbone_segments: u32,
    pub envelope_distance: Option<f64>,
    pub use_envelope_multiply: bool,
    pub use_connect: bool,
    pub use_deform: bool,
    /// Name of the parent bone in the same collection.
    pub parent: Option<String>,
    pub pose: PoseSettings,
    pub layers: LayerSet,
    pub constraints: Vec<MetaConstraint>,
}

impl MetaBone {
    /// Creates a unit bone along +Y at the origin.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            head: DVec3::ZERO,
            tail: DVec3::Y,
            align_roll: DVec3::Z,
            head_radius: None,
            tail_radius: None,
            bbone_x: None,
            bbone_z: None,
            bbone_in: 0.0,
            bbone_out: 0.0,
            bbone_segments: 1,
            envelope_distance: None,
            use_envelope_multiply: false,
            use_connect: false,
            use_deform: false,
            parent: None,
            pose: PoseSettings::default(),
            layers: LayerSet::empty(),
            constraints: Vec::new(),
        }
    }

    /// Copies every attribute of `template` except its constraints, optionally
    /// moving the geometry by `transform`.
    pub fn from_template(name: impl Into<String>, template: &MetaBone, transform: Option<&DMat4>) -> Self {
        let mut bone = template.clone();
        bone.name = name.into();
        bone.constraints.clear();
        if let Some(m) = transform {
            bone.transform(m);
        }
        bone
    }

    /// A default bone moved by `transform`.
    pub fn transformed_default(name: impl Into<String>, transform: &DMat4) -> Self {
        let mut bone = Self::new(name);
        bone.transform(transform);
        bone
    }

    /// Builds a bone from host data.
    pub fn from_host(name: impl Into<String>, edit: &EditBoneData, pose: &PoseSettings) -> Self {
        let mut bone = Self::new(name);
        bone.head = edit.head;
        bone.tail = edit.tail;
        bone.align_roll = edit.z_axis;
        bone.head_radius = Some(edit.head_radius);
        bone.tail_radius = Some(edit.tail_radius);
        bone.bbone_x = Some(edit.bbone_x);
        bone.bbone_z = Some(edit.bbone_z);
        bone.bbone_in = edit.bbone_in;
        bone.bbone_out = edit.bbone_out;
        bone.bbone_segments = edit.bbone_segments;
        bone.envelope_distance = Some(edit.envelope_distance);
        bone.use_envelope_multiply = edit.use_envelope_multiply;
        bone.use_connect = edit.use_connect;
        bone.use_deform = edit.use_deform;
        bone.pose = pose.clone();
        bone
    }

    /// Applies an affine transform to head, tail and align vector.
    pub fn transform(&mut self, m: &DMat4) {
        self.head = m.transform_point3(self.head);
        self.tail = m.transform_point3(self.tail);
        self.align_roll = m.transform_vector3(self.align_roll);
    }

    pub fn length(&self) -> f64 {
        (self.tail - self.head).length()
    }

    /// Bones shorter than [`POINT_EPSILON`] are geometric placeholders and are
    /// never materialized.
    pub fn is_valid(&self) -> bool {
        self.length() > POINT_EPSILON
    }

    /// The bone's local frame.
    pub fn axes(&self) -> RigResult<Axes> {
        if math::vector_is_zero(self.tail - self.head) {
            return Err(RigError::degenerate(&self.name));
        }
        math::segment_axes(self.head, self.tail, self.align_roll).ok_or_else(|| RigError::DegenerateRoll {
            bone: self.name.clone(),
        })
    }

    pub fn y_axis(&self) -> RigResult<DVec3> {
        Ok(self.axes()?.y)
    }

    pub fn x_axis(&self) -> RigResult<DVec3> {
        Ok(self.axes()?.x)
    }

    pub fn z_axis(&self) -> RigResult<DVec3> {
        Ok(self.axes()?.z)
    }

    /// Local matrix with columns `(x, y, z, head)`.
    pub fn matrix(&self) -> RigResult<DMat4> {
        Ok(math::frame_matrix(&self.axes()?, self.head))
    }

    /// Angle between this bone's y axis and another's, in degrees.
    pub fn degrees_to(&self, other: &MetaBone) -> RigResult<f64> {
        Ok(math::degrees_between(self.y_axis()?, other.y_axis()?))
    }

    /// Point at a head-to-tail fraction along the bone.
    pub fn point_at(&self, head_tail: f64) -> DVec3 {
        self.head + (self.tail - self.head) * head_tail
    }

    /// Marks the bone as a deforming, solver-driven ball-socket bone.
    pub fn flag_deforming_ballsocket(&mut self, rigidity: f64) {
        self.use_deform = true;
        self.pose.use_bepuik = true;
        self.pose.ball_socket_rigidity = rigidity;
    }

    /// Host edit data with unset sizes derived from the bone length.
    pub fn edit_data(&self) -> RigResult<EditBoneData> {
        let length = self.length();
        let head_radius = self.head_radius.unwrap_or(length / 10.0);
        Ok(EditBoneData {
            head: self.head,
            tail: self.tail,
            z_axis: self.z_axis()?,
            head_radius,
            tail_radius: self.tail_radius.unwrap_or(length / 10.0),
            bbone_x: self.bbone_x.unwrap_or(length / 10.0),
            bbone_z: self.bbone_z.unwrap_or(length / 10.0),
            bbone_in: self.bbone_in,
            bbone_out: self.bbone_out,
            bbone_segments: self.bbone_segments,
            envelope_distance: self.envelope_distance.unwrap_or(head_radius * 15.0),
            use_envelope_multiply: self.use_envelope_multiply,
            use_connect: self.use_connect,
            use_deform: self.use_deform,
        })
    }

    // =========================================================================
    // Constraints
    // =========================================================================

    /// Appends a constraint with the default `<type>_<n>` name.
    pub fn add_constraint(&mut self, target: impl Into<String>, kind: ConstraintKind) -> &mut MetaConstraint {
        let name = format!(
            "{}_{}",
            kind.constraint_type().as_str().to_lowercase(),
            self.constraints.len() + 1
        );
        self.add_named_constraint(name, target, kind)
    }

    /// Appends a constraint with an explicit name.
    pub fn add_named_constraint(
        &mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        kind: ConstraintKind,
    ) -> &mut MetaConstraint {
        let index = self.constraints.len();
        self.constraints.push(MetaConstraint::new(name, target, kind));
        &mut self.constraints[index]
    }

    pub fn constraint(&self, name: &str) -> Option<&MetaConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Constraints of this bone that point at `target`.
    pub fn constraints_targeting<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a MetaConstraint> + 'a {
        self.constraints.iter().filter(move |c| c.target == target)
    }
}
