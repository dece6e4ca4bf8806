//! Declarative joint and control records.
//!
//! A [`MetaConstraint`] lives on its owning bone (connection A) and names a
//! target bone (connection B). Each kind carries strongly typed parameters and
//! translates to a host [`ConstraintRecord`] through a fixed table:
//!
//! | Kind             | Host type                   | Params |
//! |------------------|-----------------------------|--------|
//! | `Control`        | `BEPUIK_CONTROL`            | `pulled_point`, `bepuik_rigidity`, `orientation_rigidity`, `use_hard_rigidity` |
//! | `BallSocketJoint`| `BEPUIK_BALL_SOCKET_JOINT`  | `anchor` |
//! | `TwistJoint`     | `BEPUIK_TWIST_JOINT`        | `axis_a`, `axis_b` |
//! | `TwistLimit`     | `BEPUIK_TWIST_LIMIT`        | `axis_a`, `axis_b`, `measurement_axis_a`, `measurement_axis_b`, `max_twist` |
//! | `SwingLimit`     | `BEPUIK_SWING_LIMIT`        | `axis_a`, `axis_b`, `max_swing` |
//! | `RevoluteJoint`  | `BEPUIK_REVOLUTE_JOINT`     | `free_axis` |
//! | `Generic`        | `DAMPED_TRACK`, `COPY_ROTATION` | per-kind attribute whitelist |
//!
//! Angles are authored in degrees and stored on the host in radians.

use std::collections::BTreeMap;
use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{RigError, RigResult};

// =============================================================================
// Axis references
// =============================================================================

/// A local axis of a bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Axis {
    X,
    Y,
    Z,
    NegativeX,
    NegativeY,
    NegativeZ,
}

impl Axis {
    /// Host spelling of the axis.
    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::NegativeX => "NEGATIVE_X",
            Axis::NegativeY => "NEGATIVE_Y",
            Axis::NegativeZ => "NEGATIVE_Z",
        }
    }

    /// The lateral axis of a body side: `X` on the left, `NEGATIVE_X` on the right.
    pub fn relative_x(side: char) -> Self {
        if side == 'R' {
            Axis::NegativeX
        } else {
            Axis::X
        }
    }
}

/// An axis expressed in the frame of a reference bone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoneAxis {
    pub bone: String,
    pub axis: Axis,
}

impl BoneAxis {
    pub fn new(bone: impl Into<String>, axis: Axis) -> Self {
        Self {
            bone: bone.into(),
            axis,
        }
    }
}

/// A point along a reference bone, as a head-to-tail fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonePoint {
    pub bone: String,
    pub head_tail: f64,
}

impl BonePoint {
    pub fn new(bone: impl Into<String>, head_tail: f64) -> Self {
        Self {
            bone: bone.into(),
            head_tail,
        }
    }
}

// =============================================================================
// Constraint types
// =============================================================================

/// Host constraint type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintType {
    BepuikControl,
    BepuikBallSocketJoint,
    BepuikTwistJoint,
    BepuikTwistLimit,
    BepuikSwingLimit,
    BepuikRevoluteJoint,
    DampedTrack,
    CopyRotation,
}

impl ConstraintType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintType::BepuikControl => "BEPUIK_CONTROL",
            ConstraintType::BepuikBallSocketJoint => "BEPUIK_BALL_SOCKET_JOINT",
            ConstraintType::BepuikTwistJoint => "BEPUIK_TWIST_JOINT",
            ConstraintType::BepuikTwistLimit => "BEPUIK_TWIST_LIMIT",
            ConstraintType::BepuikSwingLimit => "BEPUIK_SWING_LIMIT",
            ConstraintType::BepuikRevoluteJoint => "BEPUIK_REVOLUTE_JOINT",
            ConstraintType::DampedTrack => "DAMPED_TRACK",
            ConstraintType::CopyRotation => "COPY_ROTATION",
        }
    }

    /// True for the types the external IK solver consumes.
    pub fn is_bepuik(self) -> bool {
        !matches!(self, ConstraintType::DampedTrack | ConstraintType::CopyRotation)
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-solver constraints passed through to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericKind {
    DampedTrack,
    CopyRotation,
}

/// Expected value type of a generic attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Bool,
    Float,
    Text,
}

impl GenericKind {
    pub fn constraint_type(self) -> ConstraintType {
        match self {
            GenericKind::DampedTrack => ConstraintType::DampedTrack,
            GenericKind::CopyRotation => ConstraintType::CopyRotation,
        }
    }

    /// Attributes the host accepts for this kind.
    pub fn attributes(self) -> &'static [(&'static str, AttrType)] {
        match self {
            GenericKind::DampedTrack => &[
                ("track_axis", AttrType::Text),
                ("head_tail", AttrType::Float),
                ("influence", AttrType::Float),
            ],
            GenericKind::CopyRotation => &[
                ("target_space", AttrType::Text),
                ("owner_space", AttrType::Text),
                ("use_x", AttrType::Bool),
                ("use_y", AttrType::Bool),
                ("use_z", AttrType::Bool),
                ("use_offset", AttrType::Bool),
                ("influence", AttrType::Float),
            ],
        }
    }

    fn attribute_type(self, name: &str) -> Option<AttrType> {
        self.attributes()
            .iter()
            .find(|(attr, _)| *attr == name)
            .map(|(_, ty)| *ty)
    }

    fn from_type(ty: ConstraintType) -> Option<Self> {
        match ty {
            ConstraintType::DampedTrack => Some(GenericKind::DampedTrack),
            ConstraintType::CopyRotation => Some(GenericKind::CopyRotation),
            _ => None,
        }
    }
}

/// Value of a generic constraint attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Float(f64),
    Text(String),
}

impl AttrValue {
    fn attr_type(&self) -> AttrType {
        match self {
            AttrValue::Bool(_) => AttrType::Bool,
            AttrValue::Float(_) => AttrType::Float,
            AttrValue::Text(_) => AttrType::Text,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Text(v) => write!(f, "'{}'", v),
        }
    }
}

/// A passthrough constraint with a name/value attribute map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericConstraint {
    pub kind: GenericKind,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl GenericConstraint {
    pub fn new(kind: GenericKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute. Names are checked when the constraint is
    /// translated for the host.
    pub fn with(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// Kind-specific constraint payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Pulls a point of the owner towards the target bone.
    Control {
        /// Point in the owner's parametric frame; `y` is the head-to-tail fraction.
        pulled_point: DVec3,
        position_rigidity: f64,
        orientation_rigidity: f64,
        use_hard_rigidity: bool,
    },
    BallSocketJoint {
        anchor: BonePoint,
    },
    TwistJoint {
        axis_a: BoneAxis,
        axis_b: BoneAxis,
    },
    TwistLimit {
        axis_a: BoneAxis,
        axis_b: BoneAxis,
        measurement_axis_a: BoneAxis,
        measurement_axis_b: BoneAxis,
        /// Degrees.
        max_twist: f64,
    },
    SwingLimit {
        axis_a: BoneAxis,
        axis_b: BoneAxis,
        /// Degrees.
        max_swing: f64,
    },
    RevoluteJoint {
        free_axis: BoneAxis,
    },
    Generic(GenericConstraint),
}

impl ConstraintKind {
    /// A control pulling the point at `head_tail` along the owner.
    pub fn control(head_tail: f64, position_rigidity: f64, orientation_rigidity: f64) -> Self {
        ConstraintKind::Control {
            pulled_point: DVec3::new(0.0, head_tail, 0.0),
            position_rigidity,
            orientation_rigidity,
            use_hard_rigidity: false,
        }
    }

    pub fn constraint_type(&self) -> ConstraintType {
        match self {
            ConstraintKind::Control { .. } => ConstraintType::BepuikControl,
            ConstraintKind::BallSocketJoint { .. } => ConstraintType::BepuikBallSocketJoint,
            ConstraintKind::TwistJoint { .. } => ConstraintType::BepuikTwistJoint,
            ConstraintKind::TwistLimit { .. } => ConstraintType::BepuikTwistLimit,
            ConstraintKind::SwingLimit { .. } => ConstraintType::BepuikSwingLimit,
            ConstraintKind::RevoluteJoint { .. } => ConstraintType::BepuikRevoluteJoint,
            ConstraintKind::Generic(generic) => generic.kind.constraint_type(),
        }
    }

    fn bone_refs_mut(&mut self) -> Vec<&mut String> {
        match self {
            ConstraintKind::Control { .. } | ConstraintKind::Generic(_) => Vec::new(),
            ConstraintKind::BallSocketJoint { anchor } => vec![&mut anchor.bone],
            ConstraintKind::TwistJoint { axis_a, axis_b } | ConstraintKind::SwingLimit { axis_a, axis_b, .. } => {
                vec![&mut axis_a.bone, &mut axis_b.bone]
            }
            ConstraintKind::TwistLimit {
                axis_a,
                axis_b,
                measurement_axis_a,
                measurement_axis_b,
                ..
            } => vec![
                &mut axis_a.bone,
                &mut axis_b.bone,
                &mut measurement_axis_a.bone,
                &mut measurement_axis_b.bone,
            ],
            ConstraintKind::RevoluteJoint { free_axis } => vec![&mut free_axis.bone],
        }
    }
}

// =============================================================================
// MetaConstraint
// =============================================================================

/// A constraint authored on a bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaConstraint {
    /// Unique per owning bone.
    pub name: String,
    /// Connection B.
    pub target: String,
    #[serde(flatten)]
    pub kind: ConstraintKind,
}

impl MetaConstraint {
    pub fn new(name: impl Into<String>, target: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind,
        }
    }

    pub fn constraint_type(&self) -> ConstraintType {
        self.kind.constraint_type()
    }

    /// Pulled point of a control constraint.
    pub fn pulled_point(&self) -> Option<DVec3> {
        match self.kind {
            ConstraintKind::Control { pulled_point, .. } => Some(pulled_point),
            _ => None,
        }
    }

    /// Replaces every reference to bone `old` with `new`.
    pub fn rename_bone(&mut self, old: &str, new: &str) {
        if self.target == old {
            self.target = new.to_string();
        }
        for bone in self.kind.bone_refs_mut() {
            if bone == old {
                *bone = new.to_string();
            }
        }
    }

    /// Translates to the host representation.
    ///
    /// `owner` is the owning bone, used for error context only.
    pub fn to_record(&self, owner: &str) -> RigResult<ConstraintRecord> {
        let mut params = BTreeMap::new();
        match &self.kind {
            ConstraintKind::Control {
                pulled_point,
                position_rigidity,
                orientation_rigidity,
                use_hard_rigidity,
            } => {
                params.insert("pulled_point".into(), ParamValue::Vector(pulled_point.to_array()));
                params.insert("bepuik_rigidity".into(), ParamValue::Float(*position_rigidity));
                params.insert("orientation_rigidity".into(), ParamValue::Float(*orientation_rigidity));
                params.insert("use_hard_rigidity".into(), ParamValue::Bool(*use_hard_rigidity));
            }
            ConstraintKind::BallSocketJoint { anchor } => {
                params.insert("anchor".into(), ParamValue::Point(anchor.clone()));
            }
            ConstraintKind::TwistJoint { axis_a, axis_b } => {
                params.insert("axis_a".into(), ParamValue::Axis(axis_a.clone()));
                params.insert("axis_b".into(), ParamValue::Axis(axis_b.clone()));
            }
            ConstraintKind::TwistLimit {
                axis_a,
                axis_b,
                measurement_axis_a,
                measurement_axis_b,
                max_twist,
            } => {
                params.insert("axis_a".into(), ParamValue::Axis(axis_a.clone()));
                params.insert("axis_b".into(), ParamValue::Axis(axis_b.clone()));
                params.insert("measurement_axis_a".into(), ParamValue::Axis(measurement_axis_a.clone()));
                params.insert("measurement_axis_b".into(), ParamValue::Axis(measurement_axis_b.clone()));
                params.insert("max_twist".into(), ParamValue::Float(max_twist.to_radians()));
            }
            ConstraintKind::SwingLimit {
                axis_a,
                axis_b,
                max_swing,
            } => {
                params.insert("axis_a".into(), ParamValue::Axis(axis_a.clone()));
                params.insert("axis_b".into(), ParamValue::Axis(axis_b.clone()));
                params.insert("max_swing".into(), ParamValue::Float(max_swing.to_radians()));
            }
            ConstraintKind::RevoluteJoint { free_axis } => {
                params.insert("free_axis".into(), ParamValue::Axis(free_axis.clone()));
            }
            ConstraintKind::Generic(generic) => {
                for (attr, value) in &generic.attributes {
                    if generic.kind.attribute_type(attr) != Some(value.attr_type()) {
                        return Err(RigError::UnrecognizedConstraintAttribute {
                            bone: owner.to_string(),
                            constraint: self.name.clone(),
                            attribute: attr.clone(),
                            value: value.to_string(),
                        });
                    }
                    params.insert(attr.clone(), ParamValue::from(value.clone()));
                }
            }
        }

        Ok(ConstraintRecord {
            name: self.name.clone(),
            constraint_type: self.constraint_type(),
            target: self.target.clone(),
            params,
        })
    }

    /// Rebuilds a constraint from its host representation.
    pub fn from_record(owner: &str, record: &ConstraintRecord) -> RigResult<Self> {
        let kind = match record.constraint_type {
            ConstraintType::BepuikControl => ConstraintKind::Control {
                pulled_point: DVec3::from_array(record.vector("pulled_point")?),
                position_rigidity: record.float("bepuik_rigidity")?,
                orientation_rigidity: record.float("orientation_rigidity")?,
                use_hard_rigidity: record.bool("use_hard_rigidity")?,
            },
            ConstraintType::BepuikBallSocketJoint => ConstraintKind::BallSocketJoint {
                anchor: record.point("anchor")?,
            },
            ConstraintType::BepuikTwistJoint => ConstraintKind::TwistJoint {
                axis_a: record.axis("axis_a")?,
                axis_b: record.axis("axis_b")?,
            },
            ConstraintType::BepuikTwistLimit => ConstraintKind::TwistLimit {
                axis_a: record.axis("axis_a")?,
                axis_b: record.axis("axis_b")?,
                measurement_axis_a: record.axis("measurement_axis_a")?,
                measurement_axis_b: record.axis("measurement_axis_b")?,
                max_twist: record.float("max_twist")?.to_degrees(),
            },
            ConstraintType::BepuikSwingLimit => ConstraintKind::SwingLimit {
                axis_a: record.axis("axis_a")?,
                axis_b: record.axis("axis_b")?,
                max_swing: record.float("max_swing")?.to_degrees(),
            },
            ConstraintType::BepuikRevoluteJoint => ConstraintKind::RevoluteJoint {
                free_axis: record.axis("free_axis")?,
            },
            ConstraintType::DampedTrack | ConstraintType::CopyRotation => {
                let Some(kind) = GenericKind::from_type(record.constraint_type) else {
                    return Err(RigError::malformed(&record.name, "not a generic constraint type"));
                };
                let mut generic = GenericConstraint::new(kind);
                for (attr, value) in &record.params {
                    let attr_value = match value {
                        ParamValue::Bool(v) => Some(AttrValue::Bool(*v)),
                        ParamValue::Float(v) => Some(AttrValue::Float(*v)),
                        ParamValue::Text(v) => Some(AttrValue::Text(v.clone())),
                        _ => None,
                    };
                    match attr_value {
                        Some(v) if kind.attribute_type(attr) == Some(v.attr_type()) => {
                            generic.attributes.insert(attr.clone(), v);
                        }
                        _ => {
                            return Err(RigError::UnrecognizedConstraintAttribute {
                                bone: owner.to_string(),
                                constraint: record.name.clone(),
                                attribute: attr.clone(),
                                value: format!("{:?}", value),
                            });
                        }
                    }
                }
                ConstraintKind::Generic(generic)
            }
        };

        Ok(Self::new(record.name.clone(), record.target.clone(), kind))
    }
}

// =============================================================================
// Host records
// =============================================================================

/// A single host constraint parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Float(f64),
    Bool(bool),
    Text(String),
    Vector([f64; 3]),
    Axis(BoneAxis),
    Point(BonePoint),
}

impl From<AttrValue> for ParamValue {
    fn from(value: AttrValue) -> Self {
        match value {
            AttrValue::Bool(v) => ParamValue::Bool(v),
            AttrValue::Float(v) => ParamValue::Float(v),
            AttrValue::Text(v) => ParamValue::Text(v),
        }
    }
}

/// A constraint as stored on a host bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub target: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl ConstraintRecord {
    fn param(&self, key: &str) -> RigResult<&ParamValue> {
        self.params
            .get(key)
            .ok_or_else(|| RigError::malformed(&self.name, format!("missing parameter '{}'", key)))
    }

    fn mistyped(&self, key: &str, expected: &str) -> RigError {
        RigError::malformed(&self.name, format!("parameter '{}' is not a {}", key, expected))
    }

    pub fn float(&self, key: &str) -> RigResult<f64> {
        match self.param(key)? {
            ParamValue::Float(v) => Ok(*v),
            _ => Err(self.mistyped(key, "float")),
        }
    }

    pub fn bool(&self, key: &str) -> RigResult<bool> {
        match self.param(key)? {
            ParamValue::Bool(v) => Ok(*v),
            _ => Err(self.mistyped(key, "bool")),
        }
    }

    pub fn vector(&self, key: &str) -> RigResult<[f64; 3]> {
        match self.param(key)? {
            ParamValue::Vector(v) => Ok(*v),
            _ => Err(self.mistyped(key, "vector")),
        }
    }

    pub fn axis(&self, key: &str) -> RigResult<BoneAxis> {
        match self.param(key)? {
            ParamValue::Axis(v) => Ok(v.clone()),
            _ => Err(self.mistyped(key, "bone axis")),
        }
    }

    pub fn point(&self, key: &str) -> RigResult<BonePoint> {
        match self.param(key)? {
            ParamValue::Point(v) => Ok(v.clone()),
            _ => Err(self.mistyped(key, "bone point")),
        }
    }

    /// Overwrites a parameter.
    pub fn set(&mut self, key: &str, value: ParamValue) {
        self.params.insert(key.to_string(), value);
    }

    /// Zeroes the rigidities of a control record; other types are untouched.
    pub fn clear_control_rigidities(&mut self) {
        if self.constraint_type == ConstraintType::BepuikControl {
            self.set("bepuik_rigidity", ParamValue::Float(0.0));
            self.set("orientation_rigidity", ParamValue::Float(0.0));
            self.set("use_hard_rigidity", ParamValue::Bool(false));
        }
    }
}
