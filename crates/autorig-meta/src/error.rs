//! Error types for meta-bone assembly and host materialization.

use thiserror::Error;

use crate::host::HostMode;

/// Result type for rig operations.
pub type RigResult<T> = Result<T, RigError>;

/// Errors that can occur while assembling, materializing or reading back a rig.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RigError {
    /// A bone with this name already exists in the collection.
    #[error("Cannot add meta-bone '{name}': a bone with that name already exists")]
    DuplicateBone { name: String },

    /// A bone required by the current operation could not be found.
    #[error("Bone '{name}' could not be found")]
    MissingBone { name: String },

    /// A bone names a parent that is not part of its collection.
    #[error("Bone '{bone}' has parent '{parent}' which is not in the collection")]
    DanglingParent { bone: String, parent: String },

    /// Axis computation was attempted on a zero-length segment.
    #[error("Bone '{bone}' has the same head and tail; no axis can be derived")]
    DegenerateGeometry { bone: String },

    /// The roll alignment vector is zero or parallel to the bone in every
    /// fallback orientation.
    #[error("Bone '{bone}' has an unusable roll vector; no x axis can be derived")]
    DegenerateRoll { bone: String },

    /// The host was not in the mode the operation requires.
    #[error("Host armature must be in {expected:?} mode, but is in {actual:?} mode")]
    WrongHostMode { expected: HostMode, actual: HostMode },

    /// A rig was requested from an armature that is not a meta-armature.
    #[error("Armature '{armature}' is not a meta-armature")]
    NotMetaArmature { armature: String },

    /// A passthrough constraint carries an attribute its kind does not define.
    #[error(
        "Don't know what to do with attribute '{attribute}' = {value} \
         (bone: {bone}, constraint: {constraint})"
    )]
    UnrecognizedConstraintAttribute {
        bone: String,
        constraint: String,
        attribute: String,
        value: String,
    },

    /// A host constraint record is missing a parameter or has the wrong shape.
    #[error("Constraint '{constraint}' record is malformed: {message}")]
    MalformedConstraintRecord { constraint: String, message: String },

    /// A builder parameter is out of range.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl RigError {
    /// Creates a missing bone error.
    pub fn missing_bone(name: impl Into<String>) -> Self {
        Self::MissingBone { name: name.into() }
    }

    /// Creates a degenerate geometry error.
    pub fn degenerate(bone: impl Into<String>) -> Self {
        Self::DegenerateGeometry { bone: bone.into() }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a malformed record error.
    pub fn malformed(constraint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedConstraintRecord {
            constraint: constraint.into(),
            message: message.into(),
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            RigError::DuplicateBone { .. } => "RIG_001",
            RigError::MissingBone { .. } => "RIG_002",
            RigError::DanglingParent { .. } => "RIG_003",
            RigError::DegenerateGeometry { .. } => "RIG_004",
            RigError::WrongHostMode { .. } => "RIG_005",
            RigError::NotMetaArmature { .. } => "RIG_006",
            RigError::UnrecognizedConstraintAttribute { .. } => "RIG_007",
            RigError::MalformedConstraintRecord { .. } => "RIG_008",
            RigError::InvalidParameter { .. } => "RIG_009",
            RigError::DegenerateRoll { .. } => "RIG_010",
        }
    }

    /// Returns true for missing anatomy, which a region builder may skip with a warning.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RigError::MissingBone { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            RigError::DuplicateBone { name: "a".into() },
            RigError::missing_bone("a"),
            RigError::DanglingParent {
                bone: "a".into(),
                parent: "b".into(),
            },
            RigError::degenerate("a"),
            RigError::WrongHostMode {
                expected: HostMode::Edit,
                actual: HostMode::Object,
            },
            RigError::NotMetaArmature {
                armature: "Rig".into(),
            },
            RigError::UnrecognizedConstraintAttribute {
                bone: "a".into(),
                constraint: "c".into(),
                attribute: "x".into(),
                value: "1".into(),
            },
            RigError::malformed("c", "missing axis_a"),
            RigError::invalid_parameter("num_fingers", "must be 1..=5"),
            RigError::DegenerateRoll { bone: "a".into() },
        ];

        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_only_missing_bone_is_recoverable() {
        assert!(RigError::missing_bone("foot.L").is_recoverable());
        assert!(!RigError::degenerate("foot.L").is_recoverable());
        assert!(!RigError::DuplicateBone {
            name: "foot.L".into()
        }
        .is_recoverable());
    }

    #[test]
    fn test_attribute_error_message_has_context() {
        let err = RigError::UnrecognizedConstraintAttribute {
            bone: "eye.L".into(),
            constraint: "damped_track_1".into(),
            attribute: "pole_angle".into(),
            value: "0.5".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("eye.L"));
        assert!(msg.contains("damped_track_1"));
        assert!(msg.contains("pole_angle"));
        assert!(msg.contains("0.5"));
    }
}
