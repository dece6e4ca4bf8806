//! Outcome of a full rig build.

use serde::{Deserialize, Serialize};

/// Summary returned by [`crate::RigBuilder::rig_full_body`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigReport {
    /// Regions and widgets that were skipped, in build order.
    pub warnings: Vec<String>,
    /// Bones written to the rig armature.
    pub bone_count: usize,
    /// Constraints written to the rig armature.
    pub constraint_count: usize,
}

impl RigReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn status_message(&self) -> &'static str {
        if self.has_warnings() {
            "Rig completed with warnings"
        } else {
            "Rig completed successfully"
        }
    }
}
