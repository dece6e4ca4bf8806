//! Layer assignment for a finished rig.

use std::collections::HashSet;

use autorig_meta::{classify_bone, MetaBoneCollection};

/// Classifies every bone, marking the ones some control targets.
pub fn organize_layers(bones: &mut MetaBoneCollection) {
    let targets: HashSet<String> = bones.control_targets().into_iter().map(str::to_string).collect();
    for bone in bones.iter_mut() {
        bone.layers = classify_bone(bone, None, targets.contains(&bone.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorig_meta::{ArmatureLayer, ConstraintKind};
    use glam::DVec3;

    #[test]
    fn test_targets_and_regions() {
        let mut bones = MetaBoneCollection::new();
        bones.new_bone("foot.L").unwrap().tail = DVec3::NEG_Y;
        bones.new_bone("foot-target.L").unwrap();
        bones
            .get_mut("foot.L")
            .unwrap()
            .add_named_constraint("foot-target.L", "foot-target.L", ConstraintKind::control(0.0, 2.0, 0.1));
        bones.new_bone("MCH-legcone.L").unwrap().pose.lock_all();

        organize_layers(&mut bones);

        let foot = bones.get("foot.L").unwrap().layers;
        assert!(foot.contains(ArmatureLayer::LegL));
        assert!(!foot.contains(ArmatureLayer::Target));

        let target = bones.get("foot-target.L").unwrap().layers;
        assert!(target.contains(ArmatureLayer::Target));
        assert!(target.contains(ArmatureLayer::LegL));

        let cone = bones.get("MCH-legcone.L").unwrap().layers;
        assert!(cone.contains(ArmatureLayer::Mechanical));
        assert!(!cone.contains(ArmatureLayer::Animatable));
    }
}
