//! Visibility layer classification.
//!
//! Every rig bone lands on a small set of layers: informational layers for the
//! deform/solver/target flags, plus either [`ArmatureLayer::Mechanical`] or at
//! most one body-region layer chosen from its name.

use serde::{Deserialize, Serialize};

use crate::metabone::MetaBone;
use crate::naming::{basename, suffix_letter};

/// Layer slots used by generated rigs.
///
/// The discriminant is the host layer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmatureLayer {
    Animatable = 0,
    Target = 1,
    Deformer = 2,
    Mechanical = 3,
    BepuikBone = 4,
    ArmL = 8,
    HandL = 9,
    LegL = 10,
    FootL = 11,
    RibL = 12,
    Head = 16,
    Spine = 17,
    Root = 18,
    ArmR = 24,
    HandR = 25,
    LegR = 26,
    FootR = 27,
    RibR = 28,
}

impl ArmatureLayer {
    /// Every layer slot, in index order.
    pub const ALL: [ArmatureLayer; 18] = [
        ArmatureLayer::Animatable,
        ArmatureLayer::Target,
        ArmatureLayer::Deformer,
        ArmatureLayer::Mechanical,
        ArmatureLayer::BepuikBone,
        ArmatureLayer::ArmL,
        ArmatureLayer::HandL,
        ArmatureLayer::LegL,
        ArmatureLayer::FootL,
        ArmatureLayer::RibL,
        ArmatureLayer::Head,
        ArmatureLayer::Spine,
        ArmatureLayer::Root,
        ArmatureLayer::ArmR,
        ArmatureLayer::HandR,
        ArmatureLayer::LegR,
        ArmatureLayer::FootR,
        ArmatureLayer::RibR,
    ];

    /// Layers visible when a freshly generated rig is first shown.
    pub const STARTING: [ArmatureLayer; 10] = [
        ArmatureLayer::ArmL,
        ArmatureLayer::ArmR,
        ArmatureLayer::LegL,
        ArmatureLayer::LegR,
        ArmatureLayer::Spine,
        ArmatureLayer::Head,
        ArmatureLayer::HandL,
        ArmatureLayer::HandR,
        ArmatureLayer::FootL,
        ArmatureLayer::FootR,
    ];

    /// Host layer index.
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            ArmatureLayer::Animatable => "All",
            ArmatureLayer::Target => "Targets",
            ArmatureLayer::Deformer => "Deformers",
            ArmatureLayer::Mechanical => "Mechanical",
            ArmatureLayer::BepuikBone => "BEPUik Bones",
            ArmatureLayer::ArmL => "Arm.L",
            ArmatureLayer::HandL => "Fingers.L",
            ArmatureLayer::LegL => "Leg.L",
            ArmatureLayer::FootL => "Toes.L",
            ArmatureLayer::RibL => "Ribs.L",
            ArmatureLayer::Head => "Head",
            ArmatureLayer::Spine => "Spine",
            ArmatureLayer::Root => "Root",
            ArmatureLayer::ArmR => "Arm.R",
            ArmatureLayer::HandR => "Fingers.R",
            ArmatureLayer::LegR => "Leg.R",
            ArmatureLayer::FootR => "Toes.R",
            ArmatureLayer::RibR => "Ribs.R",
        }
    }
}

/// A set of layers stored as a 32-bit host layer mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerSet(u32);

impl LayerSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every one of the 32 host slots.
    pub const fn all() -> Self {
        Self(u32::MAX)
    }

    /// Builds a set from layers.
    pub fn from_layers(layers: &[ArmatureLayer]) -> Self {
        layers.iter().fold(Self::empty(), |mut set, layer| {
            set.insert(*layer);
            set
        })
    }

    pub fn insert(&mut self, layer: ArmatureLayer) {
        self.0 |= 1 << layer.index();
    }

    pub fn contains(&self, layer: ArmatureLayer) -> bool {
        self.0 & (1 << layer.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Raw host mask.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Iterates the contained layers in index order.
    pub fn iter(&self) -> impl Iterator<Item = ArmatureLayer> + '_ {
        ArmatureLayer::ALL.into_iter().filter(|l| self.contains(*l))
    }

    /// Returns the host's 32 visibility booleans.
    pub fn to_mask(&self) -> [bool; 32] {
        std::array::from_fn(|i| self.0 & (1 << i) != 0)
    }
}

// =============================================================================
// Substring classification
// =============================================================================

/// A named group of name fragments that identifies a body region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSubstrings {
    Hand,
    Arm,
    Leg,
    Foot,
    Torso,
    Rib,
    Head,
    Root,
    Target,
}

impl RegionSubstrings {
    /// Region groups in match priority order.
    pub const PRIORITY: [RegionSubstrings; 9] = [
        RegionSubstrings::Hand,
        RegionSubstrings::Arm,
        RegionSubstrings::Leg,
        RegionSubstrings::Foot,
        RegionSubstrings::Torso,
        RegionSubstrings::Rib,
        RegionSubstrings::Head,
        RegionSubstrings::Root,
        RegionSubstrings::Target,
    ];

    pub fn substrings(self) -> &'static [&'static str] {
        match self {
            RegionSubstrings::Hand => &["finger", "thumb", "palm"],
            RegionSubstrings::Arm => &["shoulder", "clavicle", "loarm", "uparm", "hand", "elbow"],
            RegionSubstrings::Leg => &["leg", "foot", "knee", "heel", "ball"],
            RegionSubstrings::Foot => &["toe"],
            RegionSubstrings::Torso => &["spine", "hip", "chest", "torso"],
            RegionSubstrings::Rib => &["rib"],
            RegionSubstrings::Head => &["head", "neck", "eye", "jaw"],
            RegionSubstrings::Root => &["root"],
            RegionSubstrings::Target => &["target"],
        }
    }

    /// Returns true when `hint` contains any fragment of this group.
    pub fn matches(self, hint: &str) -> bool {
        self.substrings().iter().any(|s| hint.contains(s))
    }

    /// Body-region layer for this group on the given side, if one is defined.
    pub fn layer_for_side(self, side: Option<char>) -> Option<ArmatureLayer> {
        use ArmatureLayer as L;
        match (self, side) {
            (RegionSubstrings::Arm, Some('L')) => Some(L::ArmL),
            (RegionSubstrings::Hand, Some('L')) => Some(L::HandL),
            (RegionSubstrings::Leg, Some('L')) => Some(L::LegL),
            (RegionSubstrings::Foot, Some('L')) => Some(L::FootL),
            (RegionSubstrings::Rib, Some('L')) => Some(L::RibL),
            (RegionSubstrings::Arm, Some('R')) => Some(L::ArmR),
            (RegionSubstrings::Hand, Some('R')) => Some(L::HandR),
            (RegionSubstrings::Leg, Some('R')) => Some(L::LegR),
            (RegionSubstrings::Foot, Some('R')) => Some(L::FootR),
            (RegionSubstrings::Rib, Some('R')) => Some(L::RibR),
            (RegionSubstrings::Torso, None | Some('L') | Some('R')) => Some(L::Spine),
            (RegionSubstrings::Head, None | Some('L') | Some('R')) => Some(L::Head),
            (RegionSubstrings::Root, None) => Some(L::Root),
            (RegionSubstrings::Target, Some('L') | Some('R')) => Some(L::Target),
            _ => None,
        }
    }
}

/// Picks the body-region layer for a name hint: the first group in priority
/// order that both matches the hint and defines a layer for the side wins.
pub fn region_layer(hint: &str, side: Option<char>) -> Option<ArmatureLayer> {
    RegionSubstrings::PRIORITY
        .into_iter()
        .filter(|group| group.matches(hint))
        .find_map(|group| group.layer_for_side(side))
}

/// Classifies one bone.
///
/// `hint` overrides the bone's base name for region matching; `is_target`
/// marks bones that some control constraint points at.
pub fn classify_bone(bone: &MetaBone, hint: Option<&str>, is_target: bool) -> LayerSet {
    let mut layers = LayerSet::empty();

    if bone.use_deform {
        layers.insert(ArmatureLayer::Deformer);
    }
    if bone.pose.use_bepuik {
        layers.insert(ArmatureLayer::BepuikBone);
    }
    if is_target {
        layers.insert(ArmatureLayer::Target);
    }

    if bone.pose.is_fully_locked() {
        layers.insert(ArmatureLayer::Mechanical);
        return layers;
    }
    layers.insert(ArmatureLayer::Animatable);

    let hint = hint.unwrap_or_else(|| basename(&bone.name));
    if let Some(layer) = region_layer(hint, suffix_letter(&bone.name)) {
        layers.insert(layer);
    }
    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn bone(name: &str) -> MetaBone {
        let mut b = MetaBone::new(name);
        b.tail = DVec3::Y;
        b
    }

    #[test]
    fn test_layer_set_bits() {
        let mut set = LayerSet::empty();
        assert!(set.is_empty());
        set.insert(ArmatureLayer::LegR);
        set.insert(ArmatureLayer::Animatable);
        assert!(set.contains(ArmatureLayer::LegR));
        assert!(!set.contains(ArmatureLayer::LegL));
        assert_eq!(set.bits(), (1 << 26) | 1);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![ArmatureLayer::Animatable, ArmatureLayer::LegR]
        );
        assert!(set.to_mask()[26]);
    }

    #[test]
    fn test_foot_lands_on_left_leg() {
        let layers = classify_bone(&bone("foot.L"), None, false);
        assert!(layers.contains(ArmatureLayer::LegL));
        assert!(layers.contains(ArmatureLayer::Animatable));
        assert!(!layers.contains(ArmatureLayer::Mechanical));
    }

    #[test]
    fn test_priority_hand_before_arm() {
        assert_eq!(region_layer("finger1-2", Some('R')), Some(ArmatureLayer::HandR));
        assert_eq!(region_layer("hand-target", Some('L')), Some(ArmatureLayer::ArmL));
    }

    #[test]
    fn test_unmapped_side_falls_through() {
        // "root" maps only without a side; "eye_target" is a head bone.
        assert_eq!(region_layer("root", Some('L')), None);
        assert_eq!(region_layer("eye_target", None), Some(ArmatureLayer::Head));
        assert_eq!(region_layer("hips-target", None), Some(ArmatureLayer::Spine));
    }

    #[test]
    fn test_fully_locked_bone_is_mechanical_only() {
        let mut b = bone("MCH-legcone.L");
        b.pose.lock_all();
        b.use_deform = true;
        let layers = classify_bone(&b, None, false);
        assert!(layers.contains(ArmatureLayer::Mechanical));
        assert!(layers.contains(ArmatureLayer::Deformer));
        assert!(!layers.contains(ArmatureLayer::Animatable));
        assert!(!layers.contains(ArmatureLayer::LegL));
    }

    #[test]
    fn test_hint_overrides_name() {
        let layers = classify_bone(&bone("custom.R"), Some("toe1-1"), true);
        assert!(layers.contains(ArmatureLayer::FootR));
        assert!(layers.contains(ArmatureLayer::Target));
    }
}
