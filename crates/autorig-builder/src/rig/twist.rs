//! Twist proxy chains.
//!
//! A twist proxy is a deforming copy of a bone that copies its local
//! rotation and spreads it over bbone segments; the anchor is a short,
//! non-deforming stub at the bone's head that follows the same rotation.

use autorig_meta::naming::split_suffix;
use autorig_meta::{AttrValue, ConstraintKind, GenericConstraint, GenericKind, MetaBoneCollection, RigResult};
use log::debug;

/// Fraction of the twisted bone the anchor spans.
const ANCHOR_FRACTION: f64 = 0.1;

/// Names of the bones created by one twist chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwistChain {
    pub proxy: String,
    pub anchor: String,
}

fn copy_local_rotation() -> ConstraintKind {
    ConstraintKind::Generic(
        GenericConstraint::new(GenericKind::CopyRotation)
            .with("target_space", AttrValue::Text("LOCAL".into()))
            .with("owner_space", AttrValue::Text("LOCAL".into())),
    )
}

/// Adds a proxy and an anchor for `bone`, both parented to `parent`.
///
/// `counter` is advanced once per chain and numbers the new bones
/// `<base>-twist<n>[.<side>]` and `<base>-twist<n>-anchor[.<side>]`.
pub fn add_twist_chain(
    bones: &mut MetaBoneCollection,
    counter: &mut u32,
    bone: &str,
    parent: &str,
    bbone_segments: u32,
) -> RigResult<TwistChain> {
    bones.require(parent)?;
    let align = bones.require(bone)?.align_roll;

    *counter += 1;
    let (base, suffix) = split_suffix(bone);
    let chain = TwistChain {
        proxy: format!("{}-twist{}{}", base, counter, suffix),
        anchor: format!("{}-twist{}-anchor{}", base, counter, suffix),
    };

    let proxy = bones.new_bone_by_fraction(chain.proxy.clone(), bone, 0.0, 1.0)?;
    proxy.pose.use_bepuik = false;
    proxy.use_deform = true;
    proxy.parent = Some(parent.to_string());
    proxy.bbone_segments = bbone_segments;
    proxy.bbone_in = 1.0;
    proxy.bbone_out = 1.0;
    proxy.align_roll = align;
    proxy.add_constraint(bone, copy_local_rotation());

    let anchor = bones.new_bone_by_fraction(chain.anchor.clone(), bone, 0.0, ANCHOR_FRACTION)?;
    anchor.pose.use_bepuik = false;
    anchor.use_deform = false;
    anchor.parent = Some(parent.to_string());
    anchor.align_roll = align;
    anchor.add_constraint(bone, copy_local_rotation());

    debug!("Added twist chain {} for {}", chain.proxy, bone);
    Ok(chain)
}
