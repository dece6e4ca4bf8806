//! CLI command implementations

pub mod defaults;
pub mod layers;
pub mod meta;
pub mod rig;

use anyhow::{Context, Result};
use autorig_builder::{create_meta_armature, AutoRigConfig, RigBuilder, RigReport};
use autorig_meta::{HostArmature, HostMode, MemoryArmature, MemoryAssets};

/// Name given to the in-memory meta-armature.
pub const META_ARMATURE_NAME: &str = "MetaArmature";

/// Name given to the in-memory rig.
pub const RIG_NAME: &str = "Rig";

/// Builds the meta-armature into a fresh in-memory host, left in pose mode.
pub(crate) fn build_meta(config: &AutoRigConfig) -> Result<MemoryArmature> {
    let mut meta = MemoryArmature::new(META_ARMATURE_NAME);
    meta.set_mode(HostMode::Edit);
    create_meta_armature(&mut meta, &config.body).context("Failed to build meta-armature")?;
    Ok(meta)
}

/// Builds the meta-armature and then the rig, both in memory.
pub(crate) fn build_rig(config: &AutoRigConfig) -> Result<(MemoryArmature, RigReport)> {
    let meta = build_meta(config)?;
    let mut rig = MemoryArmature::new(RIG_NAME);
    rig.set_mode(HostMode::Edit);
    let report = RigBuilder::new(config.rig.clone())
        .rig_full_body(&meta, &mut rig, &mut MemoryAssets::new())
        .context("Failed to build rig")?;
    Ok((rig, report))
}
