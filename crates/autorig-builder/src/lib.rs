//! AutoRig Builder
//!
//! This crate turns body proportions into a meta-armature and a meta-armature
//! into a solver-driven humanoid rig.
//!
//! # Overview
//!
//! - [`parts`] builds each body part (arm, leg, spine, face, fingers, toes)
//!   at a canonical origin; [`assembler`] places, mirrors and merges them.
//! - [`rig::RigBuilder`] authors joints, limits, controls and targets region
//!   by region, skipping regions whose anatomy is missing.
//! - [`control`] and [`presets`] extend and pose a finished rig.
//!
//! # Example
//!
//! ```
//! use autorig_builder::{build_meta_armature, BodyParams, RigBuilder, RigConfig};
//! use autorig_meta::{ArmatureFlags, MemoryAssets};
//!
//! let meta = build_meta_armature(&BodyParams::default()).unwrap();
//! let flags = ArmatureFlags {
//!     is_meta_armature: true,
//!     use_thumb: true,
//!     use_simple_toe: true,
//!     ..ArmatureFlags::default()
//! };
//!
//! let mut builder = RigBuilder::new(RigConfig::default());
//! let (rig, warnings) = builder.build_rig(meta, flags, &mut MemoryAssets::new()).unwrap();
//!
//! assert!(warnings.is_empty());
//! assert_eq!(rig.get("hand.L").unwrap().parent.as_deref(), Some("loarm.L"));
//! ```
//!
//! # Modules
//!
//! - [`config`]: Body proportions and joint tuning
//! - [`parts`]: Per-part meta-bone builders
//! - [`assembler`]: Full-body meta-armature assembly
//! - [`rig`]: The rig constraint builder
//! - [`control`]: Control lookup and creation
//! - [`presets`]: Pose rigidity presets
//! - [`report`]: Rig build summary

pub mod assembler;
pub mod config;
pub mod control;
pub mod parts;
pub mod presets;
pub mod report;
pub mod rig;

// Re-export commonly used types at the crate root
pub use assembler::{build_meta_armature, create_meta_armature};
pub use config::{AutoRigConfig, BodyParams, RigConfig};
pub use control::{create_control, create_control_on_host, head_control, tail_control, ControlOptions};
pub use presets::{PosePreset, PresetOutcome};
pub use report::RigReport;
pub use rig::{organize_layers, RigBuilder};
