//! AutoRig CLI library.
//!
//! This crate provides the command implementations behind the `autorig`
//! binary: configuration loading and the meta-armature, rig and layer
//! commands, all run against the in-memory host.

pub mod commands;
pub mod input;
