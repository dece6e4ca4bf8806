//! AutoRig Meta-Bone Library
//!
//! This crate provides the host-independent data model behind procedural rig
//! generation: oriented bone segments, the constraints authored between them,
//! uniquely keyed bone collections and the adapter traits used to read and
//! write a host armature.
//!
//! # Overview
//!
//! - A [`MetaBone`] is a head/tail/align-vector segment plus pose flags and an
//!   ordered list of [`MetaConstraint`]s.
//! - A [`MetaBoneCollection`] owns bones by name, merges labeled
//!   sub-collections ([`BakeData`]) and synchronizes with a host through
//!   [`host::ArmatureSource`] and [`host::PoseSink`].
//! - [`layers`] classifies finished bones into visibility layers.
//!
//! # Example
//!
//! ```
//! use autorig_meta::{BakeData, MetaBoneCollection};
//! use autorig_meta::math::mirror_x;
//! use glam::DMat4;
//!
//! let chain = MetaBoneCollection::from_angle_length_pairs("finger1", &[(0.0, 0.04), (-0.15, 0.03)]);
//! let hands = MetaBoneCollection::from_bakedata(&[
//!     BakeData::new(&chain, DMat4::IDENTITY, Some('L')),
//!     BakeData::new(&chain, mirror_x(), Some('R')),
//! ])
//! .unwrap();
//!
//! assert_eq!(hands.len(), 4);
//! assert_eq!(hands.get("finger1-2.R").unwrap().parent.as_deref(), Some("finger1-1.R"));
//! ```
//!
//! # Modules
//!
//! - [`error`]: Error type and stable codes
//! - [`math`]: Frame derivation and small geometric helpers
//! - [`metabone`]: The bone entity and its pose settings
//! - [`constraint`]: Constraint kinds and host record translation
//! - [`collection`]: Bone collections, baking and host synchronization
//! - [`naming`]: Side suffix conventions
//! - [`layers`]: Layer slots and classification
//! - [`widget`]: Display widget descriptors
//! - [`host`]: Host adapter traits and the in-memory host

pub mod collection;
pub mod constraint;
pub mod error;
pub mod host;
pub mod layers;
pub mod math;
pub mod metabone;
pub mod naming;
pub mod widget;

// Re-export commonly used types at the crate root
pub use collection::{BakeData, MetaBoneCollection, PushStats};
pub use constraint::{
    AttrValue, Axis, BoneAxis, BonePoint, ConstraintKind, ConstraintRecord, ConstraintType, GenericConstraint,
    GenericKind, MetaConstraint, ParamValue,
};
pub use error::{RigError, RigResult};
pub use host::{
    ArmatureFlags, ArmatureSource, AssetHandle, AssetLookup, BoneSink, ConstraintEditor, HostArmature, HostMode,
    MemoryArmature, MemoryAssets, PoseSink,
};
pub use layers::{classify_bone, ArmatureLayer, LayerSet};
pub use metabone::{LockFlags, MetaBone, PoseSettings, RotationMode};
pub use widget::WidgetShape;
