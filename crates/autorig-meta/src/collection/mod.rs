//! Uniquely keyed meta-bone containers.
//!
//! A [`MetaBoneCollection`] owns its bones in insertion order and indexes them
//! by name. Parents are stored as names, so merging and renaming only rewrite
//! strings.

use std::collections::{HashMap, HashSet};

use glam::{DMat4, DVec3};
use log::debug;

use crate::constraint::{ConstraintType, MetaConstraint};
use crate::error::{RigError, RigResult};
use crate::host::{ArmatureSource, ConstraintOutcome, HostMode, PoseSink};
use crate::math::POINT_EPSILON;
use crate::metabone::MetaBone;
use crate::naming::suffixed;

/// One labeled input to [`MetaBoneCollection::from_bakedata`].
#[derive(Debug, Clone, Copy)]
pub struct BakeData<'a> {
    pub bones: &'a MetaBoneCollection,
    pub transform: DMat4,
    /// Side letter appended to every name, e.g. `L` gives `hand.L`.
    pub suffix: Option<char>,
}

impl<'a> BakeData<'a> {
    pub fn new(bones: &'a MetaBoneCollection, transform: DMat4, suffix: Option<char>) -> Self {
        Self {
            bones,
            transform,
            suffix,
        }
    }
}

/// Outcome counts of [`MetaBoneCollection::push`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushStats {
    pub bones_created: usize,
    pub constraints_added: usize,
    pub constraints_skipped: usize,
}

/// A named set of meta-bones.
#[derive(Debug, Clone, Default)]
pub struct MetaBoneCollection {
    bones: Vec<MetaBone>,
    index: HashMap<String, usize>,
}

impl MetaBoneCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&MetaBone> {
        self.index.get(name).map(|&i| &self.bones[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut MetaBone> {
        self.index.get(name).map(|&i| &mut self.bones[i])
    }

    /// Like [`get`](Self::get) but reports a missing bone as an error.
    pub fn require(&self, name: &str) -> RigResult<&MetaBone> {
        self.get(name).ok_or_else(|| RigError::missing_bone(name))
    }

    pub fn require_mut(&mut self, name: &str) -> RigResult<&mut MetaBone> {
        self.get_mut(name).ok_or_else(|| RigError::missing_bone(name))
    }

    /// Bones in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &MetaBone> {
        self.bones.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MetaBone> {
        self.bones.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bones.iter().map(|b| b.name.as_str())
    }

    // =========================================================================
    // Insertion and removal
    // =========================================================================

    /// Adds a bone under its own name.
    ///
    /// Fails with [`RigError::DuplicateBone`] when the name is taken, leaving
    /// the collection unchanged.
    pub fn insert(&mut self, bone: MetaBone) -> RigResult<&mut MetaBone> {
        if self.contains(&bone.name) {
            return Err(RigError::DuplicateBone { name: bone.name });
        }
        Ok(self.push_unique(bone))
    }

    fn push_unique(&mut self, bone: MetaBone) -> &mut MetaBone {
        let i = self.bones.len();
        self.index.insert(bone.name.clone(), i);
        self.bones.push(bone);
        &mut self.bones[i]
    }

    /// Adds a default bone.
    pub fn new_bone(&mut self, name: impl Into<String>) -> RigResult<&mut MetaBone> {
        self.insert(MetaBone::new(name))
    }

    /// Adds a default bone moved by `transform`.
    pub fn new_bone_transformed(&mut self, name: impl Into<String>, transform: &DMat4) -> RigResult<&mut MetaBone> {
        self.insert(MetaBone::transformed_default(name, transform))
    }

    /// Adds a bone covering the `start..end` head-to-tail range of `source`,
    /// sharing its align vector.
    pub fn new_bone_by_fraction(
        &mut self,
        name: impl Into<String>,
        source: &str,
        start: f64,
        end: f64,
    ) -> RigResult<&mut MetaBone> {
        let source = self.require(source)?;
        let mut bone = MetaBone::new(name);
        bone.head = source.point_at(start);
        bone.tail = source.point_at(end);
        bone.align_roll = source.align_roll;
        self.insert(bone)
    }

    /// Removes a bone; children of the removed bone lose their parent.
    pub fn remove(&mut self, name: &str) -> Option<MetaBone> {
        let i = self.index.remove(name)?;
        let bone = self.bones.remove(i);
        self.reindex();
        for other in &mut self.bones {
            if other.parent.as_deref() == Some(name) {
                other.parent = None;
                other.use_connect = false;
            }
        }
        Some(bone)
    }

    fn reindex(&mut self) {
        self.index = self
            .bones
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();
    }

    /// Renames a bone and rewrites every parent link and constraint reference.
    pub fn rename(&mut self, old: &str, new: &str) -> RigResult<()> {
        if old == new {
            return Ok(());
        }
        if self.contains(new) {
            return Err(RigError::DuplicateBone { name: new.to_string() });
        }
        let i = self.index.remove(old).ok_or_else(|| RigError::missing_bone(old))?;
        self.bones[i].name = new.to_string();
        self.index.insert(new.to_string(), i);

        for bone in &mut self.bones {
            if bone.parent.as_deref() == Some(old) {
                bone.parent = Some(new.to_string());
            }
            for constraint in &mut bone.constraints {
                constraint.rename_bone(old, new);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Bone names ordered so every parent precedes its children.
    ///
    /// Insertion order is kept among bones that are ready at the same time.
    /// A parent outside the collection, or a parent cycle, is reported as
    /// [`RigError::DanglingParent`].
    pub fn hierarchy_order(&self) -> RigResult<Vec<&str>> {
        let mut placed: HashSet<&str> = HashSet::with_capacity(self.len());
        let mut order = Vec::with_capacity(self.len());
        let mut pending: Vec<&MetaBone> = self.bones.iter().collect();

        while !pending.is_empty() {
            let before = pending.len();
            pending.retain(|bone| {
                let bone = *bone;
                let ready = match bone.parent.as_deref() {
                    None => true,
                    Some(parent) => placed.contains(parent),
                };
                if ready {
                    placed.insert(bone.name.as_str());
                    order.push(bone.name.as_str());
                }
                !ready
            });
            if pending.len() == before {
                let bone = pending[0];
                return Err(RigError::DanglingParent {
                    bone: bone.name.clone(),
                    parent: bone.parent.clone().unwrap_or_default(),
                });
            }
        }
        Ok(order)
    }

    /// Sets `use_connect` on every parented bone whose head meets its
    /// parent's tail, and clears it everywhere else.
    pub fn assign_connectivity(&mut self) {
        let tails: HashMap<String, DVec3> = self.bones.iter().map(|b| (b.name.clone(), b.tail)).collect();
        for bone in &mut self.bones {
            bone.use_connect = bone
                .parent
                .as_ref()
                .and_then(|p| tails.get(p))
                .is_some_and(|tail| (*tail - bone.head).length() < POINT_EPSILON);
        }
    }

    /// Names of bones that some control constraint targets.
    pub fn control_targets(&self) -> HashSet<&str> {
        self.bones
            .iter()
            .flat_map(|b| b.constraints.iter())
            .filter(|c| c.constraint_type() == ConstraintType::BepuikControl)
            .map(|c| c.target.as_str())
            .collect()
    }

    /// Total number of authored constraints.
    pub fn constraint_count(&self) -> usize {
        self.bones.iter().map(|b| b.constraints.len()).sum()
    }

    // =========================================================================
    // Composition
    // =========================================================================

    /// Merges labeled collections, suffixing every name, transforming every
    /// bone and remapping parents to the suffixed names.
    pub fn from_bakedata(bakes: &[BakeData<'_>]) -> RigResult<Self> {
        let mut merged = Self::new();
        for bake in bakes {
            for source in bake.bones.iter() {
                let name = suffixed(&source.name, bake.suffix);
                let mut bone = MetaBone::from_template(name, source, Some(&bake.transform));
                bone.parent = source.parent.as_deref().map(|p| suffixed(p, bake.suffix));
                merged.insert(bone)?;
            }
        }
        Ok(merged)
    }

    /// Builds a chain `name-1`, `name-2`, ... by accumulating `(transform, length)` steps.
    ///
    /// Each step applies its transform to the running frame, places a bone of
    /// `length` along the frame's Y axis and advances the frame to the bone's
    /// tail. Bones are parented to their predecessor and connected when the
    /// predecessor's tail meets their head.
    pub fn from_transform_length_pairs(name: &str, pairs: &[(DMat4, f64)]) -> Self {
        let mut chain = Self::new();
        let mut t = DMat4::IDENTITY;
        let mut prev: Option<(String, DVec3)> = None;

        for (i, (transform, length)) in pairs.iter().enumerate() {
            t *= *transform;
            let mut bone = MetaBone::new(format!("{}-{}", name, i + 1));
            bone.head = t.w_axis.truncate();
            bone.align_roll = t.z_axis.truncate();
            t *= DMat4::from_translation(DVec3::new(0.0, *length, 0.0));
            bone.tail = t.w_axis.truncate();

            if let Some((prev_name, prev_tail)) = &prev {
                bone.parent = Some(prev_name.clone());
                bone.use_connect = (*prev_tail - bone.head).length() < POINT_EPSILON;
            }
            prev = Some((bone.name.clone(), bone.tail));
            chain.push_unique(bone);
        }
        chain
    }

    /// Chain of X-axis curls: each `(angle, length)` rotates by `angle`
    /// radians about the local X axis before placing the next segment.
    pub fn from_angle_length_pairs(name: &str, pairs: &[(f64, f64)]) -> Self {
        let steps: Vec<(DMat4, f64)> = pairs
            .iter()
            .map(|&(angle, length)| (DMat4::from_rotation_x(angle), length))
            .collect();
        Self::from_transform_length_pairs(name, &steps)
    }

    // =========================================================================
    // Host synchronization
    // =========================================================================

    /// Reads every bone of a host armature.
    ///
    /// The host must be in pose mode.
    pub fn pull<S: ArmatureSource + ?Sized>(source: &S) -> RigResult<Self> {
        require_mode(source.mode(), HostMode::Pose)?;

        let mut bones = Self::new();
        for name in source.bone_names() {
            let host = source.read_bone(&name).ok_or_else(|| RigError::missing_bone(&name))?;
            let mut bone = MetaBone::from_host(&name, &host.edit, &host.pose);
            bone.parent = host.parent.clone();
            bone.layers = host.layers;
            for record in &host.constraints {
                bone.constraints.push(MetaConstraint::from_record(&name, record)?);
            }
            bones.insert(bone)?;
        }
        debug!("pulled {} bones from '{}'", bones.len(), source.name());
        Ok(bones)
    }

    /// Writes the collection into a host armature.
    ///
    /// The host must be in edit mode and is left in pose mode. Bones missing
    /// on the host are created parents first; pose settings and layers are
    /// written for created bones only. Constraints are then applied to every
    /// valid bone, skipping names already present on the host bone.
    pub fn push<S: PoseSink + ?Sized>(&self, sink: &mut S) -> RigResult<PushStats> {
        require_mode(sink.mode(), HostMode::Edit)?;

        let mut stats = PushStats::default();

        // Edit data is derived for every new bone before the host is touched.
        let mut pending = Vec::new();
        for name in self.hierarchy_order()? {
            let bone = self.require(name)?;
            if !bone.is_valid() || sink.exists(name) {
                continue;
            }
            pending.push((bone, bone.edit_data()?));
        }

        let mut created = Vec::new();
        for (bone, data) in pending {
            let handle = sink.create_bone(&bone.name)?;
            sink.set_edit_data(handle, &data);
            let parent = bone
                .parent
                .as_deref()
                .filter(|p| self.get(p).is_some_and(MetaBone::is_valid))
                .and_then(|p| sink.handle(p));
            sink.set_parent(handle, parent);
            created.push((handle, bone));
        }
        stats.bones_created = created.len();

        sink.set_mode(HostMode::Pose);

        for (handle, bone) in &created {
            sink.set_pose(*handle, &bone.pose);
            sink.set_layers(*handle, bone.layers);
        }

        for bone in self.bones.iter().filter(|b| b.is_valid()) {
            let handle = sink.handle(&bone.name).ok_or_else(|| RigError::missing_bone(&bone.name))?;
            for constraint in &bone.constraints {
                match sink.add_constraint(handle, constraint.to_record(&bone.name)?) {
                    ConstraintOutcome::Added => stats.constraints_added += 1,
                    ConstraintOutcome::AlreadyExists => stats.constraints_skipped += 1,
                    ConstraintOutcome::UnknownBone => return Err(RigError::missing_bone(&bone.name)),
                }
            }
        }

        debug!(
            "pushed to '{}': {} bones created, {} constraints added, {} skipped",
            sink.name(),
            stats.bones_created,
            stats.constraints_added,
            stats.constraints_skipped
        );
        Ok(stats)
    }
}

fn require_mode(actual: HostMode, expected: HostMode) -> RigResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(RigError::WrongHostMode { expected, actual })
    }
}

impl<'a> IntoIterator for &'a MetaBoneCollection {
    type Item = &'a MetaBone;
    type IntoIter = std::slice::Iter<'a, MetaBone>;

    fn into_iter(self) -> Self::IntoIter {
        self.bones.iter()
    }
}

#[cfg(test)]
mod tests;
