//! Rig constraint builder.
//!
//! Turns a meta-armature into an animatable rig: auxiliary root, target and
//! mechanical bones are added, joints are authored region by region, and
//! every bone is classified into visibility layers.
//!
//! Regions are built in a fixed order: the trunk once (root, eye target,
//! jaw, spine, torso pullers), then each side (eye, arm, hand, leg, foot,
//! hip). A region that finds a required bone missing is rolled back and
//! recorded as a warning; any other error aborts the build.

mod arm;
mod joints;
mod layers;
mod leg;
mod trunk;
mod twist;

use autorig_meta::naming::{digit_segment_name, suffixed};
use autorig_meta::widget::WIDGET_CUBE;
use autorig_meta::{
    ArmatureFlags, ArmatureLayer, ArmatureSource, AssetLookup, LayerSet, MetaBoneCollection, PoseSink, RigError,
    RigResult, WidgetShape,
};
use log::{debug, info, warn};

use crate::config::RigConfig;
use crate::report::RigReport;

pub use joints::{rest_angle, rest_angle_to};
pub use layers::organize_layers;
pub use twist::TwistChain;

/// Name of the bone every free-floating target hangs off.
pub const ROOT_BONE: &str = "root";

/// Reference bone emitted by the leg builder and consumed by the foot region.
const FOOT_WIDTH_BONE: &str = "foot-width";

/// Builds rigs from meta-armatures.
///
/// The builder owns the twist-chain counter, so bone names created by
/// [`RigBuilder::add_twist_chain`] stay unique across every rig it builds.
#[derive(Debug, Clone, Default)]
pub struct RigBuilder {
    config: RigConfig,
    twist_counter: u32,
}

impl RigBuilder {
    pub fn new(config: RigConfig) -> Self {
        Self {
            config,
            twist_counter: 0,
        }
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    /// Number of twist chains created so far.
    pub fn twist_counter(&self) -> u32 {
        self.twist_counter
    }

    /// Reads the meta-armature from `meta`, builds the rig and writes it into `rig`.
    ///
    /// `meta` must be a meta-armature in pose mode; `rig` must be in edit mode
    /// and is left in pose mode, flagged as an auto-rig with the starting
    /// layers visible.
    pub fn rig_full_body<S, D>(&mut self, meta: &S, rig: &mut D, assets: &mut dyn AssetLookup) -> RigResult<RigReport>
    where
        S: ArmatureSource + ?Sized,
        D: PoseSink + ?Sized,
    {
        let flags = meta.flags();
        if !flags.is_meta_armature {
            return Err(RigError::NotMetaArmature {
                armature: meta.name().to_string(),
            });
        }

        let bones = MetaBoneCollection::pull(meta)?;
        let (bones, warnings) = self.build_rig(bones, flags, assets)?;
        let stats = bones.push(rig)?;

        rig.set_flags(ArmatureFlags {
            is_meta_armature: false,
            is_auto_rig: true,
            use_thumb: flags.use_thumb,
            use_simple_toe: flags.use_simple_toe,
        });
        rig.set_visible_layers(LayerSet::from_layers(&ArmatureLayer::STARTING));

        let report = RigReport {
            warnings,
            bone_count: stats.bones_created,
            constraint_count: stats.constraints_added,
        };
        info!(
            "{} for '{}': {} bones, {} constraints",
            report.status_message(),
            rig.name(),
            report.bone_count,
            report.constraint_count
        );
        Ok(report)
    }

    /// Builds the rig collection from meta-armature bones without touching a host.
    ///
    /// Returns the finished bones and the accumulated region warnings.
    pub fn build_rig(
        &mut self,
        meta: MetaBoneCollection,
        flags: ArmatureFlags,
        assets: &mut dyn AssetLookup,
    ) -> RigResult<(MetaBoneCollection, Vec<String>)> {
        let mut session = RigSession {
            bones: meta,
            config: &self.config,
            flags,
            assets,
            warnings: Vec::new(),
            twist_counter: &mut self.twist_counter,
        };

        session.rig_trunk()?;
        for side in ['L', 'R'] {
            session.rig_side(side)?;
        }
        session.remove_references();

        let RigSession {
            mut bones, warnings, ..
        } = session;
        organize_layers(&mut bones);
        debug!(
            "rig built: {} bones, {} constraints, {} warnings",
            bones.len(),
            bones.constraint_count(),
            warnings.len()
        );
        Ok((bones, warnings))
    }

    /// Adds a twist proxy and anchor for `bone`, parented to `parent`.
    pub fn add_twist_chain(
        &mut self,
        bones: &mut MetaBoneCollection,
        bone: &str,
        parent: &str,
        bbone_segments: u32,
    ) -> RigResult<TwistChain> {
        twist::add_twist_chain(bones, &mut self.twist_counter, bone, parent, bbone_segments)
    }
}

// =============================================================================
// Session
// =============================================================================

/// State of one rig build.
struct RigSession<'a> {
    bones: MetaBoneCollection,
    config: &'a RigConfig,
    flags: ArmatureFlags,
    assets: &'a mut dyn AssetLookup,
    warnings: Vec<String>,
    twist_counter: &'a mut u32,
}

impl RigSession<'_> {
    fn rig_trunk(&mut self) -> RigResult<()> {
        self.add_root()?;
        self.region("eye target", Self::add_eye_target)?;
        self.region("jaw", Self::rig_jaw)?;
        self.region("spine", Self::rig_spine)?;
        self.region("torso pullers", Self::add_torso_pullers)
    }

    fn rig_side(&mut self, side: char) -> RigResult<()> {
        self.region(&format!("eye.{}", side), |s| s.rig_eye(side))?;
        self.region(&format!("arm.{}", side), |s| s.rig_arm(side))?;
        self.region(&format!("hand.{}", side), |s| s.rig_hand(side))?;
        self.region(&format!("leg.{}", side), |s| s.rig_leg(side))?;
        self.region(&format!("foot.{}", side), |s| s.rig_foot(side))?;
        self.region(&format!("hip.{}", side), |s| s.rig_hips_to_upleg(side))
    }

    /// Runs one region, rolling its changes back when anatomy is missing.
    fn region<F>(&mut self, label: &str, build: F) -> RigResult<()>
    where
        F: FnOnce(&mut Self) -> RigResult<()>,
    {
        let snapshot = self.bones.clone();
        match build(self) {
            Ok(()) => Ok(()),
            Err(err) if err.is_recoverable() => {
                self.bones = snapshot;
                self.warn(format!("Skipped {}: {}", label, err));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Drops reference bones that only exist to measure the meta-armature.
    fn remove_references(&mut self) {
        for side in ['L', 'R'] {
            self.bones.remove(&suffixed(FOOT_WIDTH_BONE, Some(side)));
        }
    }

    /// Gives `bone` a wire-drawn widget; an unresolved widget is a warning.
    fn assign_widget(&mut self, bone: &str, widget: &str, shape: Option<WidgetShape>) -> RigResult<()> {
        let handle = self.assets.get_or_create_widget(widget, shape.as_ref());
        let target = self.bones.require_mut(bone)?;
        target.pose.show_wire = true;
        target.pose.custom_shape = handle.map(|h| h.0);
        if target.pose.custom_shape.is_none() {
            self.warn(format!("Widget '{}' for bone '{}' could not be resolved", widget, bone));
        }
        Ok(())
    }

    /// Control from `target` onto the head of `affected` with the default rigidities.
    fn control(&mut self, target: &str, affected: &str) -> RigResult<()> {
        joints::target_affected(
            &mut self.bones,
            target,
            affected,
            0.0,
            self.config.target_position_rigidity,
            self.config.target_orientation_rigidity,
        )
    }

    /// Adds a short cube-widget target at `head_tail` along `pulled`.
    ///
    /// The puller is a tenth of the pulled bone's length, never shorter than
    /// the configured minimum, and its control carries no rigidity until a
    /// pose preset raises it.
    fn point_puller(&mut self, name: &str, pulled: &str, parent: &str, head_tail: f64) -> RigResult<()> {
        self.bones.require(parent)?;
        let source = self.bones.require(pulled)?;
        let direction = source.y_axis()?;
        let mut size = source.length() * self.config.puller_scale;
        if size < self.config.puller_min_size {
            size = self.config.puller_min_size;
        }
        let head = source.point_at(head_tail);
        let align = source.align_roll;

        let puller = self.bones.new_bone(name)?;
        puller.head = head;
        puller.tail = head + direction * size;
        puller.align_roll = align;
        puller.parent = Some(parent.to_string());
        puller.pose.locks.scale = [true; 3];

        self.assign_widget(name, WIDGET_CUBE, None)?;
        joints::target_affected(&mut self.bones, name, pulled, head_tail, 0.0, 0.0)
    }

    fn twist_chain(&mut self, bone: &str, parent: &str, bbone_segments: u32) -> RigResult<TwistChain> {
        twist::add_twist_chain(&mut self.bones, self.twist_counter, bone, parent, bbone_segments)
    }
}

/// `<kind><digit>-<segment>.<side>` for each digit that exists, in digit order.
fn segment_siblings(bones: &MetaBoneCollection, kind: &str, segment: usize, side: char) -> Vec<String> {
    (1..=5)
        .map(|digit| digit_segment_name(kind, digit, segment, side))
        .filter(|name| bones.contains(name))
        .collect()
}

/// Mechanical bone that biases the swing range of `<kind><digit>-<segment>`.
fn swing_center_name(kind: &str, digit: usize, segment: usize, side: char) -> String {
    format!("MCH-{}{}-{}-swingcenter.{}", kind, digit, segment, side)
}
