//! Display widget descriptors.
//!
//! Widgets are opaque named assets owned by the host. The rig only records a
//! widget name per bone plus, for sized shapes, the parameters the host needs
//! to build one.

use serde::{Deserialize, Serialize};

pub const WIDGET_HAND: &str = "Widget-Hand";
pub const WIDGET_ROOT: &str = "Widget-Root";
pub const WIDGET_EYE_TARGET: &str = "Widget-Eye-Target";
pub const WIDGET_SPHERE: &str = "Widget-Sphere";
pub const WIDGET_CUBE: &str = "Widget-Cube";
pub const WIDGET_CIRCLE: &str = "Widget-Circle";
pub const WIDGET_FOOT: &str = "Widget-Foot";

/// Parametric description of a widget shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum WidgetShape {
    /// Unit wire cube.
    Cube,
    /// Three great circles.
    Sphere,
    /// Pair of linked rings used for the eye target.
    EyeTarget,
    /// Four-way arrow ring.
    Root,
    /// Single ring.
    Circle { radius: f64 },
    /// Flat rounded pad in the bone's XY plane.
    Pad {
        width: f64,
        length: f64,
        mid: f64,
        #[serde(default)]
        subsurface_levels: u32,
    },
}

impl WidgetShape {
    /// Pad shape with the default smoothing of two subdivision levels.
    pub fn pad(width: f64, length: f64, mid: f64) -> Self {
        WidgetShape::Pad {
            width,
            length,
            mid,
            subsurface_levels: 2,
        }
    }

    /// Overrides the subdivision level of a pad; other shapes are unchanged.
    pub fn with_subsurface(mut self, levels: u32) -> Self {
        if let WidgetShape::Pad {
            subsurface_levels, ..
        } = &mut self
        {
            *subsurface_levels = levels;
        }
        self
    }

    /// Built-in shape registered under a well-known widget name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            WIDGET_CUBE => Some(WidgetShape::Cube),
            WIDGET_SPHERE => Some(WidgetShape::Sphere),
            WIDGET_EYE_TARGET => Some(WidgetShape::EyeTarget),
            WIDGET_ROOT => Some(WidgetShape::Root),
            WIDGET_CIRCLE => Some(WidgetShape::Circle { radius: 1.0 }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(WidgetShape::builtin(WIDGET_CUBE), Some(WidgetShape::Cube));
        assert_eq!(
            WidgetShape::builtin(WIDGET_CIRCLE),
            Some(WidgetShape::Circle { radius: 1.0 })
        );
        assert_eq!(WidgetShape::builtin("Widget-Hand.L"), None);
    }

    #[test]
    fn test_pad_subsurface() {
        let pad = WidgetShape::pad(1.0, 0.75, 0.0).with_subsurface(1);
        assert_eq!(
            pad,
            WidgetShape::Pad {
                width: 1.0,
                length: 0.75,
                mid: 0.0,
                subsurface_levels: 1
            }
        );
    }

    #[test]
    fn test_shape_serde_tag() {
        let json = serde_json::to_string(&WidgetShape::Circle { radius: 2.0 }).unwrap();
        assert_eq!(json, r#"{"shape":"circle","radius":2.0}"#);
    }
}
