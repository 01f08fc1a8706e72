// Contract with the external map-rendering engine

use serde_json::{Map, Value};
use thiserror::Error;

use crate::camera::{Bounds, Camera, ScreenPoint};
use crate::style::{LayerKind, LayerSpec, SourceSpec};

/// Which half of the viewport pair an engine event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportRole {
    /// Interactive, full opacity, clipped to the lens
    Primary,
    /// Non-interactive, muted, drawn underneath
    Secondary,
}

impl std::fmt::Display for ViewportRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewportRole::Primary => write!(f, "primary"),
            ViewportRole::Secondary => write!(f, "secondary"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("no layer with id '{0}'")]
    UnknownLayer(String),

    #[error("no source with id '{0}'")]
    UnknownSource(String),

    #[error("layer '{0}' already exists")]
    DuplicateLayer(String),

    #[error("layer '{layer}' does not support paint property '{property}'")]
    UnsupportedProperty { layer: String, property: String },

    #[error("map engine call failed: {0}")]
    Js(String),
}

/// Summary of a style layer as reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    pub id: String,
    pub kind: LayerKind,
}

/// A feature returned by pixel-space hit testing
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
    pub layer: String,
    pub source: String,
    pub id: Option<Value>,
    pub properties: Map<String, Value>,
}

impl RenderedFeature {
    /// String property, numbers rendered as text, empty strings treated as absent
    pub fn prop_str(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        match self.properties.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// One map viewport of the rendering engine
///
/// Implemented over Mapbox GL JS on the web and by `HeadlessEngine` natively.
/// Layers may only be added after the engine signalled that its style loaded;
/// the controller enforces that ordering.
pub trait MapEngine {
    fn camera(&self) -> Camera;

    /// Set the camera without any easing
    fn jump_to(&mut self, camera: &Camera);

    fn fit_bounds(&mut self, bounds: &Bounds, padding: f64);

    fn add_source(&mut self, source: &SourceSpec) -> Result<(), EngineError>;

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), EngineError>;

    /// Every layer currently in the style, in draw order
    fn layers(&self) -> Vec<LayerInfo>;

    fn set_paint_property(
        &mut self,
        layer: &str,
        property: &str,
        value: Value,
    ) -> Result<(), EngineError>;

    fn set_feature_state(
        &mut self,
        source: &str,
        feature_id: &Value,
        state: Map<String, Value>,
    ) -> Result<(), EngineError>;

    /// Features rendered at `point` on any of `layers`, topmost first
    fn query_rendered_features(&self, point: ScreenPoint, layers: &[&str]) -> Vec<RenderedFeature>;

    /// Re-read the container size after a layout change
    fn resize(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(props: Value) -> RenderedFeature {
        RenderedFeature {
            layer: "l".into(),
            source: "s".into(),
            id: None,
            properties: props.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_prop_str_skips_empty_and_formats_numbers() {
        let f = feature(json!({ "street": "", "geoid": 36061000100u64, "name": "x" }));
        assert_eq!(f.prop_str("street"), None);
        assert_eq!(f.prop_str("geoid").as_deref(), Some("36061000100"));
        assert_eq!(f.prop_str("name").as_deref(), Some("x"));
        assert_eq!(f.prop_str("missing"), None);
    }

    #[test]
    fn test_prop_f64_parses_strings() {
        let f = feature(json!({ "a": 0.25, "b": " 0.5 ", "c": true }));
        assert_eq!(f.prop_f64("a"), Some(0.25));
        assert_eq!(f.prop_f64("b"), Some(0.5));
        assert_eq!(f.prop_f64("c"), None);
    }

    #[test]
    fn test_error_messages() {
        let e = EngineError::UnsupportedProperty {
            layer: "bg".into(),
            property: "fill-opacity".into(),
        };
        assert_eq!(
            e.to_string(),
            "layer 'bg' does not support paint property 'fill-opacity'"
        );
    }
}
