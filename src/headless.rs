//! In-memory map engine and UI used by the replay CLI and the tests
//!
//! `HeadlessEngine` keeps the state a real engine would (camera, style layers,
//! paint values, feature state) without drawing anything. Hit testing works
//! against features placed at fixed screen positions.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use serde_json::{Map, Value};

use crate::camera::{Bounds, Camera, LngLat, ScreenPoint};
use crate::constants::{MAX_ZOOM, MIN_ZOOM, TILE_SIZE};
use crate::engine::{EngineError, LayerInfo, MapEngine, RenderedFeature};
use crate::lens::{ClipCircle, Mode};
use crate::style::{LayerKind, LayerSpec, SourceSpec};
use crate::tooltip::{TractDetails, Tooltip};
use crate::ui::{Panel, ProbeUi};

/// A feature that hit-tests within `radius` pixels of `position`
#[derive(Debug, Clone)]
struct PlacedFeature {
    position: ScreenPoint,
    radius: f64,
    feature: RenderedFeature,
}

pub struct HeadlessEngine {
    camera: Camera,
    width: f64,
    height: f64,
    interactive: bool,
    style_loaded: bool,
    sources: Vec<SourceSpec>,
    layers: Vec<LayerSpec>,
    feature_states: HashMap<(String, String), Map<String, Value>>,
    placed: Vec<PlacedFeature>,
    failing: HashSet<String>,

    /// Number of `jump_to` calls received
    pub jumps: usize,
    pub resizes: usize,
}

impl HeadlessEngine {
    pub fn new(camera: Camera, width: f64, height: f64) -> Self {
        Self {
            camera,
            width,
            height,
            interactive: true,
            style_loaded: false,
            sources: Vec::new(),
            layers: Vec::new(),
            feature_states: HashMap::new(),
            placed: Vec::new(),
            failing: HashSet::new(),
            jumps: 0,
            resizes: 0,
        }
    }

    /// Engine that ignores user gestures, like the muted viewport
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Simulate the engine's "style loaded" signal
    pub fn load_style(&mut self) {
        self.style_loaded = true;
    }

    pub fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Add a style-owned layer that has no source, such as a basemap background
    pub fn insert_base_layer(&mut self, id: &str, kind: LayerKind) {
        let mut layer = LayerSpec::new(id, kind, "");
        layer.source = None;
        self.layers.push(layer);
    }

    /// Make every later `set_paint_property` on `layer` fail
    pub fn fail_paint_on(&mut self, layer: &str) {
        self.failing.insert(layer.to_string());
    }

    pub fn place_feature(&mut self, position: ScreenPoint, radius: f64, feature: RenderedFeature) {
        self.placed.push(PlacedFeature {
            position,
            radius,
            feature,
        });
    }

    pub fn paint_value(&self, layer: &str, property: &str) -> Option<&Value> {
        self.layers
            .iter()
            .find(|l| l.id == layer)
            .and_then(|l| l.paint.get(property))
    }

    pub fn feature_state(&self, source: &str, feature_id: &Value) -> Option<&Map<String, Value>> {
        self.feature_states
            .get(&(source.to_string(), id_key(feature_id)))
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.sources.iter().any(|s| s.id == id)
    }

    // User gestures. Ignored when the engine is not interactive.

    pub fn zoom_gesture(&mut self, zoom: f64) -> bool {
        self.gesture(|camera| camera.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM))
    }

    pub fn pan_gesture(&mut self, center: LngLat) -> bool {
        self.gesture(|camera| camera.center = center)
    }

    pub fn rotate_gesture(&mut self, bearing: f64) -> bool {
        self.gesture(|camera| camera.bearing = bearing.rem_euclid(360.0))
    }

    pub fn pitch_gesture(&mut self, pitch: f64) -> bool {
        self.gesture(|camera| camera.pitch = pitch.clamp(0.0, crate::constants::MAX_PITCH))
    }

    fn gesture(&mut self, apply: impl FnOnce(&mut Camera)) -> bool {
        if !self.interactive {
            log::warn!("Ignoring gesture on non-interactive viewport");
            return false;
        }
        apply(&mut self.camera);
        true
    }
}

fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Web Mercator y in [0, 1], 0 at the north edge
fn mercator_y(lat: f64) -> f64 {
    let rad = lat.to_radians();
    0.5 - (PI / 4.0 + rad / 2.0).tan().ln() / (2.0 * PI)
}

fn inverse_mercator_y(y: f64) -> f64 {
    let n = PI * (1.0 - 2.0 * y);
    n.sinh().atan().to_degrees()
}

impl MapEngine for HeadlessEngine {
    fn camera(&self) -> Camera {
        self.camera
    }

    fn jump_to(&mut self, camera: &Camera) {
        self.camera = *camera;
        self.jumps += 1;
    }

    fn fit_bounds(&mut self, bounds: &Bounds, padding: f64) {
        let span_x = (self.width - 2.0 * padding).max(1.0);
        let span_y = (self.height - 2.0 * padding).max(1.0);
        let dx = ((bounds.ne.lng - bounds.sw.lng) / 360.0).abs();
        let y_sw = mercator_y(bounds.sw.lat);
        let y_ne = mercator_y(bounds.ne.lat);
        let dy = (y_sw - y_ne).abs();

        let zoom_x = (span_x / (TILE_SIZE * dx)).log2();
        let zoom_y = (span_y / (TILE_SIZE * dy)).log2();

        self.camera.zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM);
        self.camera.center = LngLat::new(
            (bounds.sw.lng + bounds.ne.lng) / 2.0,
            inverse_mercator_y((y_sw + y_ne) / 2.0),
        );
        self.camera.bearing = 0.0;
        self.camera.pitch = 0.0;
    }

    fn add_source(&mut self, source: &SourceSpec) -> Result<(), EngineError> {
        if !self.style_loaded {
            return Err(EngineError::Js("Style is not done loading".to_string()));
        }
        if self.has_source(&source.id) {
            return Err(EngineError::Js(format!("source '{}' already exists", source.id)));
        }
        self.sources.push(source.clone());
        Ok(())
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), EngineError> {
        if !self.style_loaded {
            return Err(EngineError::Js("Style is not done loading".to_string()));
        }
        if self.layers.iter().any(|l| l.id == layer.id) {
            return Err(EngineError::DuplicateLayer(layer.id.clone()));
        }
        if let Some(source) = &layer.source {
            if !self.has_source(source) {
                return Err(EngineError::UnknownSource(source.clone()));
            }
        }
        self.layers.push(layer.clone());
        Ok(())
    }

    fn layers(&self) -> Vec<LayerInfo> {
        self.layers
            .iter()
            .map(|l| LayerInfo {
                id: l.id.clone(),
                kind: l.kind.clone(),
            })
            .collect()
    }

    fn set_paint_property(
        &mut self,
        layer: &str,
        property: &str,
        value: Value,
    ) -> Result<(), EngineError> {
        if self.failing.contains(layer) {
            return Err(EngineError::Js(format!("paint update rejected for '{}'", layer)));
        }
        let spec = self
            .layers
            .iter_mut()
            .find(|l| l.id == layer)
            .ok_or_else(|| EngineError::UnknownLayer(layer.to_string()))?;

        let prefix = format!("{}-", spec.kind.as_str());
        if !property.starts_with(&prefix) {
            return Err(EngineError::UnsupportedProperty {
                layer: layer.to_string(),
                property: property.to_string(),
            });
        }
        spec.paint.insert(property.to_string(), value);
        Ok(())
    }

    fn set_feature_state(
        &mut self,
        source: &str,
        feature_id: &Value,
        state: Map<String, Value>,
    ) -> Result<(), EngineError> {
        if !self.has_source(source) {
            return Err(EngineError::UnknownSource(source.to_string()));
        }
        let entry = self
            .feature_states
            .entry((source.to_string(), id_key(feature_id)))
            .or_default();
        entry.extend(state);
        Ok(())
    }

    fn query_rendered_features(&self, point: ScreenPoint, layers: &[&str]) -> Vec<RenderedFeature> {
        let draw_index = |id: &str| self.layers.iter().position(|l| l.id == id);

        let mut hits: Vec<(usize, usize, &RenderedFeature)> = self
            .placed
            .iter()
            .enumerate()
            .filter(|(_, p)| layers.is_empty() || layers.contains(&p.feature.layer.as_str()))
            .filter(|(_, p)| {
                let dx = p.position.x - point.x;
                let dy = p.position.y - point.y;
                dx * dx + dy * dy <= p.radius * p.radius
            })
            .filter_map(|(i, p)| draw_index(&p.feature.layer).map(|d| (d, i, &p.feature)))
            .collect();

        // topmost layer first, later placements above earlier ones
        hits.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        hits.into_iter().map(|(_, _, f)| f.clone()).collect()
    }

    fn resize(&mut self) {
        self.resizes += 1;
    }
}

/// `ProbeUi` that records what a page would display
#[derive(Debug, Clone, Default)]
pub struct RecordingUi {
    pub active_toggle: Option<Mode>,
    pub panels: HashMap<Panel, bool>,
    pub lens_overlay: Option<(ScreenPoint, f64)>,
    pub lens_visible: bool,
    pub clip: Option<ClipCircle>,
    pub tooltip: Option<Tooltip>,
    pub tract_details: Option<TractDetails>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel_visible(&self, panel: Panel) -> bool {
        self.panels.get(&panel).copied().unwrap_or(false)
    }

    /// Overlay center while the overlay is shown
    pub fn visible_lens_center(&self) -> Option<ScreenPoint> {
        if !self.lens_visible {
            return None;
        }
        self.lens_overlay.map(|(center, _)| center)
    }
}

impl ProbeUi for RecordingUi {
    fn set_active_toggle(&mut self, mode: Mode) {
        self.active_toggle = Some(mode);
    }

    fn set_panel_visible(&mut self, panel: Panel, visible: bool) {
        self.panels.insert(panel, visible);
    }

    fn place_lens_overlay(&mut self, center: ScreenPoint, radius: f64) {
        self.lens_overlay = Some((center, radius));
    }

    fn set_lens_overlay_visible(&mut self, visible: bool) {
        self.lens_visible = visible;
    }

    fn set_primary_clip(&mut self, clip: Option<ClipCircle>) {
        self.clip = clip;
    }

    fn show_tooltip(&mut self, tooltip: &Tooltip) {
        self.tooltip = Some(tooltip.clone());
    }

    fn hide_tooltip(&mut self) {
        self.tooltip = None;
    }

    fn show_tract_details(&mut self, details: Option<&TractDetails>) {
        self.tract_details = details.cloned();
    }
}
