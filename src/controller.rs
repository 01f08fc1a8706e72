//! Probe lens session controller
//!
//! Owns every piece of mutable session state: the viewport pair, the page UI,
//! the mode, the lens and the hover/selection ids. Hosts forward engine and
//! pointer events to the named handlers below; each handler states when it is
//! meaningful and is a no-op otherwise.

use serde_json::{json, Map, Value};

use crate::camera::{ContainerRect, ScreenPoint};
use crate::engine::{MapEngine, RenderedFeature, ViewportRole};
use crate::lens::{LensState, Mode};
use crate::mute::{mute_layers, MuteReport};
use crate::readiness::ReadyLatch;
use crate::style::{ids, StyleTable};
use crate::tooltip::{Tooltip, TractDetails, HOVER_LAYERS};
use crate::ui::{Panel, ProbeUi};
use crate::Config;

pub struct LensController<E: MapEngine, U: ProbeUi> {
    config: Config,
    style: StyleTable,
    primary: E,
    secondary: E,
    ui: U,
    mode: Mode,
    lens: LensState,
    ready: ReadyLatch,
    container: ContainerRect,
    hovered_tract: Option<Value>,
    selected_tract: Option<Value>,
    mute_report: Option<MuteReport>,
}

impl<E: MapEngine, U: ProbeUi> LensController<E, U> {
    /// Take ownership of a viewport pair built by the host.
    ///
    /// Both engines must have been created with the same style source and
    /// initial camera, the secondary without user interaction, and only the
    /// primary's camera events may be routed to `on_primary_camera_changed`.
    /// Layers are added later, once both report `on_style_loaded`.
    pub fn new(primary: E, secondary: E, ui: U, config: Config, style: StyleTable) -> Self {
        let lens = LensState::new(config.lens_radius);
        let container = config.container();

        let mut controller = Self {
            config,
            style,
            primary,
            secondary,
            ui,
            mode: Mode::Overview,
            lens,
            ready: ReadyLatch::new(),
            container,
            hovered_tract: None,
            selected_tract: None,
            mute_report: None,
        };

        controller.enter_overview();

        if let Some(bounds) = controller.config.fit_bounds {
            controller.primary.fit_bounds(&bounds, controller.config.fit_padding);
            controller.on_primary_camera_changed();
        }

        log::info!(
            "Lens session started: {}, radius {}px, container {}x{}",
            controller.config.style_url,
            controller.lens.radius,
            controller.container.width,
            controller.container.height
        );
        controller
    }

    /// Stage 1 of initialization: a viewport's style finished loading.
    ///
    /// Stage 2 (populate both viewports, mute the secondary, mirror the camera)
    /// runs once, on whichever signal completes the pair.
    pub fn on_style_loaded(&mut self, role: ViewportRole) {
        log::info!("Style loaded on {} viewport", role);
        if self.ready.mark(role) {
            self.populate();
        }
    }

    fn populate(&mut self) {
        let primary = self.style.apply_to(&mut self.primary);
        let secondary = self.style.apply_to(&mut self.secondary);
        log::info!(
            "Populated layers: primary {}, secondary {} (of {})",
            primary,
            secondary,
            self.style.layers.len()
        );

        self.mute_secondary_layers();
        self.on_primary_camera_changed();
    }

    /// Mirror the primary camera onto the secondary without easing.
    ///
    /// Called for every primary camera change: drag, zoom, rotate, fit.
    pub fn on_primary_camera_changed(&mut self) {
        let camera = self.primary.camera();
        self.secondary.jump_to(&camera);
        log::trace!(
            "Camera synced: ({:.5}, {:.5}) z{:.2} b{:.1} p{:.1}",
            camera.center.lng,
            camera.center.lat,
            camera.zoom,
            camera.bearing,
            camera.pitch
        );
    }

    /// Lower the opacity of every layer on the secondary viewport.
    ///
    /// Best effort and idempotent; see `mute::mute_layers`.
    pub fn mute_secondary_layers(&mut self) -> &MuteReport {
        let report = mute_layers(&mut self.secondary, &self.config.mute);
        self.mute_report.insert(report)
    }

    /// Switch between OVERVIEW and PROBE. Never fails; re-entering the current
    /// mode re-applies its entry actions.
    pub fn set_probe_mode(&mut self, enabled: bool) {
        let target = if enabled { Mode::Probe } else { Mode::Overview };
        if target != self.mode {
            log::info!("Mode {} -> {}", self.mode, target);
        }

        match target {
            Mode::Probe => self.enter_probe(),
            Mode::Overview => {
                if self.mode == Mode::Probe {
                    self.exit_probe();
                }
                self.enter_overview();
            }
        }
    }

    fn enter_overview(&mut self) {
        self.mode = Mode::Overview;
        self.lens.enabled = false;
        self.lens.overlay_visible = false;
        self.ui.set_lens_overlay_visible(false);
        self.ui.set_primary_clip(None);
        self.ui.set_panel_visible(Panel::Probe, false);
        self.ui.set_panel_visible(Panel::Overview, true);
        self.ui.set_panel_visible(Panel::OverviewControls, true);
        self.ui.set_active_toggle(Mode::Overview);
    }

    fn enter_probe(&mut self) {
        self.mode = Mode::Probe;
        self.lens.enabled = true;
        self.ui.set_panel_visible(Panel::Overview, false);
        self.ui.set_panel_visible(Panel::OverviewControls, false);
        self.ui.set_panel_visible(Panel::Probe, true);
        self.ui.set_active_toggle(Mode::Probe);
    }

    fn exit_probe(&mut self) {
        self.lens.enabled = false;
        self.lens.overlay_visible = false;
        self.lens.center = None;
        self.ui.set_lens_overlay_visible(false);
        self.ui.set_primary_clip(None);
    }

    /// PROBE only: move the lens to the pointer.
    ///
    /// `client` is in client pixels, `rect` the container's current bounding
    /// box. Positions outside the container are ignored. Repositions the
    /// overlay and clip but never changes overlay visibility.
    pub fn on_pointer_move(&mut self, client: ScreenPoint, rect: ContainerRect) {
        if self.mode != Mode::Probe {
            return;
        }
        self.container = rect;

        let Some(local) = rect.to_local(client.x, client.y) else {
            return;
        };

        self.lens.center = Some(local);
        self.apply_lens();
    }

    /// PROBE only: hide the overlay. Clip and lens center are kept.
    pub fn on_pointer_leave_container(&mut self) {
        if self.mode != Mode::Probe {
            return;
        }
        self.lens.overlay_visible = false;
        self.ui.set_lens_overlay_visible(false);
    }

    /// PROBE only: show the overlay. This is the only transition that makes
    /// it visible. Without a stored center the next move positions it.
    pub fn on_pointer_enter_container(&mut self) {
        if self.mode != Mode::Probe {
            return;
        }
        self.apply_lens();
        self.lens.overlay_visible = true;
        self.ui.set_lens_overlay_visible(true);
    }

    /// Change the lens radius; returns the clamped value in use
    pub fn set_lens_radius(&mut self, radius: f64) -> f64 {
        let radius = self.lens.set_radius(radius);
        log::debug!("Lens radius set to {}px", radius);
        if self.mode == Mode::Probe {
            self.apply_lens();
        }
        radius
    }

    /// The shared container changed size or position
    pub fn on_container_resize(&mut self, rect: ContainerRect) {
        self.container = rect;
        self.primary.resize();
        self.secondary.resize();

        if let Some(center) = self.lens.center {
            self.lens.center = Some(rect.clamp(center));
            if self.mode == Mode::Probe {
                self.apply_lens();
            }
        }
        self.on_primary_camera_changed();
    }

    fn apply_lens(&mut self) {
        if let Some(clip) = self.lens.clip() {
            self.ui.place_lens_overlay(clip.center, clip.radius);
            self.ui.set_primary_clip(Some(clip));
        }
    }

    /// Pointer moved over the primary map, `point` in container-local pixels.
    /// Meaningful once both viewports are populated.
    pub fn on_hover(&mut self, point: ScreenPoint) {
        if !self.ready.is_complete() {
            return;
        }
        let hits = self.primary.query_rendered_features(point, HOVER_LAYERS);

        match Tooltip::for_features(&hits, point) {
            Some(tooltip) => self.ui.show_tooltip(&tooltip),
            None => self.ui.hide_tooltip(),
        }

        let tract = hits
            .iter()
            .find(|f| f.layer == ids::CENSUS_TRACTS)
            .and_then(tract_id);
        self.set_hovered_tract(tract);
    }

    /// Pointer left the primary map
    pub fn on_hover_out(&mut self) {
        self.ui.hide_tooltip();
        self.set_hovered_tract(None);
    }

    /// Select the census tract under `point`, or clear the selection
    pub fn on_click(&mut self, point: ScreenPoint) {
        if !self.ready.is_complete() {
            return;
        }
        let hits = self
            .primary
            .query_rendered_features(point, &[ids::CENSUS_TRACTS]);
        let feature = hits.first();
        let details = feature.and_then(TractDetails::from_feature);
        let id = feature.and_then(tract_id);

        if id != self.selected_tract {
            if let Some(old) = self.selected_tract.take() {
                self.set_tract_state(&old, "selected", false);
            }
            if let Some(new) = &id {
                self.set_tract_state(new, "selected", true);
                log::info!("Selected tract {}", new);
            }
            self.selected_tract = id;
        }
        self.ui.show_tract_details(details.as_ref());
    }

    fn set_hovered_tract(&mut self, tract: Option<Value>) {
        if tract == self.hovered_tract {
            return;
        }
        if let Some(old) = self.hovered_tract.take() {
            self.set_tract_state(&old, "hover", false);
        }
        if let Some(new) = &tract {
            self.set_tract_state(new, "hover", true);
        }
        self.hovered_tract = tract;
    }

    fn set_tract_state(&mut self, id: &Value, key: &str, value: bool) {
        let mut state = Map::new();
        state.insert(key.to_string(), json!(value));

        for (role, engine) in [
            (ViewportRole::Primary, &mut self.primary),
            (ViewportRole::Secondary, &mut self.secondary),
        ] {
            if let Err(e) = engine.set_feature_state(ids::CENSUS_TRACTS, id, state.clone()) {
                log::debug!("Feature state '{}' on {} viewport failed: {}", key, role, e);
            }
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn lens(&self) -> &LensState {
        &self.lens
    }

    pub fn container(&self) -> ContainerRect {
        self.container
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Both viewports populated
    pub fn is_ready(&self) -> bool {
        self.ready.is_complete()
    }

    pub fn mute_report(&self) -> Option<&MuteReport> {
        self.mute_report.as_ref()
    }

    pub fn hovered_tract(&self) -> Option<&Value> {
        self.hovered_tract.as_ref()
    }

    pub fn selected_tract(&self) -> Option<&Value> {
        self.selected_tract.as_ref()
    }

    pub fn primary(&self) -> &E {
        &self.primary
    }

    /// For hosts that drive the primary directly; follow camera mutations
    /// with `on_primary_camera_changed`
    pub fn primary_mut(&mut self) -> &mut E {
        &mut self.primary
    }

    pub fn secondary(&self) -> &E {
        &self.secondary
    }

    /// Engine-side access for delivering engine signals; user input must
    /// never reach the secondary
    pub(crate) fn secondary_mut(&mut self) -> &mut E {
        &mut self.secondary
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }
}

/// Feature id of a tract, falling back to its `geoid` property
fn tract_id(feature: &RenderedFeature) -> Option<Value> {
    feature
        .id
        .clone()
        .or_else(|| feature.properties.get("geoid").cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, LngLat};
    use crate::headless::{HeadlessEngine, RecordingUi};
    use crate::lens::ClipCircle;
    use crate::style::LayerKind;
    use proptest::prelude::*;

    type Session = LensController<HeadlessEngine, RecordingUi>;

    fn session_with(config: Config) -> Session {
        let camera = config.initial_camera;
        let (w, h) = (f64::from(config.width), f64::from(config.height));
        let primary = HeadlessEngine::new(camera, w, h);
        let secondary = HeadlessEngine::new(camera, w, h).non_interactive();
        LensController::new(primary, secondary, RecordingUi::new(), config, StyleTable::nyc())
    }

    fn session() -> Session {
        session_with(Config::default())
    }

    /// Session with both styles loaded and layers populated
    fn ready_session() -> Session {
        let mut s = session();
        s.primary.load_style();
        s.secondary.load_style();
        s.on_style_loaded(ViewportRole::Primary);
        s.on_style_loaded(ViewportRole::Secondary);
        s
    }

    fn at_origin(width: f64, height: f64) -> ContainerRect {
        ContainerRect::sized(width, height)
    }

    fn tract(geoid: &str, fragility: f64) -> RenderedFeature {
        RenderedFeature {
            layer: ids::CENSUS_TRACTS.to_string(),
            source: ids::CENSUS_TRACTS.to_string(),
            id: Some(json!(geoid)),
            properties: json!({ "geoid": geoid, "logistics_fragility": fragility })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        }
    }

    #[test]
    fn test_starts_in_overview() {
        let s = session();
        assert_eq!(s.mode(), Mode::Overview);
        assert!(!s.lens().enabled);
        assert_eq!(s.ui().active_toggle, Some(Mode::Overview));
        assert!(s.ui().panel_visible(Panel::Overview));
        assert!(s.ui().panel_visible(Panel::OverviewControls));
        assert!(!s.ui().panel_visible(Panel::Probe));
        assert!(!s.ui().lens_visible);
        assert_eq!(s.ui().clip, None);
    }

    #[test]
    fn test_stage_two_waits_for_both_viewports() {
        let mut s = session();
        s.primary.load_style();
        s.on_style_loaded(ViewportRole::Primary);
        assert!(!s.is_ready());
        assert!(s.primary().layers().is_empty());

        s.secondary.load_style();
        s.on_style_loaded(ViewportRole::Secondary);
        assert!(s.is_ready());
        assert_eq!(s.primary().layers().len(), 5);
        assert_eq!(s.secondary().layers().len(), 5);

        let report = s.mute_report().cloned().unwrap_or_default();
        assert_eq!(report.muted.len(), 5);
        assert_eq!(
            s.primary().paint_value(ids::FRESH_ZONING, "fill-opacity"),
            Some(&json!(0.45))
        );
        assert_eq!(
            s.secondary().paint_value(ids::FRESH_ZONING, "fill-opacity"),
            Some(&json!(0.15))
        );
    }

    #[test]
    fn test_stage_two_runs_once() {
        let mut s = ready_session();
        s.on_style_loaded(ViewportRole::Primary);
        s.on_style_loaded(ViewportRole::Secondary);
        assert_eq!(s.primary().layers().len(), 5);
    }

    #[test]
    fn test_zoom_gesture_scenario() {
        let config = Config {
            initial_camera: Camera::new(LngLat::new(-73.94, 40.70), 10.5),
            ..Config::default()
        };
        let mut s = session_with(config);

        assert!(s.primary_mut().zoom_gesture(12.0));
        s.on_primary_camera_changed();

        assert!(!s.secondary().is_interactive());
        let mirrored = s.secondary().camera();
        assert!(mirrored.approx_eq(&Camera::new(LngLat::new(-73.94, 40.70), 12.0)));
        assert_eq!(mirrored.bearing, 0.0);
        assert_eq!(mirrored.pitch, 0.0);
    }

    #[test]
    fn test_fit_bounds_is_mirrored_at_startup() {
        let config = Config {
            fit_bounds: Some(crate::constants::NYC_BOUNDS),
            ..Config::default()
        };
        let s = session_with(config);
        assert!(s.secondary().camera().approx_eq(&s.primary().camera()));
        assert_ne!(s.primary().camera(), Camera::default());
    }

    #[test]
    fn test_probe_then_move_clips_primary() {
        let mut s = session();
        s.set_probe_mode(true);
        assert!(!s.ui().lens_visible);

        s.on_pointer_move(ScreenPoint::new(50.0, 50.0), at_origin(800.0, 600.0));
        assert!(!s.ui().lens_visible);
        s.on_pointer_enter_container();

        let expected = ClipCircle {
            center: ScreenPoint::new(50.0, 50.0),
            radius: crate::constants::DEFAULT_LENS_RADIUS,
        };
        assert_eq!(s.ui().clip, Some(expected));
        assert_eq!(
            s.ui().lens_overlay,
            Some((ScreenPoint::new(50.0, 50.0), expected.radius))
        );
        assert_eq!(s.ui().visible_lens_center(), Some(ScreenPoint::new(50.0, 50.0)));
    }

    #[test]
    fn test_move_is_container_relative() {
        let mut s = session();
        s.set_probe_mode(true);
        s.on_pointer_move(
            ScreenPoint::new(300.0, 160.0),
            ContainerRect::new(250.0, 100.0, 800.0, 600.0),
        );
        assert_eq!(s.lens().center, Some(ScreenPoint::new(50.0, 60.0)));

        // outside the container: ignored
        s.on_pointer_move(
            ScreenPoint::new(10.0, 10.0),
            ContainerRect::new(250.0, 100.0, 800.0, 600.0),
        );
        assert_eq!(s.lens().center, Some(ScreenPoint::new(50.0, 60.0)));
    }

    #[test]
    fn test_move_ignored_in_overview() {
        let mut s = session();
        s.on_pointer_move(ScreenPoint::new(50.0, 50.0), at_origin(800.0, 600.0));
        assert_eq!(s.lens().center, None);
        assert_eq!(s.ui().clip, None);
        assert!(!s.ui().lens_visible);
    }

    #[test]
    fn test_probe_panels() {
        let mut s = session();
        s.set_probe_mode(true);
        assert_eq!(s.mode(), Mode::Probe);
        assert_eq!(s.ui().active_toggle, Some(Mode::Probe));
        assert!(s.ui().panel_visible(Panel::Probe));
        assert!(!s.ui().panel_visible(Panel::Overview));
        assert!(!s.ui().panel_visible(Panel::OverviewControls));
    }

    #[test]
    fn test_leave_keeps_clip_and_enter_restores_overlay() {
        let mut s = session();
        s.set_probe_mode(true);
        s.on_pointer_move(ScreenPoint::new(120.0, 80.0), at_origin(800.0, 600.0));
        let clip = s.ui().clip;

        s.on_pointer_leave_container();
        assert!(!s.ui().lens_visible);
        assert_eq!(s.lens().center, Some(ScreenPoint::new(120.0, 80.0)));
        assert_eq!(s.ui().clip, clip);

        s.on_pointer_enter_container();
        assert_eq!(s.ui().visible_lens_center(), Some(ScreenPoint::new(120.0, 80.0)));
        assert_eq!(s.ui().clip, clip);
    }

    #[test]
    fn test_enter_after_probe_shows_overlay() {
        let mut s = session();
        s.set_probe_mode(true);
        s.on_pointer_enter_container();
        assert!(s.ui().lens_visible);
        assert!(s.lens().overlay_visible);
        assert_eq!(s.ui().clip, None);

        // the first move positions the already visible overlay
        s.on_pointer_move(ScreenPoint::new(60.0, 40.0), at_origin(800.0, 600.0));
        assert_eq!(s.ui().visible_lens_center(), Some(ScreenPoint::new(60.0, 40.0)));
        assert_eq!(s.ui().clip.map(|c| c.center), Some(ScreenPoint::new(60.0, 40.0)));
    }

    #[test]
    fn test_move_without_enter_keeps_overlay_hidden() {
        let mut s = session();
        s.set_probe_mode(true);
        s.on_pointer_move(ScreenPoint::new(50.0, 50.0), at_origin(800.0, 600.0));
        s.on_pointer_move(ScreenPoint::new(70.0, 90.0), at_origin(800.0, 600.0));
        assert!(!s.ui().lens_visible);
        assert!(!s.lens().overlay_visible);
        assert_eq!(s.ui().lens_overlay, Some((ScreenPoint::new(70.0, 90.0), s.lens().radius)));
    }

    #[test]
    fn test_enter_and_leave_ignored_in_overview() {
        let mut s = session();
        s.set_probe_mode(true);
        s.on_pointer_move(ScreenPoint::new(10.0, 10.0), at_origin(800.0, 600.0));
        s.set_probe_mode(false);
        s.on_pointer_enter_container();
        assert!(!s.ui().lens_visible);
        assert_eq!(s.ui().clip, None);
    }

    #[test]
    fn test_overview_always_clears_lens() {
        let mut s = session();
        s.set_probe_mode(false);
        assert!(!s.ui().lens_visible);
        assert_eq!(s.ui().clip, None);

        s.set_probe_mode(true);
        s.on_pointer_enter_container();
        s.on_pointer_move(ScreenPoint::new(400.0, 300.0), at_origin(800.0, 600.0));
        assert!(s.ui().lens_visible);

        s.set_probe_mode(false);
        assert_eq!(s.mode(), Mode::Overview);
        assert!(!s.ui().lens_visible);
        assert_eq!(s.ui().clip, None);
        assert!(s.ui().panel_visible(Panel::Overview));
        assert!(!s.ui().panel_visible(Panel::Probe));
    }

    #[test]
    fn test_reentering_probe_forgets_lens_center() {
        let mut s = session();
        s.set_probe_mode(true);
        s.on_pointer_enter_container();
        s.on_pointer_move(ScreenPoint::new(400.0, 300.0), at_origin(800.0, 600.0));
        s.set_probe_mode(false);
        s.set_probe_mode(true);
        assert!(!s.ui().lens_visible);

        s.on_pointer_enter_container();
        assert!(s.ui().lens_visible);
        assert_eq!(s.lens().center, None);
        assert_eq!(s.ui().clip, None);
    }

    #[test]
    fn test_radius_change_reapplies_clip() {
        let mut s = session();
        s.set_probe_mode(true);
        s.on_pointer_move(ScreenPoint::new(100.0, 100.0), at_origin(800.0, 600.0));

        assert_eq!(s.set_lens_radius(200.0), 200.0);
        assert_eq!(s.ui().clip.map(|c| c.radius), Some(200.0));
        assert_eq!(s.set_lens_radius(1.0), crate::constants::MIN_LENS_RADIUS);
        assert_eq!(
            s.ui().lens_overlay.map(|(_, r)| r),
            Some(crate::constants::MIN_LENS_RADIUS)
        );
    }

    #[test]
    fn test_radius_change_in_overview_keeps_clip_clear() {
        let mut s = session();
        s.set_lens_radius(250.0);
        assert_eq!(s.ui().clip, None);
        assert_eq!(s.lens().radius, 250.0);
    }

    #[test]
    fn test_resize_clamps_lens_center() {
        let mut s = session();
        s.set_probe_mode(true);
        s.on_pointer_move(ScreenPoint::new(700.0, 500.0), at_origin(800.0, 600.0));

        s.on_container_resize(at_origin(400.0, 300.0));

        assert_eq!(s.lens().center, Some(ScreenPoint::new(400.0, 300.0)));
        assert_eq!(s.ui().clip.map(|c| c.center), Some(ScreenPoint::new(400.0, 300.0)));
        assert_eq!(s.primary().resizes, 1);
        assert_eq!(s.secondary().resizes, 1);
    }

    #[test]
    fn test_hover_shows_tooltip_and_tract_state() {
        let mut s = ready_session();
        s.primary_mut()
            .place_feature(ScreenPoint::new(200.0, 200.0), 30.0, tract("36047000100", 0.72));

        s.on_hover(ScreenPoint::new(205.0, 200.0));

        let tooltip = s.ui().tooltip.clone().unwrap_or_else(|| panic!("no tooltip"));
        assert_eq!(tooltip.lines[0], "Tract 36047000100");
        assert_eq!(tooltip.position, ScreenPoint::new(225.0, 220.0));
        assert_eq!(s.hovered_tract(), Some(&json!("36047000100")));
        let state = s.primary().feature_state(ids::CENSUS_TRACTS, &json!("36047000100"));
        assert_eq!(state.and_then(|m| m.get("hover")), Some(&json!(true)));
        let state = s.secondary().feature_state(ids::CENSUS_TRACTS, &json!("36047000100"));
        assert_eq!(state.and_then(|m| m.get("hover")), Some(&json!(true)));

        s.on_hover(ScreenPoint::new(600.0, 500.0));
        assert_eq!(s.ui().tooltip, None);
        assert_eq!(s.hovered_tract(), None);
        let state = s.primary().feature_state(ids::CENSUS_TRACTS, &json!("36047000100"));
        assert_eq!(state.and_then(|m| m.get("hover")), Some(&json!(false)));
    }

    #[test]
    fn test_hover_out_hides_tooltip() {
        let mut s = ready_session();
        s.primary_mut()
            .place_feature(ScreenPoint::new(200.0, 200.0), 30.0, tract("1", 0.1));
        s.on_hover(ScreenPoint::new(200.0, 200.0));
        assert!(s.ui().tooltip.is_some());
        s.on_hover_out();
        assert_eq!(s.ui().tooltip, None);
        assert_eq!(s.hovered_tract(), None);
    }

    #[test]
    fn test_hover_before_ready_is_ignored() {
        let mut s = session();
        s.primary_mut()
            .place_feature(ScreenPoint::new(10.0, 10.0), 30.0, tract("1", 0.1));
        s.on_hover(ScreenPoint::new(10.0, 10.0));
        assert_eq!(s.ui().tooltip, None);
    }

    #[test]
    fn test_click_selects_and_clears_tract() {
        let mut s = ready_session();
        s.primary_mut()
            .place_feature(ScreenPoint::new(200.0, 200.0), 30.0, tract("36061000100", 0.456));

        s.on_click(ScreenPoint::new(200.0, 200.0));
        assert_eq!(s.selected_tract(), Some(&json!("36061000100")));
        let details = s.ui().tract_details.clone();
        assert_eq!(details.as_ref().map(|d| d.geoid.as_str()), Some("36061000100"));
        assert_eq!(details.and_then(|d| d.fragility), Some(0.456));

        s.on_click(ScreenPoint::new(700.0, 50.0));
        assert_eq!(s.selected_tract(), None);
        assert_eq!(s.ui().tract_details, None);
        let state = s.primary().feature_state(ids::CENSUS_TRACTS, &json!("36061000100"));
        assert_eq!(state.and_then(|m| m.get("selected")), Some(&json!(false)));
    }

    #[test]
    fn test_mute_tolerates_basemap_layers() {
        let mut s = session();
        s.primary.load_style();
        s.secondary.load_style();
        s.secondary.insert_base_layer("background", LayerKind::Background);
        s.secondary.insert_base_layer("hillshade", LayerKind::Hillshade);
        s.on_style_loaded(ViewportRole::Secondary);
        s.on_style_loaded(ViewportRole::Primary);

        let report = s.mute_secondary_layers().clone();
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.muted.len(), 5);
    }

    #[derive(Debug, Clone)]
    enum Gesture {
        Zoom(f64),
        Pan(f64, f64),
        Rotate(f64),
        Pitch(f64),
    }

    fn gesture() -> impl Strategy<Value = Gesture> {
        prop_oneof![
            (0.0f64..22.0).prop_map(Gesture::Zoom),
            (-180.0f64..180.0, -85.0f64..85.0).prop_map(|(lng, lat)| Gesture::Pan(lng, lat)),
            (-720.0f64..720.0).prop_map(Gesture::Rotate),
            (0.0f64..85.0).prop_map(Gesture::Pitch),
        ]
    }

    proptest! {
        #[test]
        fn secondary_mirrors_primary_after_every_gesture(gestures in prop::collection::vec(gesture(), 1..40)) {
            let mut s = ready_session();
            for g in gestures {
                let primary = s.primary_mut();
                match g {
                    Gesture::Zoom(z) => primary.zoom_gesture(z),
                    Gesture::Pan(lng, lat) => primary.pan_gesture(LngLat::new(lng, lat)),
                    Gesture::Rotate(b) => primary.rotate_gesture(b),
                    Gesture::Pitch(p) => primary.pitch_gesture(p),
                };
                s.on_primary_camera_changed();
                prop_assert!(s.secondary().camera().approx_eq(&s.primary().camera()));
            }
        }
    }
}
