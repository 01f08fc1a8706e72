// Web-specific entry point and initialization
use serde_json::{json, Map, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlInputElement, MouseEvent};

use crate::camera::{Bounds, Camera, ContainerRect, LngLat, ScreenPoint};
use crate::engine::{EngineError, LayerInfo, MapEngine, RenderedFeature, ViewportRole};
use crate::lens::{ClipCircle, Mode};
use crate::style::{LayerKind, LayerSpec, SourceSpec, StyleTable};
use crate::tooltip::{escape_html, Tooltip, TractDetails};
use crate::session::SessionCell;
use crate::ui::{Panel, ProbeUi};
use crate::{constants, Config, LensController};

/// Element ids the page must provide
mod dom_ids {
    pub const CONTAINER: &str = "map-container";
    pub const PRIMARY_MAP: &str = "map-base";
    pub const SECONDARY_MAP: &str = "map-top";
    pub const LENS: &str = "lens";
    pub const OVERVIEW_TOGGLE: &str = "mode-overview";
    pub const PROBE_TOGGLE: &str = "mode-probe";
    pub const OVERVIEW_PANEL: &str = "overview-panel";
    pub const PROBE_PANEL: &str = "probe-panel";
    pub const OVERVIEW_CONTROLS: &str = "overview-controls";
    pub const TOOLTIP: &str = "tooltip";
    pub const TRACT_DETAILS: &str = "tract-details";
    pub const RADIUS_SLIDER: &str = "lens-radius";
}

mod mapbox {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = mapboxgl)]
        pub type Map;

        #[wasm_bindgen(constructor, js_namespace = mapboxgl)]
        pub fn new(options: &JsValue) -> Map;

        #[wasm_bindgen(method, js_name = getCenter)]
        pub fn get_center(this: &Map) -> JsValue;

        #[wasm_bindgen(method, js_name = getZoom)]
        pub fn get_zoom(this: &Map) -> f64;

        #[wasm_bindgen(method, js_name = getBearing)]
        pub fn get_bearing(this: &Map) -> f64;

        #[wasm_bindgen(method, js_name = getPitch)]
        pub fn get_pitch(this: &Map) -> f64;

        #[wasm_bindgen(method, js_name = jumpTo)]
        pub fn jump_to(this: &Map, options: &JsValue);

        #[wasm_bindgen(method, js_name = fitBounds)]
        pub fn fit_bounds(this: &Map, bounds: &JsValue, options: &JsValue);

        #[wasm_bindgen(method, catch, js_name = addSource)]
        pub fn add_source(this: &Map, id: &str, source: &JsValue) -> Result<(), JsValue>;

        #[wasm_bindgen(method, catch, js_name = addLayer)]
        pub fn add_layer(this: &Map, layer: &JsValue) -> Result<(), JsValue>;

        #[wasm_bindgen(method, js_name = getLayer)]
        pub fn get_layer(this: &Map, id: &str) -> JsValue;

        #[wasm_bindgen(method, js_name = getStyle)]
        pub fn get_style(this: &Map) -> JsValue;

        #[wasm_bindgen(method, catch, js_name = setPaintProperty)]
        pub fn set_paint_property(this: &Map, layer: &str, name: &str, value: &JsValue) -> Result<(), JsValue>;

        #[wasm_bindgen(method, catch, js_name = setFeatureState)]
        pub fn set_feature_state(this: &Map, feature: &JsValue, state: &JsValue) -> Result<(), JsValue>;

        #[wasm_bindgen(method, js_name = queryRenderedFeatures)]
        pub fn query_rendered_features(this: &Map, point: &JsValue, options: &JsValue) -> js_sys::Array;

        #[wasm_bindgen(method)]
        pub fn resize(this: &Map);

        #[wasm_bindgen(method)]
        pub fn on(this: &Map, event: &str, handler: &js_sys::Function);

        #[wasm_bindgen(method, js_name = addControl)]
        pub fn add_control(this: &Map, control: &NavigationControl, position: &str);

        #[wasm_bindgen(js_namespace = mapboxgl)]
        pub type NavigationControl;

        #[wasm_bindgen(constructor, js_namespace = mapboxgl)]
        pub fn new() -> NavigationControl;
    }
}

fn to_js(value: &Value) -> JsValue {
    js_sys::JSON::parse(&value.to_string()).unwrap_or(JsValue::NULL)
}

fn from_js(value: &JsValue) -> Value {
    js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(Value::Null)
}

fn get(target: &JsValue, key: &str) -> JsValue {
    js_sys::Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn js_error(e: JsValue) -> EngineError {
    let message = get(&e, "message")
        .as_string()
        .unwrap_or_else(|| format!("{:?}", e));
    EngineError::Js(message)
}

/// One Mapbox GL JS map
pub struct WebEngine {
    map: mapbox::Map,
}

impl WebEngine {
    fn create(container: &str, config: &Config, interactive: bool) -> Self {
        let camera = &config.initial_camera;
        let options = json!({
            "container": container,
            "style": config.style_url,
            "center": [camera.center.lng, camera.center.lat],
            "zoom": camera.zoom,
            "bearing": camera.bearing,
            "pitch": camera.pitch,
            "interactive": interactive,
            "attributionControl": interactive,
        });
        Self {
            map: mapbox::Map::new(&to_js(&options)),
        }
    }

    /// Zoom and compass buttons
    fn add_navigation_control(&self) {
        self.map
            .add_control(&mapbox::NavigationControl::new(), constants::NAVIGATION_CONTROL_POSITION);
    }

    fn on(&self, event: &str, handler: impl FnMut(JsValue) + 'static) {
        let closure = Closure::<dyn FnMut(JsValue)>::new(handler);
        self.map.on(event, closure.as_ref().unchecked_ref());
        // listeners live as long as the page
        closure.forget();
    }
}

impl MapEngine for WebEngine {
    fn camera(&self) -> Camera {
        let center = self.map.get_center();
        Camera {
            center: LngLat::new(
                get(&center, "lng").as_f64().unwrap_or_default(),
                get(&center, "lat").as_f64().unwrap_or_default(),
            ),
            zoom: self.map.get_zoom(),
            bearing: self.map.get_bearing(),
            pitch: self.map.get_pitch(),
        }
    }

    fn jump_to(&mut self, camera: &Camera) {
        let options = json!({
            "center": [camera.center.lng, camera.center.lat],
            "zoom": camera.zoom,
            "bearing": camera.bearing,
            "pitch": camera.pitch,
        });
        self.map.jump_to(&to_js(&options));
    }

    fn fit_bounds(&mut self, bounds: &Bounds, padding: f64) {
        let corners = json!([[bounds.sw.lng, bounds.sw.lat], [bounds.ne.lng, bounds.ne.lat]]);
        self.map
            .fit_bounds(&to_js(&corners), &to_js(&json!({ "padding": padding, "animate": false })));
    }

    fn add_source(&mut self, source: &SourceSpec) -> Result<(), EngineError> {
        let spec = serde_json::to_value(source).map_err(|e| EngineError::Js(e.to_string()))?;
        self.map.add_source(&source.id, &to_js(&spec)).map_err(js_error)
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), EngineError> {
        self.map.add_layer(&to_js(&layer.to_json())).map_err(js_error)
    }

    fn layers(&self) -> Vec<LayerInfo> {
        let style = from_js(&self.map.get_style());
        let Some(layers) = style.get("layers").and_then(Value::as_array) else {
            return Vec::new();
        };
        layers
            .iter()
            .filter_map(|layer| {
                Some(LayerInfo {
                    id: layer.get("id")?.as_str()?.to_string(),
                    kind: LayerKind::from_type(layer.get("type")?.as_str()?),
                })
            })
            .collect()
    }

    fn set_paint_property(
        &mut self,
        layer: &str,
        property: &str,
        value: Value,
    ) -> Result<(), EngineError> {
        if self.map.get_layer(layer).is_undefined() {
            return Err(EngineError::UnknownLayer(layer.to_string()));
        }
        self.map
            .set_paint_property(layer, property, &to_js(&value))
            .map_err(js_error)
    }

    fn set_feature_state(
        &mut self,
        source: &str,
        feature_id: &Value,
        state: Map<String, Value>,
    ) -> Result<(), EngineError> {
        let feature = json!({ "source": source, "id": feature_id });
        self.map
            .set_feature_state(&to_js(&feature), &to_js(&Value::Object(state)))
            .map_err(js_error)
    }

    fn query_rendered_features(&self, point: ScreenPoint, layers: &[&str]) -> Vec<RenderedFeature> {
        // the engine throws on ids missing from the style
        let present: Vec<&str> = layers
            .iter()
            .copied()
            .filter(|id| !self.map.get_layer(id).is_undefined())
            .collect();
        if present.is_empty() {
            return Vec::new();
        }

        let hits = self.map.query_rendered_features(
            &to_js(&json!([point.x, point.y])),
            &to_js(&json!({ "layers": present })),
        );
        hits.iter()
            .filter_map(|hit| {
                let layer = get(&get(&hit, "layer"), "id").as_string()?;
                let source = get(&hit, "source").as_string().unwrap_or_default();
                let id = match from_js(&get(&hit, "id")) {
                    Value::Null => None,
                    id => Some(id),
                };
                let properties = match from_js(&get(&hit, "properties")) {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                Some(RenderedFeature {
                    layer,
                    source,
                    id,
                    properties,
                })
            })
            .collect()
    }

    fn resize(&mut self) {
        self.map.resize();
    }
}

/// Page elements driven by the controller
pub struct DomUi {
    primary_map: HtmlElement,
    lens: HtmlElement,
    overview_toggle: Option<HtmlElement>,
    probe_toggle: Option<HtmlElement>,
    overview_panel: Option<HtmlElement>,
    probe_panel: Option<HtmlElement>,
    overview_controls: Option<HtmlElement>,
    tooltip: Option<HtmlElement>,
    tract_details: Option<HtmlElement>,
}

fn element(document: &Document, id: &str) -> Option<HtmlElement> {
    document
        .get_element_by_id(id)
        .and_then(|e| e.dyn_into::<HtmlElement>().ok())
}

fn required(document: &Document, id: &str) -> Result<HtmlElement, JsValue> {
    element(document, id).ok_or_else(|| JsValue::from_str(&format!("Missing element #{}", id)))
}

fn warn_on_err<T>(result: Result<T, JsValue>, action: &str, el: &HtmlElement) {
    if let Err(e) = result {
        log::warn!("Could not {} on #{}: {:?}", action, el.id(), e);
    }
}

fn set_style(el: &HtmlElement, property: &str, value: &str) {
    warn_on_err(el.style().set_property(property, value), &format!("set {}", property), el);
}

fn set_shown(el: &HtmlElement, visible: bool) {
    set_style(el, "display", if visible { "" } else { "none" });
}

impl DomUi {
    fn new(document: &Document) -> Result<Self, JsValue> {
        Ok(Self {
            primary_map: required(document, dom_ids::PRIMARY_MAP)?,
            lens: required(document, dom_ids::LENS)?,
            overview_toggle: element(document, dom_ids::OVERVIEW_TOGGLE),
            probe_toggle: element(document, dom_ids::PROBE_TOGGLE),
            overview_panel: element(document, dom_ids::OVERVIEW_PANEL),
            probe_panel: element(document, dom_ids::PROBE_PANEL),
            overview_controls: element(document, dom_ids::OVERVIEW_CONTROLS),
            tooltip: element(document, dom_ids::TOOLTIP),
            tract_details: element(document, dom_ids::TRACT_DETAILS),
        })
    }
}

impl ProbeUi for DomUi {
    fn set_active_toggle(&mut self, mode: Mode) {
        for (toggle, active) in [
            (&self.overview_toggle, mode == Mode::Overview),
            (&self.probe_toggle, mode == Mode::Probe),
        ] {
            if let Some(toggle) = toggle {
                warn_on_err(
                    toggle.class_list().toggle_with_force("active", active),
                    "toggle class 'active'",
                    toggle,
                );
                warn_on_err(
                    toggle.set_attribute("aria-pressed", if active { "true" } else { "false" }),
                    "set aria-pressed",
                    toggle,
                );
            }
        }
    }

    fn set_panel_visible(&mut self, panel: Panel, visible: bool) {
        let el = match panel {
            Panel::Overview => &self.overview_panel,
            Panel::Probe => &self.probe_panel,
            Panel::OverviewControls => &self.overview_controls,
        };
        if let Some(el) = el {
            set_shown(el, visible);
        }
    }

    fn place_lens_overlay(&mut self, center: ScreenPoint, radius: f64) {
        set_style(&self.lens, "left", &format!("{}px", center.x - radius));
        set_style(&self.lens, "top", &format!("{}px", center.y - radius));
        set_style(&self.lens, "width", &format!("{}px", radius * 2.0));
        set_style(&self.lens, "height", &format!("{}px", radius * 2.0));
    }

    fn set_lens_overlay_visible(&mut self, visible: bool) {
        set_style(&self.lens, "display", if visible { "block" } else { "none" });
    }

    fn set_primary_clip(&mut self, clip: Option<ClipCircle>) {
        let style = self.primary_map.style();
        match clip {
            Some(clip) => {
                let css = clip.to_css();
                set_style(&self.primary_map, "clip-path", &css);
                set_style(&self.primary_map, "-webkit-clip-path", &css);
            }
            None => {
                for property in ["clip-path", "-webkit-clip-path"] {
                    warn_on_err(
                        style.remove_property(property),
                        &format!("remove {}", property),
                        &self.primary_map,
                    );
                }
            }
        }
    }

    fn show_tooltip(&mut self, tooltip: &Tooltip) {
        let Some(el) = &self.tooltip else { return };
        el.set_inner_html(&tooltip.to_html());
        set_style(el, "left", &format!("{}px", tooltip.position.x));
        set_style(el, "top", &format!("{}px", tooltip.position.y));
        set_style(el, "display", "block");
    }

    fn hide_tooltip(&mut self) {
        if let Some(el) = &self.tooltip {
            set_style(el, "display", "none");
        }
    }

    fn show_tract_details(&mut self, details: Option<&TractDetails>) {
        let Some(el) = &self.tract_details else { return };
        match details {
            Some(details) => {
                let mut html = format!("<strong>Tract {}</strong>", escape_html(&details.geoid));
                for (label, value) in details.rows() {
                    html.push_str(&format!("<br>{}: {}", label, value));
                }
                el.set_inner_html(&html);
                set_shown(el, true);
            }
            None => {
                el.set_inner_html("");
                set_shown(el, false);
            }
        }
    }
}

type WebSession = LensController<WebEngine, DomUi>;

thread_local! {
    static SESSION: SessionCell<WebSession> = const { SessionCell::new() };
}

/// Run `f` on the live session. Engine calls made by a handler can fire
/// further engine events synchronously; those nested events are dropped.
fn with_session(f: impl FnOnce(&mut WebSession)) {
    SESSION.with(|cell| cell.with(f));
}

fn container_rect(el: &HtmlElement) -> ContainerRect {
    let rect = el.get_bounding_client_rect();
    ContainerRect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

fn event_point(event: &JsValue) -> ScreenPoint {
    let point = get(event, "point");
    ScreenPoint::new(
        get(&point, "x").as_f64().unwrap_or_default(),
        get(&point, "y").as_f64().unwrap_or_default(),
    )
}

fn listen<E: JsCast + 'static>(target: &web_sys::EventTarget, event: &str, mut handler: impl FnMut(E) + 'static) {
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |e: web_sys::Event| {
        if let Ok(e) = e.dyn_into::<E>() {
            handler(e);
        }
    });
    if let Err(e) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
        log::warn!("Could not listen for '{}': {:?}", event, e);
    }
    closure.forget();
}

/// Switch between overview and probe mode (called from JavaScript)
#[wasm_bindgen]
pub fn set_probe_mode(enabled: bool) {
    with_session(|s| s.set_probe_mode(enabled));
}

/// Change the lens radius in pixels (called from JavaScript).
/// Returns the clamped radius in use, or NaN when nothing was applied.
#[wasm_bindgen]
pub fn set_lens_radius(radius: f64) -> f64 {
    SESSION
        .with(|cell| cell.with(|s| s.set_lens_radius(radius)))
        .unwrap_or(f64::NAN)
}

/// Build both map viewports, the DOM bindings and all event wiring.
/// This function is exported to JavaScript and is called once per page.
#[wasm_bindgen]
pub fn start(access_token: &str) -> Result<(), JsValue> {
    // Set up panic hook and logger only once (ignore errors if already initialized)
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        let _ = console_log::init_with_level(log::Level::Info);
    });

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("No document"))?;

    let mapboxgl = get(&js_sys::global(), "mapboxgl");
    if mapboxgl.is_undefined() {
        return Err(JsValue::from_str("mapboxgl is not loaded"));
    }
    js_sys::Reflect::set(&mapboxgl, &JsValue::from_str("accessToken"), &JsValue::from_str(access_token))?;

    let container = required(&document, dom_ids::CONTAINER)?;
    let rect = container_rect(&container);

    let config = Config {
        fit_bounds: Some(constants::NYC_BOUNDS),
        width: rect.width.max(1.0) as u32,
        height: rect.height.max(1.0) as u32,
        ..Config::default()
    };

    if let Err(errors) = config.validate() {
        let error_msg = format!("Configuration validation failed:\n• {}", errors.join("\n• "));
        log::error!("{}", error_msg);
        return Err(JsValue::from_str(&error_msg));
    }

    let primary = WebEngine::create(dom_ids::PRIMARY_MAP, &config, true);
    let secondary = WebEngine::create(dom_ids::SECONDARY_MAP, &config, false);
    let ui = DomUi::new(&document)?;
    primary.add_navigation_control();

    // Register before handing the engines to the session; none can fire
    // until control returns to the browser.
    primary.on("load", |_| with_session(|s| s.on_style_loaded(ViewportRole::Primary)));
    secondary.on("load", |_| with_session(|s| s.on_style_loaded(ViewportRole::Secondary)));
    primary.on("move", |_| with_session(|s| s.on_primary_camera_changed()));
    primary.on("mousemove", |e| with_session(|s| s.on_hover(event_point(&e))));
    primary.on("mouseout", |_| with_session(|s| s.on_hover_out()));
    primary.on("click", |e| with_session(|s| s.on_click(event_point(&e))));

    let session = LensController::new(primary, secondary, ui, config, StyleTable::nyc());
    SESSION.with(|cell| cell.install(session));

    let target: &web_sys::EventTarget = container.as_ref();
    let container_for_move = container.clone();
    listen(target, "mousemove", move |e: MouseEvent| {
        let client = ScreenPoint::new(f64::from(e.client_x()), f64::from(e.client_y()));
        let rect = container_rect(&container_for_move);
        with_session(|s| s.on_pointer_move(client, rect));
    });
    listen(target, "mouseenter", |_: MouseEvent| {
        with_session(|s| s.on_pointer_enter_container())
    });
    listen(target, "mouseleave", |_: MouseEvent| {
        with_session(|s| s.on_pointer_leave_container())
    });

    for (id, enabled) in [(dom_ids::OVERVIEW_TOGGLE, false), (dom_ids::PROBE_TOGGLE, true)] {
        if let Some(button) = element(&document, id) {
            listen(button.as_ref(), "click", move |_: web_sys::Event| {
                with_session(|s| s.set_probe_mode(enabled))
            });
        }
    }

    if let Some(slider) = document
        .get_element_by_id(dom_ids::RADIUS_SLIDER)
        .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
    {
        slider.set_value(&constants::DEFAULT_LENS_RADIUS.to_string());
        let input = slider.clone();
        listen(slider.as_ref(), "input", move |_: web_sys::Event| {
            if let Ok(radius) = input.value().parse::<f64>() {
                with_session(|s| {
                    s.set_lens_radius(radius);
                });
            }
        });
    }

    let container_for_resize = container.clone();
    listen(window.as_ref(), "resize", move |_: web_sys::Event| {
        let rect = container_rect(&container_for_resize);
        with_session(|s| s.on_container_resize(rect));
    });

    log::info!("NYC probe lens started");
    Ok(())
}
