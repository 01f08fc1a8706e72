// Shared library code for both desktop and web versions

pub mod camera;
pub mod controller;
pub mod engine;
pub mod headless;
pub mod lens;
pub mod mute;
pub mod readiness;
pub mod script;
pub mod session;
pub mod style;
pub mod tooltip;
pub mod ui;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use camera::{Bounds, Camera, ContainerRect, LngLat, ScreenPoint};
pub use controller::LensController;
pub use engine::{EngineError, MapEngine, ViewportRole};
pub use lens::{ClipCircle, LensState, Mode};
pub use mute::MuteOpacities;
pub use ui::{Panel, ProbeUi};

/// Global constants that can be tuned
pub mod constants {
    use crate::camera::{Bounds, LngLat};

    /// Default basemap style
    pub const DEFAULT_STYLE_URL: &str = "mapbox://styles/mapbox/light-v11";

    /// Default camera, centered to cover Manhattan, Queens and the Bronx
    pub const DEFAULT_CENTER: LngLat = LngLat::new(-73.935242, 40.730610);
    pub const DEFAULT_ZOOM: f64 = 10.5;

    /// Default container dimensions
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_HEIGHT: u32 = 960;

    /// All five boroughs, Staten Island to the Bronx/Queens border
    pub const NYC_BOUNDS: Bounds = Bounds::new(
        LngLat::new(-74.25909, 40.477399),
        LngLat::new(-73.700272, 40.917577),
    );
    pub const NYC_FIT_PADDING: f64 = 40.0;

    /// Lens radius in pixels
    pub const DEFAULT_LENS_RADIUS: f64 = 120.0;
    pub const MIN_LENS_RADIUS: f64 = 40.0;
    pub const MAX_LENS_RADIUS: f64 = 400.0;

    /// Opacity of the muted viewport's layers
    pub const MUTED_FILL_OPACITY: f64 = 0.15;
    pub const MUTED_LINE_OPACITY: f64 = 0.20;

    /// Tolerance when comparing mirrored cameras
    pub const CAMERA_EPSILON: f64 = 1e-9;

    /// Corner of the primary viewport holding the zoom/compass control
    pub const NAVIGATION_CONTROL_POSITION: &str = "top-right";

    /// Tooltip offset from the pointer, both axes
    pub const TOOLTIP_OFFSET: f64 = 20.0;

    /// Engine limits
    pub const TILE_SIZE: f64 = 512.0;
    pub const MIN_ZOOM: f64 = 0.0;
    pub const MAX_ZOOM: f64 = 22.0;
    pub const MAX_PITCH: f64 = 85.0;
}

/// Configuration for a lens session
/// This is a plain struct without CLI dependencies, usable from both desktop and web
#[derive(Debug, Clone)]
pub struct Config {
    /// Style source handed to both viewports
    pub style_url: String,

    /// Camera both viewports start with
    pub initial_camera: Camera,

    /// Fit the primary to these bounds at startup
    pub fit_bounds: Option<Bounds>,

    /// Padding in pixels for `fit_bounds`
    pub fit_padding: f64,

    /// Lens radius in pixels
    pub lens_radius: f64,

    /// Container width in pixels
    pub width: u32,

    /// Container height in pixels
    pub height: u32,

    /// Opacities applied to the secondary viewport
    pub mute: MuteOpacities,
}

impl Config {
    /// Validate all configuration parameters
    /// Returns Ok(()) if valid, or Err with a list of validation errors
    pub fn validate(&self) -> Result<(), Vec<String>> {
        use constants::*;

        let mut errors = Vec::new();

        if self.style_url.trim().is_empty() {
            errors.push("style_url cannot be empty".to_string());
        }

        let camera = &self.initial_camera;
        if !(-180.0..=180.0).contains(&camera.center.lng) {
            errors.push(format!("longitude must be within -180..180 (got {})", camera.center.lng));
        }
        if !(-90.0..=90.0).contains(&camera.center.lat) {
            errors.push(format!("latitude must be within -90..90 (got {})", camera.center.lat));
        }
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&camera.zoom) {
            errors.push(format!("zoom must be within {}..{} (got {})", MIN_ZOOM, MAX_ZOOM, camera.zoom));
        }
        if !(0.0..=MAX_PITCH).contains(&camera.pitch) {
            errors.push(format!("pitch must be within 0..{} (got {})", MAX_PITCH, camera.pitch));
        }

        // Container: 1-8192 pixels (canvas size limit)
        if self.width == 0 || self.width > 8192 {
            errors.push(format!("width must be within 1..8192 (got {})", self.width));
        }
        if self.height == 0 || self.height > 8192 {
            errors.push(format!("height must be within 1..8192 (got {})", self.height));
        }

        if !(MIN_LENS_RADIUS..=MAX_LENS_RADIUS).contains(&self.lens_radius) {
            errors.push(format!(
                "lens_radius must be within {}..{} (got {})",
                MIN_LENS_RADIUS, MAX_LENS_RADIUS, self.lens_radius
            ));
        }

        if self.fit_bounds.is_some() {
            let max_padding = f64::from(self.width.min(self.height)) / 2.0;
            if self.fit_padding < 0.0 || self.fit_padding >= max_padding {
                errors.push(format!(
                    "fit_padding must be within 0..{} (got {})",
                    max_padding, self.fit_padding
                ));
            }
        }

        for (name, value) in [
            ("fill", self.mute.fill),
            ("line", self.mute.line),
            ("point", self.mute.point),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("muted {} opacity must be within 0..1 (got {})", name, value));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Shared container rect at the configured size
    pub fn container(&self) -> ContainerRect {
        ContainerRect::sized(f64::from(self.width), f64::from(self.height))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            style_url: constants::DEFAULT_STYLE_URL.to_string(),
            initial_camera: Camera::default(),
            fit_bounds: None,
            fit_padding: constants::NYC_FIT_PADDING,
            lens_radius: constants::DEFAULT_LENS_RADIUS,
            width: constants::DEFAULT_WIDTH,
            height: constants::DEFAULT_HEIGHT,
            mute: MuteOpacities::default(),
        }
    }
}
