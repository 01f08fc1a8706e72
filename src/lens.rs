use crate::camera::ScreenPoint;
use crate::constants::{DEFAULT_LENS_RADIUS, MAX_LENS_RADIUS, MIN_LENS_RADIUS};

/// Top-level UI mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Lens disabled, overview panel, legend and auxiliary controls visible
    #[default]
    Overview,
    /// Lens follows the pointer, probe panel visible
    Probe,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Overview => f.pad("overview"),
            Mode::Probe => f.pad("probe"),
        }
    }
}

/// Circular reveal region on the primary viewport, container-local pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipCircle {
    pub center: ScreenPoint,
    pub radius: f64,
}

impl ClipCircle {
    /// CSS `clip-path` value
    pub fn to_css(&self) -> String {
        format!(
            "circle({}px at {}px {}px)",
            self.radius, self.center.x, self.center.y
        )
    }

    pub fn contains(&self, point: ScreenPoint) -> bool {
        let dx = point.x - self.center.x;
        let dy = point.y - self.center.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// Probe lens state
#[derive(Debug, Clone, PartialEq)]
pub struct LensState {
    pub enabled: bool,
    /// Last pointer position inside the container, kept across leave/enter
    pub center: Option<ScreenPoint>,
    pub radius: f64,
    pub overlay_visible: bool,
}

impl LensState {
    pub fn new(radius: f64) -> Self {
        Self {
            enabled: false,
            center: None,
            radius: clamp_radius(radius),
            overlay_visible: false,
        }
    }

    /// Clip region for the current center, if the pointer has moved yet
    pub fn clip(&self) -> Option<ClipCircle> {
        self.center.map(|center| ClipCircle {
            center,
            radius: self.radius,
        })
    }

    /// Store a new radius; returns the clamped value actually used
    pub fn set_radius(&mut self, radius: f64) -> f64 {
        self.radius = clamp_radius(radius);
        self.radius
    }
}

impl Default for LensState {
    fn default() -> Self {
        Self::new(DEFAULT_LENS_RADIUS)
    }
}

/// Keep a radius within the supported range; NaN falls back to the default
pub fn clamp_radius(radius: f64) -> f64 {
    if radius.is_nan() {
        return DEFAULT_LENS_RADIUS;
    }
    radius.clamp(MIN_LENS_RADIUS, MAX_LENS_RADIUS)
}
