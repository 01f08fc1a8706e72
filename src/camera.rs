use serde::{Deserialize, Serialize};

use crate::constants::CAMERA_EPSILON;

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Map camera shared by both viewports of the lens
///
/// The primary viewport owns the authoritative copy; the secondary only ever
/// receives mirrored values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub center: LngLat,
    pub zoom: f64,
    /// Degrees clockwise from north
    pub bearing: f64,
    /// Degrees away from straight down
    pub pitch: f64,
}

impl Camera {
    pub const fn new(center: LngLat, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            bearing: 0.0,
            pitch: 0.0,
        }
    }

    /// Component-wise comparison within `CAMERA_EPSILON`
    pub fn approx_eq(&self, other: &Camera) -> bool {
        close(self.center.lng, other.center.lng)
            && close(self.center.lat, other.center.lat)
            && close(self.zoom, other.zoom)
            && close(self.bearing, other.bearing)
            && close(self.pitch, other.pitch)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_CENTER, crate::constants::DEFAULT_ZOOM)
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= CAMERA_EPSILON
}

/// Axis-aligned geographic box, south-west and north-east corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub sw: LngLat,
    pub ne: LngLat,
}

impl Bounds {
    pub const fn new(sw: LngLat, ne: LngLat) -> Self {
        Self { sw, ne }
    }

    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.sw.lng + self.ne.lng) / 2.0,
            (self.sw.lat + self.ne.lat) / 2.0,
        )
    }

    pub fn contains(&self, point: LngLat) -> bool {
        point.lng >= self.sw.lng
            && point.lng <= self.ne.lng
            && point.lat >= self.sw.lat
            && point.lat <= self.ne.lat
    }
}

/// Point in container-local pixels (origin at the container's top-left)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box of the shared map container in client pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rect anchored at the client origin
    pub const fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Convert a client-space position to container-local coordinates,
    /// `None` when it falls outside the container
    pub fn to_local(&self, client_x: f64, client_y: f64) -> Option<ScreenPoint> {
        let x = client_x - self.left;
        let y = client_y - self.top;
        if x < 0.0 || y < 0.0 || x > self.width || y > self.height {
            return None;
        }
        Some(ScreenPoint::new(x, y))
    }

    /// Pull a local point back inside the rect
    pub fn clamp(&self, point: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(
            point.x.clamp(0.0, self.width.max(0.0)),
            point.y.clamp(0.0, self.height.max(0.0)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq_tolerates_rounding() {
        let a = Camera::new(LngLat::new(-73.94, 40.70), 10.5);
        let mut b = a;
        b.zoom += 1e-12;
        assert!(a.approx_eq(&b));
        b.bearing = 15.0;
        assert!(!a.approx_eq(&b));
    }

    #[test]
    fn test_to_local_offsets_by_rect_origin() {
        let rect = ContainerRect::new(100.0, 40.0, 800.0, 600.0);
        assert_eq!(rect.to_local(150.0, 90.0), Some(ScreenPoint::new(50.0, 50.0)));
        assert_eq!(rect.to_local(99.0, 90.0), None);
        assert_eq!(rect.to_local(950.0, 90.0), None);
    }

    #[test]
    fn test_clamp_into_rect() {
        let rect = ContainerRect::sized(200.0, 100.0);
        let p = rect.clamp(ScreenPoint::new(250.0, -5.0));
        assert_eq!(p, ScreenPoint::new(200.0, 0.0));
    }

    #[test]
    fn test_nyc_bounds_center() {
        let c = crate::constants::NYC_BOUNDS.center();
        assert!(crate::constants::NYC_BOUNDS.contains(c));
        assert!((c.lng - -73.979681).abs() < 1e-6);
    }
}
