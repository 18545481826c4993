//! Camera state, partial updates and controller events.

use crate::compute::projection::{MAX_LATITUDE, visible_bounds, wrap_lng};
use clustermap_types::{Bbox, LngLat};
use serde::{Deserialize, Serialize};

/// Screen-space insets in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Padding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Padding {
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            bottom: value,
            left: value,
            right: value,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Full camera state of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub center: LngLat,
    pub zoom: f64,
    /// Rotation in degrees clockwise from north
    pub bearing: f64,
    /// Tilt in degrees away from straight down
    pub pitch: f64,
    #[serde(default)]
    pub padding: Option<Padding>,
    /// Region the center is kept inside
    #[serde(default)]
    pub max_bounds: Option<Bbox>,
    /// Canvas width in pixels
    pub width: f64,
    /// Canvas height in pixels
    pub height: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            center: LngLat::new(0.0, 0.0),
            zoom: 2.0,
            bearing: 0.0,
            pitch: 0.0,
            padding: None,
            max_bounds: None,
            width: 1024.0,
            height: 768.0,
        }
    }
}

impl ViewportState {
    pub fn with_center(mut self, center: LngLat) -> Self {
        self.center = center;
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn with_max_bounds(mut self, bounds: Bbox) -> Self {
        self.max_bounds = Some(bounds);
        self
    }

    /// Zoom rounded to the nearest integer, as the clustering index uses it.
    pub fn zoom_int(&self) -> i32 {
        self.zoom.round() as i32
    }

    /// Geographic bounds currently on screen.
    pub fn bounds(&self, tile_size: f64) -> Bbox {
        visible_bounds(self.center, self.zoom, self.width, self.height, tile_size)
    }

    /// Keep the center on the Mercator square and inside `max_bounds`.
    pub(crate) fn clamp_center(&mut self) {
        let mut lng = wrap_lng(self.center.lng);
        if self.center.lng == 180.0 {
            lng = 180.0;
        }
        let mut lat = self.center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

        // Inverted or NaN edges leave that axis unconstrained
        if let Some(bounds) = self.max_bounds {
            if bounds.south <= bounds.north {
                lat = lat.clamp(bounds.south, bounds.north);
            }
            if bounds.west <= bounds.east {
                lng = lng.clamp(bounds.west, bounds.east);
            }
        }

        self.center = LngLat::new(lng, lat);
    }
}

/// Check a camera constraint box. Unlike [`Bbox::validate`], `west > east`
/// is accepted as a box wrapping across the antimeridian.
pub(crate) fn validate_max_bounds(bounds: &Bbox) -> Result<(), String> {
    let unwrapped = if bounds.crosses_antimeridian() {
        Bbox::new(bounds.west, bounds.south, bounds.east + 360.0, bounds.north)
    } else {
        *bounds
    };
    unwrapped
        .validate()
        .map_err(|e| format!("Invalid max bounds: {}", e))
}

/// Partial camera change produced by one user interaction frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportUpdate {
    pub center: Option<LngLat>,
    pub zoom: Option<f64>,
    pub bearing: Option<f64>,
    pub pitch: Option<f64>,
}

impl ViewportUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(mut self, center: LngLat) -> Self {
        self.center = Some(center);
        self
    }

    pub fn zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    pub fn pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    /// True when no field carries a finite value.
    pub fn is_empty(&self) -> bool {
        self.center.is_none_or(|c| !c.is_finite())
            && self.zoom.is_none_or(|v| !v.is_finite())
            && self.bearing.is_none_or(|v| !v.is_finite())
            && self.pitch.is_none_or(|v| !v.is_finite())
    }
}

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportPhase {
    Idle,
    UserInteracting,
    Flying,
}

/// Something downstream consumers should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    /// A settled viewport, after the debounce window or at the end of a flight
    Published(ViewportState),
    /// The flight with this id reached its target
    FlyFinished { request_id: u64 },
}
