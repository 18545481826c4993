//! Fly-to-bounds requests and the camera path between two views.

use super::state::{Padding, ViewportState};
use crate::compute::projection::{fit_zoom, lat_y, lng_x, project, unproject, world_size};
use crate::config::ViewportConfig;
use clustermap_types::{Bbox, LngLat, PointFeature};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::Duration;

/// Duration of the fit that frames freshly loaded data.
pub const FIT_DATA_DURATION: Duration = Duration::from_millis(500);

/// Half-size in degrees given to a box around a single location so it can be
/// fitted.
const DEGENERATE_BOUNDS_MARGIN: f64 = 1e-4;

/// Progress curve of an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseOut,
    /// Cubic ease-in-out
    #[default]
    EaseInOut,
}

impl Easing {
    /// Map linear progress in `[0, 1]` to eased progress in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlyOptions {
    /// Animation length; the controller default applies when unset
    pub duration: Option<Duration>,
    pub easing: Easing,
    /// Insets the bounds must clear; the viewport padding applies when unset
    pub padding: Option<Padding>,
    /// Pixel shift of the target center
    pub offset: Option<[f64; 2]>,
    /// Upper limit on the target zoom
    pub max_zoom: Option<f64>,
    pub bearing: Option<f64>,
    pub pitch: Option<f64>,
    /// Interpolate zoom directly instead of zooming out along the way
    pub linear: bool,
}

impl FlyOptions {
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn with_offset(mut self, offset: [f64; 2]) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: f64) -> Self {
        self.max_zoom = Some(max_zoom);
        self
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }
}

/// Request to animate the camera until `bbox` fills the padded viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyRequest {
    pub bbox: Bbox,
    pub options: FlyOptions,
}

impl FlyRequest {
    pub fn new(bbox: Bbox) -> Self {
        Self {
            bbox,
            options: FlyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FlyOptions) -> Self {
        self.options = options;
        self
    }

    /// Frame every point of a freshly loaded data set.
    ///
    /// Returns `None` for an empty set. A single location is widened by a
    /// tiny margin so the request stays valid; the zoom cap then decides how
    /// close the camera gets.
    pub fn fit_points(points: &[PointFeature]) -> Option<Self> {
        let bbox = Bbox::from_coordinates(points.iter().map(PointFeature::coordinate))?;
        Some(
            Self::new(widen_degenerate(bbox))
                .with_options(FlyOptions::default().with_duration(FIT_DATA_DURATION)),
        )
    }
}

/// Give a zero-width or zero-height box a small extent.
pub(crate) fn widen_degenerate(mut bbox: Bbox) -> Bbox {
    if bbox.west >= bbox.east {
        bbox.west -= DEGENERATE_BOUNDS_MARGIN;
        bbox.east += DEGENERATE_BOUNDS_MARGIN;
    }
    if bbox.south >= bbox.north {
        bbox.south -= DEGENERATE_BOUNDS_MARGIN;
        bbox.north += DEGENERATE_BOUNDS_MARGIN;
    }
    bbox
}

/// The animated part of a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Camera {
    pub center: LngLat,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
}

impl Camera {
    pub fn of(state: &ViewportState) -> Self {
        Self {
            center: state.center,
            zoom: state.zoom,
            bearing: state.bearing,
            pitch: state.pitch,
        }
    }

    pub fn apply_to(&self, state: &mut ViewportState) {
        state.center = self.center;
        state.zoom = self.zoom;
        state.bearing = self.bearing;
        state.pitch = self.pitch;
    }
}

/// Camera that frames `request.bbox` inside the padded `viewport`.
///
/// The bbox must already be validated.
pub(crate) fn target_camera(
    request: &FlyRequest,
    viewport: &ViewportState,
    config: &ViewportConfig,
) -> Camera {
    let bbox = &request.bbox;
    let options = &request.options;
    let padding = options.padding.or(viewport.padding).unwrap_or_default();

    let mut width = viewport.width - padding.horizontal();
    let mut height = viewport.height - padding.vertical();
    if width <= 0.0 || height <= 0.0 {
        log::warn!(
            "Padding {:?} leaves no room in a {}x{} viewport, fitting without it",
            padding,
            viewport.width,
            viewport.height
        );
        width = viewport.width;
        height = viewport.height;
    }

    let max_zoom = options
        .max_zoom
        .map_or(config.max_zoom, |cap| cap.min(config.max_zoom));
    let zoom = fit_zoom(bbox, width, height, config.tile_size)
        .unwrap_or(viewport.zoom)
        .clamp(config.min_zoom, max_zoom.max(config.min_zoom));

    // Mercator midpoint, then shift so the box sits in the padded area
    let world = world_size(config.tile_size, zoom);
    let [offset_x, offset_y] = options.offset.unwrap_or([0.0, 0.0]);
    let cx = (lng_x(bbox.west) + lng_x(bbox.east)) / 2.0
        - ((padding.left - padding.right) / 2.0 + offset_x) / world;
    let cy = (lat_y(bbox.north) + lat_y(bbox.south)) / 2.0
        - ((padding.top - padding.bottom) / 2.0 + offset_y) / world;

    Camera {
        center: unproject([cx, cy.clamp(0.0, 1.0)]),
        zoom,
        bearing: options.bearing.unwrap_or(viewport.bearing),
        pitch: options.pitch.unwrap_or(viewport.pitch),
    }
}

/// An animation in progress from one camera to another.
#[derive(Debug, Clone)]
pub(crate) struct Flight {
    pub request_id: u64,
    pub started: Duration,
    pub duration: Duration,
    pub from: Camera,
    pub to: Camera,
    pub easing: Easing,
    /// Lowest zoom passed through mid-flight
    pub apex_zoom: f64,
}

impl Flight {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        request_id: u64,
        started: Duration,
        duration: Duration,
        from: Camera,
        to: Camera,
        options: &FlyOptions,
        viewport: &ViewportState,
        tile_size: f64,
    ) -> Self {
        let low = from.zoom.min(to.zoom);
        let apex_zoom = if options.linear {
            low
        } else {
            low.min(overview_zoom(&from, &to, viewport, tile_size))
        };

        Self {
            request_id,
            started,
            duration,
            from,
            to,
            easing: options.easing,
            apex_zoom,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.started + self.duration
    }

    /// Camera position at `now`.
    pub fn camera_at(&self, now: Duration) -> Camera {
        let elapsed = now.saturating_sub(self.started);
        let t = if self.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f64() / self.duration.as_secs_f64()
        };
        let e = self.easing.apply(t);

        let [x0, y0] = project(self.from.center);
        let [x1, y1] = project(self.to.center);
        let mut dx = x1 - x0;
        // Shortest way around the world
        if dx > 0.5 {
            dx -= 1.0;
        } else if dx < -0.5 {
            dx += 1.0;
        }
        let x = (x0 + dx * e).rem_euclid(1.0);
        let y = y0 + (y1 - y0) * e;

        let linear_zoom = lerp(self.from.zoom, self.to.zoom, e);
        let dip = self.from.zoom.min(self.to.zoom) - self.apex_zoom;
        let zoom = linear_zoom - dip * (PI * e).sin();

        Camera {
            center: unproject([x, y]),
            zoom,
            bearing: lerp_angle(self.from.bearing, self.to.bearing, e),
            pitch: lerp(self.from.pitch, self.to.pitch, e),
        }
    }
}

/// Zoom at which both endpoints fit on screen together.
fn overview_zoom(from: &Camera, to: &Camera, viewport: &ViewportState, tile_size: f64) -> f64 {
    let [x0, y0] = project(from.center);
    let [x1, y1] = project(to.center);
    let dx = (x1 - x0).abs().min(1.0 - (x1 - x0).abs());
    let distance = dx.hypot(y1 - y0);
    if distance <= 0.0 {
        return f64::INFINITY;
    }
    (viewport.width.max(viewport.height) / (distance * tile_size))
        .log2()
        .max(0.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_angle(a: f64, b: f64, t: f64) -> f64 {
    let delta = (b - a + 180.0).rem_euclid(360.0) - 180.0;
    a + delta * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tolerance: f64) {
        assert!((a - b).abs() < tolerance, "{} != {}", a, b);
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseOut, Easing::EaseInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_close(easing.apply(1.0), 1.0, 1e-12);
            assert_close(easing.apply(2.0), 1.0, 1e-12);
        }
        assert_close(Easing::EaseInOut.apply(0.5), 0.5, 1e-12);
    }

    #[test]
    fn test_target_centers_on_bbox() {
        let config = ViewportConfig::default();
        let viewport = ViewportState::default();
        let request = FlyRequest::new(Bbox::new(-10.0, -10.0, 10.0, 10.0));

        let camera = target_camera(&request, &viewport, &config);
        assert_close(camera.center.lng, 0.0, 1e-9);
        assert_close(camera.center.lat, 0.0, 1e-9);

        // The box must fit inside the view at the target zoom
        let shown = visible_bounds_of(&camera, &viewport, &config);
        let slack = 1e-6;
        assert!(shown.west <= -10.0 + slack && shown.east >= 10.0 - slack);
        assert!(shown.south <= -10.0 + slack && shown.north >= 10.0 - slack);
    }

    #[test]
    fn test_target_respects_max_zoom() {
        let config = ViewportConfig::default();
        let viewport = ViewportState::default();
        let tiny = Bbox::new(2.0, 48.0, 2.0001, 48.0001);

        let camera = target_camera(&FlyRequest::new(tiny), &viewport, &config);
        assert_eq!(camera.zoom, config.max_zoom);

        let capped = FlyRequest::new(tiny).with_options(FlyOptions::default().with_max_zoom(9.0));
        assert_eq!(target_camera(&capped, &viewport, &config).zoom, 9.0);
    }

    #[test]
    fn test_padding_lowers_zoom() {
        let config = ViewportConfig::default();
        let viewport = ViewportState::default();
        let bbox = Bbox::new(-10.0, -10.0, 10.0, 10.0);

        let bare = target_camera(&FlyRequest::new(bbox), &viewport, &config);
        let padded = target_camera(
            &FlyRequest::new(bbox).with_options(FlyOptions::default().with_padding(Padding::uniform(100.0))),
            &viewport,
            &config,
        );
        assert!(padded.zoom < bare.zoom);
    }

    #[test]
    fn test_flight_endpoints() {
        let from = Camera {
            center: LngLat::new(0.0, 0.0),
            zoom: 2.0,
            bearing: 350.0,
            pitch: 0.0,
        };
        let to = Camera {
            center: LngLat::new(20.0, 10.0),
            zoom: 6.0,
            bearing: 10.0,
            pitch: 30.0,
        };
        let flight = Flight::new(
            1,
            Duration::from_millis(100),
            Duration::from_millis(400),
            from,
            to,
            &FlyOptions::default(),
            &ViewportState::default(),
            512.0,
        );

        assert_eq!(flight.deadline(), Duration::from_millis(500));
        let start = flight.camera_at(Duration::ZERO);
        assert_close(start.center.lng, 0.0, 1e-9);
        assert_close(start.zoom, 2.0, 1e-9);
        assert_close(start.bearing, 350.0, 1e-9);

        let end = flight.camera_at(Duration::from_millis(500));
        assert_close(end.center.lng, 20.0, 1e-9);
        assert_close(end.center.lat, 10.0, 1e-9);
        assert_close(end.zoom, 6.0, 1e-9);
        assert_close(end.bearing.rem_euclid(360.0), 10.0, 1e-9);

        // Bearing takes the short way through north
        let mid = flight.camera_at(Duration::from_millis(300));
        assert_close(mid.bearing.rem_euclid(360.0), 0.0, 1e-9);
    }

    #[test]
    fn test_non_linear_flight_zooms_out_midway() {
        let from = Camera {
            center: LngLat::new(-60.0, 0.0),
            zoom: 8.0,
            bearing: 0.0,
            pitch: 0.0,
        };
        let to = Camera {
            center: LngLat::new(60.0, 0.0),
            ..from
        };
        let viewport = ViewportState::default();
        let options = FlyOptions::default().with_easing(Easing::Linear);

        let arc = Flight::new(1, Duration::ZERO, Duration::from_secs(1), from, to, &options, &viewport, 512.0);
        let flat = Flight::new(
            2,
            Duration::ZERO,
            Duration::from_secs(1),
            from,
            to,
            &options.clone().linear(true),
            &viewport,
            512.0,
        );

        let half = Duration::from_millis(500);
        assert!(arc.camera_at(half).zoom < 8.0);
        assert_close(flat.camera_at(half).zoom, 8.0, 1e-9);
    }

    #[test]
    fn test_fit_points() {
        assert!(FlyRequest::fit_points(&[]).is_none());

        let single = [PointFeature::new(1, LngLat::new(5.0, 5.0))];
        let request = FlyRequest::fit_points(&single).unwrap();
        assert!(request.bbox.validate().is_ok());
        assert!(request.bbox.contains(LngLat::new(5.0, 5.0)));
        assert_eq!(request.options.duration, Some(FIT_DATA_DURATION));
    }

    fn visible_bounds_of(camera: &Camera, viewport: &ViewportState, config: &ViewportConfig) -> Bbox {
        let mut state = viewport.clone();
        camera.apply_to(&mut state);
        state.bounds(config.tile_size)
    }
}
