//! Camera state machine that turns raw map movement into settled viewports.
//!
//! The controller sits between the map widget and the clustering query. Raw
//! camera frames from user interaction arrive through
//! [`ViewportController::apply_raw_update`] and are coalesced by a debounce
//! window; only when the camera has been quiet for the whole window is the
//! latest value *published*. Programmatic fly-to-bounds animations arrive
//! through [`ViewportController::request_fly`]; while one is running the
//! controller owns the camera, user input is ignored and the map's
//! interaction handlers are reported as disabled.
//!
//! Time never comes from a clock. The event loop passes a monotonic `now` to
//! every call and drives due timers with [`ViewportController::tick`], asking
//! [`ViewportController::next_deadline`] when to call next.
//!
//! ```text
//!            raw update                 debounce fires
//!   Idle ─────────────────> UserInteracting ──────────> Idle (publish)
//!    │  ^                        │
//!    │  │ fly completes          │ request_fly
//!    │  │ (publish)              v
//!    └──┴─────────────────────> Flying ──┐ request_fly restarts
//!          request_fly             ^──────┘
//! ```
//!
//! ```rust
//! use clustermap::viewport::{FlyRequest, ViewportController, ViewportEvent, ViewportPhase};
//! use clustermap::{Bbox, ViewportConfig};
//! use std::time::Duration;
//!
//! let mut controller = ViewportController::with_config(ViewportConfig::default())?;
//! let id = controller.request_fly(FlyRequest::new(Bbox::new(-10.0, -10.0, 10.0, 10.0)), Duration::ZERO)?;
//! assert_eq!(controller.state(), ViewportPhase::Flying);
//!
//! let events = controller.tick(Duration::from_millis(1000));
//! assert!(events.contains(&ViewportEvent::FlyFinished { request_id: id }));
//! assert_eq!(controller.state(), ViewportPhase::Idle);
//! # Ok::<(), clustermap::ClusterMapError>(())
//! ```

mod fly;
mod state;
mod timer;

pub use fly::{Easing, FIT_DATA_DURATION, FlyOptions, FlyRequest};
pub use state::{Padding, ViewportEvent, ViewportPhase, ViewportState, ViewportUpdate};

pub(crate) use fly::widen_degenerate;

use crate::compute::validation::validate_fly_bounds;
use crate::config::{ConstrainedAxis, InteractionFlags, ViewportConfig};
use crate::error::{ClusterMapError, Result};
use clustermap_types::{Bbox, LngLat};
use fly::{Camera, Flight, target_camera};
use state::validate_max_bounds;
use std::time::Duration;
use timer::Timer;

pub struct ViewportController {
    config: ViewportConfig,
    current: ViewportState,
    published: ViewportState,
    phase: ViewportPhase,
    debounce: Timer<()>,
    /// Fires with the id of the flight it belongs to
    fly_timer: Timer<u64>,
    flight: Option<Flight>,
    next_request_id: u64,
}

impl ViewportController {
    /// Create a controller whose current and published viewport start at
    /// `initial`.
    pub fn new(config: ViewportConfig, initial: ViewportState) -> Result<Self> {
        config.validate().map_err(ClusterMapError::Configuration)?;
        if let Some(bounds) = &initial.max_bounds {
            validate_max_bounds(bounds).map_err(ClusterMapError::Configuration)?;
        }

        let mut initial = initial;
        initial.zoom = clamp_zoom(initial.zoom, &config);
        initial.clamp_center();

        Ok(Self {
            config,
            published: initial.clone(),
            current: initial,
            phase: ViewportPhase::Idle,
            debounce: Timer::default(),
            fly_timer: Timer::default(),
            flight: None,
            next_request_id: 1,
        })
    }

    pub fn with_config(config: ViewportConfig) -> Result<Self> {
        Self::new(config, ViewportState::default())
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Apply one frame of user camera movement.
    ///
    /// Ignored while flying. Otherwise the constrained axis, zoom range and
    /// max bounds are enforced, the controller enters `UserInteracting`, and
    /// the debounce window restarts. Returns whether the update was applied.
    pub fn apply_raw_update(&mut self, update: ViewportUpdate, now: Duration) -> bool {
        if self.phase == ViewportPhase::Flying {
            log::debug!("Ignoring viewport update while flying");
            return false;
        }
        if update.is_empty() {
            return false;
        }

        let mut next = self.current.clone();

        if let Some(center) = update.center.filter(LngLat::is_finite) {
            next.center = match self.config.constrained_axis {
                Some(ConstrainedAxis::X) => LngLat::new(self.current.center.lng, center.lat),
                Some(ConstrainedAxis::Y) => LngLat::new(center.lng, self.current.center.lat),
                None => center,
            };
        }
        if let Some(zoom) = update.zoom.filter(|z| z.is_finite()) {
            next.zoom = clamp_zoom(zoom, &self.config);
        }
        if let Some(bearing) = update.bearing.filter(|b| b.is_finite()) {
            next.bearing = bearing.rem_euclid(360.0);
        }
        if let Some(pitch) = update.pitch.filter(|p| p.is_finite()) {
            next.pitch = pitch.clamp(0.0, 85.0);
        }
        next.clamp_center();

        self.current = next;
        self.phase = ViewportPhase::UserInteracting;
        self.debounce.arm(now + self.config.debounce(), ());
        true
    }

    /// Start animating the camera to `request.bbox`, replacing any flight in
    /// progress.
    ///
    /// Malformed bounds are logged and rejected; the controller keeps its
    /// previous state and the error is returned. On success the new flight's
    /// id is returned; only that id will ever be reported as finished.
    pub fn request_fly(&mut self, request: FlyRequest, now: Duration) -> Result<u64> {
        if let Err(e) = validate_fly_bounds(&request.bbox) {
            log::warn!("Ignoring fly request: {}", e);
            return Err(e);
        }

        if let Some(previous) = &self.flight {
            log::debug!(
                "Fly request {} superseded by {}",
                previous.request_id,
                self.next_request_id
            );
            let frame = previous.camera_at(now);
            frame.apply_to(&mut self.current);
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let duration = request
            .options
            .duration
            .unwrap_or_else(|| self.config.default_fly_duration());
        let target = target_camera(&request, &self.current, &self.config);
        let flight = Flight::new(
            request_id,
            now,
            duration,
            Camera::of(&self.current),
            target,
            &request.options,
            &self.current,
            self.config.tile_size,
        );

        if let Some(padding) = request.options.padding {
            self.current.padding = Some(padding);
        }

        self.fly_timer.arm(flight.deadline(), request_id);
        self.debounce.cancel();
        self.flight = Some(flight);
        self.phase = ViewportPhase::Flying;
        Ok(request_id)
    }

    /// Advance to `now`: move the camera along a running flight and fire
    /// whatever timers are due.
    pub fn tick(&mut self, now: Duration) -> Vec<ViewportEvent> {
        let mut events = Vec::new();

        if let Some(request_id) = self.fly_timer.fire(now) {
            if let Some(flight) = self.flight.take() {
                flight.to.apply_to(&mut self.current);
            }
            self.current.clamp_center();
            self.phase = ViewportPhase::Idle;
            self.debounce.cancel();
            self.published = self.current.clone();

            log::debug!("Fly request {} finished", request_id);
            events.push(ViewportEvent::FlyFinished { request_id });
            events.push(ViewportEvent::Published(self.published.clone()));
            return events;
        }

        if let Some(flight) = &self.flight {
            flight.camera_at(now).apply_to(&mut self.current);
        }

        if self.debounce.fire(now).is_some() {
            self.published = self.current.clone();
            if self.phase == ViewportPhase::UserInteracting {
                self.phase = ViewportPhase::Idle;
            }
            events.push(ViewportEvent::Published(self.published.clone()));
        }

        events
    }

    /// Earliest time at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.debounce.deadline(), self.fly_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Live camera, including unpublished user movement and flight frames.
    pub fn current_viewport(&self) -> &ViewportState {
        &self.current
    }

    /// Last settled viewport.
    pub fn published_viewport(&self) -> &ViewportState {
        &self.published
    }

    /// Visible bounds and rounded zoom of the published viewport, the inputs
    /// of a clustering query.
    pub fn bounds_and_zoom_int(&self) -> (Bbox, i32) {
        (
            self.published.bounds(self.config.tile_size),
            self.published.zoom_int(),
        )
    }

    pub fn state(&self) -> ViewportPhase {
        self.phase
    }

    pub fn is_flying(&self) -> bool {
        self.phase == ViewportPhase::Flying
    }

    /// Interaction handlers the map should currently have enabled.
    pub fn interaction(&self) -> InteractionFlags {
        if self.is_flying() {
            InteractionFlags::all_disabled()
        } else {
            self.config.interaction
        }
    }

    /// Resize the canvas. Takes effect on both the live and the published
    /// viewport at once, since a resize is not camera movement.
    pub fn set_size(&mut self, width: f64, height: f64) {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            log::warn!("Ignoring invalid viewport size {}x{}", width, height);
            return;
        }
        self.current.width = width;
        self.current.height = height;
        self.published.width = width;
        self.published.height = height;
    }
}

fn clamp_zoom(zoom: f64, config: &ViewportConfig) -> f64 {
    zoom.clamp(config.min_zoom, config.max_zoom)
}

impl std::fmt::Debug for ViewportController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportController")
            .field("phase", &self.phase)
            .field("current", &self.current)
            .field("published", &self.published)
            .field("flight", &self.flight.as_ref().map(|flight| flight.request_id))
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}
