//! Configuration for the clustering index and the viewport controller.
//!
//! Every tuning constant (cluster radius, zoom range, debounce window, default
//! fly duration) is a field with a serde default, so a partial JSON or TOML
//! document only needs to name what it overrides.
//!
//! # Example
//!
//! ```rust
//! use clustermap::Config;
//!
//! let json = r#"{
//!     "index": { "radius": 16.0, "max_zoom": 14 },
//!     "viewport": { "debounce_ms": 100 }
//! }"#;
//! let config = Config::from_json(json).unwrap();
//! assert_eq!(config.index.radius, 16.0);
//! assert_eq!(config.index.min_zoom, 0);
//! assert_eq!(config.viewport.default_fly_duration_ms, 1000);
//! ```
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Highest zoom the index supports; deeper levels lose f64 precision in
/// screen-space distances.
pub const MAX_SUPPORTED_ZOOM: u8 = 30;

/// Parameters of one index build. Changing any field invalidates a cached index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpatialIndexConfig {
    /// Cluster radius in pixels at the tile extent below
    #[serde(default = "SpatialIndexConfig::default_radius")]
    pub radius: f64,

    /// Coarsest zoom level that gets its own cluster level
    #[serde(default)]
    pub min_zoom: u8,

    /// Zoom at which every point is its own leaf
    #[serde(default = "SpatialIndexConfig::default_max_zoom")]
    pub max_zoom: u8,

    /// Tile extent in pixels the radius is measured against
    #[serde(default = "SpatialIndexConfig::default_extent")]
    pub extent: u32,

    /// Minimum number of points needed to form a cluster
    #[serde(default = "SpatialIndexConfig::default_min_points")]
    pub min_points: usize,
}

impl SpatialIndexConfig {
    const fn default_radius() -> f64 {
        40.0
    }

    const fn default_max_zoom() -> u8 {
        16
    }

    const fn default_extent() -> u32 {
        256
    }

    const fn default_min_points() -> usize {
        2
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_extent(mut self, extent: u32) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(format!(
                "Cluster radius must be positive and finite, got: {}",
                self.radius
            ));
        }

        if self.min_zoom > self.max_zoom {
            return Err(format!(
                "min_zoom ({}) must not exceed max_zoom ({})",
                self.min_zoom, self.max_zoom
            ));
        }

        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(format!(
                "max_zoom must be at most {}, got: {}",
                MAX_SUPPORTED_ZOOM, self.max_zoom
            ));
        }

        if self.extent == 0 {
            return Err("Tile extent must be greater than zero".to_string());
        }

        if self.min_points < 2 {
            return Err(format!(
                "min_points must be at least 2, got: {}",
                self.min_points
            ));
        }

        Ok(())
    }
}

impl Default for SpatialIndexConfig {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            min_zoom: 0,
            max_zoom: Self::default_max_zoom(),
            extent: Self::default_extent(),
            min_points: Self::default_min_points(),
        }
    }
}

/// Map interactions the controller can switch off while it owns the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionFlags {
    #[serde(default = "InteractionFlags::enabled")]
    pub drag_pan: bool,
    #[serde(default = "InteractionFlags::enabled")]
    pub drag_rotate: bool,
    #[serde(default = "InteractionFlags::enabled")]
    pub scroll_zoom: bool,
    #[serde(default = "InteractionFlags::enabled")]
    pub double_click_zoom: bool,
}

impl InteractionFlags {
    const fn enabled() -> bool {
        true
    }

    pub const fn all_disabled() -> Self {
        Self {
            drag_pan: false,
            drag_rotate: false,
            scroll_zoom: false,
            double_click_zoom: false,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.drag_pan || self.drag_rotate || self.scroll_zoom || self.double_click_zoom
    }
}

impl Default for InteractionFlags {
    fn default() -> Self {
        Self {
            drag_pan: true,
            drag_rotate: true,
            scroll_zoom: true,
            double_click_zoom: true,
        }
    }
}

/// Axis pinned during user moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstrainedAxis {
    /// Longitude stays fixed; only latitude follows the pointer
    X,
    /// Latitude stays fixed; only longitude follows the pointer
    Y,
}

/// Viewport controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewportConfig {
    /// Quiet period before a raw viewport update is published
    #[serde(default = "ViewportConfig::default_debounce_ms")]
    pub debounce_ms: u64,

    /// Fly duration used when a request does not carry one
    #[serde(default = "ViewportConfig::default_fly_duration_ms")]
    pub default_fly_duration_ms: u64,

    #[serde(default = "ViewportConfig::default_min_zoom")]
    pub min_zoom: f64,

    #[serde(default = "ViewportConfig::default_max_zoom")]
    pub max_zoom: f64,

    /// Rendered size of one world tile at zoom 0, in pixels
    #[serde(default = "ViewportConfig::default_tile_size")]
    pub tile_size: f64,

    /// Interactions enabled while the controller is not flying
    #[serde(default)]
    pub interaction: InteractionFlags,

    #[serde(default)]
    pub constrained_axis: Option<ConstrainedAxis>,
}

impl ViewportConfig {
    const fn default_debounce_ms() -> u64 {
        250
    }

    const fn default_fly_duration_ms() -> u64 {
        1000
    }

    const fn default_min_zoom() -> f64 {
        1.0
    }

    const fn default_max_zoom() -> f64 {
        14.0
    }

    const fn default_tile_size() -> f64 {
        512.0
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn default_fly_duration(&self) -> Duration {
        Duration::from_millis(self.default_fly_duration_ms)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    pub fn with_default_fly_duration(mut self, duration: Duration) -> Self {
        self.default_fly_duration_ms = duration.as_millis() as u64;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_interaction(mut self, interaction: InteractionFlags) -> Self {
        self.interaction = interaction;
        self
    }

    pub fn with_constrained_axis(mut self, axis: ConstrainedAxis) -> Self {
        self.constrained_axis = Some(axis);
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !self.min_zoom.is_finite() || !self.max_zoom.is_finite() {
            return Err("Viewport zoom range must be finite".to_string());
        }

        if self.min_zoom < 0.0 {
            return Err(format!("min_zoom must not be negative, got: {}", self.min_zoom));
        }

        if self.min_zoom > self.max_zoom {
            return Err(format!(
                "min_zoom ({}) must not exceed max_zoom ({})",
                self.min_zoom, self.max_zoom
            ));
        }

        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(format!(
                "Tile size must be positive and finite, got: {}",
                self.tile_size
            ));
        }

        Ok(())
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            debounce_ms: Self::default_debounce_ms(),
            default_fly_duration_ms: Self::default_fly_duration_ms(),
            min_zoom: Self::default_min_zoom(),
            max_zoom: Self::default_max_zoom(),
            tile_size: Self::default_tile_size(),
            interaction: InteractionFlags::default(),
            constrained_axis: None,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub index: SpatialIndexConfig,

    #[serde(default)]
    pub viewport: ViewportConfig,
}

impl Config {
    pub fn with_index(mut self, index: SpatialIndexConfig) -> Self {
        self.index = index;
        self
    }

    pub fn with_viewport(mut self, viewport: ViewportConfig) -> Self {
        self.viewport = viewport;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        self.index.validate()?;
        self.viewport.validate()
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
