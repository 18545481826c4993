use geo::Point;
use serde::{Deserialize, Serialize};

/// Open property bag carried by a point (category, title, flags, ...).
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// A geographic coordinate in degrees.
///
/// # Examples
///
/// ```
/// use clustermap_types::point::LngLat;
///
/// let nairobi = LngLat::new(36.8219, -1.2921);
/// assert!(nairobi.is_finite());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    /// Longitude in degrees
    pub lng: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// True when neither component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    /// Convert to a `geo::Point` (x = longitude, y = latitude).
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

impl From<Point<f64>> for LngLat {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.x(), point.y())
    }
}

impl From<LngLat> for Point<f64> {
    fn from(value: LngLat) -> Self {
        value.to_point()
    }
}

impl From<(f64, f64)> for LngLat {
    fn from((lng, lat): (f64, f64)) -> Self {
        Self::new(lng, lat)
    }
}

/// A single story marker as delivered by the content layer.
///
/// Point features are values: once built they are never mutated. A change in
/// upstream content produces a new feature with the same id, and two features
/// compare equal only when id, coordinate and properties all match.
///
/// # Examples
///
/// ```
/// use clustermap_types::point::{LngLat, PointFeature};
///
/// let a = PointFeature::new(1, LngLat::new(10.0, 20.0)).with_property("category", "water");
/// let b = PointFeature::new(1, LngLat::new(10.0, 20.0)).with_property("category", "water");
/// assert_eq!(a, b);
///
/// let moved = PointFeature::new(1, LngLat::new(10.5, 20.0)).with_property("category", "water");
/// assert_ne!(a, moved);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFeature {
    id: u64,
    coordinate: LngLat,
    #[serde(default)]
    properties: Properties,
}

impl PointFeature {
    /// Create a feature with an empty property bag.
    pub fn new(id: u64, coordinate: LngLat) -> Self {
        Self {
            id,
            coordinate,
            properties: Properties::new(),
        }
    }

    /// Replace the whole property bag.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Add or overwrite a single property.
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn coordinate(&self) -> LngLat {
        self.coordinate
    }

    pub fn lng(&self) -> f64 {
        self.coordinate.lng
    }

    pub fn lat(&self) -> f64 {
        self.coordinate.lat
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Look up a property by name.
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }
}
