use crate::point::LngLat;
use geo::Rect;
use serde::{Deserialize, Serialize};

/// A geographic bounding box in `[west, south, east, north]` order.
///
/// Unlike `geo::Rect`, corners are never normalized: a box whose `west` is
/// greater than its `east` crosses the antimeridian.
///
/// # Examples
///
/// ```
/// use clustermap_types::bbox::Bbox;
/// use clustermap_types::point::LngLat;
///
/// let pacific = Bbox::new(170.0, -10.0, -170.0, 10.0);
/// assert!(pacific.crosses_antimeridian());
/// assert!(pacific.contains(LngLat::new(179.0, 0.0)));
/// assert!(!pacific.contains(LngLat::new(0.0, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bbox {
    /// The whole Web-Mercator-representable world.
    pub const WORLD: Bbox = Bbox {
        west: -180.0,
        south: -90.0,
        east: 180.0,
        north: 90.0,
    };

    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub const fn from_array([west, south, east, north]: [f64; 4]) -> Self {
        Self::new(west, south, east, north)
    }

    pub const fn to_array(self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Smallest box containing every coordinate, or `None` for an empty input.
    ///
    /// Non-finite coordinates are skipped.
    pub fn from_coordinates<I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = LngLat>,
    {
        coordinates
            .into_iter()
            .filter(LngLat::is_finite)
            .fold(None, |acc: Option<Bbox>, c| {
                Some(match acc {
                    Some(bbox) => bbox.extend(c),
                    None => Bbox::new(c.lng, c.lat, c.lng, c.lat),
                })
            })
    }

    /// Grow the box to include `coordinate`. Only meaningful for boxes that
    /// do not cross the antimeridian.
    pub fn extend(self, coordinate: LngLat) -> Self {
        Self {
            west: self.west.min(coordinate.lng),
            south: self.south.min(coordinate.lat),
            east: self.east.max(coordinate.lng),
            north: self.north.max(coordinate.lat),
        }
    }

    /// Checks that every edge is finite and the box has positive extent on
    /// both axes (`west < east`, `south < north`).
    pub fn validate(&self) -> Result<(), String> {
        if !self.to_array().iter().all(|v| v.is_finite()) {
            return Err(format!("Bounding box must be finite, got: {:?}", self.to_array()));
        }
        if self.west >= self.east {
            return Err(format!(
                "Bounding box west ({}) must be less than east ({})",
                self.west, self.east
            ));
        }
        if self.south >= self.north {
            return Err(format!(
                "Bounding box south ({}) must be less than north ({})",
                self.south, self.north
            ));
        }
        Ok(())
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn contains(&self, coordinate: LngLat) -> bool {
        let lat_ok = coordinate.lat >= self.south && coordinate.lat <= self.north;
        let lng_ok = if self.crosses_antimeridian() {
            coordinate.lng >= self.west || coordinate.lng <= self.east
        } else {
            coordinate.lng >= self.west && coordinate.lng <= self.east
        };
        lat_ok && lng_ok
    }

    pub fn center(&self) -> LngLat {
        let lng = if self.crosses_antimeridian() {
            let mid = (self.west + self.east + 360.0) / 2.0;
            if mid > 180.0 { mid - 360.0 } else { mid }
        } else {
            (self.west + self.east) / 2.0
        };
        LngLat::new(lng, (self.south + self.north) / 2.0)
    }

    /// Longitudinal span in degrees, accounting for antimeridian crossing.
    pub fn width(&self) -> f64 {
        if self.crosses_antimeridian() {
            self.east + 360.0 - self.west
        } else {
            self.east - self.west
        }
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Convert to a `geo::Rect`; `None` when the box crosses the antimeridian.
    pub fn to_rect(&self) -> Option<Rect> {
        if self.crosses_antimeridian() {
            return None;
        }
        Some(Rect::new(
            geo::coord! { x: self.west, y: self.south },
            geo::coord! { x: self.east, y: self.north },
        ))
    }
}

impl From<Rect> for Bbox {
    fn from(rect: Rect) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

impl From<[f64; 4]> for Bbox {
    fn from(value: [f64; 4]) -> Self {
        Self::from_array(value)
    }
}
