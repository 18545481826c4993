//! Web-Mercator projection helpers.
//!
//! Longitudes and latitudes are projected onto the unit square: `x` grows
//! eastward from 0 at -180° to 1 at 180°, `y` grows southward from 0 at the
//! northern Mercator limit to 1 at the southern one. At zoom `z` the world is
//! `tile_size * 2^z` pixels wide, so a screen distance of `r` pixels equals
//! `r / (tile_size * 2^z)` in unit-square space.

use clustermap_types::{Bbox, LngLat};
use std::f64::consts::PI;

/// Latitude at which the Mercator square is cut off.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Longitude to unit-square x.
#[inline]
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Latitude to unit-square y, clamped to `[0, 1]`.
#[inline]
pub fn lat_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

#[inline]
pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

#[inline]
pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Project a coordinate to unit-square `[x, y]`.
#[inline]
pub fn project(coordinate: LngLat) -> [f64; 2] {
    [lng_x(coordinate.lng), lat_y(coordinate.lat)]
}

/// Inverse of [`project`].
#[inline]
pub fn unproject([x, y]: [f64; 2]) -> LngLat {
    LngLat::new(x_lng(x), y_lat(y))
}

/// Wrap a longitude into `[-180, 180)`.
pub fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

/// World width in pixels at `zoom`.
#[inline]
pub fn world_size(tile_size: f64, zoom: f64) -> f64 {
    tile_size * 2f64.powf(zoom)
}

/// Largest zoom at which `bbox` fits into a `width` x `height` pixel area.
///
/// Returns `None` when the area has no room left (non-positive size). A
/// degenerate box (zero extent on both axes) fits at any zoom and yields
/// `f64::INFINITY`; callers clamp to their own maximum.
pub fn fit_zoom(bbox: &Bbox, width: f64, height: f64, tile_size: f64) -> Option<f64> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    let dx = bbox.width() / 360.0;
    let dy = (lat_y(bbox.south) - lat_y(bbox.north)).abs();

    let scale_x = if dx > 0.0 {
        width / (dx * tile_size)
    } else {
        f64::INFINITY
    };
    let scale_y = if dy > 0.0 {
        height / (dy * tile_size)
    } else {
        f64::INFINITY
    };

    Some(scale_x.min(scale_y).log2())
}

/// Geographic bounds of a `width` x `height` pixel view centered on `center`.
///
/// Rotation and pitch are ignored. A view wider than the world covers the full
/// longitude range; a view straddling the antimeridian yields `west > east`.
pub fn visible_bounds(
    center: LngLat,
    zoom: f64,
    width: f64,
    height: f64,
    tile_size: f64,
) -> Bbox {
    let world = world_size(tile_size, zoom);
    let [cx, cy] = project(center);
    let half_w = width / 2.0 / world;
    let half_h = height / 2.0 / world;

    let north = y_lat((cy - half_h).max(0.0));
    let south = y_lat((cy + half_h).min(1.0));

    if half_w * 2.0 >= 1.0 {
        return Bbox::new(-180.0, south, 180.0, north);
    }

    let west = x_lng(cx - half_w);
    let east = x_lng(cx + half_w);
    let west = if west < -180.0 { wrap_lng(west) } else { west };
    let east = if east > 180.0 { wrap_lng(east) } else { east };

    Bbox::new(west, south, east, north)
}
