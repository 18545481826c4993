//! Validation for geographic coordinates and fly-to bounds.

use crate::error::{ClusterMapError, Result};
use clustermap_types::{Bbox, LngLat};
use thiserror::Error;

/// Why a coordinate cannot become a marker.
///
/// This is a filtering verdict, not an error path: ingestion drops the point
/// and moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedPoint {
    #[error("Longitude must be finite, got: {0}")]
    NonFiniteLongitude(f64),
    #[error("Latitude must be finite, got: {0}")]
    NonFiniteLatitude(f64),
    #[error("Longitude out of range [-180.0, 180.0]: {0}")]
    LongitudeOutOfRange(f64),
    #[error("Latitude out of range [-90.0, 90.0]: {0}")]
    LatitudeOutOfRange(f64),
    #[error("Missing coordinate")]
    Missing,
}

/// Validates a coordinate has finite, in-range longitude and latitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use clustermap::compute::validation::validate_coordinate;
/// use clustermap::LngLat;
///
/// assert!(validate_coordinate(&LngLat::new(-74.0060, 40.7128)).is_ok());
/// assert!(validate_coordinate(&LngLat::new(200.0, 40.0)).is_err());
/// assert!(validate_coordinate(&LngLat::new(-74.0, f64::NAN)).is_err());
/// ```
pub fn validate_coordinate(coordinate: &LngLat) -> std::result::Result<(), MalformedPoint> {
    let LngLat { lng, lat } = *coordinate;

    if !lng.is_finite() {
        return Err(MalformedPoint::NonFiniteLongitude(lng));
    }

    if !lat.is_finite() {
        return Err(MalformedPoint::NonFiniteLatitude(lat));
    }

    if !(-180.0..=180.0).contains(&lng) {
        return Err(MalformedPoint::LongitudeOutOfRange(lng));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(MalformedPoint::LatitudeOutOfRange(lat));
    }

    Ok(())
}

/// Validates the bounding box of a fly request.
///
/// The box must be finite with `west < east` and `south < north`; latitudes
/// must lie within [-90, 90].
pub fn validate_fly_bounds(bbox: &Bbox) -> Result<()> {
    bbox.validate().map_err(ClusterMapError::InvalidBounds)?;

    if bbox.south < -90.0 || bbox.north > 90.0 {
        return Err(ClusterMapError::InvalidBounds(format!(
            "Latitude out of range [-90.0, 90.0]: [{}, {}]",
            bbox.south, bbox.north
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates() {
        assert!(validate_coordinate(&LngLat::new(-0.1278, 51.5074)).is_ok());
        assert!(validate_coordinate(&LngLat::new(139.6917, 35.6895)).is_ok());

        // Edge cases
        assert!(validate_coordinate(&LngLat::new(180.0, 0.0)).is_ok());
        assert!(validate_coordinate(&LngLat::new(-180.0, 0.0)).is_ok());
        assert!(validate_coordinate(&LngLat::new(0.0, 90.0)).is_ok());
        assert!(validate_coordinate(&LngLat::new(0.0, -90.0)).is_ok());
    }

    #[test]
    fn test_malformed_coordinates() {
        assert_eq!(
            validate_coordinate(&LngLat::new(180.1, 40.0)),
            Err(MalformedPoint::LongitudeOutOfRange(180.1))
        );
        assert_eq!(
            validate_coordinate(&LngLat::new(-74.0, -95.0)),
            Err(MalformedPoint::LatitudeOutOfRange(-95.0))
        );
        assert!(matches!(
            validate_coordinate(&LngLat::new(f64::NAN, 40.0)),
            Err(MalformedPoint::NonFiniteLongitude(_))
        ));
        assert_eq!(
            validate_coordinate(&LngLat::new(-74.0, f64::INFINITY)),
            Err(MalformedPoint::NonFiniteLatitude(f64::INFINITY))
        );
    }

    #[test]
    fn test_fly_bounds() {
        assert!(validate_fly_bounds(&Bbox::new(-10.0, -10.0, 10.0, 10.0)).is_ok());

        let inverted = validate_fly_bounds(&Bbox::new(10.0, -10.0, -10.0, 10.0));
        assert!(matches!(inverted, Err(ClusterMapError::InvalidBounds(_))));

        let flat = validate_fly_bounds(&Bbox::new(-10.0, 5.0, 10.0, 5.0));
        assert!(matches!(flat, Err(ClusterMapError::InvalidBounds(_))));

        let polar = validate_fly_bounds(&Bbox::new(-10.0, -10.0, 10.0, 95.0));
        assert!(matches!(polar, Err(ClusterMapError::InvalidBounds(_))));
    }
}
