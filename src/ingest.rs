//! Turning upstream content into point features.
//!
//! Content records come from an external API and their locations are not to
//! be trusted: a story may have no marker yet, or carry a coordinate that was
//! typed in by hand. Anything that cannot be placed on the map is dropped
//! here, with a debug log line, so the index only ever sees valid points.

use crate::compute::validation::{MalformedPoint, validate_coordinate};
use crate::error::Result;
use clustermap_types::{Bbox, LngLat, PointFeature, Properties};
use serde::{Deserialize, Serialize};

/// One item from the content API, as far as the map is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: u64,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub properties: Properties,
}

impl ContentRecord {
    pub fn new(id: u64, lng: Option<f64>, lat: Option<f64>) -> Self {
        Self {
            id,
            lng,
            lat,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Convert to a point feature if the record has a usable location.
    pub fn to_point_feature(&self) -> std::result::Result<PointFeature, MalformedPoint> {
        let (Some(lng), Some(lat)) = (self.lng, self.lat) else {
            return Err(MalformedPoint::Missing);
        };
        let coordinate = LngLat::new(lng, lat);
        validate_coordinate(&coordinate)?;

        Ok(PointFeature::new(self.id, coordinate).with_properties(self.properties.clone()))
    }
}

/// Convert records to point features, dropping the ones that cannot be placed.
///
/// Input order is preserved.
pub fn to_point_features(records: &[ContentRecord]) -> Vec<PointFeature> {
    let mut dropped = 0usize;
    let points: Vec<PointFeature> = records
        .iter()
        .filter_map(|record| match record.to_point_feature() {
            Ok(point) => Some(point),
            Err(reason) => {
                log::debug!("Dropping record {}: {}", record.id, reason);
                dropped += 1;
                None
            }
        })
        .collect();

    if dropped > 0 {
        log::debug!("Ingested {} points, dropped {}", points.len(), dropped);
    }
    points
}

/// Parse a JSON array of content records into point features.
pub fn from_json(json: &str) -> Result<Vec<PointFeature>> {
    let records: Vec<ContentRecord> = serde_json::from_str(json)?;
    Ok(to_point_features(&records))
}

/// Convert the point features of a GeoJSON collection, dropping features
/// without a numeric id, without point geometry, or with a bad coordinate.
#[cfg(feature = "geojson")]
pub fn from_feature_collection(collection: &geojson::FeatureCollection) -> Vec<PointFeature> {
    collection
        .features
        .iter()
        .filter_map(|feature| {
            let Some(point) = PointFeature::from_geojson(feature) else {
                log::debug!("Dropping feature {:?}: not a point with a numeric id", feature.id);
                return None;
            };
            match validate_coordinate(&point.coordinate()) {
                Ok(()) => Some(point),
                Err(reason) => {
                    log::debug!("Dropping feature {}: {}", point.id(), reason);
                    None
                }
            }
        })
        .collect()
}

/// Extent of all points, or `None` for an empty set.
pub fn bounds_of_points(points: &[PointFeature]) -> Option<Bbox> {
    Bbox::from_coordinates(points.iter().map(PointFeature::coordinate))
}
