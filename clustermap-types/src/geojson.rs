//! GeoJSON interop for point features and query results.
//!
//! Cluster features carry the property names map layers filter on:
//! `cluster`, `cluster_id`, `point_count` and `point_count_abbreviated`.

use crate::cluster::{ClusterNode, RenderableFeature};
use crate::point::{LngLat, PointFeature};
use ::geojson::feature::Id;
use ::geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

fn point_geometry(coordinate: LngLat) -> Geometry {
    Geometry::new(Value::Point(vec![coordinate.lng, coordinate.lat]))
}

fn numeric_id(id: u64) -> Id {
    Id::Number(serde_json::Number::from(id))
}

impl From<&PointFeature> for Feature {
    fn from(point: &PointFeature) -> Self {
        Feature {
            bbox: None,
            geometry: Some(point_geometry(point.coordinate())),
            id: Some(numeric_id(point.id())),
            properties: Some(point.properties().clone()),
            foreign_members: None,
        }
    }
}

impl From<&ClusterNode> for Feature {
    fn from(cluster: &ClusterNode) -> Self {
        let mut properties = JsonObject::new();
        properties.insert("cluster".into(), true.into());
        properties.insert("cluster_id".into(), cluster.id.into());
        properties.insert("point_count".into(), cluster.point_count.into());
        properties.insert(
            "point_count_abbreviated".into(),
            cluster.point_count_abbreviated().into(),
        );
        properties.insert("expansion_zoom".into(), cluster.expansion_zoom.into());

        Feature {
            bbox: None,
            geometry: Some(point_geometry(cluster.coordinate)),
            id: Some(numeric_id(cluster.id)),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

impl From<&RenderableFeature> for Feature {
    fn from(feature: &RenderableFeature) -> Self {
        match feature {
            RenderableFeature::Cluster(cluster) => cluster.into(),
            RenderableFeature::Point(point) => point.into(),
        }
    }
}

/// Collect query results into a `FeatureCollection` for map sources.
pub fn to_feature_collection(features: &[RenderableFeature]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: features.iter().map(Feature::from).collect(),
        foreign_members: None,
    }
}

impl PointFeature {
    /// Build a point feature from a GeoJSON feature.
    ///
    /// Returns `None` for anything that cannot be a marker: a missing or
    /// non-numeric id, a missing or non-point geometry, or a coordinate with
    /// fewer than two components. Range checks are left to the caller.
    pub fn from_geojson(feature: &Feature) -> Option<Self> {
        let id = match feature.id.as_ref()? {
            Id::Number(number) => number.as_u64()?,
            Id::String(text) => text.parse().ok()?,
        };

        let Value::Point(position) = &feature.geometry.as_ref()?.value else {
            return None;
        };
        let (&lng, &lat) = (position.first()?, position.get(1)?);

        Some(
            PointFeature::new(id, LngLat::new(lng, lat))
                .with_properties(feature.properties.clone().unwrap_or_default()),
        )
    }
}
