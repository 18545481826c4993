use crate::point::{LngLat, PointFeature};
use serde::{Deserialize, Serialize};

/// An aggregate marker standing in for several nearby points at one zoom.
///
/// Cluster nodes are produced by every index query and owned by its result;
/// they are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Synthetic id, stable for a given index build
    pub id: u64,
    /// Count-weighted centroid of the folded points
    pub coordinate: LngLat,
    /// Number of leaves folded into this cluster
    pub point_count: usize,
    /// Zoom at which this cluster splits into its children
    pub expansion_zoom: u8,
}

impl ClusterNode {
    /// Short label for the marker badge.
    ///
    /// # Examples
    ///
    /// ```
    /// use clustermap_types::cluster::ClusterNode;
    /// use clustermap_types::point::LngLat;
    ///
    /// let mut node = ClusterNode {
    ///     id: 1,
    ///     coordinate: LngLat::new(0.0, 0.0),
    ///     point_count: 999,
    ///     expansion_zoom: 3,
    /// };
    /// assert_eq!(node.point_count_abbreviated(), "999");
    /// node.point_count = 1_234;
    /// assert_eq!(node.point_count_abbreviated(), "1.2k");
    /// node.point_count = 12_345;
    /// assert_eq!(node.point_count_abbreviated(), "12k");
    /// ```
    pub fn point_count_abbreviated(&self) -> String {
        let count = self.point_count;
        if count >= 10_000 {
            format!("{}k", (count as f64 / 1000.0).round())
        } else if count >= 1000 {
            format!("{}k", (count as f64 / 100.0).round() / 10.0)
        } else {
            count.to_string()
        }
    }
}

/// One entry of a clustering query: either a cluster or a single point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderableFeature {
    Cluster(ClusterNode),
    Point(PointFeature),
}

impl RenderableFeature {
    pub fn is_cluster(&self) -> bool {
        matches!(self, RenderableFeature::Cluster(_))
    }

    /// Cluster id or point id, depending on the variant.
    pub fn id(&self) -> u64 {
        match self {
            RenderableFeature::Cluster(cluster) => cluster.id,
            RenderableFeature::Point(point) => point.id(),
        }
    }

    pub fn coordinate(&self) -> LngLat {
        match self {
            RenderableFeature::Cluster(cluster) => cluster.coordinate,
            RenderableFeature::Point(point) => point.coordinate(),
        }
    }

    /// Number of leaves this entry represents (1 for a point).
    pub fn point_count(&self) -> usize {
        match self {
            RenderableFeature::Cluster(cluster) => cluster.point_count,
            RenderableFeature::Point(_) => 1,
        }
    }

    pub fn as_cluster(&self) -> Option<&ClusterNode> {
        match self {
            RenderableFeature::Cluster(cluster) => Some(cluster),
            RenderableFeature::Point(_) => None,
        }
    }

    pub fn as_point(&self) -> Option<&PointFeature> {
        match self {
            RenderableFeature::Cluster(_) => None,
            RenderableFeature::Point(point) => Some(point),
        }
    }
}
