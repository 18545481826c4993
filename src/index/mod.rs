//! Zoom-leveled cluster tree over point features.
//!
//! ## Structure
//!
//! The index keeps one level per integer zoom in `[min_zoom, max_zoom]`:
//!
//! 1. **Identity level**: at `max_zoom` every point is its own leaf.
//!
//! 2. **Agglomeration**: each coarser level `z` is built from level `z + 1`
//!    by a greedy pass that folds nodes whose screen-space distance at `z` is
//!    within the configured radius. The radius in unit-square space is
//!    `radius / (extent * 2^z)`.
//!
//! 3. **Envelope queries**: an R-tree over the points finds the ones inside
//!    the viewport, and each level's owner table maps them to the nodes that
//!    hold them at the requested zoom. A node is visible when at least one of
//!    its points is.
//!
//! Because each level only ever merges nodes of the level below it, a
//! coarser level never holds more nodes than a finer one, and a cluster's
//! membership is fixed at build time. Every visible cluster has a visible
//! child one zoom finer, so zooming in on a fixed box never shows fewer
//! items.
//!
//! ## Example
//!
//! ```rust
//! use clustermap::{Bbox, LngLat, PointFeature, SpatialIndex, SpatialIndexConfig};
//!
//! let points: Vec<PointFeature> = (0..100)
//!     .map(|i| PointFeature::new(i, LngLat::new(2.0 + i as f64 * 1e-4, 48.0)))
//!     .collect();
//!
//! let index = SpatialIndex::build(&points, &SpatialIndexConfig::default()).unwrap();
//! let coarse = index.query(Bbox::WORLD, 0);
//! assert_eq!(coarse.len(), 1);
//! assert_eq!(coarse[0].point_count(), 100);
//! ```

mod level;

use crate::compute::projection::{lat_y, lng_x, unproject, wrap_lng};
use crate::config::SpatialIndexConfig;
use crate::error::{ClusterMapError, Result};
use clustermap_types::{Bbox, ClusterNode, PointFeature, RenderableFeature};
use level::{ClusterRecord, Level, LevelEntry, Node, NodeKind, Pass, agglomerate, tree_of};
use rstar::{AABB, RTree};
use rustc_hash::{FxHashMap, FxHashSet};

/// Static cluster tree built from one point set and one configuration.
pub struct SpatialIndex {
    config: SpatialIndexConfig,
    points: Vec<PointFeature>,
    /// `levels[z - min_zoom]` holds the nodes visible at zoom `z`
    levels: Vec<Level>,
    /// Projected points, slot = position in `points`
    point_tree: RTree<LevelEntry>,
    clusters: FxHashMap<u64, ClusterRecord>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("config", &self.config)
            .field("points", &self.points.len())
            .field("levels", &self.levels.len())
            .field("clusters", &self.clusters.len())
            .finish()
    }
}

impl SpatialIndex {
    /// Build the full cluster tree.
    ///
    /// Points are taken as given; malformed coordinates should already have
    /// been filtered out by ingestion.
    ///
    /// # Errors
    ///
    /// `ClusterMapError::Configuration` if the configuration is invalid
    /// (non-positive radius, `min_zoom > max_zoom`, ...).
    pub fn build(points: &[PointFeature], config: &SpatialIndexConfig) -> Result<Self> {
        config.validate().map_err(ClusterMapError::Configuration)?;

        let leaves: Vec<Node> = points
            .iter()
            .enumerate()
            .map(|(slot, point)| Node {
                x: lng_x(point.lng()),
                y: lat_y(point.lat()),
                count: 1,
                kind: NodeKind::Leaf(slot),
            })
            .collect();

        let mut levels = Vec::with_capacity(usize::from(config.max_zoom - config.min_zoom) + 1);
        let point_tree = tree_of(&leaves);
        let mut finer = Level::identity(leaves);
        let mut finer_tree: Option<RTree<LevelEntry>> = None;
        let mut clusters = FxHashMap::default();
        let mut next_id = 0u64;

        for zoom in (config.min_zoom..config.max_zoom).rev() {
            let pass = Pass {
                zoom,
                radius: config.radius / (f64::from(config.extent) * 2f64.powi(i32::from(zoom))),
                min_points: config.min_points,
            };
            let tree = finer_tree.as_ref().unwrap_or(&point_tree);
            let folded = agglomerate(&finer.nodes, tree, &pass, &mut clusters, &mut next_id);
            let coarser = Level::coarsen(&finer, folded);
            finer_tree = (zoom > config.min_zoom).then(|| tree_of(&coarser.nodes));
            levels.push(std::mem::replace(&mut finer, coarser));
        }
        levels.push(finer);
        levels.reverse();

        log::debug!(
            "Built cluster index: {} points, {} clusters, zoom {}..={}",
            points.len(),
            clusters.len(),
            config.min_zoom,
            config.max_zoom
        );

        Ok(Self {
            config: config.clone(),
            points: points.to_vec(),
            levels,
            point_tree,
            clusters,
        })
    }

    pub fn config(&self) -> &SpatialIndexConfig {
        &self.config
    }

    /// The point set this index was built from, in input order.
    pub fn points(&self) -> &[PointFeature] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Clamp a requested zoom into the index's zoom range.
    pub fn clamp_zoom(&self, zoom: i32) -> u8 {
        zoom.clamp(i32::from(self.config.min_zoom), i32::from(self.config.max_zoom)) as u8
    }

    fn level(&self, zoom: i32) -> &Level {
        let zoom = self.clamp_zoom(zoom);
        &self.levels[usize::from(zoom - self.config.min_zoom)]
    }

    /// Clusters and leaves visible in `bbox` at integer `zoom`.
    ///
    /// The result is a pure function of `(self, bbox, zoom)`: clusters come
    /// first, then leaves, each ordered by id. `zoom` is clamped into
    /// `[min_zoom, max_zoom]`. A box spanning 360° or more covers the world;
    /// a box with `west > east` wraps across the antimeridian.
    pub fn query(&self, bbox: Bbox, zoom: i32) -> Vec<RenderableFeature> {
        if !bbox.to_array().iter().all(|v| v.is_finite()) {
            log::warn!("Rejecting cluster query with non-finite bounds");
            return Vec::new();
        }

        let level = self.level(zoom);
        let south = bbox.south.max(-90.0);
        let north = bbox.north.min(90.0);
        if south > north || level.nodes.is_empty() {
            return Vec::new();
        }

        let mut seen = FxHashSet::default();
        let mut found: Vec<&Node> = Vec::new();
        let mut collect = |west: f64, east: f64| {
            let envelope = AABB::from_corners(
                [lng_x(west), lat_y(north)],
                [lng_x(east), lat_y(south)],
            );
            for entry in self.point_tree.locate_in_envelope(&envelope) {
                let slot = level.owner[entry.data];
                if seen.insert(slot) {
                    found.push(&level.nodes[slot]);
                }
            }
        };

        if bbox.east - bbox.west >= 360.0 {
            collect(-180.0, 180.0);
        } else {
            let normalize = |lng: f64| {
                if (-180.0..=180.0).contains(&lng) {
                    lng
                } else {
                    wrap_lng(lng)
                }
            };
            let (west, east) = (normalize(bbox.west), normalize(bbox.east));
            if west > east {
                collect(west, 180.0);
                collect(-180.0, east);
            } else {
                collect(west, east);
            }
        }

        let mut features: Vec<RenderableFeature> =
            found.into_iter().map(|node| self.to_feature(node)).collect();
        features.sort_by_key(|feature| (!feature.is_cluster(), feature.id()));
        features
    }

    fn to_feature(&self, node: &Node) -> RenderableFeature {
        match node.kind {
            NodeKind::Leaf(slot) => RenderableFeature::Point(self.points[slot].clone()),
            NodeKind::Cluster(id) => RenderableFeature::Cluster(ClusterNode {
                id,
                coordinate: unproject([node.x, node.y]),
                point_count: node.count,
                expansion_zoom: self.expansion_zoom_of(id),
            }),
        }
    }

    fn record(&self, cluster_id: u64) -> Result<&ClusterRecord> {
        self.clusters
            .get(&cluster_id)
            .ok_or(ClusterMapError::UnknownCluster(cluster_id))
    }

    fn expansion_zoom_of(&self, cluster_id: u64) -> u8 {
        self.clusters
            .get(&cluster_id)
            .map_or(self.config.max_zoom, |record| {
                (record.zoom + 1).min(self.config.max_zoom)
            })
    }

    /// Zoom at which `cluster_id` splits into its children.
    pub fn expansion_zoom(&self, cluster_id: u64) -> Result<u8> {
        self.record(cluster_id)?;
        Ok(self.expansion_zoom_of(cluster_id))
    }

    /// The nodes a cluster splits into one zoom level finer.
    pub fn children(&self, cluster_id: u64) -> Result<Vec<RenderableFeature>> {
        let record = self.record(cluster_id)?;
        Ok(record
            .children
            .iter()
            .map(|child| self.to_feature(child))
            .collect())
    }

    /// Leaf points folded into a cluster, depth-first, after skipping `offset`.
    pub fn leaves(&self, cluster_id: u64, limit: usize, offset: usize) -> Result<Vec<PointFeature>> {
        let record = self.record(cluster_id)?;
        let mut slots = Vec::with_capacity(record.count);
        self.collect_leaf_slots(record, &mut slots);

        Ok(slots
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|slot| self.points[slot].clone())
            .collect())
    }

    /// Geographic bounds of every leaf in a cluster.
    pub fn cluster_bounds(&self, cluster_id: u64) -> Result<Bbox> {
        let record = self.record(cluster_id)?;
        let mut slots = Vec::with_capacity(record.count);
        self.collect_leaf_slots(record, &mut slots);

        Bbox::from_coordinates(slots.into_iter().map(|slot| self.points[slot].coordinate()))
            .ok_or(ClusterMapError::UnknownCluster(cluster_id))
    }

    fn collect_leaf_slots(&self, record: &ClusterRecord, slots: &mut Vec<usize>) {
        for child in &record.children {
            match child.kind {
                NodeKind::Leaf(slot) => slots.push(slot),
                NodeKind::Cluster(id) => {
                    if let Some(inner) = self.clusters.get(&id) {
                        self.collect_leaf_slots(inner, slots);
                    }
                }
            }
        }
    }
}
