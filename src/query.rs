//! Query façade the renderer calls on every frame.
//!
//! [`ClusterQueryService`] combines the index cache with the published
//! viewport. Calling it every frame is cheap: the cluster query only runs
//! again when the index changed (new points or configuration) or when the
//! published bounds or rounded zoom moved. Camera rotation and tilt alone
//! reuse the previous result.

use crate::cache::IndexCache;
use crate::config::SpatialIndexConfig;
use crate::error::{ClusterMapError, Result};
use crate::index::SpatialIndex;
use crate::viewport::{FlyOptions, FlyRequest, ViewportController, widen_degenerate};
use clustermap_types::{Bbox, PointFeature, RenderableFeature};
use std::sync::Arc;

/// Inputs the current result was computed from.
struct QueryKey {
    index: Arc<SpatialIndex>,
    bbox: Bbox,
    zoom: i32,
}

#[derive(Default)]
pub struct ClusterQueryService {
    cache: IndexCache,
    last: Option<QueryKey>,
    features: Vec<RenderableFeature>,
    recomputations: u64,
}

impl ClusterQueryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clusters and leaves for the published viewport.
    ///
    /// # Errors
    ///
    /// Propagates index build failures (`ClusterMapError::Configuration`).
    /// The previous result is discarded in that case.
    pub fn get_renderable_features(
        &mut self,
        points: &[PointFeature],
        config: &SpatialIndexConfig,
        viewport: &ViewportController,
    ) -> Result<&[RenderableFeature]> {
        self.refresh(points, config, viewport)?;
        Ok(&self.features)
    }

    /// Like [`get_renderable_features`](Self::get_renderable_features), but a
    /// failure is logged and yields no features instead of an error.
    pub fn renderable_or_empty(
        &mut self,
        points: &[PointFeature],
        config: &SpatialIndexConfig,
        viewport: &ViewportController,
    ) -> &[RenderableFeature] {
        if let Err(e) = self.refresh(points, config, viewport) {
            log::error!("Cluster query failed, rendering no markers: {}", e);
        }
        &self.features
    }

    fn refresh(
        &mut self,
        points: &[PointFeature],
        config: &SpatialIndexConfig,
        viewport: &ViewportController,
    ) -> Result<()> {
        let index = match self.cache.get_or_build(points, config) {
            Ok(index) => index,
            Err(e) => {
                self.last = None;
                self.features.clear();
                return Err(e);
            }
        };
        let (bbox, zoom) = viewport.bounds_and_zoom_int();

        if let Some(key) = &self.last {
            if Arc::ptr_eq(&key.index, &index) && key.bbox == bbox && key.zoom == zoom {
                return Ok(());
            }
        }

        self.features = index.query(bbox, zoom);
        self.recomputations += 1;
        log::debug!(
            "Recomputed {} renderable features at zoom {}",
            self.features.len(),
            zoom
        );
        self.last = Some(QueryKey { index, bbox, zoom });
        Ok(())
    }

    /// Fly request that opens up a clicked cluster: it frames the cluster's
    /// leaves and stops at the zoom where the cluster splits.
    ///
    /// # Errors
    ///
    /// `ClusterMapError::UnknownCluster` if no index is loaded or the id is
    /// not part of it.
    pub fn fly_request_for_cluster(&self, cluster_id: u64, options: FlyOptions) -> Result<FlyRequest> {
        let index = self
            .cache
            .current()
            .ok_or(ClusterMapError::UnknownCluster(cluster_id))?;

        let bbox = widen_degenerate(index.cluster_bounds(cluster_id)?);
        let expansion_zoom = f64::from(index.expansion_zoom(cluster_id)?);
        let max_zoom = options
            .max_zoom
            .map_or(expansion_zoom, |cap| cap.min(expansion_zoom));

        Ok(FlyRequest::new(bbox).with_options(options.with_max_zoom(max_zoom)))
    }

    /// The index behind the current result, if one is loaded.
    pub fn index(&self) -> Option<Arc<SpatialIndex>> {
        self.cache.current()
    }

    /// Number of times the cluster query actually ran.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Number of index builds performed by the underlying cache.
    pub fn builds(&self) -> u64 {
        self.cache.builds()
    }

    /// Drop the cached index and result.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
        self.last = None;
        self.features.clear();
    }
}

impl std::fmt::Debug for ClusterQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterQueryService")
            .field("cache", &self.cache)
            .field("features", &self.features.len())
            .field("recomputations", &self.recomputations)
            .finish()
    }
}
