//! Marker clustering and viewport synchronization for interactive maps.
//!
//! ```rust
//! use clustermap::prelude::*;
//!
//! let points = vec![
//!     PointFeature::new(1, LngLat::new(2.35, 48.85)),
//!     PointFeature::new(2, LngLat::new(2.36, 48.86)),
//!     PointFeature::new(3, LngLat::new(-74.0, 40.7)),
//! ];
//!
//! let viewport = ViewportController::with_config(ViewportConfig::default())?;
//! let mut service = ClusterQueryService::new();
//! let features = service.get_renderable_features(&points, &SpatialIndexConfig::default(), &viewport)?;
//!
//! assert_eq!(features.iter().filter(|f| f.is_cluster()).count(), 1);
//! assert_eq!(features.len(), 2);
//! # Ok::<(), clustermap::ClusterMapError>(())
//! ```

pub mod cache;
pub mod compute;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod query;
pub mod viewport;

pub use cache::{BuildOutcome, BuildResult, BuildTicket, IndexCache};
pub use config::{Config, ConstrainedAxis, InteractionFlags, SpatialIndexConfig, ViewportConfig};
pub use error::{ClusterMapError, Result};
pub use index::SpatialIndex;
pub use ingest::ContentRecord;
pub use query::ClusterQueryService;
pub use viewport::{
    Easing, FlyOptions, FlyRequest, Padding, ViewportController, ViewportEvent, ViewportPhase,
    ViewportState, ViewportUpdate,
};

pub use clustermap_types::{Bbox, ClusterNode, LngLat, PointFeature, Properties, RenderableFeature};

pub use geo::{Point, Rect};

#[cfg(feature = "geojson")]
pub use clustermap_types::geojson::to_feature_collection;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ClusterMapError, Result};

    pub use crate::{Bbox, ClusterNode, LngLat, PointFeature, RenderableFeature};

    pub use crate::{Config, SpatialIndexConfig, ViewportConfig};

    pub use crate::{ClusterQueryService, IndexCache, SpatialIndex};

    pub use crate::{FlyOptions, FlyRequest, ViewportController, ViewportEvent, ViewportUpdate};

    pub use std::time::Duration;
}
