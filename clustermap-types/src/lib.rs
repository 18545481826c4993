//! # clustermap-types
//!
//! Plain data types shared between the clustermap engine and the layers that
//! feed it or draw its output:
//!
//! - **Point types**: `LngLat`, `PointFeature`
//! - **Bounds**: `Bbox` (west/south/east/north, may cross the antimeridian)
//! - **Query output**: `ClusterNode`, `RenderableFeature`
//!
//! All types are serializable with Serde and interoperate with the `geo`
//! crate's primitives. GeoJSON conversions live behind the `geojson` feature.
//!
//! ## Examples
//!
//! ```rust
//! use clustermap_types::point::{LngLat, PointFeature};
//!
//! let story = PointFeature::new(7, LngLat::new(36.8219, -1.2921))
//!     .with_property("title", "Nairobi");
//! assert_eq!(story.id(), 7);
//! ```

pub mod bbox;
pub mod cluster;
#[cfg(feature = "geojson")]
pub mod geojson;
pub mod point;

pub use bbox::Bbox;
pub use cluster::{ClusterNode, RenderableFeature};
pub use point::{LngLat, PointFeature, Properties};
