//! Image graph nodes with asynchronous, progress-reporting asset caching.
//!
//! Each [`GraphNode`] is one georeferenced photograph. Before it can be shown,
//! its bitmap and its proxy mesh must be fetched; [`NodeAssetCache`] runs both
//! retrievals concurrently, reports their combined byte progress through the
//! node's load status, and assigns both assets once they are complete.
//!
//! # Design principles
//!
//! - **Runtime-agnostic**: Caching is a plain future; no tasks are spawned
//! - **Injected retrieval**: An [`AssetFetcher`] chosen at construction decides
//!   between network retrieval and the offline bypass
//! - **Meshes never fail a node**: Missing or broken geometry becomes an empty
//!   mesh; only image failures fail a caching cycle
//!
//! # Example
//!
//! ```ignore
//! use imagegraph::{Endpoints, GraphNode, LatLon, NodeAssetCache, Settings};
//!
//! let settings = Settings::remote(Endpoints::new(
//!     "https://images.example.com/{key}/thumb-{size}.jpg",
//!     "https://meshes.example.com/v2/mesh/{key}",
//! ));
//! let cache = NodeAssetCache::from_settings(&settings)?;
//!
//! let mut node = GraphNode::new("image-key", LatLon::new(55.6, 13.0), 90.0);
//! let mut progress = node.subscribe_load_status();
//! node.cache_assets(&cache).await?;
//! assert!(node.loaded());
//! ```

pub mod cache;
pub mod config;
mod error;
pub mod fetch;
pub mod metadata;
pub mod node;
pub mod remote;
pub mod sequence;
pub mod transport;
pub mod types;

pub use cache::{MeshFailurePolicy, NodeAssetCache};
pub use config::{FetchMode, Settings, SpatialDataConfiguration};
pub use error::{Error, Result};
pub use fetch::{
    AssetEvent, AssetFetcher, AssetKind, AssetPayload, AssetRequest, AssetStream, BypassFetcher,
};
pub use metadata::{ApiNavImIm, Gpano};
pub use node::{CacheState, GraphNode};
pub use remote::{Endpoints, RemoteFetcher};
pub use sequence::Sequence;
pub use transport::{HttpTransport, TransferEvent, TransferStream, Transport};
pub use types::{Bitmap, LatLon, LoadStatus};

// Re-export decode types for convenience.
pub use imagegraph_decode::{Mesh, SENTINEL_INDEX};
