//! Per-node asset caching.
//!
//! A caching cycle retrieves a node's bitmap and mesh concurrently, sums the
//! byte progress of both transfers into the node's load status, and assigns
//! both assets once both transfers are complete.
//!
//! Both retrievals are polled from a single merged stream inside the cycle's
//! future, so status updates never interleave and no locking is needed.
//! Dropping the future cancels both retrievals.

use std::sync::Arc;

use futures::{StreamExt, stream};
use imagegraph_decode::Mesh;
use serde::Deserialize;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::fetch::{AssetEvent, AssetFetcher, AssetPayload, AssetRequest, ready_stream};
use crate::node::{CacheState, GraphNode};
use crate::types::{Bitmap, LoadStatus};

/// Default size of requested images, in pixels.
pub const DEFAULT_IMAGE_SIZE: u32 = 640;

/// How a failed mesh retrieval affects the caching cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFailurePolicy {
    /// Substitute an empty mesh and finish the cycle.
    #[default]
    Degrade,
    /// Fail the cycle, as an image failure would.
    Fatal,
}

/// Coordinates image and mesh retrieval for graph nodes.
#[derive(Clone)]
pub struct NodeAssetCache {
    fetcher: Arc<dyn AssetFetcher>,
    image_size: u32,
    mesh_failure: MeshFailurePolicy,
}

impl NodeAssetCache {
    /// Create a cache that retrieves assets through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            fetcher,
            image_size: DEFAULT_IMAGE_SIZE,
            mesh_failure: MeshFailurePolicy::Degrade,
        }
    }

    /// Build a cache from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings select remote fetching without endpoints.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.fetcher()?)
            .with_image_size(settings.base_image_size)
            .with_mesh_failure(settings.mesh_failure))
    }

    /// Set the requested image size.
    #[must_use]
    pub fn with_image_size(mut self, image_size: u32) -> Self {
        self.image_size = image_size;
        self
    }

    /// Set how mesh failures are handled.
    #[must_use]
    pub fn with_mesh_failure(mut self, mesh_failure: MeshFailurePolicy) -> Self {
        self.mesh_failure = mesh_failure;
        self
    }

    /// Retrieve the node's bitmap and mesh and assign them.
    ///
    /// The node's load status restarts at `{0, 0}` and tracks the sum of both
    /// transfers. Unmerged nodes skip the mesh transfer and receive an empty
    /// mesh that adds nothing to the status.
    ///
    /// Each call starts its own pair of retrievals; callers wanting to share
    /// one cycle between several consumers must arrange that themselves.
    ///
    /// # Errors
    ///
    /// Returns the image retrieval's error, or the mesh retrieval's error
    /// under [`MeshFailurePolicy::Fatal`]. On error the node's assets and
    /// `cached` flag are left as they were.
    pub async fn cache_assets<'n>(&self, node: &'n mut GraphNode) -> Result<&'n mut GraphNode> {
        let merged = node.merged();
        tracing::debug!(key = %node.key(), merged, "caching node assets");

        node.publish_load_status(LoadStatus::default());
        node.set_cache_state(CacheState::FetchingBoth);

        let image = self.fetcher.fetch(AssetRequest::image(
            node.key(),
            self.image_size,
            node.image().cloned(),
        ));
        let mesh = if merged {
            self.fetcher.fetch(AssetRequest::mesh(node.key()))
        } else {
            ready_stream(LoadStatus::default(), AssetPayload::Mesh(Mesh::empty()))
        };

        let mut events = stream::select(
            image.map(|event| (Source::Image, event)),
            mesh.map(|event| (Source::Mesh, event)),
        );
        let mut combiner = Combiner::default();

        while !combiner.is_complete() {
            let Some((source, event)) = events.next().await else {
                break;
            };

            let event = match event {
                Ok(event) => event,
                Err(e)
                    if source == Source::Mesh
                        && self.mesh_failure == MeshFailurePolicy::Degrade =>
                {
                    tracing::warn!(
                        key = %node.key(),
                        error = %e,
                        "mesh retrieval failed, using empty mesh"
                    );
                    AssetEvent::Loaded {
                        status: combiner.mesh.status,
                        payload: AssetPayload::Mesh(Mesh::empty()),
                    }
                }
                Err(e) => {
                    tracing::debug!(key = %node.key(), ?source, error = %e, "caching failed");
                    node.set_cache_state(CacheState::Failed);
                    return Err(e);
                }
            };

            if let Err(e) = combiner.apply(source, event) {
                node.set_cache_state(CacheState::Failed);
                return Err(e);
            }

            let status = combiner.status();
            tracing::trace!(
                key = %node.key(),
                loaded = status.loaded,
                total = status.total,
                "progress"
            );
            node.publish_load_status(status);
        }

        node.set_cache_state(CacheState::Combining);
        let status = combiner.status();
        let (image, mesh) = match combiner.finish() {
            Ok(assets) => assets,
            Err(e) => {
                node.set_cache_state(CacheState::Failed);
                return Err(e);
            }
        };

        tracing::debug!(
            key = %node.key(),
            loaded = status.loaded,
            total = status.total,
            populated = mesh.populated,
            "cached node assets"
        );
        node.assign_assets(image, mesh, status);
        node.set_cache_state(CacheState::Done);
        Ok(node)
    }
}

impl std::fmt::Debug for NodeAssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeAssetCache")
            .field("image_size", &self.image_size)
            .field("mesh_failure", &self.mesh_failure)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Image,
    Mesh,
}

/// Last known state of one retrieval.
#[derive(Debug)]
struct Slot<T> {
    status: LoadStatus,
    /// Set once the retrieval has delivered its asset.
    payload: Option<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            status: LoadStatus::default(),
            payload: None,
        }
    }
}

/// Accumulates events from both retrievals.
#[derive(Debug, Default)]
struct Combiner {
    image: Slot<Option<Bitmap>>,
    mesh: Slot<Mesh>,
}

impl Combiner {
    fn apply(&mut self, source: Source, event: AssetEvent) -> Result<()> {
        let done = match source {
            Source::Image => self.image.payload.is_some(),
            Source::Mesh => self.mesh.payload.is_some(),
        };
        if done {
            tracing::trace!(?source, "ignoring event after completion");
            return Ok(());
        }

        match (source, event) {
            (Source::Image, AssetEvent::Progress(status)) => self.image.status = status,
            (Source::Mesh, AssetEvent::Progress(status)) => self.mesh.status = status,
            (
                Source::Image,
                AssetEvent::Loaded {
                    status,
                    payload: AssetPayload::Image(image),
                },
            ) => {
                self.image.status = status;
                self.image.payload = Some(image);
            }
            (
                Source::Mesh,
                AssetEvent::Loaded {
                    status,
                    payload: AssetPayload::Mesh(mesh),
                },
            ) => {
                self.mesh.status = status;
                self.mesh.payload = Some(mesh);
            }
            (source, AssetEvent::Loaded { payload, .. }) => {
                let delivered = match payload {
                    AssetPayload::Image(_) => "an image",
                    AssetPayload::Mesh(_) => "a mesh",
                };
                return Err(Error::InvalidData {
                    context: "asset payload",
                    detail: format!("{source:?} retrieval delivered {delivered}"),
                });
            }
        }
        Ok(())
    }

    fn status(&self) -> LoadStatus {
        self.image.status + self.mesh.status
    }

    fn is_complete(&self) -> bool {
        self.image.payload.is_some() && self.mesh.payload.is_some()
    }

    fn finish(self) -> Result<(Option<Bitmap>, Mesh)> {
        match (self.image.payload, self.mesh.payload) {
            (Some(image), Some(mesh)) => Ok((image, mesh)),
            (image, _) => Err(Error::InvalidData {
                context: "asset stream",
                detail: format!(
                    "{} retrieval ended without delivering its asset",
                    if image.is_none() { "image" } else { "mesh" }
                ),
            }),
        }
    }
}
