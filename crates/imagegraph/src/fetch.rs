//! Asset retrieval contract.
//!
//! An [`AssetFetcher`] turns an [`AssetRequest`] into a stream of
//! [`AssetEvent`]s: zero or more progress updates followed by exactly one
//! [`AssetEvent::Loaded`], or an error. Fetchers are chosen when the cache is
//! built, so core logic never checks the deployment mode.
//!
//! # Implementations
//!
//! - [`RemoteFetcher`](crate::RemoteFetcher): Retrieves and decodes assets over a byte transport
//! - [`BypassFetcher`]: Synthetic, already-complete results for offline use

use std::pin::Pin;

use futures::{Stream, future, stream};
use imagegraph_decode::Mesh;

use crate::error::Result;
use crate::types::{Bitmap, LoadStatus};

/// Stream type returned by [`AssetFetcher::fetch`].
pub type AssetStream<'a> = Pin<Box<dyn Stream<Item = Result<AssetEvent>> + Send + 'a>>;

/// The kind of asset to retrieve for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// The photograph, at the given size in pixels.
    Image {
        /// Requested size of the longest side.
        size: u32,
    },
    /// The proxy mesh.
    Mesh,
}

/// Request for one node asset.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    /// Key of the node the asset belongs to.
    pub key: String,
    /// Which asset to retrieve.
    pub kind: AssetKind,
    /// Bitmap the node already holds, if any.
    pub held_image: Option<Bitmap>,
}

impl AssetRequest {
    /// Create an image request.
    #[must_use]
    pub fn image(key: impl Into<String>, size: u32, held_image: Option<Bitmap>) -> Self {
        Self {
            key: key.into(),
            kind: AssetKind::Image { size },
            held_image,
        }
    }

    /// Create a mesh request.
    #[must_use]
    pub fn mesh(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: AssetKind::Mesh,
            held_image: None,
        }
    }
}

/// A decoded asset.
#[derive(Debug, Clone)]
pub enum AssetPayload {
    /// The photograph. `None` when a bypassed fetch had nothing to hand back.
    Image(Option<Bitmap>),
    /// The proxy mesh.
    Mesh(Mesh),
}

/// One step of an asset retrieval.
#[derive(Debug, Clone)]
pub enum AssetEvent {
    /// Bytes are still arriving.
    Progress(LoadStatus),
    /// The asset is complete.
    Loaded {
        /// Final byte progress of the transfer.
        status: LoadStatus,
        /// The decoded asset.
        payload: AssetPayload,
    },
}

impl AssetEvent {
    /// The byte progress carried by this event.
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        match self {
            AssetEvent::Progress(status) | AssetEvent::Loaded { status, .. } => *status,
        }
    }

    /// Whether this is the terminal event of a retrieval.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, AssetEvent::Loaded { .. })
    }
}

/// Retrieves node assets.
pub trait AssetFetcher: Send + Sync {
    /// Start retrieving the requested asset.
    fn fetch(&self, request: AssetRequest) -> AssetStream<'_>;
}

/// Wrap a single complete event in an [`AssetStream`].
pub(crate) fn ready_stream<'a>(status: LoadStatus, payload: AssetPayload) -> AssetStream<'a> {
    Box::pin(stream::once(future::ready(Ok(AssetEvent::Loaded {
        status,
        payload,
    }))))
}

/// A fetcher that performs no I/O.
///
/// Every request completes immediately with a `{1, 1}` status. Images echo
/// back the bitmap the node already holds; meshes are [`Mesh::sentinel`].
/// This is the development mode used for offline runs and hermetic tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct BypassFetcher;

impl BypassFetcher {
    /// Create a new bypass fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AssetFetcher for BypassFetcher {
    fn fetch(&self, request: AssetRequest) -> AssetStream<'_> {
        tracing::trace!(key = %request.key, kind = ?request.kind, "bypassing fetch");

        let payload = match request.kind {
            AssetKind::Image { .. } => AssetPayload::Image(request.held_image),
            AssetKind::Mesh => AssetPayload::Mesh(Mesh::sentinel()),
        };
        ready_stream(LoadStatus::new(1, 1), payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use imagegraph_decode::RgbaImage;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_bypass_image_echoes_held_bitmap() {
        let held: Bitmap = Arc::new(RgbaImage::new(4, 4));
        let fetcher = BypassFetcher::new();

        let events: Vec<_> = fetcher
            .fetch(AssetRequest::image("a", 640, Some(Arc::clone(&held))))
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        match events.into_iter().next().unwrap().unwrap() {
            AssetEvent::Loaded {
                status,
                payload: AssetPayload::Image(Some(image)),
            } => {
                assert_eq!(status, LoadStatus::new(1, 1));
                assert!(Arc::ptr_eq(&image, &held));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bypass_image_without_held_bitmap() {
        let fetcher = BypassFetcher::new();
        let mut stream = fetcher.fetch(AssetRequest::image("a", 640, None));
        let event = stream.next().await.unwrap().unwrap();
        assert!(matches!(
            event,
            AssetEvent::Loaded {
                payload: AssetPayload::Image(None),
                ..
            }
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_bypass_mesh_is_sentinel() {
        let fetcher = BypassFetcher::new();
        let mut stream = fetcher.fetch(AssetRequest::mesh("a"));
        let event = stream.next().await.unwrap().unwrap();
        assert_eq!(event.status(), LoadStatus::new(1, 1));
        match event {
            AssetEvent::Loaded {
                payload: AssetPayload::Mesh(mesh),
                ..
            } => assert_eq!(mesh, Mesh::sentinel()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_event_accessors() {
        let progress = AssetEvent::Progress(LoadStatus::new(3, 10));
        assert_eq!(progress.status(), LoadStatus::new(3, 10));
        assert!(!progress.is_loaded());
    }
}
