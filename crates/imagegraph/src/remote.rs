//! Asset retrieval over a byte [`Transport`].

use std::sync::Arc;

use futures::StreamExt;
use imagegraph_decode::{Mesh, decode_bitmap, try_decode_mesh};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::fetch::{AssetEvent, AssetFetcher, AssetKind, AssetPayload, AssetRequest, AssetStream};
use crate::transport::{HttpTransport, TransferEvent, Transport, is_success};
use crate::types::LoadStatus;

/// URL templates for the asset endpoints.
///
/// `{key}` is replaced by the node key and `{size}` by the requested image
/// size.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoints {
    /// Template for image URLs, e.g. `https://images.example.com/{key}/thumb-{size}.jpg`.
    pub image: String,
    /// Template for mesh URLs, e.g. `https://meshes.example.com/v2/mesh/{key}`.
    pub mesh: String,
}

impl Endpoints {
    /// Create endpoints from two templates.
    #[must_use]
    pub fn new(image: impl Into<String>, mesh: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            mesh: mesh.into(),
        }
    }

    /// URL of an asset.
    #[must_use]
    pub fn url(&self, key: &str, kind: AssetKind) -> String {
        match kind {
            AssetKind::Image { size } => self
                .image
                .replace("{key}", key)
                .replace("{size}", &size.to_string()),
            AssetKind::Mesh => self.mesh.replace("{key}", key),
        }
    }
}

/// Fetches assets from the network and decodes them.
///
/// Images must come back with a success status and decode cleanly, otherwise
/// the fetch fails. Meshes served with a non-success status become an empty,
/// unpopulated mesh instead of an error, and undecodable mesh bytes do the
/// same, so a missing reconstruction never fails a node.
#[derive(Debug, Clone)]
pub struct RemoteFetcher<T: Transport = HttpTransport> {
    transport: T,
    endpoints: Endpoints,
}

impl RemoteFetcher<HttpTransport> {
    /// Create a fetcher using the default HTTP transport.
    #[must_use]
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            transport: HttpTransport::new(),
            endpoints,
        }
    }
}

impl<T: Transport> RemoteFetcher<T> {
    /// Create a fetcher with a custom transport.
    #[must_use]
    pub fn with_transport(transport: T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The configured endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

impl<T: Transport> AssetFetcher for RemoteFetcher<T> {
    fn fetch(&self, request: AssetRequest) -> AssetStream<'_> {
        let url = self.endpoints.url(&request.key, request.kind);
        let kind = request.kind;

        let events = self
            .transport
            .get(url.clone())
            .map(move |event| match event? {
                TransferEvent::Progress(status) => Ok(AssetEvent::Progress(status)),
                TransferEvent::Complete { status, code, body } => {
                    finish(kind, &url, status, code, &body)
                }
            });
        Box::pin(events)
    }
}

fn finish(
    kind: AssetKind,
    url: &str,
    status: LoadStatus,
    code: u16,
    body: &[u8],
) -> Result<AssetEvent> {
    let payload = match kind {
        AssetKind::Image { .. } => {
            if !is_success(code) {
                return Err(Error::HttpStatus {
                    url: url.to_string(),
                    status: code,
                });
            }
            AssetPayload::Image(Some(Arc::new(decode_bitmap(body)?)))
        }
        AssetKind::Mesh if is_success(code) => match try_decode_mesh(body) {
            Ok(mesh) => {
                if !mesh.populated {
                    tracing::debug!(url, bytes = body.len(), "mesh response held no vertices");
                }
                AssetPayload::Mesh(mesh)
            }
            Err(e) => {
                tracing::debug!(
                    url,
                    bytes = body.len(),
                    error = %e,
                    "malformed mesh, using empty mesh"
                );
                AssetPayload::Mesh(Mesh::empty())
            }
        },
        AssetKind::Mesh => {
            tracing::debug!(url, code, "mesh unavailable, using empty mesh");
            AssetPayload::Mesh(Mesh::empty())
        }
    };

    Ok(AssetEvent::Loaded { status, payload })
}
