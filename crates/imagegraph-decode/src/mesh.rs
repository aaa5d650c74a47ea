//! Proxy mesh decoding.
//!
//! The wire format is a protobuf `FlatMesh` message. Field 1 appends one
//! little-endian `f32` to a flat coordinate buffer and field 2 appends one
//! varint to a flat triangle index buffer. Unknown fields are skipped by wire
//! type, so newer producers can add fields without breaking old readers.

use glam::Vec3;
use imagegraph_proto as proto;
use prost::Message;

use crate::error::{DecodeError, DecodeResult};

/// Index used by the placeholder mesh in place of a real vertex reference.
///
/// This is the unsigned bit pattern of `-1`.
pub const SENTINEL_INDEX: u32 = u32::MAX;

/// Decoded proxy geometry for an image point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions in encounter order.
    pub vertices: Vec<Vec3>,
    /// Triangles as triples of indices into `vertices`.
    pub faces: Vec<[u32; 3]>,
    /// Whether decoding produced at least one vertex.
    pub populated: bool,
}

impl Mesh {
    /// An empty, unpopulated mesh.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Placeholder geometry used when asset retrieval is bypassed.
    ///
    /// Holds one vertex at `(-1, -1, -1)` and one face of [`SENTINEL_INDEX`]
    /// values. It is never marked populated, so renderers treat it as flat.
    #[must_use]
    pub fn sentinel() -> Self {
        Self {
            vertices: vec![Vec3::splat(-1.0)],
            faces: vec![[SENTINEL_INDEX; 3]],
            populated: false,
        }
    }

    /// Group flat coordinate and index buffers into vertices and faces.
    ///
    /// Trailing values that do not complete a triple are dropped.
    #[must_use]
    pub fn from_flat(vertices: &[f32], triangles: &[u32]) -> Self {
        let vertices: Vec<Vec3> = vertices
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]))
            .collect();
        let faces = triangles
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        let populated = !vertices.is_empty();

        Self {
            vertices,
            faces,
            populated,
        }
    }

    /// Flatten back into the wire representation.
    #[must_use]
    pub fn to_flat(&self) -> proto::FlatMesh {
        proto::FlatMesh {
            vertices: self.vertices.iter().flat_map(|v| v.to_array()).collect(),
            triangles: self.faces.iter().flatten().copied().collect(),
        }
    }
}

/// Decode a mesh, reporting malformed input as an error.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidFormat`] if the bytes are not a valid
/// message (truncated value, invalid wire type).
pub fn try_decode_mesh(data: &[u8]) -> DecodeResult<Mesh> {
    let flat = proto::FlatMesh::decode(data).map_err(|e| DecodeError::InvalidFormat {
        context: "mesh",
        detail: e.to_string(),
    })?;

    Ok(Mesh::from_flat(&flat.vertices, &flat.triangles))
}

/// Decode a mesh.
///
/// Never fails: input that cannot be parsed yields an empty, unpopulated mesh.
#[must_use]
pub fn decode_mesh(data: &[u8]) -> Mesh {
    try_decode_mesh(data).unwrap_or_default()
}

/// Encode a mesh in the canonical (unpacked) wire form.
#[must_use]
pub fn encode_mesh(mesh: &Mesh) -> Vec<u8> {
    mesh.to_flat().encode_to_vec()
}
