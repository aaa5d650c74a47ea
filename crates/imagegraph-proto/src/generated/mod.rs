// Generated protobuf types. Do not edit manually.
// Regenerate with: cargo run -p imagegraph-proto --bin generate

#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]

// This file is @generated by prost-build.
/// Proxy geometry for one image point.
///
/// Vertices are stored as a flat list of coordinates (x0, y0, z0, x1, ...)
/// and triangles as a flat list of vertex indices (a0, b0, c0, a1, ...).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FlatMesh {
    #[prost(float, repeated, packed = "false", tag = "1")]
    pub vertices: ::prost::alloc::vec::Vec<f32>,
    #[prost(uint32, repeated, packed = "false", tag = "2")]
    pub triangles: ::prost::alloc::vec::Vec<u32>,
}
