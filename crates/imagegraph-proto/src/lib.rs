//! Generated protobuf types for the image graph mesh wire format.
//!
//! The mesh endpoint serves a single [`FlatMesh`] message per image point:
//! field 1 carries 32-bit float coordinates, field 2 carries varint triangle
//! indices. Both are repeated scalars and may arrive packed or unpacked.
//!
//! # Regenerating types
//!
//! To regenerate the protobuf types after modifying `proto/mesh.proto`:
//!
//! ```sh
//! cargo run -p imagegraph-proto --bin generate
//! ```
//!
//! This requires `protoc` to be installed.

mod generated;

pub use generated::*;
