//! Decode proxy meshes and bitmaps for image graph nodes.
//!
//! This crate provides pure synchronous decoding functions for the two assets
//! an image point caches: the bitmap served by the image endpoint and the
//! protobuf-encoded proxy mesh served by the mesh endpoint.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Lenient meshes**: Broken mesh data degrades to an empty mesh
//! - **Web-compatible**: Compiles to WASM

pub mod bitmap;
mod error;
pub mod mesh;

pub use bitmap::decode_bitmap;
pub use error::{DecodeError, DecodeResult};
pub use mesh::{Mesh, SENTINEL_INDEX, decode_mesh, encode_mesh, try_decode_mesh};

/// Decoded RGBA8 bitmap.
pub use image::RgbaImage;
