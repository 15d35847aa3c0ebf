//! Image transform pipeline components.
//!
//! This module contains the stages behind [`ImageProcessingEngine`]:
//! - **validate**: Byte and dimension limits, format signatures
//! - **decode**: Format detection and decoding (JPEG, PNG)
//! - **resize**: Width-first constrained nearest-neighbor resize
//! - **encode**: JPEG output at a requested quality
//! - **hash**: Content-addressed cache keys
//! - **inflight**: Optional coalescing of identical concurrent requests
//! - **engine**: Worker pool, cache lookups and result assembly
//! - **discovery**: Find image files in directories

pub mod decode;
pub mod discovery;
pub mod encode;
pub mod engine;
pub mod hash;
pub mod inflight;
pub mod resize;
pub mod validate;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use encode::encode_jpeg;
pub use engine::ImageProcessingEngine;
pub use hash::Hasher;
pub use inflight::{FlightGuard, InflightRegistry};
pub use validate::{SourceFormat, Validator};
