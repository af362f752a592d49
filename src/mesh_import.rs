//! Mesh and animation import from glTF files
//!
//! Imported data is kept in an intermediate form independent of any
//! particular file format. The skeleton hierarchy, bone map, and raw
//! animation channels come back alongside the mesh parts so a caller can
//! build an `Animator` or bake everything to the binary model format.
pub mod batch;
pub mod gltf_file;
mod types;

// Re-exports
pub use {
    batch::Batch,
    types::{ImportError, ImportOptions, ImportedModel, MeshData, PartData},
};
