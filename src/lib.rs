//! Skeletal animation for real time rendering
//!
//! This crate covers the CPU side of skinned mesh animation: importing
//! rigs and clips from glTF, folding the scene tree into a flat bone
//! hierarchy, sampling keyframe tracks, and producing the skinning
//! matrices a vertex shader consumes each frame. Mesh geometry can also
//! be baked into a compact binary format so runtime loads skip the scene
//! importer.
//!
//! The usual order is to import a model, resolve its clips against the
//! bone map with `Animation::from_raw`, build the `Skeleton`, and hand
//! both to an `Animator`. The `Animator` owns all per frame scratch, so
//! one is needed per animated instance, while the `Skeleton` is shared.
pub mod animation;
pub mod animator;
pub mod file_import;
pub mod mesh_import;
pub mod model_format;
pub mod oss_error;
pub mod skeleton;
pub mod transform;
pub mod types;
pub mod vertex;

// Re-exports
pub use {
    animation::Animation, animator::Animator, oss_error::OssError,
    skeleton::Skeleton, transform::Transform,
};
