//! Asset manifests and cached loading of baked models
pub mod bake;
pub mod loader;
pub mod manifest;

// Re-exports
pub use {
    loader::ModelCache,
    manifest::{AssetEntry, AssetKind, AssetManifest},
};
