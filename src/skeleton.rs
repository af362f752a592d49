pub mod builder;
mod types;

// Re-exports
pub use {
    builder::{build, build_hierarchy, flatten},
    types::{BoneInfo, BoneMap, FlatNode, HierarchyNode, SceneNode, Skeleton},
};
