use crate::{
    animation::RawClip,
    skeleton::{BoneMap, SceneNode},
    vertex::SkinnedVertex,
};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, PartialEq, Debug)]
pub struct ImportOptions {
    pub scale: f32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { scale: 1.0f32 }
    }
}

/// Geometry of a single mesh attached to a scene node
///
/// `transform` is the global transform of the node the mesh was attached
/// to, accumulated down from the scene root. Rigid parts that are not
/// skinned to any bone can be positioned with it. `mesh_index` is the
/// index of the mesh within the source file, kept so that baked files can
/// be related back to their source.
pub struct MeshData {
    pub name: String,
    pub mesh_index: i32,
    pub transform: glm::Mat4,
    pub indices: Vec<u32>,
    pub vertices: Vec<SkinnedVertex>,
}

/// A named group of meshes, usually one glTF node
#[derive(Default)]
pub struct PartData {
    pub name: String,
    pub meshes: Vec<MeshData>,
}

/// Everything imported from a model file in intermediate form
///
/// `scene_root` and `bone_map` carry what a `Skeleton` is built from.
/// `clips` holds raw animation channels which still need to be resolved
/// against the bone map with `Animation::from_raw`.
pub struct ImportedModel {
    pub parts: Vec<PartData>,
    pub bone_map: BoneMap,
    pub scene_root: SceneNode,
    pub clips: Vec<RawClip>,
}

/// Errors specific to importing data. `OssError` has a `From` trait to
/// handle these.
#[derive(Debug)]
pub enum ImportError {
    NoTriangles,
    NoIndices,
    NoPositions,
    NoNormals,
    NoWeights,
    NoSkin,
    CountMismatch,
    SparseMesh,
    NoInverseBind,
    SparseAnimation,
    NoSampler,
    EmptyScene,
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NoTriangles => {
                write!(f, "only triangulated meshes are supported")
            }
            Self::NoIndices => {
                write!(f, "only indexed meshes are supported")
            }
            Self::NoPositions => {
                write!(f, "vertex positions are required")
            }
            Self::NoNormals => {
                write!(f, "vertex normals are required")
            }
            Self::NoWeights => {
                write!(f, "vertex weights are required for a skinned mesh")
            }
            Self::NoSkin => {
                write!(f, "a skin is required for skeletal animation")
            }
            Self::CountMismatch => {
                write!(f, "there is a mismatch in the count of vertices")
            }
            Self::SparseMesh => {
                write!(f, "sparse mesh data is not supported")
            }
            Self::NoInverseBind => {
                write!(
                    f,
                    "inverse bind matrices are required for a skinned mesh"
                )
            }
            Self::SparseAnimation => {
                write!(f, "sparse animation data is not supported")
            }
            Self::NoSampler => {
                write!(f, "a sampler is required for animation")
            }
            Self::EmptyScene => {
                write!(f, "the file does not contain a usable scene")
            }
        }
    }
}
