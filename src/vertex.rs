//! Single stream vertex format: position, normal, tangent basis, and
//! texture coordinate interleaved with the skinning attributes. Field
//! order matches the baked model file layout, which stores these structs
//! as raw bytes.
use crate::types::MAX_BONE_INFLUENCE;
use bytemuck::{Pod, Zeroable};

#[allow(clippy::module_name_repetitions)]
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Zeroable, Pod)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub tex_coord: [f32; 2],
    pub bitangent: [f32; 3],
    pub bone_ids: [i32; MAX_BONE_INFLUENCE],
    pub weights: [f32; MAX_BONE_INFLUENCE],
}

impl Default for SkinnedVertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0; 3],
            tangent: [0.0; 3],
            tex_coord: [0.0; 2],
            bitangent: [0.0; 3],
            // -1 marks an unused influence slot
            bone_ids: [-1; MAX_BONE_INFLUENCE],
            weights: [0.0; MAX_BONE_INFLUENCE],
        }
    }
}
