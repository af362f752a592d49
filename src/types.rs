/// Maximum bones for a skinned model. You can't actually change this
/// constant without also changing the value in the skinning shader that
/// consumes the output matrices.
pub const MAX_BONES: usize = 60;

/// Maximum number of bones that can influence a single vertex
pub const MAX_BONE_INFLUENCE: usize = 4;
