mod sampler;
mod types;

// Re-exports
pub use types::{
    Animation, Keyframe, RawChannel, RawClip, Track, DEFAULT_TICKS_PER_SECOND,
};
