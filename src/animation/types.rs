use crate::transform::Transform;
use ahash::AHashMap;
use nalgebra_glm as glm;

/// Fallback rate for clips that carry no usable ticks per second
pub const DEFAULT_TICKS_PER_SECOND: f32 = 25.0;

/// One timestamped pose sample. Time is in animation ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub transform: Transform,
}

/// Keyframes for one bone, ordered by time
///
/// A track may be empty, which means the bone is present in the skeleton
/// but not animated by this clip and holds the identity pose.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    pub keyframes: Vec<Keyframe>,
}

/// A clip with one track per dense bone id and a looping playhead
#[derive(Clone, Debug)]
pub struct Animation {
    pub name: String,
    /// Length in ticks
    pub duration: f32,
    pub ticks_per_second: f32,
    /// Indexed by bone id, length equal to the bone count at build time
    pub tracks: Vec<Track>,
    /// Playhead in ticks, wraps modulo `duration`
    pub time: f32,
}

impl Animation {
    #[must_use]
    pub fn new(name: &str, duration: f32, ticks_per_second: f32) -> Self {
        // Some exporters write 0 here
        let tps = if ticks_per_second <= 0.0 {
            DEFAULT_TICKS_PER_SECOND
        } else {
            ticks_per_second
        };
        Self {
            name: name.to_owned(),
            duration,
            ticks_per_second: tps,
            tracks: Vec::new(),
            time: 0.0,
        }
    }
}

/// Separately timed source samples for one animated node, straight out
/// of the importer. The three components may have different lengths and
/// timestamps.
#[derive(Clone, Debug, Default)]
pub struct RawChannel {
    pub translations: Vec<(f32, glm::Vec3)>,
    pub rotations: Vec<(f32, glm::Quat)>,
    pub scales: Vec<(f32, glm::Vec3)>,
}

/// One clip as imported, with channels keyed by target node name
#[derive(Clone, Debug, Default)]
pub struct RawClip {
    pub name: String,
    pub duration: f32,
    pub ticks_per_second: f32,
    pub channels: AHashMap<String, RawChannel>,
}
