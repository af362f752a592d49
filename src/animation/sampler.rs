use super::types::{Animation, Keyframe, RawChannel, RawClip, Track};
use crate::{skeleton::BoneMap, transform::Transform};
use log::debug;
use nalgebra_glm as glm;

impl Animation {
    /// Builds a clip from imported channel data, resolving every animated
    /// node through the bone map
    ///
    /// A clip may animate helper or attachment nodes that no skin ever
    /// mentioned. Those names extend the bone map with new ids and an
    /// identity offset so the hierarchy pass can still route transforms
    /// through them.
    pub fn from_raw(raw: &RawClip, bones: &mut BoneMap) -> Self {
        let mut channels: Vec<(&String, &RawChannel)> =
            raw.channels.iter().collect();
        // Hash order would make id assignment depend on the run
        channels.sort_unstable_by(|a, b| a.0.cmp(b.0));

        // Resolve names before sizing the track vector since new bones
        // grow the map
        let mut resolved = Vec::with_capacity(channels.len());
        for (name, channel) in channels {
            if !bones.contains(name) {
                debug!("Clip \"{}\" adds bone \"{}\"", raw.name, name);
            }
            let id = bones.get_or_insert(name, glm::Mat4::identity());
            resolved.push((id, channel));
        }

        let mut anim = Self::new(&raw.name, raw.duration, raw.ticks_per_second);
        anim.tracks = vec![Track::default(); bones.len()];
        for (id, channel) in resolved {
            if let Ok(slot) = usize::try_from(id) {
                anim.tracks[slot] = merge_channel(channel);
            }
        }
        anim
    }

    /// Advances the playhead by `delta` seconds, looping forever
    pub fn advance(&mut self, delta: f32) {
        if self.duration > 0.0 {
            self.time = (self.time + self.ticks_per_second * delta)
                .rem_euclid(self.duration);
        } else {
            self.time = 0.0;
        }
    }

    /// Samples every track at the current playhead. Poses are written
    /// through the provided slice, stopping at the end of the slice or
    /// the end of the tracks, whichever comes first.
    pub fn sample_pose(&self, pose: &mut [Transform]) {
        for (out, track) in pose.iter_mut().zip(&self.tracks) {
            *out = track.sample(self.time);
        }
    }
}

impl Track {
    /// Interpolated pose at `time` ticks
    #[must_use]
    pub fn sample(&self, time: f32) -> Transform {
        let Some(first) = self.keyframes.first() else {
            // Bone not animated by this clip
            return Transform::default();
        };
        if self.keyframes.len() == 1 {
            return first.transform;
        }
        let i = self.segment_index(time);
        let a = &self.keyframes[i];
        let b = &self.keyframes[i + 1];
        a.transform
            .interpolate(&b.transform, segment_factor(a.time, b.time, time))
    }

    /// Index of the segment containing `time`, clamped to the last
    /// segment when the playhead is past the final key. Requires at
    /// least two keyframes.
    fn segment_index(&self, time: f32) -> usize {
        // Linear scan from the start is fine at the track lengths real
        // clips have
        for (i, pair) in self.keyframes.windows(2).enumerate() {
            if time < pair[1].time {
                return i;
            }
        }
        self.keyframes.len() - 2
    }
}

/// Helper to calculate the interpolation parameter within a segment
fn segment_factor(start: f32, end: f32, time: f32) -> f32 {
    let length = end - start;
    if length <= 0.0 {
        // Duplicate timestamps collapse the segment
        return 0.0;
    }
    ((time - start) / length).clamp(0.0, 1.0)
}

/// Helper to read component `i` of a source track, holding the last
/// sample when that component is shorter than its siblings
fn clamped<T: Copy>(samples: &[(f32, T)], i: usize, fallback: T) -> T {
    samples
        .get(i)
        .or_else(|| samples.last())
        .map_or(fallback, |s| s.1)
}

/// Merges the separately timed translation, rotation, and scale samples
/// of one channel into whole keyframes. Timestamps come from the longest
/// component, with ties going to translation then rotation.
fn merge_channel(channel: &RawChannel) -> Track {
    let count = channel
        .translations
        .len()
        .max(channel.rotations.len())
        .max(channel.scales.len());
    let times: Vec<f32> = if channel.translations.len() == count {
        channel.translations.iter().map(|s| s.0).collect()
    } else if channel.rotations.len() == count {
        channel.rotations.iter().map(|s| s.0).collect()
    } else {
        channel.scales.iter().map(|s| s.0).collect()
    };

    let identity = Transform::default();
    let mut keyframes = Vec::with_capacity(count);
    for (i, time) in times.iter().enumerate() {
        keyframes.push(Keyframe {
            time: *time,
            transform: Transform {
                scale: clamped(&channel.scales, i, identity.scale),
                rotation: clamped(&channel.rotations, i, identity.rotation),
                translation: clamped(
                    &channel.translations,
                    i,
                    identity.translation,
                ),
            },
        });
    }
    Track { keyframes }
}

#[cfg(test)]
mod tests {
    use crate::{
        animation::{
            Animation, Keyframe, RawChannel, RawClip, Track,
            DEFAULT_TICKS_PER_SECOND,
        },
        skeleton::BoneMap,
        transform::Transform,
    };
    use ahash::AHashMap;
    use nalgebra_glm as glm;

    const EPSILON: f32 = 0.0005_f32;

    fn approx_eq(a: f32, b: f32) {
        assert!((b - a).abs() < EPSILON);
    }

    fn vec3_approx_eq(a: &glm::Vec3, b: &glm::Vec3) {
        let c = glm::equal_eps(a, b, EPSILON);
        assert!(c.x && c.y && c.z);
    }

    fn stride_track() -> Track {
        Track {
            keyframes: vec![
                Keyframe {
                    time: 0.0,
                    transform: Transform::default(),
                },
                Keyframe {
                    time: 10.0,
                    transform: Transform {
                        translation: glm::vec3(2.0, 0.0, 0.0),
                        ..Transform::default()
                    },
                },
            ],
        }
    }

    #[test]
    fn segment_factor() {
        let x = super::segment_factor(0.0, 10.0, 7.0);
        approx_eq(x, 0.7_f32);
        let x = super::segment_factor(0.0, 10.0, 12.0);
        approx_eq(x, 1.0_f32);
        let x = super::segment_factor(0.0, 10.0, -2.0);
        approx_eq(x, 0.0_f32);
        let x = super::segment_factor(5.0, 5.0, 5.0);
        approx_eq(x, 0.0_f32);
        let x = super::segment_factor(8.0, 3.0, 4.0);
        approx_eq(x, 0.0_f32);
    }

    #[test]
    fn sample() {
        let track = stride_track();
        let t = track.sample(5.0);
        vec3_approx_eq(&t.translation, &glm::vec3(1.0, 0.0, 0.0));
        let t = track.sample(0.0);
        vec3_approx_eq(&t.translation, &glm::vec3(0.0, 0.0, 0.0));
        // Just before the last key stays in bounds
        let t = track.sample(10.0 - f32::EPSILON);
        assert!(t.translation.x <= 2.0);
        // Past the last key clamps to it
        let t = track.sample(25.0);
        vec3_approx_eq(&t.translation, &glm::vec3(2.0, 0.0, 0.0));
    }

    #[test]
    fn sample_empty() {
        let track = Track::default();
        let t = track.sample(3.0);
        vec3_approx_eq(&t.translation, &glm::Vec3::zeros());
        vec3_approx_eq(&t.scale, &glm::vec3(1.0, 1.0, 1.0));
    }

    #[test]
    fn sample_single() {
        let track = Track {
            keyframes: vec![Keyframe {
                time: 2.0,
                transform: Transform {
                    translation: glm::vec3(3.0, 0.0, 0.0),
                    ..Transform::default()
                },
            }],
        };
        let t = track.sample(0.0);
        vec3_approx_eq(&t.translation, &glm::vec3(3.0, 0.0, 0.0));
        let t = track.sample(50.0);
        vec3_approx_eq(&t.translation, &glm::vec3(3.0, 0.0, 0.0));
    }

    #[test]
    fn sample_duplicate_times() {
        let track = Track {
            keyframes: vec![
                Keyframe {
                    time: 5.0,
                    transform: Transform {
                        translation: glm::vec3(1.0, 0.0, 0.0),
                        ..Transform::default()
                    },
                },
                Keyframe {
                    time: 5.0,
                    transform: Transform {
                        translation: glm::vec3(9.0, 9.0, 9.0),
                        ..Transform::default()
                    },
                },
            ],
        };
        // The degenerate segment resolves to its first key with no NaN
        let t = track.sample(5.0);
        vec3_approx_eq(&t.translation, &glm::vec3(1.0, 0.0, 0.0));
        let t = track.sample(4.0);
        vec3_approx_eq(&t.translation, &glm::vec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn constant_segment() {
        // Two identical keyframes interpolate to themselves at any factor
        let pose = Transform {
            scale: glm::vec3(2.0, 2.0, 2.0),
            rotation: glm::quat_angle_axis(0.5, &glm::vec3(0.0, 0.0, 1.0)),
            translation: glm::vec3(1.0, 2.0, 3.0),
        };
        let track = Track {
            keyframes: vec![
                Keyframe {
                    time: 0.0,
                    transform: pose,
                },
                Keyframe {
                    time: 10.0,
                    transform: pose,
                },
            ],
        };
        for time in [0.0_f32, 2.5, 5.0, 7.5, 10.0] {
            let t = track.sample(time);
            vec3_approx_eq(&t.scale, &pose.scale);
            vec3_approx_eq(&t.translation, &pose.translation);
            // Rotation matches up to quaternion sign
            approx_eq(glm::quat_dot(&t.rotation, &pose.rotation).abs(), 1.0);
        }
    }

    #[test]
    fn advance_wraps() {
        let mut anim = Animation::new("walk", 10.0, 25.0);
        anim.advance(0.2);
        approx_eq(anim.time, 5.0);
        anim.advance(0.2);
        approx_eq(anim.time, 0.0);

        // Many small steps land where one big modulo would
        let mut stepped = Animation::new("walk", 10.0, 25.0);
        for _ in 0..7 {
            stepped.advance(0.1);
        }
        approx_eq(stepped.time, (25.0_f32 * 0.7).rem_euclid(10.0));
    }

    #[test]
    fn advance_zero_duration() {
        let mut anim = Animation::new("pose", 0.0, 25.0);
        anim.advance(1.0);
        approx_eq(anim.time, 0.0);
    }

    #[test]
    fn ticks_default() {
        let anim = Animation::new("broken", 4.0, 0.0);
        approx_eq(anim.ticks_per_second, DEFAULT_TICKS_PER_SECOND);
        let anim = Animation::new("ok", 4.0, 30.0);
        approx_eq(anim.ticks_per_second, 30.0);
    }

    #[test]
    fn merge_channel() {
        let channel = RawChannel {
            translations: vec![
                (0.0, glm::vec3(0.0, 0.0, 0.0)),
                (4.0, glm::vec3(4.0, 0.0, 0.0)),
                (8.0, glm::vec3(8.0, 0.0, 0.0)),
            ],
            rotations: vec![(
                0.0,
                glm::quat_angle_axis(0.3, &glm::vec3(0.0, 1.0, 0.0)),
            )],
            scales: Vec::new(),
        };
        let track = super::merge_channel(&channel);
        assert_eq!(track.keyframes.len(), 3);
        // Timestamps follow the longest component
        approx_eq(track.keyframes[1].time, 4.0);
        approx_eq(track.keyframes[2].time, 8.0);
        // The short rotation track holds its last sample and the missing
        // scale track falls back to identity
        for kf in &track.keyframes {
            approx_eq(
                glm::quat_dot(&kf.transform.rotation, &channel.rotations[0].1)
                    .abs(),
                1.0,
            );
            vec3_approx_eq(&kf.transform.scale, &glm::vec3(1.0, 1.0, 1.0));
        }
        vec3_approx_eq(
            &track.keyframes[2].transform.translation,
            &glm::vec3(8.0, 0.0, 0.0),
        );
    }

    #[test]
    fn from_raw() {
        let mut bones = BoneMap::new();
        bones.get_or_insert("hip", glm::Mat4::identity());

        let mut channels = AHashMap::new();
        channels.insert(
            "hip".to_owned(),
            RawChannel {
                translations: vec![
                    (0.0, glm::vec3(0.0, 0.0, 0.0)),
                    (10.0, glm::vec3(2.0, 0.0, 0.0)),
                ],
                ..RawChannel::default()
            },
        );
        channels.insert(
            "prop".to_owned(),
            RawChannel {
                translations: vec![(0.0, glm::vec3(0.0, 5.0, 0.0))],
                ..RawChannel::default()
            },
        );
        let raw = RawClip {
            name: "walk".to_owned(),
            duration: 10.0,
            ticks_per_second: 0.0,
            channels,
        };

        let anim = Animation::from_raw(&raw, &mut bones);
        // "prop" was not in the skin and joined the map with the next id
        assert_eq!(bones.len(), 2);
        assert_eq!(bones.get("prop").unwrap().id, 1);
        assert_eq!(anim.tracks.len(), 2);
        assert_eq!(anim.tracks[0].keyframes.len(), 2);
        assert_eq!(anim.tracks[1].keyframes.len(), 1);
        approx_eq(anim.ticks_per_second, DEFAULT_TICKS_PER_SECOND);
    }

    #[test]
    fn from_raw_orders_new_bones() {
        let mut bones = BoneMap::new();
        let mut channels = AHashMap::new();
        for name in ["zed", "ant"] {
            channels.insert(
                name.to_owned(),
                RawChannel {
                    translations: vec![(0.0, glm::Vec3::zeros())],
                    ..RawChannel::default()
                },
            );
        }
        let raw = RawClip {
            name: "idle".to_owned(),
            duration: 1.0,
            ticks_per_second: 25.0,
            channels,
        };
        let _anim = Animation::from_raw(&raw, &mut bones);
        // New names are assigned in sorted order, not hash order
        assert_eq!(bones.get("ant").unwrap().id, 0);
        assert_eq!(bones.get("zed").unwrap().id, 1);
    }
}
