//! End to end tests for the animation pipeline
//!
//! These go through the public surface only: build a `BoneMap` and a
//! scene tree, convert raw clips, build the skeleton, and read poses
//! back out of an `Animator`. Bone level details are covered by the
//! unit tests inside the crate.

use ahash::AHashMap;
use log::info;
use nalgebra_glm as glm;
use ossein::{
    animation::{Animation, RawChannel, RawClip},
    skeleton::{self, BoneMap, SceneNode, Skeleton},
    Animator,
};
use std::sync::{Arc, Once};

const EPSILON: f32 = 0.0005f32; // Small value for float comparisons
static INIT: Once = Once::new();

/// Initializes logging in a "once per test run" manner. Call at the start of
/// each test that needs logging.
fn init_tests() {
    INIT.call_once(|| {
        env_logger::init();
    });
}

/// Compare two vectors for approximate equality
fn compare_vec3(v1: &glm::Vec3, v2: &glm::Vec3) {
    let c = glm::equal_eps(v1, v2, EPSILON);
    assert!(c.x && c.y && c.z);
}

/// Translation column of a skinning matrix
fn translation_of(m: &glm::Mat4) -> glm::Vec3 {
    glm::vec3(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

fn leaf(name: &str) -> SceneNode {
    SceneNode {
        name: name.to_owned(),
        transform: glm::Mat4::identity(),
        children: Vec::new(),
    }
}

/// A flat rig: one root with bones "a" and "b" as siblings, so their
/// animated translations do not compose with each other
fn sibling_scene() -> SceneNode {
    SceneNode {
        name: "armature".to_owned(),
        transform: glm::Mat4::identity(),
        children: vec![leaf("a"), leaf("b")],
    }
}

fn sibling_bones() -> BoneMap {
    let mut bones = BoneMap::new();
    bones.get_or_insert("a", glm::Mat4::identity());
    bones.get_or_insert("b", glm::Mat4::identity());
    bones
}

/// A channel that only translates, keyed at the given times
fn translation_channel(samples: &[(f32, glm::Vec3)]) -> RawChannel {
    RawChannel {
        translations: samples.to_vec(),
        ..RawChannel::default()
    }
}

/// Tests playback timing from wall clock deltas through `update`
#[test]
fn timed_playback() {
    init_tests();

    let mut bones = sibling_bones();
    let mut channels = AHashMap::new();
    channels.insert(
        "a".to_owned(),
        translation_channel(&[
            (0.0f32, glm::Vec3::zeros()),
            (10.0f32, glm::vec3(2.0, 0.0, 0.0)),
        ]),
    );
    channels.insert(
        "b".to_owned(),
        translation_channel(&[
            (0.0f32, glm::Vec3::zeros()),
            (10.0f32, glm::vec3(0.0, 4.0, 0.0)),
        ]),
    );
    let raw = RawClip {
        name: "move".to_owned(),
        duration: 10.0f32,
        ticks_per_second: 25.0f32,
        channels,
    };
    let clip = Animation::from_raw(&raw, &mut bones);

    let scene = sibling_scene();
    let skeleton = Arc::new(skeleton::build(&scene, &bones).unwrap());
    let mut animator = Animator::new(skeleton);
    animator.add_animation(clip).unwrap();
    animator.select_animation("move", true).unwrap();

    // Four 50 ms steps at 25 ticks per second put the playhead at tick 5,
    // halfway through both tracks
    for _ in 0..4 {
        animator.update(0.05f32);
    }
    let out = animator.final_bone_matrices();
    info!("timed_playback a={:?} b={:?}", out[0], out[1]);
    compare_vec3(&translation_of(&out[0]), &glm::vec3(1.0, 0.0, 0.0));
    compare_vec3(&translation_of(&out[1]), &glm::vec3(0.0, 2.0, 0.0));

    // Reselecting from the start rewinds to the first keys
    animator.select_animation("move", true).unwrap();
    animator.update(0.0f32);
    let out = animator.final_bone_matrices();
    compare_vec3(&translation_of(&out[0]), &glm::Vec3::zeros());
    compare_vec3(&translation_of(&out[1]), &glm::Vec3::zeros());
}

/// Tests `blend_between` mixing and factor clamping
#[test]
fn blend_crossfade() {
    init_tests();

    let mut bones = sibling_bones();
    let mut make_clip = |name: &str, a: glm::Vec3, b: glm::Vec3| {
        let mut channels = AHashMap::new();
        channels.insert("a".to_owned(), translation_channel(&[(0.0f32, a)]));
        channels.insert("b".to_owned(), translation_channel(&[(0.0f32, b)]));
        let raw = RawClip {
            name: name.to_owned(),
            duration: 10.0f32,
            ticks_per_second: 25.0f32,
            channels,
        };
        Animation::from_raw(&raw, &mut bones)
    };
    let walk =
        make_clip("walk", glm::vec3(1.0, 0.0, 0.0), glm::vec3(0.0, 1.0, 0.0));
    let run =
        make_clip("run", glm::vec3(3.0, 0.0, 0.0), glm::vec3(0.0, 3.0, 0.0));

    let scene = sibling_scene();
    let skeleton = Arc::new(skeleton::build(&scene, &bones).unwrap());
    let mut animator = Animator::new(skeleton);
    animator.add_animation(walk).unwrap();
    animator.add_animation(run).unwrap();

    animator.blend_between("walk", "run", 0.25f32, 0.016f32).unwrap();
    let out = animator.final_bone_matrices();
    info!("blend_crossfade 0.25 a={:?}", translation_of(&out[0]));
    compare_vec3(&translation_of(&out[0]), &glm::vec3(1.5, 0.0, 0.0));
    compare_vec3(&translation_of(&out[1]), &glm::vec3(0.0, 1.5, 0.0));

    // Out of range factors clamp to the nearer clip
    animator.blend_between("walk", "run", 7.5f32, 0.016f32).unwrap();
    let out = animator.final_bone_matrices();
    compare_vec3(&translation_of(&out[0]), &glm::vec3(3.0, 0.0, 0.0));

    animator.blend_between("walk", "run", -3.0f32, 0.016f32).unwrap();
    let out = animator.final_bone_matrices();
    compare_vec3(&translation_of(&out[0]), &glm::vec3(1.0, 0.0, 0.0));
}

/// Tests clips extending the bone map before the skeleton is built
#[test]
fn clip_extends_bone_map() {
    init_tests();

    // Only "a" comes from the skin. The clip animates "prop", which is in
    // the scene but not in any skin.
    let mut bones = BoneMap::new();
    bones.get_or_insert("a", glm::Mat4::identity());

    let mut channels = AHashMap::new();
    channels.insert(
        "prop".to_owned(),
        translation_channel(&[(0.0f32, glm::vec3(0.0, 5.0, 0.0))]),
    );
    let raw = RawClip {
        name: "carry".to_owned(),
        duration: 10.0f32,
        ticks_per_second: 25.0f32,
        channels,
    };

    // Converting the clip first grows the map, so building the skeleton
    // afterwards turns the prop node into a bone
    let clip = Animation::from_raw(&raw, &mut bones);
    assert_eq!(bones.len(), 2);
    assert_eq!(bones.get("prop").unwrap().id, 1);

    let scene = SceneNode {
        name: "armature".to_owned(),
        transform: glm::Mat4::identity(),
        children: vec![leaf("a"), leaf("prop")],
    };
    let skeleton = Arc::new(skeleton::build(&scene, &bones).unwrap());
    assert_eq!(skeleton.bone_count, 2);

    let mut animator = Animator::new(skeleton);
    animator.add_animation(clip).unwrap();
    animator.select_animation("carry", true).unwrap();
    animator.update(0.0f32);
    let out = animator.final_bone_matrices();
    info!("clip_extends_bone_map prop={:?}", translation_of(&out[1]));
    compare_vec3(&translation_of(&out[1]), &glm::vec3(0.0, 5.0, 0.0));
    // The skinned bone holds its bind pose, identity here
    compare_vec3(&translation_of(&out[0]), &glm::Vec3::zeros());
}

/// Tests the root inverse and the inverse bind offsets in the output
#[test]
fn root_inverse_and_offsets() {
    init_tests();

    // A root placed away from the origin must not leak into skinning
    // matrices, and the bone's offset multiplies on the right
    let mut bones = BoneMap::new();
    bones.get_or_insert("a", glm::translation(&glm::vec3(-1.0, 0.0, 0.0)));
    let scene = SceneNode {
        name: "armature".to_owned(),
        transform: glm::translation(&glm::vec3(0.0, 0.0, 5.0)),
        children: vec![SceneNode {
            name: "a".to_owned(),
            transform: glm::translation(&glm::vec3(0.0, 1.0, 0.0)),
            children: Vec::new(),
        }],
    };
    let skeleton: Arc<Skeleton> =
        Arc::new(skeleton::build(&scene, &bones).unwrap());

    let mut animator = Animator::new(skeleton);
    animator.update(0.1f32);
    let out = animator.final_bone_matrices();
    info!("root_inverse_and_offsets a={:?}", translation_of(&out[0]));
    compare_vec3(&translation_of(&out[0]), &glm::vec3(-1.0, 1.0, 0.0));
}
