//! Demo of clip playback using ossein
//!
//! Loads a rigged glTF file, plays its first clip for a second of
//! simulated time, and prints where each bone ends up. Pass a model path
//! on the command line to try your own export.
use nalgebra_glm as glm;
use ossein::{
    mesh_import::{Batch, ImportOptions},
    skeleton, Animation, Animator,
};
use std::{path::Path, sync::Arc};

const FILENAME: &str = "./demos/assets/character.gltf";
const SIM_RATE: f32 = 1.0 / 30.0;
const FRAMES: u16 = 30;
const REPORT_EVERY: u16 = 10;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let file_path = if args.len() < 2 {
        FILENAME.to_string()
    } else {
        args[1].clone()
    };

    // Import the file
    let mut batch = Batch::new(ImportOptions::default());
    batch.load(Path::new(&file_path)).unwrap();
    let mut model = batch.into_model().unwrap();

    // Convert the clips before building the skeleton so any helper nodes
    // they animate still end up with bone ids
    let mut clips = Vec::new();
    for raw in &model.clips {
        clips.push(Animation::from_raw(raw, &mut model.bone_map));
    }
    let skeleton = Arc::new(
        skeleton::build(&model.scene_root, &model.bone_map).unwrap(),
    );
    let bone_count = skeleton.bone_count;
    println!(
        "{}: {} parts, {} bones, {} clips",
        file_path,
        model.parts.len(),
        bone_count,
        clips.len()
    );

    let names: Vec<String> = clips.iter().map(|c| c.name.clone()).collect();
    let mut animator = Animator::new(skeleton);
    for clip in clips {
        animator.add_animation(clip).unwrap();
    }

    if let Some(name) = names.first() {
        println!("Playing \"{name}\"");
        animator.select_animation(name, true).unwrap();
    } else {
        println!("No clips found, showing the bind pose");
    }
    for frame in 0..FRAMES {
        animator.update(SIM_RATE);
        if frame % REPORT_EVERY == 0 {
            print_pose(frame, animator.final_bone_matrices(), bone_count);
        }
    }

    // With a second clip available, crossfade into it over a second
    if let (Some(a), Some(b)) = (names.first(), names.get(1)) {
        println!("Crossfading \"{a}\" into \"{b}\"");
        for frame in 0..FRAMES {
            let factor = f32::from(frame) / f32::from(FRAMES);
            animator.blend_between(a, b, factor, SIM_RATE).unwrap();
        }
        print_pose(FRAMES, animator.final_bone_matrices(), bone_count);
    }
}

/// Prints the translation part of every skinning matrix
fn print_pose(frame: u16, matrices: &[glm::Mat4], count: usize) {
    println!("frame {frame}:");
    for (id, m) in matrices.iter().take(count).enumerate() {
        println!(
            "  bone {id}: ({:.3}, {:.3}, {:.3})",
            m[(0, 3)],
            m[(1, 3)],
            m[(2, 3)]
        );
    }
}
