//! Demo of baking models into their runtime format using ossein
//!
//! Bakes a glTF file into a binary model file next to it, writes a
//! manifest covering both forms, and then loads everything back through
//! a `ModelCache`.
use ossein::{
    file_import::{bake, AssetEntry, AssetKind, AssetManifest, ModelCache},
    mesh_import::ImportOptions,
};
use std::path::Path;

const FILENAME: &str = "./demos/assets/character.gltf";

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let file_path = if args.len() < 2 {
        FILENAME.to_string()
    } else {
        args[1].clone()
    };

    // Bake next to the source with the extension swapped
    let source = Path::new(&file_path);
    let baked = source.with_extension("model");
    bake::bake_to_file(source, &baked, &ImportOptions::default()).unwrap();

    // A manifest naming both forms of the asset. The source entry makes
    // the cache run the bake step in memory, the baked entry loads the
    // file written above.
    let base = source
        .parent()
        .map_or_else(String::new, |p| p.display().to_string());
    let manifest = AssetManifest {
        base_directory: base,
        assets: vec![
            AssetEntry {
                path: file_name_of(source),
                kind: AssetKind::Source,
            },
            AssetEntry {
                path: file_name_of(&baked),
                kind: AssetKind::Baked,
            },
        ],
    };
    let manifest_path = baked.with_file_name("manifest.yaml");
    manifest.save(&manifest_path).unwrap();
    println!("Wrote {} and {}", baked.display(), manifest_path.display());

    let cache = ModelCache::new();
    cache.load_manifest(&manifest).unwrap();
    let model = cache
        .get(&manifest.resolve(&manifest.assets[1]))
        .unwrap();
    println!("{}: {} parts via cache", baked.display(), model.parts.len());
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
}
