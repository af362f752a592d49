use crate::{
    mesh_import::{gltf_file, ImportOptions},
    model_format::{self, BakedModel},
    oss_error::OssError,
};
use log::info;
use std::path::Path;

/// Imports a glTF file and arranges it into the baked model layout
///
/// The baked layout carries geometry only. The rig and the animation
/// clips still come from the source file, since those are cheap to import
/// compared to the mesh data.
///
/// # Errors
/// May return `OssError`
pub fn bake_model(
    path: &Path,
    options: &ImportOptions,
) -> Result<BakedModel, OssError> {
    let imported = gltf_file::load(path, options)?;
    Ok(BakedModel {
        parts: imported.parts,
    })
}

/// Bakes a glTF file into a binary model file
///
/// # Errors
/// May return `OssError`
pub fn bake_to_file(
    source: &Path,
    dest: &Path,
    options: &ImportOptions,
) -> Result<(), OssError> {
    let model = bake_model(source, options)?;
    model_format::save(dest, &model)?;
    info!("Baked {:?} to {:?}", source, dest);
    Ok(())
}
