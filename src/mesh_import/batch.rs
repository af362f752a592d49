use super::{
    gltf_file,
    types::{ImportOptions, ImportedModel},
};
use crate::oss_error::OssError;
use log::{info, warn};
use std::path::Path;

/// A batch is used to load multiple files into one model. A common
/// workflow keeps the rig and mesh in one file and each animation in its
/// own file, all exported from the same source. The first file loaded is
/// authoritative for the meshes, the bone map, and the scene tree. Files
/// loaded after that contribute their animation clips only.
pub struct Batch {
    pub options: ImportOptions,
    pub model: Option<ImportedModel>,
}

impl Batch {
    #[must_use]
    pub const fn new(options: ImportOptions) -> Self {
        Self {
            options,
            model: None,
        }
    }

    /// Loads a glTF file into this batch. The first file becomes the
    /// model. Later files only have their animation clips appended, and a
    /// warning is logged if they carry mesh parts since those are ignored.
    /// Clips may reference bones the model file does not, which is fine.
    /// They are resolved by name later when the clip is turned into an
    /// `Animation`.
    ///
    /// # Errors
    /// May return `OssError`
    pub fn load(&mut self, path: &Path) -> Result<(), OssError> {
        let imported = gltf_file::load(path, &self.options)?;
        if let Some(ref mut model) = self.model {
            if !imported.parts.is_empty() {
                warn!(
                    "{:?}: {} mesh parts ignored, model already loaded",
                    path,
                    imported.parts.len(),
                );
            }
            let count = imported.clips.len();
            model.clips.extend(imported.clips);
            info!("{:?}: merged {} clips", path, count);
        } else {
            self.model = Some(imported);
        }
        Ok(())
    }

    /// Consumes the batch and returns the combined model
    ///
    /// # Errors
    /// Returns `OssError::DataNotConverted` if nothing was loaded
    pub fn into_model(self) -> Result<ImportedModel, OssError> {
        self.model.ok_or(OssError::DataNotConverted)
    }
}
