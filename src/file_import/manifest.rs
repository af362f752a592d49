use crate::oss_error::OssError;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// What an `AssetEntry` points at
#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Debug)]
pub enum AssetKind {
    /// A source file for the importer, usually glTF
    Source,
    /// A baked binary model
    Baked,
}

/// One asset in a manifest. `path` is relative to the manifest's
/// `base_directory`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct AssetEntry {
    pub path: String,
    pub kind: AssetKind,
}

/// A YAML description of the assets a scene wants loaded
///
/// Keeping the list in a data file means adding a model does not need a
/// recompile. The manifest does not contain the assets themselves, just
/// paths relative to one base directory.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct AssetManifest {
    pub base_directory: String,
    pub assets: Vec<AssetEntry>,
}

impl AssetManifest {
    /// Resolves an entry's path against the base directory
    #[must_use]
    pub fn resolve(&self, entry: &AssetEntry) -> PathBuf {
        Path::new(&self.base_directory).join(&entry.path)
    }

    /// Loads a manifest from a YAML file
    ///
    /// # Errors
    /// May return `OssError`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, OssError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(OssError::StdIoError)?;
        let manifest: Self = serde_yaml::from_reader(BufReader::new(file))?;
        info!("{:?}: {} assets", path, manifest.assets.len());
        Ok(manifest)
    }

    /// Saves the manifest as YAML
    ///
    /// # Errors
    /// May return `OssError`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), OssError> {
        let file =
            File::create(path.as_ref()).map_err(OssError::StdIoError)?;
        let mut writer = BufWriter::new(file);
        serde_yaml::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> AssetManifest {
        AssetManifest {
            base_directory: "assets".to_owned(),
            assets: vec![
                AssetEntry {
                    path: "rig.gltf".to_owned(),
                    kind: AssetKind::Source,
                },
                AssetEntry {
                    path: "rig.model".to_owned(),
                    kind: AssetKind::Baked,
                },
            ],
        }
    }

    #[test]
    fn yaml_round_trip() {
        let original = manifest();
        let text = serde_yaml::to_string(&original).unwrap();
        let back: AssetManifest = serde_yaml::from_str(&text).unwrap();
        assert_eq!(original, back);
    }

    #[test]
    fn resolve_joins_base() {
        let m = manifest();
        assert_eq!(
            m.resolve(&m.assets[1]),
            Path::new("assets").join("rig.model")
        );
    }
}
