use std::{error, fmt};

/// Unified error type
///
/// Some foreign error types are large so are boxed to keep the size of
/// the enum down.
#[derive(Debug)]
pub enum OssError {
    InvalidFile,
    FileTooShort,
    DataNotConverted,
    UnsupportedFormat,
    WrongAssetType,
    WrongVersion(u32),
    BoneNotInMap(String),
    ClipNotFound(String),
    DuplicateClip(String),
    BoneCountTooLarge,
    IndexCountTooLarge,
    VertexCountTooLarge,
    SerdeYamlError(Box<serde_yaml::Error>),
    StdIoError(std::io::Error),
    GltfError(Box<gltf::Error>),
    ImportError(crate::mesh_import::ImportError),
}

impl error::Error for OssError {}

impl fmt::Display for OssError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidFile => write!(f, "invalid file"),
            Self::FileTooShort => write!(f, "file too short"),
            Self::DataNotConverted => {
                write!(f, "data could not convert to a valid value")
            }
            Self::UnsupportedFormat => write!(f, "format is not supported"),
            Self::WrongAssetType => write!(f, "file is not a model asset"),
            Self::WrongVersion(v) => {
                write!(f, "model asset version {v} is not supported")
            }
            Self::BoneNotInMap(name) => {
                write!(f, "bone \"{name}\" is not in the bone map")
            }
            Self::ClipNotFound(name) => {
                write!(f, "animation \"{name}\" has not been added")
            }
            Self::DuplicateClip(name) => {
                write!(f, "animation \"{name}\" has already been added")
            }
            Self::BoneCountTooLarge => {
                write!(f, "node count does not fit in 32 bits")
            }
            Self::IndexCountTooLarge => {
                write!(f, "index count does not fit in 32 bits")
            }
            Self::VertexCountTooLarge => {
                write!(f, "vertex count does not fit in 32 bits")
            }
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
            Self::StdIoError(e) => write!(f, "std::io::Error: {}", e.kind()),
            Self::GltfError(e) => {
                write!(f, "gltf Error: {e}")
            }
            Self::ImportError(e) => write!(f, "import error: {e}"),
        }
    }
}

impl From<serde_yaml::Error> for OssError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}

impl From<std::io::Error> for OssError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl From<crate::mesh_import::ImportError> for OssError {
    fn from(e: crate::mesh_import::ImportError) -> Self {
        Self::ImportError(e)
    }
}
