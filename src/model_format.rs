//! Binary model asset format
//!
//! Baking a model writes the imported geometry in the exact layout the
//! runtime wants, so loading it back skips the scene importer entirely.
//! The format is little endian with no compression and no checksum. Reads
//! are strict: every count is trusted to describe the bytes that follow,
//! and a truncated stream fails instead of returning partial data.
use crate::{
    mesh_import::{MeshData, PartData},
    oss_error::OssError,
    types::MAX_BONE_INFLUENCE,
    vertex::SkinnedVertex,
};
use bytemuck::{Pod, Zeroable};
use log::{debug, info};
use nalgebra_glm as glm;
use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
};

/// Tag at the start of every model asset file
pub const ASSET_TAG: &str = "MODEL";

/// Format version written by this build
pub const VERSION: u32 = 1;

/// A model processed into its runtime form
///
/// This is the output of the offline bake step and the input to the
/// runtime model cache. `write` and `read` round trip it exactly.
#[derive(Default)]
pub struct BakedModel {
    pub parts: Vec<PartData>,
}

// On disk the bone ids are floats, matching the vertex layout the GPU
// reads. Ids are far below the point where f32 loses integers, so the
// conversion is exact in both directions.
#[repr(C)]
#[derive(Clone, Copy, Zeroable, Pod)]
struct FileVertex {
    position: [f32; 3],
    normal: [f32; 3],
    tangent: [f32; 3],
    tex_coord: [f32; 2],
    bitangent: [f32; 3],
    bone_ids: [f32; MAX_BONE_INFLUENCE],
    weights: [f32; MAX_BONE_INFLUENCE],
}

impl From<&SkinnedVertex> for FileVertex {
    fn from(v: &SkinnedVertex) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let bone_ids = v.bone_ids.map(|id| id as f32);
        Self {
            position: v.position,
            normal: v.normal,
            tangent: v.tangent,
            tex_coord: v.tex_coord,
            bitangent: v.bitangent,
            bone_ids,
            weights: v.weights,
        }
    }
}

impl From<&FileVertex> for SkinnedVertex {
    fn from(v: &FileVertex) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let bone_ids = v.bone_ids.map(|id| id as i32);
        Self {
            position: v.position,
            normal: v.normal,
            tangent: v.tangent,
            tex_coord: v.tex_coord,
            bitangent: v.bitangent,
            bone_ids,
            weights: v.weights,
        }
    }
}

fn read_bytes<R: Read>(
    reader: &mut R,
    buffer: &mut [u8],
) -> Result<(), OssError> {
    reader.read_exact(buffer).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            OssError::FileTooShort
        } else {
            OssError::StdIoError(e)
        }
    })
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, OssError> {
    let mut buffer = [0u8; 4];
    read_bytes(reader, &mut buffer)?;
    Ok(u32::from_le_bytes(buffer))
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32, OssError> {
    let mut buffer = [0u8; 4];
    read_bytes(reader, &mut buffer)?;
    Ok(i32::from_le_bytes(buffer))
}

// Counts are stored as i32, so a negative value means a corrupt file
fn read_length<R: Read>(reader: &mut R) -> Result<usize, OssError> {
    let count = read_i32(reader)?;
    usize::try_from(count).map_err(|_| OssError::InvalidFile)
}

fn read_string<R: Read>(reader: &mut R) -> Result<String, OssError> {
    let len = usize::try_from(read_u32(reader)?)
        .map_err(|_| OssError::InvalidFile)?;
    let mut buffer = vec![0u8; len];
    read_bytes(reader, &mut buffer)?;
    String::from_utf8(buffer).map_err(|_| OssError::InvalidFile)
}

fn read_mat4<R: Read>(reader: &mut R) -> Result<glm::Mat4, OssError> {
    let mut buffer = [0u8; 64];
    read_bytes(reader, &mut buffer)?;
    let mut floats = [0.0f32; 16];
    for (f, chunk) in floats.iter_mut().zip(buffer.chunks_exact(4)) {
        *f = f32::from_le_bytes(
            chunk.try_into().map_err(|_| OssError::DataNotConverted)?,
        );
    }
    Ok(glm::Mat4::from_column_slice(&floats))
}

fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<(), OssError> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<(), OssError> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<(), OssError> {
    let len =
        u32::try_from(value.len()).map_err(|_| OssError::DataNotConverted)?;
    write_u32(writer, len)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

// Matrices are 64 bytes of column major floats
fn write_mat4<W: Write>(
    writer: &mut W,
    value: &glm::Mat4,
) -> Result<(), OssError> {
    for f in value.iter() {
        writer.write_all(&f.to_le_bytes())?;
    }
    Ok(())
}

fn read_mesh<R: Read>(reader: &mut R) -> Result<MeshData, OssError> {
    let name = read_string(reader)?;
    let mesh_index = read_i32(reader)?;
    let transform = read_mat4(reader)?;

    let index_count = read_length(reader)?;
    let mut indices = vec![0u32; index_count];
    read_bytes(reader, bytemuck::cast_slice_mut(&mut indices))?;

    let vertex_count = read_length(reader)?;
    let mut file_verts = vec![FileVertex::zeroed(); vertex_count];
    read_bytes(reader, bytemuck::cast_slice_mut(&mut file_verts))?;
    let vertices = file_verts.iter().map(Into::into).collect();

    Ok(MeshData {
        name,
        mesh_index,
        transform,
        indices,
        vertices,
    })
}

fn write_mesh<W: Write>(
    writer: &mut W,
    mesh: &MeshData,
) -> Result<(), OssError> {
    write_string(writer, &mesh.name)?;
    write_i32(writer, mesh.mesh_index)?;
    write_mat4(writer, &mesh.transform)?;

    // Index and vertex arrays are raw bytes, which assumes a little
    // endian target like the rest of the format
    let index_count = i32::try_from(mesh.indices.len())
        .map_err(|_| OssError::IndexCountTooLarge)?;
    write_i32(writer, index_count)?;
    writer.write_all(bytemuck::cast_slice(&mesh.indices))?;

    let vertex_count = i32::try_from(mesh.vertices.len())
        .map_err(|_| OssError::VertexCountTooLarge)?;
    write_i32(writer, vertex_count)?;
    let file_verts: Vec<FileVertex> =
        mesh.vertices.iter().map(Into::into).collect();
    writer.write_all(bytemuck::cast_slice(&file_verts))?;
    Ok(())
}

/// Reads a baked model from a stream
///
/// The stream must start with the model asset tag and a supported
/// version, which are validated before anything else is trusted.
///
/// # Errors
/// May return `OssError`, including `FileTooShort` for a truncated
/// stream, `WrongAssetType` for a bad tag, and `WrongVersion` for an
/// unsupported version
pub fn read<R: Read>(reader: &mut R) -> Result<BakedModel, OssError> {
    let tag = read_string(reader)?;
    if tag != ASSET_TAG {
        return Err(OssError::WrongAssetType);
    }
    let version = read_u32(reader)?;
    if version != VERSION {
        return Err(OssError::WrongVersion(version));
    }

    let part_count = read_length(reader)?;
    let mut parts = Vec::with_capacity(part_count);
    for _ in 0..part_count {
        let name = read_string(reader)?;
        let mesh_count = read_length(reader)?;
        let mut meshes = Vec::with_capacity(mesh_count);
        for _ in 0..mesh_count {
            meshes.push(read_mesh(reader)?);
        }
        parts.push(PartData { name, meshes });
    }
    debug!("Read model with {} parts", parts.len());
    Ok(BakedModel { parts })
}

/// Writes a baked model to a stream
///
/// # Errors
/// May return `OssError`
pub fn write<W: Write>(
    writer: &mut W,
    model: &BakedModel,
) -> Result<(), OssError> {
    write_string(writer, ASSET_TAG)?;
    write_u32(writer, VERSION)?;
    let part_count = i32::try_from(model.parts.len())
        .map_err(|_| OssError::DataNotConverted)?;
    write_i32(writer, part_count)?;
    for part in &model.parts {
        write_string(writer, &part.name)?;
        let mesh_count = i32::try_from(part.meshes.len())
            .map_err(|_| OssError::DataNotConverted)?;
        write_i32(writer, mesh_count)?;
        for mesh in &part.meshes {
            write_mesh(writer, mesh)?;
        }
    }
    Ok(())
}

/// Reads a baked model from a file
///
/// # Errors
/// May return `OssError`
pub fn load<P: AsRef<Path>>(path: P) -> Result<BakedModel, OssError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(OssError::StdIoError)?;
    let mut reader = io::BufReader::new(file);
    let model = read(&mut reader)?;
    info!("{:?}: {} parts", path, model.parts.len());
    Ok(model)
}

/// Writes a baked model to a file, replacing anything already there
///
/// # Errors
/// May return `OssError`
pub fn save<P: AsRef<Path>>(
    path: P,
    model: &BakedModel,
) -> Result<(), OssError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(OssError::StdIoError)?;
    let mut writer = io::BufWriter::new(file);
    write(&mut writer, model)?;
    writer.flush()?;
    info!("{:?}: wrote {} parts", path, model.parts.len());
    Ok(())
}
