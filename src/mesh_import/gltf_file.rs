use super::types::{
    ImportError, ImportOptions, ImportedModel, MeshData, PartData,
};
use crate::{
    animation::{RawChannel, RawClip},
    oss_error::OssError,
    skeleton::{BoneMap, SceneNode},
    types::MAX_BONE_INFLUENCE,
    vertex::SkinnedVertex,
};
use ahash::AHashMap;
use gltf::{
    accessor::Dimensions,
    animation::util::ReadOutputs,
    buffer::{self, Data},
    mesh::util::{ReadNormals, ReadPositions, ReadTangents},
    mesh::Mode,
    Document, Gltf, Node, Primitive, Scene, Semantic,
};
use itertools::Itertools;
use log::{debug, error, info, trace, warn};
use nalgebra_glm as glm;
use smallvec::SmallVec;
use std::{fs, io, path::Path};

// Validate a glTF primitive for compatibility. Returns index and vertex count.
fn validate(p: &Primitive) -> Result<(usize, usize), OssError> {
    // Mesh must be made of indexed triangles
    if p.mode() != Mode::Triangles {
        error!("Not a triangle mesh");
        Err(ImportError::NoTriangles)?;
    }
    let indices = p.indices().ok_or(ImportError::NoIndices)?;
    let idx_count = indices.count();

    // Positions are required
    let positions =
        p.get(&Semantic::Positions).ok_or(ImportError::NoPositions)?;
    let vert_count = positions.count();

    // Normals are required. There must be the same number of normals as
    // there are positions.
    let normals = p.get(&Semantic::Normals).ok_or(ImportError::NoNormals)?;
    if normals.count() != vert_count {
        Err(ImportError::CountMismatch)?;
    }

    // Tangents are optional, but if they are provided there must be the same
    // number as there are positions
    if let Some(tangents) = p.get(&Semantic::Tangents) {
        if tangents.count() != vert_count {
            Err(ImportError::CountMismatch)?;
        }
    }

    // Texture coordinates (UVs) are optional, but if they are provided they
    // must be in Vec2 and the same number as there are positions
    let uv_option = p.get(&Semantic::TexCoords(0));
    if let Some(ref uv) = uv_option {
        if uv.count() != vert_count {
            Err(ImportError::CountMismatch)?;
        }
        if uv.dimensions() != Dimensions::Vec2 {
            Err(OssError::UnsupportedFormat)?;
        }
    }

    // Joint data is optional, but if it is provided there must be both
    // indices and weights and the same number as there are positions
    let joint_option = p.get(&Semantic::Joints(0));
    if let Some(ref joints) = joint_option {
        if joints.count() != vert_count {
            Err(ImportError::CountMismatch)?;
        }
        let weights =
            p.get(&Semantic::Weights(0)).ok_or(ImportError::NoWeights)?;
        if weights.count() != vert_count {
            Err(ImportError::CountMismatch)?;
        }
    }

    // A little info
    info!(
        "Primitive={}, Index count={}, Vertex count={}, Has UV={}, Has joints={}",
        p.index(),
        idx_count,
        vert_count,
        uv_option.is_some(),
        joint_option.is_some(),
    );

    Ok((idx_count, vert_count))
}

fn load_impl<P>(path: P) -> Result<(Document, Vec<buffer::Data>), OssError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let base = path.parent().unwrap_or_else(|| Path::new("./"));
    let file = fs::File::open(path).map_err(OssError::StdIoError)?;
    let reader = io::BufReader::new(file);
    let gltf = Gltf::from_reader(reader)
        .map_err(|e| OssError::GltfError(Box::new(e)))?;
    let buffers = gltf::import_buffers(&gltf.document, Some(base), gltf.blob)
        .map_err(|e| OssError::GltfError(Box::new(e)))?;

    // Some info
    let buffer_count = buffers.len();
    info!(
        "{:?}, base path={:?}, buffer count={}, first buffer length={}",
        path,
        base,
        buffer_count,
        buffers.first().map_or(0, |b| b.len()),
    );
    if buffer_count != 1 {
        warn!("buffer count={} is not 1", buffer_count);
    }

    Ok((gltf.document, buffers))
}

/// Nodes are matched to bones by name, so unnamed nodes get one made up
/// from their index
fn node_name(node: &Node) -> String {
    node.name()
        .map_or_else(|| format!("node.{}", node.index()), ToString::to_string)
}

fn convert_node(node: &Node) -> SceneNode {
    SceneNode {
        name: node_name(node),
        transform: node.transform().matrix().into(),
        children: node.children().map(|child| convert_node(&child)).collect(),
    }
}

// Converts the scene into a tree with a single root. glTF allows several
// root nodes, in which case an identity root is created to hold them.
fn scene_tree(scene: &Scene) -> Result<SceneNode, OssError> {
    let mut roots: Vec<SceneNode> =
        scene.nodes().map(|node| convert_node(&node)).collect();
    match roots.len() {
        0 => Err(ImportError::EmptyScene.into()),
        1 => Ok(roots.remove(0)),
        n => {
            debug!("Scene has {} root nodes, adding a common root", n);
            Ok(SceneNode {
                name: "scene".to_owned(),
                transform: glm::Mat4::identity(),
                children: roots,
            })
        }
    }
}

// Collects every skin into one bone map. The returned lookup tables give
// the bone id for each position in a skin's joint array, which is what the
// JOINTS_n vertex attributes index into.
fn load_bones(
    document: &Document,
    buffers: &[Data],
) -> Result<(BoneMap, Vec<Vec<i32>>), OssError> {
    let mut bones = BoneMap::new();
    let mut lookups = Vec::new();
    for skin in document.skins() {
        let reader = skin.reader(|x| Some(&buffers[x.index()]));
        let Some(iter) = reader.read_inverse_bind_matrices() else {
            error!("skin {} is missing inverse bind matrices", skin.index());
            return Err(ImportError::NoInverseBind.into());
        };
        let mut lookup = Vec::new();
        for (ibm, node) in iter.zip(skin.joints()) {
            let name = node_name(&node);
            let offset: glm::Mat4 = ibm.into();
            lookup.push(bones.get_or_insert(&name, offset));
        }
        debug!("skin {}: {} joints", skin.index(), lookup.len());
        lookups.push(lookup);
    }
    Ok((bones, lookups))
}

#[allow(clippy::too_many_lines)]
fn load_primitive(
    p: &Primitive,
    buffers: &[Data],
    scale: f32,
    joint_lookup: Option<&[i32]>,
) -> Result<(Vec<u32>, Vec<SkinnedVertex>), OssError> {
    let (idx_count, vert_count) = validate(p)?;

    // Create a reader for the data buffer
    let reader = p.reader(|x| Some(&buffers[x.index()]));

    let idx_data = reader.read_indices().ok_or(ImportError::NoIndices)?;
    let indices: Vec<u32> = idx_data.into_u32().collect();
    if indices.len() != idx_count {
        error!("Index count mismatch {} != {}", idx_count, indices.len());
        Err(ImportError::CountMismatch)?;
    }

    // Read and store positions, scaling if needed
    let mut verts = Vec::with_capacity(vert_count);
    let pos_data = reader.read_positions().ok_or(ImportError::NoPositions)?;
    let ReadPositions::Standard(it) = pos_data else {
        warn!("Unsupported sparse position format");
        return Err(ImportError::SparseMesh.into());
    };
    for pos in it {
        let v = SkinnedVertex {
            position: [pos[0] * scale, pos[1] * scale, pos[2] * scale],
            ..Default::default()
        };
        verts.push(v);
    }

    let norm_data = reader.read_normals().ok_or(ImportError::NoNormals)?;
    let ReadNormals::Standard(it) = norm_data else {
        warn!("Unsupported sparse normal format");
        return Err(ImportError::SparseMesh.into());
    };
    for (i, norm) in it.enumerate() {
        if i < verts.len() {
            verts[i].normal = norm;
        }
    }

    // Tangents are optional. The w component holds the handedness that
    // recovers the bitangent from the cross product.
    if let Some(tan_data) = reader.read_tangents() {
        let ReadTangents::Standard(it) = tan_data else {
            warn!("Unsupported sparse tangent format");
            return Err(ImportError::SparseMesh.into());
        };
        for (i, tan) in it.enumerate() {
            if i < verts.len() {
                let normal = glm::Vec3::from(verts[i].normal);
                let tangent = glm::vec3(tan[0], tan[1], tan[2]);
                verts[i].tangent = tangent.into();
                verts[i].bitangent =
                    (glm::cross(&normal, &tangent) * tan[3]).into();
            }
        }
    }

    // Read and store the texture coordinates if they exist
    if let Some(uv_data) = reader.read_tex_coords(0) {
        for (i, uv) in uv_data.into_f32().enumerate() {
            if i < verts.len() {
                verts[i].tex_coord = uv;
            }
        }
    }

    // Influences can be spread over several joint and weight sets. Gather
    // all of them, then keep the strongest and renormalize so the kept
    // weights still sum to one.
    let mut influences: Vec<SmallVec<[(i32, f32); 8]>> =
        vec![SmallVec::new(); verts.len()];
    let mut set = 0u32;
    while let Some(joint_data) = reader.read_joints(set) {
        let lookup = joint_lookup.ok_or(ImportError::NoSkin)?;
        let weight_data = reader
            .read_weights(set)
            .ok_or(ImportError::NoWeights)?
            .into_f32();
        for (i, (ids, weights)) in
            joint_data.into_u16().zip(weight_data).enumerate()
        {
            trace!("Joint ids={:?} weights={:?}", ids, weights);
            if let Some(slots) = influences.get_mut(i) {
                for (id, weight) in ids.iter().zip(weights) {
                    if weight <= 0.0 {
                        continue;
                    }
                    if let Some(&bone) = lookup.get(usize::from(*id)) {
                        slots.push((bone, weight));
                    }
                }
            }
        }
        set += 1;
    }
    for (vert, candidates) in verts.iter_mut().zip(influences) {
        if candidates.is_empty() {
            continue;
        }
        let kept: SmallVec<[(i32, f32); MAX_BONE_INFLUENCE]> = candidates
            .into_iter()
            .sorted_by(|a, b| b.1.total_cmp(&a.1))
            .take(MAX_BONE_INFLUENCE)
            .collect();
        let total: f32 = kept.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            continue;
        }
        for (slot, (bone, weight)) in kept.into_iter().enumerate() {
            vert.bone_ids[slot] = bone;
            vert.weights[slot] = weight / total;
        }
    }

    // Validate that we have the expected amount of information
    if vert_count != verts.len() {
        error!("Vertex count mismatch {} != {}", vert_count, verts.len());
        Err(ImportError::CountMismatch)?;
    }

    Ok((indices, verts))
}

fn collect_parts(
    node: &Node,
    buffers: &[Data],
    parent: &glm::Mat4,
    options: &ImportOptions,
    lookups: &[Vec<i32>],
    parts: &mut Vec<PartData>,
) -> Result<(), OssError> {
    let local: glm::Mat4 = node.transform().matrix().into();
    let global = parent * local;

    if let Some(mesh) = node.mesh() {
        info!("mesh={}, name={:?}", mesh.index(), mesh.name());
        let mesh_index = i32::try_from(mesh.index())
            .map_err(|_| OssError::DataNotConverted)?;
        let mesh_name = mesh.name().map_or_else(
            || format!("mesh.{}", mesh.index()),
            ToString::to_string,
        );
        let joint_lookup = node
            .skin()
            .and_then(|s| lookups.get(s.index()))
            .map(Vec::as_slice);
        let mut meshes = Vec::new();
        for p in mesh.primitives() {
            let (indices, vertices) =
                load_primitive(&p, buffers, options.scale, joint_lookup)?;
            meshes.push(MeshData {
                name: mesh_name.clone(),
                mesh_index,
                transform: global,
                indices,
                vertices,
            });
        }
        parts.push(PartData {
            name: node_name(node),
            meshes,
        });
    }

    for child in node.children() {
        collect_parts(&child, buffers, &global, options, lookups, parts)?;
    }
    Ok(())
}

fn load_raw_clips(
    document: &Document,
    buffers: &[Data],
) -> Result<Vec<RawClip>, OssError> {
    use gltf::accessor::Iter;

    let mut ret = Vec::new();
    for animation in document.animations() {
        debug!("animation name={:?}", animation.name());
        let mut channels = AHashMap::<String, RawChannel>::new();
        let mut duration = 0.0f32;

        for channel in animation.channels() {
            let target = node_name(&channel.target().node());
            if channel.sampler().interpolation()
                == gltf::animation::Interpolation::CubicSpline
            {
                warn!(
                    "animation {} node {} cubic spline not supported, channel skipped",
                    animation.index(),
                    target,
                );
                continue;
            }
            // Step channels are kept and sampled as linear
            let reader = channel.reader(|x| Some(&buffers[x.index()]));
            let times: Vec<f32> = if let Some(inputs) = reader.read_inputs() {
                match inputs {
                    Iter::Standard(times) => times.collect(),
                    Iter::Sparse(_) => {
                        error!("Unsupported sparse animation format");
                        return Err(ImportError::SparseAnimation.into());
                    }
                }
            } else {
                error!("Animation does not contain a sampler");
                return Err(ImportError::NoSampler.into());
            };
            duration = duration.max(times.last().copied().unwrap_or(0.0));

            if let Some(outputs) = reader.read_outputs() {
                match outputs {
                    ReadOutputs::Translations(x) => {
                        let entry = channels.entry(target).or_default();
                        entry.translations = times
                            .iter()
                            .copied()
                            .zip(x.map(Into::into))
                            .collect();
                    }
                    ReadOutputs::Rotations(x) => {
                        let entry = channels.entry(target).or_default();
                        entry.rotations = times
                            .iter()
                            .copied()
                            .zip(x.into_f32().map(Into::into))
                            .collect();
                    }
                    ReadOutputs::Scales(x) => {
                        let entry = channels.entry(target).or_default();
                        entry.scales = times
                            .iter()
                            .copied()
                            .zip(x.map(Into::into))
                            .collect();
                    }
                    ReadOutputs::MorphTargetWeights(_) => {
                        debug!(
                            "animation {} morph target weights skipped",
                            animation.index(),
                        );
                    }
                }
            } else {
                error!("Animation does not contain a sampler output");
                return Err(ImportError::NoSampler.into());
            }
        }

        // Store
        let name = animation.name().map_or_else(
            || format!("animation.{}", animation.index()),
            ToString::to_string,
        );
        ret.push(RawClip {
            name,
            duration,
            ticks_per_second: 1.0,
            channels,
        });
    }
    Ok(ret)
}

/// Load a glTF file. Only a subset of glTF functionality is supported.
/// Meshes must be indexed triangles. Skins must provide inverse bind
/// matrices, and nodes are matched to bones by name, so joints should be
/// named. Tested with files exported from Blender using the "glTF
/// Separate" option. Coordinates are kept in the glTF convention, +Y up.
///
/// Animations come back as raw channels keyed by node name. They are in
/// seconds, so `ticks_per_second` is 1. Pass them to `Animation::from_raw`
/// along with the bone map to get something playable.
///
/// # Errors
/// May return `OssError`
pub fn load(
    path: &Path,
    import_options: &ImportOptions,
) -> Result<ImportedModel, OssError> {
    let (document, buffers) = load_impl(path)?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(ImportError::EmptyScene)?;
    let scene_root = scene_tree(&scene)?;
    let (bone_map, lookups) = load_bones(&document, &buffers)?;
    let clips = load_raw_clips(&document, &buffers)?;

    let identity = glm::Mat4::identity();
    let mut parts = Vec::new();
    for node in scene.nodes() {
        collect_parts(
            &node,
            &buffers,
            &identity,
            import_options,
            &lookups,
            &mut parts,
        )?;
    }

    info!(
        "{:?}: parts={}, bones={}, clips={}",
        path,
        parts.len(),
        bone_map.len(),
        clips.len(),
    );
    Ok(ImportedModel {
        parts,
        bone_map,
        scene_root,
        clips,
    })
}
