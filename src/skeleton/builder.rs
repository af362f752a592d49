use super::types::{
    BoneInfo, BoneMap, FlatNode, HierarchyNode, SceneNode, Skeleton,
};
use crate::oss_error::OssError;
use log::{debug, trace};
use nalgebra_glm as glm;

/// Builds a skeleton from an imported scene tree and a bone map that has
/// already been populated from the mesh skin data
///
/// # Errors
/// May return `OssError::BoneNotInMap` if the hierarchy and the bone map
/// disagree, which indicates a malformed source asset
pub fn build(
    scene_root: &SceneNode,
    bones: &BoneMap,
) -> Result<Skeleton, OssError> {
    // The inverse root comes from the scene as imported, before any
    // chain folding has had a chance to merge the root away
    let inverse_root = glm::inverse(&scene_root.transform);
    let tree = build_hierarchy(scene_root, bones);
    let nodes = flatten(&tree, bones)?;
    debug!("Skeleton built: {} nodes, {} bones", nodes.len(), bones.len());
    Ok(Skeleton {
        nodes,
        bone_count: bones.len(),
        inverse_root,
    })
}

/// Builds the intermediate hierarchy tree, folding helper chains and
/// pruning non bone leaves
///
/// Interchange formats may interpose chains of per axis helper nodes
/// between a logical parent bone and its child. Folding multiplies those
/// chains into the terminal bone so they never cost anything in the per
/// frame pass.
#[must_use]
pub fn build_hierarchy(
    scene_root: &SceneNode,
    bones: &BoneMap,
) -> HierarchyNode {
    // The root is never pruned so there is always a tree to flatten
    build_node(scene_root, bones, true).unwrap_or_else(|| HierarchyNode {
        name: scene_root.name.clone(),
        transform: scene_root.transform,
        is_bone: false,
        offset: glm::Mat4::identity(),
        children: Vec::new(),
    })
}

/// Walks forward from `start` through single child nodes, accumulating
/// local transforms in parent to child order, until a node in the bone
/// map terminates the chain. A branch or a leaf before that happens means
/// there is nothing to fold.
fn fold_chain<'a>(
    start: &'a SceneNode,
    bones: &BoneMap,
) -> Option<(&'a SceneNode, glm::Mat4, BoneInfo)> {
    let mut folded = glm::Mat4::identity();
    let mut current = start;
    loop {
        folded *= current.transform;
        if let Some(info) = bones.get(&current.name) {
            return Some((current, folded, *info));
        }
        if current.children.len() == 1 {
            current = &current.children[0];
        } else {
            return None;
        }
    }
}

fn build_node(
    node: &SceneNode,
    bones: &BoneMap,
    is_root: bool,
) -> Option<HierarchyNode> {
    if let Some((terminal, folded, info)) = fold_chain(node, bones) {
        // The whole chain becomes one bone node and recursion continues
        // from the terminal bone's children
        let children = terminal
            .children
            .iter()
            .filter_map(|c| build_node(c, bones, false))
            .collect();
        return Some(HierarchyNode {
            name: terminal.name.clone(),
            transform: folded,
            is_bone: true,
            offset: info.offset,
            children,
        });
    }

    // No chain here, so this is an ordinary node with its own transform
    let children: Vec<HierarchyNode> = node
        .children
        .iter()
        .filter_map(|c| build_node(c, bones, false))
        .collect();

    // A non bone node with nothing left below it carries no skinning
    // information and would only waste a slot in the flat array
    if children.is_empty() && !is_root {
        trace!("Pruning node \"{}\"", node.name);
        return None;
    }
    Some(HierarchyNode {
        name: node.name.clone(),
        transform: node.transform,
        is_bone: false,
        offset: glm::Mat4::identity(),
        children,
    })
}

/// Flattens the hierarchy tree into a parent indexed array in pre-order,
/// so every node lands at a higher index than its parent
///
/// # Errors
/// May return `OssError::BoneNotInMap` if a folded bone name is missing
/// from the bone map, or `OssError::BoneCountTooLarge` if the node count
/// overflows the index type
pub fn flatten(
    root: &HierarchyNode,
    bones: &BoneMap,
) -> Result<Vec<FlatNode>, OssError> {
    let mut nodes = Vec::new();
    push_flat(root, -1, 0, bones, &mut nodes)?;
    Ok(nodes)
}

fn push_flat(
    node: &HierarchyNode,
    parent: i32,
    level: u32,
    bones: &BoneMap,
    out: &mut Vec<FlatNode>,
) -> Result<(), OssError> {
    let (bone_id, offset) = if node.is_bone {
        // The builder only marks bones using this same map, so a miss
        // here means the two have gone out of sync
        let info = bones
            .get(&node.name)
            .ok_or_else(|| OssError::BoneNotInMap(node.name.clone()))?;
        (info.id, node.offset)
    } else {
        (-1, glm::Mat4::identity())
    };
    let index = i32::try_from(out.len())
        .map_err(|_| OssError::BoneCountTooLarge)?;
    trace!(
        "flat[{}] \"{}\" level={} parent={} bone_id={}",
        index,
        node.name,
        level,
        parent,
        bone_id
    );
    out.push(FlatNode {
        name: node.name.clone(),
        level,
        parent,
        bind_transform: node.transform,
        bone_id,
        offset,
        is_bone: node.is_bone,
    });
    for child in &node.children {
        push_flat(child, index, level + 1, bones, out)?;
    }
    Ok(())
}
