use ahash::AHashMap;
use nalgebra_glm as glm;

/// Node of the imported scene tree
///
/// This is the shape the scene import boundary produces: a name, a local
/// bind transform, and child nodes. The hierarchy builder consumes it and
/// nothing else reads scene data.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: glm::Mat4,
    pub children: Vec<SceneNode>,
}

/// Dense id and inverse bind matrix for one named bone
#[derive(Clone, Copy, Debug)]
pub struct BoneInfo {
    pub id: i32,
    pub offset: glm::Mat4,
}

/// Bone name lookup with first seen id assignment
///
/// Ids are contiguous from 0 in insertion order and a name keeps its id
/// for the lifetime of the model. Animation loading may extend the map
/// with names that were not part of the mesh skin data.
#[derive(Clone, Debug)]
pub struct BoneMap {
    map: AHashMap<String, BoneInfo>,
    next_id: i32,
}

impl BoneMap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: AHashMap::new(),
            next_id: 0,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoneInfo> {
        self.map.get(name)
    }

    /// Returns the id for `name`, inserting it with the next dense id and
    /// the given offset matrix if it has not been seen before. The offset
    /// is ignored for a name that is already in the map.
    pub fn get_or_insert(&mut self, name: &str, offset: glm::Mat4) -> i32 {
        if let Some(info) = self.map.get(name) {
            return info.id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.map.insert(name.to_owned(), BoneInfo { id, offset });
        id
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoneInfo)> {
        self.map.iter().map(|(name, info)| (name.as_str(), info))
    }
}

impl Default for BoneMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Intermediate tree produced by the hierarchy builder
///
/// Consumed by the flattener and then discardable. Folded helper chains
/// have already been merged into `transform` by the time one of these
/// exists.
#[derive(Clone, Debug)]
pub struct HierarchyNode {
    pub name: String,
    pub transform: glm::Mat4,
    pub is_bone: bool,
    pub offset: glm::Mat4,
    pub children: Vec<HierarchyNode>,
}

/// Element of the flattened hierarchy
///
/// Nodes are stored so that every parent index refers to an earlier
/// element, letting one forward pass compute global transforms. The root
/// has a `parent` of -1 and non bone nodes a `bone_id` of -1.
#[derive(Clone, Debug)]
pub struct FlatNode {
    pub name: String,
    pub level: u32,
    pub parent: i32,
    pub bind_transform: glm::Mat4,
    pub bone_id: i32,
    pub offset: glm::Mat4,
    pub is_bone: bool,
}

/// Flattened bone hierarchy for a model
///
/// Built once at load time and then read only, so it can be shared
/// between animators with an `Arc`. `inverse_root` is the inverse of the
/// scene root transform and normalizes skinning matrices to model space.
#[derive(Clone, Debug)]
pub struct Skeleton {
    pub nodes: Vec<FlatNode>,
    pub bone_count: usize,
    pub inverse_root: glm::Mat4,
}
