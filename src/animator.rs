use crate::{
    animation::Animation,
    oss_error::OssError,
    skeleton::Skeleton,
    transform::Transform,
    types::MAX_BONES,
};
use ahash::AHashMap;
use log::warn;
use nalgebra_glm as glm;
use std::sync::Arc;

/// Pose evaluation for one animated model instance
///
/// Owns the clip registry and the per frame scratch buffers while the
/// skeleton is shared read only. The caller runs one `update` or
/// `blend_between` per frame and reads the result through
/// `final_bone_matrices` before the next call mutates it. Nothing in
/// here locks, so that ordering is the caller's responsibility.
pub struct Animator {
    skeleton: Arc<Skeleton>,
    clips: AHashMap<String, Animation>,
    current: Option<String>,
    pose: Vec<Transform>,
    blend_pose: Vec<Transform>,
    globals: Vec<glm::Mat4>,
    output: [glm::Mat4; MAX_BONES],
}

impl Animator {
    #[must_use]
    pub fn new(skeleton: Arc<Skeleton>) -> Self {
        if skeleton.bone_count > MAX_BONES {
            warn!(
                "Skeleton has {} bones but output capacity is {}, the rest will not be written",
                skeleton.bone_count, MAX_BONES
            );
        }
        let bone_count = skeleton.bone_count;
        let node_count = skeleton.nodes.len();
        Self {
            skeleton,
            clips: AHashMap::new(),
            current: None,
            pose: vec![Transform::default(); bone_count],
            blend_pose: vec![Transform::default(); bone_count],
            globals: vec![glm::Mat4::identity(); node_count],
            output: [glm::Mat4::identity(); MAX_BONES],
        }
    }

    /// Registers a clip under its own name
    ///
    /// # Errors
    /// May return `OssError::DuplicateClip` if a clip with the same name
    /// has already been added
    pub fn add_animation(
        &mut self,
        animation: Animation,
    ) -> Result<(), OssError> {
        if self.clips.contains_key(&animation.name) {
            return Err(OssError::DuplicateClip(animation.name.clone()));
        }
        if animation.tracks.len() > self.skeleton.bone_count {
            // The skeleton was built before this clip extended the bone
            // map, so part of the clip can never reach the output
            warn!(
                "Clip \"{}\" has {} tracks but the skeleton has {} bones",
                animation.name,
                animation.tracks.len(),
                self.skeleton.bone_count
            );
        }
        self.clips.insert(animation.name.clone(), animation);
        Ok(())
    }

    /// Makes a clip the one `update` plays, optionally rewinding it
    ///
    /// # Errors
    /// May return `OssError::ClipNotFound` if no clip has that name
    pub fn select_animation(
        &mut self,
        name: &str,
        from_start: bool,
    ) -> Result<(), OssError> {
        let Some(anim) = self.clips.get_mut(name) else {
            return Err(OssError::ClipNotFound(name.to_owned()));
        };
        if from_start {
            anim.time = 0.0;
        }
        self.current = Some(name.to_owned());
        Ok(())
    }

    /// Advances the selected clip and recomputes the output matrices
    ///
    /// With no clip selected this evaluates the bind pose instead, so a
    /// freshly built animator still produces usable matrices.
    pub fn update(&mut self, delta: f32) {
        for t in &mut self.pose {
            *t = Transform::default();
        }
        let mut animated = false;
        if let Some(name) = &self.current {
            if let Some(anim) = self.clips.get_mut(name) {
                anim.advance(delta);
                anim.sample_pose(&mut self.pose);
                animated = true;
            }
        }
        let pose = animated.then_some(self.pose.as_slice());
        hierarchy_pass(
            &self.skeleton,
            pose,
            &mut self.globals,
            &mut self.output,
        );
    }

    /// Crossfades two clips and recomputes the output matrices
    ///
    /// Both clips advance by `delta` and are sampled independently, then
    /// the local poses are interpolated at `factor` (0 is fully the
    /// first clip, 1 fully the second) before the single hierarchy pass
    /// runs. Neither clip becomes the selected one.
    ///
    /// # Errors
    /// May return `OssError::ClipNotFound` if either name is unknown, in
    /// which case no clip has been advanced
    pub fn blend_between(
        &mut self,
        name_a: &str,
        name_b: &str,
        factor: f32,
        delta: f32,
    ) -> Result<(), OssError> {
        // Check the second name before touching the first so a bad call
        // leaves the playheads alone
        if !self.clips.contains_key(name_b) {
            return Err(OssError::ClipNotFound(name_b.to_owned()));
        }
        for t in &mut self.pose {
            *t = Transform::default();
        }
        for t in &mut self.blend_pose {
            *t = Transform::default();
        }
        {
            let Some(a) = self.clips.get_mut(name_a) else {
                return Err(OssError::ClipNotFound(name_a.to_owned()));
            };
            a.advance(delta);
            a.sample_pose(&mut self.pose);
        }
        if name_b == name_a {
            // Same clip on both sides advances once
            self.blend_pose.copy_from_slice(&self.pose);
        } else if let Some(b) = self.clips.get_mut(name_b) {
            b.advance(delta);
            b.sample_pose(&mut self.blend_pose);
        }

        let factor = factor.clamp(0.0, 1.0);
        for (a, b) in self.pose.iter_mut().zip(&self.blend_pose) {
            *a = a.interpolate(b, factor);
        }
        hierarchy_pass(
            &self.skeleton,
            Some(&self.pose),
            &mut self.globals,
            &mut self.output,
        );
        Ok(())
    }

    /// Final skinning matrices indexed by bone id
    ///
    /// Slots past the skeleton's bone count stay identity. The draw side
    /// must finish reading these before the next `update` or
    /// `blend_between` call.
    #[must_use]
    pub fn final_bone_matrices(&self) -> &[glm::Mat4; MAX_BONES] {
        &self.output
    }
}

/// One forward pass over the flat hierarchy
///
/// Parents precede children in the array, so each parent global is ready
/// by the time its children ask for it. Bone nodes write a skinning
/// matrix, non bone nodes only propagate. A pose of `None` evaluates the
/// bind pose.
fn hierarchy_pass(
    skeleton: &Skeleton,
    pose: Option<&[Transform]>,
    globals: &mut [glm::Mat4],
    output: &mut [glm::Mat4; MAX_BONES],
) {
    for (i, node) in skeleton.nodes.iter().enumerate() {
        let parent_global = usize::try_from(node.parent)
            .map_or_else(|_| glm::Mat4::identity(), |p| globals[p]);
        let bone = usize::try_from(node.bone_id).ok();
        let local = match (bone, pose) {
            (Some(b), Some(p)) => {
                p.get(b).map_or(node.bind_transform, Transform::to_mat4)
            }
            _ => node.bind_transform,
        };
        let global = parent_global * local;
        globals[i] = global;
        if let Some(b) = bone {
            if b < MAX_BONES {
                output[b] = skeleton.inverse_root * global * node.offset;
            }
        }
    }
}
