use nalgebra_glm as glm;

/// Decomposed scale, rotation, and translation
///
/// This is the pose unit that keyframes store and that blending operates
/// on. GLM has matrix decomposition in the `GLM_GTX_matrix_decompose`
/// extension but this does not seem to be available in the `nalgebra_glm`
/// implementation, so the conversions are implemented here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale: glm::Vec3,
    pub rotation: glm::Quat,
    pub translation: glm::Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: glm::vec3(1.0, 1.0, 1.0),
            // Identity quaternion, w last
            rotation: glm::quat(0.0, 0.0, 0.0, 1.0),
            translation: glm::Vec3::zeros(),
        }
    }
}

impl Transform {
    /// Blends two transforms. Scale and translation interpolate linearly
    /// while rotation uses shortest arc spherical interpolation. A
    /// `factor` of 0 returns `self` and 1 returns `other`.
    #[must_use]
    pub fn interpolate(&self, other: &Self, factor: f32) -> Self {
        Self {
            scale: glm::lerp(&self.scale, &other.scale, factor),
            rotation: slerp(&self.rotation, &other.rotation, factor),
            translation: glm::lerp(
                &self.translation,
                &other.translation,
                factor,
            ),
        }
    }

    /// Composes the matrix. Scale applies first, then rotation, then
    /// translation.
    #[must_use]
    pub fn to_mat4(&self) -> glm::Mat4 {
        glm::translation(&self.translation)
            * glm::quat_to_mat4(&self.rotation)
            * glm::scaling(&self.scale)
    }
}

impl From<Transform> for glm::Mat4 {
    fn from(t: Transform) -> Self {
        t.to_mat4()
    }
}

/// Shortest arc spherical interpolation between two quaternions
///
/// The hemisphere check and a linear fallback for nearly parallel inputs
/// are implemented here so antipodal keyframe rotations can't produce a
/// long way around or a division by a tiny sine.
#[must_use]
pub fn slerp(a: &glm::Quat, b: &glm::Quat, factor: f32) -> glm::Quat {
    const DOT_THRESHOLD: f32 = 0.9995;

    let a = glm::quat_normalize(a);
    let mut b = glm::quat_normalize(b);
    let mut dot = glm::quat_dot(&a, &b);

    // A negative dot product means the long way around, and negating one
    // quaternion gives the same rotation on the short way
    if dot < 0.0 {
        b = -b;
        dot = -dot;
    }

    if dot > DOT_THRESHOLD {
        return glm::quat_normalize(&glm::quat_lerp(&a, &b, factor));
    }

    let theta_0 = dot.acos();
    let theta = theta_0 * factor;
    let sin_theta_0 = theta_0.sin();
    let s0 = (theta_0 - theta).sin() / sin_theta_0;
    let s1 = theta.sin() / sin_theta_0;
    a * s0 + b * s1
}

/// Decomposes a matrix into scale, rotation, and translation. The matrix
/// must be composed of only those operations. Projection or shear will
/// not survive the round trip.
#[must_use]
pub fn from_mat4(m: &glm::Mat4) -> Transform {
    let column =
        |i: usize| glm::vec3(m[(0, i)], m[(1, i)], m[(2, i)]);

    let translation = column(3);
    let scale = glm::vec3(
        glm::length(&column(0)),
        glm::length(&column(1)),
        glm::length(&column(2)),
    );

    // A degenerate scale leaves that basis vector unusable for rotation
    // recovery, so substitute 1 and accept the identity-ish axis
    let guard = |s: f32| if s.abs() < f32::EPSILON { 1.0 } else { s };
    let basis = glm::Mat3::from_columns(&[
        column(0) / guard(scale.x),
        column(1) / guard(scale.y),
        column(2) / guard(scale.z),
    ]);
    let rotation = glm::quat_normalize(&glm::mat3_to_quat(&basis));

    Transform {
        scale,
        rotation,
        translation,
    }
}
