//! The rendered camera: world transform plus projection parameters.
//!
//! Projections use the OpenGL clip convention (`z` in `[-1, 1]`), which the
//! cascade splitter relies on when unprojecting clip-space corners.

use glam::{Mat4, Quat, Vec3};

/// Below this squared length a look direction is treated as degenerate.
const MIN_LOOK_LENGTH_SQ: f32 = 1e-12;

/// Projection type for the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection.
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f32,
        /// Width / height.
        aspect_ratio: f32,
    },
    /// Orthographic projection.
    Orthographic {
        /// Half-width of the view volume in world units.
        half_width: f32,
        /// Half-height of the view volume in world units.
        half_height: f32,
    },
}

/// A camera's pose and projection.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation. The camera looks down its local `-Z`.
    pub rotation: Quat,
    /// Projection parameters.
    pub projection: Projection,
    /// Near clip distance (positive).
    pub near: f32,
    /// Far clip distance (positive, greater than `near`).
    pub far: f32,
}

impl Default for CameraView {
    fn default() -> Self {
        Self::perspective(75.0_f32.to_radians(), 16.0 / 9.0, 0.1, 1010.0)
    }
}

impl CameraView {
    /// A perspective camera at the origin looking down `-Z`.
    pub fn perspective(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            projection: Projection::Perspective {
                fov_y,
                aspect_ratio,
            },
            near,
            far,
        }
    }

    /// An orthographic camera at the origin looking down `-Z`.
    pub fn orthographic(half_width: f32, half_height: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            projection: Projection::Orthographic {
                half_width,
                half_height,
            },
            near,
            far,
        }
    }

    /// Camera-to-world transform.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// World-to-camera transform.
    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    /// Projection matrix mapping view space to OpenGL clip space.
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective {
                fov_y,
                aspect_ratio,
            } => Mat4::perspective_rh_gl(fov_y, aspect_ratio, self.near, self.far),
            Projection::Orthographic {
                half_width,
                half_height,
            } => Mat4::orthographic_rh_gl(
                -half_width,
                half_width,
                -half_height,
                half_height,
                self.near,
                self.far,
            ),
        }
    }

    /// Whether the projection is orthographic.
    pub fn is_orthographic(&self) -> bool {
        matches!(self.projection, Projection::Orthographic { .. })
    }

    /// Update the aspect ratio of a perspective projection.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if let Projection::Perspective { aspect_ratio, .. } = &mut self.projection {
            *aspect_ratio = width / height;
        }
    }

    /// Local `-Z` in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Local `+Z` in world space.
    pub fn back(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Local `+Y` in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Local `+X` in world space.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Turn the camera to face `target`. No-op when the direction is degenerate.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        if let Some(rotation) = look_rotation(self.position, target, up) {
            self.rotation = rotation;
        }
    }
}

/// Orientation of an object at `eye` whose `-Z` axis points at `target`.
///
/// Returns `None` when `eye == target` or the direction is parallel to `up`.
pub fn look_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Option<Quat> {
    let back = eye - target;
    if back.length_squared() < MIN_LOOK_LENGTH_SQ {
        return None;
    }
    let back = back.normalize();
    let right = up.cross(back);
    if right.length_squared() < MIN_LOOK_LENGTH_SQ {
        return None;
    }
    let right = right.normalize();
    let true_up = back.cross(right);
    Some(Quat::from_mat3(&glam::Mat3::from_cols(right, true_up, back)).normalize())
}
