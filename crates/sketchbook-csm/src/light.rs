//! Per-cascade directional light and its orthographic shadow camera.
//!
//! [`CascadeLight`] is the CPU-side description handed to the renderer;
//! [`CascadeLightUniform`] is its packed GPU form.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3};
use sketchbook_camera::look_rotation;

/// Orthographic shadow camera bounds in light-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowCamera {
    fn default() -> Self {
        Self {
            left: -1.0,
            right: 1.0,
            top: 1.0,
            bottom: -1.0,
            near: 0.0,
            far: 1.0,
        }
    }
}

impl ShadowCamera {
    /// Square bounds of side `width`, reaching `width + margin` deep.
    pub fn square(width: f32, margin: f32) -> Self {
        let half = width / 2.0;
        Self {
            left: -half,
            right: half,
            top: half,
            bottom: -half,
            near: 0.0,
            far: width + margin,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// OpenGL-convention orthographic projection for these bounds.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::orthographic_rh_gl(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }
}

/// One shadow-casting directional light covering a single cascade.
///
/// `position` and `target` are in the light parent's space.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeLight {
    pub position: Vec3,
    pub target: Vec3,
    pub shadow_camera: ShadowCamera,
    pub bias: f32,
    pub normal_bias: f32,
    /// Linear RGB color, not premultiplied by intensity.
    pub color: Vec3,
    pub intensity: f32,
    /// Shadow map resolution (width = height).
    pub map_size: u32,
    pub cast_shadow: bool,
    /// Set when `map_size` changed and the shadow map must be reallocated.
    pub map_stale: bool,
}

impl CascadeLight {
    /// A shadow-casting light with a unit shadow camera at the origin.
    pub fn new(color: Vec3, intensity: f32, map_size: u32) -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            shadow_camera: ShadowCamera::default(),
            bias: 0.0,
            normal_bias: 0.0,
            color,
            intensity,
            map_size,
            cast_shadow: true,
            map_stale: false,
        }
    }

    /// Resize the shadow map, flagging it for reallocation.
    pub fn set_map_size(&mut self, size: u32) {
        if self.map_size != size {
            self.map_size = size;
            self.map_stale = true;
        }
    }

    /// World size of one shadow-map texel along light-local x and y.
    pub fn texel_size(&self) -> Vec2 {
        let size = self.map_size.max(1) as f32;
        Vec2::new(
            self.shadow_camera.width() / size,
            self.shadow_camera.height() / size,
        )
    }

    /// Unit direction from `position` to `target`, or zero if they coincide.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Light-to-parent transform looking from `position` at `target`.
    pub fn world_matrix(&self, up: Vec3) -> Mat4 {
        let rotation = orientation(self.direction(), up);
        Mat4::from_rotation_translation(rotation, self.position)
    }

    /// Parent-space to shadow clip-space transform.
    pub fn view_projection(&self, up: Vec3) -> Mat4 {
        self.shadow_camera.projection_matrix() * self.world_matrix(up).inverse()
    }

    pub fn to_uniform(&self, up: Vec3) -> CascadeLightUniform {
        let d = self.direction();
        CascadeLightUniform {
            view_projection: self.view_projection(up).to_cols_array(),
            direction_intensity: [d.x, d.y, d.z, self.intensity],
            color_bias: [self.color.x, self.color.y, self.color.z, self.bias],
            normal_bias_padding: [self.normal_bias, 0.0, 0.0, 0.0],
        }
    }
}

/// GPU-side light, 112 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CascadeLightUniform {
    /// Parent space to shadow clip space.
    pub view_projection: [f32; 16],
    /// xyz = direction (normalized), w = intensity.
    pub direction_intensity: [f32; 4],
    /// xyz = color (linear RGB), w = depth bias.
    pub color_bias: [f32; 4],
    /// x = normal bias, yzw = padding.
    pub normal_bias_padding: [f32; 4],
}

/// Rotation whose `-Z` points along `direction`.
///
/// Falls back to another up axis when `direction` is parallel to `up`, and to
/// identity when `direction` is zero.
pub fn orientation(direction: Vec3, up: Vec3) -> Quat {
    let fallback_up = if up.z.abs() > 0.99 { Vec3::X } else { Vec3::Z };
    look_rotation(Vec3::ZERO, direction, up)
        .or_else(|| look_rotation(Vec3::ZERO, direction, fallback_up))
        .unwrap_or(Quat::IDENTITY)
}

/// Matrix form of [`orientation`]: light-local to parent space, no translation.
pub fn orientation_matrix(direction: Vec3, up: Vec3) -> Mat4 {
    Mat4::from_quat(orientation(direction, up))
}
