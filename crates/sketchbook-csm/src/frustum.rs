//! View frustum corners and their subdivision into cascades.
//!
//! Corners are stored in the same order for the near and far sets:
//!
//! ```text
//! 3 --- 0
//! |     |
//! 2 --- 1
//! ```
//!
//! so lerping `near[j]` toward `far[j]` walks one frustum edge.

use glam::{Mat4, Vec3};

use crate::error::CsmError;

/// Clip-space corner signs in storage order.
const CLIP_CORNERS: [(f32, f32); 4] = [(1.0, 1.0), (1.0, -1.0), (-1.0, -1.0), (-1.0, 1.0)];

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any point expands.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Smallest box holding every point.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut aabb, p| {
            aabb.expand(p);
            aabb
        })
    }

    /// Grow to include `point`.
    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// True until at least one point has been added.
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }
}

/// Eight frustum corners, usually in camera space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeFrustum {
    pub near: [Vec3; 4],
    pub far: [Vec3; 4],
}

impl Default for CascadeFrustum {
    fn default() -> Self {
        Self {
            near: [Vec3::ZERO; 4],
            far: [Vec3::ZERO; 4],
        }
    }
}

impl CascadeFrustum {
    /// Unproject the clip-space cube through `projection` into camera space.
    ///
    /// Far corners are pulled in so their depth never exceeds `max_far`.
    /// Perspective corners shrink toward the eye; orthographic corners only
    /// move in `z`.
    pub fn from_projection(projection: &Mat4, max_far: f32) -> Result<Self, CsmError> {
        let det = projection.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(CsmError::DegenerateProjection);
        }
        let is_orthographic = projection.z_axis.w == 0.0;
        let inverse = projection.inverse();

        let mut frustum = Self::default();
        for (j, &(x, y)) in CLIP_CORNERS.iter().enumerate() {
            frustum.near[j] = inverse.project_point3(Vec3::new(x, y, -1.0));

            let mut far = inverse.project_point3(Vec3::new(x, y, 1.0));
            let scale = (max_far / far.z.abs()).min(1.0);
            if is_orthographic {
                far.z *= scale;
            } else {
                far *= scale;
            }
            frustum.far[j] = far;
        }
        Ok(frustum)
    }

    /// Cut into one sub-frustum per break.
    ///
    /// Breaks are fractions along each near→far edge. Sub-frustum `i` spans
    /// `breaks[i - 1]..breaks[i]`; the first starts on the near plane and
    /// the last ends on the far plane regardless of the break values.
    pub fn split(&self, breaks: &[f32]) -> Vec<CascadeFrustum> {
        let last = breaks.len().saturating_sub(1);
        breaks
            .iter()
            .enumerate()
            .map(|(i, &brk)| {
                let mut cascade = Self::default();
                for j in 0..4 {
                    cascade.near[j] = if i == 0 {
                        self.near[j]
                    } else {
                        self.near[j].lerp(self.far[j], breaks[i - 1])
                    };
                    cascade.far[j] = if i == last {
                        self.far[j]
                    } else {
                        self.near[j].lerp(self.far[j], brk)
                    };
                }
                cascade
            })
            .collect()
    }

    /// Apply `transform` to every corner.
    pub fn to_space(&self, transform: &Mat4) -> CascadeFrustum {
        Self {
            near: self.near.map(|v| transform.project_point3(v)),
            far: self.far.map(|v| transform.project_point3(v)),
        }
    }

    /// All eight corners, near set first.
    pub fn corners(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.near.iter().chain(self.far.iter()).copied()
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.corners())
    }
}
