//! Line geometry for visualising cascades and shadow bounds.

use glam::{Mat4, Vec3};

use crate::csm::CascadedShadows;
use crate::frustum::{Aabb, CascadeFrustum};

/// Depth given to the flat far-plane box of each cascade.
const PLANE_THICKNESS: f32 = 1e-4;

/// One shadow camera's volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowBounds {
    /// Light-local to light-parent transform.
    pub light_to_parent: Mat4,
    /// Volume in light-local space; the light looks down `-Z`.
    pub local: Aabb,
}

/// Everything a debug overlay draws. Frustum data is in camera space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugGeometry {
    /// The 12 edges of the capped camera frustum.
    pub frustum_edges: Vec<[Vec3; 2]>,
    /// Far-plane rectangle of each cascade as a thin box.
    pub cascade_planes: Vec<Aabb>,
    pub shadow_bounds: Vec<ShadowBounds>,
}

/// Edges of a frustum: far rectangle, near rectangle, then the four sides.
pub fn frustum_edges(frustum: &CascadeFrustum) -> Vec<[Vec3; 2]> {
    let mut edges = Vec::with_capacity(12);
    for ring in [&frustum.far, &frustum.near] {
        for j in 0..4 {
            edges.push([ring[j], ring[(j + 1) % 4]]);
        }
    }
    for j in 0..4 {
        edges.push([frustum.far[j], frustum.near[j]]);
    }
    edges
}

impl CascadedShadows {
    /// Snapshot of the current cascades for drawing.
    pub fn debug_geometry(&self) -> DebugGeometry {
        let up = self.settings().light_up;
        let cascade_planes = self
            .frustums()
            .iter()
            .map(|f| {
                let mut plane = Aabb::from_points([f.far[2], f.far[0]]);
                plane.max.z += PLANE_THICKNESS;
                plane
            })
            .collect();
        let shadow_bounds = self
            .lights()
            .iter()
            .map(|light| {
                let sc = light.shadow_camera;
                ShadowBounds {
                    light_to_parent: light.world_matrix(up),
                    local: Aabb {
                        min: Vec3::new(sc.left, sc.bottom, -sc.far),
                        max: Vec3::new(sc.right, sc.top, -sc.near),
                    },
                }
            })
            .collect();
        DebugGeometry {
            frustum_edges: frustum_edges(self.main_frustum()),
            cascade_planes,
            shadow_bounds,
        }
    }
}
