//! Cascaded shadow maps for a single directional light.
//!
//! Splits the camera frustum into cascades, sizes one shadow-casting light
//! per cascade and keeps attached materials' uniforms in sync.
//!
//! Per frame, after the camera has moved:
//!
//! ```text
//! shadows.update_frustums(&camera)?;   // only when projection / settings changed
//! shadows.update(&camera, &parent_world);
//! ```

use glam::{Mat4, Vec2, Vec3};
use sketchbook_camera::CameraView;
use sketchbook_config::{ShadowConfig, SplitMode};
use tracing::{debug, info, trace, warn};

use crate::error::CsmError;
use crate::frustum::{Aabb, CascadeFrustum};
use crate::light::{CascadeLight, CascadeLightUniform, ShadowCamera, orientation_matrix};
use crate::material::{
    CascadeUniforms, MAX_CASCADE_SLOTS, MaterialDefines, MaterialHandle, MaterialRegistry,
    MaterialState,
};
use crate::shader::{ShaderVariant, ShaderVariantTable};
use crate::split::{SplitCallback, check_lambda, compute_breaks};

/// Runtime settings for [`CascadedShadows`].
#[derive(Debug, Clone, PartialEq)]
pub struct CsmSettings {
    pub cascades: usize,
    /// Sizes the uniform break array; cascades may later grow up to this.
    pub max_cascades: usize,
    /// Shadows never reach further than this from the camera.
    pub max_far: f32,
    pub split_mode: SplitMode,
    pub practical_lambda: f32,
    pub shadow_map_size: u32,
    /// Depth bias per world unit of cascade width.
    pub shadow_bias: f32,
    /// Normal bias per world unit of cascade width.
    pub shadow_normal_bias: f32,
    /// Unit direction the light travels.
    pub light_direction: Vec3,
    pub light_up: Vec3,
    pub light_color: Vec3,
    pub light_intensity: f32,
    /// Extra distance behind each cascade so off-screen casters still land
    /// in the shadow map.
    pub light_margin: f32,
    pub fade: bool,
    pub no_last_cascade_cutoff: bool,
}

impl Default for CsmSettings {
    fn default() -> Self {
        Self::from(&ShadowConfig::default())
    }
}

impl From<&ShadowConfig> for CsmSettings {
    fn from(config: &ShadowConfig) -> Self {
        Self {
            cascades: config.cascades as usize,
            max_cascades: config.max_cascades as usize,
            max_far: config.max_far,
            split_mode: config.split_mode,
            practical_lambda: config.practical_lambda,
            shadow_map_size: config.shadow_map_size,
            shadow_bias: config.shadow_bias,
            shadow_normal_bias: config.shadow_normal_bias,
            light_direction: Vec3::from_array(config.light_direction).normalize_or_zero(),
            light_up: Vec3::from_array(config.light_up),
            light_color: Vec3::from_array(config.light_color),
            light_intensity: config.light_intensity,
            light_margin: config.light_margin,
            fade: config.fade,
            no_last_cascade_cutoff: config.no_last_cascade_cutoff,
        }
    }
}

/// Camera depth range captured by the last frustum update.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CameraDepth {
    near: f32,
    far: f32,
}

/// Cascaded shadow state: frustums, lights, materials and shader variants.
pub struct CascadedShadows {
    settings: CsmSettings,
    split_callback: Option<SplitCallback>,
    depth: CameraDepth,
    breaks: Vec<f32>,
    main_frustum: CascadeFrustum,
    frustums: Vec<CascadeFrustum>,
    lights: Vec<CascadeLight>,
    materials: MaterialRegistry,
    variants: ShaderVariantTable,
}

impl std::fmt::Debug for CascadedShadows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadedShadows")
            .field("settings", &self.settings)
            .field("has_split_callback", &self.split_callback.is_some())
            .field("breaks", &self.breaks)
            .field("lights", &self.lights.len())
            .field("materials", &self.materials.len())
            .finish_non_exhaustive()
    }
}

fn check_cascades(cascades: usize, max: usize) -> Result<(), CsmError> {
    if max > MAX_CASCADE_SLOTS {
        return Err(CsmError::MaxCascadesTooLarge {
            max,
            limit: MAX_CASCADE_SLOTS,
        });
    }
    if cascades == 0 || cascades > max {
        return Err(CsmError::InvalidCascadeCount { cascades, max });
    }
    Ok(())
}

impl CascadedShadows {
    /// Create lights and compute the initial cascades for `camera`.
    pub fn new(settings: CsmSettings, camera: &CameraView) -> Result<Self, CsmError> {
        Self::build(settings, None, camera)
    }

    /// Like [`new`](Self::new), with a break generator for [`SplitMode::Custom`].
    pub fn with_split_callback(
        settings: CsmSettings,
        callback: SplitCallback,
        camera: &CameraView,
    ) -> Result<Self, CsmError> {
        Self::build(settings, Some(callback), camera)
    }

    fn build(
        settings: CsmSettings,
        split_callback: Option<SplitCallback>,
        camera: &CameraView,
    ) -> Result<Self, CsmError> {
        check_cascades(settings.cascades, settings.max_cascades)?;
        check_lambda(settings.practical_lambda)?;
        let variants = ShaderVariantTable::new(settings.max_cascades);
        let mut shadows = Self {
            settings,
            split_callback,
            depth: CameraDepth {
                near: camera.near,
                far: camera.far,
            },
            breaks: Vec::new(),
            main_frustum: CascadeFrustum::default(),
            frustums: Vec::new(),
            lights: Vec::new(),
            materials: MaterialRegistry::new(),
            variants,
        };
        shadows.create_lights();
        shadows.update_frustums(camera)?;
        info!(
            cascades = shadows.settings.cascades,
            mode = ?shadows.settings.split_mode,
            map_size = shadows.settings.shadow_map_size,
            "cascaded shadows created"
        );
        Ok(shadows)
    }

    fn create_lights(&mut self) {
        let s = &self.settings;
        self.lights = (0..s.cascades)
            .map(|_| CascadeLight::new(s.light_color, s.light_intensity, s.shadow_map_size))
            .collect();
    }

    fn prepare(
        &self,
        cascades: usize,
        mode: SplitMode,
        camera: &CameraView,
    ) -> Result<(Vec<f32>, CascadeFrustum), CsmError> {
        let far = camera.far.min(self.settings.max_far);
        if !(far > camera.near) {
            return Err(CsmError::InvalidDepthRange {
                near: camera.near,
                far,
            });
        }
        let breaks = compute_breaks(
            mode,
            cascades,
            camera.near,
            far,
            self.settings.practical_lambda,
            self.split_callback.as_deref(),
        )?;
        let main = CascadeFrustum::from_projection(&camera.projection_matrix(), self.settings.max_far)?;
        Ok((breaks, main))
    }

    fn commit(&mut self, camera: &CameraView, breaks: Vec<f32>, main: CascadeFrustum) {
        self.depth = CameraDepth {
            near: camera.near,
            far: camera.far,
        };
        self.frustums = main.split(&breaks);
        self.main_frustum = main;
        self.breaks = breaks;
        self.update_shadow_bounds();
        self.update_uniforms();
    }

    /// Recompute breaks, cascade frustums, shadow bounds and uniforms.
    ///
    /// Call after the camera projection or any split setting changes. On
    /// error nothing is modified.
    pub fn update_frustums(&mut self, camera: &CameraView) -> Result<(), CsmError> {
        let (breaks, main) = self
            .prepare(self.settings.cascades, self.settings.split_mode, camera)
            .inspect_err(|e| warn!(error = %e, "cascade update rejected"))?;
        debug!(?breaks, "cascade breaks");
        self.commit(camera, breaks, main);
        Ok(())
    }

    /// Size each light's shadow camera to its cascade.
    pub fn update_shadow_bounds(&mut self) {
        let CameraDepth { near, far: camera_far } = self.depth;
        let s = &self.settings;
        for (frustum, light) in self.frustums.iter().zip(self.lights.iter_mut()) {
            let far_corner = frustum.far[0];
            let across_far = far_corner.distance(frustum.far[2]);
            let across_depth = far_corner.distance(frustum.near[2]);
            let mut width = across_far.max(across_depth);

            if s.fade {
                let far = camera_far.max(s.max_far);
                let linear_depth = far_corner.z / (far - near);
                width += 0.25 * linear_depth.powi(2) * (far - near);
            }

            light.shadow_camera = ShadowCamera::square(width, s.light_margin);
            light.bias = s.shadow_bias * width;
            light.normal_bias = s.shadow_normal_bias * width;
        }
    }

    /// Move every light so its shadow camera covers its cascade from behind.
    ///
    /// `parent_world` is the world transform of the node the lights live in.
    pub fn update(&mut self, camera: &CameraView, parent_world: &Mat4) {
        let s = &self.settings;
        let light_orientation = orientation_matrix(s.light_direction, s.light_up);
        let camera_to_parent = parent_world.inverse() * camera.world_matrix();
        let camera_to_light = light_orientation.inverse() * camera_to_parent;

        for (i, (frustum, light)) in self.frustums.iter().zip(self.lights.iter_mut()).enumerate() {
            let texel = light.texel_size();
            let bounds = frustum.to_space(&camera_to_light).bounding_box();

            let mut center = bounds.center();
            center.z = bounds.max.z + s.light_margin;
            center.x = snap(center.x, texel.x);
            center.y = snap(center.y, texel.y);

            let position = light_orientation.transform_point3(center);
            light.position = position;
            light.target = position + s.light_direction;
            trace!(cascade = i, ?position, "light placed");
        }
    }

    /// `(previous, current)` break per cascade slot, `max_cascades` long.
    ///
    /// Slots past the active cascades are `(0, 0)`. With
    /// `no_last_cascade_cutoff` the last active slot extends to infinity.
    pub fn extended_breaks(&self) -> Vec<Vec2> {
        let mut pairs: Vec<Vec2> = (0..self.settings.max_cascades)
            .map(|i| match self.breaks.get(i) {
                Some(&current) => {
                    let prev = if i == 0 { 0.0 } else { self.breaks[i - 1] };
                    Vec2::new(prev, current)
                }
                None => Vec2::ZERO,
            })
            .collect();
        if self.settings.no_last_cascade_cutoff
            && let Some(last) = self.breaks.len().checked_sub(1).and_then(|i| pairs.get_mut(i))
        {
            last.y = f32::INFINITY;
        }
        pairs
    }

    /// Uniform values for the current state.
    pub fn uniforms(&self) -> CascadeUniforms {
        CascadeUniforms {
            breaks: self.extended_breaks(),
            camera_near: self.settings.max_far.min(self.depth.near),
            shadow_far: self.depth.far.min(self.settings.max_far),
        }
    }

    /// Defines for the current cascade count and fade flag.
    pub fn defines(&self) -> MaterialDefines {
        MaterialDefines {
            cascades: self.settings.cascades,
            fade: self.settings.fade,
        }
    }

    /// Push uniforms to every attached material. Returns how many materials
    /// now need their shader rebuilt because a define changed.
    pub fn update_uniforms(&mut self) -> usize {
        let uniforms = self.uniforms();
        let defines = self.defines();
        let flagged = self.materials.sync(&uniforms, defines);
        if flagged > 0 {
            debug!(flagged, ?defines, "materials need shader rebuild");
        }
        flagged
    }

    /// Start feeding a material cascade uniforms.
    pub fn attach_material(&mut self) -> MaterialHandle {
        let handle = self.materials.attach(self.uniforms(), self.defines());
        debug!(?handle, "material attached");
        handle
    }

    /// Stop tracking a material. Returns `false` for unknown handles.
    pub fn detach_material(&mut self, handle: MaterialHandle) -> bool {
        self.materials.detach(handle)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&MaterialState> {
        self.materials.get(handle)
    }

    /// Record that the renderer rebuilt a material's shader.
    pub fn acknowledge_material(&mut self, handle: MaterialHandle) -> bool {
        self.materials.acknowledge(handle)
    }

    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    /// Shader variant matching the current defines.
    pub fn active_variant(&self) -> Option<&ShaderVariant> {
        self.variants.get(self.defines())
    }

    pub fn variants(&self) -> &ShaderVariantTable {
        &self.variants
    }

    /// Change the cascade count, recreating the lights.
    pub fn set_cascades(&mut self, cascades: usize, camera: &CameraView) -> Result<(), CsmError> {
        check_cascades(cascades, self.settings.max_cascades)?;
        let (breaks, main) = self.prepare(cascades, self.settings.split_mode, camera)?;
        self.settings.cascades = cascades;
        self.create_lights();
        self.commit(camera, breaks, main);
        info!(cascades, "cascade count changed");
        Ok(())
    }

    /// Change the split scheme. On error the previous scheme stays active.
    pub fn set_split_mode(&mut self, mode: SplitMode, camera: &CameraView) -> Result<(), CsmError> {
        let (breaks, main) = self.prepare(self.settings.cascades, mode, camera)?;
        self.settings.split_mode = mode;
        self.commit(camera, breaks, main);
        info!(?mode, "split mode changed");
        Ok(())
    }

    /// Install or replace the custom break generator. Takes effect on the
    /// next frustum update.
    pub fn set_split_callback(&mut self, callback: SplitCallback) {
        self.split_callback = Some(callback);
    }

    /// Change the practical split blend. Rejects values outside `[0, 1]`
    /// without touching any state.
    pub fn set_practical_lambda(&mut self, lambda: f32, camera: &CameraView) -> Result<(), CsmError> {
        check_lambda(lambda)?;
        let previous = self.settings.practical_lambda;
        self.settings.practical_lambda = lambda;
        self.update_frustums(camera).inspect_err(|_| {
            self.settings.practical_lambda = previous;
        })
    }

    /// Resize every shadow map. Lights whose size changed are flagged stale.
    pub fn set_shadow_map_size(&mut self, size: u32) {
        self.settings.shadow_map_size = size;
        for light in &mut self.lights {
            light.set_map_size(size);
        }
        info!(size, "shadow map size changed");
    }

    /// Toggle cascade fading; resizes bounds and flags materials.
    pub fn set_fade(&mut self, fade: bool) {
        if self.settings.fade != fade {
            self.settings.fade = fade;
            self.update_shadow_bounds();
            self.update_uniforms();
        }
    }

    /// Detach all materials and remove the lights.
    pub fn dispose(&mut self) {
        let materials = self.materials.clear();
        let lights = self.lights.len();
        self.lights.clear();
        self.frustums.clear();
        info!(materials, lights, "cascaded shadows disposed");
    }

    pub fn settings(&self) -> &CsmSettings {
        &self.settings
    }

    pub fn breaks(&self) -> &[f32] {
        &self.breaks
    }

    /// Full camera frustum in camera space, depth-capped at `max_far`.
    pub fn main_frustum(&self) -> &CascadeFrustum {
        &self.main_frustum
    }

    /// Per-cascade frustums in camera space.
    pub fn frustums(&self) -> &[CascadeFrustum] {
        &self.frustums
    }

    pub fn lights(&self) -> &[CascadeLight] {
        &self.lights
    }

    /// GPU-packed light per cascade, in cascade order.
    pub fn light_uniforms(&self) -> Vec<CascadeLightUniform> {
        let up = self.settings.light_up;
        self.lights.iter().map(|light| light.to_uniform(up)).collect()
    }

    /// Light-space bounds of cascade `index` for the given camera, before
    /// snapping. Used by debug views.
    pub fn light_space_bounds(
        &self,
        index: usize,
        camera: &CameraView,
        parent_world: &Mat4,
    ) -> Option<Aabb> {
        let frustum = self.frustums.get(index)?;
        let light_orientation =
            orientation_matrix(self.settings.light_direction, self.settings.light_up);
        let camera_to_light =
            light_orientation.inverse() * parent_world.inverse() * camera.world_matrix();
        Some(frustum.to_space(&camera_to_light).bounding_box())
    }
}

/// Round down to a multiple of `step`. Zero or invalid steps pass through.
fn snap(value: f32, step: f32) -> f32 {
    if step > 0.0 && step.is_finite() {
        (value / step).floor() * step
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(near: f32, far: f32) -> CameraView {
        CameraView::perspective(60.0_f32.to_radians(), 1.5, near, far)
    }

    fn settings(cascades: usize) -> CsmSettings {
        CsmSettings {
            cascades,
            max_cascades: cascades.max(4),
            ..CsmSettings::default()
        }
    }

    fn shadows(settings: CsmSettings, camera: &CameraView) -> CascadedShadows {
        CascadedShadows::new(settings, camera).unwrap()
    }

    #[test]
    fn test_new_creates_one_light_per_cascade() {
        let cam = camera(0.1, 100.0);
        let csm = shadows(settings(3), &cam);
        assert_eq!(csm.lights().len(), 3);
        assert_eq!(csm.frustums().len(), 3);
        assert_eq!(csm.breaks().len(), 3);
        for light in csm.lights() {
            assert!(light.cast_shadow);
            assert_eq!(light.map_size, 2048);
        }
    }

    #[test]
    fn test_uniform_breaks_scenario() {
        let cam = camera(0.1, 100.0);
        let csm = shadows(
            CsmSettings {
                split_mode: SplitMode::Uniform,
                ..settings(3)
            },
            &cam,
        );
        let expected = [0.3337, 0.6670, 1.0];
        for (b, e) in csm.breaks().iter().zip(expected) {
            assert!((b - e).abs() < 1e-3);
        }
    }

    #[test]
    fn test_breaks_use_capped_far() {
        let cam = camera(0.1, 1000.0);
        let csm = shadows(
            CsmSettings {
                split_mode: SplitMode::Uniform,
                max_far: 100.0,
                ..settings(3)
            },
            &cam,
        );
        assert!((csm.breaks()[0] - 0.3337).abs() < 1e-3);
        for corner in csm.main_frustum().far {
            assert!((corner.z + 100.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_custom_without_callback_fails_construction() {
        let cam = camera(0.1, 100.0);
        let result = CascadedShadows::new(
            CsmSettings {
                split_mode: SplitMode::Custom,
                ..settings(3)
            },
            &cam,
        );
        assert!(matches!(result, Err(CsmError::MissingSplitCallback)));
    }

    #[test]
    fn test_custom_without_callback_leaves_state_unchanged() {
        let cam = camera(0.1, 100.0);
        let mut csm = shadows(settings(3), &cam);
        let breaks = csm.breaks().to_vec();
        let frustums = csm.frustums().to_vec();
        let lights = csm.lights().to_vec();

        csm.settings.split_mode = SplitMode::Custom;
        let moved = camera(0.5, 300.0);
        assert_eq!(csm.update_frustums(&moved), Err(CsmError::MissingSplitCallback));
        assert_eq!(csm.breaks(), breaks.as_slice());
        assert_eq!(csm.frustums(), frustums.as_slice());
        assert_eq!(csm.lights(), lights.as_slice());

        csm.settings.split_mode = SplitMode::Practical;
        assert_eq!(
            csm.set_split_mode(SplitMode::Custom, &moved),
            Err(CsmError::MissingSplitCallback)
        );
        assert_eq!(csm.settings().split_mode, SplitMode::Practical);
        assert_eq!(csm.breaks(), breaks.as_slice());
    }

    #[test]
    fn test_custom_callback() {
        let cam = camera(0.1, 100.0);
        let csm = CascadedShadows::with_split_callback(
            CsmSettings {
                split_mode: SplitMode::Custom,
                ..settings(2)
            },
            Box::new(|_, _, _| vec![0.05, 1.0]),
            &cam,
        )
        .unwrap();
        assert_eq!(csm.breaks(), &[0.05_f32, 1.0]);
    }

    #[test]
    fn test_cascade_count_validated() {
        let cam = camera(0.1, 100.0);
        for (cascades, max) in [(0, 3), (4, 3)] {
            let result = CascadedShadows::new(
                CsmSettings {
                    cascades,
                    max_cascades: max,
                    ..CsmSettings::default()
                },
                &cam,
            );
            assert!(matches!(result, Err(CsmError::InvalidCascadeCount { .. })));
        }
        let result = CascadedShadows::new(
            CsmSettings {
                cascades: 3,
                max_cascades: 9,
                ..CsmSettings::default()
            },
            &cam,
        );
        assert_eq!(
            result.err(),
            Some(CsmError::MaxCascadesTooLarge { max: 9, limit: MAX_CASCADE_SLOTS })
        );
    }

    #[test]
    fn test_cascade_count_error_names_real_bound() {
        assert_eq!(
            check_cascades(5, 4),
            Err(CsmError::InvalidCascadeCount { cascades: 5, max: 4 })
        );
        assert_eq!(
            check_cascades(0, 3).map_err(|e| e.to_string()),
            Err("cascade count 0 is not within 1..=3".to_string())
        );
        assert_eq!(check_cascades(3, 8), Ok(()));
    }

    #[test]
    fn test_lambda_out_of_range_fails_construction() {
        let cam = camera(0.1, 100.0);
        for lambda in [2.0, -0.5, f32::NAN] {
            let result = CascadedShadows::new(
                CsmSettings {
                    practical_lambda: lambda,
                    ..settings(3)
                },
                &cam,
            );
            assert!(matches!(result, Err(CsmError::InvalidLambda(_))));
        }
    }

    #[test]
    fn test_set_practical_lambda_out_of_range_keeps_state() {
        let cam = camera(0.1, 100.0);
        let mut csm = shadows(settings(3), &cam);
        let breaks = csm.breaks().to_vec();
        let frustums = csm.frustums().to_vec();

        assert_eq!(csm.set_practical_lambda(-1.0, &cam), Err(CsmError::InvalidLambda(-1.0)));
        assert_eq!(csm.set_practical_lambda(1.5, &cam), Err(CsmError::InvalidLambda(1.5)));
        assert_eq!(csm.breaks(), breaks.as_slice());
        assert_eq!(csm.frustums(), frustums.as_slice());
        assert_eq!(csm.settings().practical_lambda, CsmSettings::default().practical_lambda);

        csm.set_practical_lambda(1.0, &cam).unwrap();
        assert!(csm.breaks().windows(2).all(|w| w[0] < w[1]));
        assert!(csm.breaks().iter().all(|b| *b > 0.0 && *b <= 1.0));
    }

    #[test]
    fn test_max_far_inside_near_plane_rejected() {
        let cam = camera(0.1, 100.0);
        let result = CascadedShadows::new(
            CsmSettings {
                max_far: 0.05,
                ..settings(3)
            },
            &cam,
        );
        assert!(matches!(result, Err(CsmError::InvalidDepthRange { .. })));

        let mut csm = shadows(
            CsmSettings {
                max_far: 50.0,
                ..settings(3)
            },
            &cam,
        );
        let breaks = csm.breaks().to_vec();
        let uniforms = csm.uniforms();
        let result = csm.update_frustums(&camera(60.0, 100.0));
        assert_eq!(result, Err(CsmError::InvalidDepthRange { near: 60.0, far: 50.0 }));
        assert_eq!(csm.breaks(), breaks.as_slice());
        assert_eq!(csm.uniforms(), uniforms);
    }

    #[test]
    fn test_light_uniforms_pack_every_cascade() {
        let cam = camera(0.1, 100.0);
        let mut csm = shadows(settings(3), &cam);
        csm.update(&cam, &Mat4::IDENTITY);
        let packed = csm.light_uniforms();
        assert_eq!(packed.len(), 3);
        assert_eq!(std::mem::size_of_val(packed.as_slice()), 3 * 112);
        for (uniform, light) in packed.iter().zip(csm.lights()) {
            assert_eq!(uniform.color_bias[3], light.bias);
            assert_eq!(uniform.normal_bias_padding[0], light.normal_bias);
            let d = light.direction();
            assert!((Vec3::from_slice(&uniform.direction_intensity[..3]) - d).length() < 1e-6);
        }
    }

    #[test]
    fn test_shadow_bounds_square_with_scaled_bias() {
        let cam = camera(0.1, 100.0);
        let csm = shadows(
            CsmSettings {
                shadow_bias: -0.0001,
                shadow_normal_bias: 0.002,
                light_margin: 50.0,
                ..settings(3)
            },
            &cam,
        );
        for (frustum, light) in csm.frustums().iter().zip(csm.lights()) {
            let sc = light.shadow_camera;
            let width = sc.width();
            assert_eq!(width, sc.height());
            assert!((sc.left + width / 2.0).abs() < 1e-4);
            assert_eq!(sc.near, 0.0);
            assert!((sc.far - (width + 50.0)).abs() < 1e-3);
            assert!((light.bias - (-0.0001 * width)).abs() < 1e-6);
            assert!((light.normal_bias - 0.002 * width).abs() < 1e-6);

            let expected = frustum.far[0]
                .distance(frustum.far[2])
                .max(frustum.far[0].distance(frustum.near[2]));
            assert!((width - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_fade_widens_bounds() {
        let cam = camera(0.1, 100.0);
        let mut csm = shadows(
            CsmSettings {
                max_far: 200.0,
                ..settings(3)
            },
            &cam,
        );
        let plain: Vec<f32> = csm.lights().iter().map(|l| l.shadow_camera.width()).collect();
        csm.set_fade(true);
        for ((light, frustum), before) in csm.lights().iter().zip(csm.frustums()).zip(plain) {
            let far = 200.0_f32;
            let depth = frustum.far[0].z / (far - 0.1);
            let margin = 0.25 * depth * depth * (far - 0.1);
            assert!((light.shadow_camera.width() - (before + margin)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_update_places_lights_behind_cascades() {
        let mut cam = camera(0.1, 100.0);
        cam.position = Vec3::new(12.0, 4.0, -7.0);
        cam.look_at(Vec3::new(0.0, 0.0, -40.0), Vec3::Y);
        let mut csm = shadows(settings(3), &cam);
        let parent = Mat4::IDENTITY;
        csm.update(&cam, &parent);

        let dir = csm.settings().light_direction;
        let to_light = orientation_matrix(dir, csm.settings().light_up).inverse();
        for (i, light) in csm.lights().iter().enumerate() {
            assert!(((light.target - light.position) - dir).length() < 1e-4);

            let bounds = csm.light_space_bounds(i, &cam, &parent).unwrap();
            let local = to_light.transform_point3(light.position);
            assert!((local.z - (bounds.max.z + 200.0)).abs() < 1e-2);

            let texel = light.texel_size();
            let center = bounds.center();
            for (value, unsnapped, step) in [(local.x, center.x, texel.x), (local.y, center.y, texel.y)] {
                let q = value / step;
                assert!((q - q.round()).abs() < 1e-2, "{value} not on {step} grid");
                assert!(value <= unsnapped + 1e-3 && value > unsnapped - step - 1e-3);
            }
        }
    }

    #[test]
    fn test_update_respects_parent_transform() {
        let mut cam = camera(0.1, 100.0);
        cam.position = Vec3::new(3.0, 2.0, 1.0);
        let mut csm = shadows(settings(2), &cam);

        csm.update(&cam, &Mat4::IDENTITY);
        let world: Vec<Vec3> = csm.lights().iter().map(|l| l.position).collect();

        let offset = Vec3::new(100.0, 0.0, 0.0);
        let mut moved = cam.clone();
        moved.position += offset;
        csm.update(&moved, &Mat4::from_translation(offset));
        for (light, before) in csm.lights().iter().zip(world) {
            assert!((light.position - before).length() < 1e-2);
        }
    }

    #[test]
    fn test_extended_breaks_padding() {
        let cam = camera(0.1, 100.0);
        let csm = shadows(
            CsmSettings {
                split_mode: SplitMode::Uniform,
                max_cascades: 5,
                ..settings(3)
            },
            &cam,
        );
        let pairs = csm.extended_breaks();
        let b = csm.breaks();
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[0], Vec2::new(0.0, b[0]));
        assert_eq!(pairs[1], Vec2::new(b[0], b[1]));
        assert_eq!(pairs[2], Vec2::new(b[1], 1.0));
        assert_eq!(pairs[3], Vec2::ZERO);
        assert_eq!(pairs[4], Vec2::ZERO);
    }

    #[test]
    fn test_no_last_cascade_cutoff() {
        let cam = camera(0.1, 100.0);
        let csm = shadows(
            CsmSettings {
                no_last_cascade_cutoff: true,
                ..settings(2)
            },
            &cam,
        );
        let pairs = csm.extended_breaks();
        assert!(pairs[1].y.is_infinite());
        assert!(pairs[0].y.is_finite());
        assert_eq!(pairs[2], Vec2::ZERO);
    }

    #[test]
    fn test_uniform_near_far_scalars() {
        let cam = camera(0.5, 5000.0);
        let csm = shadows(
            CsmSettings {
                max_far: 300.0,
                ..settings(3)
            },
            &cam,
        );
        let u = csm.uniforms();
        assert_eq!(u.camera_near, 0.5);
        assert_eq!(u.shadow_far, 300.0);
    }

    #[test]
    fn test_materials_flagged_when_defines_change() {
        let cam = camera(0.1, 100.0);
        let mut csm = shadows(settings(3), &cam);
        let handle = csm.attach_material();
        assert!(csm.material(handle).unwrap().needs_update);
        assert!(csm.acknowledge_material(handle));

        csm.update_frustums(&camera(0.2, 150.0)).unwrap();
        let state = csm.material(handle).unwrap();
        assert!(!state.needs_update);
        assert_eq!(state.uniforms.camera_near, 0.2);

        csm.set_fade(true);
        assert!(csm.material(handle).unwrap().needs_update);
        csm.acknowledge_material(handle);

        csm.set_cascades(4, &cam).unwrap();
        let state = csm.material(handle).unwrap();
        assert!(state.needs_update);
        assert_eq!(state.defines.cascades, 4);
        assert_eq!(csm.lights().len(), 4);

        assert!(csm.detach_material(handle));
        assert!(!csm.detach_material(handle));
    }

    #[test]
    fn test_active_variant_follows_defines() {
        let cam = camera(0.1, 100.0);
        let mut csm = shadows(settings(2), &cam);
        assert_eq!(csm.active_variant().unwrap().label, "csm-2");
        csm.set_fade(true);
        assert_eq!(csm.active_variant().unwrap().label, "csm-2-fade");
        csm.set_cascades(4, &cam).unwrap();
        assert_eq!(csm.active_variant().unwrap().label, "csm-4-fade");
    }

    #[test]
    fn test_set_cascades_out_of_range_keeps_state() {
        let cam = camera(0.1, 100.0);
        let mut csm = shadows(settings(3), &cam);
        assert!(csm.set_cascades(5, &cam).is_err());
        assert_eq!(csm.lights().len(), 3);
        assert_eq!(csm.settings().cascades, 3);
    }

    #[test]
    fn test_shadow_map_size_marks_lights_stale() {
        let cam = camera(0.1, 100.0);
        let mut csm = shadows(settings(2), &cam);
        csm.set_shadow_map_size(1024);
        assert!(csm.lights().iter().all(|l| l.map_stale && l.map_size == 1024));
    }

    #[test]
    fn test_dispose() {
        let cam = camera(0.1, 100.0);
        let mut csm = shadows(settings(2), &cam);
        csm.attach_material();
        csm.dispose();
        assert!(csm.materials().is_empty());
        assert!(csm.lights().is_empty());
        assert!(csm.frustums().is_empty());
    }

    #[test]
    fn test_orthographic_camera() {
        let cam = CameraView::orthographic(20.0, 10.0, 0.1, 500.0);
        let csm = shadows(
            CsmSettings {
                max_far: 250.0,
                ..settings(3)
            },
            &cam,
        );
        let last = csm.frustums()[2];
        for corner in last.far {
            assert!((corner.z + 250.0).abs() < 1e-2);
            assert!((corner.x.abs() - 20.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_snap() {
        assert_eq!(snap(5.7, 2.0), 4.0);
        assert_eq!(snap(-0.5, 2.0), -2.0);
        assert_eq!(snap(3.3, 0.0), 3.3);
    }
}
