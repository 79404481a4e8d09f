//! Registry of materials that sample the cascaded shadow maps.
//!
//! Each attached material keeps its own copy of the cascade uniforms and the
//! defines its shader was compiled with. When a sync changes the defines the
//! material is flagged for recompilation until the renderer acknowledges it.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rustc_hash::FxHashMap;

/// Upper bound on cascades; sizes the uniform block and shader arrays.
pub const MAX_CASCADE_SLOTS: usize = 8;

/// Opaque id returned by [`MaterialRegistry::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(u64);

/// Per-frame cascade values every material receives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CascadeUniforms {
    /// `(previous break, break)` per cascade slot.
    pub breaks: Vec<Vec2>,
    pub camera_near: f32,
    pub shadow_far: f32,
}

/// Compile-time switches a material's shader depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialDefines {
    pub cascades: usize,
    pub fade: bool,
}

impl MaterialDefines {
    /// Name/value pairs in the form shader preprocessors expect.
    pub fn pairs(&self) -> [(&'static str, String); 3] {
        [
            ("USE_CSM", "1".to_string()),
            ("CSM_CASCADES", self.cascades.to_string()),
            ("CSM_FADE", u8::from(self.fade).to_string()),
        ]
    }
}

/// Everything the registry tracks for one material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialState {
    pub uniforms: CascadeUniforms,
    pub defines: MaterialDefines,
    /// Shader must be rebuilt before the next draw.
    pub needs_update: bool,
}

impl MaterialState {
    pub fn to_block(&self) -> CsmUniformBlock {
        CsmUniformBlock::new(&self.uniforms, &self.defines)
    }
}

/// GPU-side cascade uniforms, 144 bytes, std140-compatible.
///
/// Unused slots stay zero. An infinite upper break is written as `f32::INFINITY`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CsmUniformBlock {
    /// xy = (previous break, break), zw = padding.
    pub cascades: [[f32; 4]; MAX_CASCADE_SLOTS],
    pub camera_near: f32,
    pub shadow_far: f32,
    pub cascade_count: u32,
    pub fade: u32,
}

impl CsmUniformBlock {
    pub fn new(uniforms: &CascadeUniforms, defines: &MaterialDefines) -> Self {
        let mut block = Self::zeroed();
        for (slot, pair) in block.cascades.iter_mut().zip(&uniforms.breaks) {
            slot[0] = pair.x;
            slot[1] = pair.y;
        }
        block.camera_near = uniforms.camera_near;
        block.shadow_far = uniforms.shadow_far;
        block.cascade_count = defines.cascades as u32;
        block.fade = u32::from(defines.fade);
        block
    }
}

/// Attached materials keyed by handle.
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    next_id: u64,
    entries: FxHashMap<MaterialHandle, MaterialState>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material. Its shader starts out needing a build.
    pub fn attach(&mut self, uniforms: CascadeUniforms, defines: MaterialDefines) -> MaterialHandle {
        let handle = MaterialHandle(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            handle,
            MaterialState {
                uniforms,
                defines,
                needs_update: true,
            },
        );
        handle
    }

    /// Forget a material. Returns `false` if the handle was not attached.
    pub fn detach(&mut self, handle: MaterialHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&MaterialState> {
        self.entries.get(&handle)
    }

    /// Mark a material's shader as rebuilt.
    pub fn acknowledge(&mut self, handle: MaterialHandle) -> bool {
        match self.entries.get_mut(&handle) {
            Some(state) => {
                state.needs_update = false;
                true
            }
            None => false,
        }
    }

    /// Push uniforms to every material and flag those whose defines changed.
    /// Returns how many were newly flagged.
    pub fn sync(&mut self, uniforms: &CascadeUniforms, defines: MaterialDefines) -> usize {
        let mut flagged = 0;
        for state in self.entries.values_mut() {
            state.uniforms.clone_from(uniforms);
            if state.defines != defines {
                state.defines = defines;
                state.needs_update = true;
                flagged += 1;
            }
        }
        flagged
    }

    /// Handles whose shaders must be rebuilt, in attach order.
    pub fn pending(&self) -> Vec<MaterialHandle> {
        let mut handles: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, state)| state.needs_update)
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort_unstable();
        handles
    }

    /// Drop every material. Returns how many were attached.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniforms(breaks: &[f32]) -> CascadeUniforms {
        let mut prev = 0.0;
        CascadeUniforms {
            breaks: breaks
                .iter()
                .map(|&b| {
                    let pair = Vec2::new(prev, b);
                    prev = b;
                    pair
                })
                .collect(),
            camera_near: 0.1,
            shadow_far: 100.0,
        }
    }

    const THREE: MaterialDefines = MaterialDefines {
        cascades: 3,
        fade: false,
    };

    #[test]
    fn test_block_layout() {
        assert_eq!(std::mem::size_of::<CsmUniformBlock>(), 144);
        assert_eq!(std::mem::offset_of!(CsmUniformBlock, camera_near), 128);
        assert_eq!(std::mem::offset_of!(CsmUniformBlock, fade), 140);
    }

    #[test]
    fn test_block_packs_breaks_and_pads() {
        let u = uniforms(&[0.2, 0.5, f32::INFINITY]);
        let block = CsmUniformBlock::new(&u, &THREE);
        assert_eq!(block.cascades[0], [0.0, 0.2, 0.0, 0.0]);
        assert_eq!(block.cascades[1], [0.2, 0.5, 0.0, 0.0]);
        assert!(block.cascades[2][1].is_infinite());
        assert_eq!(block.cascades[3], [0.0; 4]);
        assert_eq!(block.cascade_count, 3);
        assert_eq!(block.fade, 0);
        assert_eq!(bytemuck::bytes_of(&block).len(), 144);
    }

    #[test]
    fn test_attach_starts_dirty() {
        let mut registry = MaterialRegistry::new();
        let handle = registry.attach(uniforms(&[1.0]), THREE);
        assert!(registry.get(handle).unwrap().needs_update);
        assert_eq!(registry.pending(), vec![handle]);
        assert!(registry.acknowledge(handle));
        assert!(registry.pending().is_empty());
    }

    #[test]
    fn test_detach_twice() {
        let mut registry = MaterialRegistry::new();
        let a = registry.attach(uniforms(&[1.0]), THREE);
        let b = registry.attach(uniforms(&[1.0]), THREE);
        assert_ne!(a, b);
        assert!(registry.detach(a));
        assert!(!registry.detach(a));
        assert!(!registry.acknowledge(a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sync_flags_only_on_define_change() {
        let mut registry = MaterialRegistry::new();
        let handle = registry.attach(uniforms(&[0.5, 1.0]), THREE);
        registry.acknowledge(handle);

        let next = uniforms(&[0.3, 0.6, 1.0]);
        assert_eq!(registry.sync(&next, THREE), 0);
        let state = registry.get(handle).unwrap();
        assert_eq!(state.uniforms, next);
        assert!(!state.needs_update);

        let faded = MaterialDefines {
            fade: true,
            ..THREE
        };
        assert_eq!(registry.sync(&next, faded), 1);
        assert!(registry.get(handle).unwrap().needs_update);
        assert_eq!(registry.get(handle).unwrap().defines, faded);
    }

    #[test]
    fn test_define_pairs() {
        let pairs = MaterialDefines {
            cascades: 4,
            fade: true,
        }
        .pairs();
        assert_eq!(pairs[0], ("USE_CSM", "1".to_string()));
        assert_eq!(pairs[1], ("CSM_CASCADES", "4".to_string()));
        assert_eq!(pairs[2], ("CSM_FADE", "1".to_string()));
    }

    #[test]
    fn test_clear() {
        let mut registry = MaterialRegistry::new();
        registry.attach(uniforms(&[1.0]), THREE);
        registry.attach(uniforms(&[1.0]), THREE);
        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
    }
}
