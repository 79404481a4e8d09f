//! Pre-generated WGSL snippets for every cascade configuration.
//!
//! The table is built once from `max_cascades`; switching cascade count or
//! fade at runtime selects another entry instead of editing shared source.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::material::{MAX_CASCADE_SLOTS, MaterialDefines};

/// Lookup key for a shader variant.
pub type VariantKey = MaterialDefines;

/// One generated snippet plus the defines it was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderVariant {
    pub key: VariantKey,
    /// Debug label, e.g. `csm-3-fade`.
    pub label: String,
    /// WGSL declarations and helpers to splice into a lit shader.
    pub source: String,
}

/// All variants for `1..=max_cascades` with and without fade.
#[derive(Debug, Clone, Default)]
pub struct ShaderVariantTable {
    max_cascades: usize,
    variants: FxHashMap<VariantKey, ShaderVariant>,
}

impl ShaderVariantTable {
    pub fn new(max_cascades: usize) -> Self {
        let max_cascades = max_cascades.min(MAX_CASCADE_SLOTS);
        let mut variants = FxHashMap::default();
        for cascades in 1..=max_cascades {
            for fade in [false, true] {
                let key = VariantKey { cascades, fade };
                variants.insert(key, build_variant(key));
            }
        }
        debug!(max_cascades, count = variants.len(), "built csm shader variants");
        Self {
            max_cascades,
            variants,
        }
    }

    pub fn get(&self, key: VariantKey) -> Option<&ShaderVariant> {
        self.variants.get(&key)
    }

    pub fn max_cascades(&self) -> usize {
        self.max_cascades
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

fn build_variant(key: VariantKey) -> ShaderVariant {
    let label = format!(
        "csm-{}{}",
        key.cascades,
        if key.fade { "-fade" } else { "" }
    );
    let mut source = format!(
        "// {label}
const CSM_CASCADES: u32 = {cascades}u;
const CSM_FADE: bool = {fade};

struct CsmUniforms {{
    cascades: array<vec4<f32>, {slots}>,
    camera_near: f32,
    shadow_far: f32,
    cascade_count: u32,
    fade: u32,
}};

fn csm_linear_depth(view_z: f32, csm: CsmUniforms) -> f32 {{
    return (-view_z - csm.camera_near) / (csm.shadow_far - csm.camera_near);
}}

fn csm_cascade_index(depth: f32, csm: CsmUniforms) -> u32 {{
    for (var i = 0u; i < CSM_CASCADES; i = i + 1u) {{
        let range = csm.cascades[i].xy;
        if (depth >= range.x && depth < range.y) {{
            return i;
        }}
    }}
    return CSM_CASCADES;
}}
",
        cascades = key.cascades,
        fade = key.fade,
        slots = MAX_CASCADE_SLOTS,
    );
    if key.fade {
        source.push_str(
            "
fn csm_fade_weight(depth: f32, index: u32, csm: CsmUniforms) -> f32 {
    let range = csm.cascades[index].xy;
    let margin = 0.25 * pow(depth, 2.0) * (range.y - range.x);
    return clamp((range.y - depth) / max(margin, 1e-5), 0.0, 1.0);
}
",
        );
    }
    ShaderVariant { key, label, source }
}
