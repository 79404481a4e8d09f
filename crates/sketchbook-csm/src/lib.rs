//! Cascaded shadow maps: frustum splitting, per-cascade light fitting and
//! uniform sync for the materials that sample them.

mod csm;
mod debug;
mod error;
pub mod frustum;
mod light;
mod material;
pub mod shader;
pub mod split;

pub use csm::{CascadedShadows, CsmSettings};
pub use debug::{DebugGeometry, ShadowBounds, frustum_edges};
pub use error::CsmError;
pub use frustum::{Aabb, CascadeFrustum};
pub use light::{
    CascadeLight, CascadeLightUniform, ShadowCamera, orientation, orientation_matrix,
};
pub use material::{
    CascadeUniforms, CsmUniformBlock, MAX_CASCADE_SLOTS, MaterialDefines, MaterialHandle,
    MaterialRegistry, MaterialState,
};
pub use shader::{ShaderVariant, ShaderVariantTable, VariantKey};
pub use split::{SplitCallback, compute_breaks};
