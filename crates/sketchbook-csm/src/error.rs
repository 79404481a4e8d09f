use thiserror::Error;

/// Errors raised while configuring or updating cascaded shadows.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CsmError {
    /// Custom split mode is selected but no callback was supplied.
    #[error("custom split mode selected but no split callback is set")]
    MissingSplitCallback,

    /// The custom split callback produced an unusable break list.
    #[error("custom split callback returned {breaks:?}: {reason}")]
    InvalidCustomBreaks {
        breaks: Vec<f32>,
        reason: &'static str,
    },

    /// Cascade count outside `1..=max`.
    #[error("cascade count {cascades} is not within 1..={max}")]
    InvalidCascadeCount { cascades: usize, max: usize },

    /// `max_cascades` exceeds the number of uniform slots.
    #[error("max cascades {max} exceeds the {limit} uniform slots")]
    MaxCascadesTooLarge { max: usize, limit: usize },

    /// Practical split blend factor outside `[0, 1]`.
    #[error("practical split lambda {0} is not within [0, 1]")]
    InvalidLambda(f32),

    /// The capped far distance does not lie beyond the camera near plane.
    #[error("shadow depth range {near}..{far} is empty")]
    InvalidDepthRange { near: f32, far: f32 },

    /// The camera projection cannot be inverted.
    #[error("camera projection matrix is not invertible")]
    DegenerateProjection,
}
