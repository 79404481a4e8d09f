//! Cascade break computation.
//!
//! A break is a fraction of `far` marking where one cascade ends. Every
//! scheme returns `cascades` breaks, strictly increasing and ending at `1.0`.

use sketchbook_config::SplitMode;

use crate::error::CsmError;
use crate::material::MAX_CASCADE_SLOTS;

/// User-supplied break generator: `(cascades, near, far) -> breaks`.
pub type SplitCallback = Box<dyn Fn(usize, f32, f32) -> Vec<f32>>;

/// Evenly spaced in depth.
pub fn uniform_breaks(cascades: usize, near: f32, far: f32) -> Vec<f32> {
    let n = cascades as f32;
    (1..cascades)
        .map(|i| (near + (far - near) * i as f32 / n) / far)
        .chain(std::iter::once(1.0))
        .collect()
}

/// Geometrically spaced; keeps near cascades small.
pub fn logarithmic_breaks(cascades: usize, near: f32, far: f32) -> Vec<f32> {
    let n = cascades as f32;
    (1..cascades)
        .map(|i| near * (far / near).powf(i as f32 / n) / far)
        .chain(std::iter::once(1.0))
        .collect()
}

/// Per-index blend of the uniform and logarithmic schemes.
/// `lambda = 0` is uniform, `lambda = 1` logarithmic.
pub fn practical_breaks(cascades: usize, near: f32, far: f32, lambda: f32) -> Vec<f32> {
    let uniform = uniform_breaks(cascades, near, far);
    let log = logarithmic_breaks(cascades, near, far);
    uniform
        .iter()
        .zip(&log)
        .take(cascades.saturating_sub(1))
        .map(|(u, l)| u + (l - u) * lambda)
        .chain(std::iter::once(1.0))
        .collect()
}

/// Breaks for `mode`. `custom` is consulted only for [`SplitMode::Custom`].
pub fn compute_breaks(
    mode: SplitMode,
    cascades: usize,
    near: f32,
    far: f32,
    lambda: f32,
    custom: Option<&dyn Fn(usize, f32, f32) -> Vec<f32>>,
) -> Result<Vec<f32>, CsmError> {
    if cascades == 0 {
        return Err(CsmError::InvalidCascadeCount {
            cascades,
            max: MAX_CASCADE_SLOTS,
        });
    }
    match mode {
        SplitMode::Uniform => Ok(uniform_breaks(cascades, near, far)),
        SplitMode::Logarithmic => Ok(logarithmic_breaks(cascades, near, far)),
        SplitMode::Practical => {
            check_lambda(lambda)?;
            Ok(practical_breaks(cascades, near, far, lambda))
        }
        SplitMode::Custom => {
            let callback = custom.ok_or(CsmError::MissingSplitCallback)?;
            let breaks = callback(cascades, near, far);
            check_custom_breaks(&breaks, cascades)?;
            Ok(breaks)
        }
    }
}

/// Practical blend factor must lie in `[0, 1]`.
pub(crate) fn check_lambda(lambda: f32) -> Result<(), CsmError> {
    if (0.0..=1.0).contains(&lambda) {
        Ok(())
    } else {
        Err(CsmError::InvalidLambda(lambda))
    }
}

fn check_custom_breaks(breaks: &[f32], cascades: usize) -> Result<(), CsmError> {
    let reason = if breaks.len() != cascades {
        Some("length differs from cascade count")
    } else if breaks.iter().any(|b| !(*b > 0.0 && *b <= 1.0)) {
        Some("breaks must lie in (0, 1]")
    } else if breaks.windows(2).any(|w| w[0] >= w[1]) {
        Some("breaks must be strictly increasing")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(CsmError::InvalidCustomBreaks {
            breaks: breaks.to_vec(),
            reason,
        }),
        None => Ok(()),
    }
}
