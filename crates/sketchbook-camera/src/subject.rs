//! The moving object a camera may follow.

use glam::{Quat, Vec3};

/// Something the orbit camera can look ahead of, such as a driven vehicle.
///
/// Passed into [`OrbitCamera::update`](crate::OrbitCamera::update) each
/// frame; the camera keeps no reference between frames.
pub trait FollowedSubject {
    /// World-space position.
    fn position(&self) -> Vec3;

    /// World-space orientation.
    fn orientation(&self) -> Quat;

    /// Heading the camera looks ahead along. Defaults to local `-Z`.
    fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    /// Whether the subject's current mode permits auto-follow.
    fn allows_auto_follow(&self) -> bool {
        true
    }
}

/// A plain subject snapshot, useful when the caller has no richer type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubjectSnapshot {
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation.
    pub orientation: Quat,
    /// Whether auto-follow is permitted.
    pub auto_follow: bool,
}

impl SubjectSnapshot {
    /// A follow-capable subject at `position` facing along `orientation`.
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            auto_follow: true,
        }
    }
}

impl FollowedSubject for SubjectSnapshot {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }

    fn allows_auto_follow(&self) -> bool {
        self.auto_follow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_forward_is_neg_z() {
        let s = SubjectSnapshot::new(Vec3::ZERO, Quat::IDENTITY);
        assert!((s.forward() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_forward_follows_orientation() {
        let s = SubjectSnapshot::new(
            Vec3::ZERO,
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        assert!((s.forward() - Vec3::NEG_X).length() < 1e-5);
    }
}
