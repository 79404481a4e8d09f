//! Camera pose, orbit controller and free-fly movement.

pub mod free_fly;
pub mod orbit;
pub mod subject;
pub mod view;

pub use free_fly::VELOCITY_LERP;
pub use orbit::{MIN_TARGET_RADIUS, OrbitCamera, OrbitMode, PHI_LIMIT, RADIUS_LERP};
pub use subject::{FollowedSubject, SubjectSnapshot};
pub use view::{CameraView, Projection, look_rotation};
