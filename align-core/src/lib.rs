//! Shared SE(2) math, timestamped pose/detection types, and the external
//! interface traits that the mapper, registration, and TCAFF crates build
//! on top of.

pub mod detection;
pub mod pose;
pub mod se2;
pub mod snapshot;

pub use detection::{Detection, DetectionSource};
pub use pose::{interpolate, Pose, PoseLookupError, PoseSource, Time};
pub use se2::{project_isometry3, Se2};
pub use snapshot::{LandmarkSummary, MapProvider, MapSnapshot};
