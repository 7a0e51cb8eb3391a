//! Contains constraints, enumerations and other custom types.

mod constraints;
mod enums;
mod progress;

pub use constraints::{
    ConstraintCategory, ConstraintViolation, DownloadRequestConstraints, RetreatConstraints,
    TrackConstraints,
};
pub use enums::DownloadStatus;
pub use progress::{PerformanceMetrics, ProgressInfo};
