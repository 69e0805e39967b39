pub mod detector;
pub mod diff;
pub mod target;

pub use detector::{detect, ChangeEvent, Outcome};
pub use diff::{DiffLine, Hunk, UnifiedDiff};
pub use target::{DegradedTarget, Target, TargetState, DEFAULT_SELECTOR};
