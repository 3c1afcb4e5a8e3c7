//! NixKnack Core Library
//!
//! Domain rules shared by the NixKnack service:
//! - Tags carry a threshold; owning more tagged items than that schedules disposal tasks
//! - Recommendations describe how to get rid of an item with a given tag
//! - Plans bundle at most three tasks per day over a rolling week
//! - Points and achievements reward cataloguing and discarding

pub mod achievement;
pub mod error;
pub mod recommendation;
pub mod reward;
pub mod schedule;
pub mod tag;

pub use achievement::{AchievementKind, AchievementType, Bounds};
pub use error::Error;
pub use schedule::{choose, normalize, week_from, PLAN_DAYS, TASKS_PER_DAY};
pub use tag::{exceeds_threshold, DEFAULT_TAG_THRESHOLD};

/// Result type for nixknack-core operations
pub type Result<T> = std::result::Result<T, Error>;
