//! Achievement catalog and level lookup
//!
//! An achievement is a named, ascending list of thresholds. A user's level is
//! the index of the highest threshold their progress has reached.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The achievements tracked by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AchievementKind {
    /// Mirrors the user's point total
    Experience,
    ItemsAdded,
    ItemsDiscarded,
    CompletedTasks,
}

impl AchievementKind {
    pub const ALL: [AchievementKind; 4] = [
        AchievementKind::Experience,
        AchievementKind::ItemsAdded,
        AchievementKind::ItemsDiscarded,
        AchievementKind::CompletedTasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementKind::Experience => "Experience",
            AchievementKind::ItemsAdded => "ItemsAdded",
            AchievementKind::ItemsDiscarded => "ItemsDiscarded",
            AchievementKind::CompletedTasks => "CompletedTasks",
        }
    }

    /// Thresholds loaded by the seed routine
    pub fn default_thresholds(&self) -> &'static [u64] {
        match self {
            AchievementKind::Experience => &[0, 50, 100, 250, 500, 1000],
            AchievementKind::ItemsAdded => &[0, 1, 10, 25, 50, 100],
            AchievementKind::ItemsDiscarded => &[0, 1, 5, 10, 25, 50],
            AchievementKind::CompletedTasks => &[0, 1, 5, 10, 25, 50],
        }
    }
}

/// A validated achievement definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementType {
    pub name: String,
    pub thresholds: Vec<u64>,
}

impl AchievementType {
    /// Build a definition, rejecting empty or non-ascending thresholds
    pub fn new(name: impl Into<String>, thresholds: Vec<u64>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Empty("achievement name"));
        }
        if thresholds.is_empty() {
            return Err(Error::EmptyThresholds { name });
        }
        if thresholds.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::UnsortedThresholds { name });
        }
        Ok(Self { name, thresholds })
    }

    pub fn level(&self, progress: u64) -> Option<usize> {
        level(progress, &self.thresholds)
    }

    pub fn bounds(&self, progress: u64) -> Bounds {
        bounds(self.level(progress), &self.thresholds)
    }
}

/// The definitions seeded on startup
pub fn catalog() -> Vec<AchievementType> {
    AchievementKind::ALL
        .iter()
        .map(|kind| AchievementType {
            name: kind.as_str().to_string(),
            thresholds: kind.default_thresholds().to_vec(),
        })
        .collect()
}

/// Largest index `l` with `progress >= thresholds[l]`.
///
/// Binary search for the first threshold strictly above `progress`, then step
/// back one. Returns `None` when progress is below every threshold.
/// `thresholds` must be ascending.
pub fn level(progress: u64, thresholds: &[u64]) -> Option<usize> {
    let mut lo = 0;
    let mut hi = thresholds.len();

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if progress < thresholds[mid] {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    lo.checked_sub(1)
}

/// Thresholds surrounding a level, serialized as `[lower, upper]`.
///
/// `upper` is `None` once the last threshold is reached; `lower` is `None`
/// before the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds(pub Option<u64>, pub Option<u64>);

pub fn bounds(level: Option<usize>, thresholds: &[u64]) -> Bounds {
    match level {
        Some(l) => Bounds(thresholds.get(l).copied(), thresholds.get(l + 1).copied()),
        None => Bounds(None, thresholds.first().copied()),
    }
}
