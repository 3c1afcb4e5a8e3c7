//! Weekly plan scheduling primitives

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;

use crate::{Error, Result};

/// Most tasks a single day's plan may hold
pub const TASKS_PER_DAY: usize = 3;

/// Days covered by plan generation, starting today
pub const PLAN_DAYS: usize = 7;

/// Draw up to `count` elements uniformly at random without replacement.
///
/// Each drawn element is removed from the working pool, so the result never
/// holds the same position twice. Returns the whole pool (shuffled) when it is
/// smaller than `count`.
pub fn choose<T: Clone, R: Rng + ?Sized>(pool: &[T], count: usize, rng: &mut R) -> Vec<T> {
    let mut remaining = pool.to_vec();
    let mut chosen = Vec::with_capacity(count.min(remaining.len()));

    while chosen.len() < count && !remaining.is_empty() {
        let idx = rng.gen_range(0..remaining.len());
        chosen.push(remaining.swap_remove(idx));
    }

    chosen
}

/// Tasks to add to a day that already holds `existing`, drawn from `pool`
/// minus anything already scheduled that day
pub fn top_up<T: Clone + PartialEq, R: Rng + ?Sized>(
    existing: &[T],
    pool: &[T],
    rng: &mut R,
) -> Vec<T> {
    let free = TASKS_PER_DAY.saturating_sub(existing.len());
    if free == 0 {
        return Vec::new();
    }
    let candidates: Vec<T> = pool
        .iter()
        .filter(|task| !existing.contains(task))
        .cloned()
        .collect();
    choose(&candidates, free, rng)
}

/// Reject a task list longer than a day can hold
pub fn check_capacity(count: usize) -> Result<()> {
    if count > TASKS_PER_DAY {
        return Err(Error::TooManyTasks {
            max: TASKS_PER_DAY,
            actual: count,
        });
    }
    Ok(())
}

/// The calendar day (UTC midnight) a timestamp falls on
pub fn normalize(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// `PLAN_DAYS` consecutive days starting at `start`
pub fn week_from(start: NaiveDate) -> Vec<NaiveDate> {
    (0..PLAN_DAYS as i64)
        .map(|offset| start + Duration::days(offset))
        .collect()
}
