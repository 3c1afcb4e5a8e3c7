//! Weekly plan generation
//!
//! Turns a user's over-threshold tags into disposal tasks and spreads those
//! tasks across the coming week, at most three per day.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use nixknack_core::schedule::top_up;
use nixknack_core::{choose, exceeds_threshold, normalize, week_from, TASKS_PER_DAY};
use rand::Rng;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Store, StoreResult, TaskId, UserId};

/// Outcome of a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Distinct tasks eligible for scheduling
    pub pool: usize,
    pub week: WeekSummary,
}

/// What `populate_week` did to each of the seven days
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekSummary {
    pub created: usize,
    pub topped_up: usize,
    pub skipped: usize,
}

/// One scheduled task as shown to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTask {
    pub id: u64,
    pub objective: String,
    pub item: u64,
    #[serde(rename = "itemName")]
    pub item_name: Option<String>,
}

/// A day of the week view; `tasks` is empty when nothing is planned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub tasks: Vec<PlannedTask>,
}

/// Build the task pool for `user` and schedule it over the week from `today`
pub fn generate_plan<S, R>(
    store: &S,
    user: UserId,
    today: NaiveDate,
    rng: &mut R,
) -> StoreResult<GenerationSummary>
where
    S: Store + ?Sized,
    R: Rng + ?Sized,
{
    let expired = store.delete_expired_plans(today)?;
    if expired > 0 {
        tracing::debug!(expired, "Swept expired plans before generation");
    }

    let owned: Vec<_> = store.list_items(user)?.into_iter().map(|item| item.id).collect();
    let tags = store.tags_for_items(&owned)?;

    let mut pool: Vec<TaskId> = Vec::new();
    for (tag, items) in store.items_by_tag(&tags, &owned)? {
        let threshold = store.tag_threshold(&tag)?;
        if !exceeds_threshold(items.len(), threshold) {
            continue;
        }

        let objective = store.get_recommendation(&tag)?.text;
        for item in items {
            let task = match store.find_task(user, &objective, item)? {
                Some(task) => task.id,
                None => match store.assign_task(user, &objective, item) {
                    Ok(id) => id,
                    // Assigned by a concurrent run
                    Err(AppError::NotAllowed(_)) => store
                        .find_task(user, &objective, item)?
                        .map(|task| task.id)
                        .ok_or_else(|| {
                            AppError::Internal(format!("task for item {} vanished", item.0))
                        })?,
                    Err(e) => return Err(e),
                },
            };
            if !pool.contains(&task) {
                pool.push(task);
            }
        }
    }

    let week = populate_week(store, user, today, &pool, rng)?;

    tracing::info!(
        user = user.0,
        pool = pool.len(),
        created = week.created,
        topped_up = week.topped_up,
        "Generated weekly plan"
    );

    Ok(GenerationSummary {
        pool: pool.len(),
        week,
    })
}

/// Fill each of the seven days from `today` with tasks drawn from `pool`.
///
/// A missing day gets a fresh plan, a partial day is topped up with tasks
/// it does not already hold, and a full day is left alone.
pub fn populate_week<S, R>(
    store: &S,
    user: UserId,
    today: NaiveDate,
    pool: &[TaskId],
    rng: &mut R,
) -> StoreResult<WeekSummary>
where
    S: Store + ?Sized,
    R: Rng + ?Sized,
{
    let mut summary = WeekSummary::default();

    for day in week_from(today) {
        match store.get_plan(user, day)? {
            None => {
                let tasks = choose(pool, TASKS_PER_DAY, rng);
                match store.create_plan(user, day, &tasks) {
                    Ok(_) => summary.created += 1,
                    Err(AppError::NotAllowed(_)) => summary.skipped += 1,
                    Err(e) => return Err(e),
                }
            }
            Some(plan) => {
                // Completed tasks leave dangling ids behind
                let live: Vec<TaskId> = store
                    .get_tasks(&plan.tasks)?
                    .into_iter()
                    .map(|task| task.id)
                    .collect();

                let extra = top_up(&live, pool, rng);
                if extra.is_empty() && live.len() == plan.tasks.len() {
                    summary.skipped += 1;
                    continue;
                }

                let mut tasks = live;
                tasks.extend(extra);
                store.set_plan_tasks(plan.id, &tasks)?;
                summary.topped_up += 1;
            }
        }
    }

    Ok(summary)
}

/// The week starting at `today`, one entry per day
pub fn week_plans<S>(store: &S, user: UserId, today: NaiveDate) -> StoreResult<Vec<DayPlan>>
where
    S: Store + ?Sized,
{
    store.delete_expired_plans(today)?;

    let mut days = Vec::with_capacity(nixknack_core::PLAN_DAYS);
    for date in week_from(today) {
        let task_ids = store
            .get_plan(user, date)?
            .map(|plan| plan.tasks)
            .unwrap_or_default();

        let mut tasks = Vec::with_capacity(task_ids.len());
        for task in store.get_tasks(&task_ids)? {
            let item_name = store.get_item(task.item)?.map(|item| item.name);
            tasks.push(PlannedTask {
                id: task.id.0,
                objective: task.objective,
                item: task.item.0,
                item_name,
            });
        }

        days.push(DayPlan { date, tasks });
    }

    Ok(days)
}

/// Periodically delete plans dated before today
pub fn spawn_expiry_sweep<S>(state: Arc<AppState<S>>) -> tokio::task::JoinHandle<()>
where
    S: Store + 'static,
{
    let period = Duration::from_secs(state.config.sweep_interval_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let today = normalize(Utc::now());
            match state.store.delete_expired_plans(today) {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, %today, "Swept expired plans"),
                Err(e) => tracing::warn!(error = %e, "Plan sweep failed"),
            }
        }
    })
}
