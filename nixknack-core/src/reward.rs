//! Point amounts awarded for user actions

/// Cataloguing a new item
pub const ITEM_ADDED: u64 = 5;

/// Discarding an item
pub const ITEM_DISCARDED: u64 = 10;

/// Completing a scheduled task, on top of any discard reward
pub const TASK_COMPLETED: u64 = 10;
