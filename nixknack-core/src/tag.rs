//! Tag catalog and threshold rules

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// Threshold given to tags created on first use
pub const DEFAULT_TAG_THRESHOLD: u32 = 5;

/// Tags offered to every user, with the item count above which owning more
/// of them schedules disposal tasks
pub const DEFINED_TAGS: &[(&str, u32)] = &[
    ("Books", 15),
    ("Clothing", 10),
    ("Decor", 8),
    ("Electronics", 5),
    ("Kitchenware", 10),
    ("Linens", 6),
    ("Miscellaneous", 5),
    ("Tools", 6),
    ("Toys", 8),
];

/// Threshold for a catalog tag, or the default for anything else
pub fn default_threshold(tag: &str) -> u32 {
    DEFINED_TAGS
        .iter()
        .find(|(value, _)| *value == tag)
        .map(|(_, threshold)| *threshold)
        .unwrap_or(DEFAULT_TAG_THRESHOLD)
}

/// A tag becomes actionable once the count strictly exceeds its threshold
pub fn exceeds_threshold(count: usize, threshold: u32) -> bool {
    count > threshold as usize
}

/// Intersect each tag's membership with a candidate set.
///
/// Tags whose intersection is empty are dropped. Member order is preserved.
pub fn items_by_tag<T, I>(memberships: I, candidates: &[T]) -> BTreeMap<String, Vec<T>>
where
    T: Eq + Hash + Copy,
    I: IntoIterator<Item = (String, Vec<T>)>,
{
    let candidates: HashSet<T> = candidates.iter().copied().collect();

    memberships
        .into_iter()
        .filter_map(|(tag, members)| {
            let matching: Vec<T> = members
                .into_iter()
                .filter(|item| candidates.contains(item))
                .collect();
            (!matching.is_empty()).then_some((tag, matching))
        })
        .collect()
}
