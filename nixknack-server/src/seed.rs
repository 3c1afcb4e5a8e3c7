//! Catalog seeding

use nixknack_core::achievement::catalog;
use nixknack_core::recommendation::DEFAULT_RECOMMENDATIONS;
use nixknack_core::tag::DEFINED_TAGS;
use serde::Serialize;

use crate::error::AppError;
use crate::store::{Store, StoreResult};

/// How many records a seed run created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub tags: usize,
    pub recommendations: usize,
    pub achievements: usize,
}

/// Load the tag catalog, default recommendations and achievement types.
///
/// Existing tags and recommendations are left as they are, so running this
/// twice is harmless. Achievement definitions are always rewritten.
pub fn load_seed_data<S: Store + ?Sized>(store: &S) -> StoreResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    for (value, threshold) in DEFINED_TAGS {
        match store.create_tag(value, *threshold) {
            Ok(()) => summary.tags += 1,
            Err(AppError::NotAllowed(_)) => {}
            Err(e) => return Err(e),
        }
    }

    for (tag, text) in DEFAULT_RECOMMENDATIONS {
        match store.create_recommendation(tag, text) {
            Ok(_) => summary.recommendations += 1,
            Err(AppError::NotAllowed(_)) => {}
            Err(e) => return Err(e),
        }
    }

    for def in catalog() {
        store.upsert_achievement_type(&def)?;
        summary.achievements += 1;
    }

    tracing::info!(
        tags = summary.tags,
        recommendations = summary.recommendations,
        achievements = summary.achievements,
        "Loaded seed data"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        AchievementStore, InMemoryStore, RecommendationStore, SqliteStore, TagStore,
    };

    #[test]
    fn test_seed_is_idempotent() {
        let store = InMemoryStore::new();

        let first = load_seed_data(&store).unwrap();
        assert_eq!(first.tags, DEFINED_TAGS.len());
        assert_eq!(first.recommendations, DEFAULT_RECOMMENDATIONS.len());
        assert_eq!(first.achievements, 4);

        let second = load_seed_data(&store).unwrap();
        assert_eq!(second.tags, 0);
        assert_eq!(second.recommendations, 0);

        assert_eq!(store.list_tags().unwrap().len(), DEFINED_TAGS.len());
        assert_eq!(store.list_achievement_types().unwrap().len(), 4);
    }

    #[test]
    fn test_seed_keeps_custom_thresholds() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_tag("Books", 2).unwrap();

        load_seed_data(&store).unwrap();

        assert_eq!(store.tag_threshold("Books").unwrap(), 2);
        assert_eq!(store.tag_threshold("Clothing").unwrap(), 10);
        assert!(store.find_recommendation("Miscellaneous").unwrap().is_some());
    }
}
