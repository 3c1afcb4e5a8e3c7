//! Disposal recommendations

/// Tag whose recommendation stands in for tags without their own
pub const FALLBACK_TAG: &str = "Miscellaneous";

/// Text used when neither the tag nor the fallback tag has an entry
pub const DEFAULT_TEXT: &str =
    "Throw it out or recycle if possible (check Earth911 for potential recycling methods)";

/// Recommendations loaded by the seed routine
pub const DEFAULT_RECOMMENDATIONS: &[(&str, &str)] = &[
    (
        "Books",
        "Donate to a local library or little free library, or sell to a used bookstore",
    ),
    (
        "Clothing",
        "Donate wearable clothes to a thrift store; drop worn-out textiles at a textile recycling bin",
    ),
    (
        "Decor",
        "Offer it on a local buy-nothing group or donate it to a thrift store",
    ),
    (
        "Electronics",
        "Wipe personal data, then take it to a certified e-waste recycler or a retailer take-back program",
    ),
    (
        "Kitchenware",
        "Donate usable pieces to a shelter or thrift store; recycle metal cookware as scrap",
    ),
    (
        "Linens",
        "Give old towels and blankets to an animal shelter",
    ),
    ("Miscellaneous", DEFAULT_TEXT),
    (
        "Tools",
        "Donate to a tool library or community workshop",
    ),
    (
        "Toys",
        "Donate to a children's hospital, daycare or family shelter",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::DEFINED_TAGS;

    #[test]
    fn test_every_defined_tag_has_recommendation() {
        for (tag, _) in DEFINED_TAGS {
            assert!(
                DEFAULT_RECOMMENDATIONS.iter().any(|(t, _)| t == tag),
                "missing recommendation for {}",
                tag
            );
        }
    }

    #[test]
    fn test_fallback_tag_is_seeded() {
        assert!(DEFAULT_RECOMMENDATIONS
            .iter()
            .any(|(t, text)| *t == FALLBACK_TAG && !text.is_empty()));
    }
}
