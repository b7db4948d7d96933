use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions, Strength};

/// Orders display names alphabetically the way people read them: case is
/// ignored, accented letters sort next to their base letter.
pub struct NameCollator {
    collator: Option<Collator>,
}

impl NameCollator {
    pub fn new() -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Secondary);

        let collator = match Collator::try_new(&Default::default(), options) {
            Ok(collator) => Some(collator),
            Err(err) => {
                tracing::warn!("Name collation unavailable, comparing lowercase: {}", err);
                None
            }
        };

        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }
}

impl Default for NameCollator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("apple", "Banana", Ordering::Less; "case ignored")]
    #[test_case("Émile", "Zed", Ordering::Less; "accent next to base letter")]
    #[test_case("émile", "Emile", Ordering::Greater; "accent after plain letter")]
    #[test_case("Alpha", "alpha", Ordering::Equal; "same letters")]
    fn test_compare_names(a: &str, b: &str, expected: Ordering) {
        assert_eq!(NameCollator::new().compare(a, b), expected);
    }
}
