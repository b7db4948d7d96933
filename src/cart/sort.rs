use std::{cmp::Ordering, fmt, str::FromStr, sync::Arc};

use eyre::Result;
use nft_core::core::persistence::KeyValueStore;

use crate::model::{collation::NameCollator, nft::ItemDetail};

use super::slot::CartSlot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortCriterion {
    /// Most expensive first
    Price,
    /// Best rated first
    Rating,
    /// Alphabetical, ignoring case; accented letters sit by their base letter
    Name,
}

impl SortCriterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortCriterion::Price => "price",
            SortCriterion::Rating => "rating",
            SortCriterion::Name => "name",
        }
    }

    fn compare(&self, a: &ItemDetail, b: &ItemDetail, collator: &NameCollator) -> Ordering {
        match self {
            SortCriterion::Price => b.price.cmp(&a.price),
            SortCriterion::Rating => b.rating.cmp(&a.rating),
            SortCriterion::Name => collator.compare(&a.name, &b.name),
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(SortCriterion::Price),
            "rating" => Ok(SortCriterion::Rating),
            "name" => Ok(SortCriterion::Name),
            other => Err(format!("Unknown sort criterion: {}", other)),
        }
    }
}

/// Stable sort of cart slots. Slots without detail keep their relative order
/// behind every ready slot.
pub fn sort_slots(slots: &mut [CartSlot], criterion: SortCriterion) {
    let collator = NameCollator::new();
    slots.sort_by(|a, b| match (a.detail(), b.detail()) {
        (Some(a), Some(b)) => criterion.compare(a, b, &collator),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Remembers the last chosen criterion in the injected store.
#[derive(Clone)]
pub struct SortPreference {
    store: Arc<dyn KeyValueStore>,
}

impl SortPreference {
    pub const KEY: &'static str = "cart_sort_criterion";

    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Result<Option<SortCriterion>> {
        let Some(value) = self.store.get_string(Self::KEY)? else {
            return Ok(None);
        };

        match value.parse() {
            Ok(criterion) => Ok(Some(criterion)),
            Err(err) => {
                tracing::warn!("Ignoring stored sort preference: {}", err);
                Ok(None)
            }
        }
    }

    pub fn save(&self, criterion: SortCriterion) -> Result<()> {
        self.store.set_string(Self::KEY, criterion.as_str())
    }
}

#[cfg(test)]
mod tests {
    use nft_core::core::{bits::Amount, persistence::util::InMemoryKeyValueStore};
    use rust_decimal::dec;
    use test_case::test_case;

    use crate::net::http_client::NetworkError;

    use super::*;

    fn ready(id: &str, name: &str, price: Amount, rating: u8) -> CartSlot {
        CartSlot::Ready(Arc::new(ItemDetail {
            id: id.into(),
            name: name.into(),
            price,
            rating,
            images: vec![],
        }))
    }

    fn sample() -> Vec<CartSlot> {
        vec![
            CartSlot::Pending("p".into()),
            ready("a", "bravo", dec!(1.5), 2),
            CartSlot::Failed("f".into(), NetworkError::HttpStatus(500)),
            ready("b", "Alpha", dec!(3), 1),
            ready("c", "charlie", dec!(0.5), 5),
        ]
    }

    fn ids(slots: &[CartSlot]) -> Vec<&str> {
        slots.iter().map(|s| s.id().as_str()).collect()
    }

    #[test_case(SortCriterion::Price, vec!["b", "a", "c", "p", "f"]; "price descending")]
    #[test_case(SortCriterion::Rating, vec!["c", "a", "b", "p", "f"]; "rating descending")]
    #[test_case(SortCriterion::Name, vec!["b", "a", "c", "p", "f"]; "name ascending ignoring case")]
    fn test_sort_slots(criterion: SortCriterion, expected: Vec<&str>) {
        let mut slots = sample();
        sort_slots(&mut slots, criterion);
        assert_eq!(ids(&slots), expected);
    }

    #[test]
    fn test_name_sort_places_accented_names_alphabetically() {
        let mut slots = vec![
            ready("z", "Zed", dec!(1), 1),
            ready("e", "Émile", dec!(1), 1),
            ready("a", "apple", dec!(1), 1),
            ready("o", "Óscar", dec!(1), 1),
        ];
        sort_slots(&mut slots, SortCriterion::Name);

        let names: Vec<_> = slots.iter().filter_map(|s| s.detail()).map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "Émile", "Óscar", "Zed"]);
    }

    #[test]
    fn test_price_sort_is_non_increasing() {
        let mut slots = sample();
        sort_slots(&mut slots, SortCriterion::Price);

        let prices: Vec<_> = slots.iter().filter_map(|s| s.detail()).map(|d| d.price).collect();
        assert!(prices.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut slots = vec![
            ready("x", "same", dec!(1), 3),
            ready("y", "same", dec!(1), 3),
            ready("z", "same", dec!(1), 3),
        ];
        for criterion in [SortCriterion::Price, SortCriterion::Rating, SortCriterion::Name] {
            sort_slots(&mut slots, criterion);
            assert_eq!(ids(&slots), vec!["x", "y", "z"]);
        }
    }

    #[test_case("price", Ok(SortCriterion::Price))]
    #[test_case("rating", Ok(SortCriterion::Rating))]
    #[test_case("name", Ok(SortCriterion::Name))]
    #[test_case("Price", Err(()); "case sensitive")]
    fn test_parse_criterion(input: &str, expected: Result<SortCriterion, ()>) {
        assert_eq!(input.parse::<SortCriterion>().map_err(|_| ()), expected);
    }

    #[test]
    fn test_preference_round_trip() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let preference = SortPreference::new(store.clone());

        assert_eq!(preference.load().unwrap(), None);
        preference.save(SortCriterion::Rating).unwrap();
        assert_eq!(preference.load().unwrap(), Some(SortCriterion::Rating));
        assert_eq!(
            store.get_string(SortPreference::KEY).unwrap().as_deref(),
            Some("rating")
        );
    }

    #[test]
    fn test_preference_ignores_garbage() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        store.set_string(SortPreference::KEY, "popularity").unwrap();
        assert_eq!(SortPreference::new(store).load().unwrap(), None);
    }
}
