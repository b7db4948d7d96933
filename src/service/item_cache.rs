use std::{collections::HashMap, sync::Arc};

use nft_core::core::bits::NftId;
use parking_lot::RwLock;

use crate::model::nft::ItemDetail;

/// Identity cache of fetched NFT metadata.
///
/// Written through on every successful fetch on the browsing path and never
/// evicted; it lives as long as the process.
#[derive(Default)]
pub struct ItemDetailCache {
    items: RwLock<HashMap<NftId, Arc<ItemDetail>>>,
}

impl ItemDetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &NftId) -> Option<Arc<ItemDetail>> {
        self.items.read().get(id).cloned()
    }

    /// Store the detail under its own id, returning the shared copy.
    pub fn insert(&self, detail: ItemDetail) -> Arc<ItemDetail> {
        let detail = Arc::new(detail);
        self.items
            .write()
            .insert(detail.id.clone(), detail.clone());
        detail
    }

    pub fn contains(&self, id: &NftId) -> bool {
        self.items.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    fn detail(id: &str) -> ItemDetail {
        ItemDetail {
            id: id.into(),
            name: id.to_uppercase(),
            price: dec!(1.0),
            rating: 2,
            images: vec![],
        }
    }

    #[test]
    fn test_insert_then_get_returns_same_arc() {
        let cache = ItemDetailCache::new();
        assert!(cache.is_empty());
        assert!(cache.get(&"a".into()).is_none());

        let stored = cache.insert(detail("a"));
        let fetched = cache.get(&"a".into()).unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));
        assert!(cache.contains(&"a".into()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_replaces_existing_entry() {
        let cache = ItemDetailCache::new();
        cache.insert(detail("a"));
        let mut newer = detail("a");
        newer.rating = 5;
        cache.insert(newer);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a".into()).unwrap().rating, 5);
    }
}
