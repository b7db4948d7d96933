use std::{fmt, str::FromStr, sync::Arc};

use eyre::Result;
use futures_util::future::join_all;
use nft_core::core::{bits::CollectionId, persistence::KeyValueStore};

use crate::{
    model::{
        collation::NameCollator,
        nft::{Collection, ItemDetail},
    },
    net::http_client::NetworkError,
};

use super::nft_service::NftService;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionSortCriterion {
    /// Alphabetical by collection name
    Name,
    /// Largest collections first
    NftCount,
}

impl CollectionSortCriterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionSortCriterion::Name => "name",
            CollectionSortCriterion::NftCount => "count",
        }
    }
}

impl fmt::Display for CollectionSortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionSortCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(CollectionSortCriterion::Name),
            "count" => Ok(CollectionSortCriterion::NftCount),
            other => Err(format!("Unknown collection sort criterion: {}", other)),
        }
    }
}

/// Stable sort of the catalog list.
pub fn sort_collections(collections: &mut [Collection], criterion: CollectionSortCriterion) {
    match criterion {
        CollectionSortCriterion::Name => {
            let collator = NameCollator::new();
            collections.sort_by(|a, b| collator.compare(&a.name, &b.name));
        }
        CollectionSortCriterion::NftCount => {
            collections.sort_by(|a, b| b.nfts.len().cmp(&a.nfts.len()));
        }
    }
}

/// Last catalog ordering the user picked, applied whenever the list loads.
#[derive(Clone)]
pub struct CollectionSortPreference {
    store: Arc<dyn KeyValueStore>,
}

impl CollectionSortPreference {
    pub const KEY: &'static str = "catalog_sort_criterion";

    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Result<Option<CollectionSortCriterion>> {
        let Some(value) = self.store.get_string(Self::KEY)? else {
            return Ok(None);
        };

        match value.parse() {
            Ok(criterion) => Ok(Some(criterion)),
            Err(err) => {
                tracing::warn!("Ignoring stored catalog sort: {}", err);
                Ok(None)
            }
        }
    }

    pub fn save(&self, criterion: CollectionSortCriterion) -> Result<()> {
        self.store.set_string(Self::KEY, criterion.as_str())
    }
}

/// Catalog browsing over the cached NFT path.
pub struct CollectionBrowser {
    service: Arc<dyn NftService>,
    preference: CollectionSortPreference,
}

impl CollectionBrowser {
    pub fn new(service: Arc<dyn NftService>, preference: CollectionSortPreference) -> Self {
        Self {
            service,
            preference,
        }
    }

    pub fn saved_sort(&self) -> Option<CollectionSortCriterion> {
        self.preference.load().unwrap_or_else(|err| {
            tracing::warn!("Failed to read catalog sort: {:?}", err);
            None
        })
    }

    /// Catalog list in the order last chosen, or as served when none was.
    pub async fn collections(&self) -> Result<Vec<Collection>, NetworkError> {
        let mut collections = self.service.load_collections().await?;
        if let Some(criterion) = self.saved_sort() {
            sort_collections(&mut collections, criterion);
        }
        Ok(collections)
    }

    /// Remember `criterion` and return the catalog list ordered by it.
    pub async fn collections_sorted_by(
        &self,
        criterion: CollectionSortCriterion,
    ) -> Result<Vec<Collection>, NetworkError> {
        if let Err(err) = self.preference.save(criterion) {
            tracing::warn!("Failed to store catalog sort: {:?}", err);
        }
        let mut collections = self.service.load_collections().await?;
        sort_collections(&mut collections, criterion);
        Ok(collections)
    }

    pub async fn collection(&self, id: &CollectionId) -> Result<Collection, NetworkError> {
        self.service.load_collection(id).await
    }

    /// Load every NFT of the collection concurrently.
    ///
    /// Items that fail to load are skipped; the rest keep the collection's order.
    pub async fn collection_items(
        &self,
        collection: &Collection,
    ) -> Vec<Arc<ItemDetail>> {
        let results = join_all(collection.nfts.iter().map(|id| self.service.load_nft(id))).await;

        results
            .into_iter()
            .zip(collection.nfts.iter())
            .filter_map(|(result, id)| match result {
                Ok(detail) => Some(detail),
                Err(err) => {
                    tracing::warn!("Skipping {} of collection {}: {}", id, collection.id, err);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use nft_core::core::{bits::NftId, persistence::util::InMemoryKeyValueStore};
    use rust_decimal::dec;
    use test_case::test_case;

    use crate::net::http_client::{
        test_util::{MockHttpClient, MockResponse},
        HttpMethod,
    };
    use crate::service::nft_service::test_util::*;

    use super::*;

    fn make_browser(client: &Arc<MockHttpClient>) -> CollectionBrowser {
        CollectionBrowser::new(
            get_mock_nft_service(client.clone()),
            CollectionSortPreference::new(Arc::new(InMemoryKeyValueStore::new())),
        )
    }

    fn collection(id: &str, name: &str, size: usize) -> Collection {
        Collection {
            id: id.into(),
            name: name.into(),
            cover: String::new(),
            nfts: (0..size).map(|n| NftId::from(format!("{}-{}", id, n))).collect(),
            description: String::new(),
            author: String::new(),
        }
    }

    fn catalog() -> Vec<Collection> {
        vec![
            collection("1", "peach", 2),
            collection("2", "Brown", 5),
            collection("3", "Éclair", 2),
            collection("4", "apple", 0),
        ]
    }

    fn mock_catalog(client: &MockHttpClient) {
        client.route_get(
            "/api/v1/collections",
            MockResponse::json(&serde_json::json!([
                {"id":"1","name":"peach","cover":"x","nfts":["a","b"]},
                {"id":"2","name":"Brown","cover":"y","nfts":["a","b","c","d","e"]},
                {"id":"3","name":"Éclair","cover":"z","nfts":["c","d"]},
            ])),
        );
    }

    fn ids(collections: &[Collection]) -> Vec<&str> {
        collections.iter().map(|c| c.id.as_str()).collect()
    }

    #[test_case(CollectionSortCriterion::Name, vec!["4", "2", "3", "1"]; "name ignoring case and accents")]
    #[test_case(CollectionSortCriterion::NftCount, vec!["2", "1", "3", "4"]; "count descending keeps ties")]
    fn test_sort_collections(criterion: CollectionSortCriterion, expected: Vec<&str>) {
        let mut collections = catalog();
        sort_collections(&mut collections, criterion);
        assert_eq!(ids(&collections), expected);
    }

    #[test_case("name", Ok(CollectionSortCriterion::Name))]
    #[test_case("count", Ok(CollectionSortCriterion::NftCount))]
    #[test_case("size", Err(()); "unknown")]
    fn test_parse_collection_criterion(input: &str, expected: Result<CollectionSortCriterion, ()>) {
        assert_eq!(input.parse::<CollectionSortCriterion>().map_err(|_| ()), expected);
    }

    #[test]
    fn test_collection_preference_ignores_garbage() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let preference = CollectionSortPreference::new(store.clone());
        assert_eq!(preference.load().unwrap(), None);

        preference.save(CollectionSortCriterion::NftCount).unwrap();
        assert_eq!(preference.load().unwrap(), Some(CollectionSortCriterion::NftCount));

        store.set_string(CollectionSortPreference::KEY, "popularity").unwrap();
        assert_eq!(preference.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_saved_catalog_order_applied_on_load() {
        let client = Arc::new(MockHttpClient::new());
        mock_catalog(&client);
        let browser = make_browser(&client);

        assert_eq!(ids(&browser.collections().await.unwrap()), vec!["1", "2", "3"]);

        let sorted = browser
            .collections_sorted_by(CollectionSortCriterion::Name)
            .await
            .unwrap();
        assert_eq!(ids(&sorted), vec!["2", "3", "1"]);
        assert_eq!(browser.saved_sort(), Some(CollectionSortCriterion::Name));

        assert_eq!(ids(&browser.collections().await.unwrap()), vec!["2", "3", "1"]);

        browser
            .collections_sorted_by(CollectionSortCriterion::NftCount)
            .await
            .unwrap();
        assert_eq!(ids(&browser.collections().await.unwrap()), vec!["2", "1", "3"]);
    }

    fn mock_collection(client: &MockHttpClient) {
        client.route_get(
            "/api/v1/collections/col-1",
            MockResponse::raw(
                200,
                r#"{"id":"col-1","name":"Peach","cover":"https://img.test/peach.png",
                    "nfts":["a","b","c"],"description":"d","author":"someone"}"#,
            ),
        );
    }

    #[tokio::test]
    async fn test_collection_items_skip_failures_and_keep_order() {
        let client = Arc::new(MockHttpClient::new());
        mock_collection(&client);
        mock_nft(&client, "a", "Archie", dec!(1), 1);
        mock_nft_failure(&client, "b", 500);
        mock_nft(&client, "c", "Cosmo", dec!(3), 3);
        let browser = make_browser(&client);

        let collection = browser.collection(&"col-1".into()).await.unwrap();
        assert_eq!(collection.nfts.len(), 3);

        let items = browser.collection_items(&collection).await;
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Archie", "Cosmo"]);
    }

    #[tokio::test]
    async fn test_second_browse_is_served_from_cache() {
        let client = Arc::new(MockHttpClient::new());
        mock_collection(&client);
        mock_nft(&client, "a", "Archie", dec!(1), 1);
        mock_nft(&client, "b", "Bella", dec!(2), 2);
        mock_nft(&client, "c", "Cosmo", dec!(3), 3);
        let browser = make_browser(&client);

        let collection = browser.collection(&"col-1".into()).await.unwrap();
        browser.collection_items(&collection).await;
        let items = browser.collection_items(&collection).await;

        assert_eq!(items.len(), 3);
        assert_eq!(client.requests_to(HttpMethod::Get, &mock_nft_path("a")).len(), 1);
    }

    #[tokio::test]
    async fn test_collections_list() {
        let client = Arc::new(MockHttpClient::new());
        client.route_get(
            "/api/v1/collections",
            MockResponse::raw(
                200,
                r#"[{"id":"col-1","name":"Peach","cover":"x","nfts":[]},
                    {"id":"col-2","name":"Blue","cover":"y","nfts":["a"]}]"#,
            ),
        );
        let browser = make_browser(&client);

        let collections = browser.collections().await.unwrap();
        assert_eq!(collections.len(), 2);
        assert_eq!(collections[1].nfts, vec![NftId::from("a")]);
    }
}
