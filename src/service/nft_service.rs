use std::sync::Arc;

use async_trait::async_trait;
use nft_core::core::bits::{CollectionId, NftId, OrderId, ProfileId};
use reqwest::Url;

use crate::{
    model::{
        currency::Currency,
        nft::{Collection, ItemDetail},
        order::{Order, Profile},
    },
    net::{
        endpoints::{
            Endpoint, GetCollection, GetCollections, GetCurrencies, GetNft, GetOrder, GetProfile,
            PutOrder, PutProfileLikes, TypedEndpoint,
        },
        http_client::{HttpClient, HttpClientExt, NetworkError},
    },
};

use super::item_cache::ItemDetailCache;

/// Remote operations of the marketplace, one per REST resource.
#[async_trait]
pub trait NftService: Send + Sync {
    async fn load_order(&self) -> Result<Order, NetworkError>;

    /// Always goes to the network, so that cart prices are fresh.
    async fn load_cart_item(&self, id: &NftId) -> Result<ItemDetail, NetworkError>;

    /// Consults the item cache first, browsing path.
    async fn load_nft(&self, id: &NftId) -> Result<Arc<ItemDetail>, NetworkError>;

    async fn change_order(&self, item_ids: &[NftId]) -> Result<(), NetworkError>;

    async fn load_currencies(&self) -> Result<Vec<Currency>, NetworkError>;

    async fn load_collections(&self) -> Result<Vec<Collection>, NetworkError>;

    async fn load_collection(&self, id: &CollectionId) -> Result<Collection, NetworkError>;

    async fn load_profile(&self) -> Result<Profile, NetworkError>;

    async fn update_likes(&self, likes: &[NftId]) -> Result<Profile, NetworkError>;
}

/// Where the resources of one user live.
#[derive(Clone, Debug)]
pub struct ApiRoutes {
    pub base_url: Url,
    pub order_id: OrderId,
    pub profile_id: ProfileId,
}

pub struct RemoteNftService {
    client: Arc<dyn HttpClient>,
    routes: ApiRoutes,
    cache: Arc<ItemDetailCache>,
}

impl RemoteNftService {
    pub fn new(client: Arc<dyn HttpClient>, routes: ApiRoutes, cache: Arc<ItemDetailCache>) -> Self {
        Self {
            client,
            routes,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ItemDetailCache> {
        &self.cache
    }

    async fn fetch<E: TypedEndpoint + Sync>(&self, endpoint: &E) -> Result<E::Response, NetworkError> {
        let descriptor = endpoint.descriptor(&self.routes.base_url)?;
        self.client.send_typed(descriptor).await
    }

    async fn fetch_detail(&self, id: &NftId) -> Result<ItemDetail, NetworkError> {
        let dto = self.fetch(&GetNft { nft_id: id }).await?;
        let detail = ItemDetail::try_from(dto)?;

        if &detail.id != id {
            return Err(NetworkError::Decode(format!(
                "Requested {} but received {}",
                id, detail.id
            )));
        }

        Ok(detail)
    }
}

#[async_trait]
impl NftService for RemoteNftService {
    async fn load_order(&self) -> Result<Order, NetworkError> {
        let order = self
            .fetch(&GetOrder {
                order_id: &self.routes.order_id,
            })
            .await?;

        tracing::debug!("Loaded order {} with {} items", order.id, order.item_ids.len());
        Ok(order)
    }

    async fn load_cart_item(&self, id: &NftId) -> Result<ItemDetail, NetworkError> {
        self.fetch_detail(id).await
    }

    async fn load_nft(&self, id: &NftId) -> Result<Arc<ItemDetail>, NetworkError> {
        if let Some(detail) = self.cache.get(id) {
            return Ok(detail);
        }

        let detail = self.fetch_detail(id).await?;
        Ok(self.cache.insert(detail))
    }

    async fn change_order(&self, item_ids: &[NftId]) -> Result<(), NetworkError> {
        let descriptor = PutOrder {
            order_id: &self.routes.order_id,
            item_ids,
        }
        .descriptor(&self.routes.base_url)?;

        // Response body is not needed, the caller already knows the new list
        self.client.send(descriptor).await?;
        Ok(())
    }

    async fn load_currencies(&self) -> Result<Vec<Currency>, NetworkError> {
        self.fetch(&GetCurrencies).await
    }

    async fn load_collections(&self) -> Result<Vec<Collection>, NetworkError> {
        self.fetch(&GetCollections).await
    }

    async fn load_collection(&self, id: &CollectionId) -> Result<Collection, NetworkError> {
        self.fetch(&GetCollection { collection_id: id }).await
    }

    async fn load_profile(&self) -> Result<Profile, NetworkError> {
        self.fetch(&GetProfile {
            profile_id: &self.routes.profile_id,
        })
        .await
    }

    async fn update_likes(&self, likes: &[NftId]) -> Result<Profile, NetworkError> {
        self.fetch(&PutProfileLikes {
            profile_id: &self.routes.profile_id,
            likes,
        })
        .await
    }
}

pub mod test_util {
    use std::sync::Arc;

    use nft_core::core::bits::{Amount, NftId};
    use reqwest::Url;
    use serde_json::json;

    use crate::net::http_client::test_util::{MockHttpClient, MockResponse};

    use super::{ApiRoutes, ItemDetailCache, RemoteNftService};

    pub const MOCK_BASE_URL: &str = "https://api.test";
    pub const MOCK_ORDER_PATH: &str = "/api/v1/orders/1";
    pub const MOCK_PROFILE_PATH: &str = "/api/v1/profile/1";
    pub const MOCK_CURRENCIES_PATH: &str = "/api/v1/currencies";

    pub fn get_mock_routes() -> ApiRoutes {
        ApiRoutes {
            // Constant is a valid URL
            base_url: Url::parse(MOCK_BASE_URL).unwrap_or_else(|_| unreachable!()),
            order_id: "1".into(),
            profile_id: "1".into(),
        }
    }

    pub fn get_mock_nft_service(client: Arc<MockHttpClient>) -> Arc<RemoteNftService> {
        Arc::new(RemoteNftService::new(
            client,
            get_mock_routes(),
            Arc::new(ItemDetailCache::new()),
        ))
    }

    pub fn mock_nft_path(id: &str) -> String {
        format!("/api/v1/nft/{}", id)
    }

    pub fn mock_order(client: &MockHttpClient, item_ids: &[&str]) {
        client.route_get(
            MOCK_ORDER_PATH,
            MockResponse::json(&json!({ "id": "1", "nfts": item_ids })),
        );
    }

    pub fn mock_nft(client: &MockHttpClient, id: &str, name: &str, price: Amount, rating: u8) {
        client.route_get(
            &mock_nft_path(id),
            MockResponse::json(&json!({
                "id": id,
                "name": name,
                "price": price.to_string(),
                "rating": rating,
                "images": [format!("https://img.test/{}.png", id)],
            })),
        );
    }

    pub fn mock_nft_failure(client: &MockHttpClient, id: &str, status: u16) {
        client.route_get(&mock_nft_path(id), MockResponse::status(status));
    }

    pub fn mock_order_accepts_changes(client: &MockHttpClient) {
        client.route_put(MOCK_ORDER_PATH, MockResponse::raw(200, r#"{"id":"1","nfts":[]}"#));
    }

    pub fn put_order_bodies(client: &MockHttpClient) -> Vec<Vec<NftId>> {
        client
            .requests_to(crate::net::http_client::HttpMethod::Put, MOCK_ORDER_PATH)
            .into_iter()
            .map(|request| {
                request
                    .body
                    .map(|body| {
                        body.form_pairs()
                            .iter()
                            .map(|(_, value)| NftId::from(value.as_str()))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect()
    }
}
