use std::sync::Arc;

use nft_core::core::bits::NftId;
use parking_lot::RwLock;

use crate::net::http_client::NetworkError;

use super::nft_service::NftService;

/// Per-NFT user state shown on catalog screens: liked and in-cart.
///
/// Both toggles are pessimistic, local state changes only after the server
/// accepted the new list.
pub struct NftStateService {
    service: Arc<dyn NftService>,
    likes: RwLock<Vec<NftId>>,
}

impl NftStateService {
    pub fn new(service: Arc<dyn NftService>) -> Self {
        Self {
            service,
            likes: RwLock::new(Vec::new()),
        }
    }

    /// Reload liked set from the profile.
    pub async fn refresh_likes(&self) -> Result<Vec<NftId>, NetworkError> {
        let profile = self.service.load_profile().await?;
        *self.likes.write() = profile.likes.clone();
        Ok(profile.likes)
    }

    pub fn is_liked(&self, id: &NftId) -> bool {
        self.likes.read().contains(id)
    }

    pub fn likes(&self) -> Vec<NftId> {
        self.likes.read().clone()
    }

    /// Flip the like of `id`, returning whether it is liked afterwards.
    pub async fn toggle_like(&self, id: &NftId) -> Result<bool, NetworkError> {
        let mut likes = self.likes();
        let liked = match likes.iter().position(|x| x == id) {
            Some(pos) => {
                likes.remove(pos);
                false
            }
            None => {
                likes.push(id.clone());
                true
            }
        };

        let profile = self.service.update_likes(&likes).await?;
        tracing::info!("{} {}", if liked { "Liked" } else { "Unliked" }, id);

        *self.likes.write() = profile.likes;
        Ok(liked)
    }

    /// Add or remove `id` from the order, re-reading it first so that the
    /// change is applied to the server's current list.
    pub async fn set_in_cart(&self, id: &NftId, in_cart: bool) -> Result<Vec<NftId>, NetworkError> {
        let order = self.service.load_order().await?;
        let mut item_ids = order.item_ids;

        let present = item_ids.contains(id);
        match (in_cart, present) {
            (true, false) => item_ids.push(id.clone()),
            (false, true) => item_ids.retain(|x| x != id),
            _ => {
                tracing::debug!("Order already has {} in_cart={}", id, in_cart);
                return Ok(item_ids);
            }
        }

        self.service.change_order(&item_ids).await?;
        tracing::info!("Order now has {} items", item_ids.len());
        Ok(item_ids)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        net::http_client::{
            test_util::{MockHttpClient, MockResponse},
            HttpMethod,
        },
        service::nft_service::test_util::*,
    };

    use super::*;

    fn likes_body(client: &MockHttpClient) -> Vec<String> {
        client
            .requests_to(HttpMethod::Put, MOCK_PROFILE_PATH)
            .into_iter()
            .filter_map(|r| r.body)
            .map(|b| b.form_pairs()[0].1.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let client = Arc::new(MockHttpClient::new());
        client.route_get(MOCK_PROFILE_PATH, MockResponse::json(&json!({ "likes": ["a"] })));
        client.route_put(
            MOCK_PROFILE_PATH,
            MockResponse::json(&json!({ "likes": ["a", "b"] })),
        );
        let state = NftStateService::new(get_mock_nft_service(client.clone()));

        assert_eq!(state.refresh_likes().await.unwrap(), vec![NftId::from("a")]);
        assert!(state.is_liked(&"a".into()));
        assert!(!state.is_liked(&"b".into()));

        assert!(state.toggle_like(&"b".into()).await.unwrap());
        assert!(state.is_liked(&"b".into()));
        assert_eq!(likes_body(&client), vec!["a,b".to_owned()]);
    }

    #[tokio::test]
    async fn test_unlike_sends_list_without_id() {
        let client = Arc::new(MockHttpClient::new());
        client.route_get(
            MOCK_PROFILE_PATH,
            MockResponse::json(&json!({ "likes": ["a", "b"] })),
        );
        client.route_put(MOCK_PROFILE_PATH, MockResponse::json(&json!({ "likes": ["b"] })));
        let state = NftStateService::new(get_mock_nft_service(client.clone()));
        state.refresh_likes().await.unwrap();

        assert!(!state.toggle_like(&"a".into()).await.unwrap());
        assert_eq!(likes_body(&client), vec!["b".to_owned()]);
        assert_eq!(state.likes(), vec![NftId::from("b")]);
    }

    #[tokio::test]
    async fn test_failed_like_keeps_local_state() {
        let client = Arc::new(MockHttpClient::new());
        client.route_get(MOCK_PROFILE_PATH, MockResponse::json(&json!({ "likes": [] })));
        client.route_put(MOCK_PROFILE_PATH, MockResponse::status(500));
        let state = NftStateService::new(get_mock_nft_service(client));
        state.refresh_likes().await.unwrap();

        assert_eq!(
            state.toggle_like(&"a".into()).await,
            Err(NetworkError::HttpStatus(500))
        );
        assert!(!state.is_liked(&"a".into()));
    }

    #[tokio::test]
    async fn test_set_in_cart_adds_and_removes() {
        let client = Arc::new(MockHttpClient::new());
        mock_order(&client, &["a", "b"]);
        mock_order_accepts_changes(&client);
        let state = NftStateService::new(get_mock_nft_service(client.clone()));

        let added = state.set_in_cart(&"c".into(), true).await.unwrap();
        assert_eq!(added, vec![NftId::from("a"), "b".into(), "c".into()]);

        let removed = state.set_in_cart(&"a".into(), false).await.unwrap();
        assert_eq!(removed, vec![NftId::from("b")]);

        assert_eq!(
            put_order_bodies(&client),
            vec![
                vec![NftId::from("a"), "b".into(), "c".into()],
                vec![NftId::from("b")]
            ]
        );
    }

    #[tokio::test]
    async fn test_set_in_cart_noop_skips_put() {
        let client = Arc::new(MockHttpClient::new());
        mock_order(&client, &["a"]);
        let state = NftStateService::new(get_mock_nft_service(client.clone()));

        state.set_in_cart(&"a".into(), true).await.unwrap();
        state.set_in_cart(&"z".into(), false).await.unwrap();
        assert!(put_order_bodies(&client).is_empty());
    }
}
