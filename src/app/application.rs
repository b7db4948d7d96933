use std::sync::Arc;

use eyre::{eyre, Result};
use nft_core::core::{
    bits::NftId,
    persistence::{
        util::{InMemoryKeyValueStore, JsonFileKeyValueStore},
        KeyValueStore,
    },
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    cart::{
        cart_events::CartEvent,
        cart_state_machine::{CartHandle, CartStateMachine},
        checkout::CheckoutSession,
        delete_confirmation::DeleteConfirmation,
        slot::CartAggregate,
        sort::SortCriterion,
    },
    net::http_client::HttpClient,
    service::{
        collections::{CollectionBrowser, CollectionSortPreference},
        nft_service::NftService,
        nft_state::NftStateService,
    },
};

use super::{cart::CartConfig, config::ApplicationConfig, nft_service::NftServiceConfig};

/// All components wired together from configuration.
pub struct Application {
    service: Arc<dyn NftService>,
    preferences: Arc<dyn KeyValueStore>,
    cart: CartStateMachine,
    cart_events: UnboundedReceiver<CartEvent>,
}

impl Application {
    pub fn new(config: &ApplicationConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Same as [`Application::new`] but talking through the given transport.
    pub fn new_with_client(config: &ApplicationConfig, client: Arc<dyn HttpClient>) -> Result<Self> {
        Self::build(config, Some(client))
    }

    fn build(config: &ApplicationConfig, client: Option<Arc<dyn HttpClient>>) -> Result<Self> {
        let mut service_config = NftServiceConfig::builder().api(config.api.clone());
        if let Some(client) = client {
            service_config = service_config.with_client(client);
        }
        let service: Arc<dyn NftService> = service_config.build()?.make()?;

        let preferences: Arc<dyn KeyValueStore> = match &config.storage.preferences_path {
            Some(path) => {
                let store = JsonFileKeyValueStore::new(path.clone());
                tracing::info!("Preferences kept in {}", store.path().display());
                Arc::new(store)
            }
            None => Arc::new(InMemoryKeyValueStore::new()),
        };

        let (cart, cart_events) = CartConfig::builder()
            .with_service(service.clone())
            .with_preferences(preferences.clone())
            .build()?
            .make()?;

        Ok(Self {
            service,
            preferences,
            cart,
            cart_events,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        self.cart.start()
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.cart.stop().await
    }

    pub fn cart(&self) -> CartHandle {
        self.cart.handle()
    }

    pub fn checkout(&self) -> CheckoutSession {
        CheckoutSession::new(self.service.clone(), self.cart())
    }

    pub fn nft_state(&self) -> NftStateService {
        NftStateService::new(self.service.clone())
    }

    pub fn browser(&self) -> CollectionBrowser {
        CollectionBrowser::new(
            self.service.clone(),
            CollectionSortPreference::new(self.preferences.clone()),
        )
    }

    async fn next_event(&mut self) -> Result<CartEvent> {
        self.cart_events
            .recv()
            .await
            .ok_or_else(|| eyre!("Cart event stream closed"))
    }

    /// Load the cart and wait until every item settled, then sort it by the
    /// given criterion or, failing that, by the one chosen last time.
    pub async fn settled_cart(&mut self, sort: Option<SortCriterion>) -> Result<Arc<CartAggregate>> {
        let cart = self.cart();
        let sort = sort.or_else(|| cart.saved_sort());
        cart.load_cart()?;

        let mut aggregate = loop {
            match self.next_event().await? {
                CartEvent::FooterUpdated(aggregate) => break aggregate,
                CartEvent::Error(err) => return Err(err.into()),
                event => tracing::trace!("Cart event {:?}", event),
            }
        };

        if let Some(criterion) = sort {
            cart.sort_by(criterion)?;
            aggregate = loop {
                if let CartEvent::Sorted(aggregate) = self.next_event().await? {
                    break aggregate;
                }
            };
        }

        Ok(aggregate)
    }

    /// Walk the delete confirmation for `id`, answering yes.
    pub async fn remove_item(&mut self, id: NftId) -> Result<Arc<CartAggregate>> {
        self.settled_cart(None).await?;

        let mut confirmation = DeleteConfirmation::new(self.cart());
        confirmation.request(id)?;

        loop {
            let event = self.next_event().await?;
            if confirmation.handle_event(&event) {
                break;
            }
            if let CartEvent::Error(err) = event {
                return Err(err.into());
            }
        }

        if let Some(pending) = confirmation.pending() {
            tracing::info!("Confirming removal of {}", pending.id);
        }
        confirmation.confirm()?;

        loop {
            match self.next_event().await? {
                CartEvent::FullReload(aggregate) => return Ok(aggregate),
                CartEvent::Error(err) => return Err(err.into()),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use crate::{
        app::config::ApiSettings,
        cart::{slot::CartSlot, sort::SortPreference},
        net::http_client::test_util::{MockHttpClient, MockResponse},
        service::{collections::CollectionSortCriterion, nft_service::test_util::*},
    };

    use super::*;

    fn test_config() -> ApplicationConfig {
        ApplicationConfig {
            api: ApiSettings {
                base_url: MOCK_BASE_URL.into(),
                token: "t".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn start_app(client: &Arc<MockHttpClient>) -> Application {
        start_app_with(client, test_config())
    }

    fn start_app_with(client: &Arc<MockHttpClient>, config: ApplicationConfig) -> Application {
        let mut app = Application::new_with_client(&config, client.clone()).unwrap();
        app.start().unwrap();
        app
    }

    fn names(aggregate: &CartAggregate) -> Vec<String> {
        aggregate
            .slots()
            .iter()
            .filter_map(CartSlot::detail)
            .map(|d| d.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_settled_cart_sorted_by_name() {
        let client = Arc::new(MockHttpClient::new());
        mock_order(&client, &["a", "b"]);
        mock_nft(&client, "a", "zeta", dec!(1), 1);
        mock_nft(&client, "b", "Alpha", dec!(2), 2);
        let mut app = start_app(&client);

        let aggregate = app.settled_cart(Some(SortCriterion::Name)).await.unwrap();
        assert_eq!(names(&aggregate), vec!["Alpha", "zeta"]);
        assert_eq!(app.cart().saved_sort(), Some(SortCriterion::Name));

        app.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_settled_cart_restores_saved_sort() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        JsonFileKeyValueStore::new(&path)
            .set_string(SortPreference::KEY, "price")
            .unwrap();

        let client = Arc::new(MockHttpClient::new());
        mock_order(&client, &["a", "b", "c"]);
        mock_nft(&client, "a", "Archie", dec!(1), 1);
        mock_nft(&client, "b", "Bella", dec!(3), 2);
        mock_nft(&client, "c", "Cosmo", dec!(2), 3);

        let mut config = test_config();
        config.storage.preferences_path = Some(path);
        let mut app = start_app_with(&client, config);

        let aggregate = app.settled_cart(None).await.unwrap();
        assert_eq!(names(&aggregate), vec!["Bella", "Cosmo", "Archie"]);

        app.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_browser_shares_preference_store() {
        let client = Arc::new(MockHttpClient::new());
        client.route_get(
            "/api/v1/collections",
            MockResponse::raw(
                200,
                r#"[{"id":"1","name":"Peach","cover":"x","nfts":["a"]},
                    {"id":"2","name":"Blue","cover":"y","nfts":["a","b"]}]"#,
            ),
        );
        let app = start_app(&client);

        app.browser()
            .collections_sorted_by(CollectionSortCriterion::Name)
            .await
            .unwrap();

        let collections = app.browser().collections().await.unwrap();
        let names: Vec<_> = collections.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Blue", "Peach"]);
    }

    #[tokio::test]
    async fn test_order_failure_surfaces_as_error() {
        let client = Arc::new(MockHttpClient::new());
        client.route_get(MOCK_ORDER_PATH, MockResponse::status(500));
        let mut app = start_app(&client);

        let err = app.settled_cart(None).await.unwrap_err();
        assert!(err.to_string().contains("Failed to load order"));
    }

    #[tokio::test]
    async fn test_remove_item_through_confirmation() {
        let client = Arc::new(MockHttpClient::new());
        mock_order(&client, &["a", "b"]);
        mock_nft(&client, "a", "Archie", dec!(1), 1);
        mock_nft(&client, "b", "Bella", dec!(2), 2);
        mock_order_accepts_changes(&client);
        let mut app = start_app(&client);

        let aggregate = app.remove_item("a".into()).await.unwrap();
        assert_eq!(aggregate.item_ids(), vec![NftId::from("b")]);

        let err = app.remove_item("zz".into()).await.unwrap_err();
        assert!(err.to_string().contains("not in the cart"));
    }
}
