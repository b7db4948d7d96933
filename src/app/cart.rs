use std::sync::Arc;

use super::config::ConfigBuildError;
use derive_builder::Builder;
use eyre::Result;
use nft_core::core::{
    functional::IntoObservableSingleArc,
    persistence::{util::InMemoryKeyValueStore, KeyValueStore},
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::{
    cart::{
        cart_events::CartEvent, cart_state_machine::CartStateMachine, sort::SortPreference,
    },
    service::nft_service::NftService,
};

#[derive(Builder)]
#[builder(
    pattern = "owned",
    build_fn(name = "try_build", error = "ConfigBuildError")
)]
pub struct CartConfig {
    pub with_service: Arc<dyn NftService>,

    /// Where the sort choice is remembered; in memory when not given
    #[builder(setter(strip_option), default)]
    pub with_preferences: Option<Arc<dyn KeyValueStore>>,
}

impl CartConfig {
    #[must_use]
    pub fn builder() -> CartConfigBuilder {
        CartConfigBuilder::default()
    }

    /// Create the cart with its event stream. The cart is not started.
    pub fn make(self) -> Result<(CartStateMachine, UnboundedReceiver<CartEvent>)> {
        let store: Arc<dyn KeyValueStore> = match self.with_preferences {
            Some(store) => store,
            None => Arc::new(InMemoryKeyValueStore::new()),
        };

        let cart = CartStateMachine::new(self.with_service, SortPreference::new(store));

        let (cart_tx, cart_rx) = unbounded_channel::<CartEvent>();

        cart.get_single_observer_arc()
            .write()
            .set_observer_from(cart_tx);

        Ok((cart, cart_rx))
    }
}

impl CartConfigBuilder {
    pub fn build(self) -> Result<CartConfig, ConfigBuildError> {
        self.try_build()
    }
}
