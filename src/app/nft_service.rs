use std::{sync::Arc, time::Duration};

use super::config::{ApiSettings, ConfigBuildError};
use derive_builder::Builder;
use eyre::{eyre, Result};

use crate::{
    net::{http_client::HttpClient, reqwest_client::ReqwestHttpClient},
    service::{item_cache::ItemDetailCache, nft_service::RemoteNftService},
};

#[derive(Builder)]
#[builder(
    pattern = "owned",
    build_fn(name = "try_build", error = "ConfigBuildError")
)]
pub struct NftServiceConfig {
    pub api: ApiSettings,

    /// Transport to use instead of one built from `api`
    #[builder(setter(strip_option), default)]
    pub with_client: Option<Arc<dyn HttpClient>>,

    #[builder(setter(strip_option), default)]
    pub with_cache: Option<Arc<ItemDetailCache>>,
}

impl NftServiceConfig {
    #[must_use]
    pub fn builder() -> NftServiceConfigBuilder {
        NftServiceConfigBuilder::default()
    }

    pub fn make(self) -> Result<Arc<RemoteNftService>> {
        let routes = self.api.routes()?;

        let client: Arc<dyn HttpClient> = match self.with_client {
            Some(client) => client,
            None => {
                let timeout = self.api.request_timeout_secs.map(Duration::from_secs);
                let client = ReqwestHttpClient::new(self.api.token.clone(), timeout)
                    .map_err(|err| eyre!("Failed to create HTTP client: {}", err))?;
                Arc::new(client)
            }
        };

        let cache = self
            .with_cache
            .unwrap_or_else(|| Arc::new(ItemDetailCache::new()));

        tracing::info!(base_url = %routes.base_url, order_id = %routes.order_id, "NFT service ready");
        Ok(Arc::new(RemoteNftService::new(client, routes, cache)))
    }
}

impl NftServiceConfigBuilder {
    pub fn build(self) -> Result<NftServiceConfig, ConfigBuildError> {
        self.try_build()
    }
}
