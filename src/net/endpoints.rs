//! Typed descriptors for every REST resource the app talks to.
//!
//! An [`Endpoint`] only knows how to turn itself into a [`RequestDescriptor`]
//! relative to the API base URL; [`TypedEndpoint`] additionally names the JSON
//! shape of a successful response.

use itertools::Itertools;
use nft_core::core::bits::{CollectionId, NftId, OrderId, ProfileId};
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::model::{
    currency::Currency,
    nft::{Collection, NftDto},
    order::{Order, Profile},
};

use super::http_client::{NetworkError, RequestDescriptor};

pub trait Endpoint {
    fn descriptor(&self, base_url: &Url) -> Result<RequestDescriptor, NetworkError>;
}

pub trait TypedEndpoint: Endpoint {
    type Response: DeserializeOwned + Send;
}

fn resolve(base_url: &Url, path: &str) -> Result<Url, NetworkError> {
    base_url
        .join(path)
        .map_err(|err| NetworkError::InvalidRequest(format!("{}: {}", path, err)))
}

pub struct GetCollections;

impl Endpoint for GetCollections {
    fn descriptor(&self, base_url: &Url) -> Result<RequestDescriptor, NetworkError> {
        Ok(RequestDescriptor::get(resolve(base_url, "/api/v1/collections")?))
    }
}

impl TypedEndpoint for GetCollections {
    type Response = Vec<Collection>;
}

pub struct GetCollection<'a> {
    pub collection_id: &'a CollectionId,
}

impl Endpoint for GetCollection<'_> {
    fn descriptor(&self, base_url: &Url) -> Result<RequestDescriptor, NetworkError> {
        let path = format!("/api/v1/collections/{}", self.collection_id);
        Ok(RequestDescriptor::get(resolve(base_url, &path)?))
    }
}

impl TypedEndpoint for GetCollection<'_> {
    type Response = Collection;
}

pub struct GetOrder<'a> {
    pub order_id: &'a OrderId,
}

impl Endpoint for GetOrder<'_> {
    fn descriptor(&self, base_url: &Url) -> Result<RequestDescriptor, NetworkError> {
        let path = format!("/api/v1/orders/{}", self.order_id);
        Ok(RequestDescriptor::get(resolve(base_url, &path)?))
    }
}

impl TypedEndpoint for GetOrder<'_> {
    type Response = Order;
}

/// Replaces the whole item list of an order. An empty list pays the order.
pub struct PutOrder<'a> {
    pub order_id: &'a OrderId,
    pub item_ids: &'a [NftId],
}

impl Endpoint for PutOrder<'_> {
    fn descriptor(&self, base_url: &Url) -> Result<RequestDescriptor, NetworkError> {
        let path = format!("/api/v1/orders/{}", self.order_id);
        let form = self
            .item_ids
            .iter()
            .map(|id| ("nfts".to_owned(), id.to_string()))
            .collect();
        Ok(RequestDescriptor::put(resolve(base_url, &path)?).with_form(form))
    }
}

pub struct GetNft<'a> {
    pub nft_id: &'a NftId,
}

impl Endpoint for GetNft<'_> {
    fn descriptor(&self, base_url: &Url) -> Result<RequestDescriptor, NetworkError> {
        let path = format!("/api/v1/nft/{}", self.nft_id);
        Ok(RequestDescriptor::get(resolve(base_url, &path)?))
    }
}

impl TypedEndpoint for GetNft<'_> {
    type Response = NftDto;
}

pub struct GetProfile<'a> {
    pub profile_id: &'a ProfileId,
}

impl Endpoint for GetProfile<'_> {
    fn descriptor(&self, base_url: &Url) -> Result<RequestDescriptor, NetworkError> {
        let path = format!("/api/v1/profile/{}", self.profile_id);
        Ok(RequestDescriptor::get(resolve(base_url, &path)?))
    }
}

impl TypedEndpoint for GetProfile<'_> {
    type Response = Profile;
}

/// Replaces the liked set with `likes=<id>,<id>,...`
pub struct PutProfileLikes<'a> {
    pub profile_id: &'a ProfileId,
    pub likes: &'a [NftId],
}

impl Endpoint for PutProfileLikes<'_> {
    fn descriptor(&self, base_url: &Url) -> Result<RequestDescriptor, NetworkError> {
        let path = format!("/api/v1/profile/{}", self.profile_id);
        let likes = self.likes.iter().join(",");
        Ok(RequestDescriptor::put(resolve(base_url, &path)?)
            .with_form(vec![("likes".to_owned(), likes)]))
    }
}

impl TypedEndpoint for PutProfileLikes<'_> {
    type Response = Profile;
}

pub struct GetCurrencies;

impl Endpoint for GetCurrencies {
    fn descriptor(&self, base_url: &Url) -> Result<RequestDescriptor, NetworkError> {
        Ok(RequestDescriptor::get(resolve(base_url, "/api/v1/currencies")?))
    }
}

impl TypedEndpoint for GetCurrencies {
    type Response = Vec<Currency>;
}
