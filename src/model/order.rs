use nft_core::core::bits::{NftId, OrderId};
use serde::Deserialize;

/// Server's view of the cart: which items it holds, in order.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "nfts")]
    pub item_ids: Vec<NftId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub likes: Vec<NftId>,
}
