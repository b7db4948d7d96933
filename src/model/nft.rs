use nft_core::core::bits::{Amount, CollectionId, NftId, MAX_RATING};
use serde::Deserialize;

use crate::net::http_client::NetworkError;

/// Full metadata of one NFT. Immutable once fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemDetail {
    pub id: NftId,
    pub name: String,
    /// Price in ETH
    pub price: Amount,
    /// Between 0 and [`MAX_RATING`]
    pub rating: u8,
    pub images: Vec<String>,
}

impl ItemDetail {
    /// First image, used as the cart row picture and in delete confirmation.
    pub fn image_url(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

#[derive(Deserialize, Debug)]
pub struct NftDto {
    pub id: NftId,
    pub name: String,
    pub price: Amount,
    pub rating: i64,
    #[serde(default)]
    pub images: Vec<String>,
}

impl TryFrom<NftDto> for ItemDetail {
    type Error = NetworkError;

    fn try_from(value: NftDto) -> Result<Self, Self::Error> {
        let rating = u8::try_from(value.rating)
            .ok()
            .filter(|rating| *rating <= MAX_RATING)
            .ok_or_else(|| {
                NetworkError::Decode(format!(
                    "Rating {} of {} out of range",
                    value.rating, value.id
                ))
            })?;

        if value.price.is_sign_negative() {
            return Err(NetworkError::Decode(format!(
                "Negative price {} of {}",
                value.price, value.id
            )));
        }

        Ok(Self {
            id: value.id,
            name: value.name,
            price: value.price,
            rating,
            images: value.images,
        })
    }
}

/// NFT collection shown in the catalog.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub cover: String,
    pub nfts: Vec<NftId>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use test_case::test_case;

    use crate::net::http_client::decode_json;

    use super::*;

    fn decode(json: &str) -> Result<ItemDetail, NetworkError> {
        decode_json::<NftDto>(json.as_bytes()).and_then(ItemDetail::try_from)
    }

    #[test]
    fn test_decode_item_detail() {
        let detail = decode(
            r#"{"id":"a","name":"Archie","price":2.5,"rating":3,
                "images":["https://img.test/1.png","https://img.test/2.png"],
                "author":"ignored"}"#,
        )
        .unwrap();

        assert_eq!(detail.id, NftId::from("a"));
        assert_eq!(detail.price, dec!(2.5));
        assert_eq!(detail.rating, 3);
        assert_eq!(detail.image_url(), Some("https://img.test/1.png"));
        assert_eq!(detail.images.len(), 2);
    }

    #[test_case(r#"{"id":"a","name":"x","price":1,"rating":6}"#; "rating above five")]
    #[test_case(r#"{"id":"a","name":"x","price":1,"rating":-1}"#; "negative rating")]
    #[test_case(r#"{"id":"a","name":"x","price":-1,"rating":1}"#; "negative price")]
    #[test_case(r#"{"id":"a","name":"x","rating":1}"#; "missing price")]
    #[test_case(r#"[]"#; "wrong shape")]
    fn test_decode_rejects(json: &str) {
        assert!(matches!(decode(json), Err(NetworkError::Decode(_))));
    }

    #[test]
    fn test_item_without_images() {
        let detail = decode(r#"{"id":"a","name":"x","price":"0.1","rating":0}"#).unwrap();
        assert_eq!(detail.image_url(), None);
        assert_eq!(detail.price, dec!(0.1));
    }
}
