use nft_core::core::bits::CurrencyId;
use serde::Deserialize;

/// Currency the order can be paid with.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    /// Ticker, e.g. `BTC`
    #[serde(rename = "name")]
    pub short_name: String,
    /// Human readable name, e.g. `Bitcoin`
    #[serde(rename = "title")]
    pub display_name: String,
    #[serde(rename = "image")]
    pub icon_url: String,
}

#[cfg(test)]
mod tests {
    use crate::net::http_client::decode_json;

    use super::*;

    #[test]
    fn test_decode_currency() {
        let currencies: Vec<Currency> = decode_json(
            br#"[{"id":"1","title":"Bitcoin","name":"BTC","image":"https://img.test/btc.png"}]"#,
        )
        .unwrap();

        assert_eq!(
            currencies,
            vec![Currency {
                id: "1".into(),
                short_name: "BTC".into(),
                display_name: "Bitcoin".into(),
                icon_url: "https://img.test/btc.png".into(),
            }]
        );
    }
}
