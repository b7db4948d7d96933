use crate::string_id;

pub type Amount = rust_decimal::Decimal; // price or total, denominated in ETH

string_id!(NftId);
string_id!(OrderId);
string_id!(ProfileId);
string_id!(CollectionId);
string_id!(CurrencyId);

/// Highest rating an item can carry.
pub const MAX_RATING: u8 = 5;

/// Number of fractional digits shown for ETH prices.
pub const PRICE_DISPLAY_SCALE: u32 = 2;

/// Render price as shown in cart rows and footer, e.g. `2.50 ETH`.
pub fn format_eth(amount: Amount) -> String {
    let mut rounded = amount.round_dp(PRICE_DISPLAY_SCALE);
    rounded.rescale(PRICE_DISPLAY_SCALE);
    format!("{} ETH", rounded)
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn test_format_eth() {
        assert_eq!(format_eth(dec!(2.5)), "2.50 ETH");
        assert_eq!(format_eth(dec!(0)), "0.00 ETH");
        assert_eq!(format_eth(dec!(1.239)), "1.24 ETH");
    }
}
