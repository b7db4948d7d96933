use std::sync::Arc;

use nft_core::core::bits::{Amount, NftId};

use crate::{model::nft::ItemDetail, net::http_client::NetworkError};

/// Loading state of one cart line.
#[derive(Clone, Debug, PartialEq)]
pub enum CartSlot {
    Pending(NftId),
    Ready(Arc<ItemDetail>),
    Failed(NftId, NetworkError),
}

impl CartSlot {
    pub fn id(&self) -> &NftId {
        match self {
            CartSlot::Pending(id) => id,
            CartSlot::Ready(detail) => &detail.id,
            CartSlot::Failed(id, _) => id,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CartSlot::Pending(_))
    }

    pub fn detail(&self) -> Option<&ItemDetail> {
        match self {
            CartSlot::Ready(detail) => Some(detail),
            _ => None,
        }
    }

    /// Price used when ordering and totalling; zero unless ready.
    pub fn price(&self) -> Amount {
        self.detail().map(|d| d.price).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Footer {
    pub item_count: usize,
    pub total_price: Amount,
    pub can_pay: bool,
}

impl Footer {
    pub fn from_slots(slots: &[CartSlot]) -> Self {
        let item_count = slots.len();
        Self {
            item_count,
            total_price: slots.iter().map(CartSlot::price).sum(),
            can_pay: item_count > 0,
        }
    }
}

/// Snapshot of the cart handed to the view.
///
/// Only constructed through [`CartAggregate::derive`], so the footer can never
/// disagree with the slots it was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct CartAggregate {
    slots: Vec<CartSlot>,
    all_settled: bool,
    footer: Option<Footer>,
}

impl CartAggregate {
    pub fn derive(slots: Vec<CartSlot>, all_settled: bool) -> Self {
        let footer = all_settled.then(|| Footer::from_slots(&slots));
        Self {
            slots,
            all_settled,
            footer,
        }
    }

    pub fn slots(&self) -> &[CartSlot] {
        &self.slots
    }

    pub fn all_settled(&self) -> bool {
        self.all_settled
    }

    pub fn footer(&self) -> Option<&Footer> {
        self.footer.as_ref()
    }

    pub fn item_ids(&self) -> Vec<NftId> {
        self.slots.iter().map(|s| s.id().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    fn ready(id: &str, price: Amount) -> CartSlot {
        CartSlot::Ready(Arc::new(ItemDetail {
            id: id.into(),
            name: id.into(),
            price,
            rating: 1,
            images: vec![],
        }))
    }

    #[test]
    fn test_footer_absent_until_settled() {
        let slots = vec![ready("a", dec!(1)), CartSlot::Pending("b".into())];
        let aggregate = CartAggregate::derive(slots, false);

        assert!(aggregate.footer().is_none());
        assert_eq!(aggregate.item_ids(), vec![NftId::from("a"), "b".into()]);
    }

    #[test]
    fn test_footer_sums_only_ready_slots() {
        let slots = vec![
            ready("a", dec!(2.5)),
            CartSlot::Failed("b".into(), NetworkError::HttpStatus(500)),
            ready("c", dec!(1.25)),
        ];
        let aggregate = CartAggregate::derive(slots, true);

        assert_eq!(
            aggregate.footer(),
            Some(&Footer {
                item_count: 3,
                total_price: dec!(3.75),
                can_pay: true,
            })
        );
    }

    #[test]
    fn test_empty_settled_cart_cannot_pay() {
        let aggregate = CartAggregate::derive(vec![], true);
        let footer = aggregate.footer().unwrap();
        assert_eq!(footer.item_count, 0);
        assert_eq!(footer.total_price, dec!(0));
        assert!(!footer.can_pay);
    }
}
