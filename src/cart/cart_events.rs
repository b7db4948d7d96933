use std::sync::Arc;

use nft_core::core::bits::{CurrencyId, NftId};
use thiserror::Error;

use crate::net::http_client::NetworkError;

use super::slot::{CartAggregate, CartSlot};

/// Everything the view learns about the cart arrives as one of these.
#[derive(Clone, Debug)]
pub enum CartEvent {
    /// Slots were replaced or removed; redraw every row.
    FullReload(Arc<CartAggregate>),

    /// Only the row at `index` changed.
    SlotUpdated {
        aggregate: Arc<CartAggregate>,
        index: usize,
    },

    /// The cycle settled and the footer became available.
    FooterUpdated(Arc<CartAggregate>),

    Sorted(Arc<CartAggregate>),

    /// Ask the user whether the item should really go.
    ConfirmDelete {
        id: NftId,
        image_url: Option<String>,
    },

    PaymentCompleted {
        currency_id: CurrencyId,
    },

    Error(CartError),
}

impl CartEvent {
    pub fn aggregate(&self) -> Option<&Arc<CartAggregate>> {
        match self {
            CartEvent::FullReload(aggregate)
            | CartEvent::SlotUpdated { aggregate, .. }
            | CartEvent::FooterUpdated(aggregate)
            | CartEvent::Sorted(aggregate) => Some(aggregate),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CartError {
    #[error("Failed to load order: {0}")]
    OrderLoadFailed(NetworkError),

    #[error("Failed to load item {id}: {source}")]
    ItemLoadFailed { id: NftId, source: NetworkError },

    #[error("Failed to change order: {reason}")]
    MutationFailed { reason: String },

    #[error("Item {id} is still loading")]
    NotReady { id: NftId },

    #[error("Item {id} is not in the cart")]
    UnknownItem { id: NftId },

    #[error("Cart cannot be paid in its current state")]
    PaymentUnavailable,

    #[error("Cart is not running")]
    Stopped,
}

impl CartError {
    pub fn mutation(err: NetworkError) -> Self {
        CartError::MutationFailed {
            reason: err.to_string(),
        }
    }

    /// Failure recorded in a slot, if the slot holds one.
    pub fn from_slot(slot: &CartSlot) -> Option<Self> {
        match slot {
            CartSlot::Failed(id, err) => Some(CartError::ItemLoadFailed {
                id: id.clone(),
                source: err.clone(),
            }),
            _ => None,
        }
    }

    /// Text shown to the user in an alert.
    pub fn user_message(&self) -> String {
        match self {
            CartError::OrderLoadFailed(_) => {
                "Could not load your cart. Check the connection and try again.".to_owned()
            }
            CartError::ItemLoadFailed { .. } => {
                "Could not load this item. Reload the cart to try again.".to_owned()
            }
            CartError::MutationFailed { .. } => {
                "Could not update the order. Please try again.".to_owned()
            }
            CartError::NotReady { .. } => {
                "The item is still loading, please retry later.".to_owned()
            }
            CartError::UnknownItem { .. } => "The item is no longer in your cart.".to_owned(),
            CartError::PaymentUnavailable => "There is nothing to pay for yet.".to_owned(),
            CartError::Stopped => "The cart is unavailable.".to_owned(),
        }
    }

    /// Whether the user should be offered to try the same thing again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CartError::OrderLoadFailed(_)
                | CartError::ItemLoadFailed { .. }
                | CartError::MutationFailed { .. }
                | CartError::NotReady { .. }
        )
    }
}
