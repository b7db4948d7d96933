use nft_core::core::bits::NftId;

use super::{
    cart_events::{CartError, CartEvent},
    cart_state_machine::CartHandle,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: NftId,
    pub image_url: Option<String>,
}

/// Holds the item the user was asked about until they answer.
pub struct DeleteConfirmation {
    cart: CartHandle,
    pending: Option<PendingDelete>,
}

impl DeleteConfirmation {
    pub fn new(cart: CartHandle) -> Self {
        Self {
            cart,
            pending: None,
        }
    }

    /// Ask the cart to confirm removal; the answer arrives as an event.
    pub fn request(&self, id: NftId) -> Result<(), CartError> {
        self.cart.request_remove(id)
    }

    /// Capture a confirm-delete prompt. A newer prompt replaces an unanswered one.
    pub fn handle_event(&mut self, event: &CartEvent) -> bool {
        match event {
            CartEvent::ConfirmDelete { id, image_url } => {
                self.pending = Some(PendingDelete {
                    id: id.clone(),
                    image_url: image_url.clone(),
                });
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> Option<&PendingDelete> {
        self.pending.as_ref()
    }

    /// User agreed: dispatch the removal. Returns the id, or `None` when there
    /// was nothing to confirm.
    pub fn confirm(&mut self) -> Result<Option<NftId>, CartError> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        self.cart.confirm_remove(pending.id.clone())?;
        Ok(Some(pending.id))
    }

    pub fn cancel(&mut self) -> Option<PendingDelete> {
        self.pending.take()
    }
}
