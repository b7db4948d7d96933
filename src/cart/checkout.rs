use std::sync::Arc;

use nft_core::core::bits::CurrencyId;
use thiserror::Error;

use crate::{model::currency::Currency, net::http_client::NetworkError, service::nft_service::NftService};

use super::{cart_events::CartError, cart_state_machine::CartHandle};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckoutError {
    #[error("Failed to load currencies: {0}")]
    CurrenciesUnavailable(NetworkError),

    #[error("No currency selected")]
    NoCurrencySelected,

    #[error("Unknown currency {0}")]
    UnknownCurrency(CurrencyId),

    #[error("No payment to retry")]
    NothingToRetry,

    #[error("Payment failed: {0}")]
    Payment(CartError),
}

impl CheckoutError {
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::CurrenciesUnavailable(_) => true,
            CheckoutError::Payment(err) => err.is_retryable(),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutState {
    Initial,
    Loading,
    Ready,
    Paying,
    Paid,
    Failed { retryable: bool },
}

/// One visit to the payment screen: choose a currency and pay for the cart.
///
/// Currencies are fetched at most once per session.
pub struct CheckoutSession {
    service: Arc<dyn NftService>,
    cart: CartHandle,
    state: CheckoutState,
    currencies: Option<Vec<Currency>>,
    selected: Option<CurrencyId>,
    last_payment: Option<CurrencyId>,
}

impl CheckoutSession {
    pub fn new(service: Arc<dyn NftService>, cart: CartHandle) -> Self {
        Self {
            service,
            cart,
            state: CheckoutState::Initial,
            currencies: None,
            selected: None,
            last_payment: None,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    fn fail(&mut self, err: CheckoutError) -> CheckoutError {
        tracing::warn!("Checkout failed: {}", err);
        self.state = CheckoutState::Failed {
            retryable: err.is_retryable(),
        };
        err
    }

    pub async fn load_currencies(&mut self) -> Result<&[Currency], CheckoutError> {
        if self.currencies.is_none() {
            self.state = CheckoutState::Loading;
            match self.service.load_currencies().await {
                Ok(currencies) => {
                    tracing::info!("Loaded {} currencies", currencies.len());
                    self.currencies = Some(currencies);
                    self.state = CheckoutState::Ready;
                }
                Err(err) => return Err(self.fail(CheckoutError::CurrenciesUnavailable(err))),
            }
        }

        Ok(self.currencies.as_deref().unwrap_or_default())
    }

    /// Choose the currency to pay with. It must be one of the loaded ones.
    pub fn select_currency(&mut self, id: CurrencyId) -> Result<&Currency, CheckoutError> {
        let currency = self
            .currencies
            .iter()
            .flatten()
            .find(|c| c.id == id)
            .ok_or_else(|| CheckoutError::UnknownCurrency(id.clone()))?;

        self.selected = Some(id);
        Ok(currency)
    }

    pub fn selected(&self) -> Option<&Currency> {
        let selected = self.selected.as_ref()?;
        self.currencies.iter().flatten().find(|c| &c.id == selected)
    }

    pub async fn pay(&mut self) -> Result<(), CheckoutError> {
        let currency_id = self
            .selected
            .clone()
            .ok_or(CheckoutError::NoCurrencySelected)?;
        self.pay_with(currency_id).await
    }

    /// Re-issue the last payment attempt.
    pub async fn retry(&mut self) -> Result<(), CheckoutError> {
        let currency_id = self
            .last_payment
            .clone()
            .ok_or(CheckoutError::NothingToRetry)?;
        self.pay_with(currency_id).await
    }

    async fn pay_with(&mut self, currency_id: CurrencyId) -> Result<(), CheckoutError> {
        self.state = CheckoutState::Paying;
        self.last_payment = Some(currency_id.clone());

        match self.cart.pay(currency_id).await {
            Ok(()) => {
                self.state = CheckoutState::Paid;
                self.last_payment = None;
                Ok(())
            }
            Err(err) => Err(self.fail(CheckoutError::Payment(err))),
        }
    }
}
