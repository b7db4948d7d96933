use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use super::bits::CurrencyId;

pub const MOCK_RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub fn get_mock_currency_id_1() -> CurrencyId {
    "1".into()
}

pub fn get_mock_currency_id_2() -> CurrencyId {
    "2".into()
}

/// Await the next value, failing the test instead of hanging forever.
pub async fn recv_mock_timeout<T>(rx: &mut UnboundedReceiver<T>) -> T {
    match tokio::time::timeout(MOCK_RECV_TIMEOUT, rx.recv()).await {
        Ok(Some(value)) => value,
        Ok(None) => panic!("Channel closed"),
        Err(_) => panic!("Timed out waiting for {}", std::any::type_name::<T>()),
    }
}

/// Assert that nothing arrives within the given period.
pub async fn assert_mock_silent<T>(rx: &mut UnboundedReceiver<T>, period: Duration) {
    if let Ok(Some(_)) = tokio::time::timeout(period, rx.recv()).await {
        panic!("Unexpected {}", std::any::type_name::<T>());
    }
}
