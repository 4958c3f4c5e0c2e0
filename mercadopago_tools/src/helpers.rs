use store_common::Cents;

use crate::MercadoPagoApiError;

/// MercadoPago expresses amounts as decimal currency units. Converts them back to integer cents.
pub fn cents_from_units(amount: f64) -> Result<Cents, MercadoPagoApiError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(MercadoPagoApiError::InvalidCurrencyAmount(amount.to_string()));
    }
    let cents = (amount * 100.0).round();
    if cents > i64::MAX as f64 {
        return Err(MercadoPagoApiError::InvalidCurrencyAmount(amount.to_string()));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(Cents::from(cents as i64))
}

/// Statuses that say nothing about the request itself: the processor is down, throttling us, or does not accept
/// our credentials right now. These are worth retrying later.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 401 | 403 | 408 | 429) || status >= 500
}
