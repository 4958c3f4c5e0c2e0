use std::fmt::Display;

use serde::{Deserialize, Serialize};
use store_common::Cents;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The processor could not be reached, timed out, or is not configured. Worth retrying later.
    #[error("Payment processor is unavailable: {0}")]
    Unavailable(String),
    /// The processor refused the request. Retrying will not help.
    #[error("Payment processor rejected the request: {0}")]
    Rejected(String),
}

/// What the buyer is about to pay for, with the price already captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub buyer_id: i64,
    pub product_id: i64,
    pub title: String,
    pub unit_price: Cents,
    pub quantity: i64,
    pub total_price: Cents,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectTargets {
    pub checkout_url: String,
    pub success_url: String,
    pub failure_url: String,
}

/// A payable intent registered with the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// Opaque reference that the processor echoes back on every payment made against this intent.
    pub reference: String,
    pub redirect_targets: RedirectTargets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorStatus {
    Approved,
    Rejected,
    Pending,
    Unknown,
}

impl Display for ProcessorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessorStatus::Approved => write!(f, "approved"),
            ProcessorStatus::Rejected => write!(f, "rejected"),
            ProcessorStatus::Pending => write!(f, "pending"),
            ProcessorStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// The processor's current view of a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorPayment {
    pub payment_id: String,
    pub status: ProcessorStatus,
    /// The intent reference the payment was made against, if the processor knows it.
    pub reference: Option<String>,
    pub amount: Option<Cents>,
}

impl ProcessorPayment {
    pub fn new<S: Into<String>>(payment_id: S, status: ProcessorStatus) -> Self {
        Self { payment_id: payment_id.into(), status, reference: None, amount: None }
    }

    pub fn with_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_amount(mut self, amount: Cents) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// The seam to the external payment processor.
///
/// Implementations perform no local side effects. Callers bound each call with a timeout and treat
/// [`GatewayError::Unavailable`] as transient.
#[allow(async_fn_in_trait)]
pub trait PaymentIntentGateway {
    /// Asks the processor for a payable intent for the draft.
    async fn create_intent(&self, draft: &OrderDraft) -> Result<PaymentIntent, GatewayError>;

    /// Fetches the current status of a payment by its processor-assigned id.
    async fn fetch_payment_status(&self, payment_id: &str) -> Result<ProcessorPayment, GatewayError>;
}
