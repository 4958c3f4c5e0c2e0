use std::fmt::Display;

use thiserror::Error;

use crate::{
    db_types::OrderId,
    traits::{AuthApiError, CatalogError, GatewayError, OrderStoreError},
};

/// How an order was looked up when it could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderLookup {
    Id(OrderId),
    PaymentReference(String),
    /// The processor reported a payment that carries no intent reference at all.
    Payment(String),
}

impl Display for OrderLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderLookup::Id(id) => write!(f, "order {id}"),
            OrderLookup::PaymentReference(r) => write!(f, "payment reference {r}"),
            OrderLookup::Payment(p) => write!(f, "payment {p} (no reference)"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Payment processor is unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("Payment processor rejected the request: {0}")]
    GatewayRejected(String),
    #[error("Malformed payment notification: {0}")]
    MalformedNotification(String),
    #[error("No order found for {0}")]
    OrderNotFound(OrderLookup),
    #[error("User #{0} is not allowed to administer orders")]
    Unauthorized(i64),
    #[error("Product #{0} does not exist")]
    ProductNotFound(i64),
    #[error("Product #{0} is not available for purchase")]
    ProductUnavailable(i64),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<OrderStoreError> for OrderFlowError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderNotFound(id) => OrderFlowError::OrderNotFound(OrderLookup::Id(id)),
            e => OrderFlowError::DatabaseError(e.to_string()),
        }
    }
}

impl From<CatalogError> for OrderFlowError {
    fn from(e: CatalogError) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

impl From<AuthApiError> for OrderFlowError {
    fn from(e: AuthApiError) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

impl From<GatewayError> for OrderFlowError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Unavailable(s) => OrderFlowError::GatewayUnavailable(s),
            GatewayError::Rejected(s) => OrderFlowError::GatewayRejected(s),
        }
    }
}
