use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Decision, DecisionActor, NewOrder, Order, OrderId},
    order_objects::OrderQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("An order with payment reference {0} already exists")]
    DuplicatePaymentReference(String),
    #[error("Stored order is inconsistent: {0}")]
    InvalidRecord(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { source, .. } => OrderStoreError::InvalidRecord(source.to_string()),
            e => OrderStoreError::DatabaseError(e.to_string()),
        }
    }
}

/// Durable storage of orders.
///
/// Implementations never change `status`, `decided_at` or `decided_by` outside of [`Self::decide_order`].
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order in the `pending` state and returns the stored record.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Finds the order bound to a processor intent reference.
    async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, OrderStoreError>;

    /// Atomically closes a pending order.
    ///
    /// If the order is `pending`, sets the status, `decided_at` and `decided_by` in one conditional write and returns
    /// `(order, true)`. If the order is already terminal, it is returned untouched with `false`, whatever the
    /// requested decision. Two concurrent calls for the same order never both return `true`.
    ///
    /// Fails with [`OrderStoreError::OrderNotFound`] if there is no such order.
    async fn decide_order(
        &self,
        id: OrderId,
        decision: Decision,
        actor: DecisionActor,
        decided_at: DateTime<Utc>,
    ) -> Result<(Order, bool), OrderStoreError>;

    /// Fetches orders matching the filter, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;
}
