use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// A pending order was stored after its payment intent was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// A pending order was closed. Only emitted by the write that actually decided the order, never for no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDecidedEvent {
    pub order: Order,
}

impl OrderDecidedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}
