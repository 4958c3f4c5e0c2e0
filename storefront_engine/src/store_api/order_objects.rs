use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{BuyerSummary, Order, OrderStatusType, ProductSummary},
    traits::RedirectTargets,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<i64>,
    pub product_id: Option<i64>,
    pub payment_reference: Option<String>,
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_buyer_id(mut self, buyer_id: i64) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_product_id(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_payment_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.payment_reference = Some(reference.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        match &mut self.status {
            Some(s) if !s.contains(&status) => s.push(status),
            Some(_) => {},
            None => self.status = Some(vec![status]),
        }
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() &&
            self.product_id.is_none() &&
            self.payment_reference.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "All orders");
        }
        let mut parts = Vec::new();
        if let Some(id) = self.buyer_id {
            parts.push(format!("buyer: {id}"));
        }
        if let Some(id) = self.product_id {
            parts.push(format!("product: {id}"));
        }
        if let Some(reference) = &self.payment_reference {
            parts.push(format!("reference: {reference}"));
        }
        if let Some(statuses) = self.status.as_ref().filter(|s| !s.is_empty()) {
            let s = statuses.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(",");
            parts.push(format!("status: {s}"));
        }
        if let Some(since) = self.since {
            parts.push(format!("since: {since}"));
        }
        if let Some(until) = self.until {
            parts.push(format!("until: {until}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// A buyer's request for a payment intent. The price is never taken from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub order_id: i64,
    pub external_reference: String,
    pub redirect_targets: RedirectTargets,
}

/// An order joined with summaries of the product and the buyer. A summary is missing if the record was removed from
/// the catalogue or user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub product: Option<ProductSummary>,
    pub buyer: Option<BuyerSummary>,
}
