//! Data types shared by the storage backends and the storefront API.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
pub use store_common::Cents;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The payment intent has been created, and no decision has been made yet.
    Pending,
    /// Payment was confirmed by the processor, or an admin approved the order. Terminal.
    Approved,
    /// Payment failed, or an admin rejected the order. Terminal.
    Rejected,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Approved => write!(f, "approved"),
            OrderStatusType::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------       Decision        ---------------------------------------------------------
/// The outcome that closes a pending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn status(&self) -> OrderStatusType {
        match self {
            Decision::Approved => OrderStatusType::Approved,
            Decision::Rejected => OrderStatusType::Rejected,
        }
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.status().fmt(f)
    }
}

impl FromStr for Decision {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<OrderStatusType>()? {
            OrderStatusType::Approved => Ok(Self::Approved),
            OrderStatusType::Rejected => Ok(Self::Rejected),
            OrderStatusType::Pending => Err(ConversionError("pending is not a decision".into())),
        }
    }
}

//--------------------------------------     DecisionActor     ---------------------------------------------------------
/// Who closed an order. Stored as `webhook` or `admin:<user id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DecisionActor {
    Webhook,
    Admin(i64),
}

impl Display for DecisionActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionActor::Webhook => write!(f, "webhook"),
            DecisionActor::Admin(id) => write!(f, "admin:{id}"),
        }
    }
}

impl FromStr for DecisionActor {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "webhook" => Ok(Self::Webhook),
            Some(("admin", id)) => id
                .parse::<i64>()
                .map(Self::Admin)
                .map_err(|e| ConversionError(format!("Invalid admin id in actor '{s}': {e}"))),
            _ => Err(ConversionError(format!("Invalid decision actor: {s}"))),
        }
    }
}

impl From<DecisionActor> for String {
    fn from(value: DecisionActor) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for DecisionActor {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse::<i64>().map(Self).map_err(|e| ConversionError(format!("{s}: {e}")))
    }
}

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
/// A single purchase attempt.
///
/// `status` is `pending` exactly when `decided_at` and `decided_by` are both empty. Storage backends refuse to
/// materialise records that break this rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Cents,
    pub total_price: Cents,
    pub status: OrderStatusType,
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<DecisionActor>,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Checks that the status and decision fields agree with each other.
    pub fn check_decision_fields(&self) -> Result<(), ConversionError> {
        let pending = self.status == OrderStatusType::Pending;
        match (pending, self.decided_at.is_some(), self.decided_by.is_some()) {
            (true, false, false) | (false, true, true) => Ok(()),
            _ => Err(ConversionError(format!(
                "Order {} has status {} but decided_at={:?} and decided_by={:?}",
                self.id, self.status, self.decided_at, self.decided_by
            ))),
        }
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
/// A pending order about to be stored. The price is captured from the product at checkout time.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Cents,
    pub total_price: Cents,
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Captures the product price for `quantity` items. Returns `None` if the total does not fit in an `i64`.
    pub fn new(buyer_id: i64, product: &Product, quantity: i64, payment_reference: String) -> Option<Self> {
        let total_price = product.price.checked_mul(quantity)?;
        Some(Self {
            buyer_id,
            product_id: product.id,
            quantity,
            unit_price: product.price,
            total_price,
            payment_reference,
            created_at: Utc::now(),
        })
    }
}

//--------------------------------------        Product       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Cents,
    pub in_stock: bool,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Cents,
    pub in_stock: bool,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Cents) -> Self {
        Self { name: name.into(), description: String::default(), price, in_stock: true }
    }

    pub fn out_of_stock(mut self) -> Self {
        self.in_stock = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub price: Cents,
}

impl From<Product> for ProductSummary {
    fn from(p: Product) -> Self {
        Self { id: p.id, name: p.name, price: p.price }
    }
}

//--------------------------------------        Role       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Admin,
    SubOwner,
    Owner,
}

impl Role {
    /// Roles that may administer orders.
    pub const ELEVATED: [Role; 3] = [Role::Admin, Role::SubOwner, Role::Owner];

    pub fn is_elevated(&self) -> bool {
        Self::ELEVATED.contains(self)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
            Role::SubOwner => write!(f, "sub-owner"),
            Role::Owner => write!(f, "owner"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "sub-owner" | "sub_owner" => Ok(Self::SubOwner),
            "owner" => Ok(Self::Owner),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------        User       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl NewUser {
    pub fn new<S: Into<String>>(name: S, email: S, role: Role) -> Self {
        Self { email: email.into(), name: name.into(), role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<User> for BuyerSummary {
    fn from(u: User) -> Self {
        Self { id: u.id, name: u.name, email: u.email }
    }
}
