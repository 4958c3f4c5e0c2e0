//! # Storefront engine public API
//!
//! The `store_api` module exposes the programmatic API of the storefront engine. It is modular, so that clients pick
//! the parts they need.
//!
//! * [`order_flow_api`] is the order lifecycle engine. It owns the single path that changes an order's status.
//! * [`checkout_api`] creates payment intents and the pending orders bound to them.
//! * [`reconciler`] turns processor notifications into lifecycle decisions.
//! * [`admin_api`] lets elevated users approve or reject orders by hand.
//! * [`accounts_api`] provides read-only order listings joined with product and buyer summaries.
//!
//! # API usage
//!
//! Every API instance is created by supplying a backend that implements the traits it needs.
//!
//! ```rust,ignore
//! use storefront_engine::{OrderFlowApi, SqliteDatabase, events::EventProducers};
//! let db = SqliteDatabase::new_with_url("sqlite://data/storefront.db", 25).await?;
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let order = api.apply_decision(OrderId(1), Decision::Approved, DecisionActor::Webhook).await?;
//! ```
pub mod accounts_api;
pub mod admin_api;
pub mod checkout_api;
pub mod errors;
pub mod notification;
pub mod order_flow_api;
pub mod order_objects;
pub mod reconciler;
