//! Storefront Engine
//!
//! The storefront engine is the order lifecycle and payment reconciliation core of a storefront that settles
//! purchases through an external payment processor. It is processor-agnostic: the processor is reached through the
//! [`traits::PaymentIntentGateway`] trait.
//!
//! The library is divided into these sections:
//! 1. Backend contracts ([`mod@traits`]) and a SQLite implementation of them ([`SqliteDatabase`]). The data types
//!    used by the backends live in [`mod@db_types`] and are public.
//! 2. The public API ([`mod@store_api`]). Checkout creates a payment intent and a `pending` order bound to it. The
//!    lifecycle engine is the only place an order's status changes. Processor webhooks and admin overrides both go
//!    through it, and whichever decides first wins.
//!
//! The engine also emits events when orders are created and decided. See [`mod@events`].
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod store_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use store_api::{
    accounts_api::AccountApi,
    admin_api::AdminApi,
    checkout_api::CheckoutApi,
    errors::{OrderFlowError, OrderLookup},
    notification::Notification,
    order_flow_api::{DecisionOutcome, OrderFlowApi},
    order_objects,
    reconciler::{ReconcileOutcome, WebhookApi},
};
pub use traits::{
    AuthManagement,
    CatalogManagement,
    OrderManagement,
    PaymentIntentGateway,
    StorefrontDatabase,
};
