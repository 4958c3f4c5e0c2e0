//! # Backend contracts
//!
//! This module defines the behaviour that storage backends and payment processors must expose to be driven by the
//! storefront engine.
//!
//! * [`OrderManagement`] stores orders and owns the only mutation of an order's status, a conditional decision.
//! * [`CatalogManagement`] provides read access to the product catalogue.
//! * [`AuthManagement`] provides read access to user records and their roles.
//! * [`StorefrontDatabase`] bundles the three for backends that provide all of them.
//! * [`PaymentIntentGateway`] is the seam to the external payment processor.
mod auth_management;
mod catalog_management;
mod order_management;
mod payment_gateway;
mod storefront_database;

pub use auth_management::{AuthApiError, AuthManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use order_management::{OrderManagement, OrderStoreError};
pub use payment_gateway::{
    GatewayError,
    OrderDraft,
    PaymentIntent,
    PaymentIntentGateway,
    ProcessorPayment,
    ProcessorStatus,
    RedirectTargets,
};
pub use storefront_database::StorefrontDatabase;
