//! A thin client for the parts of the MercadoPago REST API the storefront needs: creating checkout preferences
//! and looking up payments.
mod api;
mod config;
mod error;
mod helpers;

mod data_objects;

pub use api::MercadoPagoApi;
pub use config::MercadoPagoConfig;
pub use data_objects::{BackUrls, NewPreference, Payment, Preference, PreferenceItem};
pub use error::MercadoPagoApiError;
pub use helpers::{cents_from_units, is_transient_status};
