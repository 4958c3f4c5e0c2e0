//! # Storefront server
//! This crate hosts the HTTP server for the storefront payment gateway. It is responsible for:
//! * Creating payment intents for buyers at checkout, and recording the pending order.
//! * Listening for payment notifications from the processor and reconciling them with orders.
//! * Letting admins approve or reject orders by hand, and list them.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhooks/payment`: Payment notifications from the processor. Protected by an HMAC signature and an optional IP
//!   whitelist.
//! * `/api/...`: Buyer and admin routes. Every call needs an access token. See [routes](routes/index.html).

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
