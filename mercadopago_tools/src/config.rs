use std::time::Duration;

use log::*;
use store_common::Secret;

pub const DEFAULT_MP_API_URL: &str = "https://api.mercadopago.com";
pub const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct MercadoPagoConfig {
    pub api_url: String,
    pub access_token: Secret<String>,
    pub timeout: Duration,
}

impl Default for MercadoPagoConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_MP_API_URL.to_string(),
            access_token: Secret::default(),
            timeout: Duration::from_millis(DEFAULT_GATEWAY_TIMEOUT_MS),
        }
    }
}

impl MercadoPagoConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("SFG_MP_API_URL").unwrap_or_else(|_| {
            info!("SFG_MP_API_URL not set, using {DEFAULT_MP_API_URL}");
            DEFAULT_MP_API_URL.to_string()
        });
        let access_token = Secret::new(std::env::var("SFG_MP_ACCESS_TOKEN").unwrap_or_else(|_| {
            warn!("SFG_MP_ACCESS_TOKEN not set. Payment intents cannot be created until it is configured.");
            String::default()
        }));
        let timeout = std::env::var("SFG_GATEWAY_TIMEOUT_MS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid SFG_GATEWAY_TIMEOUT_MS ({s}): {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_millis(DEFAULT_GATEWAY_TIMEOUT_MS));
        Self { api_url: api_url.trim_end_matches('/').to_string(), access_token, timeout }
    }

    pub fn is_configured(&self) -> bool {
        !self.access_token.is_empty()
    }
}
