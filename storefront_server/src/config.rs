use std::{env, net::IpAddr, time::Duration};

use log::*;
use mercadopago_tools::MercadoPagoConfig;
use rand::{thread_rng, RngCore};
use store_common::{parse_boolean_flag, parse_list, Secret};
use storefront_engine::helpers::RetryPolicy;

use crate::errors::ServerError;

const DEFAULT_SFG_HOST: &str = "127.0.0.1";
const DEFAULT_SFG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
pub const DEFAULT_WEBHOOK_HMAC_HEADER: &str = "X-Webhook-Signature";
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_millis(10_000);
const DEFAULT_GATEWAY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_GATEWAY_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The public URL of the storefront. Buyers are sent back to `<app_url>/success` or `<app_url>/failure` after
    /// paying, and the processor notifies `<app_url>/webhooks/payment`.
    pub app_url: String,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    pub webhook: WebhookConfig,
    pub gateway: GatewayConfig,
    pub mercadopago: MercadoPagoConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SFG_HOST.to_string(),
            port: DEFAULT_SFG_PORT,
            database_url: String::default(),
            app_url: format!("http://{DEFAULT_SFG_HOST}:{DEFAULT_SFG_PORT}"),
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            webhook: WebhookConfig::default(),
            gateway: GatewayConfig::default(),
            mercadopago: MercadoPagoConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SFG_HOST").ok().unwrap_or_else(|| DEFAULT_SFG_HOST.into());
        let port = env::var("SFG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SFG_PORT. {e} Using the default, {DEFAULT_SFG_PORT}, instead."
                    );
                    DEFAULT_SFG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SFG_PORT);
        let database_url = env::var("SFG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SFG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let app_url = env::var("SFG_APP_URL").map(|s| s.trim_end_matches('/').to_string()).unwrap_or_else(|_| {
            let url = format!("http://{host}:{port}");
            warn!(
                "🪛️ SFG_APP_URL is not set. Using {url}. The payment processor will not be able to reach the webhook \
                 endpoint unless this is a public address."
            );
            url
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("SFG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SFG_USE_FORWARDED").ok(), false);
        let webhook = WebhookConfig::from_env_or_defaults();
        let gateway = GatewayConfig::from_env_or_defaults();
        let mut mercadopago = MercadoPagoConfig::new_from_env_or_default();
        mercadopago.timeout = gateway.timeout;
        Self {
            host,
            port,
            database_url,
            app_url,
            auth,
            use_x_forwarded_for,
            use_forwarded,
            webhook,
            gateway,
            mercadopago,
        }
    }
}

//-------------------------------------------------  WebhookConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// The shared secret used to sign webhook bodies.
    pub hmac_secret: Secret<String>,
    /// The header that carries the base64-encoded HMAC-SHA256 signature of the body.
    pub hmac_header: String,
    pub hmac_checks: bool,
    /// If supplied, webhook requests will be checked against this whitelist of IP addresses.
    /// To explicitly disable the whitelist, set SFG_WEBHOOK_IP_WHITELIST to "false", "none", or "0".
    pub whitelist: Option<Vec<IpAddr>>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            hmac_secret: Secret::default(),
            hmac_header: DEFAULT_WEBHOOK_HMAC_HEADER.to_string(),
            hmac_checks: true,
            whitelist: None,
        }
    }
}

impl WebhookConfig {
    pub fn from_env_or_defaults() -> Self {
        let hmac_secret = Secret::new(env::var("SFG_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ SFG_WEBHOOK_SECRET is not set. Every webhook call will be refused until it is configured.");
            String::default()
        }));
        let hmac_header =
            env::var("SFG_WEBHOOK_HMAC_HEADER").ok().unwrap_or_else(|| DEFAULT_WEBHOOK_HMAC_HEADER.to_string());
        let hmac_checks = parse_boolean_flag(env::var("SFG_WEBHOOK_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!(
                "🚨️🚨️🚨️ Webhook HMAC checks are DISABLED. Anyone who can reach the webhook endpoint can trigger \
                 payment reconciliation. Do not run production like this. 🚨️🚨️🚨️"
            );
        }
        let whitelist = env::var("SFG_WEBHOOK_IP_WHITELIST").ok().and_then(|s| parse_whitelist(&s));
        match &whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The webhook IP whitelist was configured, but is empty. The server will run, but won't \
                     authorise any incoming payment notifications."
                );
            },
            None => {
                info!("🪛️ No webhook IP whitelist is set. Only HMAC validation will be used.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Webhook IP whitelist: {addrs}");
            },
        }
        Self { hmac_secret, hmac_header, hmac_checks, whitelist }
    }
}

fn parse_whitelist(s: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0"].contains(&s.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ Webhook IP whitelist is disabled. If this is not what you want, set SFG_WEBHOOK_IP_WHITELIST to a \
             comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = parse_list(s)
        .into_iter()
        .filter_map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in SFG_WEBHOOK_IP_WHITELIST: {e}"))
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

//-------------------------------------------------  GatewayConfig  ----------------------------------------------------
/// Limits on calls to the payment processor.
#[derive(Clone, Copy, Debug)]
pub struct GatewayConfig {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_GATEWAY_TIMEOUT,
            max_attempts: DEFAULT_GATEWAY_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_GATEWAY_BACKOFF,
        }
    }
}

impl GatewayConfig {
    pub fn from_env_or_defaults() -> Self {
        let timeout = env_millis("SFG_GATEWAY_TIMEOUT_MS", DEFAULT_GATEWAY_TIMEOUT);
        let initial_backoff = env_millis("SFG_GATEWAY_BACKOFF_MS", DEFAULT_GATEWAY_BACKOFF);
        let max_attempts = env::var("SFG_GATEWAY_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| match s.parse::<u32>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    warn!("🪛️ Invalid configuration value for SFG_GATEWAY_MAX_ATTEMPTS ({s}). Using the default.");
                    None
                },
            })
            .unwrap_or(DEFAULT_GATEWAY_MAX_ATTEMPTS);
        Self { timeout, max_attempts, initial_backoff }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.initial_backoff, self.timeout)
    }
}

fn env_millis(name: &str, default: Duration) -> Duration {
    env::var(name)
        .map_err(|_| trace!("🪛️ {name} is not set. Using the default value of {}ms.", default.as_millis()))
        .and_then(|s| {
            s.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| warn!("🪛️ Invalid configuration value for {name}. {e}"))
        })
        .ok()
        .unwrap_or(default)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret shared with the sign-in service that issues access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No access token \
             issued elsewhere will be accepted. DO NOT operate on production like this. 🚨️🚨️🚨️"
        );
        let mut key = [0u8; 32];
        thread_rng().fill_bytes(&mut key);
        Self { jwt_secret: Secret::new(base64::encode(key)) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("SFG_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [SFG_JWT_SECRET]")))?;
        if secret.trim().len() < 16 {
            return Err(ServerError::ConfigurationError(
                "SFG_JWT_SECRET is too short. Use at least 16 characters.".to_string(),
            ));
        }
        Ok(Self::new(secret))
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
