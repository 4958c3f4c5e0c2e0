use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use hmac::{Hmac, Mac};
use log::{debug, error, trace, warn};
use regex::Regex;
use sha2::Sha256;

use crate::config::ServerOptions;

type HmacSha256 = Hmac<Sha256>;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        // The left-most entry is the original client
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req.headers().get("Forwarded").and_then(|v| v.to_str().ok()).and_then(ip_from_forwarded);
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
    })
}

/// Whether a webhook caller may proceed. Without a whitelist, every caller may.
pub fn is_whitelisted(req: &HttpRequest, whitelist: Option<&[IpAddr]>, options: ServerOptions) -> bool {
    let Some(whitelist) = whitelist else {
        return true;
    };
    match get_remote_ip(req, options.use_x_forwarded_for, options.use_forwarded) {
        Some(ip) if whitelist.contains(&ip) => {
            trace!("🔐️ Webhook call from whitelisted address {ip}");
            true
        },
        Some(ip) => {
            warn!("🔐️ Webhook call from {ip}, which is not whitelisted. Denying access.");
            false
        },
        None => {
            warn!("🔐️ No remote address found on webhook call. Denying access.");
            false
        },
    }
}

fn ip_from_forwarded(value: &str) -> Option<IpAddr> {
    let re = Regex::new(r#"for="?\[?(?P<ip>[^;,"\]]+)"#)
        .map_err(|e| warn!("Could not compile the Forwarded header pattern. {e}"))
        .ok()?;
    let caps = re.captures(value)?;
    caps.name("ip").and_then(|m| IpAddr::from_str(m.as_str()).ok())
}

/// The base64-encoded HMAC-SHA256 of `data` under `secret`.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> Option<String> {
    let mut mac = new_mac(secret)?;
    mac.update(data);
    Some(base64::encode(mac.finalize().into_bytes()))
}

/// Checks a base64-encoded HMAC-SHA256 signature in constant time. Nothing verifies against an empty secret.
pub fn verify_hmac(secret: &str, data: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        warn!("🔐️ No webhook secret is configured. Signatures cannot be verified.");
        return false;
    }
    let Ok(signature) = base64::decode(signature.trim()) else {
        return false;
    };
    let Some(mut mac) = new_mac(secret) else {
        return false;
    };
    mac.update(data);
    mac.verify_slice(&signature).is_ok()
}

fn new_mac(secret: &str) -> Option<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| error!("🔐️ Could not create HMAC key. {e}"))
        .ok()
}
