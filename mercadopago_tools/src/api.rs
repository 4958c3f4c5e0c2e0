use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::MercadoPagoConfig,
    data_objects::{NewPreference, Payment, Preference},
    MercadoPagoApiError,
};

#[derive(Clone)]
pub struct MercadoPagoApi {
    config: MercadoPagoConfig,
    client: Arc<Client>,
}

impl MercadoPagoApi {
    pub fn new(config: MercadoPagoConfig) -> Result<Self, MercadoPagoApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        if config.is_configured() {
            let bearer = format!("Bearer {}", config.access_token.reveal().trim());
            let mut val =
                HeaderValue::from_str(&bearer).map_err(|e| MercadoPagoApiError::Initialization(e.to_string()))?;
            val.set_sensitive(true);
            headers.insert("Authorization", val);
        }
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| MercadoPagoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MercadoPagoConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, MercadoPagoApiError> {
        if !self.config.is_configured() {
            return Err(MercadoPagoApiError::NotConfigured);
        }
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                MercadoPagoApiError::Timeout(e.to_string())
            } else {
                MercadoPagoApiError::RestRequestError(e.to_string())
            }
        })?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MercadoPagoApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message =
                response.text().await.map_err(|e| MercadoPagoApiError::RestRequestError(e.to_string()))?;
            Err(MercadoPagoApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Registers a checkout preference. The buyer pays by following the returned `init_point`.
    pub async fn create_preference(&self, preference: &NewPreference) -> Result<Preference, MercadoPagoApiError> {
        debug!("Creating checkout preference for reference {}", preference.external_reference);
        let result =
            self.rest_query::<Preference, &NewPreference>(Method::POST, "/checkout/preferences", &[], Some(preference))
                .await?;
        info!("Created checkout preference {} for reference {}", result.id, preference.external_reference);
        Ok(result)
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, MercadoPagoApiError> {
        if payment_id.is_empty() || !payment_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(MercadoPagoApiError::QueryError {
                status: 400,
                message: format!("'{payment_id}' is not a valid payment id"),
            });
        }
        let path = format!("/v1/payments/{payment_id}");
        debug!("Fetching payment #{payment_id}");
        let result = self.rest_query::<Payment, ()>(Method::GET, &path, &[], None).await?;
        debug!("Fetched payment #{payment_id}. Status: {}", result.status);
        Ok(result)
    }
}
