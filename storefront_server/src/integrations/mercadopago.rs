//! The MercadoPago side of the [`PaymentIntentGateway`] contract.
//!
//! Checkout registers a *preference* with MercadoPago, tagged with a fresh UUID as its `external_reference`. Buyers
//! pay against the preference on MercadoPago's own pages, and every payment made there carries the reference back to
//! us. Payment notifications only carry the payment id, so the reconciler asks for the payment and uses the
//! reference to find the order.
use log::*;
use mercadopago_tools::{
    cents_from_units,
    is_transient_status,
    BackUrls,
    MercadoPagoApi,
    MercadoPagoApiError,
    NewPreference,
    Payment,
    PreferenceItem,
};
use store_common::STORE_CURRENCY_CODE;
use storefront_engine::traits::{
    GatewayError,
    OrderDraft,
    PaymentIntent,
    PaymentIntentGateway,
    ProcessorPayment,
    ProcessorStatus,
    RedirectTargets,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct MercadoPagoGateway {
    api: MercadoPagoApi,
    app_url: String,
}

impl MercadoPagoGateway {
    pub fn new<S: Into<String>>(api: MercadoPagoApi, app_url: S) -> Self {
        let app_url = app_url.into().trim_end_matches('/').to_string();
        Self { api, app_url }
    }

    pub fn success_url(&self) -> String {
        format!("{}/success", self.app_url)
    }

    pub fn failure_url(&self) -> String {
        format!("{}/failure", self.app_url)
    }

    pub fn notification_url(&self) -> String {
        format!("{}/webhooks/payment", self.app_url)
    }

    pub fn new_preference(&self, draft: &OrderDraft, reference: &str) -> NewPreference {
        NewPreference {
            items: vec![PreferenceItem {
                title: draft.title.clone(),
                quantity: draft.quantity,
                unit_price: draft.unit_price.as_units(),
                currency_id: Some(STORE_CURRENCY_CODE.to_string()),
            }],
            back_urls: BackUrls { success: self.success_url(), failure: self.failure_url(), pending: None },
            auto_return: Some("approved".to_string()),
            notification_url: Some(self.notification_url()),
            external_reference: reference.to_string(),
        }
    }
}

impl PaymentIntentGateway for MercadoPagoGateway {
    async fn create_intent(&self, draft: &OrderDraft) -> Result<PaymentIntent, GatewayError> {
        let reference = Uuid::new_v4().to_string();
        let preference = self.new_preference(draft, &reference);
        debug!("💳️ Creating MercadoPago preference {reference} for {} x {}", draft.quantity, draft.title);
        let preference = self.api.create_preference(&preference).await.map_err(gateway_error)?;
        info!("💳️ MercadoPago preference {} created with reference {reference}", preference.id);
        let redirect_targets = RedirectTargets {
            checkout_url: preference.init_point,
            success_url: self.success_url(),
            failure_url: self.failure_url(),
        };
        Ok(PaymentIntent { reference, redirect_targets })
    }

    async fn fetch_payment_status(&self, payment_id: &str) -> Result<ProcessorPayment, GatewayError> {
        match self.api.get_payment(payment_id).await {
            Ok(payment) => Ok(processor_payment(payment)),
            Err(e) if e.status() == Some(404) => {
                info!("💳️ MercadoPago does not know payment {payment_id}");
                Ok(ProcessorPayment::new(payment_id, ProcessorStatus::Unknown))
            },
            Err(e) => Err(gateway_error(e)),
        }
    }
}

pub fn processor_status(status: &str) -> ProcessorStatus {
    match status {
        "approved" => ProcessorStatus::Approved,
        "rejected" | "cancelled" => ProcessorStatus::Rejected,
        "pending" | "authorized" | "in_process" | "in_mediation" => ProcessorStatus::Pending,
        _ => ProcessorStatus::Unknown,
    }
}

fn processor_payment(payment: Payment) -> ProcessorPayment {
    let status = processor_status(&payment.status);
    trace!("💳️ MercadoPago payment {} is {} ({status})", payment.id, payment.status);
    let mut result = ProcessorPayment::new(payment.id.to_string(), status);
    if let Some(reference) = payment.external_reference.filter(|r| !r.is_empty()) {
        result = result.with_reference(reference);
    }
    match payment.transaction_amount.map(cents_from_units) {
        Some(Ok(amount)) => result.with_amount(amount),
        Some(Err(e)) => {
            warn!("💳️ Ignoring the amount on MercadoPago payment {}. {e}", result.payment_id);
            result
        },
        None => result,
    }
}

fn gateway_error(e: MercadoPagoApiError) -> GatewayError {
    match e {
        MercadoPagoApiError::QueryError { status, .. } if !is_transient_status(status) => {
            GatewayError::Rejected(e.to_string())
        },
        MercadoPagoApiError::InvalidCurrencyAmount(_) => GatewayError::Rejected(e.to_string()),
        _ => GatewayError::Unavailable(e.to_string()),
    }
}
