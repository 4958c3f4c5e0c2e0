//! The processor's delivery guarantees are at-least-once and unordered, so every notification is reconciled from
//! scratch against the processor's current view of the payment. The response code is the only thing the sender ever
//! sees, and it decides whether the processor delivers again:
//! * 200 when the notification was handled, was a no-op, was about something else, or can never be handled
//!   (malformed, for a payment that matches no order, or refused by the processor). Redelivering these would not
//!   help.
//! * 503 when the processor itself could not be reached to confirm the payment. A later delivery may succeed.
//! * 500 when our own store failed.

use std::collections::HashMap;

use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use storefront_engine::{
    traits::{PaymentIntentGateway, StorefrontDatabase},
    Notification,
    OrderFlowError,
    ReconcileOutcome,
    WebhookApi,
};

use crate::route;

//----------------------------------------------   Payment webhooks  ---------------------------------------------
route!(payment_webhook => Post "/payment" impl StorefrontDatabase, PaymentIntentGateway);
pub async fn payment_webhook<B, G>(req: HttpRequest, body: web::Bytes, api: web::Data<WebhookApi<B, G>>) -> HttpResponse
where
    B: StorefrontDatabase,
    G: PaymentIntentGateway,
{
    trace!("🪝️ Received payment notification: {}", req.uri());
    let result = match query_notification(&req) {
        Some(notification) => match notification {
            Ok(n) => api.reconcile(&n).await,
            Err(e) => Err(e),
        },
        None => api.reconcile_json(body.as_ref()).await,
    };
    match result {
        Ok(ReconcileOutcome::Decided(order)) => {
            info!("🪝️ Order {} is now {} ({})", order.id, order.status, order.payment_reference);
            HttpResponse::Ok().finish()
        },
        Ok(ReconcileOutcome::AlreadyDecided(order)) => {
            debug!("🪝️ Order {} was already {}. Nothing to do.", order.id, order.status);
            HttpResponse::Ok().finish()
        },
        Ok(ReconcileOutcome::NoAction(status)) => {
            debug!("🪝️ Payment is {status}. Waiting for a later notification.");
            HttpResponse::Ok().finish()
        },
        Ok(ReconcileOutcome::Ignored) => HttpResponse::Ok().finish(),
        Err(OrderFlowError::MalformedNotification(reason)) => {
            warn!("🪝️ Discarding malformed payment notification. {reason}");
            HttpResponse::Ok().finish()
        },
        Err(OrderFlowError::OrderNotFound(lookup)) => {
            error!("🪝️ Payment notification matches no order ({lookup}). Discarding it.");
            HttpResponse::Ok().finish()
        },
        Err(OrderFlowError::GatewayUnavailable(e)) => {
            warn!("🪝️ Could not confirm payment with the processor. Asking for redelivery. {e}");
            HttpResponse::ServiceUnavailable().finish()
        },
        Err(OrderFlowError::GatewayRejected(e)) => {
            error!("🪝️ The processor refused the payment lookup. Discarding the notification. {e}");
            HttpResponse::Ok().finish()
        },
        Err(e) => {
            error!("🪝️ Could not reconcile payment notification. {e}");
            HttpResponse::InternalServerError().finish()
        },
    }
}

/// The legacy notification form carries everything in the query string and has an empty body.
fn query_notification(req: &HttpRequest) -> Option<Result<Notification, OrderFlowError>> {
    let query = web::Query::<HashMap<String, String>>::from_query(req.query_string()).ok()?.into_inner();
    if query.contains_key("topic") || query.contains_key("type") {
        Some(Notification::from_query(&query))
    } else {
        None
    }
}
