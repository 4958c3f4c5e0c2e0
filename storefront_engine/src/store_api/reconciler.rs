use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Decision, DecisionActor, Order},
    helpers::RetryPolicy,
    store_api::{
        errors::{OrderFlowError, OrderLookup},
        notification::Notification,
        order_flow_api::{DecisionOutcome, OrderFlowApi},
    },
    traits::{OrderManagement, PaymentIntentGateway, ProcessorStatus},
};

/// What a reconciliation pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The notification was not about a payment.
    Ignored,
    /// The processor has not settled the payment yet. Nothing was written.
    NoAction(ProcessorStatus),
    /// This notification closed the order.
    Decided(Order),
    /// The order had already been closed, by an earlier notification or by an admin.
    AlreadyDecided(Order),
}

/// `WebhookApi` reconciles processor notifications with orders.
///
/// Each notification is handled on its own, with no memory of earlier ones: the processor is asked for the current
/// payment status, the payment is resolved to an order by its intent reference, and settled payments are passed to
/// the lifecycle engine with the `webhook` actor. Duplicate or out-of-order deliveries therefore settle into the same
/// state.
pub struct WebhookApi<B, G> {
    flow: OrderFlowApi<B>,
    gateway: G,
    retry: RetryPolicy,
}

impl<B, G> Debug for WebhookApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhookApi ({:?})", self.retry)
    }
}

impl<B, G> WebhookApi<B, G> {
    pub fn new(flow: OrderFlowApi<B>, gateway: G, retry: RetryPolicy) -> Self {
        Self { flow, gateway, retry }
    }

    pub fn flow(&self) -> &OrderFlowApi<B> {
        &self.flow
    }
}

impl<B, G> WebhookApi<B, G>
where
    B: OrderManagement,
    G: PaymentIntentGateway,
{
    /// Parses a raw JSON notification body and reconciles it.
    pub async fn reconcile_json(&self, body: &[u8]) -> Result<ReconcileOutcome, OrderFlowError> {
        let notification = Notification::from_json(body)?;
        self.reconcile(&notification).await
    }

    pub async fn reconcile(&self, notification: &Notification) -> Result<ReconcileOutcome, OrderFlowError> {
        match notification {
            Notification::Ignored { topic } => {
                debug!("🪝️ Ignoring notification about {topic}");
                Ok(ReconcileOutcome::Ignored)
            },
            Notification::Payment { payment_id } => self.reconcile_payment(payment_id).await,
        }
    }

    pub async fn reconcile_payment(&self, payment_id: &str) -> Result<ReconcileOutcome, OrderFlowError> {
        let label = format!("Status lookup for payment {payment_id}");
        let payment = self.retry.run(&label, || self.gateway.fetch_payment_status(payment_id)).await?;
        let decision = match payment.status {
            ProcessorStatus::Approved => Decision::Approved,
            ProcessorStatus::Rejected => Decision::Rejected,
            status => {
                debug!("🪝️ Payment {payment_id} is {status}. No action taken.");
                return Ok(ReconcileOutcome::NoAction(status));
            },
        };
        let reference = payment.reference.as_deref().filter(|r| !r.is_empty()).ok_or_else(|| {
            error!("🪝️ Payment {payment_id} is {} but carries no intent reference", payment.status);
            OrderFlowError::OrderNotFound(OrderLookup::Payment(payment_id.to_string()))
        })?;
        let order = self.flow.fetch_order_by_payment_reference(reference).await.map_err(|e| {
            if matches!(e, OrderFlowError::OrderNotFound(_)) {
                error!("🪝️ Payment {payment_id} is {} but no order has reference {reference}", payment.status);
            }
            e
        })?;
        if let Some(amount) = payment.amount.filter(|a| *a != order.total_price) {
            error!(
                "🪝️ Payment {payment_id} for order {} was for {amount}, but the order total is {}",
                order.id, order.total_price
            );
        }
        let outcome = match self.flow.decide(order.id, decision, DecisionActor::Webhook).await? {
            DecisionOutcome::Applied(order) => ReconcileOutcome::Decided(order),
            DecisionOutcome::Unchanged(order) => ReconcileOutcome::AlreadyDecided(order),
        };
        Ok(outcome)
    }
}
