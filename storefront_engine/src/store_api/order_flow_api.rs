use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Decision, DecisionActor, Order, OrderId},
    events::{EventProducers, OrderDecidedEvent},
    store_api::errors::{OrderFlowError, OrderLookup},
    traits::OrderManagement,
};

/// The result of asking for a decision on an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// The order was pending and this call closed it.
    Applied(Order),
    /// The order was already closed. It is returned exactly as stored.
    Unchanged(Order),
}

impl DecisionOutcome {
    pub fn order(&self) -> &Order {
        match self {
            DecisionOutcome::Applied(o) | DecisionOutcome::Unchanged(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            DecisionOutcome::Applied(o) | DecisionOutcome::Unchanged(o) => o,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, DecisionOutcome::Applied(_))
    }
}

/// `OrderFlowApi` is the order lifecycle engine.
///
/// Orders start out `pending`. Exactly one decision moves them to `approved` or `rejected`, after which they never
/// change again.
///
/// ```text
///            approve           ┌──────────┐
///       ┌─────────────────────►│ Approved │
///  ┌────┴────┐                 └──────────┘
///  │ Pending │
///  └────┬────┘                 ┌──────────┐
///       └─────────────────────►│ Rejected │
///            reject            └──────────┘
/// ```
///
/// Webhooks and admins race through the same [`Self::apply_decision`] call. The first writer wins, later callers
/// get the winner's record back.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone> Clone for OrderFlowApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn producers(&self) -> &EventProducers {
        &self.producers
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Closes the order with `decision`, recording `actor` and the current time.
    ///
    /// * pending orders are closed and the updated order is returned.
    /// * terminal orders are returned unchanged, even if `decision` disagrees with the stored status.
    /// * unknown ids fail with [`OrderFlowError::OrderNotFound`] and nothing is written.
    pub async fn apply_decision(
        &self,
        order_id: OrderId,
        decision: Decision,
        actor: DecisionActor,
    ) -> Result<Order, OrderFlowError> {
        self.decide(order_id, decision, actor).await.map(DecisionOutcome::into_order)
    }

    /// As [`Self::apply_decision`], but also reports whether this call was the one that closed the order.
    pub async fn decide(
        &self,
        order_id: OrderId,
        decision: Decision,
        actor: DecisionActor,
    ) -> Result<DecisionOutcome, OrderFlowError> {
        trace!("🔄️ {actor} requests {decision} for order {order_id}");
        let (order, applied) = self.db.decide_order(order_id, decision, actor, Utc::now()).await?;
        if applied {
            info!("🔄️ Order {order_id} {} by {actor}", order.status);
            self.producers.publish_order_decided(OrderDecidedEvent::new(order.clone())).await;
            Ok(DecisionOutcome::Applied(order))
        } else {
            let prior = order.decided_by.map(|a| a.to_string()).unwrap_or_default();
            if order.status == decision.status() {
                debug!("🔄️ Order {order_id} was already {} by {prior}. Nothing to do.", order.status);
            } else {
                warn!(
                    "🔄️ {actor} tried to mark order {order_id} as {decision}, but it was already {} by {prior}. The \
                     first decision stands.",
                    order.status
                );
            }
            Ok(DecisionOutcome::Unchanged(order))
        }
    }

    pub async fn fetch_order(&self, order_id: OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(OrderLookup::Id(order_id)))
    }

    pub async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Order, OrderFlowError> {
        self.db
            .fetch_order_by_payment_reference(reference)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(OrderLookup::PaymentReference(reference.to_string())))
    }
}
