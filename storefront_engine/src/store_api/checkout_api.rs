use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    db_types::NewOrder,
    events::{EventProducers, OrderCreatedEvent},
    helpers::with_timeout,
    store_api::{
        errors::OrderFlowError,
        order_objects::{CheckoutRequest, CheckoutResult},
    },
    traits::{CatalogManagement, OrderDraft, OrderManagement, PaymentIntentGateway},
};

/// Creates payment intents for buyers, and the pending orders bound to them.
///
/// The price is read from the catalogue when the intent is created and copied onto the order, so the amount the buyer
/// is asked to pay and the amount recorded on the order always agree. The order is only stored once the processor
/// has accepted the intent, so every stored order carries a payment reference.
pub struct CheckoutApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    timeout: Duration,
}

impl<B, G> Debug for CheckoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi (timeout: {}ms)", self.timeout.as_millis())
    }
}

impl<B, G> CheckoutApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers, timeout: Duration) -> Self {
        Self { db, gateway, producers, timeout }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> CheckoutApi<B, G>
where
    B: OrderManagement + CatalogManagement,
    G: PaymentIntentGateway,
{
    pub async fn create_intent(&self, buyer_id: i64, request: CheckoutRequest) -> Result<CheckoutResult, OrderFlowError> {
        let CheckoutRequest { product_id, quantity } = request;
        if quantity < 1 {
            return Err(OrderFlowError::InvalidRequest(format!("quantity must be at least 1, not {quantity}")));
        }
        let product =
            self.db.fetch_product(product_id).await?.ok_or(OrderFlowError::ProductNotFound(product_id))?;
        if !product.in_stock {
            debug!("🛒️ User #{buyer_id} tried to buy product #{product_id}, which is out of stock");
            return Err(OrderFlowError::ProductUnavailable(product_id));
        }
        let total_price = product
            .price
            .checked_mul(quantity)
            .ok_or_else(|| OrderFlowError::InvalidRequest(format!("quantity {quantity} is too large")))?;
        let draft = OrderDraft {
            buyer_id,
            product_id,
            title: product.name.clone(),
            unit_price: product.price,
            quantity,
            total_price,
        };
        trace!("🛒️ Requesting payment intent for {draft:?}");
        let intent = with_timeout(self.timeout, self.gateway.create_intent(&draft)).await.map_err(|e| {
            warn!("🛒️ Could not create payment intent for user #{buyer_id}, product #{product_id}: {e}");
            OrderFlowError::from(e)
        })?;
        let new_order = NewOrder::new(buyer_id, &product, quantity, intent.reference.clone())
            .ok_or_else(|| OrderFlowError::InvalidRequest(format!("quantity {quantity} is too large")))?;
        let order = self.db.insert_order(new_order).await?;
        info!(
            "🛒️ Order {} created for user #{buyer_id}: {quantity} x {} = {}. Reference {}",
            order.id, product.name, order.total_price, order.payment_reference
        );
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        Ok(CheckoutResult {
            order_id: order.id.value(),
            external_reference: order.payment_reference,
            redirect_targets: intent.redirect_targets,
        })
    }
}
