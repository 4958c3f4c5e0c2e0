use std::collections::HashMap;

use mockall::mock;
use storefront_engine::traits::{
    GatewayError,
    OrderDraft,
    PaymentIntent,
    PaymentIntentGateway,
    ProcessorPayment,
    ProcessorStatus,
};

mock! {
    pub Gateway {}
    impl PaymentIntentGateway for Gateway {
        async fn create_intent(&self, draft: &OrderDraft) -> Result<PaymentIntent, GatewayError>;
        async fn fetch_payment_status(&self, payment_id: &str) -> Result<ProcessorPayment, GatewayError>;
    }
}

/// A gateway that reports fixed payment states. Unknown payment ids are reported as `unknown`.
pub fn gateway_with_payments(payments: Vec<ProcessorPayment>) -> MockGateway {
    let payments = payments.into_iter().map(|p| (p.payment_id.clone(), p)).collect::<HashMap<_, _>>();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment_status().returning(move |id| {
        Ok(payments.get(id).cloned().unwrap_or_else(|| ProcessorPayment::new(id, ProcessorStatus::Unknown)))
    });
    gateway
}

pub fn payment(id: &str, status: ProcessorStatus, reference: &str) -> ProcessorPayment {
    ProcessorPayment::new(id, status).with_reference(reference)
}
