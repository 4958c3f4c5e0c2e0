use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Decision, DecisionActor, Order, OrderId},
    store_api::{errors::OrderFlowError, order_flow_api::OrderFlowApi},
    traits::{AuthManagement, OrderManagement},
};

/// Manual approval and rejection of orders by elevated users.
///
/// The caller's role is re-checked against the user store on every call, so a user who has lost their role cannot
/// keep deciding orders with a token issued earlier.
pub struct AdminApi<B> {
    flow: OrderFlowApi<B>,
}

impl<B> Debug for AdminApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminApi")
    }
}

impl<B> AdminApi<B> {
    pub fn new(flow: OrderFlowApi<B>) -> Self {
        Self { flow }
    }
}

impl<B> AdminApi<B>
where B: OrderManagement + AuthManagement
{
    pub async fn approve(&self, order_id: OrderId, admin_id: i64) -> Result<Order, OrderFlowError> {
        self.decide(order_id, Decision::Approved, admin_id).await
    }

    pub async fn reject(&self, order_id: OrderId, admin_id: i64) -> Result<Order, OrderFlowError> {
        self.decide(order_id, Decision::Rejected, admin_id).await
    }

    async fn decide(&self, order_id: OrderId, decision: Decision, admin_id: i64) -> Result<Order, OrderFlowError> {
        if !self.flow.db().has_elevated_role(admin_id).await? {
            warn!("🔐️ User #{admin_id} tried to mark order {order_id} as {decision} without an elevated role");
            return Err(OrderFlowError::Unauthorized(admin_id));
        }
        self.flow.apply_decision(order_id, decision, DecisionActor::Admin(admin_id)).await
    }
}
