use chrono::{DateTime, TimeZone, Utc};
use mockall::mock;
use store_common::Cents;
use storefront_engine::{
    db_types::{Decision, DecisionActor, NewOrder, Order, OrderId, OrderStatusType, Product, Role, User},
    order_objects::OrderQueryFilter,
    traits::{
        AuthApiError,
        AuthManagement,
        CatalogError,
        CatalogManagement,
        GatewayError,
        OrderDraft,
        OrderManagement,
        OrderStoreError,
        PaymentIntent,
        PaymentIntentGateway,
        ProcessorPayment,
        StorefrontDatabase,
    },
};

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for Backend {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;
        async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, OrderStoreError>;
        async fn decide_order(
            &self,
            id: OrderId,
            decision: Decision,
            actor: DecisionActor,
            decided_at: DateTime<Utc>,
        ) -> Result<(Order, bool), OrderStoreError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;
    }
    impl CatalogManagement for Backend {
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;
    }
    impl AuthManagement for Backend {
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;
    }
    impl StorefrontDatabase for Backend {
        fn url(&self) -> &str;
        async fn close(&mut self) -> Result<(), OrderStoreError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentIntentGateway for Gateway {
        async fn create_intent(&self, draft: &OrderDraft) -> Result<PaymentIntent, GatewayError>;
        async fn fetch_payment_status(&self, payment_id: &str) -> Result<ProcessorPayment, GatewayError>;
    }
}

pub fn order(id: i64, buyer_id: i64, status: OrderStatusType) -> Order {
    Order {
        id: OrderId(id),
        buyer_id,
        product_id: 1,
        quantity: 1,
        unit_price: Cents::from(4990),
        total_price: Cents::from(4990),
        status,
        payment_reference: format!("ref-{id}"),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        decided_at: None,
        decided_by: None,
    }
}

pub fn decided(mut order: Order, decision: Decision, actor: DecisionActor) -> Order {
    order.status = decision.status();
    order.decided_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 5, 0).unwrap());
    order.decided_by = Some(actor);
    order
}

pub fn product(id: i64, price: i64, in_stock: bool) -> Product {
    Product { id, name: format!("Product {id}"), description: String::new(), price: Cents::from(price), in_stock }
}

pub fn user(id: i64, role: Role) -> User {
    User { id, email: format!("user{id}@example.com"), name: format!("User {id}"), role }
}

/// A backend that knows a buyer (#1), an admin (#7) and one product (#1).
pub fn backend_with_people() -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user().returning(|id| {
        Ok(match id {
            1 => Some(user(1, Role::User)),
            7 => Some(user(7, Role::Admin)),
            _ => None,
        })
    });
    backend.expect_fetch_product().returning(|id| Ok((id == 1).then(|| product(1, 4990, true))));
    backend
}
