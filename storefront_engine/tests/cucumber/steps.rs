use cucumber::{given, then, when};
use storefront_engine::{
    db_types::{Cents, DecisionActor, OrderStatusType, Role},
    order_objects::{CheckoutRequest, OrderQueryFilter},
    traits::{ProcessorPayment, ProcessorStatus},
    OrderFlowError,
    OrderManagement,
    ReconcileOutcome,
};

use crate::{
    cucumber::StorefrontWorld,
    support::seed::{seed_product, seed_sold_out_product, seed_user},
};

fn parse_role(role: &str) -> Role {
    match role {
        "buyer" | "user" => Role::User,
        "admin" => Role::Admin,
        "sub-owner" => Role::SubOwner,
        "owner" => Role::Owner,
        _ => panic!("Unknown role {role}"),
    }
}

fn parse_status(status: &str) -> ProcessorStatus {
    match status {
        "approved" => ProcessorStatus::Approved,
        "rejected" => ProcessorStatus::Rejected,
        "pending" => ProcessorStatus::Pending,
        _ => ProcessorStatus::Unknown,
    }
}

#[given(expr = "a(n) {word} named '{word}'")]
async fn user_with_role(world: &mut StorefrontWorld, role: String, name: String) {
    let system = world.system_mut();
    let user = seed_user(&system.db, &name, parse_role(&role)).await;
    system.users.insert(name, user);
}

#[given(expr = "a product '{word}' priced at {int} cents")]
async fn product(world: &mut StorefrontWorld, name: String, price: i64) {
    let system = world.system_mut();
    let product = seed_product(&system.db, &name, price).await;
    system.products.insert(name, product);
}

#[given(expr = "a sold out product '{word}' priced at {int} cents")]
async fn sold_out_product(world: &mut StorefrontWorld, name: String, price: i64) {
    let system = world.system_mut();
    let product = seed_sold_out_product(&system.db, &name, price).await;
    system.products.insert(name, product);
}

#[given("the payment processor is offline")]
async fn processor_offline(world: &mut StorefrontWorld) {
    world.system().processor.set_offline(true);
}

#[when(expr = "'{word}' buys {int} x '{word}' as order {word}")]
async fn checkout(world: &mut StorefrontWorld, buyer: String, quantity: i64, product: String, label: String) {
    let system = world.system_mut();
    let request = CheckoutRequest { product_id: system.product(&product).id, quantity };
    let buyer_id = system.user(&buyer).id;
    let result = system.checkout.create_intent(buyer_id, request).await.expect("Checkout failed");
    let order = system
        .db
        .fetch_order_by_payment_reference(&result.external_reference)
        .await
        .expect("Error fetching order")
        .expect("Checkout did not store an order");
    system.orders.insert(label, order);
}

#[when(expr = "'{word}' tries to buy {int} x '{word}', which fails with {word}")]
async fn failed_checkout(world: &mut StorefrontWorld, buyer: String, quantity: i64, product: String, error: String) {
    let system = world.system();
    let request = CheckoutRequest { product_id: system.product(&product).id, quantity };
    let err = system.checkout.create_intent(system.user(&buyer).id, request).await.expect_err("Checkout succeeded");
    assert_eq!(error_name(&err), error, "Unexpected error: {err}");
}

#[when(expr = "the processor marks payment {word} for order {word} as {word}")]
async fn processor_payment(world: &mut StorefrontWorld, payment_id: String, label: String, status: String) {
    let system = world.system();
    let order = system.order(&label);
    let payment = ProcessorPayment::new(payment_id, parse_status(&status))
        .with_reference(order.payment_reference.clone())
        .with_amount(order.total_price);
    system.processor.set_payment(payment);
}

#[when(expr = "the processor marks payment {word} for reference '{word}' as {word}")]
async fn stray_payment(world: &mut StorefrontWorld, payment_id: String, reference: String, status: String) {
    let payment = ProcessorPayment::new(payment_id, parse_status(&status)).with_reference(reference);
    world.system().processor.set_payment(payment);
}

#[when(expr = "the processor notifies us about payment {word}")]
async fn notify(world: &mut StorefrontWorld, payment_id: String) {
    let body = format!(r#"{{"type":"payment","data":{{"id":"{payment_id}"}}}}"#);
    let system = world.system_mut();
    let outcome = system.webhooks.reconcile_json(body.as_bytes()).await;
    system.last_outcome = Some(outcome);
}

#[when(expr = "the processor sends the notification {string}")]
async fn raw_notification(world: &mut StorefrontWorld, body: String) {
    let system = world.system_mut();
    let outcome = system.webhooks.reconcile_json(body.as_bytes()).await;
    system.last_outcome = Some(outcome);
}

#[when(regex = r"^admin '(\w+)' (approves|rejects) order (\w+)$")]
async fn admin_decides(world: &mut StorefrontWorld, admin: String, action: String, label: String) {
    let system = world.system();
    let order_id = system.order(&label).id;
    let admin_id = system.user(&admin).id;
    let result = match action.as_str() {
        "approves" => system.admin.approve(order_id, admin_id).await,
        _ => system.admin.reject(order_id, admin_id).await,
    };
    result.expect("Admin decision failed");
}

#[when(regex = r"^'(\w+)' tries to (approve|reject) order (\w+)$")]
async fn unauthorised_decision(world: &mut StorefrontWorld, user: String, action: String, label: String) {
    let system = world.system();
    let order_id = system.order(&label).id;
    let user_id = system.user(&user).id;
    let result = match action.as_str() {
        "approve" => system.admin.approve(order_id, user_id).await,
        _ => system.admin.reject(order_id, user_id).await,
    };
    assert!(matches!(result, Err(OrderFlowError::Unauthorized(id)) if id == user_id), "Expected refusal: {result:?}");
}

#[then(expr = "order {word} is {word}")]
async fn order_status(world: &mut StorefrontWorld, label: String, status: String) {
    let system = world.system();
    let order = system.db.fetch_order(system.order(&label).id).await.expect("Error fetching order").expect("No order");
    let expected = status.parse::<OrderStatusType>().expect("Not an order status");
    assert_eq!(order.status, expected);
    assert_eq!(order.decided_at.is_some(), expected != OrderStatusType::Pending, "decided_at disagrees with status");
}

#[then(expr = "order {word} was decided by {word}")]
async fn decided_by(world: &mut StorefrontWorld, label: String, actor: String) {
    let system = world.system();
    let order = system.db.fetch_order(system.order(&label).id).await.expect("Error fetching order").expect("No order");
    let expected = match actor.as_str() {
        "webhook" => DecisionActor::Webhook,
        name => DecisionActor::Admin(system.user(name).id),
    };
    assert_eq!(order.decided_by, Some(expected));
}

#[then(expr = "order {word} costs {int} cents")]
async fn order_total(world: &mut StorefrontWorld, label: String, total: i64) {
    assert_eq!(world.system().order(&label).total_price, Cents::from(total));
}

#[then(expr = "the notification result is {word}")]
async fn notification_result(world: &mut StorefrontWorld, expected: String) {
    let outcome = world.system().last_outcome.as_ref().expect("No notification was sent");
    let name = match outcome {
        Ok(ReconcileOutcome::Ignored) => "ignored".to_string(),
        Ok(ReconcileOutcome::NoAction(_)) => "no-action".to_string(),
        Ok(ReconcileOutcome::Decided(_)) => "decided".to_string(),
        Ok(ReconcileOutcome::AlreadyDecided(_)) => "already-decided".to_string(),
        Err(e) => error_name(e).to_string(),
    };
    assert_eq!(name, expected, "Unexpected outcome: {outcome:?}");
}

#[then(expr = "there are {int} orders")]
async fn order_count(world: &mut StorefrontWorld, count: usize) {
    let orders = world.system().db.search_orders(OrderQueryFilter::default()).await.expect("Error searching orders");
    assert_eq!(orders.len(), count);
}

fn error_name(e: &OrderFlowError) -> &'static str {
    match e {
        OrderFlowError::GatewayUnavailable(_) => "gateway-unavailable",
        OrderFlowError::GatewayRejected(_) => "gateway-rejected",
        OrderFlowError::MalformedNotification(_) => "malformed",
        OrderFlowError::OrderNotFound(_) => "order-not-found",
        OrderFlowError::Unauthorized(_) => "unauthorized",
        OrderFlowError::ProductNotFound(_) => "product-not-found",
        OrderFlowError::ProductUnavailable(_) => "product-unavailable",
        OrderFlowError::InvalidRequest(_) => "invalid-request",
        OrderFlowError::DatabaseError(_) => "database-error",
    }
}
