use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use storefront_engine::{
    db_types::{DecisionActor, OrderStatusType},
    events::EventProducers,
    helpers::RetryPolicy,
    traits::{GatewayError, OrderStoreError, ProcessorPayment, ProcessorStatus},
    OrderFlowApi,
    WebhookApi,
};

use super::{
    helpers::{sign, webhook_request, webhook_request_with_secret, SIGNATURE_HEADER},
    mocks::{decided, order, MockBackend, MockGateway},
};
use crate::webhook_routes::PaymentWebhookRoute;

const APPROVED: &str = r#"{"type": "payment", "data": {"id": "1001"}}"#;

fn retry() -> RetryPolicy {
    RetryPolicy::new(2, Duration::ZERO, Duration::from_secs(1))
}

/// Order 1 is pending and bound to `ref-1`.
fn backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_order_by_payment_reference()
        .returning(|r| Ok((r == "ref-1").then(|| order(1, 1, OrderStatusType::Pending))));
    backend
}

fn configure_with(backend: MockBackend, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = WebhookApi::new(OrderFlowApi::new(backend, EventProducers::default()), gateway, retry());
        cfg.service(PaymentWebhookRoute::<MockBackend, MockGateway>::new()).app_data(web::Data::new(api));
    }
}

fn gateway_reporting(status: ProcessorStatus, reference: &'static str) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_payment_status()
        .returning(move |id| Ok(ProcessorPayment::new(id, status).with_reference(reference)));
    gateway
}

fn signed(body: &str) -> TestRequest {
    TestRequest::post()
        .uri("/webhooks/payment")
        .insert_header(("Content-Type", "application/json"))
        .insert_header((SIGNATURE_HEADER, sign(body)))
        .set_payload(body.to_string())
}

#[actix_web::test]
async fn approved_payment_approves_the_order() {
    let _ = env_logger::try_init().ok();
    let mut backend = backend();
    backend
        .expect_decide_order()
        .withf(|id, _, actor, _| id.value() == 1 && *actor == DecisionActor::Webhook)
        .times(1)
        .returning(|_, decision, actor, _| Ok((decided(order(1, 1, OrderStatusType::Pending), decision, actor), true)));
    let gateway = gateway_reporting(ProcessorStatus::Approved, "ref-1");
    let (status, body) = webhook_request(signed(APPROVED), configure_with(backend, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn pending_payment_is_acknowledged_without_writes() {
    let _ = env_logger::try_init().ok();
    let mut backend = backend();
    backend.expect_decide_order().times(0);
    let gateway = gateway_reporting(ProcessorStatus::Pending, "ref-1");
    let (status, _) = webhook_request(signed(APPROVED), configure_with(backend, gateway)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn payment_without_an_order_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut backend = backend();
    backend.expect_decide_order().times(0);
    let gateway = gateway_reporting(ProcessorStatus::Approved, "ref-unknown");
    let (status, _) = webhook_request(signed(APPROVED), configure_with(backend, gateway)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn malformed_notification_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment_status().times(0);
    let body = r#"{"type": "payment", "data": {}}"#;
    let (status, _) = webhook_request(signed(body), configure_with(backend(), gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment_status().times(0);
    let (status, _) = webhook_request(signed("not json"), configure_with(backend(), gateway)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn other_topics_are_ignored() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment_status().times(0);
    let body = r#"{"type": "merchant_order", "data": {"id": "55"}}"#;
    let (status, _) = webhook_request(signed(body), configure_with(backend(), gateway)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn legacy_query_notifications() {
    let _ = env_logger::try_init().ok();
    let mut backend = backend();
    backend
        .expect_decide_order()
        .times(1)
        .returning(|_, decision, actor, _| Ok((decided(order(1, 1, OrderStatusType::Pending), decision, actor), true)));
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_payment_status()
        .withf(|id| id.to_string() == "2002")
        .times(1)
        .returning(|id| Ok(ProcessorPayment::new(id, ProcessorStatus::Rejected).with_reference("ref-1")));
    let req = TestRequest::post()
        .uri("/webhooks/payment?topic=payment&id=2002")
        .insert_header((SIGNATURE_HEADER, sign("")));
    let (status, _) = webhook_request(req, configure_with(backend, gateway)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn processor_outage_asks_for_redelivery() {
    let _ = env_logger::try_init().ok();
    let mut backend = backend();
    backend.expect_decide_order().times(0);
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_payment_status()
        .times(2)
        .returning(|_| Err(GatewayError::Unavailable("503 Service Unavailable".to_string())));
    let (status, body) = webhook_request(signed(APPROVED), configure_with(backend, gateway)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn store_failure_is_a_server_error() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_order_by_payment_reference()
        .returning(|_| Err(OrderStoreError::DatabaseError("database is locked".to_string())));
    let gateway = gateway_reporting(ProcessorStatus::Approved, "ref-1");
    let (status, body) = webhook_request(signed(APPROVED), configure_with(backend, gateway)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn bad_signatures_are_refused() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment_status().times(0);
    let req = TestRequest::post()
        .uri("/webhooks/payment")
        .insert_header((SIGNATURE_HEADER, sign(r#"{"type": "payment", "data": {"id": "9999"}}"#)))
        .set_payload(APPROVED);
    let (status, _) = webhook_request(req, configure_with(backend(), gateway)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment_status().times(0);
    let req = TestRequest::post().uri("/webhooks/payment").set_payload(APPROVED);
    let (status, _) = webhook_request(req, configure_with(backend(), gateway)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unconfigured_secret_refuses_every_call() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_decide_order().times(0);
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment_status().times(0);
    let forged = crate::helpers::calculate_hmac("", APPROVED.as_bytes()).unwrap();
    let req = TestRequest::post()
        .uri("/webhooks/payment")
        .insert_header(("Content-Type", "application/json"))
        .insert_header((SIGNATURE_HEADER, forged))
        .set_payload(APPROVED);
    let (status, _) = webhook_request_with_secret("", req, configure_with(backend, gateway)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
