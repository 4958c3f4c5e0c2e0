use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::Value;
use storefront_engine::{
    db_types::{Decision, DecisionActor, OrderStatusType, Role},
    events::EventProducers,
    traits::OrderStoreError,
    AdminApi,
    OrderFlowApi,
};

use super::{
    helpers::{api_request, issue_token},
    mocks::{backend_with_people, decided, order, MockBackend},
};
use crate::routes::{ApproveOrderRoute, RejectOrderRoute};

/// Order 1 is pending, order 2 was already approved by the processor.
fn configure(cfg: &mut ServiceConfig) {
    let mut backend = backend_with_people();
    backend.expect_decide_order().returning(|id, decision, actor, _| match id.value() {
        1 => Ok((decided(order(1, 1, OrderStatusType::Pending), decision, actor), true)),
        2 => Ok((decided(order(2, 1, OrderStatusType::Pending), Decision::Approved, DecisionActor::Webhook), false)),
        _ => Err(OrderStoreError::OrderNotFound(id)),
    });
    let api = AdminApi::new(OrderFlowApi::new(backend, EventProducers::default()));
    cfg.service(ApproveOrderRoute::<MockBackend>::new())
        .service(RejectOrderRoute::<MockBackend>::new())
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn admin_approves_pending_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, Role::Admin);
    let (status, body) = api_request(&token, TestRequest::post().uri("/api/orders/1/approve"), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "approved");
    assert_eq!(order["decidedBy"], "admin:7");
}

#[actix_web::test]
async fn admin_rejects_pending_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, Role::Admin);
    let (status, body) = api_request(&token, TestRequest::post().uri("/api/orders/1/reject"), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "rejected");
    assert_eq!(order["decidedBy"], "admin:7");
}

#[actix_web::test]
async fn late_rejection_returns_the_first_decision() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, Role::Admin);
    let (status, body) = api_request(&token, TestRequest::post().uri("/api/orders/2/reject"), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "approved");
    assert_eq!(order["decidedBy"], "webhook");
}

#[actix_web::test]
async fn buyers_cannot_decide_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, Role::User);
    let (status, _) = api_request(&token, TestRequest::post().uri("/api/orders/1/approve"), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn stale_admin_tokens_are_refused() {
    let _ = env_logger::try_init().ok();
    // User #1 is a plain buyer in the user store, whatever the token claims
    let token = issue_token(1, Role::Owner);
    let (status, body) = api_request(&token, TestRequest::post().uri("/api/orders/1/approve"), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("not allowed to administer orders"), "{body}");
}

#[actix_web::test]
async fn unknown_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, Role::Admin);
    let (status, _) = api_request(&token, TestRequest::post().uri("/api/orders/99/approve"), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
