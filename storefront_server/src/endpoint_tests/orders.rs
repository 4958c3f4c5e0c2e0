use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::Value;
use storefront_engine::{
    db_types::{OrderStatusType, Role},
    AccountApi,
};

use super::{
    helpers::{api_request, issue_token},
    mocks::{backend_with_people, order, MockBackend},
};
use crate::routes::{CheckTokenRoute, MyOrdersRoute, OrderByIdRoute, OrdersRoute};

fn configure(cfg: &mut ServiceConfig) {
    let mut backend = backend_with_people();
    backend.expect_search_orders().returning(|filter| {
        let orders = vec![order(1, 1, OrderStatusType::Pending), order(2, 1, OrderStatusType::Approved)];
        Ok(orders.into_iter().filter(|o| filter.buyer_id.map(|b| b == o.buyer_id).unwrap_or(true)).collect())
    });
    backend.expect_fetch_order().returning(|id| Ok((id.value() == 1).then(|| order(1, 1, OrderStatusType::Pending))));
    let api = AccountApi::new(backend);
    cfg.service(MyOrdersRoute::<MockBackend>::new())
        .service(OrdersRoute::<MockBackend>::new())
        .service(OrderByIdRoute::<MockBackend>::new())
        .service(CheckTokenRoute::new())
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn fetch_my_orders_no_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = api_request("", TestRequest::get().uri("/api/my_orders"), configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token"), "{body}");
}

#[actix_web::test]
async fn fetch_my_orders_invalid_token() {
    let _ = env_logger::try_init().ok();
    let mut token = issue_token(1, Role::User);
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    let (status, _) = api_request(&token, TestRequest::get().uri("/api/my_orders"), configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, Role::User);
    let (status, body) = api_request(&token, TestRequest::get().uri("/api/my_orders"), configure).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Value = serde_json::from_str(&body).unwrap();
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], 1);
    assert_eq!(orders[0]["status"], "pending");
    assert_eq!(orders[0]["paymentReference"], "ref-1");
    assert_eq!(orders[0]["product"]["name"], "Product 1");
    assert_eq!(orders[0]["buyer"]["email"], "user1@example.com");
    assert_eq!(orders[1]["status"], "approved");
}

#[actix_web::test]
async fn buyers_cannot_list_all_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, Role::User);
    let (status, body) = api_request(&token, TestRequest::get().uri("/api/orders"), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Insufficient Permissions"), "{body}");
    let (status, _) = api_request(&token, TestRequest::get().uri("/api/orders/1"), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admins_list_orders_with_filters() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, Role::Admin);
    let req = TestRequest::get().uri("/api/orders?status=pending,approved&buyer_id=1");
    let (status, body) = api_request(&token, req, configure).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.as_array().unwrap().len(), 2);

    let req = TestRequest::get().uri("/api/orders?buyer_id=99");
    let (status, body) = api_request(&token, req, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn invalid_status_filter() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, Role::Owner);
    let req = TestRequest::get().uri("/api/orders?status=shipped");
    let (status, body) = api_request(&token, req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid order status"), "{body}");
}

#[actix_web::test]
async fn order_by_id() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, Role::SubOwner);
    let (status, body) = api_request(&token, TestRequest::get().uri("/api/orders/1"), configure).await;
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["id"], 1);
    assert_eq!(order["totalPrice"], 4990);
    assert_eq!(order["decidedBy"], Value::Null);

    let (status, body) = api_request(&token, TestRequest::get().uri("/api/orders/42"), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No order found for order 42"), "{body}");
}

#[actix_web::test]
async fn check_token() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, Role::Admin);
    let (status, body) = api_request(&token, TestRequest::get().uri("/api/check_token"), configure).await;
    assert_eq!(status, StatusCode::OK);
    let claims: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(claims["sub"], 7);
    assert_eq!(claims["role"], "admin");
}
