use actix_web::{
    body::to_bytes,
    dev::ServiceResponse,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
    HttpResponse,
};
use chrono::Duration;
use storefront_engine::db_types::Role;

use crate::{
    auth::{JwtClaims, TokenIssuer, TokenValidator, ACCESS_TOKEN_HEADER},
    config::AuthConfig,
    middleware::{HmacMiddlewareFactory, JwtMiddlewareFactory},
};

pub const WEBHOOK_SECRET: &str = "webhook-test-secret";
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("endpoint-tests-only-0123456789abcdef")
}

pub fn issue_token(user_id: i64, role: Role) -> String {
    let claims = JwtClaims::new(user_id, role, Duration::hours(1));
    TokenIssuer::new(&get_auth_config()).issue_token(&claims).expect("Failed to sign token")
}

/// Sends a request to an `/api` scope guarded by the JWT middleware.
pub async fn api_request<F>(token: &str, req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = req;
    if !token.is_empty() {
        req = req.insert_header((ACCESS_TOKEN_HEADER, token));
    }
    let validator = TokenValidator::new(&get_auth_config());
    let app = App::new().service(web::scope("/api").wrap(JwtMiddlewareFactory::new(validator)).configure(configure));
    let service = test::init_service(app).await;
    read_response(test::try_call_service(&service, req.to_request()).await).await
}

/// Sends a request to a `/webhooks` scope guarded by the HMAC middleware.
pub async fn webhook_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    webhook_request_with_secret(WEBHOOK_SECRET, req, configure).await
}

/// As [`webhook_request`], with the middleware keyed by `secret`.
pub async fn webhook_request_with_secret<F>(secret: &str, req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let hmac = HmacMiddlewareFactory::new(SIGNATURE_HEADER, secret.to_string().into(), true);
    let app = App::new().service(web::scope("/webhooks").wrap(hmac).configure(configure));
    let service = test::init_service(app).await;
    read_response(test::try_call_service(&service, req.to_request()).await).await
}

async fn read_response(res: Result<ServiceResponse, actix_web::Error>) -> (StatusCode, String) {
    let res = match res {
        Ok(res) => res.into_parts().1,
        Err(e) => HttpResponse::from_error(e),
    };
    let status = res.status();
    let body = to_bytes(res.into_body()).await.map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
    (status, body)
}

pub fn sign(body: &str) -> String {
    crate::helpers::calculate_hmac(WEBHOOK_SECRET, body.as_bytes()).unwrap()
}
