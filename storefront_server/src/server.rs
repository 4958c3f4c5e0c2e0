use std::{future::ready, time::Duration};

use actix_web::{dev::Service, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::future::Either;
use log::*;
use mercadopago_tools::MercadoPagoApi;
use storefront_engine::{
    events::{EventHandlers, EventHooks, EventProducers, OrderCreatedEvent, OrderDecidedEvent},
    AccountApi,
    AdminApi,
    CheckoutApi,
    OrderFlowApi,
    SqliteDatabase,
    WebhookApi,
};

use crate::{
    auth::TokenValidator,
    config::{ServerConfig, ServerOptions},
    errors::{AuthError, ServerError},
    helpers::is_whitelisted,
    integrations::mercadopago::MercadoPagoGateway,
    middleware::{HmacMiddlewareFactory, JwtMiddlewareFactory},
    routes::{
        health,
        ApproveOrderRoute,
        CheckTokenRoute,
        CheckoutRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        OrdersRoute,
        RejectOrderRoute,
    },
    webhook_routes::PaymentWebhookRoute,
};

pub const EVENT_BUFFER_SIZE: usize = 25;
pub const AUDIT_LOG_TARGET: &str = "storefront::audit";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if !config.mercadopago.is_configured() {
        warn!("💳️ No MercadoPago access token is configured. Checkout will report payments as unavailable.");
    }
    let api = MercadoPagoApi::new(config.mercadopago.clone())
        .map_err(|e| ServerError::InitializeError(format!("Could not create the MercadoPago client. {e}")))?;
    let gateway = MercadoPagoGateway::new(api, config.app_url.as_str());
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, audit_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks that write every order creation and decision to the audit log target.
pub fn audit_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_created(|ev: OrderCreatedEvent| {
        Box::pin(async move {
            let o = ev.order;
            info!(
                target: AUDIT_LOG_TARGET,
                "Order {} created for user #{}: {} x product #{} for {} ({})",
                o.id, o.buyer_id, o.quantity, o.product_id, o.total_price, o.payment_reference
            );
        })
    });
    hooks.on_order_decided(|ev: OrderDecidedEvent| {
        Box::pin(async move {
            let o = ev.order;
            let by = o.decided_by.map(|a| a.to_string()).unwrap_or_default();
            info!(target: AUDIT_LOG_TARGET, "Order {} {} by {by} ({})", o.id, o.status, o.payment_reference);
        })
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: MercadoPagoGateway,
    producers: EventProducers,
) -> Result<actix_web::dev::Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let flow = OrderFlowApi::new(db.clone(), producers.clone());
        let checkout_api = CheckoutApi::new(db.clone(), gateway.clone(), producers.clone(), config.gateway.timeout);
        let webhook_api = WebhookApi::new(flow.clone(), gateway.clone(), config.gateway.retry_policy());
        let admin_api = AdminApi::new(flow);
        let accounts_api = AccountApi::new(db.clone());
        let validator = TokenValidator::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("storefront::access_log"))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(webhook_api))
            .app_data(web::Data::new(admin_api))
            .app_data(web::Data::new(accounts_api));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(validator))
            .service(CheckoutRoute::<SqliteDatabase, MercadoPagoGateway>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(ApproveOrderRoute::<SqliteDatabase>::new())
            .service(RejectOrderRoute::<SqliteDatabase>::new())
            .service(CheckTokenRoute::new());
        let options = ServerOptions::from_config(&config);
        let whitelist = config.webhook.whitelist.clone();
        let hmac = HmacMiddlewareFactory::new(
            &config.webhook.hmac_header,
            config.webhook.hmac_secret.clone(),
            config.webhook.hmac_checks,
        );
        // The peer check wraps the HMAC check, so it runs first
        let webhook_scope = web::scope("/webhooks")
            .wrap(hmac)
            .wrap_fn(move |req, srv| {
                if is_whitelisted(req.request(), whitelist.as_deref(), options) {
                    Either::Left(srv.call(req))
                } else {
                    Either::Right(ready(Err(ServerError::AuthenticationError(AuthError::ForbiddenPeer).into())))
                }
            })
            .service(PaymentWebhookRoute::<SqliteDatabase, MercadoPagoGateway>::new());
        app.service(health).service(auth_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
