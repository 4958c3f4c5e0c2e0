//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, payment processor calls, etc.)
//! should be expressed as futures or asynchronous functions. Async handlers get executed concurrently by worker
//! threads and thus don't block execution.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use storefront_engine::{
    db_types::{OrderId, Role},
    order_objects::{CheckoutRequest, OrderQueryFilter},
    traits::{PaymentIntentGateway, StorefrontDatabase},
    AccountApi,
    AdminApi,
    CheckoutApi,
};

use crate::{auth::JwtClaims, data_objects::OrderListParams, errors::ServerError};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl StorefrontDatabase, PaymentIntentGateway);
/// Route handler for the checkout endpoint
///
/// The buyer is the user in the access token. The body names the product and quantity only:
/// ```json
/// { "productId": 12, "quantity": 2 }
/// ```
/// The price is read from the catalogue and captured on the order. On success, the response carries the new order
/// id, the reference shared with the payment processor, and the URLs the buyer should be sent to:
/// ```json
/// { "orderId": 5, "externalReference": "…", "redirectTargets": { "checkoutUrl": "…", "successUrl": "…",
///   "failureUrl": "…" } }
/// ```
/// If the processor cannot be used, no order is created and the buyer receives a 503 with a generic message.
pub async fn checkout<B, G>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    G: PaymentIntentGateway,
{
    let request = body.into_inner();
    debug!("💻️ POST checkout for user #{}: {} x product #{}", claims.sub, request.quantity, request.product_id);
    let result = api.create_intent(claims.sub, request).await?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/my_orders" impl StorefrontDatabase);
/// Route handler for the my_orders endpoint
///
/// Authenticated users can fetch their own orders using this endpoint. The user id is taken from the access token.
pub async fn my_orders<B: StorefrontDatabase>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for user #{}", claims.sub);
    let orders = api.orders_for_buyer(claims.sub).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(orders => Get "/orders" impl StorefrontDatabase where requires [Role::Admin, Role::SubOwner, Role::Owner]);
/// Route handler for the order listing endpoint
///
/// Lists orders joined with product and buyer summaries, oldest first. Optional filters:
/// * `status`: comma separated, e.g. `pending,approved`
/// * `buyer_id`, `product_id`
/// * `since`, `until`: RFC 3339 timestamps on the creation time
pub async fn orders<B: StorefrontDatabase>(
    query: web::Query<OrderListParams>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = OrderQueryFilter::try_from(query.into_inner())?;
    debug!("💻️ GET orders: {filter}");
    let orders = api.list_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl StorefrontDatabase where requires [Role::Admin, Role::SubOwner, Role::Owner]);
pub async fn order_by_id<B: StorefrontDatabase>(
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    debug!("💻️ GET order {order_id}");
    let order = api.order_details(order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Admin decisions  ----------------------------------------------
route!(approve_order => Post "/orders/{id}/approve" impl StorefrontDatabase where requires [Role::Admin, Role::SubOwner, Role::Owner]);
/// Route handler for manual approvals
///
/// Marks a pending order as approved, recording the admin from the access token as the decider. If the order was
/// already decided, by the payment processor or another admin, nothing changes and the order is returned as it is.
/// The role is checked again against the user store, so a revoked admin cannot keep using an old token.
pub async fn approve_order<B: StorefrontDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    info!("💻️ POST approve order {order_id} by user #{}", claims.sub);
    let order = api.approve(order_id, claims.sub).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(reject_order => Post "/orders/{id}/reject" impl StorefrontDatabase where requires [Role::Admin, Role::SubOwner, Role::Owner]);
/// Route handler for manual rejections. See [`approve_order`].
pub async fn reject_order<B: StorefrontDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    info!("💻️ POST reject order {order_id} by user #{}", claims.sub);
    let order = api.reject(order_id, claims.sub).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(check_token => Get "/check_token" requires [Role::User, Role::Admin, Role::SubOwner, Role::Owner]);
/// Returns the claims in the caller's access token. Handy for front-ends deciding which views to show.
pub async fn check_token(claims: JwtClaims) -> impl Responder {
    trace!("💻️ GET check_token for user #{}", claims.sub);
    HttpResponse::Ok().json(claims)
}
