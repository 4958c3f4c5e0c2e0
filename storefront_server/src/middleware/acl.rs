//! Access control list middleware for the storefront server.
//! This middleware can be placed on any route or service inside a JWT-protected scope.
//!
//! It checks the role in the request's access token against the roles allowed on the route. If the token carries
//! any one of them, the request continues. Otherwise, a 403 Forbidden response is returned.
use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use storefront_engine::db_types::Role;

use crate::{
    auth::JwtClaims,
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    allowed_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(allowed_roles: &[Role]) -> Self {
        AclMiddlewareFactory { allowed_roles: allowed_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { allowed_roles: self.allowed_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    allowed_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let allowed =
            req.extensions().get::<JwtClaims>().map(|c| self.allowed_roles.contains(&c.role)).unwrap_or(false);
        Box::pin(async move {
            if allowed {
                service.call(req).await
            } else {
                let who = req.extensions().get::<JwtClaims>().map(|c| format!("User #{} ({})", c.sub, c.role));
                let who = who.unwrap_or_else(|| "An anonymous user".to_string());
                warn!("🔐️ {who} was refused access to {}", req.path());
                Err(ServerError::AuthenticationError(AuthError::InsufficientPermissions(
                    "Insufficient permissions.".to_string(),
                ))
                .into())
            }
        })
    }
}
