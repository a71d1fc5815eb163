/// JWT Authentication Middleware
///
/// Verifies the token in the `Authorization` header and injects its
/// `Claims` into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderValue, AUTHORIZATION},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::TokenService;
use crate::error::{AppError, AuthError};

/// The `Authorization` value exactly as sent; the verifier strips an
/// optional "Bearer " itself
fn raw_token(header: Option<&HeaderValue>) -> Option<String> {
    header
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    tokens: Arc<TokenService>,
}

impl JwtMiddleware {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    tokens: Arc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(token) = raw_token(req.headers().get(AUTHORIZATION)) else {
            tracing::warn!("Missing Authorization header");
            let err: Error = AppError::Auth(AuthError::MissingToken).into();
            return Box::pin(async move { Err::<Self::Response, Self::Error>(err) });
        };

        match self.tokens.verify(&token) {
            Ok(claims) => {
                tracing::debug!(user_id = %claims.user_id, "JWT validated successfully");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                let err: Error = e.into();
                Box::pin(async move { Err::<Self::Response, Self::Error>(err) })
            }
        }
    }
}
