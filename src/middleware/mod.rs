/// Middleware module
///
/// Request authentication.

mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;
