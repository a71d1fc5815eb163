/// Authentication module
///
/// Password hashing, and access token issuing/verification.

mod claims;
mod jwt;
mod password;

pub use claims::Claims;
pub use jwt::{TokenService, ACCESS_TOKEN_TTL_SECONDS, TOKEN_ISSUER};
pub use password::{PasswordHasher, MAX_PASSWORD_BYTES};
