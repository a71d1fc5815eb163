/// Authentication Routes
///
/// User registration, login, and current user information.

use actix_web::{web, HttpResponse};

use crate::accounts::AccountService;
use crate::auth::Claims;
use crate::error::AppError;
use crate::models::{Credentials, Registration};
use crate::response::{ApiResponse, ResponseData};

/// POST /auth/register
///
/// Register a new user with email and password.
///
/// # Errors
/// - 400: Missing or malformed email/password
/// - 409: Email already registered
/// - 500: Internal server error
pub async fn register(
    form: web::Json<Registration>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let user = accounts.register(form.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        "User registered successfully",
        ResponseData::User(user),
    )))
}

/// POST /auth/login
///
/// Authenticate with email and password; returns an access token valid
/// for 24 hours together with the user.
///
/// # Errors
/// - 400: Missing email or password
/// - 401: Invalid credentials (unknown email or wrong password)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<Credentials>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let session = accounts.login(form.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Login successful",
        ResponseData::Session(session),
    )))
}

/// GET /auth/me
///
/// **Requires a valid access token**; claims are injected by the JWT
/// middleware.
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let user = accounts.current_user(&claims.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "User retrieved successfully",
        ResponseData::User(user),
    )))
}
