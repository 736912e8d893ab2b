use crate::{
    auth::auth::bearer_token,
    config::Config,
    error::{AppError, AppResult},
    model::account::RegisterAccount,
    models::{
        AuthenticateReqDto, EmailExistsResponse, EmailQuery, ForgotPasswordReqDto,
        ResetPasswordReqDto, TokenReqDto,
    },
    service::account,
    store::Repositories,
    utils::email_index::EmailIndex,
};
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;
use tracing::{info, instrument};

// auth end points

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterAccount,
    responses(
        (status = 201, description = "Account registered", body = MessageResponse),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
pub async fn register(
    payload: web::Json<RegisterAccount>,
    repos: web::Data<Repositories>,
    index: web::Data<EmailIndex>,
) -> AppResult<HttpResponse> {
    account::register(repos.get_ref(), index.get_ref(), payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Registration successful, please check your email for verification instructions"
    })))
}

/// Verify an email address with the token from the verification email
#[utoipa::path(
    post,
    path = "/auth/verify-email",
    request_body = TokenReqDto,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Unknown token")
    ),
    tag = "Auth"
)]
pub async fn verify_email(
    payload: web::Json<TokenReqDto>,
    repos: web::Data<Repositories>,
) -> AppResult<HttpResponse> {
    account::verify_email(repos.get_ref(), &payload.token).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Verification successful, you can now login"
    })))
}

/// Authenticate with email and password
#[utoipa::path(
    post,
    path = "/auth/authenticate",
    request_body = AuthenticateReqDto,
    responses(
        (status = 200, description = "Authenticated", body = AuthenticateResponse),
        (status = 401, description = "Email or password is incorrect")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_authenticate", skip(repos, config, payload), fields(email = %payload.email))]
pub async fn authenticate(
    payload: web::Json<AuthenticateReqDto>,
    repos: web::Data<Repositories>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");
    let session =
        account::authenticate(repos.get_ref(), config.get_ref(), &payload.email, &payload.password)
            .await?;
    Ok(HttpResponse::Ok().json(session))
}

/// Exchange a refresh token (sent as Bearer) for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    responses(
        (status = 200, description = "Tokens rotated", body = AuthenticateResponse),
        (status = 401, description = "Invalid or revoked refresh token")
    ),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn refresh_token(
    req: HttpRequest,
    repos: web::Data<Repositories>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let token = bearer_token(&req).ok_or_else(|| AppError::unauthenticated("No token"))?;
    let session = account::refresh(repos.get_ref(), config.get_ref(), token).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// Revoke a refresh token (sent as Bearer). Always succeeds.
#[utoipa::path(
    post,
    path = "/auth/revoke-token",
    responses((status = 204, description = "Token revoked")),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn revoke_token(
    req: HttpRequest,
    repos: web::Data<Repositories>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    account::revoke(repos.get_ref(), config.get_ref(), bearer_token(&req)).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Start a password reset
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordReqDto,
    responses((status = 200, description = "Reset instructions sent if the email is known", body = MessageResponse)),
    tag = "Auth"
)]
pub async fn forgot_password(
    payload: web::Json<ForgotPasswordReqDto>,
    repos: web::Data<Repositories>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    account::forgot_password(repos.get_ref(), config.get_ref(), &payload.email).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Please check your email for password reset instructions"
    })))
}

/// Check a password reset token
#[utoipa::path(
    post,
    path = "/auth/validate-reset-token",
    request_body = TokenReqDto,
    responses(
        (status = 200, description = "Token is valid", body = MessageResponse),
        (status = 400, description = "Invalid or expired token")
    ),
    tag = "Auth"
)]
pub async fn validate_reset_token(
    payload: web::Json<TokenReqDto>,
    repos: web::Data<Repositories>,
) -> AppResult<HttpResponse> {
    account::validate_reset_token(repos.get_ref(), &payload.token).await?;
    Ok(HttpResponse::Ok().json(json!({"message": "Token is valid"})))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordReqDto,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid token or password")
    ),
    tag = "Auth"
)]
pub async fn reset_password(
    payload: web::Json<ResetPasswordReqDto>,
    repos: web::Data<Repositories>,
) -> AppResult<HttpResponse> {
    account::reset_password(
        repos.get_ref(),
        &payload.token,
        &payload.password,
        &payload.confirm_password,
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Password reset successful, you can now login"
    })))
}

/// Check whether an email is already registered
#[utoipa::path(
    get,
    path = "/auth/email-exists",
    params(EmailQuery),
    responses((status = 200, description = "Availability", body = EmailExistsResponse)),
    tag = "Auth"
)]
pub async fn email_exists(
    query: web::Query<EmailQuery>,
    repos: web::Data<Repositories>,
    index: web::Data<EmailIndex>,
) -> AppResult<HttpResponse> {
    let exists = index
        .is_taken(&query.email, repos.accounts.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(EmailExistsResponse { exists }))
}
