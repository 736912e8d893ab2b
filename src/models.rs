use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::model::account::AccountDetails;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub account_id: u64,
    /// Account email at issue time
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Deserialize, ToSchema)]
pub struct AuthenticateReqDto {
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
}

/// Account details plus a fresh token pair.
#[derive(Serialize, ToSchema)]
pub struct AuthenticateResponse {
    #[serde(flatten)]
    pub account: AccountDetails,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TokenReqDto {
    #[schema(example = "3f2b8c0e4b7d4f4fa3e1c2d5e6f7a8b9")]
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ForgotPasswordReqDto {
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPasswordReqDto {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize, IntoParams)]
pub struct EmailQuery {
    /// Email address to probe
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct EmailExistsResponse {
    pub exists: bool,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Update successful")]
    pub message: String,
}
