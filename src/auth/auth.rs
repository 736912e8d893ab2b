use crate::{auth::jwt::verify_token, config::Config, error::AppError, model::role::Role, models::TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// The authenticated caller, as proven by an access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account_id: u64,
    pub role: Role,
}

pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

impl AuthUser {
    /// Decodes an access token into a caller. Refresh tokens are rejected.
    pub fn from_token(token: &str, config: &Config) -> Result<Self, AppError> {
        let claims = verify_token(token, &config.jwt_secret)
            .map_err(|_| AppError::unauthenticated("Invalid or expired token"))?;

        if claims.token_type != TokenType::Access {
            return Err(AppError::unauthenticated("Access token required"));
        }

        let role = Role::from_id(claims.role)
            .ok_or_else(|| AppError::unauthenticated("Invalid role"))?;

        Ok(AuthUser {
            account_id: claims.account_id,
            role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin only"))
        }
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by the auth middleware on protected routes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(token) = bearer_token(req) else {
            return ready(Err(AppError::unauthenticated("Missing token")));
        };

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(AppError::internal("Config missing")));
        };

        ready(AuthUser::from_token(token, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_refresh_token};

    #[test]
    fn accepts_access_tokens_only() {
        let config = Config::test();
        let access =
            generate_access_token(3, "x@y.z".into(), 1, &config.jwt_secret, 60).unwrap();
        let user = AuthUser::from_token(&access, &config).unwrap();
        assert_eq!(user.account_id, 3);
        assert!(user.is_admin());

        let (refresh, _) =
            generate_refresh_token(3, "x@y.z".into(), 1, &config.jwt_secret, 60).unwrap();
        assert!(matches!(
            AuthUser::from_token(&refresh, &config),
            Err(AppError::Unauthenticated(_))
        ));
    }
}
