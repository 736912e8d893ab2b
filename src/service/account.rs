//! Account lifecycle and token flows.

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
        policy::Principal,
    },
    config::{AccountDeletePolicy, Config, SeedAdmin},
    error::{AppError, AppResult},
    model::{
        account::{
            Account, AccountDetails, AccountPatch, AccountStatus, CreateAccount, NewAccount,
            RegisterAccount, UpdateAccount,
        },
        role::Role,
    },
    models::{AuthenticateResponse, TokenType},
    store::Repositories,
    utils::email_index::EmailIndex,
};

const RESOURCE: &str = "Account";
const MIN_PASSWORD_LEN: usize = 6;
const BAD_CREDENTIALS: &str = "Email or password is incorrect";

fn random_token() -> String {
    Uuid::new_v4().to_simple().to_string()
}

fn required(field: &'static str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(Some(field), format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn valid_email(email: &str) -> AppResult<String> {
    let email = required("email", email)?;
    if !email.contains('@') {
        return Err(AppError::validation(Some("email"), "Email is invalid"));
    }
    Ok(email)
}

fn valid_password(password: &str, confirm: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            Some("password"),
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password != confirm {
        return Err(AppError::validation(
            Some("confirm_password"),
            "Passwords must match",
        ));
    }
    Ok(())
}

async fn ensure_email_free(
    repos: &Repositories,
    index: &EmailIndex,
    email: &str,
) -> AppResult<()> {
    if index.is_taken(email, repos.accounts.as_ref()).await? {
        return Err(AppError::conflict(
            RESOURCE,
            format!("Email \"{email}\" is already registered"),
        ));
    }
    Ok(())
}

async fn find(repos: &Repositories, id: u64) -> AppResult<Account> {
    repos
        .accounts
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))
}

/// Issues an access/refresh pair and persists the refresh jti.
async fn issue_tokens(
    repos: &Repositories,
    config: &Config,
    account: &Account,
) -> AppResult<(String, String)> {
    let access_token = generate_access_token(
        account.id,
        account.email.clone(),
        account.role.id(),
        &config.jwt_secret,
        config.access_token_ttl,
    )?;
    let (refresh_token, refresh_claims) = generate_refresh_token(
        account.id,
        account.email.clone(),
        account.role.id(),
        &config.jwt_secret,
        config.refresh_token_ttl,
    )?;

    debug!(account_id = account.id, jti = %refresh_claims.jti, "Storing refresh token");
    let expires_at = Utc::now() + Duration::seconds(config.refresh_token_ttl as i64);
    repos
        .accounts
        .insert_refresh_token(account.id, &refresh_claims.jti, expires_at)
        .await?;

    Ok((access_token, refresh_token))
}

#[instrument(name = "account_register", skip(repos, index, input), fields(email = %input.email))]
pub async fn register(
    repos: &Repositories,
    index: &EmailIndex,
    input: RegisterAccount,
) -> AppResult<AccountDetails> {
    let first_name = required("first_name", &input.first_name)?;
    let last_name = required("last_name", &input.last_name)?;
    let email = valid_email(&input.email)?;
    valid_password(&input.password, &input.confirm_password)?;
    if !input.accept_terms {
        return Err(AppError::validation(
            Some("accept_terms"),
            "Accept Terms & Conditions is required",
        ));
    }
    ensure_email_free(repos, index, &email).await?;

    let is_first = repos.accounts.count().await? == 0;
    let (role, status) = if is_first {
        (Role::Admin, AccountStatus::Active)
    } else {
        (Role::User, AccountStatus::Inactive)
    };

    let verification_token = random_token();
    let account = repos
        .accounts
        .insert(NewAccount {
            title: input.title,
            first_name,
            last_name,
            email,
            role,
            password_hash: hash_password(&input.password)?,
            status,
            verification_token: Some(verification_token.clone()),
            verified: None,
        })
        .await?;
    index.mark_taken(&account.email).await;

    info!(
        account_id = account.id,
        %role,
        "Verification email for {}: token {}",
        account.email,
        verification_token
    );
    Ok(AccountDetails::from(&account))
}

pub async fn verify_email(repos: &Repositories, token: &str) -> AppResult<()> {
    let account = repos
        .accounts
        .find_by_verification_token(token)
        .await?
        .ok_or_else(|| AppError::validation(Some("token"), "Verification failed"))?;

    repos
        .accounts
        .update(
            account.id,
            AccountPatch {
                verified: Some(Utc::now()),
                verification_token: Some(None),
                status: Some(AccountStatus::Active),
                ..Default::default()
            },
        )
        .await?;
    info!(account_id = account.id, "Email verified");
    Ok(())
}

#[instrument(name = "account_authenticate", skip(repos, config, password))]
pub async fn authenticate(
    repos: &Repositories,
    config: &Config,
    email: &str,
    password: &str,
) -> AppResult<AuthenticateResponse> {
    let Some(account) = repos.accounts.find_by_email(email.trim()).await? else {
        info!("Invalid credentials: account not found");
        return Err(AppError::unauthenticated(BAD_CREDENTIALS));
    };
    if !account.is_verified() {
        info!(account_id = account.id, "Invalid credentials: not verified");
        return Err(AppError::unauthenticated(BAD_CREDENTIALS));
    }
    if let Err(e) = verify_password(password, &account.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::unauthenticated(BAD_CREDENTIALS));
    }

    let (access_token, refresh_token) = issue_tokens(repos, config, &account).await?;

    let account = repos
        .accounts
        .update(
            account.id,
            AccountPatch {
                last_login: Some(Utc::now()),
                ..Default::default()
            },
        )
        .await?
        .unwrap_or(account);

    info!(account_id = account.id, "Login successful");
    Ok(AuthenticateResponse {
        account: AccountDetails::from(&account),
        access_token,
        refresh_token,
    })
}

/// Rotates a refresh token: the presented jti is revoked and a new pair is
/// issued.
#[instrument(name = "account_refresh", skip_all)]
pub async fn refresh(
    repos: &Repositories,
    config: &Config,
    token: &str,
) -> AppResult<AuthenticateResponse> {
    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::unauthenticated("Invalid token"))?;
    if claims.token_type != TokenType::Refresh {
        return Err(AppError::unauthenticated("Refresh token required"));
    }

    let account_id = repos
        .accounts
        .revoke_refresh_token(&claims.jti)
        .await?
        .ok_or_else(|| AppError::unauthenticated("Invalid token"))?;
    let account = repos
        .accounts
        .find(account_id)
        .await?
        .ok_or_else(|| AppError::unauthenticated("Invalid token"))?;

    let (access_token, refresh_token) = issue_tokens(repos, config, &account).await?;
    Ok(AuthenticateResponse {
        account: AccountDetails::from(&account),
        access_token,
        refresh_token,
    })
}

/// Revokes a refresh token. Anything that is not a valid refresh token is
/// ignored.
pub async fn revoke(repos: &Repositories, config: &Config, token: Option<&str>) -> AppResult<()> {
    let Some(claims) = token.and_then(|t| verify_token(t, &config.jwt_secret).ok()) else {
        return Ok(());
    };
    if claims.token_type == TokenType::Refresh {
        repos.accounts.revoke_refresh_token(&claims.jti).await?;
    }
    Ok(())
}

/// Succeeds whether or not the email is known.
pub async fn forgot_password(repos: &Repositories, config: &Config, email: &str) -> AppResult<()> {
    let Some(account) = repos.accounts.find_by_email(email.trim()).await? else {
        debug!("Password reset requested for unknown email");
        return Ok(());
    };

    let token = random_token();
    let expires = Utc::now() + Duration::seconds(config.reset_token_ttl);
    repos
        .accounts
        .update(
            account.id,
            AccountPatch {
                reset_token: Some(Some(token.clone())),
                reset_token_expires: Some(Some(expires)),
                ..Default::default()
            },
        )
        .await?;

    info!(
        account_id = account.id,
        "Password reset email for {}: token {} (expires {})",
        account.email,
        token,
        expires
    );
    Ok(())
}

pub async fn validate_reset_token(repos: &Repositories, token: &str) -> AppResult<Account> {
    repos
        .accounts
        .find_by_reset_token(token)
        .await?
        .filter(|a| a.reset_token_expires.is_some_and(|at| at > Utc::now()))
        .ok_or_else(|| AppError::validation(Some("token"), "Invalid token"))
}

pub async fn reset_password(
    repos: &Repositories,
    token: &str,
    password: &str,
    confirm_password: &str,
) -> AppResult<()> {
    let account = validate_reset_token(repos, token).await?;
    valid_password(password, confirm_password)?;

    repos
        .accounts
        .update(
            account.id,
            AccountPatch {
                password_hash: Some(hash_password(password)?),
                reset_token: Some(None),
                reset_token_expires: Some(None),
                ..Default::default()
            },
        )
        .await?;
    info!(account_id = account.id, "Password reset");
    Ok(())
}

pub async fn list(repos: &Repositories) -> AppResult<Vec<AccountDetails>> {
    Ok(repos
        .accounts
        .list()
        .await?
        .iter()
        .map(AccountDetails::from)
        .collect())
}

pub async fn get(repos: &Repositories, id: u64) -> AppResult<AccountDetails> {
    Ok(AccountDetails::from(&find(repos, id).await?))
}

/// Administrator-created accounts are verified and active immediately.
pub async fn create(
    repos: &Repositories,
    index: &EmailIndex,
    input: CreateAccount,
) -> AppResult<AccountDetails> {
    let first_name = required("first_name", &input.first_name)?;
    let last_name = required("last_name", &input.last_name)?;
    let email = valid_email(&input.email)?;
    valid_password(&input.password, &input.confirm_password)?;
    ensure_email_free(repos, index, &email).await?;

    let account = repos
        .accounts
        .insert(NewAccount {
            title: input.title,
            first_name,
            last_name,
            email,
            role: input.role,
            password_hash: hash_password(&input.password)?,
            status: AccountStatus::Active,
            verification_token: None,
            verified: Some(Utc::now()),
        })
        .await?;
    index.mark_taken(&account.email).await;

    info!(account_id = account.id, "Account created");
    Ok(AccountDetails::from(&account))
}

pub async fn update(
    repos: &Repositories,
    index: &EmailIndex,
    principal: &Principal,
    id: u64,
    input: UpdateAccount,
) -> AppResult<AccountDetails> {
    let current = find(repos, id).await?;

    if input.role.is_some_and(|r| r != current.role) || input.status.is_some() {
        principal.require_admin()?;
    }

    let email = match input.email.as_deref().map(valid_email).transpose()? {
        Some(email) if !email.eq_ignore_ascii_case(&current.email) => {
            ensure_email_free(repos, index, &email).await?;
            Some(email)
        }
        _ => None,
    };

    let password_hash = match input.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            valid_password(password, input.confirm_password.as_deref().unwrap_or_default())?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let account = repos
        .accounts
        .update(
            id,
            AccountPatch {
                title: input.title,
                first_name: input
                    .first_name
                    .as_deref()
                    .map(|v| required("first_name", v))
                    .transpose()?,
                last_name: input
                    .last_name
                    .as_deref()
                    .map(|v| required("last_name", v))
                    .transpose()?,
                email: email.clone(),
                role: input.role,
                status: input.status,
                password_hash,
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))?;

    if email.is_some() {
        index.forget(&current.email).await;
        index.mark_taken(&account.email).await;
    }
    Ok(AccountDetails::from(&account))
}

pub async fn delete(
    repos: &Repositories,
    index: &EmailIndex,
    policy: AccountDeletePolicy,
    id: u64,
) -> AppResult<()> {
    let account = find(repos, id).await?;

    let cascade = match policy {
        AccountDeletePolicy::Cascade => true,
        AccountDeletePolicy::Restrict => {
            if repos.employees.find_by_account(id).await?.is_some() {
                return Err(AppError::conflict(
                    RESOURCE,
                    "Account is linked to an employee and cannot be deleted",
                ));
            }
            false
        }
    };

    if !repos.accounts.delete(id, cascade).await? {
        return Err(AppError::not_found(RESOURCE, id));
    }
    index.forget(&account.email).await;
    info!(account_id = id, %policy, "Account deleted");
    Ok(())
}

/// Creates the configured administrator when no administrator exists yet.
pub async fn ensure_seed_admin(
    repos: &Repositories,
    index: &EmailIndex,
    seed: &SeedAdmin,
) -> AppResult<()> {
    if repos.accounts.count_admins().await? > 0 {
        return Ok(());
    }
    let account = repos
        .accounts
        .insert(NewAccount {
            title: None,
            first_name: "System".into(),
            last_name: "Administrator".into(),
            email: valid_email(&seed.email)?,
            role: Role::Admin,
            password_hash: hash_password(&seed.password)?,
            status: AccountStatus::Active,
            verification_token: None,
            verified: Some(Utc::now()),
        })
        .await?;
    index.mark_taken(&account.email).await;
    info!(account_id = account.id, "Seeded administrator account");
    Ok(())
}
