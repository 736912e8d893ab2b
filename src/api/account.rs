use crate::{
    auth::{auth::AuthUser, policy::Principal},
    config::Config,
    error::AppResult,
    model::account::{CreateAccount, UpdateAccount},
    models::MessageResponse,
    service::account,
    store::Repositories,
    utils::email_index::EmailIndex,
};
use actix_web::{HttpResponse, web};
use serde_json::json;

/// List accounts
#[utoipa::path(
    get,
    path = "/api/accounts",
    responses(
        (status = 200, description = "Accounts", body = [AccountDetails]),
        (status = 403, description = "Admin only")
    ),
    tag = "Account",
    security(("bearer_auth" = []))
)]
pub async fn list_accounts(
    auth: AuthUser,
    repos: web::Data<Repositories>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    Ok(HttpResponse::Ok().json(account::list(repos.get_ref()).await?))
}

/// Get an account by id
#[utoipa::path(
    get,
    path = "/api/accounts/{id}",
    params(("id" = u64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account found", body = AccountDetails),
        (status = 403, description = "Not your account"),
        (status = 404, description = "Account not found")
    ),
    tag = "Account",
    security(("bearer_auth" = []))
)]
pub async fn get_account(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let principal = Principal::resolve(&auth, repos.get_ref()).await?;
    principal.authorize_account(id)?;
    Ok(HttpResponse::Ok().json(account::get(repos.get_ref(), id).await?))
}

/// Create a verified account
#[utoipa::path(
    post,
    path = "/api/accounts",
    request_body = CreateAccount,
    responses(
        (status = 201, description = "Account created", body = Object, example = json!({
            "message": "Account created successfully",
            "account": {"id": 2, "email": "john@email.com", "role": "User"}
        })),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Account",
    security(("bearer_auth" = []))
)]
pub async fn create_account(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    index: web::Data<EmailIndex>,
    payload: web::Json<CreateAccount>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let created = account::create(repos.get_ref(), index.get_ref(), payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Account created successfully",
        "account": created
    })))
}

/// Update an account
#[utoipa::path(
    put,
    path = "/api/accounts/{id}",
    params(("id" = u64, Path, description = "Account id")),
    request_body = UpdateAccount,
    responses(
        (status = 200, description = "Account updated", body = AccountDetails),
        (status = 403, description = "Not your account, or role change by non-admin"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Account",
    security(("bearer_auth" = []))
)]
pub async fn update_account(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    index: web::Data<EmailIndex>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAccount>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let principal = Principal::resolve(&auth, repos.get_ref()).await?;
    principal.authorize_account(id)?;
    let updated = account::update(
        repos.get_ref(),
        index.get_ref(),
        &principal,
        id,
        payload.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Delete an account
#[utoipa::path(
    delete,
    path = "/api/accounts/{id}",
    params(("id" = u64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 403, description = "Not your account"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Account still linked to an employee")
    ),
    tag = "Account",
    security(("bearer_auth" = []))
)]
pub async fn delete_account(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    index: web::Data<EmailIndex>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let principal = Principal::resolve(&auth, repos.get_ref()).await?;
    principal.authorize_account(id)?;
    account::delete(
        repos.get_ref(),
        index.get_ref(),
        config.account_delete_policy,
        id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Account deleted successfully".into(),
    }))
}
