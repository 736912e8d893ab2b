use crate::{
    auth::{auth::AuthUser, policy::Principal},
    config::Config,
    error::AppResult,
    model::{
        request::{
            CreateRequest, RequestDetail, RequestRecord, RequestResponse, UpdateRequest,
        },
        workflow::ResourceLine,
    },
    models::MessageResponse,
    service::{request, workflow},
    store::Repositories,
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use tracing::error;

fn responses(records: Vec<RequestRecord>) -> Vec<RequestResponse> {
    records.into_iter().map(RequestResponse::from).collect()
}

/// Append the matching workflow entry for a new request. Failures are logged
/// and do not undo the request.
async fn record_workflow(repos: &Repositories, record: &RequestRecord) {
    let employee_id = record.request.employee_id;
    let result = match &record.detail {
        RequestDetail::Leave(Some(leave)) => {
            workflow::record_leave(repos, employee_id, leave.start_date, leave.end_date).await
        }
        RequestDetail::Leave(None) => return,
        RequestDetail::Items(items) => {
            let lines: Vec<ResourceLine> = items
                .iter()
                .map(|i| ResourceLine {
                    name: i.name.clone(),
                    quantity: i.quantity,
                })
                .collect();
            workflow::record_resources(repos, employee_id, &lines).await
        }
    };
    if let Err(e) = result {
        error!(error = %e, request_id = record.request.id, "Failed to record request workflow");
    }
}

/// List all requests
#[utoipa::path(
    get,
    path = "/api/requests",
    responses(
        (status = 200, description = "All requests with their details", body = [RequestResponse]),
        (status = 403, description = "Admin only")
    ),
    tag = "Request",
    security(("bearer_auth" = []))
)]
pub async fn list_requests(
    auth: AuthUser,
    repos: web::Data<Repositories>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let records = request::list(repos.get_ref()).await?;
    Ok(HttpResponse::Ok().json(responses(records)))
}

/// Get a request by id
#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(("id" = u64, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request found", body = RequestResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Request not found")
    ),
    tag = "Request",
    security(("bearer_auth" = []))
)]
pub async fn get_request(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let principal = Principal::resolve(&auth, repos.get_ref()).await?;
    let record = request::get(repos.get_ref(), path.into_inner()).await?;
    principal.authorize_owner(record.request.employee_id)?;
    Ok(HttpResponse::Ok().json(RequestResponse::from(record)))
}

/// List the requests of one employee
#[utoipa::path(
    get,
    path = "/api/requests/employee/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Requests of the employee", body = [RequestResponse]),
        (status = 403, description = "Not the owner")
    ),
    tag = "Request",
    security(("bearer_auth" = []))
)]
pub async fn list_employee_requests(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    let principal = Principal::resolve(&auth, repos.get_ref()).await?;
    principal.authorize_owner(employee_id)?;
    let records = request::list_by_employee(repos.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(responses(records)))
}

/// Create a request. Non-admin callers file for their own employee record;
/// `employee_id` defaults to it.
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Request created", body = Object, example = json!({
            "message": "Request created successfully",
            "request": {"id": 1, "type": "Leave", "status": "Pending"}
        })),
        (status = 400, description = "Invalid request data"),
        (status = 403, description = "Not the owner")
    ),
    tag = "Request",
    security(("bearer_auth" = []))
)]
pub async fn create_request(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    config: web::Data<Config>,
    payload: web::Json<CreateRequest>,
) -> AppResult<HttpResponse> {
    let principal = Principal::resolve(&auth, repos.get_ref()).await?;
    let mut input = payload.into_inner();
    if input.employee_id.is_none() && !principal.is_admin() {
        input.employee_id = principal.employee_id;
    }
    if let Some(employee_id) = input.employee_id {
        principal.authorize_owner(employee_id)?;
    }

    let record = request::create(repos.get_ref(), input).await?;
    if config.record_workflows {
        record_workflow(repos.get_ref(), &record).await;
    }

    Ok(HttpResponse::Created().json(json!({
        "message": "Request created successfully",
        "request": RequestResponse::from(record)
    })))
}

/// Update a request
#[utoipa::path(
    put,
    path = "/api/requests/{id}",
    params(("id" = u64, Path, description = "Request id")),
    request_body = UpdateRequest,
    responses(
        (status = 200, description = "Request updated", body = Object, example = json!({
            "message": "Request updated successfully"
        })),
        (status = 400, description = "Invalid update"),
        (status = 403, description = "Not the owner, or request already decided"),
        (status = 404, description = "Request not found")
    ),
    tag = "Request",
    security(("bearer_auth" = []))
)]
pub async fn update_request(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
    payload: web::Json<UpdateRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let input = payload.into_inner();
    let principal = Principal::resolve(&auth, repos.get_ref()).await?;
    let current = request::get(repos.get_ref(), id).await?;
    principal.authorize_request_write(&current.request)?;
    principal.authorize_status(input.status)?;

    let record = request::update(repos.get_ref(), id, input).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Request updated successfully",
        "request": RequestResponse::from(record)
    })))
}

/// Delete a request with its details
#[utoipa::path(
    delete,
    path = "/api/requests/{id}",
    params(("id" = u64, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request deleted", body = MessageResponse),
        (status = 403, description = "Not the owner, or request already decided"),
        (status = 404, description = "Request not found")
    ),
    tag = "Request",
    security(("bearer_auth" = []))
)]
pub async fn delete_request(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let principal = Principal::resolve(&auth, repos.get_ref()).await?;
    let current = request::get(repos.get_ref(), id).await?;
    principal.authorize_request_write(&current.request)?;

    request::delete(repos.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Request deleted successfully".into(),
    }))
}
