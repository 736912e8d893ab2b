use crate::{
    auth::{auth::AuthUser, policy::Principal},
    error::AppResult,
    model::workflow::{
        CreateWorkflow, LeaveWorkflow, OnboardingWorkflow, ResourcesWorkflow, TransferWorkflow,
        Workflow, WorkflowPatch,
    },
    models::MessageResponse,
    service::workflow,
    store::Repositories,
};
use actix_web::{HttpResponse, web};
use serde_json::json;

fn created(workflow: Workflow) -> HttpResponse {
    HttpResponse::Created().json(json!({
        "message": "Workflow created successfully",
        "workflow": workflow
    }))
}

/// List all workflows
#[utoipa::path(
    get,
    path = "/api/workflows",
    responses(
        (status = 200, description = "All workflows", body = [Workflow]),
        (status = 403, description = "Admin only")
    ),
    tag = "Workflow",
    security(("bearer_auth" = []))
)]
pub async fn list_workflows(
    auth: AuthUser,
    repos: web::Data<Repositories>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    Ok(HttpResponse::Ok().json(workflow::list(repos.get_ref()).await?))
}

/// Get a workflow by id
#[utoipa::path(
    get,
    path = "/api/workflows/{id}",
    params(("id" = u64, Path, description = "Workflow id")),
    responses(
        (status = 200, description = "Workflow found", body = Workflow),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Workflow not found")
    ),
    tag = "Workflow",
    security(("bearer_auth" = []))
)]
pub async fn get_workflow(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let principal = Principal::resolve(&auth, repos.get_ref()).await?;
    let found = workflow::get(repos.get_ref(), path.into_inner()).await?;
    principal.authorize_owner(found.employee_id)?;
    Ok(HttpResponse::Ok().json(found))
}

/// List the workflows of one employee
#[utoipa::path(
    get,
    path = "/api/workflows/employee/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Workflows of the employee", body = [Workflow]),
        (status = 403, description = "Not the owner")
    ),
    tag = "Workflow",
    security(("bearer_auth" = []))
)]
pub async fn list_employee_workflows(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    let principal = Principal::resolve(&auth, repos.get_ref()).await?;
    principal.authorize_owner(employee_id)?;
    Ok(HttpResponse::Ok().json(workflow::list_by_employee(repos.get_ref(), employee_id).await?))
}

/// Create a workflow entry with free-form details
#[utoipa::path(
    post,
    path = "/api/workflows",
    request_body = CreateWorkflow,
    responses(
        (status = 201, description = "Workflow created", body = Object),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Workflow",
    security(("bearer_auth" = []))
)]
pub async fn create_workflow(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    payload: web::Json<CreateWorkflow>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    Ok(created(
        workflow::create(repos.get_ref(), payload.into_inner()).await?,
    ))
}

/// Change a workflow's status, comments or handler
#[utoipa::path(
    put,
    path = "/api/workflows/{id}",
    params(("id" = u64, Path, description = "Workflow id")),
    request_body = WorkflowPatch,
    responses(
        (status = 200, description = "Workflow updated", body = MessageResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Workflow not found")
    ),
    tag = "Workflow",
    security(("bearer_auth" = []))
)]
pub async fn update_workflow(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
    payload: web::Json<WorkflowPatch>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let updated = workflow::update(repos.get_ref(), path.into_inner(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Workflow updated successfully",
        "workflow": updated
    })))
}

/// Delete a workflow
#[utoipa::path(
    delete,
    path = "/api/workflows/{id}",
    params(("id" = u64, Path, description = "Workflow id")),
    responses(
        (status = 200, description = "Workflow deleted", body = MessageResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Workflow not found")
    ),
    tag = "Workflow",
    security(("bearer_auth" = []))
)]
pub async fn delete_workflow(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    workflow::delete(repos.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Workflow deleted successfully".into(),
    }))
}

/// Record an onboarding workflow
#[utoipa::path(
    post,
    path = "/api/workflows/onboarding",
    request_body = OnboardingWorkflow,
    responses(
        (status = 201, description = "Workflow created", body = Object),
        (status = 404, description = "Employee not found")
    ),
    tag = "Workflow",
    security(("bearer_auth" = []))
)]
pub async fn create_onboarding(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    payload: web::Json<OnboardingWorkflow>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    Ok(created(
        workflow::record_onboarding(repos.get_ref(), payload.employee_id).await?,
    ))
}

/// Record a department transfer workflow
#[utoipa::path(
    post,
    path = "/api/workflows/transfer",
    request_body = TransferWorkflow,
    responses(
        (status = 201, description = "Workflow created", body = Object),
        (status = 404, description = "Employee not found")
    ),
    tag = "Workflow",
    security(("bearer_auth" = []))
)]
pub async fn create_transfer(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    payload: web::Json<TransferWorkflow>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    Ok(created(
        workflow::record_transfer(
            repos.get_ref(),
            payload.employee_id,
            &payload.old_department,
            &payload.new_department,
        )
        .await?,
    ))
}

/// Record a leave approval workflow
#[utoipa::path(
    post,
    path = "/api/workflows/leave",
    request_body = LeaveWorkflow,
    responses(
        (status = 201, description = "Workflow created", body = Object),
        (status = 404, description = "Employee not found")
    ),
    tag = "Workflow",
    security(("bearer_auth" = []))
)]
pub async fn create_leave(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    payload: web::Json<LeaveWorkflow>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    Ok(created(
        workflow::record_leave(
            repos.get_ref(),
            payload.employee_id,
            payload.start_date,
            payload.end_date,
        )
        .await?,
    ))
}

/// Record a resources approval workflow
#[utoipa::path(
    post,
    path = "/api/workflows/resources",
    request_body = ResourcesWorkflow,
    responses(
        (status = 201, description = "Workflow created", body = Object),
        (status = 400, description = "Empty item list"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Workflow",
    security(("bearer_auth" = []))
)]
pub async fn create_resources(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    payload: web::Json<ResourcesWorkflow>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    Ok(created(
        workflow::record_resources(repos.get_ref(), payload.employee_id, &payload.items).await?,
    ))
}
