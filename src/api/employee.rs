use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::AppResult,
    model::employee::{NewEmployee, TransferDepartment, UpdateEmployee},
    models::MessageResponse,
    service::{employee, workflow},
    store::Repositories,
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use tracing::error;

/// List employees with account and department
#[utoipa::path(
    get,
    path = "/api/employees",
    responses((status = 200, description = "Employees", body = [EmployeeDetails])),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(repos: web::Data<Repositories>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(employee::list(repos.get_ref()).await?))
}

/// Get an employee by id
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee found", body = EmployeeDetails),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(employee::get(repos.get_ref(), path.into_inner()).await?))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully",
            "employee": {"id": 1, "account_id": 3, "department_id": 2}
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Account or department not found"),
        (status = 409, description = "Account already linked")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    config: web::Data<Config>,
    payload: web::Json<NewEmployee>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let created = employee::create(repos.get_ref(), payload.into_inner()).await?;

    if config.record_workflows {
        if let Err(e) = workflow::record_onboarding(repos.get_ref(), created.id).await {
            error!(error = %e, employee_id = created.id, "Failed to record onboarding");
        }
    }

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created successfully",
        "employee": created
    })))
}

/// Update an employee. Department changes go through the transfer endpoint.
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = MessageResponse),
        (status = 400, description = "Account or department supplied"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEmployee>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    employee::update(repos.get_ref(), path.into_inner(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Employee updated successfully".into(),
    }))
}

/// Delete an employee with its requests and workflows
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee deleted", body = MessageResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    employee::delete(repos.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Employee deleted successfully".into(),
    }))
}

/// Move an employee to another department
#[utoipa::path(
    put,
    path = "/api/employees/{id}/transfer",
    params(("id" = u64, Path, description = "Employee id")),
    request_body = TransferDepartment,
    responses(
        (status = 200, description = "Employee transferred", body = TransferOutcome),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee or department not found"),
        (status = 409, description = "Already in this department")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn transfer_employee(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<TransferDepartment>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let outcome =
        employee::transfer(repos.get_ref(), path.into_inner(), payload.department_id).await?;

    if config.record_workflows {
        if let Err(e) = workflow::record_transfer(
            repos.get_ref(),
            outcome.employee.id,
            &outcome.old_department.name,
            &outcome.new_department.name,
        )
        .await
        {
            error!(error = %e, employee_id = outcome.employee.id, "Failed to record transfer");
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Department transferred successfully",
        "employee": outcome.employee,
        "old_department": outcome.old_department,
        "new_department": outcome.new_department
    })))
}
