use crate::{
    auth::auth::AuthUser,
    error::AppResult,
    model::department::{DepartmentPatch, NewDepartment},
    models::MessageResponse,
    service::department,
    store::Repositories,
};
use actix_web::{HttpResponse, web};
use serde_json::json;

/// List departments with their employee counts
#[utoipa::path(
    get,
    path = "/api/departments",
    responses((status = 200, description = "Departments", body = [DepartmentSummary])),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn list_departments(repos: web::Data<Repositories>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(department::list(repos.get_ref()).await?))
}

/// Get a department by id
#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(("id" = u64, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department found", body = DepartmentSummary),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn get_department(
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(department::get(repos.get_ref(), path.into_inner()).await?))
}

/// Create a department
#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = NewDepartment,
    responses(
        (status = 201, description = "Department created", body = Object, example = json!({
            "message": "Department created successfully",
            "department": {"id": 1, "name": "Engineering"}
        })),
        (status = 400, description = "Name missing"),
        (status = 403, description = "Admin only")
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn create_department(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    payload: web::Json<NewDepartment>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let created = department::create(repos.get_ref(), payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Department created successfully",
        "department": created
    })))
}

/// Update a department
#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    params(("id" = u64, Path, description = "Department id")),
    request_body = DepartmentPatch,
    responses(
        (status = 200, description = "Department updated", body = MessageResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn update_department(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
    payload: web::Json<DepartmentPatch>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    department::update(repos.get_ref(), path.into_inner(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Department updated successfully".into(),
    }))
}

/// Delete a department that has no employees
#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    params(("id" = u64, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department deleted", body = MessageResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Department still has employees")
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn delete_department(
    auth: AuthUser,
    repos: web::Data<Repositories>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    department::delete(repos.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Department deleted successfully".into(),
    }))
}
