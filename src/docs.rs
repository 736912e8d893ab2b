use crate::model::account::{
    AccountDetails, AccountStatus, AccountSummary, CreateAccount, RegisterAccount, UpdateAccount,
};
use crate::model::department::{Department, DepartmentPatch, DepartmentSummary, NewDepartment};
use crate::model::employee::{
    Employee, EmployeeDetails, NewEmployee, TransferDepartment, TransferOutcome, UpdateEmployee,
};
use crate::model::request::{
    CreateRequest, ItemInput, Request, RequestItem, RequestLeave, RequestResponse, RequestStatus,
    UpdateRequest,
};
use crate::model::role::Role;
use crate::model::workflow::{
    CreateWorkflow, LeaveWorkflow, OnboardingWorkflow, ResourceLine, ResourcesWorkflow,
    TransferWorkflow, Workflow, WorkflowPatch, WorkflowStatus,
};
use crate::models::{
    AuthenticateReqDto, AuthenticateResponse, EmailExistsResponse, ForgotPasswordReqDto,
    MessageResponse, ResetPasswordReqDto, TokenReqDto,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Flow API",
        version = "1.0.0",
        description = r#"
## HR Request and Workflow Service

Back end for a small HR portal: accounts, departments, employees, the requests employees
file (leave or equipment/resources), and an audit trail of workflow entries.

### Key Features
- **Accounts**
  - Registration with email verification, password reset, JWT access/refresh tokens
- **Departments and Employees**
  - CRUD, employee counts per department, department transfers
- **Requests**
  - Leave requests carry a date range, every other type carries a list of items
  - Owners edit their own Pending requests, administrators decide them
- **Workflows**
  - Onboarding, department transfer and request approval entries

### Security
Everything under `/api` needs a **JWT Bearer** access token.
Administrators may act on any record; other accounts only on their own.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::verify_email,
        crate::auth::handlers::authenticate,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::revoke_token,
        crate::auth::handlers::forgot_password,
        crate::auth::handlers::validate_reset_token,
        crate::auth::handlers::reset_password,
        crate::auth::handlers::email_exists,

        crate::api::account::list_accounts,
        crate::api::account::get_account,
        crate::api::account::create_account,
        crate::api::account::update_account,
        crate::api::account::delete_account,

        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::transfer_employee,

        crate::api::request::list_requests,
        crate::api::request::get_request,
        crate::api::request::list_employee_requests,
        crate::api::request::create_request,
        crate::api::request::update_request,
        crate::api::request::delete_request,

        crate::api::workflow::list_workflows,
        crate::api::workflow::get_workflow,
        crate::api::workflow::list_employee_workflows,
        crate::api::workflow::create_workflow,
        crate::api::workflow::update_workflow,
        crate::api::workflow::delete_workflow,
        crate::api::workflow::create_onboarding,
        crate::api::workflow::create_transfer,
        crate::api::workflow::create_leave,
        crate::api::workflow::create_resources
    ),
    components(
        schemas(
            AuthenticateReqDto,
            AuthenticateResponse,
            TokenReqDto,
            ForgotPasswordReqDto,
            ResetPasswordReqDto,
            EmailExistsResponse,
            MessageResponse,
            Role,
            AccountStatus,
            AccountDetails,
            AccountSummary,
            RegisterAccount,
            CreateAccount,
            UpdateAccount,
            Department,
            DepartmentSummary,
            NewDepartment,
            DepartmentPatch,
            Employee,
            EmployeeDetails,
            NewEmployee,
            UpdateEmployee,
            TransferDepartment,
            TransferOutcome,
            RequestStatus,
            Request,
            RequestItem,
            RequestLeave,
            RequestResponse,
            ItemInput,
            CreateRequest,
            UpdateRequest,
            WorkflowStatus,
            Workflow,
            WorkflowPatch,
            CreateWorkflow,
            OnboardingWorkflow,
            TransferWorkflow,
            LeaveWorkflow,
            ResourceLine,
            ResourcesWorkflow
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token APIs"),
        (name = "Account", description = "Account management APIs"),
        (name = "Department", description = "Department management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Request", description = "Leave and resource request APIs"),
        (name = "Workflow", description = "Workflow audit trail APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/requests/{id}"));
        assert!(doc.paths.paths.contains_key("/auth/refresh-token"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("RequestResponse"));
    }
}
