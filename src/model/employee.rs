use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{account::AccountSummary, department::Department};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "account_id": 3,
        "department_id": 2,
        "position": "Backend Engineer",
        "hire_date": "2024-01-01",
        "status": "Active",
        "created": "2024-01-01T00:00:00Z",
        "updated": null
    })
)]
pub struct Employee {
    pub id: u64,
    pub account_id: u64,
    pub department_id: u64,
    pub position: String,
    pub hire_date: NaiveDate,
    pub status: String,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

/// An employee joined with its account and department.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeDetails {
    #[serde(flatten)]
    pub employee: Employee,
    pub account: Option<AccountSummary>,
    pub department: Option<Department>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = 3)]
    pub account_id: u64,
    #[schema(example = 2)]
    pub department_id: u64,
    #[schema(example = "Backend Engineer")]
    pub position: String,
    #[schema(example = "2026-01-01")]
    pub hire_date: NaiveDate,
    #[schema(example = "Active")]
    pub status: String,
}

/// Generic employee update. `account_id` and `department_id` are accepted
/// only so they can be rejected with a useful message.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub account_id: Option<u64>,
    pub department_id: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeePatch {
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransferDepartment {
    #[schema(example = 3)]
    pub department_id: u64,
}

/// Result of a department transfer, with both departments resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransferOutcome {
    pub employee: Employee,
    pub old_department: Department,
    pub new_department: Department,
}
