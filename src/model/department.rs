use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Department {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = "Product and platform teams")]
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

/// A department joined with the number of employees assigned to it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DepartmentSummary {
    #[serde(flatten)]
    pub department: Department,
    #[schema(example = 4)]
    pub employee_count: u64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewDepartment {
    #[schema(example = "Engineering")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}
