use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

pub const ONBOARDING: &str = "Onboarding";
pub const DEPARTMENT_TRANSFER: &str = "Department Transfer";
pub const REQUEST_APPROVAL: &str = "Request Approval";

#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum WorkflowStatus {
    #[default]
    Pending,
    ForReviewing,
    Completed,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Workflow {
    pub id: u64,
    pub employee_id: u64,
    #[serde(rename = "type")]
    #[schema(example = "Onboarding")]
    pub workflow_type: String,
    #[schema(example = "Setting up workstation")]
    pub details: String,
    pub status: WorkflowStatus,
    pub comments: Option<String>,
    pub handled_by: Option<u64>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewWorkflow {
    pub employee_id: u64,
    pub workflow_type: String,
    pub details: String,
    pub status: WorkflowStatus,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct WorkflowPatch {
    pub status: Option<WorkflowStatus>,
    pub comments: Option<String>,
    pub handled_by: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWorkflow {
    pub employee_id: u64,
    #[serde(rename = "type")]
    pub workflow_type: String,
    pub details: String,
    pub status: Option<WorkflowStatus>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OnboardingWorkflow {
    pub employee_id: u64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransferWorkflow {
    pub employee_id: u64,
    #[schema(example = "Engineering")]
    pub old_department: String,
    #[schema(example = "Sales")]
    pub new_department: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeaveWorkflow {
    pub employee_id: u64,
    #[schema(example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ResourceLine {
    #[schema(example = "Laptop")]
    pub name: String,
    #[schema(example = 2)]
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResourcesWorkflow {
    pub employee_id: u64,
    pub items: Vec<ResourceLine>,
}
