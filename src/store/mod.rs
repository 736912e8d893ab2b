//! Repository interfaces for every entity, plus the two stores that
//! implement them.
//!
//! Operations that touch more than one row (a request and its children,
//! cascading deletes) are single trait methods so each store can make them
//! atomic: the memory store under one lock, the MySQL store inside one
//! transaction.

mod memory;
mod mysql;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use thiserror::Error;

use crate::model::{
    account::{Account, AccountPatch, NewAccount},
    department::{Department, DepartmentPatch, DepartmentSummary, NewDepartment},
    employee::{Employee, EmployeeDetails, EmployeePatch, NewEmployee},
    request::{NewRequest, RequestChange, RequestRecord},
    workflow::{NewWorkflow, Workflow, WorkflowPatch},
};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("duplicate value for {0}")]
    Duplicate(&'static str),

    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),

    #[error("invalid stored value: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Account>>;
    async fn find(&self, id: u64) -> StoreResult<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;
    async fn find_by_verification_token(&self, token: &str) -> StoreResult<Option<Account>>;
    async fn find_by_reset_token(&self, token: &str) -> StoreResult<Option<Account>>;
    async fn count(&self) -> StoreResult<u64>;
    async fn count_admins(&self) -> StoreResult<u64>;
    async fn insert(&self, account: NewAccount) -> StoreResult<Account>;
    async fn update(&self, id: u64, patch: AccountPatch) -> StoreResult<Option<Account>>;
    /// Deletes the account. With `cascade`, the linked employee and everything
    /// it owns go with it in the same unit of work.
    async fn delete(&self, id: u64, cascade: bool) -> StoreResult<bool>;
    async fn emails(&self) -> StoreResult<Vec<String>>;
    async fn emails_logged_in_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<String>>;
    async fn insert_refresh_token(
        &self,
        account_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;
    /// Revokes the token and returns its account if it was still usable.
    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<Option<u64>>;
}

#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<DepartmentSummary>>;
    async fn find(&self, id: u64) -> StoreResult<Option<DepartmentSummary>>;
    async fn insert(&self, department: NewDepartment) -> StoreResult<Department>;
    async fn update(&self, id: u64, patch: DepartmentPatch) -> StoreResult<Option<Department>>;
    async fn delete(&self, id: u64) -> StoreResult<bool>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<EmployeeDetails>>;
    async fn find(&self, id: u64) -> StoreResult<Option<Employee>>;
    async fn find_details(&self, id: u64) -> StoreResult<Option<EmployeeDetails>>;
    async fn find_by_account(&self, account_id: u64) -> StoreResult<Option<Employee>>;
    async fn insert(&self, employee: NewEmployee) -> StoreResult<Employee>;
    async fn update(&self, id: u64, patch: EmployeePatch) -> StoreResult<Option<Employee>>;
    async fn set_department(&self, id: u64, department_id: u64) -> StoreResult<Option<Employee>>;
    /// Deletes the employee with its requests, their children and its workflows.
    async fn delete(&self, id: u64) -> StoreResult<bool>;
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<RequestRecord>>;
    async fn find(&self, id: u64) -> StoreResult<Option<RequestRecord>>;
    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<RequestRecord>>;
    async fn insert(&self, request: NewRequest) -> StoreResult<RequestRecord>;
    async fn update(&self, id: u64, change: RequestChange) -> StoreResult<Option<RequestRecord>>;
    async fn delete(&self, id: u64) -> StoreResult<bool>;
}

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Workflow>>;
    async fn find(&self, id: u64) -> StoreResult<Option<Workflow>>;
    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<Workflow>>;
    async fn insert(&self, workflow: NewWorkflow) -> StoreResult<Workflow>;
    async fn update(&self, id: u64, patch: WorkflowPatch) -> StoreResult<Option<Workflow>>;
    async fn delete(&self, id: u64) -> StoreResult<bool>;
}

/// Handle to every repository, built once at startup and shared through
/// `web::Data`.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub departments: Arc<dyn DepartmentRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub requests: Arc<dyn RequestRepository>,
    pub workflows: Arc<dyn WorkflowRepository>,
}

impl Repositories {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: AccountRepository
            + DepartmentRepository
            + EmployeeRepository
            + RequestRepository
            + WorkflowRepository
            + 'static,
    {
        Self {
            accounts: store.clone(),
            departments: store.clone(),
            employees: store.clone(),
            requests: store.clone(),
            workflows: store,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::default()))
    }

    pub fn mysql(pool: MySqlPool) -> Self {
        Self::from_store(Arc::new(MySqlStore::new(pool)))
    }
}
