use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlConnection, MySqlPool};

use super::{
    AccountRepository, DepartmentRepository, EmployeeRepository, RequestRepository, StoreError,
    StoreResult, WorkflowRepository,
};
use crate::model::{
    account::{Account, AccountPatch, AccountStatus, AccountSummary, NewAccount},
    department::{Department, DepartmentPatch, DepartmentSummary, NewDepartment},
    employee::{Employee, EmployeeDetails, EmployeePatch, NewEmployee},
    request::{
        DetailUpdate, LeaveDates, NewRequest, NewRequestDetail, NewRequestItem, Request,
        RequestChange, RequestDetail, RequestItem, RequestKind, RequestLeave, RequestRecord,
        RequestStatus,
    },
    role::Role,
    workflow::{NewWorkflow, Workflow, WorkflowPatch, WorkflowStatus},
};
use crate::utils::db_utils::{UpdateBuilder, execute_update};

/// MySQL-backed store. Multi-row writes run inside one transaction.
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn parse<T: FromStr>(column: &str, value: &str) -> StoreResult<T> {
    T::from_str(value).map_err(|_| StoreError::Corrupt(format!("{column} = {value:?}")))
}

/// Unique-key violations arrive as SQLSTATE 23000.
fn duplicate_or(e: sqlx::Error, field: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23000") && db_err.is_unique_violation() {
            return StoreError::Duplicate(field);
        }
    }
    StoreError::Database(e)
}

async fn exists(conn: &mut MySqlConnection, table: &str, id: u64) -> StoreResult<bool> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ?");
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(FromRow)]
struct AccountRow {
    id: u64,
    title: Option<String>,
    first_name: String,
    last_name: String,
    email: String,
    role: String,
    password_hash: String,
    status: String,
    verification_token: Option<String>,
    verified: Option<DateTime<Utc>>,
    reset_token: Option<String>,
    reset_token_expires: Option<DateTime<Utc>>,
    last_login: Option<DateTime<Utc>>,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(r: AccountRow) -> StoreResult<Self> {
        Ok(Account {
            id: r.id,
            title: r.title,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            role: parse::<Role>("role", &r.role)?,
            password_hash: r.password_hash,
            status: parse::<AccountStatus>("status", &r.status)?,
            verification_token: r.verification_token,
            verified: r.verified,
            reset_token: r.reset_token,
            reset_token_expires: r.reset_token_expires,
            last_login: r.last_login,
            created: r.created,
            updated: r.updated,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, title, first_name, last_name, email, role, password_hash, \
     status, verification_token, verified, reset_token, reset_token_expires, last_login, \
     created, updated";

#[derive(FromRow)]
struct DepartmentRow {
    id: u64,
    name: String,
    description: Option<String>,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
    employee_count: i64,
}

impl From<DepartmentRow> for DepartmentSummary {
    fn from(r: DepartmentRow) -> Self {
        DepartmentSummary {
            department: Department {
                id: r.id,
                name: r.name,
                description: r.description,
                created: r.created,
                updated: r.updated,
            },
            employee_count: r.employee_count.max(0) as u64,
        }
    }
}

const DEPARTMENT_SUMMARY_SQL: &str = "SELECT d.id, d.name, d.description, d.created, d.updated, \
     (SELECT COUNT(*) FROM employees e WHERE e.department_id = d.id) AS employee_count \
     FROM departments d";

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    account_id: u64,
    department_id: u64,
    position: String,
    hire_date: NaiveDate,
    status: String,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
}

impl From<EmployeeRow> for Employee {
    fn from(r: EmployeeRow) -> Self {
        Employee {
            id: r.id,
            account_id: r.account_id,
            department_id: r.department_id,
            position: r.position,
            hire_date: r.hire_date,
            status: r.status,
            created: r.created,
            updated: r.updated,
        }
    }
}

#[derive(FromRow)]
struct EmployeeDetailsRow {
    #[sqlx(flatten)]
    employee: EmployeeRow,
    account_email: Option<String>,
    account_first_name: Option<String>,
    account_last_name: Option<String>,
    account_title: Option<String>,
    department_name: Option<String>,
    department_description: Option<String>,
    department_created: Option<DateTime<Utc>>,
    department_updated: Option<DateTime<Utc>>,
}

impl From<EmployeeDetailsRow> for EmployeeDetails {
    fn from(r: EmployeeDetailsRow) -> Self {
        let account = match (r.account_email, r.account_first_name, r.account_last_name) {
            (Some(email), Some(first_name), Some(last_name)) => Some(AccountSummary {
                email,
                first_name,
                last_name,
                title: r.account_title,
            }),
            _ => None,
        };
        let department = match (r.department_name, r.department_created) {
            (Some(name), Some(created)) => Some(Department {
                id: r.employee.department_id,
                name,
                description: r.department_description,
                created,
                updated: r.department_updated,
            }),
            _ => None,
        };
        EmployeeDetails {
            employee: r.employee.into(),
            account,
            department,
        }
    }
}

const EMPLOYEE_DETAILS_SQL: &str = "SELECT e.id, e.account_id, e.department_id, e.position, \
     e.hire_date, e.status, e.created, e.updated, \
     a.email AS account_email, a.first_name AS account_first_name, \
     a.last_name AS account_last_name, a.title AS account_title, \
     d.name AS department_name, d.description AS department_description, \
     d.created AS department_created, d.updated AS department_updated \
     FROM employees e \
     LEFT JOIN accounts a ON a.id = e.account_id \
     LEFT JOIN departments d ON d.id = e.department_id";

#[derive(FromRow)]
struct RequestRow {
    id: u64,
    employee_id: u64,
    #[sqlx(rename = "type")]
    request_type: String,
    status: String,
    request_date: NaiveDate,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
}

impl TryFrom<RequestRow> for Request {
    type Error = StoreError;

    fn try_from(r: RequestRow) -> StoreResult<Self> {
        Ok(Request {
            id: r.id,
            employee_id: r.employee_id,
            request_type: r.request_type,
            status: parse::<RequestStatus>("status", &r.status)?,
            request_date: r.request_date,
            created: r.created,
            updated: r.updated,
        })
    }
}

#[derive(FromRow)]
struct RequestItemRow {
    id: u64,
    request_id: u64,
    name: String,
    quantity: u32,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
}

impl From<RequestItemRow> for RequestItem {
    fn from(r: RequestItemRow) -> Self {
        RequestItem {
            id: r.id,
            request_id: r.request_id,
            name: r.name,
            quantity: r.quantity,
            created: r.created,
            updated: r.updated,
        }
    }
}

#[derive(FromRow)]
struct RequestLeaveRow {
    id: u64,
    request_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
}

impl From<RequestLeaveRow> for RequestLeave {
    fn from(r: RequestLeaveRow) -> Self {
        RequestLeave {
            id: r.id,
            request_id: r.request_id,
            start_date: r.start_date,
            end_date: r.end_date,
            created: r.created,
            updated: r.updated,
        }
    }
}

#[derive(FromRow)]
struct WorkflowRow {
    id: u64,
    employee_id: u64,
    #[sqlx(rename = "type")]
    workflow_type: String,
    details: String,
    status: String,
    comments: Option<String>,
    handled_by: Option<u64>,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
}

impl TryFrom<WorkflowRow> for Workflow {
    type Error = StoreError;

    fn try_from(r: WorkflowRow) -> StoreResult<Self> {
        Ok(Workflow {
            id: r.id,
            employee_id: r.employee_id,
            workflow_type: r.workflow_type,
            details: r.details,
            status: parse::<WorkflowStatus>("status", &r.status)?,
            comments: r.comments,
            handled_by: r.handled_by,
            created: r.created,
            updated: r.updated,
        })
    }
}

const WORKFLOW_COLUMNS: &str =
    "id, employee_id, type, details, status, comments, handled_by, created, updated";

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Which requests a load covers. Used to fetch parent and child rows with
/// the same filter.
#[derive(Clone, Copy)]
enum RequestScope {
    All,
    Employee(u64),
    Request(u64),
}

impl RequestScope {
    fn filter(self, alias: &str) -> String {
        match self {
            RequestScope::All => String::new(),
            RequestScope::Employee(_) => format!(" WHERE {alias}.employee_id = ?"),
            RequestScope::Request(_) => format!(" WHERE {alias}.id = ?"),
        }
    }

    fn bind_value(self) -> Option<u64> {
        match self {
            RequestScope::All => None,
            RequestScope::Employee(id) | RequestScope::Request(id) => Some(id),
        }
    }
}

async fn load_requests(
    conn: &mut MySqlConnection,
    scope: RequestScope,
) -> StoreResult<Vec<RequestRecord>> {
    let requests_sql = format!(
        "SELECT r.id, r.employee_id, r.type, r.status, r.request_date, r.created, r.updated \
         FROM requests r{} ORDER BY r.id",
        scope.filter("r")
    );
    let mut q = sqlx::query_as::<_, RequestRow>(&requests_sql);
    if let Some(v) = scope.bind_value() {
        q = q.bind(v);
    }
    let requests = q.fetch_all(&mut *conn).await?;
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    let items_sql = format!(
        "SELECT ri.id, ri.request_id, ri.name, ri.quantity, ri.created, ri.updated \
         FROM request_items ri JOIN requests r ON r.id = ri.request_id{} ORDER BY ri.id",
        scope.filter("r")
    );
    let mut q = sqlx::query_as::<_, RequestItemRow>(&items_sql);
    if let Some(v) = scope.bind_value() {
        q = q.bind(v);
    }
    let mut items: HashMap<u64, Vec<RequestItem>> = HashMap::new();
    for row in q.fetch_all(&mut *conn).await? {
        items.entry(row.request_id).or_default().push(row.into());
    }

    let leaves_sql = format!(
        "SELECT rl.id, rl.request_id, rl.start_date, rl.end_date, rl.created, rl.updated \
         FROM request_leaves rl JOIN requests r ON r.id = rl.request_id{}",
        scope.filter("r")
    );
    let mut q = sqlx::query_as::<_, RequestLeaveRow>(&leaves_sql);
    if let Some(v) = scope.bind_value() {
        q = q.bind(v);
    }
    let mut leaves: HashMap<u64, RequestLeave> = q
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|row| (row.request_id, row.into()))
        .collect();

    requests
        .into_iter()
        .map(|row| {
            let request = Request::try_from(row)?;
            let detail = match request.kind() {
                RequestKind::Leave => RequestDetail::Leave(leaves.remove(&request.id)),
                RequestKind::Items => {
                    RequestDetail::Items(items.remove(&request.id).unwrap_or_default())
                }
            };
            Ok(RequestRecord { request, detail })
        })
        .collect()
}

async fn load_request(conn: &mut MySqlConnection, id: u64) -> StoreResult<Option<RequestRecord>> {
    Ok(load_requests(conn, RequestScope::Request(id))
        .await?
        .into_iter()
        .next())
}

async fn insert_items(
    conn: &mut MySqlConnection,
    request_id: u64,
    items: Vec<NewRequestItem>,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    for item in items {
        sqlx::query(
            "INSERT INTO request_items (request_id, name, quantity, created) VALUES (?, ?, ?, ?)",
        )
        .bind(request_id)
        .bind(item.name)
        .bind(item.quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_leave(
    conn: &mut MySqlConnection,
    request_id: u64,
    dates: LeaveDates,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO request_leaves (request_id, start_date, end_date, created) VALUES (?, ?, ?, ?)",
    )
    .bind(request_id)
    .bind(dates.start_date)
    .bind(dates.end_date)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

async fn delete_requests_where(
    conn: &mut MySqlConnection,
    column: &str,
    value: u64,
) -> StoreResult<u64> {
    for child in ["request_items", "request_leaves"] {
        let sql = format!(
            "DELETE c FROM {child} c JOIN requests r ON r.id = c.request_id WHERE r.{column} = ?"
        );
        sqlx::query(&sql).bind(value).execute(&mut *conn).await?;
    }
    let sql = format!("DELETE FROM requests WHERE {column} = ?");
    let result = sqlx::query(&sql).bind(value).execute(conn).await?;
    Ok(result.rows_affected())
}

async fn delete_employee(conn: &mut MySqlConnection, employee_id: u64) -> StoreResult<bool> {
    delete_requests_where(&mut *conn, "employee_id", employee_id).await?;
    sqlx::query("DELETE FROM workflows WHERE employee_id = ?")
        .bind(employee_id)
        .execute(&mut *conn)
        .await?;
    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

impl MySqlStore {
    async fn account_where(&self, clause: &str, value: &str) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {clause} = ?");
        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }
}

#[async_trait]
impl AccountRepository for MySqlStore {
    async fn list(&self) -> StoreResult<Vec<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id");
        sqlx::query_as::<_, AccountRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    async fn find(&self, id: u64) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?");
        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.account_where("LOWER(email)", &email.to_lowercase())
            .await
    }

    async fn find_by_verification_token(&self, token: &str) -> StoreResult<Option<Account>> {
        self.account_where("verification_token", token).await
    }

    async fn find_by_reset_token(&self, token: &str) -> StoreResult<Option<Account>> {
        self.account_where("reset_token", token).await
    }

    async fn count(&self) -> StoreResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn count_admins(&self) -> StoreResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts WHERE role = ?")
            .bind(Role::Admin.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn insert(&self, account: NewAccount) -> StoreResult<Account> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO accounts (title, first_name, last_name, email, role, password_hash, \
             status, verification_token, verified, created) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.title)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.email)
        .bind(account.role.to_string())
        .bind(&account.password_hash)
        .bind(account.status.to_string())
        .bind(&account.verification_token)
        .bind(account.verified)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_or(e, "email"))?;

        Ok(Account {
            id: result.last_insert_id(),
            title: account.title,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            role: account.role,
            password_hash: account.password_hash,
            status: account.status,
            verification_token: account.verification_token,
            verified: account.verified,
            reset_token: None,
            reset_token_expires: None,
            last_login: None,
            created: now,
            updated: None,
        })
    }

    async fn update(&self, id: u64, patch: AccountPatch) -> StoreResult<Option<Account>> {
        let update = UpdateBuilder::new("accounts")
            .set_some("title", patch.title)
            .set_some("first_name", patch.first_name)
            .set_some("last_name", patch.last_name)
            .set_some("email", patch.email)
            .set_some("role", patch.role.map(|r| r.to_string()))
            .set_some("status", patch.status.map(|s| s.to_string()))
            .set_some("password_hash", patch.password_hash)
            .set_some("verification_token", patch.verification_token)
            .set_some("verified", patch.verified)
            .set_some("reset_token", patch.reset_token)
            .set_some("reset_token_expires", patch.reset_token_expires)
            .set_some("last_login", patch.last_login)
            .set("updated", Utc::now())
            .build("id", id);

        if let Some(update) = update {
            let mut conn = self.pool.acquire().await?;
            execute_update(&mut conn, update)
                .await
                .map_err(|e| duplicate_or(e, "email"))?;
        }
        AccountRepository::find(self, id).await
    }

    async fn delete(&self, id: u64, cascade: bool) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let linked = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE account_id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(employee_id) = linked {
            if !cascade {
                return Err(StoreError::Duplicate("employee"));
            }
            delete_employee(&mut tx, employee_id).await?;
        }

        sqlx::query("DELETE FROM refresh_tokens WHERE account_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn emails(&self) -> StoreResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>("SELECT email FROM accounts")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn emails_logged_in_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<String>> {
        Ok(
            sqlx::query_scalar::<_, String>("SELECT email FROM accounts WHERE last_login >= ?")
                .bind(since)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn insert_refresh_token(
        &self,
        account_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query("INSERT INTO refresh_tokens (jti, account_id, expires_at) VALUES (?, ?, ?)")
            .bind(jti)
            .bind(account_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, (u64, bool, DateTime<Utc>)>(
            "SELECT account_id, revoked, expires_at FROM refresh_tokens WHERE jti = ? FOR UPDATE",
        )
        .bind(jti)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((account_id, revoked, expires_at)) = record else {
            return Ok(None);
        };

        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
            .bind(jti)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok((!revoked && expires_at > Utc::now()).then_some(account_id))
    }
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

#[async_trait]
impl DepartmentRepository for MySqlStore {
    async fn list(&self) -> StoreResult<Vec<DepartmentSummary>> {
        let sql = format!("{DEPARTMENT_SUMMARY_SQL} ORDER BY d.id");
        let rows = sqlx::query_as::<_, DepartmentRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find(&self, id: u64) -> StoreResult<Option<DepartmentSummary>> {
        let sql = format!("{DEPARTMENT_SUMMARY_SQL} WHERE d.id = ?");
        let row = sqlx::query_as::<_, DepartmentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn insert(&self, department: NewDepartment) -> StoreResult<Department> {
        let now = Utc::now();
        let result =
            sqlx::query("INSERT INTO departments (name, description, created) VALUES (?, ?, ?)")
                .bind(&department.name)
                .bind(&department.description)
                .bind(now)
                .execute(&self.pool)
                .await?;
        Ok(Department {
            id: result.last_insert_id(),
            name: department.name,
            description: department.description,
            created: now,
            updated: None,
        })
    }

    async fn update(&self, id: u64, patch: DepartmentPatch) -> StoreResult<Option<Department>> {
        let update = UpdateBuilder::new("departments")
            .set_some("name", patch.name)
            .set_some("description", patch.description)
            .set("updated", Utc::now())
            .build("id", id);
        if let Some(update) = update {
            let mut conn = self.pool.acquire().await?;
            execute_update(&mut conn, update).await?;
        }
        Ok(DepartmentRepository::find(self, id)
            .await?
            .map(|summary| summary.department))
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let assigned =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE department_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if assigned > 0 {
            return Err(StoreError::Duplicate("employee"));
        }
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

const EMPLOYEE_COLUMNS: &str =
    "id, account_id, department_id, position, hire_date, status, created, updated";

#[async_trait]
impl EmployeeRepository for MySqlStore {
    async fn list(&self) -> StoreResult<Vec<EmployeeDetails>> {
        let sql = format!("{EMPLOYEE_DETAILS_SQL} ORDER BY e.id");
        let rows = sqlx::query_as::<_, EmployeeDetailsRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find(&self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_details(&self, id: u64) -> StoreResult<Option<EmployeeDetails>> {
        let sql = format!("{EMPLOYEE_DETAILS_SQL} WHERE e.id = ?");
        let row = sqlx::query_as::<_, EmployeeDetailsRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_account(&self, account_id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE account_id = ?");
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn insert(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let mut tx = self.pool.begin().await?;
        if !exists(&mut tx, "accounts", employee.account_id).await? {
            return Err(StoreError::MissingReference("account"));
        }
        if !exists(&mut tx, "departments", employee.department_id).await? {
            return Err(StoreError::MissingReference("department"));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO employees (account_id, department_id, position, hire_date, status, created) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(employee.account_id)
        .bind(employee.department_id)
        .bind(&employee.position)
        .bind(employee.hire_date)
        .bind(&employee.status)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_or(e, "account_id"))?;
        tx.commit().await?;

        Ok(Employee {
            id: result.last_insert_id(),
            account_id: employee.account_id,
            department_id: employee.department_id,
            position: employee.position,
            hire_date: employee.hire_date,
            status: employee.status,
            created: now,
            updated: None,
        })
    }

    async fn update(&self, id: u64, patch: EmployeePatch) -> StoreResult<Option<Employee>> {
        let update = UpdateBuilder::new("employees")
            .set_some("position", patch.position)
            .set_some("hire_date", patch.hire_date)
            .set_some("status", patch.status)
            .set("updated", Utc::now())
            .build("id", id);
        if let Some(update) = update {
            let mut conn = self.pool.acquire().await?;
            execute_update(&mut conn, update).await?;
        }
        EmployeeRepository::find(self, id).await
    }

    async fn set_department(&self, id: u64, department_id: u64) -> StoreResult<Option<Employee>> {
        let mut tx = self.pool.begin().await?;
        if !exists(&mut tx, "departments", department_id).await? {
            return Err(StoreError::MissingReference("department"));
        }
        let update = UpdateBuilder::new("employees")
            .set("department_id", department_id)
            .set("updated", Utc::now())
            .build("id", id);
        if let Some(update) = update {
            execute_update(&mut tx, update).await?;
        }
        tx.commit().await?;
        EmployeeRepository::find(self, id).await
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let deleted = delete_employee(&mut tx, id).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[async_trait]
impl RequestRepository for MySqlStore {
    async fn list(&self) -> StoreResult<Vec<RequestRecord>> {
        let mut conn = self.pool.acquire().await?;
        load_requests(&mut conn, RequestScope::All).await
    }

    async fn find(&self, id: u64) -> StoreResult<Option<RequestRecord>> {
        let mut conn = self.pool.acquire().await?;
        load_request(&mut conn, id).await
    }

    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<RequestRecord>> {
        let mut conn = self.pool.acquire().await?;
        load_requests(&mut conn, RequestScope::Employee(employee_id)).await
    }

    async fn insert(&self, request: NewRequest) -> StoreResult<RequestRecord> {
        let mut tx = self.pool.begin().await?;
        if !exists(&mut tx, "employees", request.employee_id).await? {
            return Err(StoreError::MissingReference("employee"));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO requests (employee_id, type, status, request_date, created) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(request.employee_id)
        .bind(&request.request_type)
        .bind(request.status.to_string())
        .bind(request.request_date)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_id();

        match request.detail {
            NewRequestDetail::Leave(dates) => insert_leave(&mut tx, id, dates, now).await?,
            NewRequestDetail::Items(items) => insert_items(&mut tx, id, items, now).await?,
        }

        let record = load_request(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("request {id} vanished after insert")))?;
        tx.commit().await?;
        Ok(record)
    }

    async fn update(&self, id: u64, change: RequestChange) -> StoreResult<Option<RequestRecord>> {
        let mut tx = self.pool.begin().await?;
        if !exists(&mut tx, "requests", id).await? {
            return Ok(None);
        }

        let now = Utc::now();
        let update = UpdateBuilder::new("requests")
            .set_some("status", change.status.map(|s| s.to_string()))
            .set("updated", now)
            .build("id", id);
        if let Some(update) = update {
            execute_update(&mut tx, update).await?;
        }

        match change.detail {
            DetailUpdate::Leave(dates) => {
                sqlx::query("DELETE FROM request_items WHERE request_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                let touched = sqlx::query(
                    "UPDATE request_leaves SET start_date = ?, end_date = ?, updated = ? \
                     WHERE request_id = ?",
                )
                .bind(dates.start_date)
                .bind(dates.end_date)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
                if touched == 0 {
                    insert_leave(&mut tx, id, dates, now).await?;
                }
            }
            DetailUpdate::Items(items) => {
                sqlx::query("DELETE FROM request_leaves WHERE request_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                if let Some(items) = items {
                    sqlx::query("DELETE FROM request_items WHERE request_id = ?")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                    insert_items(&mut tx, id, items, now).await?;
                }
            }
        }

        let record = load_request(&mut tx, id).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let deleted = delete_requests_where(&mut tx, "id", id).await?;
        tx.commit().await?;
        Ok(deleted > 0)
    }
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

#[async_trait]
impl WorkflowRepository for MySqlStore {
    async fn list(&self) -> StoreResult<Vec<Workflow>> {
        let sql = format!("SELECT {WORKFLOW_COLUMNS} FROM workflows ORDER BY id");
        sqlx::query_as::<_, WorkflowRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Workflow::try_from)
            .collect()
    }

    async fn find(&self, id: u64) -> StoreResult<Option<Workflow>> {
        let sql = format!("SELECT {WORKFLOW_COLUMNS} FROM workflows WHERE id = ?");
        sqlx::query_as::<_, WorkflowRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Workflow::try_from)
            .transpose()
    }

    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<Workflow>> {
        let sql =
            format!("SELECT {WORKFLOW_COLUMNS} FROM workflows WHERE employee_id = ? ORDER BY id");
        sqlx::query_as::<_, WorkflowRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Workflow::try_from)
            .collect()
    }

    async fn insert(&self, workflow: NewWorkflow) -> StoreResult<Workflow> {
        let mut tx = self.pool.begin().await?;
        if !exists(&mut tx, "employees", workflow.employee_id).await? {
            return Err(StoreError::MissingReference("employee"));
        }
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO workflows (employee_id, type, details, status, created) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(workflow.employee_id)
        .bind(&workflow.workflow_type)
        .bind(&workflow.details)
        .bind(workflow.status.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Workflow {
            id: result.last_insert_id(),
            employee_id: workflow.employee_id,
            workflow_type: workflow.workflow_type,
            details: workflow.details,
            status: workflow.status,
            comments: None,
            handled_by: None,
            created: now,
            updated: None,
        })
    }

    async fn update(&self, id: u64, patch: WorkflowPatch) -> StoreResult<Option<Workflow>> {
        let update = UpdateBuilder::new("workflows")
            .set_some("status", patch.status.map(|s| s.to_string()))
            .set_some("comments", patch.comments)
            .set_some("handled_by", patch.handled_by)
            .set("updated", Utc::now())
            .build("id", id);
        if let Some(update) = update {
            let mut conn = self.pool.acquire().await?;
            execute_update(&mut conn, update).await?;
        }
        WorkflowRepository::find(self, id).await
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
