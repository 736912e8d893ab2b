use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    AccountRepository, DepartmentRepository, EmployeeRepository, RequestRepository, StoreError,
    StoreResult, WorkflowRepository,
};
use crate::model::{
    account::{Account, AccountPatch, AccountSummary, NewAccount},
    department::{Department, DepartmentPatch, DepartmentSummary, NewDepartment},
    employee::{Employee, EmployeeDetails, EmployeePatch, NewEmployee},
    request::{
        DetailUpdate, NewRequest, NewRequestDetail, NewRequestItem, Request, RequestChange,
        RequestDetail, RequestItem, RequestKind, RequestLeave, RequestRecord,
    },
    role::Role,
    workflow::{NewWorkflow, Workflow, WorkflowPatch},
};

struct RefreshToken {
    account_id: u64,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

#[derive(Default)]
struct Sequences {
    account: u64,
    department: u64,
    employee: u64,
    request: u64,
    request_item: u64,
    request_leave: u64,
    workflow: u64,
}

fn next(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct Tables {
    seq: Sequences,
    accounts: BTreeMap<u64, Account>,
    refresh_tokens: HashMap<String, RefreshToken>,
    departments: BTreeMap<u64, Department>,
    employees: BTreeMap<u64, Employee>,
    requests: BTreeMap<u64, Request>,
    request_items: BTreeMap<u64, RequestItem>,
    request_leaves: BTreeMap<u64, RequestLeave>,
    workflows: BTreeMap<u64, Workflow>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<u64>) -> bool {
        self.accounts
            .values()
            .any(|a| Some(a.id) != except && a.email.eq_ignore_ascii_case(email))
    }

    fn employee_details(&self, employee: &Employee) -> EmployeeDetails {
        EmployeeDetails {
            employee: employee.clone(),
            account: self
                .accounts
                .get(&employee.account_id)
                .map(AccountSummary::from),
            department: self.departments.get(&employee.department_id).cloned(),
        }
    }

    fn department_summary(&self, department: &Department) -> DepartmentSummary {
        DepartmentSummary {
            department: department.clone(),
            employee_count: self.count_employees(department.id),
        }
    }

    fn count_employees(&self, department_id: u64) -> u64 {
        self.employees
            .values()
            .filter(|e| e.department_id == department_id)
            .count() as u64
    }

    fn record(&self, request: &Request) -> RequestRecord {
        let detail = match request.kind() {
            RequestKind::Leave => RequestDetail::Leave(
                self.request_leaves
                    .values()
                    .find(|l| l.request_id == request.id)
                    .cloned(),
            ),
            RequestKind::Items => RequestDetail::Items(
                self.request_items
                    .values()
                    .filter(|i| i.request_id == request.id)
                    .cloned()
                    .collect(),
            ),
        };
        RequestRecord {
            request: request.clone(),
            detail,
        }
    }

    fn insert_items(&mut self, request_id: u64, items: Vec<NewRequestItem>, now: DateTime<Utc>) {
        for item in items {
            let id = next(&mut self.seq.request_item);
            self.request_items.insert(
                id,
                RequestItem {
                    id,
                    request_id,
                    name: item.name,
                    quantity: item.quantity,
                    created: now,
                    updated: None,
                },
            );
        }
    }

    fn purge_items(&mut self, request_id: u64) {
        self.request_items.retain(|_, i| i.request_id != request_id);
    }

    fn purge_leave(&mut self, request_id: u64) {
        self.request_leaves.retain(|_, l| l.request_id != request_id);
    }

    fn delete_request(&mut self, request_id: u64) -> bool {
        self.purge_items(request_id);
        self.purge_leave(request_id);
        self.requests.remove(&request_id).is_some()
    }

    fn delete_employee(&mut self, employee_id: u64) -> bool {
        let owned: Vec<u64> = self
            .requests
            .values()
            .filter(|r| r.employee_id == employee_id)
            .map(|r| r.id)
            .collect();
        for request_id in owned {
            self.delete_request(request_id);
        }
        self.workflows.retain(|_, w| w.employee_id != employee_id);
        self.employees.remove(&employee_id).is_some()
    }
}

/// Process-local store used for development runs without `DATABASE_URL` and
/// for tests. Every operation holds the single table lock for its whole
/// duration, so multi-row writes are all-or-nothing.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Account>> {
        Ok(self.tables().accounts.values().cloned().collect())
    }

    async fn find(&self, id: u64) -> StoreResult<Option<Account>> {
        Ok(self.tables().accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .tables()
            .accounts
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_verification_token(&self, token: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .tables()
            .accounts
            .values()
            .find(|a| a.verification_token.as_deref() == Some(token))
            .cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .tables()
            .accounts
            .values()
            .find(|a| a.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.tables().accounts.len() as u64)
    }

    async fn count_admins(&self) -> StoreResult<u64> {
        Ok(self
            .tables()
            .accounts
            .values()
            .filter(|a| a.role == Role::Admin)
            .count() as u64)
    }

    async fn insert(&self, account: NewAccount) -> StoreResult<Account> {
        let mut t = self.tables();
        if t.email_taken(&account.email, None) {
            return Err(StoreError::Duplicate("email"));
        }
        let id = next(&mut t.seq.account);
        let row = Account {
            id,
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
            created: Utc::now(),
            updated: None,
        };
        t.accounts.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: u64, patch: AccountPatch) -> StoreResult<Option<Account>> {
        let mut t = self.tables();
        if let Some(email) = &patch.email {
            if t.email_taken(email, Some(id)) {
                return Err(StoreError::Duplicate("email"));
            }
        }
        let Some(a) = t.accounts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = patch.title {
            a.title = Some(v);
        }
        if let Some(v) = patch.first_name {
            a.first_name = v;
        }
        if let Some(v) = patch.last_name {
            a.last_name = v;
        }
        if let Some(v) = patch.email {
            a.email = v;
        }
        if let Some(v) = patch.role {
            a.role = v;
        }
        if let Some(v) = patch.status {
            a.status = v;
        }
        if let Some(v) = patch.password_hash {
            a.password_hash = v;
        }
        if let Some(v) = patch.verification_token {
            a.verification_token = v;
        }
        if let Some(v) = patch.verified {
            a.verified = Some(v);
        }
        if let Some(v) = patch.reset_token {
            a.reset_token = v;
        }
        if let Some(v) = patch.reset_token_expires {
            a.reset_token_expires = v;
        }
        if let Some(v) = patch.last_login {
            a.last_login = Some(v);
        }
        a.updated = Some(Utc::now());
        Ok(Some(a.clone()))
    }

    async fn delete(&self, id: u64, cascade: bool) -> StoreResult<bool> {
        let mut t = self.tables();
        if !t.accounts.contains_key(&id) {
            return Ok(false);
        }
        let linked = t
            .employees
            .values()
            .find(|e| e.account_id == id)
            .map(|e| e.id);
        if let Some(employee_id) = linked {
            if !cascade {
                return Err(StoreError::Duplicate("employee"));
            }
            t.delete_employee(employee_id);
        }
        t.refresh_tokens.retain(|_, rt| rt.account_id != id);
        Ok(t.accounts.remove(&id).is_some())
    }

    async fn emails(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .tables()
            .accounts
            .values()
            .map(|a| a.email.clone())
            .collect())
    }

    async fn emails_logged_in_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<String>> {
        Ok(self
            .tables()
            .accounts
            .values()
            .filter(|a| a.last_login.is_some_and(|at| at >= since))
            .map(|a| a.email.clone())
            .collect())
    }

    async fn insert_refresh_token(
        &self,
        account_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.tables().refresh_tokens.insert(
            jti.to_string(),
            RefreshToken {
                account_id,
                expires_at,
                revoked: false,
            },
        );
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<Option<u64>> {
        let mut t = self.tables();
        let Some(token) = t.refresh_tokens.get_mut(jti) else {
            return Ok(None);
        };
        let usable = !token.revoked && token.expires_at > Utc::now();
        token.revoked = true;
        Ok(usable.then_some(token.account_id))
    }
}

#[async_trait]
impl DepartmentRepository for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<DepartmentSummary>> {
        let t = self.tables();
        Ok(t.departments
            .values()
            .map(|d| t.department_summary(d))
            .collect())
    }

    async fn find(&self, id: u64) -> StoreResult<Option<DepartmentSummary>> {
        let t = self.tables();
        Ok(t.departments.get(&id).map(|d| t.department_summary(d)))
    }

    async fn insert(&self, department: NewDepartment) -> StoreResult<Department> {
        let mut t = self.tables();
        let id = next(&mut t.seq.department);
        let row = Department {
            id,
            name: department.name,
            description: department.description,
            created: Utc::now(),
            updated: None,
        };
        t.departments.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: u64, patch: DepartmentPatch) -> StoreResult<Option<Department>> {
        let mut t = self.tables();
        let Some(d) = t.departments.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            d.name = name;
        }
        if let Some(description) = patch.description {
            d.description = Some(description);
        }
        d.updated = Some(Utc::now());
        Ok(Some(d.clone()))
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let mut t = self.tables();
        if t.count_employees(id) > 0 {
            return Err(StoreError::Duplicate("employee"));
        }
        Ok(t.departments.remove(&id).is_some())
    }
}

#[async_trait]
impl EmployeeRepository for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<EmployeeDetails>> {
        let t = self.tables();
        Ok(t.employees.values().map(|e| t.employee_details(e)).collect())
    }

    async fn find(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.tables().employees.get(&id).cloned())
    }

    async fn find_details(&self, id: u64) -> StoreResult<Option<EmployeeDetails>> {
        let t = self.tables();
        Ok(t.employees.get(&id).map(|e| t.employee_details(e)))
    }

    async fn find_by_account(&self, account_id: u64) -> StoreResult<Option<Employee>> {
        Ok(self
            .tables()
            .employees
            .values()
            .find(|e| e.account_id == account_id)
            .cloned())
    }

    async fn insert(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let mut t = self.tables();
        if !t.accounts.contains_key(&employee.account_id) {
            return Err(StoreError::MissingReference("account"));
        }
        if !t.departments.contains_key(&employee.department_id) {
            return Err(StoreError::MissingReference("department"));
        }
        if t
            .employees
            .values()
            .any(|e| e.account_id == employee.account_id)
        {
            return Err(StoreError::Duplicate("account_id"));
        }
        let id = next(&mut t.seq.employee);
        let row = Employee {
            id,
            account_id: employee.account_id,
            department_id: employee.department_id,
            position: employee.position,
            hire_date: employee.hire_date,
            status: employee.status,
            created: Utc::now(),
            updated: None,
        };
        t.employees.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: u64, patch: EmployeePatch) -> StoreResult<Option<Employee>> {
        let mut t = self.tables();
        let Some(e) = t.employees.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(position) = patch.position {
            e.position = position;
        }
        if let Some(hire_date) = patch.hire_date {
            e.hire_date = hire_date;
        }
        if let Some(status) = patch.status {
            e.status = status;
        }
        e.updated = Some(Utc::now());
        Ok(Some(e.clone()))
    }

    async fn set_department(&self, id: u64, department_id: u64) -> StoreResult<Option<Employee>> {
        let mut t = self.tables();
        if !t.departments.contains_key(&department_id) {
            return Err(StoreError::MissingReference("department"));
        }
        let Some(e) = t.employees.get_mut(&id) else {
            return Ok(None);
        };
        e.department_id = department_id;
        e.updated = Some(Utc::now());
        Ok(Some(e.clone()))
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        Ok(self.tables().delete_employee(id))
    }
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<RequestRecord>> {
        let t = self.tables();
        Ok(t.requests.values().map(|r| t.record(r)).collect())
    }

    async fn find(&self, id: u64) -> StoreResult<Option<RequestRecord>> {
        let t = self.tables();
        Ok(t.requests.get(&id).map(|r| t.record(r)))
    }

    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<RequestRecord>> {
        let t = self.tables();
        Ok(t.requests
            .values()
            .filter(|r| r.employee_id == employee_id)
            .map(|r| t.record(r))
            .collect())
    }

    async fn insert(&self, request: NewRequest) -> StoreResult<RequestRecord> {
        let mut t = self.tables();
        if !t.employees.contains_key(&request.employee_id) {
            return Err(StoreError::MissingReference("employee"));
        }
        let now = Utc::now();
        let id = next(&mut t.seq.request);
        let row = Request {
            id,
            employee_id: request.employee_id,
            request_type: request.request_type,
            status: request.status,
            request_date: request.request_date,
            created: now,
            updated: None,
        };
        t.requests.insert(id, row.clone());

        match request.detail {
            NewRequestDetail::Leave(dates) => {
                let leave_id = next(&mut t.seq.request_leave);
                t.request_leaves.insert(
                    leave_id,
                    RequestLeave {
                        id: leave_id,
                        request_id: id,
                        start_date: dates.start_date,
                        end_date: dates.end_date,
                        created: now,
                        updated: None,
                    },
                );
            }
            NewRequestDetail::Items(items) => t.insert_items(id, items, now),
        }

        Ok(t.record(&row))
    }

    async fn update(&self, id: u64, change: RequestChange) -> StoreResult<Option<RequestRecord>> {
        let mut t = self.tables();
        let now = Utc::now();
        let Some(request) = t.requests.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(status) = change.status {
            request.status = status;
        }
        request.updated = Some(now);
        let row = request.clone();

        match change.detail {
            DetailUpdate::Leave(dates) => {
                t.purge_items(id);
                match t.request_leaves.values_mut().find(|l| l.request_id == id) {
                    Some(leave) => {
                        leave.start_date = dates.start_date;
                        leave.end_date = dates.end_date;
                        leave.updated = Some(now);
                    }
                    None => {
                        let leave_id = next(&mut t.seq.request_leave);
                        t.request_leaves.insert(
                            leave_id,
                            RequestLeave {
                                id: leave_id,
                                request_id: id,
                                start_date: dates.start_date,
                                end_date: dates.end_date,
                                created: now,
                                updated: None,
                            },
                        );
                    }
                }
            }
            DetailUpdate::Items(items) => {
                t.purge_leave(id);
                if let Some(items) = items {
                    t.purge_items(id);
                    t.insert_items(id, items, now);
                }
            }
        }

        Ok(Some(t.record(&row)))
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        Ok(self.tables().delete_request(id))
    }
}

#[async_trait]
impl WorkflowRepository for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Workflow>> {
        Ok(self.tables().workflows.values().cloned().collect())
    }

    async fn find(&self, id: u64) -> StoreResult<Option<Workflow>> {
        Ok(self.tables().workflows.get(&id).cloned())
    }

    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<Workflow>> {
        Ok(self
            .tables()
            .workflows
            .values()
            .filter(|w| w.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, workflow: NewWorkflow) -> StoreResult<Workflow> {
        let mut t = self.tables();
        if !t.employees.contains_key(&workflow.employee_id) {
            return Err(StoreError::MissingReference("employee"));
        }
        let id = next(&mut t.seq.workflow);
        let row = Workflow {
            id,
            employee_id: workflow.employee_id,
            workflow_type: workflow.workflow_type,
            details: workflow.details,
            status: workflow.status,
            comments: None,
            handled_by: None,
            created: Utc::now(),
            updated: None,
        };
        t.workflows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: u64, patch: WorkflowPatch) -> StoreResult<Option<Workflow>> {
        let mut t = self.tables();
        let Some(w) = t.workflows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(status) = patch.status {
            w.status = status;
        }
        if let Some(comments) = patch.comments {
            w.comments = Some(comments);
        }
        if let Some(handled_by) = patch.handled_by {
            w.handled_by = Some(handled_by);
        }
        w.updated = Some(Utc::now());
        Ok(Some(w.clone()))
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        Ok(self.tables().workflows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        account::AccountStatus,
        request::{LeaveDates, RequestStatus},
        workflow::WorkflowStatus,
    };
    use chrono::NaiveDate;

    async fn seeded() -> (MemoryStore, Employee) {
        let store = MemoryStore::default();
        let account = AccountRepository::insert(
            &store,
            NewAccount {
                title: None,
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                role: Role::User,
                password_hash: "x".into(),
                status: AccountStatus::Active,
                verification_token: None,
                verified: Some(Utc::now()),
            },
        )
        .await
        .unwrap();
        let department = DepartmentRepository::insert(
            &store,
            NewDepartment {
                name: "Engineering".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        let employee = EmployeeRepository::insert(
            &store,
            NewEmployee {
                account_id: account.id,
                department_id: department.id,
                position: "Engineer".into(),
                hire_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                status: "Active".into(),
            },
        )
        .await
        .unwrap();
        (store, employee)
    }

    fn leave_request(employee_id: u64) -> NewRequest {
        NewRequest {
            employee_id,
            request_type: "Leave".into(),
            status: RequestStatus::Pending,
            request_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            detail: NewRequestDetail::Leave(LeaveDates {
                start_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            }),
        }
    }

    #[actix_web::test]
    async fn deleting_employee_cascades_to_requests_and_workflows() {
        let (store, employee) = seeded().await;
        let record = RequestRepository::insert(&store, leave_request(employee.id))
            .await
            .unwrap();
        WorkflowRepository::insert(
            &store,
            NewWorkflow {
                employee_id: employee.id,
                workflow_type: "Onboarding".into(),
                details: "Setting up workstation".into(),
                status: WorkflowStatus::Pending,
            },
        )
        .await
        .unwrap();

        assert!(EmployeeRepository::delete(&store, employee.id).await.unwrap());

        let t = store.tables();
        assert!(t.requests.is_empty());
        assert!(t.request_leaves.is_empty());
        assert!(t.workflows.is_empty());
        assert!(!t.requests.contains_key(&record.request.id));
    }

    fn items_request(employee_id: u64) -> NewRequest {
        NewRequest {
            employee_id,
            request_type: "Equipment".into(),
            status: RequestStatus::Pending,
            request_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            detail: NewRequestDetail::Items(vec![NewRequestItem {
                name: "Laptop".into(),
                quantity: 1,
            }]),
        }
    }

    #[actix_web::test]
    async fn leave_update_clears_stray_item_rows() {
        let (store, employee) = seeded().await;
        let record = RequestRepository::insert(&store, leave_request(employee.id))
            .await
            .unwrap();
        let id = record.request.id;
        store.tables().insert_items(
            id,
            vec![NewRequestItem {
                name: "Monitor".into(),
                quantity: 2,
            }],
            Utc::now(),
        );

        let dates = LeaveDates {
            start_date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 2, 4).unwrap(),
        };
        RequestRepository::update(
            &store,
            id,
            RequestChange {
                status: None,
                detail: DetailUpdate::Leave(dates),
            },
        )
        .await
        .unwrap()
        .unwrap();

        let t = store.tables();
        assert!(!t.request_items.values().any(|i| i.request_id == id));
        let leaves: Vec<_> = t
            .request_leaves
            .values()
            .filter(|l| l.request_id == id)
            .collect();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].start_date, dates.start_date);
    }

    #[actix_web::test]
    async fn items_update_clears_stray_leave_row() {
        let (store, employee) = seeded().await;
        let record = RequestRepository::insert(&store, items_request(employee.id))
            .await
            .unwrap();
        let id = record.request.id;
        {
            let mut t = store.tables();
            let leave_id = next(&mut t.seq.request_leave);
            t.request_leaves.insert(
                leave_id,
                RequestLeave {
                    id: leave_id,
                    request_id: id,
                    start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                    created: Utc::now(),
                    updated: None,
                },
            );
        }

        RequestRepository::update(
            &store,
            id,
            RequestChange {
                status: Some(RequestStatus::Approved),
                detail: DetailUpdate::Items(None),
            },
        )
        .await
        .unwrap()
        .unwrap();

        let t = store.tables();
        assert!(!t.request_leaves.values().any(|l| l.request_id == id));
        assert_eq!(
            t.request_items
                .values()
                .filter(|i| i.request_id == id)
                .count(),
            1
        );
    }

    #[actix_web::test]
    async fn restricted_account_delete_keeps_linked_employee() {
        let (store, employee) = seeded().await;
        let err = AccountRepository::delete(&store, employee.account_id, false)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("employee")));
        assert!(EmployeeRepository::find(&store, employee.id)
            .await
            .unwrap()
            .is_some());

        assert!(AccountRepository::delete(&store, employee.account_id, true)
            .await
            .unwrap());
        assert!(EmployeeRepository::find(&store, employee.id)
            .await
            .unwrap()
            .is_none());
    }

    #[actix_web::test]
    async fn refresh_tokens_are_single_use() {
        let (store, employee) = seeded().await;
        let expires = Utc::now() + chrono::Duration::hours(1);
        store
            .insert_refresh_token(employee.account_id, "jti-1", expires)
            .await
            .unwrap();

        assert_eq!(
            store.revoke_refresh_token("jti-1").await.unwrap(),
            Some(employee.account_id)
        );
        assert_eq!(store.revoke_refresh_token("jti-1").await.unwrap(), None);
        assert_eq!(store.revoke_refresh_token("missing").await.unwrap(), None);
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let (store, _) = seeded().await;
        let err = AccountRepository::insert(
            &store,
            NewAccount {
                title: None,
                first_name: "Other".into(),
                last_name: "Person".into(),
                email: "ADA@example.com".into(),
                role: Role::User,
                password_hash: "x".into(),
                status: AccountStatus::Inactive,
                verification_token: None,
                verified: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("email")));
    }
}
