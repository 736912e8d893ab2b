//! Who may read or change what.
//!
//! Rules, in precedence order:
//! 1. Administrators may do anything.
//! 2. Otherwise a request or workflow filed against employee `E` is reachable
//!    only when the caller's account is linked to `E`.
//! 3. An owner may change a request only while it is still `Pending`, and may
//!    never decide it.
//! 4. Department and employee mutations are administrator-only.
//! 5. Account `A` is reachable by `A` itself or an administrator.

use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::{
        request::{Request, RequestStatus},
        role::Role,
    },
    store::Repositories,
};

#[derive(Debug, Clone)]
pub struct Principal {
    pub account_id: u64,
    pub role: Role,
    /// The employee linked to the caller's account, if any.
    pub employee_id: Option<u64>,
}

impl Principal {
    pub async fn resolve(user: &AuthUser, repos: &Repositories) -> AppResult<Self> {
        let employee_id = repos
            .employees
            .find_by_account(user.account_id)
            .await?
            .map(|e| e.id);

        Ok(Self {
            account_id: user.account_id,
            role: user.role,
            employee_id,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin only"))
        }
    }

    pub fn authorize_owner(&self, owner_employee_id: u64) -> AppResult<()> {
        if self.is_admin() || self.employee_id == Some(owner_employee_id) {
            Ok(())
        } else {
            Err(AppError::forbidden("Not the owner of this resource"))
        }
    }

    pub fn authorize_request_write(&self, request: &Request) -> AppResult<()> {
        self.authorize_owner(request.employee_id)?;
        if !self.is_admin() && request.status != RequestStatus::Pending {
            return Err(AppError::forbidden(
                "Request can no longer be changed once it has been decided",
            ));
        }
        Ok(())
    }

    pub fn authorize_status(&self, status: Option<RequestStatus>) -> AppResult<()> {
        match status {
            Some(RequestStatus::Approved | RequestStatus::Rejected) if !self.is_admin() => {
                Err(AppError::forbidden("Only administrators can decide requests"))
            }
            _ => Ok(()),
        }
    }

    pub fn authorize_account(&self, account_id: u64) -> AppResult<()> {
        if self.is_admin() || self.account_id == account_id {
            Ok(())
        } else {
            Err(AppError::forbidden("Not allowed to access this account"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn user(employee_id: Option<u64>) -> Principal {
        Principal {
            account_id: 10,
            role: Role::User,
            employee_id,
        }
    }

    fn admin() -> Principal {
        Principal {
            account_id: 1,
            role: Role::Admin,
            employee_id: None,
        }
    }

    fn request(employee_id: u64, status: RequestStatus) -> Request {
        Request {
            id: 5,
            employee_id,
            request_type: "Equipment".into(),
            status,
            request_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            created: Utc::now(),
            updated: None,
        }
    }

    #[test]
    fn other_employees_request_is_forbidden_in_any_status() {
        let e1 = user(Some(1));
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert!(matches!(
                e1.authorize_request_write(&request(2, status)),
                Err(AppError::Authorization { .. })
            ));
        }
    }

    #[test]
    fn owner_writes_only_while_pending() {
        let owner = user(Some(1));
        assert!(owner
            .authorize_request_write(&request(1, RequestStatus::Pending))
            .is_ok());
        assert!(owner
            .authorize_request_write(&request(1, RequestStatus::Approved))
            .is_err());
        assert!(admin()
            .authorize_request_write(&request(1, RequestStatus::Approved))
            .is_ok());
    }

    #[test]
    fn unlinked_account_owns_nothing() {
        assert!(user(None).authorize_owner(1).is_err());
        assert!(admin().authorize_owner(1).is_ok());
    }

    #[test]
    fn only_admins_decide() {
        let owner = user(Some(1));
        assert!(owner.authorize_status(Some(RequestStatus::Pending)).is_ok());
        assert!(owner.authorize_status(None).is_ok());
        assert!(owner.authorize_status(Some(RequestStatus::Approved)).is_err());
        assert!(admin().authorize_status(Some(RequestStatus::Rejected)).is_ok());
    }

    #[test]
    fn accounts_are_self_or_admin() {
        assert!(user(None).authorize_account(10).is_ok());
        assert!(user(None).authorize_account(11).is_err());
        assert!(admin().authorize_account(11).is_ok());
        assert!(user(None).require_admin().is_err());
    }
}
