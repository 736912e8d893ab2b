pub mod account;
pub mod department;
pub mod employee;
pub mod request;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{NaiveDate, Utc};

    use crate::model::{
        account::{AccountStatus, NewAccount},
        department::NewDepartment,
        employee::NewEmployee,
        role::Role,
    };
    use crate::store::Repositories;

    pub async fn account(repos: &Repositories, email: &str, role: Role) -> u64 {
        repos
            .accounts
            .insert(NewAccount {
                title: None,
                first_name: "Test".into(),
                last_name: "User".into(),
                email: email.into(),
                role,
                password_hash: "x".into(),
                status: AccountStatus::Active,
                verification_token: None,
                verified: Some(Utc::now()),
            })
            .await
            .unwrap()
            .id
    }

    pub async fn department(repos: &Repositories, name: &str) -> u64 {
        repos
            .departments
            .insert(NewDepartment {
                name: name.into(),
                description: None,
            })
            .await
            .unwrap()
            .id
    }

    /// A fresh account and department with one employee linking them.
    pub async fn employee(repos: &Repositories, email: &str) -> u64 {
        let account_id = account(repos, email, Role::User).await;
        let department_id = department(repos, "Ops").await;
        repos
            .employees
            .insert(NewEmployee {
                account_id,
                department_id,
                position: "Analyst".into(),
                hire_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                status: "Active".into(),
            })
            .await
            .unwrap()
            .id
    }
}
