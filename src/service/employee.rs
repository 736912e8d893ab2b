use crate::{
    error::{AppError, AppResult},
    model::employee::{
        Employee, EmployeeDetails, EmployeePatch, NewEmployee, TransferOutcome, UpdateEmployee,
    },
    store::Repositories,
};

const RESOURCE: &str = "Employee";

fn non_blank(field: &'static str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(Some(field), format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub async fn list(repos: &Repositories) -> AppResult<Vec<EmployeeDetails>> {
    Ok(repos.employees.list().await?)
}

pub async fn get(repos: &Repositories, id: u64) -> AppResult<EmployeeDetails> {
    repos
        .employees
        .find_details(id)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))
}

pub async fn create(repos: &Repositories, input: NewEmployee) -> AppResult<Employee> {
    let position = non_blank("position", &input.position)?;
    let status = non_blank("status", &input.status)?;

    if repos.accounts.find(input.account_id).await?.is_none() {
        return Err(AppError::not_found("Account", input.account_id));
    }
    if repos.departments.find(input.department_id).await?.is_none() {
        return Err(AppError::not_found("Department", input.department_id));
    }
    if repos
        .employees
        .find_by_account(input.account_id)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(
            RESOURCE,
            "Account is already linked to an employee",
        ));
    }

    let employee = repos
        .employees
        .insert(NewEmployee {
            position,
            status,
            ..input
        })
        .await?;
    tracing::info!(
        employee_id = employee.id,
        account_id = employee.account_id,
        "Employee created"
    );
    Ok(employee)
}

/// Generic update. Account and department links are not editable here;
/// departments change through [`transfer`].
pub async fn update(repos: &Repositories, id: u64, input: UpdateEmployee) -> AppResult<Employee> {
    if input.account_id.is_some() {
        return Err(AppError::validation(
            Some("account_id"),
            "account_id cannot be changed",
        ));
    }
    if input.department_id.is_some() {
        return Err(AppError::validation(
            Some("department_id"),
            "Use the transfer operation to change department",
        ));
    }

    let patch = EmployeePatch {
        position: input
            .position
            .as_deref()
            .map(|p| non_blank("position", p))
            .transpose()?,
        hire_date: input.hire_date,
        status: input
            .status
            .as_deref()
            .map(|s| non_blank("status", s))
            .transpose()?,
    };

    repos
        .employees
        .update(id, patch)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))
}

pub async fn delete(repos: &Repositories, id: u64) -> AppResult<()> {
    if !repos.employees.delete(id).await? {
        return Err(AppError::not_found(RESOURCE, id));
    }
    tracing::info!(employee_id = id, "Employee deleted");
    Ok(())
}

pub async fn transfer(
    repos: &Repositories,
    id: u64,
    department_id: u64,
) -> AppResult<TransferOutcome> {
    let employee = repos
        .employees
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))?;
    let new_department = repos
        .departments
        .find(department_id)
        .await?
        .ok_or_else(|| AppError::not_found("Department", department_id))?
        .department;

    if employee.department_id == department_id {
        return Err(AppError::conflict(
            RESOURCE,
            "Employee already in this department",
        ));
    }

    let old_department = repos
        .departments
        .find(employee.department_id)
        .await?
        .ok_or_else(|| AppError::not_found("Department", employee.department_id))?
        .department;

    let employee = repos
        .employees
        .set_department(id, department_id)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))?;

    tracing::info!(
        employee_id = id,
        from = old_department.id,
        to = department_id,
        "Employee transferred"
    );
    Ok(TransferOutcome {
        employee,
        old_department,
        new_department,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::service::testing::{account, department};
    use chrono::NaiveDate;

    fn hire(account_id: u64, department_id: u64) -> NewEmployee {
        NewEmployee {
            account_id,
            department_id,
            position: "Engineer".into(),
            hire_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            status: "Active".into(),
        }
    }

    #[actix_web::test]
    async fn transfer_moves_once_then_conflicts() {
        let repos = Repositories::in_memory();
        let account_id = account(&repos, "t@x.io", Role::User).await;
        let _first = department(&repos, "Unused").await;
        let from = department(&repos, "Engineering").await;
        let to = department(&repos, "Sales").await;

        let emp = create(&repos, hire(account_id, from)).await.unwrap();
        assert_eq!(emp.department_id, from);

        let outcome = transfer(&repos, emp.id, to).await.unwrap();
        assert_eq!(outcome.employee.department_id, to);
        assert_eq!(outcome.old_department.name, "Engineering");
        assert_eq!(outcome.new_department.name, "Sales");
        assert_eq!(get(&repos, emp.id).await.unwrap().employee.department_id, to);

        let again = transfer(&repos, emp.id, to).await.unwrap_err();
        assert!(matches!(again, AppError::Conflict { .. }));
        assert_eq!(again.to_string(), "Employee already in this department");
    }

    #[actix_web::test]
    async fn create_checks_references_and_link() {
        let repos = Repositories::in_memory();
        let account_id = account(&repos, "c@x.io", Role::User).await;
        let dept = department(&repos, "Ops").await;

        assert!(matches!(
            create(&repos, hire(999, dept)).await,
            Err(AppError::NotFound { resource: "Account", .. })
        ));
        assert!(matches!(
            create(&repos, hire(account_id, 999)).await,
            Err(AppError::NotFound { resource: "Department", .. })
        ));

        create(&repos, hire(account_id, dept)).await.unwrap();
        assert!(matches!(
            create(&repos, hire(account_id, dept)).await,
            Err(AppError::Conflict { .. })
        ));
    }

    #[actix_web::test]
    async fn generic_update_cannot_move_department() {
        let repos = Repositories::in_memory();
        let account_id = account(&repos, "u@x.io", Role::User).await;
        let dept = department(&repos, "Ops").await;
        let other = department(&repos, "Legal").await;
        let emp = create(&repos, hire(account_id, dept)).await.unwrap();

        let err = update(
            &repos,
            emp.id,
            UpdateEmployee {
                department_id: Some(other),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some("department_id"), .. }));

        let updated = update(
            &repos,
            emp.id,
            UpdateEmployee {
                position: Some("Lead".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.position, "Lead");
        assert_eq!(updated.department_id, dept);
    }
}
