use crate::{
    error::{AppError, AppResult},
    model::department::{Department, DepartmentPatch, DepartmentSummary, NewDepartment},
    store::Repositories,
};

const RESOURCE: &str = "Department";

fn required_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation(Some("name"), "name is required"));
    }
    Ok(name.to_string())
}

pub async fn list(repos: &Repositories) -> AppResult<Vec<DepartmentSummary>> {
    Ok(repos.departments.list().await?)
}

pub async fn get(repos: &Repositories, id: u64) -> AppResult<DepartmentSummary> {
    repos
        .departments
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))
}

pub async fn create(repos: &Repositories, input: NewDepartment) -> AppResult<Department> {
    let department = repos
        .departments
        .insert(NewDepartment {
            name: required_name(&input.name)?,
            description: input.description,
        })
        .await?;
    tracing::info!(department_id = department.id, "Department created");
    Ok(department)
}

pub async fn update(repos: &Repositories, id: u64, patch: DepartmentPatch) -> AppResult<Department> {
    let patch = DepartmentPatch {
        name: patch.name.as_deref().map(required_name).transpose()?,
        description: patch.description,
    };
    repos
        .departments
        .update(id, patch)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))
}

/// Refuses while any employee is still assigned.
pub async fn delete(repos: &Repositories, id: u64) -> AppResult<()> {
    let summary = get(repos, id).await?;
    if summary.employee_count > 0 {
        return Err(AppError::conflict(
            RESOURCE,
            format!(
                "Department cannot be deleted because it has {} employees assigned",
                summary.employee_count
            ),
        ));
    }
    if !repos.departments.delete(id).await? {
        return Err(AppError::not_found(RESOURCE, id));
    }
    tracing::info!(department_id = id, "Department deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::employee;

    #[actix_web::test]
    async fn delete_is_blocked_while_staffed() {
        let repos = Repositories::in_memory();
        let emp = employee(&repos, "d@x.io").await;
        let dept_id = repos.employees.find(emp).await.unwrap().unwrap().department_id;

        let err = delete(&repos, dept_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(get(&repos, dept_id).await.unwrap().employee_count, 1);
        assert!(repos.employees.find(emp).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn create_update_delete_empty_department() {
        let repos = Repositories::in_memory();
        assert!(matches!(
            create(
                &repos,
                NewDepartment {
                    name: " ".into(),
                    description: None
                }
            )
            .await,
            Err(AppError::Validation { .. })
        ));

        let d = create(
            &repos,
            NewDepartment {
                name: "Finance".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        let renamed = update(
            &repos,
            d.id,
            DepartmentPatch {
                name: Some("Treasury".into()),
                description: Some("Cash".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Treasury");

        delete(&repos, d.id).await.unwrap();
        assert!(matches!(
            delete(&repos, d.id).await,
            Err(AppError::NotFound { .. })
        ));
    }
}
