//! Workflow recorder: appends audit entries for HR events with a readable
//! `details` line. Details are fixed at creation.

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    model::workflow::{
        CreateWorkflow, DEPARTMENT_TRANSFER, NewWorkflow, ONBOARDING, REQUEST_APPROVAL,
        ResourceLine, Workflow, WorkflowPatch, WorkflowStatus,
    },
    store::Repositories,
};

const RESOURCE: &str = "Workflow";
const ONBOARDING_DETAILS: &str = "Setting up workstation";

pub fn pluralize(name: &str, quantity: u32) -> String {
    if quantity == 1 {
        return name.to_string();
    }
    let lower = name.to_lowercase();
    let suffix = if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|end| lower.ends_with(end))
    {
        "es"
    } else {
        "s"
    };
    format!("{name}{suffix}")
}

/// "1 Laptop", "2 Laptops, and 1 Mouse", "2 Laptops, 1 Mouse, and 3 Badges".
pub fn summarize_items(items: &[ResourceLine]) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|i| format!("{} {}", i.quantity, pluralize(&i.name, i.quantity)))
        .collect();

    match parts.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

/// The owner's display name, or a neutral label when the account is gone.
async fn employee_label(repos: &Repositories, employee_id: u64) -> AppResult<String> {
    let employee = repos
        .employees
        .find(employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee", employee_id))?;

    Ok(repos
        .accounts
        .find(employee.account_id)
        .await?
        .map(|a| a.full_name())
        .unwrap_or_else(|| "Employee".to_string()))
}

async fn append(
    repos: &Repositories,
    employee_id: u64,
    workflow_type: &str,
    details: String,
) -> AppResult<Workflow> {
    let workflow = repos
        .workflows
        .insert(NewWorkflow {
            employee_id,
            workflow_type: workflow_type.to_string(),
            details,
            status: WorkflowStatus::Pending,
        })
        .await?;
    tracing::info!(
        workflow_id = workflow.id,
        employee_id,
        kind = workflow_type,
        "Workflow recorded"
    );
    Ok(workflow)
}

pub async fn record_onboarding(repos: &Repositories, employee_id: u64) -> AppResult<Workflow> {
    employee_label(repos, employee_id).await?;
    append(repos, employee_id, ONBOARDING, ONBOARDING_DETAILS.to_string()).await
}

pub async fn record_transfer(
    repos: &Repositories,
    employee_id: u64,
    old_department: &str,
    new_department: &str,
) -> AppResult<Workflow> {
    let who = employee_label(repos, employee_id).await?;
    let details = format!("{who} transferred from {old_department} to {new_department}");
    append(repos, employee_id, DEPARTMENT_TRANSFER, details).await
}

pub async fn record_leave(
    repos: &Repositories,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> AppResult<Workflow> {
    let who = employee_label(repos, employee_id).await?;
    let details = format!("{who} requested leave from {start_date} to {end_date}");
    append(repos, employee_id, REQUEST_APPROVAL, details).await
}

pub async fn record_resources(
    repos: &Repositories,
    employee_id: u64,
    items: &[ResourceLine],
) -> AppResult<Workflow> {
    if items.is_empty() {
        return Err(AppError::validation(
            Some("items"),
            "At least one item is required",
        ));
    }
    if items.iter().any(|i| i.quantity == 0 || i.name.trim().is_empty()) {
        return Err(AppError::validation(
            Some("items"),
            "Every item needs a name and a positive quantity",
        ));
    }
    let who = employee_label(repos, employee_id).await?;
    let details = format!("{who} requested {}", summarize_items(items));
    append(repos, employee_id, REQUEST_APPROVAL, details).await
}

pub async fn create(repos: &Repositories, input: CreateWorkflow) -> AppResult<Workflow> {
    let workflow_type = input.workflow_type.trim();
    if workflow_type.is_empty() {
        return Err(AppError::validation(Some("type"), "type is required"));
    }
    if input.details.trim().is_empty() {
        return Err(AppError::validation(Some("details"), "details is required"));
    }
    if repos.employees.find(input.employee_id).await?.is_none() {
        return Err(AppError::not_found("Employee", input.employee_id));
    }

    let workflow = repos
        .workflows
        .insert(NewWorkflow {
            employee_id: input.employee_id,
            workflow_type: workflow_type.to_string(),
            details: input.details,
            status: input.status.unwrap_or_default(),
        })
        .await?;
    Ok(workflow)
}

pub async fn list(repos: &Repositories) -> AppResult<Vec<Workflow>> {
    Ok(repos.workflows.list().await?)
}

pub async fn list_by_employee(repos: &Repositories, employee_id: u64) -> AppResult<Vec<Workflow>> {
    Ok(repos.workflows.list_by_employee(employee_id).await?)
}

pub async fn get(repos: &Repositories, id: u64) -> AppResult<Workflow> {
    repos
        .workflows
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))
}

pub async fn update(repos: &Repositories, id: u64, patch: WorkflowPatch) -> AppResult<Workflow> {
    repos
        .workflows
        .update(id, patch)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))
}

pub async fn delete(repos: &Repositories, id: u64) -> AppResult<()> {
    if !repos.workflows.delete(id).await? {
        return Err(AppError::not_found(RESOURCE, id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::employee;

    fn line(quantity: u32, name: &str) -> ResourceLine {
        ResourceLine {
            name: name.into(),
            quantity,
        }
    }

    #[test]
    fn summary_of_one_item() {
        assert_eq!(summarize_items(&[line(1, "Laptop")]), "1 Laptop");
    }

    #[test]
    fn summary_of_two_items() {
        assert_eq!(
            summarize_items(&[line(2, "Laptop"), line(1, "Mouse")]),
            "2 Laptops, and 1 Mouse"
        );
    }

    #[test]
    fn summary_of_three_items() {
        assert_eq!(
            summarize_items(&[line(2, "Laptop"), line(1, "Mouse"), line(3, "Badge")]),
            "2 Laptops, 1 Mouse, and 3 Badges"
        );
    }

    #[test]
    fn pluralizes_sibilant_endings() {
        assert_eq!(pluralize("Box", 2), "Boxes");
        assert_eq!(pluralize("Headset", 2), "Headsets");
        assert_eq!(pluralize("Bench", 3), "Benches");
        assert_eq!(pluralize("Pass", 2), "Passes");
        assert_eq!(pluralize("Mouse", 1), "Mouse");
    }

    #[actix_web::test]
    async fn details_name_the_employee() {
        let repos = Repositories::in_memory();
        let emp = employee(&repos, "w@x.io").await;

        let w = record_transfer(&repos, emp, "Ops", "Sales").await.unwrap();
        assert_eq!(w.details, "Test User transferred from Ops to Sales");
        assert_eq!(w.workflow_type, DEPARTMENT_TRANSFER);
        assert_eq!(w.status, WorkflowStatus::Pending);

        let w = record_leave(
            &repos,
            emp,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(w.details, "Test User requested leave from 2026-01-01 to 2026-01-03");

        let w = record_resources(&repos, emp, &[line(2, "Laptop")]).await.unwrap();
        assert_eq!(w.details, "Test User requested 2 Laptops");

        let w = record_onboarding(&repos, emp).await.unwrap();
        assert_eq!(w.details, ONBOARDING_DETAILS);
    }

    #[actix_web::test]
    async fn unknown_employee_and_empty_items_are_rejected() {
        let repos = Repositories::in_memory();
        assert!(matches!(
            record_onboarding(&repos, 77).await,
            Err(AppError::NotFound { resource: "Employee", .. })
        ));

        let emp = employee(&repos, "v@x.io").await;
        assert!(matches!(
            record_resources(&repos, emp, &[]).await,
            Err(AppError::Validation { .. })
        ));
    }

    #[actix_web::test]
    async fn update_keeps_details() {
        let repos = Repositories::in_memory();
        let emp = employee(&repos, "u@x.io").await;
        let w = record_onboarding(&repos, emp).await.unwrap();

        let updated = update(
            &repos,
            w.id,
            WorkflowPatch {
                status: Some(WorkflowStatus::Completed),
                comments: Some("Desk ready".into()),
                handled_by: Some(1),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, WorkflowStatus::Completed);
        assert_eq!(updated.details, ONBOARDING_DETAILS);
        assert_eq!(updated.comments.as_deref(), Some("Desk ready"));

        delete(&repos, w.id).await.unwrap();
        assert!(matches!(get(&repos, w.id).await, Err(AppError::NotFound { .. })));
    }
}
