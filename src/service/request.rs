//! Request lifecycle: a request is always stored together with exactly the
//! child detail its type calls for.

use chrono::{NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    model::request::{
        CreateRequest, DetailUpdate, ItemInput, LeaveDates, NewRequest, NewRequestDetail,
        NewRequestItem, RequestChange, RequestDetail, RequestKind, RequestRecord, RequestStatus,
        UpdateRequest,
    },
    store::Repositories,
};

const RESOURCE: &str = "Request";

fn leave_dates(start_date: NaiveDate, end_date: NaiveDate) -> AppResult<LeaveDates> {
    if start_date > end_date {
        return Err(AppError::validation(
            Some("end_date"),
            "end_date must not be before start_date",
        ));
    }
    Ok(LeaveDates {
        start_date,
        end_date,
    })
}

fn require_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<LeaveDates> {
    match (start, end) {
        (Some(start), Some(end)) => leave_dates(start, end),
        (None, _) => Err(AppError::validation(
            Some("start_date"),
            "Leave requests require start_date and end_date",
        )),
        (_, None) => Err(AppError::validation(
            Some("end_date"),
            "Leave requests require start_date and end_date",
        )),
    }
}

fn validate_items(items: Vec<ItemInput>) -> AppResult<Vec<NewRequestItem>> {
    if items.is_empty() {
        return Err(AppError::validation(
            Some("items"),
            "At least one item is required",
        ));
    }

    items
        .into_iter()
        .map(|item| {
            let name = item.name.trim();
            if name.is_empty() {
                return Err(AppError::validation(Some("items"), "Item name is required"));
            }
            let quantity = u32::try_from(item.quantity)
                .ok()
                .filter(|q| *q > 0)
                .ok_or_else(|| {
                    AppError::validation(
                        Some("items"),
                        format!("Quantity for {name} must be a positive number"),
                    )
                })?;
            Ok(NewRequestItem {
                name: name.to_string(),
                quantity,
            })
        })
        .collect()
}

pub async fn create(repos: &Repositories, input: CreateRequest) -> AppResult<RequestRecord> {
    let employee_id = input
        .employee_id
        .ok_or_else(|| AppError::validation(Some("employee_id"), "employee_id is required"))?;
    if repos.employees.find(employee_id).await?.is_none() {
        return Err(AppError::validation(
            Some("employee_id"),
            format!("Employee {employee_id} does not exist"),
        ));
    }

    let request_type = input
        .request_type
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::validation(Some("type"), "type is required"))?;

    let detail = match RequestKind::of(&request_type) {
        RequestKind::Leave => {
            NewRequestDetail::Leave(require_dates(input.start_date, input.end_date)?)
        }
        RequestKind::Items => {
            NewRequestDetail::Items(validate_items(input.items.unwrap_or_default())?)
        }
    };

    let record = repos
        .requests
        .insert(NewRequest {
            employee_id,
            request_type,
            status: RequestStatus::Pending,
            request_date: Utc::now().date_naive(),
            detail,
        })
        .await?;

    tracing::info!(
        request_id = record.request.id,
        employee_id,
        "Request created"
    );
    Ok(record)
}

pub async fn list(repos: &Repositories) -> AppResult<Vec<RequestRecord>> {
    Ok(repos.requests.list().await?)
}

pub async fn list_by_employee(
    repos: &Repositories,
    employee_id: u64,
) -> AppResult<Vec<RequestRecord>> {
    Ok(repos.requests.list_by_employee(employee_id).await?)
}

pub async fn get(repos: &Repositories, id: u64) -> AppResult<RequestRecord> {
    repos
        .requests
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))
}

/// Applies a status change and a detail change chosen by the stored type.
/// The type itself never changes.
pub async fn update(repos: &Repositories, id: u64, input: UpdateRequest) -> AppResult<RequestRecord> {
    let current = get(repos, id).await?;

    let detail = match &current.detail {
        RequestDetail::Leave(existing) => {
            let start = input
                .start_date
                .or(existing.as_ref().map(|l| l.start_date));
            let end = input.end_date.or(existing.as_ref().map(|l| l.end_date));
            DetailUpdate::Leave(require_dates(start, end)?)
        }
        RequestDetail::Items(_) => {
            DetailUpdate::Items(input.items.map(validate_items).transpose()?)
        }
    };

    let record = repos
        .requests
        .update(
            id,
            RequestChange {
                status: input.status,
                detail,
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found(RESOURCE, id))?;

    tracing::info!(request_id = id, status = %record.request.status, "Request updated");
    Ok(record)
}

pub async fn delete(repos: &Repositories, id: u64) -> AppResult<()> {
    if !repos.requests.delete(id).await? {
        return Err(AppError::not_found(RESOURCE, id));
    }
    tracing::info!(request_id = id, "Request deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::employee;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, day).unwrap()
    }

    fn item(name: &str, quantity: i64) -> ItemInput {
        ItemInput {
            name: name.into(),
            quantity,
        }
    }

    fn leave(employee_id: u64, start: Option<u32>, end: Option<u32>) -> CreateRequest {
        CreateRequest {
            employee_id: Some(employee_id),
            request_type: Some("Leave".into()),
            start_date: start.map(date),
            end_date: end.map(date),
            ..Default::default()
        }
    }

    fn equipment(employee_id: u64, items: Vec<ItemInput>) -> CreateRequest {
        CreateRequest {
            employee_id: Some(employee_id),
            request_type: Some("Equipment".into()),
            items: Some(items),
            ..Default::default()
        }
    }

    fn assert_validation(result: AppResult<RequestRecord>) {
        assert!(
            matches!(result, Err(AppError::Validation { .. })),
            "expected validation error, got {result:?}"
        );
    }

    #[actix_web::test]
    async fn leave_requires_both_dates() {
        let repos = Repositories::in_memory();
        let emp = employee(&repos, "a@x.io").await;

        assert_validation(create(&repos, leave(emp, Some(1), None)).await);
        assert_validation(create(&repos, leave(emp, None, Some(2))).await);
        assert_validation(create(&repos, leave(emp, Some(5), Some(2))).await);

        let record = create(&repos, leave(emp, Some(1), Some(3))).await.unwrap();
        assert_eq!(record.request.status, RequestStatus::Pending);
        match record.detail {
            RequestDetail::Leave(Some(l)) => {
                assert_eq!(l.request_id, record.request.id);
                assert_eq!((l.start_date, l.end_date), (date(1), date(3)));
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[actix_web::test]
    async fn item_requests_need_valid_items() {
        let repos = Repositories::in_memory();
        let emp = employee(&repos, "b@x.io").await;

        assert_validation(create(&repos, equipment(emp, vec![])).await);
        assert_validation(create(&repos, equipment(emp, vec![item("Laptop", 0)])).await);
        assert_validation(create(&repos, equipment(emp, vec![item("  ", 1)])).await);

        let record = create(
            &repos,
            equipment(emp, vec![item("Laptop", 1), item("Mouse", 2), item("Badge", 1)]),
        )
        .await
        .unwrap();
        match record.detail {
            RequestDetail::Items(items) => assert_eq!(items.len(), 3),
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[actix_web::test]
    async fn unresolvable_employee_or_missing_type_is_invalid() {
        let repos = Repositories::in_memory();
        assert_validation(create(&repos, leave(99, Some(1), Some(2))).await);
        assert_validation(create(&repos, CreateRequest::default()).await);

        let emp = employee(&repos, "c@x.io").await;
        assert_validation(
            create(
                &repos,
                CreateRequest {
                    employee_id: Some(emp),
                    ..Default::default()
                },
            )
            .await,
        );
    }

    #[actix_web::test]
    async fn leave_update_ignores_items_and_keeps_one_leave_row() {
        let repos = Repositories::in_memory();
        let emp = employee(&repos, "d@x.io").await;
        let created = create(&repos, leave(emp, Some(1), Some(3))).await.unwrap();

        let updated = update(
            &repos,
            created.request.id,
            UpdateRequest {
                end_date: Some(date(4)),
                items: Some(vec![item("Laptop", 1)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        match updated.detail {
            RequestDetail::Leave(Some(l)) => {
                assert_eq!((l.start_date, l.end_date), (date(1), date(4)))
            }
            other => panic!("unexpected detail {other:?}"),
        }
        let stored = get(&repos, created.request.id).await.unwrap();
        assert!(matches!(stored.detail, RequestDetail::Leave(Some(_))));
    }

    #[actix_web::test]
    async fn item_update_replaces_list_wholesale() {
        let repos = Repositories::in_memory();
        let emp = employee(&repos, "e@x.io").await;
        let created = create(&repos, equipment(emp, vec![item("Laptop", 1), item("Mouse", 1)]))
            .await
            .unwrap();

        let updated = update(
            &repos,
            created.request.id,
            UpdateRequest {
                status: Some(RequestStatus::Approved),
                items: Some(vec![item("Monitor", 2)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.request.status, RequestStatus::Approved);
        match updated.detail {
            RequestDetail::Items(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].name, "Monitor");
                assert_eq!(items[0].quantity, 2);
            }
            other => panic!("unexpected detail {other:?}"),
        }

        let empty = update(
            &repos,
            created.request.id,
            UpdateRequest {
                items: Some(vec![]),
                ..Default::default()
            },
        )
        .await;
        assert_validation(empty);
    }

    #[actix_web::test]
    async fn missing_request_is_not_found() {
        let repos = Repositories::in_memory();
        assert!(matches!(
            update(&repos, 42, UpdateRequest::default()).await,
            Err(AppError::NotFound { id: 42, .. })
        ));
        assert!(matches!(
            delete(&repos, 42).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[actix_web::test]
    async fn delete_removes_children() {
        let repos = Repositories::in_memory();
        let emp = employee(&repos, "f@x.io").await;
        let created = create(&repos, equipment(emp, vec![item("Laptop", 1)]))
            .await
            .unwrap();

        delete(&repos, created.request.id).await.unwrap();
        assert!(list_by_employee(&repos, emp).await.unwrap().is_empty());
        assert!(matches!(
            get(&repos, created.request.id).await,
            Err(AppError::NotFound { .. })
        ));
    }
}
