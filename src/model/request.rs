use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// The only request type label that carries leave dates. Every other label
/// is an item-based request.
pub const LEAVE_REQUEST_TYPE: &str = "Leave";

#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RequestKind {
    Leave,
    Items,
}

impl RequestKind {
    pub fn of(request_type: &str) -> Self {
        if request_type == LEAVE_REQUEST_TYPE {
            RequestKind::Leave
        } else {
            RequestKind::Items
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Request {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[serde(rename = "type")]
    #[schema(example = "Leave")]
    pub request_type: String,
    pub status: RequestStatus,
    #[schema(example = "2026-01-01")]
    pub request_date: NaiveDate,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        RequestKind::of(&self.request_type)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestItem {
    pub id: u64,
    pub request_id: u64,
    #[schema(example = "Laptop")]
    pub name: String,
    #[schema(example = 2)]
    pub quantity: u32,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestLeave {
    pub id: u64,
    pub request_id: u64,
    #[schema(example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03")]
    pub end_date: NaiveDate,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

/// The child rows of a request. Which variant exists is decided by the
/// request's type, never by what happens to be stored.
#[derive(Debug, Clone)]
pub enum RequestDetail {
    Leave(Option<RequestLeave>),
    Items(Vec<RequestItem>),
}

#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub request: Request,
    pub detail: RequestDetail,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestResponse {
    #[serde(flatten)]
    pub request: Request,
    pub request_items: Vec<RequestItem>,
    pub request_leave: Option<RequestLeave>,
}

impl From<RequestRecord> for RequestResponse {
    fn from(record: RequestRecord) -> Self {
        let (request_items, request_leave) = match record.detail {
            RequestDetail::Leave(leave) => (Vec::new(), leave),
            RequestDetail::Items(items) => (items, None),
        };
        Self {
            request: record.request,
            request_items,
            request_leave,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LeaveDates {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequestItem {
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone)]
pub enum NewRequestDetail {
    Leave(LeaveDates),
    Items(Vec<NewRequestItem>),
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub employee_id: u64,
    pub request_type: String,
    pub status: RequestStatus,
    pub request_date: NaiveDate,
    pub detail: NewRequestDetail,
}

/// How an update touches the child rows. Both variants also purge the
/// child kind that does not match.
#[derive(Debug, Clone)]
pub enum DetailUpdate {
    /// Upsert the leave row, delete every item row.
    Leave(LeaveDates),
    /// Replace the item rows wholesale when `Some`, delete the leave row.
    Items(Option<Vec<NewRequestItem>>),
}

#[derive(Debug, Clone)]
pub struct RequestChange {
    pub status: Option<RequestStatus>,
    pub detail: DetailUpdate,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ItemInput {
    #[schema(example = "Laptop")]
    pub name: String,
    #[schema(example = 1)]
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateRequest {
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[serde(rename = "type")]
    #[schema(example = "Equipment")]
    pub request_type: Option<String>,
    #[schema(example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-03")]
    pub end_date: Option<NaiveDate>,
    pub items: Option<Vec<ItemInput>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRequest {
    pub status: Option<RequestStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub items: Option<Vec<ItemInput>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(request_type: &str) -> Request {
        Request {
            id: 1,
            employee_id: 2,
            request_type: request_type.to_string(),
            status: RequestStatus::Pending,
            request_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            created: Utc::now(),
            updated: None,
        }
    }

    #[test]
    fn only_leave_label_selects_leave_kind() {
        assert_eq!(request("Leave").kind(), RequestKind::Leave);
        assert_eq!(request("Equipment").kind(), RequestKind::Items);
        assert_eq!(request("leave").kind(), RequestKind::Items);
    }

    #[test]
    fn response_exposes_only_matching_children() {
        let record = RequestRecord {
            request: request("Leave"),
            detail: RequestDetail::Leave(None),
        };
        let body = serde_json::to_value(RequestResponse::from(record)).unwrap();
        assert_eq!(body["type"], "Leave");
        assert_eq!(body["status"], "Pending");
        assert_eq!(body["request_items"], serde_json::json!([]));
        assert!(body["request_leave"].is_null());
    }
}
