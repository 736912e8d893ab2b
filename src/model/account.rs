use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum AccountStatus {
    Active,
    Inactive,
}

/// Stored account row. Secrets never leave the service layer; responses go
/// through [`AccountDetails`].
#[derive(Debug, Clone)]
pub struct Account {
    pub id: u64,
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub status: AccountStatus,
    pub verification_token: Option<String>,
    pub verified: Option<DateTime<Utc>>,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl Account {
    pub fn is_verified(&self) -> bool {
        self.verified.is_some()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub status: AccountStatus,
    pub verification_token: Option<String>,
    pub verified: Option<DateTime<Utc>>,
}

/// Column-level changes to an account. `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
    pub password_hash: Option<String>,
    pub verification_token: Option<Option<String>>,
    pub verified: Option<DateTime<Utc>>,
    pub reset_token: Option<Option<String>>,
    pub reset_token_expires: Option<Option<DateTime<Utc>>>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountDetails {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Mr")]
    pub title: Option<String>,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub is_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl From<&Account> for AccountDetails {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            title: a.title.clone(),
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
            email: a.email.clone(),
            role: a.role,
            status: a.status,
            is_verified: a.is_verified(),
            last_login: a.last_login,
            created: a.created,
            updated: a.updated,
        }
    }
}

/// The account fields embedded in employee listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountSummary {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
}

impl From<&Account> for AccountSummary {
    fn from(a: &Account) -> Self {
        Self {
            email: a.email.clone(),
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
            title: a.title.clone(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterAccount {
    #[schema(example = "Mr")]
    pub title: Option<String>,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub accept_terms: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateAccount {
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[schema(format = "email")]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateAccount {
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[schema(format = "email")]
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
}
