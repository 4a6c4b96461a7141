use chrono::{DateTime, Utc};
use membergate_common::AccountState;
use poem_openapi::Object;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Object)]
#[sea_orm(table_name = "accounts")]
#[oai(rename = "Account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub username: String,

    /// Always collected; the login identity when `login_mode` is `email`
    #[sea_orm(unique)]
    pub email: String,

    #[oai(skip)]
    #[serde(skip)]
    #[sea_orm(column_type = "Text")]
    pub password_hash: String,

    /// Empty once the account is verified
    #[oai(skip)]
    #[serde(skip)]
    pub activation_code: String,

    /// Set when verification completes
    pub activation_datetime: Option<DateTime<Utc>>,

    /// When the pending-account reminder mail went out, at most once
    pub reminder_datetime: Option<DateTime<Utc>>,

    #[oai(skip)]
    #[serde(skip)]
    pub recovery_code: String,
    pub recovery_datetime: Option<DateTime<Utc>>,

    #[oai(skip)]
    #[serde(skip)]
    pub delete_code: String,
    pub delete_datetime: Option<DateTime<Utc>>,

    /// Non-empty while the account is locked; the lock has no expiry
    #[oai(skip)]
    #[serde(skip)]
    pub unlock_code: String,

    pub created: DateTime<Utc>,

    /// Locale the user registered under; all mail to them is composed in it
    pub language: String,

    /// None = no explicit preference yet (activation may auto-enable)
    pub two_factor: Option<bool>,
}

// `DeriveEntityModel` hardcodes the derives on `Column`; this matches what
// `#[derive(PartialEq)]` would generate for the fieldless enum.
impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        panic!("No relations defined")
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_pending(&self) -> bool {
        !self.activation_code.is_empty()
    }

    pub fn is_locked(&self) -> bool {
        !self.unlock_code.is_empty()
    }

    pub fn two_factor_enabled(&self) -> bool {
        self.two_factor.unwrap_or(false)
    }

    /// The lock takes precedence: a pending account can be locked too, and
    /// must unlock before any reminder logic applies again.
    pub fn state(&self) -> AccountState {
        if self.is_locked() {
            AccountState::Locked
        } else if self.is_pending() {
            AccountState::Pending
        } else {
            AccountState::Active
        }
    }
}
