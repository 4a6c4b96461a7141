use poem_openapi::Enum;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an account. `Deleted` is terminal and never stored -
/// a deleted account simply has no row anymore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
#[oai(rename_all = "lowercase")]
pub enum AccountState {
    Pending,
    Active,
    Locked,
}
