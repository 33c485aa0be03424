//! Account-level JetStream usage.

use serde::{Deserialize, Serialize};

/// JetStream usage and limits of the current account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountInfo {
    pub memory: u64,
    #[serde(rename = "storage")]
    pub store: u64,
    pub streams: usize,
    pub consumers: usize,
    pub api: ApiStats,
    pub limits: AccountLimits,
}

/// API calls made by this account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiStats {
    pub total: u64,
    pub errors: u64,
}

/// Account limits; `-1` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountLimits {
    pub max_memory: i64,
    #[serde(rename = "max_storage")]
    pub max_store: i64,
    pub max_streams: i64,
    pub max_consumers: i64,
}
