// ── Area domain types ──
//
// A device exposes up to six independently controlled ventilation areas,
// keyed `area1`..`area6` on the wire.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Vendor device identifier (opaque string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Area index within a device, always in `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AreaId(u8);

impl AreaId {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn get(self) -> u8 {
        self.0
    }

    /// Wire key for this area (`area3`).
    pub fn key(self) -> String {
        format!("area{}", self.0)
    }

    /// Parse a wire key (`area1`..`area6`). Only the exact spelling
    /// produced by [`key()`](Self::key) is accepted.
    pub fn from_key(key: &str) -> Option<Self> {
        let id = key
            .strip_prefix("area")?
            .parse::<u8>()
            .ok()
            .and_then(|n| Self::try_from(n).ok())?;
        (id.key() == key).then_some(id)
    }
}

impl TryFrom<u8> for AreaId {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::InvalidArea { area: value })
        }
    }
}

impl From<AreaId> for u8 {
    fn from(value: AreaId) -> Self {
        value.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One area's remote state, with its mode already trimmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRecord {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Opaque schedule data, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timers: Option<Value>,
}

/// Normalized state of every area of one device, as of one successful poll.
///
/// Always replaced wholesale; never merged with an older snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub areas: BTreeMap<AreaId, AreaRecord>,
    pub captured_at: DateTime<Utc>,
}

impl DeviceSnapshot {
    pub fn area(&self, id: AreaId) -> Option<&AreaRecord> {
        self.areas.get(&id)
    }
}
