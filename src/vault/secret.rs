//! Secret records and the shapes derived from them.
//!
//! Field names serialize in camelCase (`createdAt`, `updatedAt`) because
//! both the encrypted blob and the IPC payloads are read by the GUI side.
//! Absent optional fields are omitted rather than written as `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// Unique key of the record (e.g. "api-key").
    pub name: String,

    /// Cleartext payload.  Only ever at rest inside the encrypted blob.
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Set once when the record is first saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Refreshed on every successful save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Secret {
    /// Project to metadata, dropping the value.
    pub fn metadata(&self) -> SecretMetadata {
        SecretMetadata {
            name: self.name.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// What a caller hands to `save`.
///
/// `value` is optional here only so that a missing field can be reported as
/// a validation error instead of a deserialization error.  Timestamps
/// supplied by the caller are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretInput {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl SecretInput {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Lightweight metadata about a secret (no value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretMetadata {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
