//! Request dispatcher: the boundary the GUI talks to.
//!
//! Each endpoint wraps one store operation and turns its outcome into a
//! `Response`.  Nothing escapes as a panic or a raw error; every failure
//! becomes `{success: false, error}` with a readable message.
//!
//! Endpoints can be called directly (`get_secret`, `save_secret`, ...) or by
//! channel name through `dispatch`, which is what the JSON-lines server uses.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::response::Response;
use crate::errors::{Result, SecretsError};
use crate::vault::{Secret, SecretInput, SecretMetadata, SecretsStore};

#[cfg(feature = "audit-log")]
use crate::audit::AuditLog;

/// Every endpoint name the dispatcher answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    CheckEncryptionAvailable,
    GetAllSecretNames,
    GetAllSecrets,
    GetAllSecretsWithValues,
    CheckSecretExists,
    GetSecret,
    SaveSecret,
    DeleteSecret,
    SyncSecretNames,
}

impl Channel {
    pub const ALL: [Channel; 9] = [
        Channel::CheckEncryptionAvailable,
        Channel::GetAllSecretNames,
        Channel::GetAllSecrets,
        Channel::GetAllSecretsWithValues,
        Channel::CheckSecretExists,
        Channel::GetSecret,
        Channel::SaveSecret,
        Channel::DeleteSecret,
        Channel::SyncSecretNames,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckEncryptionAvailable => "check-encryption-available",
            Self::GetAllSecretNames => "get-all-secret-names",
            Self::GetAllSecrets => "get-all-secrets",
            Self::GetAllSecretsWithValues => "get-all-secrets-with-values",
            Self::CheckSecretExists => "check-secret-exists",
            Self::GetSecret => "get-secret",
            Self::SaveSecret => "save-secret",
            Self::DeleteSecret => "delete-secret",
            Self::SyncSecretNames => "sync-secret-names",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| SecretsError::UnknownChannel(s.to_string()))
    }
}

pub struct Dispatcher {
    store: SecretsStore,
    #[cfg(feature = "audit-log")]
    audit: Option<AuditLog>,
}

impl Dispatcher {
    pub fn new(store: SecretsStore) -> Self {
        Self {
            store,
            #[cfg(feature = "audit-log")]
            audit: None,
        }
    }

    /// Record successful mutations in `audit`.
    #[cfg(feature = "audit-log")]
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn store(&self) -> &SecretsStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Endpoints
    // ------------------------------------------------------------------

    /// Bare boolean, not an envelope.
    pub fn check_encryption_available(&self) -> bool {
        self.store.is_encryption_available()
    }

    pub fn get_all_secret_names(&self) -> Response<Vec<String>> {
        respond(Channel::GetAllSecretNames, self.store.list_names())
    }

    pub fn get_all_secrets(&self) -> Response<Vec<SecretMetadata>> {
        respond(Channel::GetAllSecrets, self.store.list_metadata())
    }

    pub fn get_all_secrets_with_values(&self) -> Response<Vec<Secret>> {
        respond(Channel::GetAllSecretsWithValues, self.store.list_secrets())
    }

    pub fn check_secret_exists(&self, name: &str) -> Response<bool> {
        respond(Channel::CheckSecretExists, self.store.exists(name))
    }

    pub fn get_secret(&self, name: &str) -> Response<Secret> {
        respond(Channel::GetSecret, self.store.get(name))
    }

    pub fn save_secret(&self, input: SecretInput) -> Response<()> {
        let name = input.name.clone();
        let result = self.store.save(input).map(|outcome| {
            self.audit("save", Some(&name), Some(outcome.as_str()));
        });
        respond(Channel::SaveSecret, result)
    }

    pub fn delete_secret(&self, name: &str) -> Response<()> {
        let result = self.store.delete(name).map(|()| {
            self.audit("delete", Some(name), None);
        });
        respond(Channel::DeleteSecret, result)
    }

    pub fn sync_secret_names(&self) -> Response<()> {
        let result = self.store.reconcile().map(|count| {
            self.audit("sync", None, Some(&format!("{count} name(s)")));
        });
        respond(Channel::SyncSecretNames, result)
    }

    // ------------------------------------------------------------------
    // Dispatch by name
    // ------------------------------------------------------------------

    /// Route a request by channel name and return the JSON response.
    ///
    /// `payload` is the endpoint's single argument: a name string for the
    /// name-taking endpoints, a secret object for `save-secret`, ignored
    /// otherwise.
    pub fn dispatch(&self, channel: &str, payload: Value) -> Value {
        debug!(channel, "dispatching request");

        let channel = match channel.parse::<Channel>() {
            Ok(channel) => channel,
            Err(e) => {
                warn!(error = %e, "rejected request");
                return to_json(&Response::<()>::from(e));
            }
        };

        match channel {
            Channel::CheckEncryptionAvailable => Value::Bool(self.check_encryption_available()),
            Channel::GetAllSecretNames => to_json(&self.get_all_secret_names()),
            Channel::GetAllSecrets => to_json(&self.get_all_secrets()),
            Channel::GetAllSecretsWithValues => to_json(&self.get_all_secrets_with_values()),
            Channel::CheckSecretExists => match name_arg(payload) {
                Ok(name) => to_json(&self.check_secret_exists(&name)),
                Err(e) => invalid(channel, e),
            },
            Channel::GetSecret => match name_arg(payload) {
                Ok(name) => to_json(&self.get_secret(&name)),
                Err(e) => invalid(channel, e),
            },
            Channel::SaveSecret => match serde_json::from_value::<SecretInput>(payload) {
                Ok(input) => to_json(&self.save_secret(input)),
                Err(e) => invalid(channel, SecretsError::InvalidRequest(e.to_string())),
            },
            Channel::DeleteSecret => match name_arg(payload) {
                Ok(name) => to_json(&self.delete_secret(&name)),
                Err(e) => invalid(channel, e),
            },
            Channel::SyncSecretNames => to_json(&self.sync_secret_names()),
        }
    }

    #[cfg(feature = "audit-log")]
    fn audit(&self, operation: &str, name: Option<&str>, details: Option<&str>) {
        if let Some(audit) = &self.audit {
            audit.log(operation, name, details);
        }
    }

    #[cfg(not(feature = "audit-log"))]
    fn audit(&self, _operation: &str, _name: Option<&str>, _details: Option<&str>) {}
}

/// Convert a store result into an envelope, logging failures.
fn respond<T>(channel: Channel, result: Result<T>) -> Response<T> {
    if let Err(e) = &result {
        warn!(%channel, kind = e.kind(), error = %e, "request failed");
    }
    result.into()
}

fn invalid(channel: Channel, err: SecretsError) -> Value {
    warn!(%channel, error = %err, "rejected request");
    to_json(&Response::<()>::from(err))
}

/// Accepts `"name"` or `{"name": "..."}`.
fn name_arg(payload: Value) -> Result<String> {
    match payload {
        Value::String(name) => Ok(name),
        Value::Object(mut map) => match map.remove("name") {
            Some(Value::String(name)) => Ok(name),
            _ => Err(SecretsError::InvalidRequest(
                "expected a secret name".into(),
            )),
        },
        _ => Err(SecretsError::InvalidRequest(
            "expected a secret name".into(),
        )),
    }
}

fn to_json<T: Serialize>(response: &Response<T>) -> Value {
    serde_json::to_value(response).unwrap_or_else(|e| {
        serde_json::json!({"success": false, "error": format!("failed to encode response: {e}")})
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_roundtrip() {
        for channel in Channel::ALL {
            assert_eq!(channel.as_str().parse::<Channel>().unwrap(), channel);
        }
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let err = "get-everything".parse::<Channel>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown channel: get-everything");
    }

    #[test]
    fn name_arg_accepts_string_or_object() {
        assert_eq!(name_arg(Value::from("a")).unwrap(), "a");
        assert_eq!(
            name_arg(serde_json::json!({"name": "b"})).unwrap(),
            "b"
        );
        assert!(name_arg(Value::Null).is_err());
        assert!(name_arg(serde_json::json!({"name": 3})).is_err());
    }
}
