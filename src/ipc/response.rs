//! The uniform success/error envelope returned by every endpoint.
//!
//! ```json
//! {"success": true,  "data": ...}
//! {"success": false, "error": "Secret not found"}
//! ```

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::errors::{Result, SecretsError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response<T> {
    Success(T),
    Error(String),
}

impl<T> Response<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Error(msg) => Some(msg),
        }
    }
}

impl<T> From<Result<T>> for Response<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(e) => Self::from(e),
        }
    }
}

impl<T> From<SecretsError> for Response<T> {
    fn from(err: SecretsError) -> Self {
        Self::Error(err.to_string())
    }
}

impl<T: Serialize> Serialize for Response<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Response", 2)?;
        match self {
            Self::Success(data) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            Self::Error(msg) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", msg)?;
            }
        }
        state.end()
    }
}
