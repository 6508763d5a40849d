//! IPC boundary — the request/response contract the GUI process uses.
//!
//! This module provides:
//! - The `{success, data | error}` envelope (`response`)
//! - Named endpoints over a `SecretsStore` (`dispatcher`)
//! - A JSON-lines loop over any reader/writer pair (`server`)

pub mod dispatcher;
pub mod response;
pub mod server;

pub use dispatcher::{Channel, Dispatcher};
pub use response::Response;
pub use server::serve;
