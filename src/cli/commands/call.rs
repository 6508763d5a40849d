//! `secretsafe call` — send one request and print the response.

use serde_json::Value;

use crate::cli::build_dispatcher;
use crate::config::Settings;
use crate::errors::Result;
use crate::ipc::Channel;

/// Execute the `call` command.
///
/// An error envelope is still a successful call: it is printed and the
/// process exits 0, just as the GUI would receive it.
pub fn execute(settings: &Settings, channel: &str, payload: Option<&str>) -> Result<()> {
    let dispatcher = build_dispatcher(settings)?;

    let response = dispatcher.dispatch(channel, parse_payload(channel, payload));
    println!("{response}");

    Ok(())
}

/// JSON if it parses, otherwise the raw text as a string.
///
/// Name-taking channels only accept a JSON string or object; anything else
/// (`2024`, `true`, `null`) is the literal name.
fn parse_payload(channel: &str, payload: Option<&str>) -> Value {
    let Some(raw) = payload else {
        return Value::Null;
    };

    let takes_name = matches!(
        channel.parse::<Channel>(),
        Ok(Channel::GetSecret | Channel::CheckSecretExists | Channel::DeleteSecret)
    );

    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::String(_) | Value::Object(_))) => value,
        Ok(value) if !takes_name => value,
        _ => Value::String(raw.to_string()),
    }
}
