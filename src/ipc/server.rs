//! JSON-lines request loop.
//!
//! One request per input line, one response per output line, strictly in
//! order.  A request looks like:
//!
//! ```json
//! {"channel": "get-secret", "payload": "api-key"}
//! ```
//!
//! Lines that are not valid requests get an error envelope back; blank
//! lines are skipped.  The loop ends at end of input.

use std::io::{BufRead, Write};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::dispatcher::Dispatcher;
use super::response::Response;
use crate::errors::{Result, SecretsError};

#[derive(Debug, Deserialize)]
struct Request {
    channel: String,
    #[serde(default)]
    payload: Value,
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
///
/// Returns the number of requests answered.  Only I/O failures on the
/// streams themselves end the loop early.
pub fn serve<R: BufRead, W: Write>(dispatcher: &Dispatcher, reader: R, mut writer: W) -> Result<usize> {
    let mut answered = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatcher.dispatch(&request.channel, request.payload),
            Err(e) => {
                debug!(error = %e, "unparseable request line");
                let err = SecretsError::InvalidRequest(e.to_string());
                serde_json::to_value(Response::<()>::from(err))
                    .map_err(|e| SecretsError::InvalidRequest(e.to_string()))?
            }
        };

        serde_json::to_writer(&mut writer, &response)
            .map_err(|e| SecretsError::Io(e.into()))?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        answered += 1;
    }

    info!(answered, "input closed, stopping");
    Ok(answered)
}
