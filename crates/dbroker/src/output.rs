//! Command output
//!
//! Results are printed to stdout as pretty JSON; logs go to stderr.
//! Failures are printed as JSON too, carrying the broker status code.

use anyhow::{Context, Result};
use serde::Serialize;

/// Status reported for failures that did not come from the broker
const INTERNAL_ERROR: u16 = 500;

/// Print a value as JSON
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

/// Print a status object with an `ok` flag
pub fn status(message: &str) -> Result<()> {
    json(&serde_json::json!({ "ok": true, "message": message }))
}

/// Broker status code of the first broker error in the chain
pub fn status_code(err: &anyhow::Error) -> u16 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<dbroker_core::Error>())
        .map(dbroker_core::Error::status_code)
        .unwrap_or(INTERNAL_ERROR)
}

/// Process exit code for a status: 2 for caller faults, 1 otherwise
pub fn exit_code(status: u16) -> i32 {
    if (400..500).contains(&status) {
        2
    } else {
        1
    }
}

/// Print a failure with its status code
pub fn failure(status: u16, err: &anyhow::Error) -> Result<()> {
    json(&failure_body(status, err))
}

fn failure_body(status: u16, err: &anyhow::Error) -> serde_json::Value {
    serde_json::json!({
        "ok": false,
        "status": status,
        "error": format!("{:#}", err),
    })
}
