use anyhow::Context as _;
use axum::http::StatusCode;
use serde_json::Value;

/// Assert status code matches expected
pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(
        actual, expected,
        "{context}: expected status {expected}, got {actual}"
    );
}

/// Package ids of `data`, in response order.
pub fn data_ids(body: &Value) -> anyhow::Result<Vec<i64>> {
    body.get("data")
        .and_then(|d| d.as_array())
        .context("response has data array")?
        .iter()
        .map(|item| item.get("id").and_then(|v| v.as_i64()).context("item has id"))
        .collect()
}

pub fn meta_u64(body: &Value, key: &str) -> anyhow::Result<u64> {
    body.get("meta")
        .and_then(|m| m.get(key))
        .and_then(|v| v.as_u64())
        .with_context(|| format!("meta.{key} is an unsigned integer"))
}

/// Error code from an `{"error": {"code", "message"}}` body.
pub fn error_code(body: &Value) -> anyhow::Result<&str> {
    body.get("error")
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str())
        .context("response has error.code")
}

pub fn assert_ids(body: &Value, expected: &[i64], context: &str) -> anyhow::Result<()> {
    let ids = data_ids(body)?;
    assert_eq!(ids, expected, "{context}: unexpected package ids");
    Ok(())
}

pub fn assert_invalid_input(status: StatusCode, body: &Value, context: &str) -> anyhow::Result<()> {
    assert_status(status, StatusCode::BAD_REQUEST, context);
    assert_eq!(error_code(body)?, "invalid_input", "{context}: error code");
    Ok(())
}
