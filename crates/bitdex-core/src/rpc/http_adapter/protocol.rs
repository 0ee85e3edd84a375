use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::de::DeserializeOwned;

use crate::error::RpcError;

/// Bodies up to this size are quoted in decode errors.
const MAX_ERROR_SNIPPET: usize = 2048;

#[derive(serde::Serialize)]
pub(super) struct JsonRpcRequest<'a> {
    pub(super) jsonrpc: &'static str,
    pub(super) id: u64,
    pub(super) method: &'a str,
    pub(super) params: serde_json::Value,
}

#[derive(serde::Deserialize)]
pub(super) struct JsonRpcResponse {
    pub(super) result: Option<serde_json::Value>,
    pub(super) error: Option<serde_json::Value>,
}

#[derive(serde::Deserialize)]
pub(super) struct JsonRpcResponseOwned {
    pub(super) id: serde_json::Value,
    pub(super) result: Option<serde_json::Value>,
    pub(super) error: Option<serde_json::Value>,
}

/// Decode a response body, converting a panic in the decoder into
/// [`RpcError::Protocol`].
pub(super) fn safe_decode<T: DeserializeOwned>(body: &str) -> Result<T, RpcError> {
    match catch_unwind(AssertUnwindSafe(|| serde_json::from_str::<T>(body))) {
        Ok(Ok(decoded)) => Ok(decoded),
        Ok(Err(e)) => Err(RpcError::Protocol(format!(
            "decode JSON-RPC response: {e}; body={}",
            snippet(body)
        ))),
        Err(_) => Err(RpcError::Protocol(format!(
            "decoder panicked; body={}",
            snippet(body)
        ))),
    }
}

fn snippet(body: &str) -> &str {
    if body.len() < MAX_ERROR_SNIPPET {
        body
    } else {
        "internal error"
    }
}

/// Parse a JSON-RPC error value into a structured `RpcError`.
///
/// JSON-RPC errors are `{"code": <int>, "message": <string>}`.
/// If the error value matches that shape, we produce a `Remote` error;
/// otherwise we fall back to `Protocol` with the raw JSON.
pub(super) fn parse_jsonrpc_error(err: serde_json::Value) -> RpcError {
    #[derive(serde::Deserialize)]
    struct JsonRpcError {
        code: i64,
        message: String,
    }

    if let Ok(parsed) = serde_json::from_value::<JsonRpcError>(err.clone()) {
        RpcError::Remote {
            code: parsed.code,
            message: parsed.message,
        }
    } else {
        RpcError::Protocol(format!("non-standard JSON-RPC error: {err}"))
    }
}

pub(super) fn parse_batch_id(id: &serde_json::Value) -> Result<u64, RpcError> {
    if let Some(n) = id.as_u64() {
        return Ok(n);
    }

    if let Some(s) = id.as_str() {
        return s
            .parse::<u64>()
            .map_err(|e| RpcError::Protocol(format!("invalid batch response id string: {e}")));
    }

    Err(RpcError::Protocol(format!("invalid batch response id: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_batch_id_u64() {
        let val = serde_json::json!(42);
        assert_eq!(parse_batch_id(&val).expect("should parse"), 42);
    }

    #[test]
    fn parse_batch_id_string() {
        let val = serde_json::json!("123");
        assert_eq!(parse_batch_id(&val).expect("should parse"), 123);
    }

    #[test]
    fn parse_batch_id_invalid() {
        let val = serde_json::json!(true);
        assert!(parse_batch_id(&val).is_err());
    }

    #[test]
    fn remote_error_keeps_code_and_message() {
        let err = parse_jsonrpc_error(serde_json::json!({"code": -8, "message": "Block height out of range"}));
        assert!(matches!(
            err,
            RpcError::Remote { code: -8, ref message } if message == "Block height out of range"
        ));
        let odd = parse_jsonrpc_error(serde_json::json!("boom"));
        assert!(matches!(odd, RpcError::Protocol(_)));
    }

    #[test]
    fn short_bodies_are_quoted_in_decode_errors() {
        let err = safe_decode::<JsonRpcResponse>("<html>bad gateway</html>")
            .err()
            .expect("not json");
        assert!(err.to_string().contains("<html>bad gateway</html>"));

        let long = "x".repeat(MAX_ERROR_SNIPPET);
        let err = safe_decode::<JsonRpcResponse>(&long).err().expect("not json");
        assert!(err.to_string().ends_with("body=internal error"));
    }
}
