//! JSON-RPC routing of wallet requests onto a [`WalletSubprovider`]
// Request/response types adapted from: https://github.com/althea-net/guac_rs/tree/master/web3/src/jsonrpc
use ethers_core::types::{Address, Bytes, TransactionRequest};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::WalletSubprovider;

/// Invalid method parameter(s)
pub const INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Error)]
/// A JSON-RPC 2.0 error
pub struct JsonRpcError {
    /// The error code
    pub code: i64,
    /// The error message
    pub message: String,
    /// Additional data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn invalid_params(message: impl Into<String>) -> Self {
        Self { code: INVALID_PARAMS, message: message.into(), data: None }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self { code: INTERNAL_ERROR, message: message.into(), data: None }
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(code: {}, message: {}, data: {:?})", self.code, self.message, self.data)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
/// A JSON-RPC request
pub struct Request {
    pub id: u64,
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    /// Creates a new JSON RPC request
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self { id, jsonrpc: "2.0".to_string(), method: method.into(), params }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: u64,
    pub jsonrpc: String,
    #[serde(flatten)]
    pub data: ResponseData,
}

impl Response {
    fn new(id: u64, result: Result<Value, JsonRpcError>) -> Self {
        let data = match result {
            Ok(result) => ResponseData::Success { result },
            Err(error) => ResponseData::Error { error },
        };
        Self { id, jsonrpc: "2.0".to_string(), data }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ResponseData {
    Error { error: JsonRpcError },
    Success { result: Value },
}

impl ResponseData {
    /// Consume response and return value
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match self {
            ResponseData::Success { result } => Ok(result),
            ResponseData::Error { error } => Err(error),
        }
    }
}

fn param<T: DeserializeOwned>(params: &Value, index: usize) -> Result<T, JsonRpcError> {
    let value = params
        .get(index)
        .cloned()
        .ok_or_else(|| JsonRpcError::invalid_params(format!("missing parameter {index}")))?;
    serde_json::from_value(value)
        .map_err(|e| JsonRpcError::invalid_params(format!("invalid parameter {index}: {e}")))
}

fn internal<E: std::error::Error>(err: E) -> JsonRpcError {
    JsonRpcError::internal(err.to_string())
}

/// Answers `request` with `subprovider` if it is one of the wallet methods.
///
/// Returns `None` for any other method, leaving it to the next subprovider of the engine.
#[instrument(skip(subprovider, request), fields(id = request.id, method = %request.method))]
pub async fn handle_request<W: WalletSubprovider>(
    subprovider: &mut W,
    request: &Request,
) -> Option<Response> {
    let params = &request.params;
    let result = match request.method.as_str() {
        "eth_coinbase" => subprovider
            .get_accounts()
            .await
            .map(|accounts| json!(accounts.first()))
            .map_err(internal),
        "eth_accounts" => {
            subprovider.get_accounts().await.map(|accounts| json!(accounts)).map_err(internal)
        }
        "eth_signTransaction" => match param::<TransactionRequest>(params, 0) {
            Ok(tx) => subprovider
                .sign_transaction(&tx)
                .await
                .map(|raw| json!({ "raw": raw, "tx": tx }))
                .map_err(internal),
            Err(e) => Err(e),
        },
        "eth_sign" => match (param::<Address>(params, 0), param::<Bytes>(params, 1)) {
            (Ok(address), Ok(message)) => subprovider
                .sign_personal_message(message, address)
                .await
                .map(Value::from)
                .map_err(internal),
            (Err(e), _) | (_, Err(e)) => Err(e),
        },
        "personal_sign" => match (param::<Bytes>(params, 0), param::<Address>(params, 1)) {
            (Ok(message), Ok(address)) => subprovider
                .sign_personal_message(message, address)
                .await
                .map(Value::from)
                .map_err(internal),
            (Err(e), _) | (_, Err(e)) => Err(e),
        },
        "eth_signTypedData" | "eth_signTypedData_v3" | "eth_signTypedData_v4" => {
            match (param::<Address>(params, 0), param::<Value>(params, 1)) {
                (Ok(address), Ok(typed_data)) => subprovider
                    .sign_typed_data(address, &typed_data)
                    .await
                    .map(Value::from)
                    .map_err(internal),
                (Err(e), _) | (_, Err(e)) => Err(e),
            }
        }
        _ => return None,
    };

    if let Err(err) = &result {
        debug!(%err, "wallet request failed");
    }
    Some(Response::new(request.id, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response() {
        let response: Response =
            serde_json::from_str(r#"{"jsonrpc": "2.0", "result": "0x13", "id": 1}"#).unwrap();
        assert_eq!(response.id, 1);
        assert_eq!(response.data.into_result().unwrap(), json!("0x13"));
    }

    #[test]
    fn error_response() {
        let response = Response::new(7, Err(JsonRpcError::internal("Cancelled")));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "id": 7,
                "jsonrpc": "2.0",
                "error": { "code": -32603, "message": "Cancelled" }
            })
        );
    }

    #[test]
    fn request_without_params() {
        let request: Request =
            serde_json::from_str(r#"{"id": 3, "jsonrpc": "2.0", "method": "eth_accounts"}"#)
                .unwrap();
        assert_eq!(request, Request::new(3, "eth_accounts", Value::Null));
    }

    #[test]
    fn params_are_positional() {
        let params = json!(["0x3535353535353535353535353535353535353535", "0xdeadbeef"]);
        let address: Address = param(&params, 0).unwrap();
        assert_eq!(address, "3535353535353535353535353535353535353535".parse().unwrap());
        let message: Bytes = param(&params, 1).unwrap();
        assert_eq!(message.to_vec(), vec![0xde, 0xad, 0xbe, 0xef]);

        assert_eq!(param::<Bytes>(&params, 2).unwrap_err().code, INVALID_PARAMS);
        // messages must be 0x prefixed hex
        assert_eq!(param::<Bytes>(&json!(["hello"]), 0).unwrap_err().code, INVALID_PARAMS);
    }
}
