//! JSON-RPC 2.0 message envelopes
//!
//! Parameters and results stay as raw [`serde_json::Value`]s; method-specific
//! decoding happens in the handlers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::rpc::error::ParseError;

const JSONRPC_VERSION: &str = "2.0";

/// Request id, either a number or a string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    String(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{}", n),
            Id::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// JSON-RPC and LSP error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerNotInitialized,
    ServerError(i64),
}

impl ErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ServerNotInitialized => -32002,
            ErrorCode::ServerError(code) => *code,
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        match code {
            -32700 => ErrorCode::ParseError,
            -32600 => ErrorCode::InvalidRequest,
            -32601 => ErrorCode::MethodNotFound,
            -32602 => ErrorCode::InvalidParams,
            -32603 => ErrorCode::InternalError,
            -32002 => ErrorCode::ServerNotInitialized,
            other => ErrorCode::ServerError(other),
        }
    }
}

impl From<ErrorCode> for i64 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error object carried by a failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("Method not found: {}", method),
        )
    }

    pub fn invalid_params(detail: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InvalidParams, format!("Invalid params: {}", detail))
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code.code())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: Id,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub method: String,
    pub params: Value,
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: Id,
    pub result: Result<Value, ResponseError>,
}

impl Response {
    pub fn ok(id: Id, result: Value) -> Self {
        Self {
            id,
            result: Ok(result),
        }
    }

    pub fn error(id: Id, error: ResponseError) -> Self {
        Self {
            id,
            result: Err(error),
        }
    }
}

/// One protocol message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(Request),
    Notification(Notification),
    Response(Response),
}

impl Message {
    /// Method name, if this message carries one
    pub fn method(&self) -> Option<&str> {
        match self {
            Message::Request(request) => Some(&request.method),
            Message::Notification(notification) => Some(&notification.method),
            Message::Response(_) => None,
        }
    }

    /// Decode a framed payload into an envelope.
    pub fn decode(payload: &[u8]) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_slice(payload)?;
        let Value::Object(mut object) = value else {
            return Err(ParseError::InvalidMessage {
                id: None,
                reason: "message is not a JSON object".to_string(),
            });
        };

        let id = take_id(&mut object)?;
        let params = object.remove("params").unwrap_or(Value::Null);

        if let Some(method) = object.remove("method") {
            let Value::String(method) = method else {
                return Err(ParseError::InvalidMessage {
                    id,
                    reason: "method must be a string".to_string(),
                });
            };
            return Ok(match id {
                Some(id) => Message::Request(Request { id, method, params }),
                None => Message::Notification(Notification { method, params }),
            });
        }

        let Some(id) = id else {
            return Err(ParseError::InvalidMessage {
                id: None,
                reason: "message has neither method nor id".to_string(),
            });
        };

        if let Some(error) = object.remove("error") {
            let error: ResponseError =
                serde_json::from_value(error).map_err(|e| ParseError::InvalidMessage {
                    id: Some(id.clone()),
                    reason: format!("malformed error object: {}", e),
                })?;
            return Ok(Message::Response(Response::error(id, error)));
        }

        match object.remove("result") {
            Some(result) => Ok(Message::Response(Response::ok(id, result))),
            None => Err(ParseError::InvalidMessage {
                id: Some(id),
                reason: "response has neither result nor error".to_string(),
            }),
        }
    }

    /// Serialize the envelope into a payload.
    pub fn encode(&self) -> Vec<u8> {
        let value = match self {
            Message::Request(request) => json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": request.id,
                "method": request.method,
                "params": request.params,
            }),
            Message::Notification(notification) => json!({
                "jsonrpc": JSONRPC_VERSION,
                "method": notification.method,
                "params": notification.params,
            }),
            Message::Response(Response { id, result: Ok(result) }) => json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": id,
                "result": result,
            }),
            Message::Response(Response { id, result: Err(error) }) => json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": id,
                "error": error,
            }),
        };

        value.to_string().into_bytes()
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

impl From<Notification> for Message {
    fn from(notification: Notification) -> Self {
        Message::Notification(notification)
    }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self {
        Message::Response(response)
    }
}

/// Remove and decode the `id` member. A `null` id counts as absent.
fn take_id(object: &mut Map<String, Value>) -> Result<Option<Id>, ParseError> {
    match object.remove("id") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|_| ParseError::InvalidMessage {
                id: None,
                reason: "id must be a number or a string".to_string(),
            }),
    }
}
