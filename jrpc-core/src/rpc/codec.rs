//! # Envelope Codec
//!
//! ## Requests
//!
//! A request is serialized as `{"id": "<epoch-ms>", "method": "<name>", "params": [...]}`.
//! The id is derived from the wall clock and is not guaranteed to be unique; the client
//! relies on the transport to pair responses with requests, never on the id.
//!
//! ## Responses
//!
//! A response is expected to be a JSON object carrying a `result` or an `error` slot.
//! Decoding keeps track of whether `result` was present at all, so that `{"result": null}`
//! and `{}` can be told apart. Which slot wins is decided by a [`DispatchPolicy`].
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// A single call, as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEnvelope {
    id: String,
    method: String,
    params: Vec<Value>,
}

impl RequestEnvelope {
    /// Creates an envelope with a fresh, time-derived id.
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            id: request_id(),
            method: method.into(),
            params,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Serializes the envelope to the exact bytes sent as the request body.
    pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}

/// Decimal epoch milliseconds.
fn request_id() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
        .to_string()
}

/// A decoded response body.
///
/// Fields other than `result` and `error` (such as `id` or `jsonrpc`) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseEnvelope {
    /// `Some(Value::Null)` when the server sent `"result": null`, `None` when it sent nothing.
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ResponseEnvelope {
    /// Decodes a complete response body.
    ///
    /// Fails if the body is not valid JSON or is not a JSON object.
    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        // Derived structs also accept positional arrays; only objects are envelopes.
        let object: Map<String, Value> = serde_json::from_slice(body)?;
        serde_json::from_value(Value::Object(object))
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&Value> {
        self.error.as_ref()
    }

    /// Resolves the envelope into exactly one [`Outcome`].
    pub fn into_outcome(self, policy: DispatchPolicy) -> Outcome {
        match policy {
            DispatchPolicy::Tagged => match (self.error, self.result) {
                (Some(error), _) => Outcome::Failure(error),
                (None, Some(result)) => Outcome::Success(result),
                (None, None) => Outcome::Failure(Value::Null),
            },
            DispatchPolicy::Truthy => match self.result {
                Some(result) if is_truthy(&result) => Outcome::Success(result),
                _ => Outcome::Failure(self.error.unwrap_or(Value::Null)),
            },
        }
    }
}

/// How a decoded response is classified as a success or a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// A non-null `error` means failure; otherwise a present `result` means success,
    /// whatever its value (`0`, `false`, `""` and `null` included).
    #[default]
    Tagged,
    /// Legacy behavior: success only when `result` is truthy. Falsy results such as
    /// `0` or `false` are reported as failures carrying the `error` slot (usually `null`).
    Truthy,
}

/// The classified result of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Failure(Value),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> Result<Value, Value> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(value) => Err(value),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
