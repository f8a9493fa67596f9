// Response envelopes of the remote wallet API.
//
// Two conventions coexist and each endpoint uses exactly one of them:
// `{state: "success", data, message}` and `{status: "success", ...}`.
// Bodies are decoded by trying both shapes; the endpoint then checks the
// convention it belongs to.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

const SUCCESS: &str = "success";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    State,
    Status,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateEnvelope {
    pub state: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusEnvelope {
    pub status: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiEnvelope {
    State(StateEnvelope),
    Status(StatusEnvelope),
}

impl ApiEnvelope {
    pub fn decode(body: &Value) -> Option<Self> {
        Self::deserialize(body).ok()
    }

    /// Success only counts under the endpoint's own convention.
    pub fn succeeded(&self, convention: Convention) -> bool {
        match (self, convention) {
            (ApiEnvelope::State(env), Convention::State) => env.state == SUCCESS,
            (ApiEnvelope::Status(env), Convention::Status) => env.status == SUCCESS,
            _ => false,
        }
    }

    pub fn into_data(self) -> Option<Value> {
        match self {
            ApiEnvelope::State(env) => env.data,
            ApiEnvelope::Status(env) => env.data,
        }
    }
}

/// Whether `body` reports success under `convention`.
pub fn is_success(body: &Value, convention: Convention) -> bool {
    ApiEnvelope::decode(body).is_some_and(|env| env.succeeded(convention))
}

fn first_non_field_error(body: &Value) -> Option<String> {
    body.get("non_field_errors")?
        .as_array()?
        .first()?
        .as_str()
        .map(str::to_string)
}

fn str_field(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Field-level message from whichever shape the server used.
pub fn scrape_message(body: &Value) -> Option<String> {
    str_field(body, "message")
        .or_else(|| first_non_field_error(body))
        .or_else(|| str_field(body, "error"))
        .or_else(|| body.as_str().map(str::to_string))
}

/// Map a 400 message onto the user-facing categories.
pub fn classify_bad_request(message: &str) -> ApiError {
    let lower = message.to_lowercase();
    if lower.contains("password") {
        ApiError::IncorrectPassword
    } else if lower.contains("private key") || lower.contains("privatekey") {
        ApiError::InvalidPrivateKey
    } else if lower.contains("mnemonic") || lower.contains("recovery phrase") {
        ApiError::InvalidMnemonic
    } else if lower.contains("invalid") || lower.contains("wrong") || lower.contains("incorrect") {
        ApiError::InvalidInput
    } else if message.is_empty() {
        ApiError::BadRequest("Invalid request. Please check your input.".to_string())
    } else {
        ApiError::BadRequest(message.to_string())
    }
}

/// Classify a response that did not report success.
pub fn classify_failure(status: u16, body: &Value, fallback: &str) -> ApiError {
    match status {
        400 => classify_bad_request(&scrape_message(body).unwrap_or_default()),
        401 => ApiError::Unauthorized,
        500 => ApiError::ServerError,
        _ => ApiError::Remote(
            str_field(body, "message")
                .or_else(|| first_non_field_error(body))
                .unwrap_or_else(|| fallback.to_string()),
        ),
    }
}
