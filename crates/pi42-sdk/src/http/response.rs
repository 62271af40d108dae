/*
[INPUT]:  Raw HTTP status + body text, or transport errors
[OUTPUT]: ApiOutcome (Success / ApiFailure / TransportFailure)
[POS]:    HTTP layer - response normalization
[UPDATE]: When the server error envelope changes
*/

use reqwest::StatusCode;
use serde_json::Value;

use crate::http::{Pi42Error, Result};

const UNKNOWN_ERROR: &str = "Unknown error";

/// Normalized result of one REST call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    /// 2xx; parsed JSON, or the raw text as a JSON string
    Success(Value),
    /// Server rejected the request
    ApiFailure {
        status: u16,
        message: String,
        code: Option<String>,
    },
    /// Request never produced an HTTP response
    TransportFailure(String),
}

impl ApiOutcome {
    /// Build an outcome from a received status and body
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        if status.is_success() {
            return match serde_json::from_str(body) {
                Ok(value) => ApiOutcome::Success(value),
                Err(_) => ApiOutcome::Success(Value::String(body.to_string())),
            };
        }

        let (message, code) = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or(UNKNOWN_ERROR)
                    .to_string();
                let code = map.get("code").and_then(render_code);
                (message, code)
            }
            Ok(Value::String(message)) => (message, None),
            _ => (raw_message(status, body), None),
        };

        ApiOutcome::ApiFailure {
            status: status.as_u16(),
            message,
            code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success(_))
    }

    /// Convert into a `Result`, surfacing failures as `Pi42Error`
    pub fn into_result(self) -> Result<Value> {
        match self {
            ApiOutcome::Success(value) => Ok(value),
            ApiOutcome::ApiFailure {
                status,
                message,
                code,
            } => Err(Pi42Error::Api {
                status,
                message,
                code,
            }),
            ApiOutcome::TransportFailure(message) => Err(Pi42Error::Transport(message)),
        }
    }
}

fn render_code(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn raw_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or(UNKNOWN_ERROR)
            .to_string()
    } else {
        body.to_string()
    }
}
