use serde_json::{Value, json};
use thiserror::Error;

// Every way a single endpoint call can fail. These never abort the run,
// they end up in the result records and the response files.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("{0}")]
    Transport(String),

    #[error("Invalid JSON response")]
    InvalidJson { raw: String },

    // Non-200 status, the code itself lives on the fetch result. `body` is
    // whatever JSON the API sent back.
    #[error("{message}")]
    Status { message: String, body: Value },

    // Status 200 but the object carries `code`/`message`.
    #[error("{message}")]
    Api { message: String, body: Value },
}

impl FetchError {
    pub fn from_status(body: Value) -> Self {
        let message = error_message(&body);
        FetchError::Status { message, body }
    }

    pub fn from_embedded(body: Value) -> Self {
        let message = error_message(&body);
        FetchError::Api { message, body }
    }

    // JSON object written to the response file in place of a collection.
    pub fn payload(&self) -> Value {
        match self {
            FetchError::Timeout => json!({ "error": "Request timeout" }),
            FetchError::Transport(msg) => json!({ "error": msg }),
            FetchError::InvalidJson { raw } => json!({
                "error": "Invalid JSON response",
                "raw": raw,
            }),
            FetchError::Status { body, .. } | FetchError::Api { body, .. } => body.clone(),
        }
    }
}

// `message`, then `error`, then a fixed fallback.
fn error_message(body: &Value) -> String {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .unwrap_or("Unknown error")
        .to_string()
}
