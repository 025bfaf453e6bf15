use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    NoWalletLoaded,
    NoAccountSelected,
    Crypto,
    Storage,
    Internal,
}

/// Structured failure body a backend may return instead of plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Extracts the human-readable reason from a failure body, JSON or plain text.
    /// Structured bodies are read for `message` alone, so codes this client does
    /// not know still yield their reason.
    pub fn reason_from_body(body: &str) -> String {
        match serde_json::from_str::<MessageBody>(body) {
            Ok(structured) => structured.message,
            Err(_) => match serde_json::from_str::<String>(body) {
                Ok(text) => text,
                Err(_) => body.trim().to_string(),
            },
        }
    }
}
