//! Backend-to-view events and error modeling for the shell.

use std::fmt;

use session_core::{FailureKind, GatewayError, IntentOutcome, SessionError, SessionSnapshot};

pub enum UiEvent {
    Completed {
        outcome: IntentOutcome,
        snapshot: SessionSnapshot,
    },
    Failed {
        error: UiError,
        snapshot: SessionSnapshot,
    },
    Status(SessionSnapshot),
    Error(UiError),
}

impl UiEvent {
    pub fn from_outcome(
        intent: &'static str,
        outcome: IntentOutcome,
        snapshot: SessionSnapshot,
    ) -> Self {
        match outcome {
            IntentOutcome::Failed(err) => Self::Failed {
                error: UiError::from_session_error(UiErrorContext::for_intent(intent), &err),
                snapshot,
            },
            outcome => Self::Completed { outcome, snapshot },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Busy,
    Transport,
    Backend,
    Unknown,
}

impl fmt::Display for UiErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation",
            Self::Busy => "busy",
            Self::Transport => "transport",
            Self::Backend => "backend",
            Self::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Wallet,
    Account,
    Signing,
    General,
}

impl UiErrorContext {
    pub fn for_intent(intent: &str) -> Self {
        match intent {
            "refresh_wallet_list" | "create_wallet" | "import_wallet" | "open_wallet"
            | "close_wallet" | "refresh_wallet_view" => Self::Wallet,
            "select_account" | "add_account_from_mnemonic" | "create_next_account"
            | "load_selected_account" => Self::Account,
            "sign_transaction" => Self::Signing,
            _ => Self::General,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_session_error(context: UiErrorContext, err: &SessionError) -> Self {
        let category = match err {
            SessionError::Rejected {
                source: GatewayError::Transport(_),
                ..
            } => UiErrorCategory::Transport,
            _ => match err.kind() {
                FailureKind::Validation => UiErrorCategory::Validation,
                FailureKind::Busy => UiErrorCategory::Busy,
                FailureKind::Rejected | FailureKind::Declined => UiErrorCategory::Backend,
            },
        };

        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    /// Classifies errors that never went through the session controller.
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("busy") || message_lower.contains("queue is full")
        {
            UiErrorCategory::Busy
        } else if message_lower.contains("please enter")
            || message_lower.contains("invalid")
            || message_lower.contains("missing")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("unreachable")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category,
            UiErrorCategory::Busy | UiErrorCategory::Transport
        )
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
