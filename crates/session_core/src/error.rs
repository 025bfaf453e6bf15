use thiserror::Error;

use crate::{gateway::GatewayError, validation::ValidationError};

/// Named steps the controller reports failures against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RefreshWallets,
    CreateWallet,
    ImportWallet,
    OpenWallet,
    LoadAccounts,
    LoadWalletInfo,
    LoadSelectedAccount,
    SelectAccount,
    AddAccount,
    CreateAccount,
    SignTransaction,
}

impl Operation {
    /// "Error loading wallets: ..." style phrasing.
    pub fn progressive(self) -> &'static str {
        match self {
            Self::RefreshWallets => "loading wallets",
            Self::CreateWallet => "creating wallet",
            Self::ImportWallet => "importing wallet",
            Self::OpenWallet => "loading wallet",
            Self::LoadAccounts => "loading accounts",
            Self::LoadWalletInfo => "loading wallet info",
            Self::LoadSelectedAccount => "loading selected account",
            Self::SelectAccount => "selecting account",
            Self::AddAccount => "adding account",
            Self::CreateAccount => "creating account",
            Self::SignTransaction => "signing transaction",
        }
    }

    /// "Failed to load wallet" style phrasing.
    pub fn imperative(self) -> &'static str {
        match self {
            Self::RefreshWallets => "load wallets",
            Self::CreateWallet => "create wallet",
            Self::ImportWallet => "import wallet",
            Self::OpenWallet => "load wallet",
            Self::LoadAccounts => "load accounts",
            Self::LoadWalletInfo => "load wallet info",
            Self::LoadSelectedAccount => "load selected account",
            Self::SelectAccount => "select account",
            Self::AddAccount => "add account",
            Self::CreateAccount => "create account",
            Self::SignTransaction => "sign transaction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Busy,
    Rejected,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Another operation is in progress; please wait")]
    Busy,
    /// The gateway call itself failed.
    #[error("Error {}: {}", .operation.progressive(), .source)]
    Rejected {
        operation: Operation,
        source: GatewayError,
    },
    /// The gateway call completed but reported failure (`success=false`, `false`, nothing).
    #[error("{}", declined_message(.operation, .reason))]
    Declined {
        operation: Operation,
        reason: Option<String>,
    },
}

fn declined_message(operation: &Operation, reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!("Failed to {}: {reason}", operation.imperative()),
        None => format!("Failed to {}", operation.imperative()),
    }
}

impl SessionError {
    pub fn rejected(operation: Operation) -> impl FnOnce(GatewayError) -> Self {
        move |source| Self::Rejected { operation, source }
    }

    pub fn declined(operation: Operation, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = reason.trim();
        Self::Declined {
            operation,
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        }
    }

    pub fn declined_silently(operation: Operation) -> Self {
        Self::Declined {
            operation,
            reason: None,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::Busy => FailureKind::Busy,
            Self::Rejected { .. } => FailureKind::Rejected,
            Self::Declined { .. } => FailureKind::Declined,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Rejected { operation, .. } | Self::Declined { operation, .. } => {
                Some(*operation)
            }
            Self::Validation(_) | Self::Busy => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == FailureKind::Validation
    }
}
