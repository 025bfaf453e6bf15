use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::AccountIndex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWalletResponse {
    pub success: bool,
    pub mnemonic: String,
    pub address: String,
    pub public_key: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportWalletResponse {
    pub success: bool,
    pub address: String,
    pub public_key: String,
    pub total_accounts: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: String,
    pub public_key: String,
    pub is_selected: bool,
    pub created_at: DateTime<Utc>,
    /// Explicit derivation index, when the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<AccountIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub total_accounts: usize,
    #[serde(default)]
    pub selected_account: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignTransactionResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    pub signature: String,
    #[serde(default)]
    pub message: String,
}

fn default_success() -> bool {
    true
}

/// Backend commands with their camelCase argument objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum GatewayCommand {
    ListWallets,
    CreateWallet {
        #[serde(rename = "walletName")]
        wallet_name: String,
    },
    ImportWallet {
        #[serde(rename = "walletName")]
        wallet_name: String,
        mnemonic: String,
    },
    LoadWallet {
        #[serde(rename = "walletName")]
        wallet_name: String,
    },
    ListAccounts,
    GetWalletInfo,
    GetSelectedAccount,
    SelectAccount {
        index: usize,
    },
    AddAccount {
        mnemonic: String,
    },
    CreateAccount,
    SignTransaction {
        data: String,
    },
}

impl GatewayCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListWallets => "list_wallets",
            Self::CreateWallet { .. } => "create_wallet",
            Self::ImportWallet { .. } => "import_wallet",
            Self::LoadWallet { .. } => "load_wallet",
            Self::ListAccounts => "list_accounts",
            Self::GetWalletInfo => "get_wallet_info",
            Self::GetSelectedAccount => "get_selected_account",
            Self::SelectAccount { .. } => "select_account",
            Self::AddAccount { .. } => "add_account",
            Self::CreateAccount => "create_account",
            Self::SignTransaction { .. } => "sign_transaction",
        }
    }

    /// Argument object sent as the request body; empty for argument-less commands.
    pub fn args(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => map
                .remove("args")
                .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())),
            _ => serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}
