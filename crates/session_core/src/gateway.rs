//! Command gateway seam: every wallet operation the backend performs on our behalf.

use async_trait::async_trait;
use shared::protocol::{
    AccountInfo, CreateWalletResponse, ImportWalletResponse, SignTransactionResponse, WalletInfo,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The backend refused the call; the reason is reported verbatim.
    #[error("{0}")]
    Rejected(String),
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[async_trait]
pub trait WalletGateway: Send + Sync {
    async fn list_wallets(&self) -> GatewayResult<Vec<String>>;
    async fn create_wallet(&self, wallet_name: &str) -> GatewayResult<CreateWalletResponse>;
    async fn import_wallet(
        &self,
        wallet_name: &str,
        mnemonic: &str,
    ) -> GatewayResult<ImportWalletResponse>;
    async fn load_wallet(&self, wallet_name: &str) -> GatewayResult<bool>;
    async fn list_accounts(&self) -> GatewayResult<Vec<AccountInfo>>;
    async fn get_wallet_info(&self) -> GatewayResult<Option<WalletInfo>>;
    async fn get_selected_account(&self) -> GatewayResult<Option<AccountInfo>>;
    async fn select_account(&self, index: usize) -> GatewayResult<()>;
    async fn add_account(&self, mnemonic: &str) -> GatewayResult<AccountInfo>;
    async fn create_account(&self) -> GatewayResult<AccountInfo>;
    async fn sign_transaction(&self, data: &str) -> GatewayResult<SignTransactionResponse>;
}

/// Stand-in used when no backend is configured; every call is rejected.
pub struct MissingWalletGateway;

const BACKEND_UNAVAILABLE: &str = "wallet backend unavailable; configure backend_url";

fn unavailable<T>() -> GatewayResult<T> {
    Err(GatewayError::Rejected(BACKEND_UNAVAILABLE.to_string()))
}

#[async_trait]
impl WalletGateway for MissingWalletGateway {
    async fn list_wallets(&self) -> GatewayResult<Vec<String>> {
        unavailable()
    }

    async fn create_wallet(&self, _wallet_name: &str) -> GatewayResult<CreateWalletResponse> {
        unavailable()
    }

    async fn import_wallet(
        &self,
        _wallet_name: &str,
        _mnemonic: &str,
    ) -> GatewayResult<ImportWalletResponse> {
        unavailable()
    }

    async fn load_wallet(&self, _wallet_name: &str) -> GatewayResult<bool> {
        unavailable()
    }

    async fn list_accounts(&self) -> GatewayResult<Vec<AccountInfo>> {
        unavailable()
    }

    async fn get_wallet_info(&self) -> GatewayResult<Option<WalletInfo>> {
        unavailable()
    }

    async fn get_selected_account(&self) -> GatewayResult<Option<AccountInfo>> {
        unavailable()
    }

    async fn select_account(&self, _index: usize) -> GatewayResult<()> {
        unavailable()
    }

    async fn add_account(&self, _mnemonic: &str) -> GatewayResult<AccountInfo> {
        unavailable()
    }

    async fn create_account(&self) -> GatewayResult<AccountInfo> {
        unavailable()
    }

    async fn sign_transaction(&self, _data: &str) -> GatewayResult<SignTransactionResponse> {
        unavailable()
    }
}
