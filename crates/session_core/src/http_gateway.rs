//! Gateway binding over HTTP: `POST {backend}/invoke/{command}` with a JSON argument object.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::ApiError,
    protocol::{
        AccountInfo, CreateWalletResponse, GatewayCommand, ImportWalletResponse,
        SignTransactionResponse, WalletInfo,
    },
};
use tracing::debug;
use url::Url;

use crate::gateway::{GatewayError, GatewayResult, WalletGateway};

pub struct HttpWalletGateway {
    http: Client,
    base_url: Url,
}

impl HttpWalletGateway {
    pub fn new(backend_url: &str, request_timeout: Duration) -> GatewayResult<Self> {
        let base_url = normalize_base_url(backend_url)?;
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn command_url(&self, command: &GatewayCommand) -> GatewayResult<Url> {
        self.base_url
            .join(&format!("invoke/{}", command.name()))
            .map_err(|e| GatewayError::Transport(format!("invalid command url: {e}")))
    }

    async fn send(&self, command: GatewayCommand) -> GatewayResult<Response> {
        let url = self.command_url(&command)?;
        debug!(command = command.name(), %url, "invoking backend command");

        let response = self
            .http
            .post(url)
            .json(&command.args())
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let reason = ApiError::reason_from_body(&body);
        if reason.is_empty() {
            return Err(GatewayError::Rejected(format!(
                "backend returned status {status}"
            )));
        }
        Err(GatewayError::Rejected(reason))
    }

    async fn invoke<T: DeserializeOwned>(&self, command: GatewayCommand) -> GatewayResult<T> {
        let command_name = command.name();
        self.send(command)
            .await?
            .json::<T>()
            .await
            .map_err(|e| GatewayError::MalformedResponse(format!("{command_name}: {e}")))
    }

    /// For commands whose result body carries nothing the client needs.
    async fn invoke_unit(&self, command: GatewayCommand) -> GatewayResult<()> {
        self.send(command).await?;
        Ok(())
    }
}

fn normalize_base_url(raw: &str) -> GatewayResult<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| GatewayError::Transport(format!("invalid backend url '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GatewayError::Transport(format!(
            "unsupported backend url scheme '{}'",
            url.scheme()
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl WalletGateway for HttpWalletGateway {
    async fn list_wallets(&self) -> GatewayResult<Vec<String>> {
        self.invoke(GatewayCommand::ListWallets).await
    }

    async fn create_wallet(&self, wallet_name: &str) -> GatewayResult<CreateWalletResponse> {
        self.invoke(GatewayCommand::CreateWallet {
            wallet_name: wallet_name.to_string(),
        })
        .await
    }

    async fn import_wallet(
        &self,
        wallet_name: &str,
        mnemonic: &str,
    ) -> GatewayResult<ImportWalletResponse> {
        self.invoke(GatewayCommand::ImportWallet {
            wallet_name: wallet_name.to_string(),
            mnemonic: mnemonic.to_string(),
        })
        .await
    }

    async fn load_wallet(&self, wallet_name: &str) -> GatewayResult<bool> {
        self.invoke(GatewayCommand::LoadWallet {
            wallet_name: wallet_name.to_string(),
        })
        .await
    }

    async fn list_accounts(&self) -> GatewayResult<Vec<AccountInfo>> {
        self.invoke(GatewayCommand::ListAccounts).await
    }

    async fn get_wallet_info(&self) -> GatewayResult<Option<WalletInfo>> {
        self.invoke(GatewayCommand::GetWalletInfo).await
    }

    async fn get_selected_account(&self) -> GatewayResult<Option<AccountInfo>> {
        self.invoke(GatewayCommand::GetSelectedAccount).await
    }

    async fn select_account(&self, index: usize) -> GatewayResult<()> {
        self.invoke_unit(GatewayCommand::SelectAccount { index })
            .await
    }

    async fn add_account(&self, mnemonic: &str) -> GatewayResult<AccountInfo> {
        self.invoke(GatewayCommand::AddAccount {
            mnemonic: mnemonic.to_string(),
        })
        .await
    }

    async fn create_account(&self) -> GatewayResult<AccountInfo> {
        self.invoke(GatewayCommand::CreateAccount).await
    }

    async fn sign_transaction(&self, data: &str) -> GatewayResult<SignTransactionResponse> {
        self.invoke(GatewayCommand::SignTransaction {
            data: data.to_string(),
        })
        .await
    }
}

#[cfg(test)]
#[path = "tests/http_gateway_tests.rs"]
mod tests;
