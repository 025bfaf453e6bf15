//! Session controller: the only writer of session state. Validates intents,
//! sequences dependent gateway calls and classifies failures.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use shared::domain::WalletName;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::{
    error::{Operation, SessionError},
    gateway::WalletGateway,
    state::{
        normalize_accounts, Account, MnemonicDraft, SessionSnapshot, SessionState, StatusMessage,
        WalletSummary,
    },
    validation,
};

/// Clears the busy flag when the operation that set it ends, on every path.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Per-step outcome of the account-list and wallet-info refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    /// Number of accounts loaded.
    pub accounts: Result<usize, SessionError>,
    /// Total accounts reported by the backend summary.
    pub summary: Result<usize, SessionError>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.accounts.is_ok() && self.summary.is_ok()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SessionError> {
        self.accounts
            .as_ref()
            .err()
            .into_iter()
            .chain(self.summary.as_ref().err())
    }

    fn describe_failures(&self) -> Option<String> {
        let failures: Vec<String> = self.failures().map(ToString::to_string).collect();
        (!failures.is_empty()).then(|| failures.join("; "))
    }
}

/// Returned once from a successful create; the phrase is never kept in session state.
pub struct CreatedWallet {
    pub name: WalletName,
    pub mnemonic: Zeroizing<String>,
    pub address: String,
    pub public_key: String,
    /// Set when the follow-up wallet list refresh failed.
    pub wallet_list_error: Option<SessionError>,
}

impl fmt::Debug for CreatedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatedWallet")
            .field("name", &self.name)
            .field("mnemonic", &"<redacted>")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("wallet_list_error", &self.wallet_list_error)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedWallet {
    pub name: WalletName,
    pub address: String,
    pub total_accounts: usize,
    pub wallet_list_error: Option<SessionError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedWallet {
    pub name: WalletName,
    pub refresh: RefreshReport,
}

pub struct SessionController {
    gateway: Arc<dyn WalletGateway>,
    state: Mutex<SessionState>,
    busy: AtomicBool,
}

impl SessionController {
    pub fn new(gateway: Arc<dyn WalletGateway>) -> Self {
        Self {
            gateway,
            state: Mutex::new(SessionState::default()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock_state();
        SessionSnapshot::capture(&state, self.is_busy())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn refresh_wallet_list(&self) -> Result<Vec<String>, SessionError> {
        let _busy = self.begin()?;
        let result = self.fetch_wallet_list().await;
        self.settle(result, |_| StatusMessage::info("Wallets loaded successfully"))
    }

    pub async fn create_wallet(&self, name: &str) -> Result<CreatedWallet, SessionError> {
        let _busy = self.begin()?;
        let result = self.run_create_wallet(name).await;
        self.settle(result, |created| {
            let text = format!(
                "Wallet '{}' created successfully. Write down the recovery phrase now; it will not be shown again.",
                created.name
            );
            with_follow_up(text, created.wallet_list_error.as_ref().map(ToString::to_string))
        })
    }

    pub async fn import_wallet(
        &self,
        name: &str,
        mnemonic: &str,
    ) -> Result<ImportedWallet, SessionError> {
        let _busy = self.begin()?;
        self.lock_state().mnemonic_input = Some(MnemonicDraft::new(mnemonic));
        let result = self.run_import_wallet(name, mnemonic).await;
        self.settle(result, |imported| {
            with_follow_up(
                format!("Wallet '{}' imported successfully!", imported.name),
                imported.wallet_list_error.as_ref().map(ToString::to_string),
            )
        })
    }

    pub async fn open_wallet(&self, name: &str) -> Result<OpenedWallet, SessionError> {
        let _busy = self.begin()?;
        let result = self.run_open_wallet(name).await;
        self.settle(result, |opened| {
            let text = match &opened.refresh.accounts {
                Ok(count) => format!("Wallet '{}' loaded with {count} account(s)", opened.name),
                Err(_) => format!("Wallet '{}' opened", opened.name),
            };
            with_follow_up(text, opened.refresh.describe_failures())
        })
    }

    /// Returns to wallet selection. Only refused while another operation is in flight.
    pub fn close_wallet(&self) -> Result<(), SessionError> {
        let _busy = self.begin()?;
        let mut state = self.lock_state();
        if let Some(name) = state.open_wallet.take() {
            info!(wallet = %name, "closed wallet");
        }
        state.close();
        state.last_message = Some(StatusMessage::info("Returned to wallet selection"));
        Ok(())
    }

    pub async fn select_account(&self, index: usize) -> Result<RefreshReport, SessionError> {
        let _busy = self.begin()?;
        let result = self.run_select_account(index).await;
        self.settle(result, |report| {
            with_follow_up(
                format!("Account {index} selected successfully"),
                report.describe_failures(),
            )
        })
    }

    pub async fn add_account_from_mnemonic(
        &self,
        mnemonic: &str,
    ) -> Result<RefreshReport, SessionError> {
        let _busy = self.begin()?;
        self.lock_state().mnemonic_input = Some(MnemonicDraft::new(mnemonic));
        let result = self.run_add_account(mnemonic).await;
        self.settle(result, |(address, report)| {
            with_follow_up(
                format!("Account {address} added successfully"),
                report.describe_failures(),
            )
        })
        .map(|(_, report)| report)
    }

    pub async fn create_next_account(&self) -> Result<RefreshReport, SessionError> {
        let _busy = self.begin()?;
        let result = self.run_create_account().await;
        self.settle(result, |(address, report)| {
            with_follow_up(
                format!("Account {address} created successfully"),
                report.describe_failures(),
            )
        })
        .map(|(_, report)| report)
    }

    /// Re-runs the account-list and wallet-info steps for the open wallet.
    pub async fn refresh_wallet_view(&self) -> Result<RefreshReport, SessionError> {
        let _busy = self.begin()?;
        let open = self.lock_state().require_open();
        let result = match open {
            Ok(_) => Ok(self.refresh_view().await),
            Err(err) => Err(err.into()),
        };
        self.settle(result, |report| {
            with_follow_up("Wallet refreshed", report.describe_failures())
        })
    }

    /// Asks the backend which account it will sign with.
    pub async fn selected_account(&self) -> Result<Option<Account>, SessionError> {
        let _busy = self.begin()?;
        let result = self.run_selected_account().await;
        self.settle(result, |selected| match selected {
            Some(account) => StatusMessage::info(format!("Selected account: {}", account.address)),
            None => StatusMessage::info("No account selected"),
        })
    }

    pub async fn sign_transaction(&self, hex_data: &str) -> Result<String, SessionError> {
        let _busy = self.begin()?;
        let result = self.run_sign_transaction(hex_data).await;
        {
            let mut state = self.lock_state();
            state.signature = result.as_ref().ok().cloned();
        }
        self.settle(result, |_| {
            StatusMessage::info("Transaction signed successfully")
        })
    }

    async fn run_create_wallet(&self, name: &str) -> Result<CreatedWallet, SessionError> {
        let name = validation::wallet_name(name)?;

        debug!(command = "create_wallet", wallet = %name, "gateway call");
        let response = self
            .gateway
            .create_wallet(name.as_str())
            .await
            .map_err(SessionError::rejected(Operation::CreateWallet))?;
        if !response.success {
            return Err(SessionError::declined(
                Operation::CreateWallet,
                response.message,
            ));
        }
        if response.mnemonic.trim().is_empty() {
            return Err(SessionError::declined(
                Operation::CreateWallet,
                "backend returned an empty recovery phrase",
            ));
        }

        info!(wallet = %name, address = %response.address, "wallet created");
        self.leave_switched_wallet(&name);
        let wallet_list_error = self.fetch_wallet_list().await.err();

        Ok(CreatedWallet {
            name,
            mnemonic: Zeroizing::new(response.mnemonic),
            address: response.address,
            public_key: response.public_key,
            wallet_list_error,
        })
    }

    async fn run_import_wallet(
        &self,
        name: &str,
        mnemonic: &str,
    ) -> Result<ImportedWallet, SessionError> {
        let (name, mnemonic) = validation::import_fields(name, mnemonic)?;

        debug!(command = "import_wallet", wallet = %name, "gateway call");
        let response = self
            .gateway
            .import_wallet(name.as_str(), mnemonic)
            .await
            .map_err(SessionError::rejected(Operation::ImportWallet))?;
        if !response.success {
            return Err(SessionError::declined(
                Operation::ImportWallet,
                response.message,
            ));
        }

        info!(wallet = %name, total_accounts = response.total_accounts, "wallet imported");
        self.lock_state().mnemonic_input = None;
        self.leave_switched_wallet(&name);
        let wallet_list_error = self.fetch_wallet_list().await.err();

        Ok(ImportedWallet {
            name,
            address: response.address,
            total_accounts: response.total_accounts,
            wallet_list_error,
        })
    }

    async fn run_open_wallet(&self, name: &str) -> Result<OpenedWallet, SessionError> {
        let name = validation::wallet_name(name)?;

        debug!(command = "load_wallet", wallet = %name, "gateway call");
        let loaded = self
            .gateway
            .load_wallet(name.as_str())
            .await
            .map_err(SessionError::rejected(Operation::OpenWallet))?;
        if !loaded {
            return Err(SessionError::declined_silently(Operation::OpenWallet));
        }

        self.lock_state().open(name.clone());
        info!(wallet = %name, "wallet open");

        let refresh = self.refresh_view().await;
        Ok(OpenedWallet { name, refresh })
    }

    async fn run_select_account(&self, index: usize) -> Result<RefreshReport, SessionError> {
        {
            let state = self.lock_state();
            state.require_open()?;
            validation::account_index(index, state.accounts.len())?;
        }

        debug!(command = "select_account", index, "gateway call");
        self.gateway
            .select_account(index)
            .await
            .map_err(SessionError::rejected(Operation::SelectAccount))?;

        Ok(self.refresh_view().await)
    }

    /// Returns the new account's address alongside the refresh outcome.
    async fn run_add_account(
        &self,
        mnemonic: &str,
    ) -> Result<(String, RefreshReport), SessionError> {
        let mnemonic = validation::account_mnemonic(mnemonic)?;
        self.lock_state().require_open()?;

        debug!(command = "add_account", "gateway call");
        let added = self
            .gateway
            .add_account(mnemonic)
            .await
            .map_err(SessionError::rejected(Operation::AddAccount))?;

        info!(address = %added.address, "account added");
        self.lock_state().mnemonic_input = None;
        Ok((added.address, self.refresh_view().await))
    }

    async fn run_create_account(&self) -> Result<(String, RefreshReport), SessionError> {
        self.lock_state().require_open()?;

        debug!(command = "create_account", "gateway call");
        let created = self
            .gateway
            .create_account()
            .await
            .map_err(SessionError::rejected(Operation::CreateAccount))?;

        info!(address = %created.address, "account created");
        Ok((created.address, self.refresh_view().await))
    }

    async fn run_selected_account(&self) -> Result<Option<Account>, SessionError> {
        self.lock_state().require_open()?;

        debug!(command = "get_selected_account", "gateway call");
        let Some(info) = self
            .gateway
            .get_selected_account()
            .await
            .map_err(SessionError::rejected(Operation::LoadSelectedAccount))?
        else {
            return Ok(None);
        };

        let state = self.lock_state();
        let cached = state
            .accounts
            .iter()
            .find(|account| account.address == info.address);
        match (cached, info.index) {
            (Some(account), _) => {
                if !account.is_selected {
                    warn!(
                        index = %account.index,
                        "backend selection differs from cached account list"
                    );
                }
                Ok(Some(Account {
                    is_selected: true,
                    ..account.clone()
                }))
            }
            (None, Some(index)) => Ok(Some(Account {
                index,
                address: info.address,
                public_key: info.public_key,
                is_selected: true,
                created_at: info.created_at,
            })),
            (None, None) => Err(SessionError::declined(
                Operation::LoadSelectedAccount,
                "selected account is not in the loaded account list; refresh the wallet",
            )),
        }
    }

    async fn run_sign_transaction(&self, hex_data: &str) -> Result<String, SessionError> {
        let data = validation::transaction_data(hex_data)?;
        self.lock_state().require_open()?;

        debug!(command = "sign_transaction", bytes = data.len() / 2, "gateway call");
        let response = self
            .gateway
            .sign_transaction(data)
            .await
            .map_err(SessionError::rejected(Operation::SignTransaction))?;
        if !response.success {
            return Err(SessionError::declined(
                Operation::SignTransaction,
                response.message,
            ));
        }
        if response.signature.trim().is_empty() {
            return Err(SessionError::declined(
                Operation::SignTransaction,
                "backend returned an empty signature",
            ));
        }

        Ok(response.signature)
    }

    async fn fetch_wallet_list(&self) -> Result<Vec<String>, SessionError> {
        debug!(command = "list_wallets", "gateway call");
        let wallets = self
            .gateway
            .list_wallets()
            .await
            .map_err(SessionError::rejected(Operation::RefreshWallets))?;

        self.lock_state().wallets = wallets.clone();
        Ok(wallets)
    }

    /// Account list then wallet info. Each step's failure is captured on its own
    /// and neither aborts the other; the results are committed together.
    async fn refresh_view(&self) -> RefreshReport {
        let accounts = self.fetch_accounts().await;
        let summary = self.fetch_summary().await;

        if let Err(err) = &accounts {
            warn!(error = %err, "account list refresh failed");
        }
        if let Err(err) = &summary {
            warn!(error = %err, "wallet info refresh failed");
        }

        let report = RefreshReport {
            accounts: accounts.as_ref().map(Vec::len).map_err(Clone::clone),
            summary: summary
                .as_ref()
                .map(|summary| summary.total_accounts)
                .map_err(Clone::clone),
        };

        self.lock_state()
            .commit_wallet_view(accounts.ok(), summary.ok());
        report
    }

    async fn fetch_accounts(&self) -> Result<Vec<Account>, SessionError> {
        debug!(command = "list_accounts", "gateway call");
        let infos = self
            .gateway
            .list_accounts()
            .await
            .map_err(SessionError::rejected(Operation::LoadAccounts))?;
        normalize_accounts(infos)
            .map_err(|reason| SessionError::declined(Operation::LoadAccounts, reason))
    }

    async fn fetch_summary(&self) -> Result<WalletSummary, SessionError> {
        debug!(command = "get_wallet_info", "gateway call");
        self.gateway
            .get_wallet_info()
            .await
            .map_err(SessionError::rejected(Operation::LoadWalletInfo))?
            .map(WalletSummary::from_info)
            .ok_or_else(|| {
                SessionError::declined(Operation::LoadWalletInfo, "backend returned no wallet info")
            })
    }

    /// The backend makes a created or imported wallet its current one, so any other
    /// wallet's cached view is dropped.
    fn leave_switched_wallet(&self, current: &WalletName) {
        let mut state = self.lock_state();
        if let Some(open) = &state.open_wallet {
            if open != current {
                info!(wallet = %open, "backend switched wallets; closing cached view");
            }
            state.close();
        }
    }

    fn begin(&self) -> Result<BusyGuard<'_>, SessionError> {
        match BusyGuard::acquire(&self.busy) {
            Some(guard) => Ok(guard),
            None => {
                debug!("intent rejected while another operation is in flight");
                self.lock_state().last_message =
                    Some(StatusMessage::error(SessionError::Busy.to_string()));
                Err(SessionError::Busy)
            }
        }
    }

    fn settle<T>(
        &self,
        result: Result<T, SessionError>,
        on_success: impl FnOnce(&T) -> StatusMessage,
    ) -> Result<T, SessionError> {
        let message = match &result {
            Ok(value) => on_success(value),
            Err(err) => {
                if !err.is_validation() {
                    warn!(error = %err, "session operation failed");
                }
                StatusMessage::error(err.to_string())
            }
        };
        self.lock_state().last_message = Some(message);
        result
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn with_follow_up(text: impl Into<String>, follow_up: Option<String>) -> StatusMessage {
    let text = text.into();
    match follow_up {
        Some(problems) => StatusMessage::error(format!("{text}; {problems}")),
        None => StatusMessage::info(text),
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
