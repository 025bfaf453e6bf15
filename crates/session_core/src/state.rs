//! Session state: the open wallet, its cached account list and summary, and the
//! snapshot handed to views.

use std::{collections::HashSet, fmt};

use chrono::{DateTime, Utc};
use shared::{
    domain::{AccountIndex, WalletName},
    protocol::{AccountInfo, WalletInfo},
};
use tracing::warn;
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Derivation index; list position unless the backend reported one explicitly.
    pub index: AccountIndex,
    pub address: String,
    pub public_key: String,
    pub is_selected: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn derivation_path(&self) -> String {
        self.index.derivation_path()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSummary {
    pub total_accounts: usize,
    pub selected_account: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl WalletSummary {
    pub fn from_info(info: WalletInfo) -> Self {
        Self {
            total_accounts: info.total_accounts,
            selected_account: info.selected_account,
            created_at: Some(info.created_at),
            last_modified: Some(info.last_modified),
        }
    }

    /// Summary built only from the account list, used when the backend summary is unavailable.
    pub fn derived_from(accounts: &[Account]) -> Self {
        Self {
            total_accounts: accounts.len(),
            selected_account: selected_address(accounts),
            created_at: None,
            last_modified: None,
        }
    }

    /// Aligns count and selection with the account list, which is authoritative.
    /// Returns true when anything had to change.
    pub fn reconcile_with(&mut self, accounts: &[Account]) -> bool {
        let selected = selected_address(accounts);
        let mut changed = false;

        if self.total_accounts != accounts.len() {
            self.total_accounts = accounts.len();
            changed = true;
        }
        if self.selected_account != selected {
            self.selected_account = selected;
            changed = true;
        }

        changed
    }
}

fn selected_address(accounts: &[Account]) -> Option<String> {
    accounts
        .iter()
        .find(|account| account.is_selected)
        .map(|account| account.address.clone())
}

/// Turns a backend account list into derivation order and checks the selection invariant.
pub fn normalize_accounts(infos: Vec<AccountInfo>) -> Result<Vec<Account>, String> {
    let explicit = infos.iter().filter(|info| info.index.is_some()).count();
    if explicit != 0 && explicit != infos.len() {
        return Err(format!(
            "backend reported explicit indices for {explicit} of {} accounts",
            infos.len()
        ));
    }

    let mut accounts = Vec::with_capacity(infos.len());
    for (position, info) in infos.into_iter().enumerate() {
        let index = match info.index {
            Some(index) => index,
            None => AccountIndex(u32::try_from(position).map_err(|_| {
                format!("account position {position} exceeds the derivation index range")
            })?),
        };
        accounts.push(Account {
            index,
            address: info.address,
            public_key: info.public_key,
            is_selected: info.is_selected,
            created_at: info.created_at,
        });
    }

    if explicit != 0 {
        accounts.sort_by_key(|account| account.index);
        let mut seen = HashSet::new();
        if let Some(duplicate) = accounts.iter().find(|account| !seen.insert(account.index)) {
            return Err(format!(
                "backend reported derivation index {} more than once",
                duplicate.index
            ));
        }
        // Selection addresses accounts by list position.
        if let Some((position, gap)) = accounts
            .iter()
            .enumerate()
            .find(|(position, account)| account.index.0 as usize != *position)
        {
            return Err(format!(
                "backend skipped derivation index {position} (next reported index is {})",
                gap.index
            ));
        }
    }

    let selected = accounts.iter().filter(|account| account.is_selected).count();
    if selected > 1 {
        return Err(format!("backend reported {selected} selected accounts"));
    }

    Ok(accounts)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == MessageLevel::Error
    }
}

/// Mnemonic text held for the input field; wiped on drop and redacted in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct MnemonicDraft(Zeroizing<String>);

impl MnemonicDraft {
    pub fn new(text: &str) -> Self {
        Self(Zeroizing::new(text.to_string()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for MnemonicDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MnemonicDraft(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    NoWallet,
    WalletOpen { selected: Option<AccountIndex> },
}

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) open_wallet: Option<WalletName>,
    pub(crate) accounts: Vec<Account>,
    pub(crate) summary: Option<WalletSummary>,
    pub(crate) wallets: Vec<String>,
    pub(crate) last_message: Option<StatusMessage>,
    pub(crate) mnemonic_input: Option<MnemonicDraft>,
    pub(crate) signature: Option<String>,
}

impl SessionState {
    pub(crate) fn require_open(&self) -> Result<WalletName, crate::ValidationError> {
        self.open_wallet
            .clone()
            .ok_or(crate::ValidationError::NoWalletOpen)
    }

    /// Switches to a freshly loaded wallet with an empty cached view.
    pub(crate) fn open(&mut self, name: WalletName) {
        self.close();
        self.open_wallet = Some(name);
    }

    pub(crate) fn close(&mut self) {
        self.open_wallet = None;
        self.accounts.clear();
        self.summary = None;
        self.mnemonic_input = None;
        self.signature = None;
    }

    /// Commits the two halves of a wallet-view refresh as one pair. A missing half
    /// keeps the prior account list or derives the summary from the list. Returns
    /// false when neither half was available and nothing changed.
    pub(crate) fn commit_wallet_view(
        &mut self,
        accounts: Option<Vec<Account>>,
        summary: Option<WalletSummary>,
    ) -> bool {
        if accounts.is_none() && summary.is_none() {
            return false;
        }

        let accounts = accounts.unwrap_or_else(|| self.accounts.clone());
        let summary = match summary.or_else(|| self.summary.clone()) {
            Some(mut summary) => {
                if summary.reconcile_with(&accounts) {
                    warn!(
                        total_accounts = accounts.len(),
                        "wallet summary disagreed with account list; reconciled from list"
                    );
                }
                summary
            }
            None => WalletSummary::derived_from(&accounts),
        };

        self.accounts = accounts;
        self.summary = Some(summary);
        true
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        match self.open_wallet {
            None => SessionPhase::NoWallet,
            Some(_) => SessionPhase::WalletOpen {
                selected: self
                    .accounts
                    .iter()
                    .find(|account| account.is_selected)
                    .map(|account| account.index),
            },
        }
    }
}

/// Read-only copy of the session for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub open_wallet: Option<String>,
    pub accounts: Vec<Account>,
    pub summary: Option<WalletSummary>,
    pub wallets: Vec<String>,
    pub busy: bool,
    pub last_message: Option<StatusMessage>,
    pub mnemonic_input: Option<MnemonicDraft>,
    pub signature: Option<String>,
}

impl SessionSnapshot {
    pub(crate) fn capture(state: &SessionState, busy: bool) -> Self {
        Self {
            phase: state.phase(),
            open_wallet: state.open_wallet.as_ref().map(|name| name.to_string()),
            accounts: state.accounts.clone(),
            summary: state.summary.clone(),
            wallets: state.wallets.clone(),
            busy,
            last_message: state.last_message.clone(),
            mnemonic_input: state.mnemonic_input.clone(),
            signature: state.signature.clone(),
        }
    }

    pub fn selected_account(&self) -> Option<&Account> {
        self.accounts.iter().find(|account| account.is_selected)
    }

    pub fn is_wallet_open(&self) -> bool {
        self.open_wallet.is_some()
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
