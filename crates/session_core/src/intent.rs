//! Intent dispatch: the only way a view asks the controller to act.

use std::fmt;

use zeroize::Zeroizing;

use crate::{
    controller::{CreatedWallet, ImportedWallet, OpenedWallet, RefreshReport, SessionController},
    error::SessionError,
    state::Account,
};

/// Recovery phrases ride in `Zeroizing` buffers and are wiped when the intent
/// is dropped after dispatch.
pub enum SessionIntent {
    RefreshWalletList,
    CreateWallet { name: String },
    ImportWallet {
        name: String,
        mnemonic: Zeroizing<String>,
    },
    OpenWallet { name: String },
    CloseWallet,
    SelectAccount { index: usize },
    AddAccountFromMnemonic { mnemonic: Zeroizing<String> },
    CreateNextAccount,
    RefreshWalletView,
    LoadSelectedAccount,
    SignTransaction { data: String },
}

impl SessionIntent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RefreshWalletList => "refresh_wallet_list",
            Self::CreateWallet { .. } => "create_wallet",
            Self::ImportWallet { .. } => "import_wallet",
            Self::OpenWallet { .. } => "open_wallet",
            Self::CloseWallet => "close_wallet",
            Self::SelectAccount { .. } => "select_account",
            Self::AddAccountFromMnemonic { .. } => "add_account_from_mnemonic",
            Self::CreateNextAccount => "create_next_account",
            Self::RefreshWalletView => "refresh_wallet_view",
            Self::LoadSelectedAccount => "load_selected_account",
            Self::SignTransaction { .. } => "sign_transaction",
        }
    }
}

// Mnemonics never reach logs.
impl fmt::Debug for SessionIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateWallet { name } | Self::OpenWallet { name } => {
                f.debug_struct(self.name()).field("name", name).finish()
            }
            Self::ImportWallet { name, .. } => f
                .debug_struct(self.name())
                .field("name", name)
                .field("mnemonic", &"<redacted>")
                .finish(),
            Self::AddAccountFromMnemonic { .. } => f
                .debug_struct(self.name())
                .field("mnemonic", &"<redacted>")
                .finish(),
            Self::SelectAccount { index } => {
                f.debug_struct(self.name()).field("index", index).finish()
            }
            Self::SignTransaction { data } => f
                .debug_struct(self.name())
                .field("data_len", &data.len())
                .finish(),
            _ => f.write_str(self.name()),
        }
    }
}

#[derive(Debug)]
pub enum IntentOutcome {
    WalletList(Vec<String>),
    WalletCreated(CreatedWallet),
    WalletImported(ImportedWallet),
    WalletOpened(OpenedWallet),
    WalletClosed,
    AccountSelected(RefreshReport),
    AccountAdded(RefreshReport),
    AccountCreated(RefreshReport),
    WalletViewRefreshed(RefreshReport),
    SelectedAccount(Option<Account>),
    TransactionSigned(String),
    Failed(SessionError),
}

impl IntentOutcome {
    pub fn error(&self) -> Option<&SessionError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

fn outcome<T>(result: Result<T, SessionError>, wrap: impl FnOnce(T) -> IntentOutcome) -> IntentOutcome {
    match result {
        Ok(value) => wrap(value),
        Err(err) => IntentOutcome::Failed(err),
    }
}

impl SessionController {
    pub async fn dispatch(&self, intent: SessionIntent) -> IntentOutcome {
        tracing::debug!(intent = intent.name(), "dispatching session intent");
        match intent {
            SessionIntent::RefreshWalletList => {
                outcome(self.refresh_wallet_list().await, IntentOutcome::WalletList)
            }
            SessionIntent::CreateWallet { name } => {
                outcome(self.create_wallet(&name).await, IntentOutcome::WalletCreated)
            }
            SessionIntent::ImportWallet { name, mnemonic } => outcome(
                self.import_wallet(&name, &mnemonic).await,
                IntentOutcome::WalletImported,
            ),
            SessionIntent::OpenWallet { name } => {
                outcome(self.open_wallet(&name).await, IntentOutcome::WalletOpened)
            }
            SessionIntent::CloseWallet => {
                outcome(self.close_wallet(), |()| IntentOutcome::WalletClosed)
            }
            SessionIntent::SelectAccount { index } => {
                outcome(self.select_account(index).await, IntentOutcome::AccountSelected)
            }
            SessionIntent::AddAccountFromMnemonic { mnemonic } => outcome(
                self.add_account_from_mnemonic(&mnemonic).await,
                IntentOutcome::AccountAdded,
            ),
            SessionIntent::CreateNextAccount => {
                outcome(self.create_next_account().await, IntentOutcome::AccountCreated)
            }
            SessionIntent::RefreshWalletView => outcome(
                self.refresh_wallet_view().await,
                IntentOutcome::WalletViewRefreshed,
            ),
            SessionIntent::LoadSelectedAccount => {
                outcome(self.selected_account().await, IntentOutcome::SelectedAccount)
            }
            SessionIntent::SignTransaction { data } => outcome(
                self.sign_transaction(&data).await,
                IntentOutcome::TransactionSigned,
            ),
        }
    }
}
