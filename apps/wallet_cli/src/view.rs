//! Text view over session snapshots, and the shell's line grammar.

use session_core::{
    Account, CreatedWallet, IntentOutcome, SessionIntent, SessionPhase, SessionSnapshot,
    StatusMessage, WalletSummary,
};
use shared::domain::MNEMONIC_WORD_COUNTS;
use zeroize::Zeroizing;

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{UiError, UiErrorContext, UiEvent},
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

#[derive(Debug)]
pub enum ShellCommand {
    Backend(BackendCommand),
    Help,
    Quit,
    Empty,
}

pub fn help_text() -> String {
    let counts = MNEMONIC_WORD_COUNTS
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/");
    format!(
        "Commands:
  wallets                      refresh the wallet list
  create <name>                create a wallet (the recovery phrase is shown once)
  import <name> <mnemonic...>  import a wallet from a recovery phrase
  open <name>                  open a wallet and load its accounts
  close                        return to wallet selection
  select <index>               select the account to sign with
  add <mnemonic...>            add an account from a {counts}-word phrase
  new-account                  derive the next account
  refresh                      reload accounts and wallet info
  selected                     ask the backend which account is selected
  sign <hex>                   sign hex-encoded transaction data
  status                       show the current session
  help                         show this help
  quit                         leave the shell"
    )
}

pub fn parse_shell_line(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let intent = match verb {
        "" => return Ok(ShellCommand::Empty),
        "help" | "?" => return Ok(ShellCommand::Help),
        "quit" | "exit" => return Ok(ShellCommand::Quit),
        "status" => return Ok(ShellCommand::Backend(BackendCommand::Status)),
        "wallets" => SessionIntent::RefreshWalletList,
        "create" => SessionIntent::CreateWallet {
            name: rest.to_string(),
        },
        "import" => {
            let (name, mnemonic) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            SessionIntent::ImportWallet {
                name: name.to_string(),
                mnemonic: Zeroizing::new(mnemonic.trim().to_string()),
            }
        }
        "open" => SessionIntent::OpenWallet {
            name: rest.to_string(),
        },
        "close" => SessionIntent::CloseWallet,
        "select" => SessionIntent::SelectAccount {
            index: parse_index(rest)?,
        },
        "add" => SessionIntent::AddAccountFromMnemonic {
            mnemonic: Zeroizing::new(rest.to_string()),
        },
        "new-account" => SessionIntent::CreateNextAccount,
        "refresh" => SessionIntent::RefreshWalletView,
        "selected" => SessionIntent::LoadSelectedAccount,
        "sign" => SessionIntent::SignTransaction {
            data: rest.to_string(),
        },
        other => return Err(format!("Unknown command '{other}'; type 'help' for a list")),
    };

    Ok(ShellCommand::Backend(BackendCommand::Run(intent)))
}

fn parse_index(raw: &str) -> Result<usize, String> {
    if raw.is_empty() {
        return Err("Usage: select <index>".to_string());
    }
    raw.parse::<usize>()
        .map_err(|_| format!("Account index must be a non-negative whole number, got '{raw}'"))
}

pub fn render_event(event: &UiEvent) -> String {
    match event {
        UiEvent::Completed { outcome, snapshot } => {
            let mut lines = Vec::new();
            if let Some(message) = &snapshot.last_message {
                lines.push(render_message(message));
            }
            if let Some(detail) = render_outcome(outcome, snapshot) {
                lines.push(detail);
            }
            lines.join("\n")
        }
        UiEvent::Failed { error, .. } | UiEvent::Error(error) => render_error(error),
        UiEvent::Status(snapshot) => render_snapshot(snapshot),
    }
}

fn render_outcome(outcome: &IntentOutcome, snapshot: &SessionSnapshot) -> Option<String> {
    match outcome {
        IntentOutcome::WalletList(wallets) => Some(render_wallet_list(wallets)),
        IntentOutcome::WalletCreated(created) => Some(render_created(created)),
        IntentOutcome::WalletOpened(_)
        | IntentOutcome::AccountSelected(_)
        | IntentOutcome::AccountAdded(_)
        | IntentOutcome::AccountCreated(_)
        | IntentOutcome::WalletViewRefreshed(_) => Some(render_accounts(&snapshot.accounts)),
        IntentOutcome::SelectedAccount(Some(account)) => Some(render_account(account)),
        IntentOutcome::TransactionSigned(signature) => Some(format!("Signature: {signature}")),
        IntentOutcome::WalletImported(_)
        | IntentOutcome::WalletClosed
        | IntentOutcome::SelectedAccount(None)
        | IntentOutcome::Failed(_) => None,
    }
}

pub fn render_error(error: &UiError) -> String {
    let hint = match error.context() {
        UiErrorContext::BackendStartup => " (restart the shell)",
        _ if error.is_retryable() => " (retry)",
        _ => "",
    };
    format!("error [{}]: {}{hint}", error.category(), error.message())
}

pub fn render_message(message: &StatusMessage) -> String {
    if message.is_error() {
        format!("error: {}", message.text)
    } else {
        message.text.clone()
    }
}

pub fn render_wallet_list(wallets: &[String]) -> String {
    if wallets.is_empty() {
        return "No wallets yet; create or import one".to_string();
    }
    wallets
        .iter()
        .map(|name| format!("  {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_created(created: &CreatedWallet) -> String {
    format!(
        "Recovery phrase for '{}' (shown once, store it offline):\n  {}\nFirst address: {}",
        created.name,
        created.mnemonic.as_str(),
        created.address
    )
}

pub fn render_account(account: &Account) -> String {
    let marker = if account.is_selected { '*' } else { ' ' };
    format!(
        "{marker} [{}] {}  {}  created {}",
        account.index,
        account.derivation_path(),
        account.address,
        account.created_at.format(TIMESTAMP_FORMAT)
    )
}

pub fn render_accounts(accounts: &[Account]) -> String {
    if accounts.is_empty() {
        return "No accounts".to_string();
    }
    accounts
        .iter()
        .map(render_account)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_summary(summary: Option<&WalletSummary>) -> String {
    let Some(summary) = summary else {
        return "Wallet info unavailable".to_string();
    };

    let mut lines = vec![
        format!("Total accounts: {}", summary.total_accounts),
        format!(
            "Selected account: {}",
            summary.selected_account.as_deref().unwrap_or("none")
        ),
    ];
    if let Some(created_at) = summary.created_at {
        lines.push(format!("Created: {}", created_at.format(TIMESTAMP_FORMAT)));
    }
    if let Some(last_modified) = summary.last_modified {
        lines.push(format!(
            "Last modified: {}",
            last_modified.format(TIMESTAMP_FORMAT)
        ));
    }
    lines.join("\n")
}

pub fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut lines = Vec::new();

    match (&snapshot.phase, &snapshot.open_wallet) {
        (SessionPhase::WalletOpen { selected }, Some(name)) => {
            let selected = selected
                .map(|index| index.to_string())
                .unwrap_or_else(|| "none".to_string());
            lines.push(format!("Wallet: {name} (selected account: {selected})"));
            lines.push(render_accounts(&snapshot.accounts));
            lines.push(render_summary(snapshot.summary.as_ref()));
        }
        _ => {
            lines.push("No wallet open".to_string());
            lines.push(format!("Wallets:\n{}", render_wallet_list(&snapshot.wallets)));
        }
    }

    if snapshot.busy {
        lines.push("An operation is in progress".to_string());
    }
    if snapshot.mnemonic_input.is_some() {
        lines.push("A recovery phrase draft is kept for correction".to_string());
    }
    if let Some(signature) = &snapshot.signature {
        lines.push(format!("Last signature: {signature}"));
    }
    if let Some(message) = &snapshot.last_message {
        lines.push(render_message(message));
    }

    lines.join("\n")
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
