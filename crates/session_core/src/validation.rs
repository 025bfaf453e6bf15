//! Local precondition checks. A failure here never reaches the gateway.

use shared::domain::{is_accepted_word_count, mnemonic_word_count, WalletName};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a wallet name")]
    EmptyWalletName,
    #[error("Please enter both wallet name and mnemonic")]
    MissingImportFields,
    #[error("Please enter a mnemonic phrase")]
    EmptyMnemonic,
    #[error("Invalid mnemonic word count: {count}. Must be 12, 15, 18, 21, or 24 words.")]
    InvalidMnemonicWordCount { count: usize },
    #[error("Account index {index} is out of range; the wallet has {len} account(s)")]
    AccountIndexOutOfRange { index: usize, len: usize },
    #[error("Please enter transaction data")]
    EmptyTransactionData,
    #[error("No wallet is open")]
    NoWalletOpen,
}

pub fn wallet_name(raw: &str) -> Result<WalletName, ValidationError> {
    WalletName::parse(raw).ok_or(ValidationError::EmptyWalletName)
}

/// Whole-wallet import only checks presence; the backend validates the phrase itself.
pub fn import_fields<'a>(
    raw_name: &str,
    raw_mnemonic: &'a str,
) -> Result<(WalletName, &'a str), ValidationError> {
    let mnemonic = raw_mnemonic.trim();
    match WalletName::parse(raw_name) {
        Some(name) if !mnemonic.is_empty() => Ok((name, mnemonic)),
        _ => Err(ValidationError::MissingImportFields),
    }
}

pub fn account_mnemonic(raw: &str) -> Result<&str, ValidationError> {
    let mnemonic = raw.trim();
    if mnemonic.is_empty() {
        return Err(ValidationError::EmptyMnemonic);
    }

    let count = mnemonic_word_count(mnemonic);
    if !is_accepted_word_count(count) {
        return Err(ValidationError::InvalidMnemonicWordCount { count });
    }

    Ok(mnemonic)
}

pub fn account_index(index: usize, len: usize) -> Result<usize, ValidationError> {
    if index >= len {
        return Err(ValidationError::AccountIndexOutOfRange { index, len });
    }
    Ok(index)
}

/// Hex well-formedness is left to the backend.
pub fn transaction_data(raw: &str) -> Result<&str, ValidationError> {
    let data = raw.trim();
    if data.is_empty() {
        return Err(ValidationError::EmptyTransactionData);
    }
    Ok(data)
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
