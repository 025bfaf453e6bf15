use std::fmt;

use serde::{Deserialize, Serialize};

/// BIP44 coin type registered for the wallet's chain.
pub const COIN_TYPE: u32 = 55555;

/// Mnemonic lengths accepted when deriving an account from a seed phrase.
pub const MNEMONIC_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

macro_rules! index_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);
    };
}

index_newtype!(AccountIndex);

impl AccountIndex {
    /// Full BIP44 path for the account at this position.
    pub fn derivation_path(self) -> String {
        format!("m/44'/{COIN_TYPE}'/0'/0/{}", self.0)
    }
}

impl fmt::Display for AccountIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletName(String);

impl WalletName {
    /// Returns `None` when the name is blank after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WalletName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whitespace-delimited word count of a trimmed seed phrase.
pub fn mnemonic_word_count(mnemonic: &str) -> usize {
    mnemonic.split_whitespace().count()
}

pub fn is_accepted_word_count(count: usize) -> bool {
    MNEMONIC_WORD_COUNTS.contains(&count)
}
