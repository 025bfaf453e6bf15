//! Wallet session core: the state machine between a wallet view and the command
//! backend that owns keys, derivation and signing.

pub mod controller;
pub mod error;
pub mod gateway;
pub mod http_gateway;
pub mod intent;
pub mod state;
pub mod validation;

pub use controller::{CreatedWallet, ImportedWallet, OpenedWallet, RefreshReport, SessionController};
pub use error::{FailureKind, Operation, SessionError};
pub use gateway::{GatewayError, GatewayResult, MissingWalletGateway, WalletGateway};
pub use http_gateway::HttpWalletGateway;
pub use intent::{IntentOutcome, SessionIntent};
pub use state::{
    Account, MessageLevel, MnemonicDraft, SessionPhase, SessionSnapshot, StatusMessage,
    WalletSummary,
};
pub use validation::ValidationError;
