//! Error types for the DALN client.

use crate::chain::Address;
use crate::onboarding::state::OnboardingStep;

/// Top-level error type for the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Sequencer error: {0}")]
    Sequencer(#[from] SequencerError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the cooperative backend API.
///
/// `NotFound` on the step read means "no onboarding record yet" — callers
/// treat it as the initial state, not a fault. Transient failures on the
/// step read/write path are surfaced and never auto-retried, so a backend
/// outage stays visible instead of being masked.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No record for this address")]
    NotFound,

    #[error("Transient network failure: {0}")]
    Transient(String),

    #[error("Backend returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the external action adapters (upload, access condition,
/// provider sync). Surfaced inline; never advance the step.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Encrypted upload failed: {0}")]
    Upload(String),

    #[error("Access condition registration failed: {0}")]
    AccessCondition(String),

    #[error("Provider transaction sync failed: {0}")]
    ProviderSync(String),

    #[error("Wallet signature rejected")]
    SignatureRejected,
}

/// Errors from the membership contract and signer.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Transaction rejected by user")]
    UserRejected,

    #[error("Insufficient funds for gas: balance {balance} wei, need {required} wei")]
    InsufficientFunds { balance: u128, required: u128 },

    #[error("Transaction failed: {0}")]
    TxFailed(String),

    #[error("Timed out waiting for transaction confirmation")]
    Timeout,

    #[error("Contract read failed: {0}")]
    Read(String),
}

/// Violations of the onboarding step machine.
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error("Illegal step transition: {from:?} -> {to}")]
    InvalidTransition {
        from: Option<OnboardingStep>,
        to: OnboardingStep,
    },

    #[error("A step advance is already in flight for {address}")]
    AdvanceInFlight { address: Address },

    #[error("No content identifier recorded; encrypt and upload first")]
    MissingCid,

    #[error("Membership token id has not resolved yet")]
    MissingTokenId,

    #[error("No data-provider session handle recorded")]
    MissingItemId,

    #[error("No synced provider data available yet")]
    MissingSyncData,

    #[error("Onboarding already complete")]
    Terminal,
}

/// Result type alias for the client.
pub type Result<T> = std::result::Result<T, Error>;
