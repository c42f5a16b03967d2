//! Cooperative backend API surface.
//!
//! `CoopApi` is the seam the rest of the crate depends on; `HttpCoopApi`
//! is the reqwest-backed implementation. Tests substitute in-memory fakes.

pub mod http;
pub mod types;

use async_trait::async_trait;

use crate::chain::Address;
use crate::error::ApiError;

pub use http::HttpCoopApi;
pub use types::{
    ApplyAccessCondRequest, HistoricalStatus, LinkTokenResponse, OnboardingRecord,
    ProviderSyncData, SetStepRequest, UploadEncryptedRequest, UploadReceipt, UploadedArtifact,
};

/// One method per backend endpoint, request/response bodies JSON.
#[async_trait]
pub trait CoopApi: Send + Sync {
    /// Read the onboarding record for an address.
    ///
    /// `ApiError::NotFound` means no record exists yet; callers treat that
    /// as not-started. Implementations must not retry on failure.
    async fn get_onboarding_step(&self, address: &Address)
        -> Result<OnboardingRecord, ApiError>;

    /// Advance/persist the onboarding step; returns the updated record.
    async fn set_onboarding_step(
        &self,
        address: &Address,
        request: SetStepRequest,
    ) -> Result<OnboardingRecord, ApiError>;

    /// Poll the data-provider historical sync status for a session handle.
    async fn check_historical_update_status(
        &self,
        plaid_item_id: &str,
    ) -> Result<HistoricalStatus, ApiError>;

    /// Fetch the synced transaction data for a session handle.
    async fn plaid_transaction_sync(&self, item_id: &str)
        -> Result<ProviderSyncData, ApiError>;

    /// Store an encrypted payload; returns the storage receipt with CID.
    async fn upload_encrypted(
        &self,
        request: UploadEncryptedRequest,
    ) -> Result<UploadReceipt, ApiError>;

    /// Register the decryption access policy for a CID.
    async fn apply_access_condition(
        &self,
        request: ApplyAccessCondRequest,
    ) -> Result<(), ApiError>;

    /// Obtain a data-provider link session token.
    async fn create_link_token(&self) -> Result<LinkTokenResponse, ApiError>;

    /// Remove the onboarding record after the credential has been burned.
    async fn burn(&self, address: &Address) -> Result<(), ApiError>;
}
