//! Encrypted-storage adapters: upload and access-condition registration.
//!
//! Both operations authenticate with a wallet signature over an auth
//! message issued by the storage network, so they share the signing step.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::api::{ApplyAccessCondRequest, CoopApi, UploadEncryptedRequest, UploadedArtifact};
use crate::chain::{Address, Signer, TokenId};
use crate::error::{AdapterError, ApiError, ChainError};

/// Issues the auth message a wallet must sign before storage operations.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn auth_message(&self, address: &Address) -> Result<String, AdapterError>;
}

/// Auth-message endpoint of the storage network's encryption service.
pub struct HttpAuthApi {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct AuthMessageResponse {
    data: AuthMessageData,
}

#[derive(Deserialize)]
struct AuthMessageData {
    message: String,
}

impl HttpAuthApi {
    pub const DEFAULT_BASE_URL: &'static str = "https://encryption.lighthouse.storage";

    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpAuthApi {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn auth_message(&self, address: &Address) -> Result<String, AdapterError> {
        let url = format!("{}/api/message/{address}", self.base_url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AdapterError::Upload(format!("auth message fetch failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AdapterError::Upload(format!(
                "auth message fetch returned {}",
                response.status()
            )));
        }
        let body: AuthMessageResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Upload(format!("auth message decode failed: {e}")))?;
        Ok(body.data.message)
    }
}

/// A wallet signature over the storage auth message.
struct EncryptionSignature {
    signed_message: String,
    public_key: String,
}

/// Encrypt-and-upload and set-access-condition adapters over the backend.
pub struct EncryptedStore {
    api: Arc<dyn CoopApi>,
    auth: Arc<dyn AuthApi>,
    signer: Arc<dyn Signer>,
}

impl EncryptedStore {
    pub fn new(api: Arc<dyn CoopApi>, auth: Arc<dyn AuthApi>, signer: Arc<dyn Signer>) -> Self {
        Self { api, auth, signer }
    }

    async fn encryption_signature(&self) -> Result<EncryptionSignature, AdapterError> {
        let address = self.signer.address();
        let message = self.auth.auth_message(&address).await?;
        let signed_message = self.signer.sign_message(&message).await.map_err(|e| match e {
            ChainError::UserRejected => AdapterError::SignatureRejected,
            other => AdapterError::Upload(other.to_string()),
        })?;
        Ok(EncryptionSignature {
            signed_message,
            public_key: address.to_string(),
        })
    }

    /// Sign, encrypt, and store a plaintext payload. Returns the storage
    /// receipt; the `hash` field is the content identifier.
    pub async fn upload(&self, data: String) -> Result<UploadedArtifact, AdapterError> {
        let sig = self.encryption_signature().await?;
        let receipt = self
            .api
            .upload_encrypted(UploadEncryptedRequest {
                data,
                signed_message: sig.signed_message,
                public_key: sig.public_key,
            })
            .await
            .map_err(|e| AdapterError::Upload(e.to_string()))?;
        info!(cid = %receipt.data.hash, size = %receipt.data.size, "Encrypted artifact stored");
        Ok(receipt.data)
    }

    /// Register the decryption access policy binding `cid` to `token_id`.
    pub async fn apply_access_condition(
        &self,
        cid: &str,
        token_id: TokenId,
    ) -> Result<(), AdapterError> {
        let sig = self.encryption_signature().await.map_err(|e| match e {
            AdapterError::SignatureRejected => AdapterError::SignatureRejected,
            AdapterError::Upload(msg) => AdapterError::AccessCondition(msg),
            other => other,
        })?;
        self.api
            .apply_access_condition(ApplyAccessCondRequest {
                cid: cid.to_string(),
                token_id,
                signed_message: sig.signed_message,
                public_key: sig.public_key,
            })
            .await
            .map_err(|e: ApiError| AdapterError::AccessCondition(e.to_string()))?;
        info!(%cid, %token_id, "Access condition registered");
        Ok(())
    }
}
