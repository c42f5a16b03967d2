//! reqwest-backed implementation of [`CoopApi`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::chain::Address;
use crate::error::ApiError;

use super::types::{
    ApplyAccessCondRequest, HistoricalStatus, LinkTokenResponse, OnboardingRecord,
    ProviderSyncData, SetStepRequest, SetStepResponse, UploadEncryptedRequest, UploadReceipt,
};
use super::CoopApi;

/// HTTP client for the cooperative backend.
pub struct HttpCoopApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCoopApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{path}", self.base_url)
    }

    /// Decode a response, mapping 404 to `NotFound` and other non-2xx
    /// statuses to `Status`.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Self::decode(response).await
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Self::decode(response).await
    }
}

#[async_trait]
impl CoopApi for HttpCoopApi {
    async fn get_onboarding_step(
        &self,
        address: &Address,
    ) -> Result<OnboardingRecord, ApiError> {
        self.get_json(&format!("get_onboarding_step/{address}")).await
    }

    async fn set_onboarding_step(
        &self,
        address: &Address,
        request: SetStepRequest,
    ) -> Result<OnboardingRecord, ApiError> {
        let response: SetStepResponse = self
            .post_json(&format!("set_onboarding_step/{address}"), &request)
            .await?;
        Ok(response.user.into())
    }

    async fn check_historical_update_status(
        &self,
        plaid_item_id: &str,
    ) -> Result<HistoricalStatus, ApiError> {
        self.get_json(&format!("check_historical_update_status/{plaid_item_id}"))
            .await
    }

    async fn plaid_transaction_sync(
        &self,
        item_id: &str,
    ) -> Result<ProviderSyncData, ApiError> {
        self.get_json(&format!("plaid_transaction_sync/{item_id}")).await
    }

    async fn upload_encrypted(
        &self,
        request: UploadEncryptedRequest,
    ) -> Result<UploadReceipt, ApiError> {
        self.post_json("upload_encrypted", &request).await
    }

    async fn apply_access_condition(
        &self,
        request: ApplyAccessCondRequest,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("apply_access_cond"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn create_link_token(&self) -> Result<LinkTokenResponse, ApiError> {
        let response = self
            .client
            .post(self.url("create_link_token"))
            .send()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Self::decode(response).await
    }

    async fn burn(&self, address: &Address) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("burn/{address}")))
            .send()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_builder_strips_trailing_slash() {
        let api = HttpCoopApi::new("https://api.daln.example/");
        assert_eq!(
            api.url("create_link_token"),
            "https://api.daln.example/api/v1/create_link_token"
        );
    }
}
