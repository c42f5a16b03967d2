//! Wire types for the cooperative backend API.
//!
//! Field casing follows the backend's JSON exactly; it is not uniform
//! (camelCase requests, a snake_case `plaid_item_id` on the set-step
//! response, capitalized storage-node fields on the upload receipt).

use serde::{Deserialize, Serialize};

use crate::chain::TokenId;
use crate::onboarding::state::OnboardingStep;

/// The persisted onboarding record for one wallet address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRecord {
    pub onboarding_step: OnboardingStep,
    /// Data-provider session handle, once link has completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plaid_item_id: Option<String>,
    /// Content identifier of the uploaded encrypted artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
}

/// Body of `POST /api/v1/set_onboarding_step/{address}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStepRequest {
    pub onboarding_step: OnboardingStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
}

/// Response of the set-step endpoint: the updated record, nested under
/// `user` with the provider handle in snake_case.
#[derive(Debug, Clone, Deserialize)]
pub struct SetStepResponse {
    pub user: UpdatedUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatedUser {
    #[serde(rename = "onboardingStep")]
    pub onboarding_step: OnboardingStep,
    #[serde(default)]
    pub plaid_item_id: Option<String>,
    #[serde(default)]
    pub cid: Option<String>,
}

impl From<UpdatedUser> for OnboardingRecord {
    fn from(user: UpdatedUser) -> Self {
        Self {
            onboarding_step: user.onboarding_step,
            plaid_item_id: user.plaid_item_id,
            cid: user.cid,
        }
    }
}

/// Historical-sync status for a data-provider session.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalStatus {
    #[serde(default)]
    pub completed: bool,
}

/// Synced transaction data from the provider; the payload is opaque to the
/// client and is encrypted and uploaded as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSyncData {
    #[serde(flatten)]
    pub payload: serde_json::Value,
}

/// Body of `POST /api/v1/upload_encrypted`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEncryptedRequest {
    /// Plaintext payload; the backend encrypts before storage.
    pub data: String,
    pub signed_message: String,
    pub public_key: String,
}

/// Storage-node receipt for an uploaded encrypted artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub data: UploadedArtifact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedArtifact {
    #[serde(rename = "Name")]
    pub name: String,
    /// The content identifier.
    #[serde(rename = "Hash")]
    pub hash: String,
    #[serde(rename = "Size")]
    pub size: String,
}

/// Body of `POST /api/v1/apply_access_cond`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyAccessCondRequest {
    pub cid: String,
    pub token_id: TokenId,
    pub signed_message: String,
    pub public_key: String,
}

/// Response of `POST /api/v1/create_link_token`.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkTokenResponse {
    pub link_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_decodes_camel_case() {
        let json = r#"{"onboardingStep":"minting","plaidItemId":"item-1","cid":"bafy123"}"#;
        let record: OnboardingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.onboarding_step, OnboardingStep::Minting);
        assert_eq!(record.plaid_item_id.as_deref(), Some("item-1"));
        assert_eq!(record.cid.as_deref(), Some("bafy123"));
    }

    #[test]
    fn record_decodes_with_absent_optionals() {
        let json = r#"{"onboardingStep":"processing"}"#;
        let record: OnboardingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.onboarding_step, OnboardingStep::Processing);
        assert!(record.plaid_item_id.is_none());
        assert!(record.cid.is_none());
    }

    #[test]
    fn set_step_request_omits_absent_cid() {
        let req = SetStepRequest {
            onboarding_step: OnboardingStep::FetchingPlaid,
            cid: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"onboardingStep":"fetching_plaid"}"#);
    }

    #[test]
    fn set_step_response_uses_snake_case_item_id() {
        let json = r#"{"user":{"onboardingStep":"minting","plaid_item_id":"item-2","cid":"bafyabc"}}"#;
        let resp: SetStepResponse = serde_json::from_str(json).unwrap();
        let record: OnboardingRecord = resp.user.into();
        assert_eq!(record.plaid_item_id.as_deref(), Some("item-2"));
    }

    #[test]
    fn upload_receipt_decodes_storage_node_fields() {
        let json = r#"{"data":{"Name":"daln.json","Hash":"bafy123","Size":"2048"}}"#;
        let receipt: UploadReceipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.data.hash, "bafy123");
        assert_eq!(receipt.data.size, "2048");
    }

    #[test]
    fn access_cond_request_serializes_camel_case() {
        let req = ApplyAccessCondRequest {
            cid: "bafy123".to_string(),
            token_id: TokenId(4),
            signed_message: "0xsig".to_string(),
            public_key: "0xabc".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["tokenId"], 4);
        assert_eq!(json["signedMessage"], "0xsig");
        assert_eq!(json["publicKey"], "0xabc");
    }
}
