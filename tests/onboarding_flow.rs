//! End-to-end onboarding flow against in-memory collaborators: link →
//! poller-driven processing → sync → upload → mint → access condition,
//! then burn, plus the admin browse/decrypt surface.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use daln_client::api::{
    ApplyAccessCondRequest, CoopApi, HistoricalStatus, LinkTokenResponse, OnboardingRecord,
    ProviderSyncData, SetStepRequest, UploadEncryptedRequest, UploadReceipt, UploadedArtifact,
};
use daln_client::chain::{
    Address, MembershipContract, Signer, TokenId, TokenInfo, TxReceipt,
};
use daln_client::config::ClientConfig;
use daln_client::error::{ApiError, ChainError};
use daln_client::membership::{burn_membership, AdminClient};
use daln_client::onboarding::{spawn_historical_poller, OnboardingStep, Phase, Sequencer};
use daln_client::storage::AuthApi;

/// Backend fake: one record slot, historical sync completing on the
/// third status poll.
#[derive(Default)]
struct FakeBackend {
    record: Mutex<Option<OnboardingRecord>>,
    status_polls: AtomicUsize,
    access_conditions: Mutex<Vec<(String, TokenId)>>,
}

#[async_trait]
impl CoopApi for FakeBackend {
    async fn get_onboarding_step(
        &self,
        _address: &Address,
    ) -> Result<OnboardingRecord, ApiError> {
        self.record.lock().unwrap().clone().ok_or(ApiError::NotFound)
    }

    async fn set_onboarding_step(
        &self,
        _address: &Address,
        request: SetStepRequest,
    ) -> Result<OnboardingRecord, ApiError> {
        let mut slot = self.record.lock().unwrap();
        let previous = slot.take();
        let updated = OnboardingRecord {
            onboarding_step: request.onboarding_step,
            plaid_item_id: previous
                .as_ref()
                .and_then(|r| r.plaid_item_id.clone())
                .or_else(|| Some("item-e2e".to_string())),
            cid: request.cid.or_else(|| previous.and_then(|r| r.cid)),
        };
        *slot = Some(updated.clone());
        Ok(updated)
    }

    async fn check_historical_update_status(
        &self,
        _plaid_item_id: &str,
    ) -> Result<HistoricalStatus, ApiError> {
        let polls = self.status_polls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(HistoricalStatus { completed: polls >= 3 })
    }

    async fn plaid_transaction_sync(
        &self,
        _item_id: &str,
    ) -> Result<ProviderSyncData, ApiError> {
        Ok(ProviderSyncData {
            payload: serde_json::json!({
                "accounts": [{"account_id": "acc-1"}],
                "transactions": [{"amount": 42.0, "name": "coffee"}],
            }),
        })
    }

    async fn upload_encrypted(
        &self,
        request: UploadEncryptedRequest,
    ) -> Result<UploadReceipt, ApiError> {
        assert!(!request.data.is_empty());
        assert_eq!(request.signed_message, "0xsigned");
        Ok(UploadReceipt {
            data: UploadedArtifact {
                name: "daln.json".to_string(),
                hash: "bafy-e2e".to_string(),
                size: "4096".to_string(),
            },
        })
    }

    async fn apply_access_condition(
        &self,
        request: ApplyAccessCondRequest,
    ) -> Result<(), ApiError> {
        self.access_conditions
            .lock()
            .unwrap()
            .push((request.cid, request.token_id));
        Ok(())
    }

    async fn create_link_token(&self) -> Result<LinkTokenResponse, ApiError> {
        Ok(LinkTokenResponse {
            link_token: "link-e2e".to_string(),
        })
    }

    async fn burn(&self, _address: &Address) -> Result<(), ApiError> {
        *self.record.lock().unwrap() = None;
        Ok(())
    }
}

struct FakeAuth;

#[async_trait]
impl AuthApi for FakeAuth {
    async fn auth_message(
        &self,
        _address: &Address,
    ) -> Result<String, daln_client::error::AdapterError> {
        Ok("auth message".to_string())
    }
}

struct FakeWallet;

#[async_trait]
impl Signer for FakeWallet {
    fn address(&self) -> Address {
        Address::new("0xmember000000000000000000000000000000001")
    }

    async fn sign_message(&self, _message: &str) -> Result<String, ChainError> {
        Ok("0xsigned".to_string())
    }

    async fn balance(&self) -> Result<u128, ChainError> {
        Ok(1_000_000_000_000_000_000)
    }
}

/// Contract fake: a single token slot per owner plus an admin address.
struct FakeContract {
    tokens: Mutex<Vec<TokenInfo>>,
    admin: Address,
}

impl FakeContract {
    fn new(admin: Address) -> Self {
        Self {
            tokens: Mutex::new(Vec::new()),
            admin,
        }
    }
}

#[async_trait]
impl MembershipContract for FakeContract {
    async fn balance_of(&self, owner: &Address) -> Result<u64, ChainError> {
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens.iter().filter(|t| &t.owner == owner).count() as u64)
    }

    async fn token_of_owner_by_index(
        &self,
        owner: &Address,
        index: u64,
    ) -> Result<Option<TokenId>, ChainError> {
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens
            .iter()
            .filter(|t| &t.owner == owner)
            .nth(index as usize)
            .map(|t| t.token_id))
    }

    async fn get_token_info(&self, token_id: TokenId) -> Result<TokenInfo, ChainError> {
        let tokens = self.tokens.lock().unwrap();
        tokens
            .iter()
            .find(|t| t.token_id == token_id)
            .cloned()
            .ok_or_else(|| ChainError::Read(format!("no token {token_id}")))
    }

    async fn get_token_infos(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<TokenInfo>, ChainError> {
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens
            .iter()
            .skip((page * page_size) as usize)
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    async fn is_admin(&self, address: &Address) -> Result<bool, ChainError> {
        Ok(address == &self.admin)
    }

    async fn safe_mint(&self, cid: &str) -> Result<TxReceipt, ChainError> {
        let mut tokens = self.tokens.lock().unwrap();
        let token_id = TokenId(tokens.len() as u64 + 1);
        tokens.push(TokenInfo {
            token_id,
            owner: FakeWallet.address(),
            cid: cid.to_string(),
            minted_at: Some(Utc::now()),
        });
        Ok(TxReceipt {
            tx_hash: format!("0xmint{token_id}"),
        })
    }

    async fn burn(&self, token_id: TokenId) -> Result<TxReceipt, ChainError> {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.retain(|t| t.token_id != token_id);
        Ok(TxReceipt {
            tx_hash: format!("0xburn{token_id}"),
        })
    }

    async fn decrypt(
        &self,
        token_ids: &[TokenId],
        payment_wei: u128,
    ) -> Result<TxReceipt, ChainError> {
        if payment_wei == 0 {
            return Err(ChainError::TxFailed("decrypt requires payment".to_string()));
        }
        Ok(TxReceipt {
            tx_hash: format!("0xdecrypt-{}", token_ids.len()),
        })
    }
}

fn admin_address() -> Address {
    Address::new("0xadmin0000000000000000000000000000000001")
}

#[tokio::test(start_paused = true)]
async fn full_onboarding_then_burn() {
    let api = Arc::new(FakeBackend::default());
    let contract = Arc::new(FakeContract::new(admin_address()));
    let sequencer = Arc::new(Sequencer::new(
        Arc::clone(&api) as Arc<dyn CoopApi>,
        Arc::new(FakeAuth),
        Arc::new(FakeWallet),
        Arc::clone(&contract) as Arc<dyn MembershipContract>,
        ClientConfig::default(),
    ));

    // Nothing persisted yet.
    assert_eq!(sequencer.refresh().await.unwrap(), Phase::NotStarted);

    // Terms accepted, provider link completed.
    let link = sequencer.create_link_session().await.unwrap();
    assert_eq!(link.link_token, "link-e2e");
    sequencer.begin("item-e2e".to_string()).await.unwrap();
    assert_eq!(
        sequencer.phase().await,
        Phase::Step(OnboardingStep::Processing)
    );

    // The poller advances on the third status poll, then terminates.
    let (handle, _shutdown) = spawn_historical_poller(Arc::clone(&sequencer));
    handle.await.unwrap();
    assert_eq!(
        sequencer.phase().await,
        Phase::Step(OnboardingStep::FetchingPlaid)
    );
    assert_eq!(api.status_polls.load(Ordering::SeqCst), 3);

    // Provider sync, then encrypt and upload.
    sequencer.sync_provider_data().await.unwrap();
    assert!(sequencer.can_encrypt().await);
    sequencer.encrypt_and_upload().await.unwrap();
    assert_eq!(sequencer.cid().await.as_deref(), Some("bafy-e2e"));

    // Mint, resolve the token id, set the access condition.
    assert!(sequencer.can_mint().await);
    sequencer.mint().await.unwrap();
    let token_id = sequencer.resolve_token_id().await.unwrap().unwrap();
    assert!(sequencer.can_set_access().await);
    sequencer.set_access_condition().await.unwrap();
    assert!(sequencer.is_complete().await);

    let conditions = api.access_conditions.lock().unwrap().clone();
    assert_eq!(conditions, vec![("bafy-e2e".to_string(), token_id)]);

    // Burn: chain first, then the backend record.
    let owner = FakeWallet.address();
    burn_membership(api.as_ref(), contract.as_ref(), &owner, token_id)
        .await
        .unwrap();
    assert_eq!(contract.balance_of(&owner).await.unwrap(), 0);
    assert_eq!(sequencer.refresh().await.unwrap(), Phase::NotStarted);
}

#[tokio::test]
async fn admin_browse_and_decrypt() {
    let contract = Arc::new(FakeContract::new(admin_address()));
    contract.safe_mint("bafy-a").await.unwrap();
    contract.safe_mint("bafy-b").await.unwrap();

    // Non-admin is refused.
    assert!(AdminClient::connect(
        Arc::clone(&contract) as Arc<dyn MembershipContract>,
        FakeWallet.address(),
    )
    .await
    .is_err());

    let admin = AdminClient::connect(
        Arc::clone(&contract) as Arc<dyn MembershipContract>,
        admin_address(),
    )
    .await
    .unwrap();

    let tokens = admin.list_tokens(0, 10).await.unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].cid, "bafy-a");

    let ids: Vec<TokenId> = tokens.iter().map(|t| t.token_id).collect();
    assert!(admin.decrypt_tokens(&ids, 0).await.is_err());
    let receipt = admin.decrypt_tokens(&ids, 1_000).await.unwrap();
    assert_eq!(receipt.tx_hash, "0xdecrypt-2");
}
