//! Onboarding sequencer — drives a member through the six onboarding
//! steps against the backend record, the encrypted store, and the
//! membership contract.
//!
//! The remote record is the single source of truth; every mutation goes
//! through the sequencer's single write path, never read-modify-write
//! against partial state. A per-sequencer advance guard serializes step
//! advances so a concurrent duplicate action cannot double-advance.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::api::{CoopApi, LinkTokenResponse, OnboardingRecord, SetStepRequest};
use crate::chain::{Address, MembershipContract, Signer, TokenId};
use crate::config::ClientConfig;
use crate::error::{Error, Result, SequencerError};
use crate::onboarding::state::{OnboardingStep, Phase};
use crate::storage::{AuthApi, EncryptedStore};

/// Outcome of one historical-sync poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Sync not complete yet; poll again next tick.
    Pending,
    /// Sync completed and the step advanced to `FetchingPlaid`.
    Advanced,
    /// The step has left `Processing`; polling must stop.
    Stopped,
}

#[derive(Default)]
struct SequencerState {
    /// Last observed remote record; `None` until the first write or a
    /// successful read.
    record: Option<OnboardingRecord>,
    /// Resolved membership token id (chain read, not persisted remotely).
    token_id: Option<TokenId>,
    /// Synced provider payload, serialized and held for upload.
    sync_data: Option<String>,
    /// Session-scoped fallback for the provider session handle, used when
    /// the remote record has not recorded it yet.
    session_item_id: Option<String>,
}

/// Coordinates step reads/writes, external adapters, and gating for one
/// wallet address.
pub struct Sequencer {
    address: Address,
    api: Arc<dyn CoopApi>,
    store: EncryptedStore,
    signer: Arc<dyn Signer>,
    contract: Arc<dyn MembershipContract>,
    config: ClientConfig,
    state: RwLock<SequencerState>,
    /// Held for the duration of any step-advancing action. `try_lock`
    /// failure means an advance is already in flight.
    advance_lock: Mutex<()>,
}

impl Sequencer {
    pub fn new(
        api: Arc<dyn CoopApi>,
        auth: Arc<dyn AuthApi>,
        signer: Arc<dyn Signer>,
        contract: Arc<dyn MembershipContract>,
        config: ClientConfig,
    ) -> Self {
        let store = EncryptedStore::new(Arc::clone(&api), auth, Arc::clone(&signer));
        Self {
            address: signer.address(),
            api,
            store,
            signer,
            contract,
            config,
            state: RwLock::new(SequencerState::default()),
            advance_lock: Mutex::new(()),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Configured historical-sync poll interval.
    pub fn poll_interval(&self) -> std::time::Duration {
        self.config.historical_poll_interval
    }

    // ── Step Reader ─────────────────────────────────────────────────

    /// Fetch the remote record and return the resulting render phase.
    ///
    /// `NotFound` maps to `Phase::NotStarted`. Transient failures are
    /// returned to the caller, never retried here.
    pub async fn refresh(&self) -> Result<Phase> {
        match self.api.get_onboarding_step(&self.address).await {
            Ok(record) => {
                let step = record.onboarding_step;
                let mut state = self.state.write().await;
                if let Some(item_id) = &record.plaid_item_id {
                    state.session_item_id = Some(item_id.clone());
                }
                state.record = Some(record);
                Ok(Phase::Step(step))
            }
            Err(crate::error::ApiError::NotFound) => {
                let mut state = self.state.write().await;
                state.record = None;
                Ok(Phase::NotStarted)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Current render phase from the last observed record.
    pub async fn phase(&self) -> Phase {
        let state = self.state.read().await;
        Phase::from_step(state.record.as_ref().map(|r| r.onboarding_step))
    }

    /// Recorded content identifier, if any.
    pub async fn cid(&self) -> Option<String> {
        let state = self.state.read().await;
        state.record.as_ref().and_then(|r| r.cid.clone())
    }

    /// Resolved membership token id, if any.
    pub async fn token_id(&self) -> Option<TokenId> {
        self.state.read().await.token_id
    }

    /// Provider session handle: the remote record's, or the session-scoped
    /// fallback recorded at link time.
    pub async fn item_id(&self) -> Option<String> {
        let state = self.state.read().await;
        state
            .record
            .as_ref()
            .and_then(|r| r.plaid_item_id.clone())
            .or_else(|| state.session_item_id.clone())
    }

    // ── Gating predicates ───────────────────────────────────────────

    /// Whether a step-advancing action is currently in flight.
    pub fn busy(&self) -> bool {
        self.advance_lock.try_lock().is_err()
    }

    /// Encrypt action: enabled only at `Encryption`, with sync data in
    /// hand and nothing in flight.
    pub async fn can_encrypt(&self) -> bool {
        let state = self.state.read().await;
        let at_step = matches!(
            state.record.as_ref().map(|r| r.onboarding_step),
            Some(OnboardingStep::Encryption)
        );
        at_step && state.sync_data.is_some() && !self.busy()
    }

    /// Mint action: enabled only at `Minting` with a recorded CID.
    pub async fn can_mint(&self) -> bool {
        let state = self.state.read().await;
        let at_step = matches!(
            state.record.as_ref().map(|r| r.onboarding_step),
            Some(OnboardingStep::Minting)
        );
        at_step && state.record.as_ref().is_some_and(|r| r.cid.is_some()) && !self.busy()
    }

    /// Set-access action: enabled only at `SetAccess` once both the CID
    /// and the on-chain token id have resolved.
    pub async fn can_set_access(&self) -> bool {
        let state = self.state.read().await;
        let at_step = matches!(
            state.record.as_ref().map(|r| r.onboarding_step),
            Some(OnboardingStep::SetAccess)
        );
        at_step
            && state.record.as_ref().is_some_and(|r| r.cid.is_some())
            && state.token_id.is_some()
            && !self.busy()
    }

    // ── Entry ───────────────────────────────────────────────────────

    /// Obtain a data-provider link session token (pre-onboarding).
    pub async fn create_link_session(&self) -> Result<LinkTokenResponse> {
        Ok(self.api.create_link_token().await?)
    }

    /// Start onboarding after the user accepted terms and the provider
    /// link session completed with `item_id`. Writes the first step.
    pub async fn begin(&self, item_id: String) -> Result<Phase> {
        let guard = self.try_advance()?;
        {
            let state = self.state.read().await;
            if state.record.is_some() {
                return Err(SequencerError::InvalidTransition {
                    from: state.record.as_ref().map(|r| r.onboarding_step),
                    to: OnboardingStep::Processing,
                }
                .into());
            }
        }
        {
            let mut state = self.state.write().await;
            state.session_item_id = Some(item_id);
        }
        self.write_step(&guard, OnboardingStep::Processing, None).await?;
        Ok(Phase::Step(OnboardingStep::Processing))
    }

    // ── Processing: historical-sync polling ─────────────────────────

    /// One poll of the historical-sync status. Advances to
    /// `FetchingPlaid` exactly once, on the first completed response
    /// observed while still at `Processing`.
    pub async fn poll_historical_once(&self) -> Result<PollOutcome> {
        if self.phase().await != Phase::Step(OnboardingStep::Processing) {
            return Ok(PollOutcome::Stopped);
        }
        let item_id = self.item_id().await.ok_or(SequencerError::MissingItemId)?;
        let status = self.api.check_historical_update_status(&item_id).await?;
        if !status.completed {
            return Ok(PollOutcome::Pending);
        }

        let Ok(guard) = self.advance_lock.try_lock() else {
            // Another advance is in flight; let the next tick observe it.
            return Ok(PollOutcome::Pending);
        };
        // Re-check under the guard: a write elsewhere (another tab path)
        // may have moved the step while the status call was in flight.
        if self.phase().await != Phase::Step(OnboardingStep::Processing) {
            return Ok(PollOutcome::Stopped);
        }
        self.write_step(&guard, OnboardingStep::FetchingPlaid, None).await?;
        Ok(PollOutcome::Advanced)
    }

    // ── FetchingPlaid: provider transaction sync ────────────────────

    /// Fetch the synced provider data and hold it for upload. At
    /// `FetchingPlaid` a successful sync advances to `Encryption`; at
    /// `Encryption` it only refreshes the held payload.
    pub async fn sync_provider_data(&self) -> Result<()> {
        let phase = self.phase().await;
        let at_fetching = phase == Phase::Step(OnboardingStep::FetchingPlaid);
        if !at_fetching && phase != Phase::Step(OnboardingStep::Encryption) {
            return Ok(());
        }
        let item_id = self.item_id().await.ok_or(SequencerError::MissingItemId)?;
        let data = self.api.plaid_transaction_sync(&item_id).await?;
        let serialized = serde_json::to_string_pretty(&data.payload)
            .map_err(crate::error::ApiError::Json)?;
        {
            let mut state = self.state.write().await;
            state.sync_data = Some(serialized);
        }
        if at_fetching {
            let guard = self.try_advance()?;
            self.write_step(&guard, OnboardingStep::Encryption, None).await?;
        }
        Ok(())
    }

    // ── Encryption: encrypt and upload ──────────────────────────────

    /// Sign, encrypt, and upload the synced data; on success record the
    /// returned CID and advance to `Minting`.
    pub async fn encrypt_and_upload(&self) -> Result<()> {
        let guard = self.try_advance()?;
        self.require_step(OnboardingStep::Encryption).await?;
        let data = {
            let state = self.state.read().await;
            state.sync_data.clone().ok_or(SequencerError::MissingSyncData)?
        };
        let artifact = self.store.upload(data).await?;
        self.write_step(&guard, OnboardingStep::Minting, Some(artifact.hash))
            .await?;
        Ok(())
    }

    // ── Minting ─────────────────────────────────────────────────────

    /// Mint the membership credential bound to the recorded CID. Advances
    /// to `SetAccess` only on a confirmed receipt.
    pub async fn mint(&self) -> Result<()> {
        let guard = self.try_advance()?;
        self.require_step(OnboardingStep::Minting).await?;
        let cid = self.cid().await.ok_or(SequencerError::MissingCid)?;

        match self.signer.balance().await {
            Ok(balance) if balance < self.config.min_gas_balance_wei => {
                warn!(
                    balance,
                    required = self.config.min_gas_balance_wei,
                    "Wallet balance may not cover mint gas"
                );
            }
            Ok(_) => {}
            Err(e) => warn!("Balance pre-flight check failed: {e}"),
        }

        let receipt = self.contract.safe_mint(&cid).await?;
        info!(tx = %receipt.tx_hash, %cid, "Membership credential minted");
        self.write_step(&guard, OnboardingStep::SetAccess, None).await?;
        Ok(())
    }

    // ── SetAccess ───────────────────────────────────────────────────

    /// Resolve the minted token id from the chain (first token held by
    /// this address) and cache it for the set-access action.
    pub async fn resolve_token_id(&self) -> Result<Option<TokenId>> {
        let token_id = self
            .contract
            .token_of_owner_by_index(&self.address, 0)
            .await?;
        let mut state = self.state.write().await;
        state.token_id = token_id;
        Ok(token_id)
    }

    /// Register the access condition for the uploaded artifact and finish
    /// onboarding. The CID and token id are snapshotted at invocation and
    /// not re-read afterwards.
    pub async fn set_access_condition(&self) -> Result<()> {
        let guard = self.try_advance()?;
        self.require_step(OnboardingStep::SetAccess).await?;
        let (cid, token_id) = {
            let state = self.state.read().await;
            let cid = state
                .record
                .as_ref()
                .and_then(|r| r.cid.clone())
                .ok_or(SequencerError::MissingCid)?;
            let token_id = state.token_id.ok_or(SequencerError::MissingTokenId)?;
            (cid, token_id)
        };
        self.store.apply_access_condition(&cid, token_id).await?;
        self.write_step(&guard, OnboardingStep::MintSuccess, None).await?;
        Ok(())
    }

    /// Whether onboarding has reached the terminal step.
    pub async fn is_complete(&self) -> bool {
        self.phase().await.is_terminal()
    }

    // ── Step Writer internals ───────────────────────────────────────

    fn try_advance(&self) -> Result<MutexGuard<'_, ()>> {
        self.advance_lock.try_lock().map_err(|_| {
            debug!(address = %self.address.short(), "Advance suppressed: one already in flight");
            Error::from(SequencerError::AdvanceInFlight {
                address: self.address.clone(),
            })
        })
    }

    async fn require_step(&self, step: OnboardingStep) -> Result<()> {
        let current = {
            let state = self.state.read().await;
            state.record.as_ref().map(|r| r.onboarding_step)
        };
        if current == Some(step) {
            Ok(())
        } else {
            Err(SequencerError::InvalidTransition {
                from: current,
                to: step.next().unwrap_or(step),
            }
            .into())
        }
    }

    /// Persist a step advance. The caller must hold the advance guard;
    /// the transition table is enforced here so the persisted step can
    /// only move forward, one step at a time.
    async fn write_step(
        &self,
        _guard: &MutexGuard<'_, ()>,
        next: OnboardingStep,
        cid: Option<String>,
    ) -> Result<()> {
        let current = {
            let state = self.state.read().await;
            state.record.as_ref().map(|r| r.onboarding_step)
        };
        let legal = match current {
            None => next == OnboardingStep::Processing,
            Some(step) => step.can_transition_to(next),
        };
        if !legal {
            return Err(SequencerError::InvalidTransition { from: current, to: next }.into());
        }

        let record = self
            .api
            .set_onboarding_step(
                &self.address,
                SetStepRequest {
                    onboarding_step: next,
                    cid,
                },
            )
            .await?;
        info!(from = ?current, to = %next, "Onboarding step advanced");
        let mut state = self.state.write().await;
        if let Some(item_id) = &record.plaid_item_id {
            state.session_item_id = Some(item_id.clone());
        }
        state.record = Some(record);
        Ok(())
    }
}
