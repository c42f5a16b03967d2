//! Post-onboarding membership flows: credential burn and the admin
//! browse/decrypt surface.

use std::sync::Arc;

use tracing::info;

use crate::api::CoopApi;
use crate::chain::{Address, MembershipContract, TokenId, TokenInfo, TxReceipt};
use crate::error::{ChainError, Result};

/// Burn a held membership credential and remove the backing record.
///
/// The on-chain burn is confirmed first; only then is the backend record
/// deleted, so a rejected or failed transaction leaves the record intact.
pub async fn burn_membership(
    api: &dyn CoopApi,
    contract: &dyn MembershipContract,
    owner: &Address,
    token_id: TokenId,
) -> Result<TxReceipt> {
    let receipt = contract.burn(token_id).await?;
    info!(tx = %receipt.tx_hash, %token_id, "Membership credential burned");
    api.burn(owner).await?;
    Ok(receipt)
}

/// Admin surface: browse minted credentials and pay to decrypt members'
/// data. Every operation requires the caller to hold the contract's admin
/// role.
pub struct AdminClient {
    contract: Arc<dyn MembershipContract>,
    admin: Address,
}

impl AdminClient {
    /// Construct after verifying `admin` holds the admin role on-chain.
    pub async fn connect(
        contract: Arc<dyn MembershipContract>,
        admin: Address,
    ) -> Result<Self> {
        if !contract.is_admin(&admin).await? {
            return Err(ChainError::Read(format!(
                "{} does not hold the admin role",
                admin.short()
            ))
            .into());
        }
        Ok(Self { contract, admin })
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    /// Page through all minted credentials.
    pub async fn list_tokens(&self, page: u64, page_size: u64) -> Result<Vec<TokenInfo>> {
        Ok(self.contract.get_token_infos(page, page_size).await?)
    }

    /// Fetch a single credential's info.
    pub async fn token_info(&self, token_id: TokenId) -> Result<TokenInfo> {
        Ok(self.contract.get_token_info(token_id).await?)
    }

    /// Pay to decrypt the artifacts behind the given credentials.
    pub async fn decrypt_tokens(
        &self,
        token_ids: &[TokenId],
        payment_wei: u128,
    ) -> Result<TxReceipt> {
        let receipt = self.contract.decrypt(token_ids, payment_wei).await?;
        info!(
            tx = %receipt.tx_hash,
            tokens = token_ids.len(),
            payment_wei,
            "Decryption payment confirmed"
        );
        Ok(receipt)
    }
}
