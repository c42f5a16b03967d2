//! Membership-contract and wallet seams.
//!
//! The contract's own logic lives on-chain and is consumed through these
//! traits; callers inject concrete handles (an RPC-backed contract binding
//! and a wallet signer) rather than relying on ambient globals.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChainError;
use crate::util::truncate_with_ellipsis;

/// A blockchain account identifier, lowercase-normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for logs and display, e.g. `0x1234...abcd`.
    pub fn short(&self) -> String {
        truncate_with_ellipsis(&self.0, 6)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a minted membership token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// On-chain record of a minted membership credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token_id: TokenId,
    pub owner: Address,
    /// Content identifier of the member's encrypted artifact.
    pub cid: String,
    pub minted_at: Option<DateTime<Utc>>,
}

/// Receipt of a confirmed transaction.
///
/// Contract write methods return this only once the transaction has
/// reached confirmed status; submission alone never produces a receipt.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: String,
}

/// Wallet capability: identity, message signing, and balance reads.
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    /// Sign an arbitrary message with the wallet key.
    ///
    /// Fails with `ChainError::UserRejected` if the user declines.
    async fn sign_message(&self, message: &str) -> Result<String, ChainError>;

    /// Current wallet balance in wei.
    async fn balance(&self) -> Result<u128, ChainError>;
}

/// The deployed membership (SBT) contract surface.
#[async_trait]
pub trait MembershipContract: Send + Sync {
    async fn balance_of(&self, owner: &Address) -> Result<u64, ChainError>;

    /// Token id held by `owner` at `index`, or `None` if out of range.
    async fn token_of_owner_by_index(
        &self,
        owner: &Address,
        index: u64,
    ) -> Result<Option<TokenId>, ChainError>;

    async fn get_token_info(&self, token_id: TokenId) -> Result<TokenInfo, ChainError>;

    /// Page through all minted tokens (admin browse).
    async fn get_token_infos(&self, page: u64, page_size: u64)
        -> Result<Vec<TokenInfo>, ChainError>;

    async fn is_admin(&self, address: &Address) -> Result<bool, ChainError>;

    /// Mint a membership token bound to `cid`; resolves on confirmation.
    async fn safe_mint(&self, cid: &str) -> Result<TxReceipt, ChainError>;

    /// Burn a held token; resolves on confirmation.
    async fn burn(&self, token_id: TokenId) -> Result<TxReceipt, ChainError>;

    /// Pay to decrypt the artifacts behind `token_ids` (admin flow).
    async fn decrypt(
        &self,
        token_ids: &[TokenId],
        payment_wei: u128,
    ) -> Result<TxReceipt, ChainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_lowercase_normalized() {
        let addr = Address::new("0xABCDef0123");
        assert_eq!(addr.as_str(), "0xabcdef0123");
    }

    #[test]
    fn address_short_form() {
        let addr = Address::new("0x1234567890abcdef1234567890abcdef12345678");
        assert_eq!(addr.short(), "0x1234...345678");
    }
}
