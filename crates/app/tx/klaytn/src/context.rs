//! Chain state needed to complete and sign transactions.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use async_trait::async_trait;
use klay_keys::{AccountKey, Keyring};

use crate::envelope::Transaction;
use crate::error::{TxError, TxResult};
use crate::signing::SignOptions;
use crate::traits::TypedTransaction;

/// Source of the chain values a transaction is filled from.
///
/// Implementors usually wrap an RPC client; [`StaticChainContext`] serves
/// fixed values for offline signing.
#[async_trait]
pub trait ChainContext: Send + Sync {
    async fn chain_id(&self) -> TxResult<u64>;

    /// Next nonce of `address`.
    async fn nonce(&self, address: Address) -> TxResult<u64>;

    async fn gas_price(&self) -> TxResult<u128>;

    async fn max_priority_fee_per_gas(&self) -> TxResult<u128>;

    async fn base_fee_per_gas(&self) -> TxResult<u128>;

    /// The account key registered for `address`, if the account exists.
    async fn account_key(&self, address: Address) -> TxResult<Option<AccountKey>>;
}

/// Return a copy of `tx` with chain id, nonce and fee fields filled in.
///
/// Only fields that are still unset are fetched. Dynamic-fee transactions
/// get `maxFeePerGas = 2 * baseFee + maxPriorityFeePerGas`.
pub async fn fill_transaction<C>(tx: &Transaction, ctx: &C) -> TxResult<Transaction>
where
    C: ChainContext + ?Sized,
{
    let mut filled = tx.clone();

    if filled.chain_id().is_none() {
        filled.set_chain_id(ctx.chain_id().await?);
    }
    if filled.nonce().is_none() {
        let from = filled
            .sender()
            .ok_or(TxError::MissingRequiredField("from"))?;
        filled.set_nonce(ctx.nonce(from).await?);
    }

    match &mut filled {
        Transaction::EthereumDynamicFee(inner) => {
            let priority = match inner.max_priority_fee_per_gas {
                Some(priority) => priority,
                None => ctx.max_priority_fee_per_gas().await?,
            };
            inner.max_priority_fee_per_gas = Some(priority);
            if inner.max_fee_per_gas.is_none() {
                let base_fee = ctx.base_fee_per_gas().await?;
                inner.max_fee_per_gas = Some(base_fee.saturating_mul(2).saturating_add(priority));
            }
        }
        other => {
            if other.gas_price().is_none() {
                other.set_gas_price(ctx.gas_price().await?);
            }
        }
    }

    tracing::debug!(
        tx_type = %filled.tx_type(),
        chain_id = ?filled.chain_id(),
        nonce = ?filled.nonce(),
        "filled transaction"
    );
    Ok(filled)
}

/// Fill `tx`, then sign it as the sender against the sender's on-chain key.
pub async fn sign_with_context<C>(
    tx: &Transaction,
    keyring: &Keyring,
    ctx: &C,
    index: Option<usize>,
) -> TxResult<Transaction>
where
    C: ChainContext + ?Sized,
{
    let mut filled = fill_transaction(tx, ctx).await?;
    let account_key = ctx.account_key(keyring.address()).await?;
    let options = SignOptions {
        index,
        account_key: account_key.as_ref(),
        ..SignOptions::default()
    };
    filled.sign(keyring, &options)?;
    Ok(filled)
}

/// Fill `tx`, then co-sign it as fee payer against the payer's on-chain key.
pub async fn sign_as_fee_payer_with_context<C>(
    tx: &Transaction,
    keyring: &Keyring,
    ctx: &C,
    index: Option<usize>,
) -> TxResult<Transaction>
where
    C: ChainContext + ?Sized,
{
    let mut filled = fill_transaction(tx, ctx).await?;
    let account_key = ctx.account_key(keyring.address()).await?;
    let options = SignOptions {
        index,
        account_key: account_key.as_ref(),
        ..SignOptions::default()
    };
    filled.sign_as_fee_payer(keyring, &options)?;
    Ok(filled)
}

/// On-chain state of one account, as known offline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountState {
    pub nonce: u64,
    pub account_key: Option<AccountKey>,
}

/// A [`ChainContext`] answering from fixed values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticChainContext {
    pub chain_id: u64,
    pub gas_price: u128,
    pub max_priority_fee_per_gas: u128,
    pub base_fee_per_gas: u128,
    pub accounts: BTreeMap<Address, AccountState>,
}

impl StaticChainContext {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            gas_price: 0,
            max_priority_fee_per_gas: 0,
            base_fee_per_gas: 0,
            accounts: BTreeMap::new(),
        }
    }

    pub fn with_fees(
        mut self,
        gas_price: u128,
        max_priority_fee_per_gas: u128,
        base_fee_per_gas: u128,
    ) -> Self {
        self.gas_price = gas_price;
        self.max_priority_fee_per_gas = max_priority_fee_per_gas;
        self.base_fee_per_gas = base_fee_per_gas;
        self
    }

    pub fn with_account(
        mut self,
        address: Address,
        nonce: u64,
        account_key: Option<AccountKey>,
    ) -> Self {
        self.accounts
            .insert(address, AccountState { nonce, account_key });
        self
    }
}

#[async_trait]
impl ChainContext for StaticChainContext {
    async fn chain_id(&self) -> TxResult<u64> {
        Ok(self.chain_id)
    }

    async fn nonce(&self, address: Address) -> TxResult<u64> {
        self.accounts
            .get(&address)
            .map(|account| account.nonce)
            .ok_or_else(|| TxError::Context(format!("unknown account {address}")))
    }

    async fn gas_price(&self) -> TxResult<u128> {
        Ok(self.gas_price)
    }

    async fn max_priority_fee_per_gas(&self) -> TxResult<u128> {
        Ok(self.max_priority_fee_per_gas)
    }

    async fn base_fee_per_gas(&self) -> TxResult<u128> {
        Ok(self.base_fee_per_gas)
    }

    async fn account_key(&self, address: Address) -> TxResult<Option<AccountKey>> {
        Ok(self
            .accounts
            .get(&address)
            .and_then(|account| account.account_key.clone()))
    }
}
