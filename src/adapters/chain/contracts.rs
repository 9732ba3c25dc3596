//! Keeper Contract Interactions - Handler, Core Views, Vault
//!
//! Implements the `ChainClient` port over alloy-rs 0.9: ABI encoding via
//! `sol!`, legacy transactions signed locally with the keeper key and
//! broadcast raw, receipts polled until mined or timed out.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::utils::format_units;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::Provider;
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::sol_types::SolCall;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::config::Secret;
use crate::domain::target::RebalanceArgs;
use crate::ports::chain_client::{ChainClient, ReceiptSummary, TxParams};

use super::provider::HyperEvmProvider;

sol! {
    interface IHandler {
        function rebalancePortfolio(uint128 cloidBtc, uint128 cloidHype) external;
        function equitySpotUsd1e18() external view returns (uint256);
        function usdcCoreTokenId() external view returns (uint64);
        function spotBalance(address coreUser, uint64 tokenId) external view returns (uint64);
    }

    interface ICoreViews {
        function equitySpotUsd1e18(address handler) external view returns (uint256);
    }

    interface IVault {
        function pps1e18() external view returns (uint256);
    }
}

/// Delay between `eth_getTransactionReceipt` polls.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Parse a hex private key, with or without the `0x` prefix.
pub fn parse_signer(private_key: &Secret) -> Result<PrivateKeySigner> {
    let raw = private_key.expose().trim();
    let hex = raw.strip_prefix("0x").unwrap_or(raw);
    PrivateKeySigner::from_str(hex).map_err(|_| anyhow!("PRIVATE_KEY is not a valid secp256k1 key"))
}

fn rebalance_calldata(args: RebalanceArgs) -> Vec<u8> {
    IHandler::rebalancePortfolioCall {
        cloidBtc: args.cloid_btc,
        cloidHype: args.cloid_hype,
    }
    .abi_encode()
}

/// `ChainClient` backed by a shared provider and a local signing key.
pub struct HyperEvmClient {
    provider: Arc<HyperEvmProvider>,
    wallet: EthereumWallet,
    signer_address: Address,
}

impl HyperEvmClient {
    pub fn new(provider: Arc<HyperEvmProvider>, signer: PrivateKeySigner) -> Self {
        let signer_address = signer.address();
        info!(signer = %signer_address, "Keeper account loaded");
        Self {
            provider,
            wallet: EthereumWallet::from(signer),
            signer_address,
        }
    }

    /// `eth_call` against `to` and decode the result as `C`'s return type.
    async fn view<C: SolCall>(&self, to: Address, calldata: Vec<u8>) -> Result<C::Return> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(calldata);
        let output = self
            .provider
            .inner()
            .call(&tx)
            .await
            .with_context(|| format!("{} call to {to} failed", C::SIGNATURE))?;
        C::abi_decode_returns(&output, true)
            .with_context(|| format!("Failed to decode {} result", C::SIGNATURE))
    }

    /// Poll until the node returns a receipt. Lookup errors are retried.
    async fn poll_receipt(&self, tx_hash: TxHash) -> TransactionReceipt {
        let inner = self.provider.inner();
        loop {
            match inner.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return receipt,
                Ok(None) => {}
                Err(e) => debug!(error = %e, "Receipt lookup failed, retrying"),
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl ChainClient for HyperEvmClient {
    fn signer_address(&self) -> Address {
        self.signer_address
    }

    async fn transaction_count(&self) -> Result<u64> {
        let nonce = self
            .provider
            .inner()
            .get_transaction_count(self.signer_address)
            .await?;
        Ok(nonce)
    }

    #[instrument(skip(self, args), fields(handler = %handler))]
    async fn estimate_rebalance_gas(&self, handler: Address, args: RebalanceArgs) -> Result<u64> {
        let tx = TransactionRequest::default()
            .with_from(self.signer_address)
            .with_to(handler)
            .with_input(rebalance_calldata(args));
        let estimate = self.provider.inner().estimate_gas(&tx).await?;
        Ok(estimate)
    }

    /// Legacy gas price from `eth_gasPrice`, fetched fresh per submission.
    async fn gas_price(&self) -> Result<u128> {
        let gas_price = self
            .provider
            .inner()
            .get_gas_price()
            .await
            .context("Failed to query gas price")?;
        debug!(
            gas_gwei = ?format_units(U256::from(gas_price), "gwei").ok(),
            "Gas price fetched"
        );
        Ok(gas_price)
    }

    #[instrument(skip(self, args), fields(handler = %handler, nonce = params.nonce))]
    async fn send_rebalance(
        &self,
        handler: Address,
        args: RebalanceArgs,
        params: TxParams,
    ) -> Result<TxHash> {
        let tx = TransactionRequest::default()
            .with_from(self.signer_address)
            .with_to(handler)
            .with_input(rebalance_calldata(args))
            .with_nonce(params.nonce)
            .with_gas_limit(params.gas_limit)
            .with_gas_price(params.gas_price)
            .with_chain_id(self.provider.chain_id());

        let envelope = tx
            .build(&self.wallet)
            .await
            .context("Failed to sign transaction")?;

        let pending = self
            .provider
            .inner()
            .send_raw_transaction(&envelope.encoded_2718())
            .await?;

        Ok(*pending.tx_hash())
    }

    #[instrument(skip(self), fields(tx_hash = %tx_hash))]
    async fn wait_for_receipt(&self, tx_hash: TxHash, timeout: Duration) -> Result<ReceiptSummary> {
        let receipt = tokio::time::timeout(timeout, self.poll_receipt(tx_hash))
            .await
            .map_err(|_| anyhow!("Timed out after {}s waiting for receipt", timeout.as_secs()))?;

        Ok(ReceiptSummary {
            tx_hash: receipt.transaction_hash,
            success: receipt.status(),
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
        })
    }

    async fn views_equity(&self, views: Address, handler: Address) -> Result<U256> {
        let calldata = ICoreViews::equitySpotUsd1e18Call { handler }.abi_encode();
        let ret = self
            .view::<ICoreViews::equitySpotUsd1e18Call>(views, calldata)
            .await?;
        Ok(ret._0)
    }

    async fn handler_equity(&self, handler: Address) -> Result<U256> {
        let calldata = IHandler::equitySpotUsd1e18Call {}.abi_encode();
        let ret = self
            .view::<IHandler::equitySpotUsd1e18Call>(handler, calldata)
            .await?;
        Ok(ret._0)
    }

    async fn usdc_core_token_id(&self, handler: Address) -> Result<u64> {
        let calldata = IHandler::usdcCoreTokenIdCall {}.abi_encode();
        let ret = self
            .view::<IHandler::usdcCoreTokenIdCall>(handler, calldata)
            .await?;
        Ok(ret._0)
    }

    async fn spot_balance(&self, handler: Address, core_user: Address, token_id: u64) -> Result<u64> {
        let calldata = IHandler::spotBalanceCall {
            coreUser: core_user,
            tokenId: token_id,
        }
        .abi_encode();
        let ret = self
            .view::<IHandler::spotBalanceCall>(handler, calldata)
            .await?;
        Ok(ret._0)
    }

    async fn vault_pps(&self, vault: Address) -> Result<U256> {
        let calldata = IVault::pps1e18Call {}.abi_encode();
        let ret = self.view::<IVault::pps1e18Call>(vault, calldata).await?;
        Ok(ret._0)
    }
}
