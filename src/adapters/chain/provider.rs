//! HyperEVM RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Connects to the configured JSON-RPC endpoint, reads the chain id once
//! at startup and optionally checks it against `CHAIN_ID`. The provider
//! is stored type-erased so every chain adapter can share it.

use std::sync::Arc;

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{bail, Context, Result};
use tracing::{info, instrument};

/// Shared RPC provider backed by alloy-rs 0.9.
pub struct HyperEvmProvider {
    /// The alloy provider (type-erased).
    provider: Arc<dyn Provider + Send + Sync>,
    /// Chain id reported by the node at connect time.
    chain_id: u64,
}

impl HyperEvmProvider {
    /// Connect to `rpc_url` and read the chain id.
    ///
    /// # Errors
    /// Fails if the URL is unusable, the node does not answer, or the
    /// node's chain id differs from `expected_chain_id`.
    #[instrument(skip_all)]
    pub async fn connect(rpc_url: &str, expected_chain_id: Option<u64>) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .on_builtin(rpc_url)
            .await
            .context("Failed to connect to RPC endpoint")?;

        let provider: Arc<dyn Provider + Send + Sync> = Arc::new(provider);

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        if let Some(expected) = expected_chain_id {
            if chain_id != expected {
                bail!("Expected chain_id={expected}, RPC reports {chain_id}");
            }
        }

        info!(chain_id, "Connected to RPC");

        Ok(Self { provider, chain_id })
    }

    /// Shared handle to the alloy provider.
    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::clone(&self.provider)
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}
