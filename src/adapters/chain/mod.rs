//! Chain Adapters - HyperEVM Interaction Layer
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - RPC provider management and chain id check
//! - Handler / core views / vault calls, gas price and rebalance submission

pub mod contracts;
pub mod provider;

pub use contracts::{parse_signer, HyperEvmClient};
pub use provider::HyperEvmProvider;
