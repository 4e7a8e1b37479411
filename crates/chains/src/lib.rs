//! # ronin-chains
//!
//! Static descriptions of the networks a connector instance may be configured
//! with: chain id, RPC endpoint, native currency and block explorer.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use alloy_primitives::ChainId;
use serde::{Deserialize, Serialize};
use url::Url;

/// Ronin mainnet chain id.
pub const RONIN_MAINNET: ChainId = 2020;

/// Saigon testnet chain id.
pub const SAIGON_TESTNET: ChainId = 2021;

/// The native currency of a network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    /// The RON coin used by Ronin networks.
    pub fn ron() -> Self {
        Self { name: "Ronin".to_string(), symbol: "RON".to_string(), decimals: 18 }
    }
}

/// A network the host application supports.
///
/// Supplied to the connector at construction and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedChain {
    pub id: ChainId,
    pub name: String,
    pub rpc_url: Url,
    pub native_currency: NativeCurrency,
    pub block_explorer_url: Option<Url>,
}

impl SupportedChain {
    /// The CAIP-2 identifier used by relay session namespaces, e.g. `eip155:2020`.
    pub fn caip2(&self) -> String {
        caip2(self.id)
    }

    /// The hex-encoded chain id used by the EIP-1193 RPC surface, e.g. `0x7e4`.
    pub fn hex_id(&self) -> String {
        hex_chain_id(self.id)
    }
}

/// Formats a chain id in CAIP-2 form.
pub fn caip2(id: ChainId) -> String {
    format!("eip155:{id}")
}

/// Formats a chain id in its `0x`-prefixed wire form.
pub fn hex_chain_id(id: ChainId) -> String {
    format!("0x{id:x}")
}

/// The Ronin mainnet.
pub fn ronin_mainnet() -> SupportedChain {
    SupportedChain {
        id: RONIN_MAINNET,
        name: "Ronin".to_string(),
        rpc_url: "https://api.roninchain.com/rpc".parse().unwrap(),
        native_currency: NativeCurrency::ron(),
        block_explorer_url: Some("https://app.roninchain.com".parse().unwrap()),
    }
}

/// The Saigon testnet.
pub fn saigon_testnet() -> SupportedChain {
    SupportedChain {
        id: SAIGON_TESTNET,
        name: "Saigon Testnet".to_string(),
        rpc_url: "https://saigon-testnet.roninchain.com/rpc".parse().unwrap(),
        native_currency: NativeCurrency::ron(),
        block_explorer_url: Some("https://saigon-app.roninchain.com".parse().unwrap()),
    }
}

/// Parameter object for the `wallet_addEthereumChain` RPC method (EIP-3085).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_explorer_urls: Option<Vec<String>>,
}

impl From<&SupportedChain> for AddChainParams {
    fn from(chain: &SupportedChain) -> Self {
        Self {
            chain_id: chain.hex_id(),
            chain_name: chain.name.clone(),
            native_currency: chain.native_currency.clone(),
            rpc_urls: vec![chain.rpc_url.to_string()],
            block_explorer_urls: chain
                .block_explorer_url
                .as_ref()
                .map(|url| vec![url.to_string()]),
        }
    }
}
