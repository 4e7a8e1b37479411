use alloy_primitives::{Address, ChainId};
use ronin_chains::SupportedChain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use crate::types::{AppMetadata, ConnectorOptions};

/// The chain/method/event authorization record of a relay session, keyed by
/// CAIP namespace (`eip155` for the chains handled here).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNamespace {
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
    /// CAIP-10 account ids, `eip155:<chain>:<address>`.
    #[serde(default)]
    pub accounts: Vec<String>,
}

impl SessionNamespace {
    /// Whether this namespace authorizes the given chain, either through its
    /// chain list or through an account scoped to it.
    pub fn authorizes(&self, chain_id: ChainId) -> bool {
        let caip2 = ronin_chains::caip2(chain_id);
        self.chains.iter().any(|chain| chain == &caip2)
            || self.accounts.iter().any(|account| account.starts_with(&format!("{caip2}:")))
    }

    pub fn supports_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

/// An established pairing session as reported by the relay provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySession {
    pub topic: String,
    pub chain_id: ChainId,
    /// Accounts cached on the session; the first one is the active account.
    pub accounts: Vec<Address>,
    pub namespaces: BTreeMap<String, SessionNamespace>,
}

impl RelaySession {
    /// Whether any namespace of this session authorizes the chain.
    pub fn authorizes(&self, chain_id: ChainId) -> bool {
        self.namespaces.values().any(|ns| ns.authorizes(chain_id))
    }

    /// Whether any namespace of this session authorizes the RPC method.
    pub fn supports_method(&self, method: &str) -> bool {
        self.namespaces.values().any(|ns| ns.supports_method(method))
    }
}

/// Configuration handed to [`WalletEnvironment::build_relay`] when the relay
/// provider is first needed.
///
/// [`WalletEnvironment::build_relay`]: crate::provider::WalletEnvironment::build_relay
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    pub project_id: String,
    pub metadata: Option<AppMetadata>,
    pub relay_url: Option<Url>,
    /// The primary chain proposed for the session.
    pub chain: ChainId,
    /// Remaining configured chains, proposed as optional.
    pub optional_chains: Vec<ChainId>,
    /// Per-chain RPC endpoints.
    pub rpc_map: BTreeMap<ChainId, Url>,
    /// Always `false`: pairing-URI display is delegated to the host UI via
    /// the `display_uri` message instead of the provider's own modal.
    pub show_qr_modal: bool,
}

impl RelayConfig {
    /// Builds the relay configuration from the connector's options and chain
    /// list. Returns `None` when no chain is configured; the caller treats
    /// that as a fail-fast no-op rather than an error.
    pub fn new(options: &ConnectorOptions, chains: &[SupportedChain]) -> Option<Self> {
        let (primary, rest) = chains.split_first()?;
        Some(Self {
            project_id: options.project_id.clone(),
            metadata: options.metadata.clone(),
            relay_url: options.relay_url.clone(),
            chain: primary.id,
            optional_chains: rest.iter().map(|chain| chain.id).collect(),
            rpc_map: chains.iter().map(|chain| (chain.id, chain.rpc_url.clone())).collect(),
            show_qr_modal: false,
        })
    }
}
