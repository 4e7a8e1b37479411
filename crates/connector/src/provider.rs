use alloy_primitives::{Address, ChainId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{fmt, sync::Arc};
use tokio::sync::broadcast;

use crate::{
    error::TransportError,
    events::ProviderEvent,
    relay::{RelayConfig, RelaySession},
    types::TransportKind,
};

/// The request/subscribe surface shared by both transports (EIP-1193).
#[async_trait]
pub trait Eip1193Provider: fmt::Debug + Send + Sync {
    /// Issues an RPC request through the transport.
    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError>;

    /// Subscribes to the transport's native event feed.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// A provider object injected into the runtime by a wallet extension.
///
/// Already connected to the wallet; its presence is re-probed through
/// [`WalletEnvironment::injected`] on every acquisition.
pub trait InjectedProvider: Eip1193Provider {}

/// A provider managing a multi-chain pairing session over a relay network.
///
/// The wire protocol behind it is opaque to the connector.
#[async_trait]
pub trait RelayProvider: Eip1193Provider {
    /// Runs the pairing handshake, producing a session.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Terminates the current session.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Enables the provider for the chains the existing session authorizes,
    /// returning the session accounts.
    async fn enable(&self) -> Result<Vec<Address>, TransportError>;

    /// The current session, if one is established.
    fn session(&self) -> Option<RelaySession>;
}

/// The transport resolved for one operation.
///
/// Exactly one lives per acquisition; operations resolve it through a single
/// dispatch point and match on the case rather than branching per call site.
#[derive(Clone, Debug)]
pub enum Transport {
    Injected(Arc<dyn InjectedProvider>),
    Relay(Arc<dyn RelayProvider>),
}

impl Transport {
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Injected(_) => TransportKind::Injected,
            Self::Relay(_) => TransportKind::Relay,
        }
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        match self {
            Self::Injected(provider) => provider.request(method, params).await,
            Self::Relay(provider) => provider.request(method, params).await,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        match self {
            Self::Injected(provider) => provider.subscribe(),
            Self::Relay(provider) => provider.subscribe(),
        }
    }
}

/// Runtime environment the connector lives in: probes for the injected
/// extension object, constructs relay providers, and exposes the mobile
/// redirect surface.
#[async_trait]
pub trait WalletEnvironment: fmt::Debug + Send + Sync {
    /// The injected provider object, if an extension is present right now.
    fn injected(&self) -> Option<Arc<dyn InjectedProvider>>;

    /// Builds a relay provider for the given configuration.
    async fn build_relay(
        &self,
        config: RelayConfig,
    ) -> Result<Arc<dyn RelayProvider>, TransportError>;

    /// Whether the runtime is a mobile browser.
    fn is_mobile(&self) -> bool;

    /// Navigates the current page, used for deep links into the companion app.
    fn navigate(&self, url: &url::Url);
}

/// Parses a chain id from its wire form: `0x`-prefixed hex or decimal.
pub fn parse_chain_id(raw: &str) -> Result<ChainId, TransportError> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => ChainId::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|_| TransportError::new(format!("invalid chain id: {raw:?}")))
}

/// Parses a chain id from an RPC result, which may be a hex string or a
/// JSON number depending on the wallet.
pub fn chain_id_from_value(value: &Value) -> Result<ChainId, TransportError> {
    match value {
        Value::String(raw) => parse_chain_id(raw),
        Value::Number(num) => num
            .as_u64()
            .ok_or_else(|| TransportError::new(format!("invalid chain id: {num}"))),
        other => Err(TransportError::new(format!("invalid chain id: {other}"))),
    }
}

/// Decodes an RPC result into the expected shape.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value)
        .map_err(|err| TransportError::new(format!("unexpected RPC response: {err}")))
}

/// Returns the first account of an RPC account list, parsed and checksummed.
pub fn first_account(accounts: &[String]) -> Result<Address, TransportError> {
    let raw = accounts.first().ok_or_else(|| TransportError::new("no accounts available"))?;
    raw.parse().map_err(|_| TransportError::new(format!("invalid account address: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chain_id_hex_and_decimal_forms_agree() {
        assert_eq!(parse_chain_id("0x7e4").unwrap(), 2020);
        assert_eq!(parse_chain_id("2020").unwrap(), 2020);
        assert_eq!(
            chain_id_from_value(&json!("0x7e4")).unwrap(),
            chain_id_from_value(&json!(2020)).unwrap()
        );
        assert!(parse_chain_id("0xzz").is_err());
        assert!(chain_id_from_value(&json!(null)).is_err());
    }

    #[test]
    fn first_account_checksums_the_address() {
        let accounts = vec!["0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string()];
        let account = first_account(&accounts).unwrap();
        assert_eq!(
            account.to_checksum(None),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        assert!(first_account(&[]).is_err());
        assert!(first_account(&["nope".to_string()]).is_err());
    }
}
