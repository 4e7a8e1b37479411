use alloy_primitives::{Address, ChainId};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConnectorError;

/// Which transport a provider acquisition resolved to.
///
/// Determined at runtime on every acquisition and never persisted: the
/// extension may be injected after the application starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    Injected,
    Relay,
}

/// Descriptor of the host application, forwarded to the relay network so the
/// remote wallet can display who is asking to pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub icons: Vec<String>,
}

/// Connector construction options. Immutable after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectorOptions {
    /// Relay project identifier. Required, non-empty.
    pub project_id: String,
    pub metadata: Option<AppMetadata>,
    /// Override for the default relay endpoint.
    pub relay_url: Option<Url>,
    /// Simulate disconnect for the injected transport, which has no native
    /// way to end a session. Defaults to `true`.
    pub shim_disconnect: bool,
}

impl ConnectorOptions {
    pub fn new(project_id: impl Into<String>) -> Result<Self, ConnectorError> {
        let project_id = project_id.into();
        if project_id.is_empty() {
            return Err(ConnectorError::InvalidOptions("project id must not be empty".into()));
        }
        Ok(Self { project_id, metadata: None, relay_url: None, shim_disconnect: true })
    }

    pub fn with_metadata(mut self, metadata: AppMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_relay_url(mut self, relay_url: Url) -> Self {
        self.relay_url = Some(relay_url);
        self
    }

    pub fn with_shim_disconnect(mut self, shim_disconnect: bool) -> Self {
        self.shim_disconnect = shim_disconnect;
        self
    }
}

/// A chain id paired with whether the host has it configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRef {
    pub id: ChainId,
    /// `true` iff `id` is absent from the connector's configured chain list.
    pub unsupported: bool,
}

impl ChainRef {
    pub fn new(id: ChainId, unsupported: bool) -> Self {
        Self { id, unsupported }
    }
}

/// The result of a successful connect flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionResult {
    /// First authorized account, checksummed per EIP-55 when displayed.
    pub account: Address,
    pub chain: ChainRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_require_a_project_id() {
        assert!(matches!(
            ConnectorOptions::new(""),
            Err(ConnectorError::InvalidOptions(_))
        ));

        let opts = ConnectorOptions::new("my-project").unwrap();
        assert!(opts.shim_disconnect);
        assert!(opts.metadata.is_none());
        assert!(opts.relay_url.is_none());
    }
}
