use alloy_primitives::ChainId;
use serde::{Deserialize, Serialize};

/// Error object surfaced by a transport, in the EIP-1193 / relay RPC shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), code: None }
    }

    pub fn with_code(message: impl Into<String>, code: i64) -> Self {
        Self { message: message.into(), code: Some(code) }
    }

    /// Whether this error reports that the user declined the action in their
    /// wallet. Matched on the message, case-insensitively, since the two
    /// transports word it differently.
    pub fn is_user_rejection(&self) -> bool {
        self.message.to_lowercase().contains("user rejected")
    }

    /// Whether this error reports a relay session that is already gone.
    /// Disconnecting such a session is treated as a success.
    pub fn is_stale_session(&self) -> bool {
        self.message.to_lowercase().contains("no matching key")
    }
}

/// Errors produced by connector operations.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// The user declined the request in their wallet. The original transport
    /// message is preserved for display.
    #[error("user rejected request: {message}")]
    UserRejected { message: String },

    /// The requested chain id is not part of the connector's configured chain
    /// list. Host misconfiguration, never retried.
    #[error("chain {chain_id} is not configured on this connector")]
    ChainNotFound { chain_id: ChainId },

    /// A chain switch failed for a reason other than user rejection.
    #[error("failed to switch to chain {chain_id}")]
    SwitchChainFailed {
        chain_id: ChainId,
        #[source]
        source: TransportError,
    },

    /// An operation that needs a provider was invoked while none resolves,
    /// e.g. no extension is injected and the relay side was never configured
    /// with any chain.
    #[error("no wallet provider is available")]
    ProviderMissing,

    /// The active transport cannot perform the requested operation.
    #[error("the active transport does not support {0}")]
    UnsupportedOperation(&'static str),

    /// Connector options were rejected at construction.
    #[error("invalid connector options: {0}")]
    InvalidOptions(String),

    /// Any transport failure that does not match a recognized pattern is
    /// propagated unchanged so the host can inspect it.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ConnectorError {
    /// Re-raises transport-level user rejections as [`Self::UserRejected`],
    /// leaving every other error untouched.
    pub(crate) fn normalize_rejection(self) -> Self {
        match self {
            Self::Transport(err) if err.is_user_rejection() => {
                Self::UserRejected { message: err.message }
            }
            other => other,
        }
    }
}
