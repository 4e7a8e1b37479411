//! # ronin-connector
//!
//! Dual-transport Ronin wallet connector: authenticates a user's account and
//! submits signed requests through either the injected extension provider or
//! a relay pairing session, behind one contract.
//!
//! The host constructs a [`RoninConnector`] once with its project id and
//! supported chains, drives [`connect`](RoninConnector::connect) /
//! [`disconnect`](RoninConnector::disconnect) /
//! [`switch_chain`](RoninConnector::switch_chain), and listens to
//! [`ConnectorEvent`]s to update its presentation.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

pub mod client;
pub mod connector;
pub mod error;
pub mod events;
pub mod injected;
pub mod provider;
pub mod relay;
pub mod storage;
pub mod types;

pub use client::WalletClient;
pub use connector::{CONNECTOR_ID, CONNECTOR_NAME, RoninConnector};
pub use error::{ConnectorError, TransportError};
pub use events::{ConnectorEvent, ConnectorMessage, ProviderEvent};
pub use provider::{
    Eip1193Provider, InjectedProvider, RelayProvider, Transport, WalletEnvironment,
};
pub use relay::{RelayConfig, RelaySession, SessionNamespace};
pub use storage::{ConnectorStorage, MemoryStorage};
pub use types::{
    AppMetadata, ChainRef, ConnectionResult, ConnectorOptions, TransportKind,
};
