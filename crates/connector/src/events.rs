use alloy_primitives::Address;
use tokio::sync::broadcast;

use crate::types::ChainRef;

/// Events emitted natively by a transport provider, before normalization.
///
/// The injected transport produces the first three; the relay transport
/// produces all six.
#[derive(Clone, Debug)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    /// Raw wire form of the new chain id (hex or decimal string).
    ChainChanged(String),
    Disconnect,
    /// The relay session was terminated remotely.
    SessionDelete,
    /// A pairing URI is ready to be shown to the user.
    DisplayUri(String),
    Connect {
        chain_id: String,
    },
}

/// Payload of the `message` lifecycle event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectorMessage {
    /// A connect flow has started and the wallet is being asked for access.
    Connecting,
    /// A pairing URI for the host UI. When `mobile` is set the connector has
    /// already redirected into the companion app and the UI must not render
    /// a QR code for it.
    DisplayUri { uri: String, mobile: bool },
}

/// Unified lifecycle events the host subscribes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectorEvent {
    Connect { account: Address, chain: ChainRef },
    Change { account: Option<Address>, chain: Option<ChainRef> },
    Disconnect,
    Message(ConnectorMessage),
}

/// Broadcast bus for [`ConnectorEvent`]s.
///
/// The host subscribes once at connector construction; emitting with no live
/// subscriber is not an error.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<ConnectorEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    const CAPACITY: usize = 64;

    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(Self::CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectorEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ConnectorEvent) {
        trace!(?event, "emitting lifecycle event");
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_subscribers_is_a_noop() {
        let bus = EventBus::new();
        bus.emit(ConnectorEvent::Disconnect);
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.emit(ConnectorEvent::Message(ConnectorMessage::Connecting));
        bus.emit(ConnectorEvent::Disconnect);

        assert_eq!(
            rx.recv().await.unwrap(),
            ConnectorEvent::Message(ConnectorMessage::Connecting)
        );
        assert_eq!(rx.recv().await.unwrap(), ConnectorEvent::Disconnect);
    }
}
