use async_trait::async_trait;
use serde_json::Value;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::broadcast;

use crate::{
    error::TransportError,
    events::ProviderEvent,
    provider::{Eip1193Provider, InjectedProvider},
};

/// The raw provider object an extension injects into the runtime.
///
/// Older extensions do not expose the standard subscription surface, only a
/// callback-registration hook; [`InjectedBridge`] adapts either shape.
#[async_trait]
pub trait RawInjectedHost: fmt::Debug + Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError>;

    /// Registers a callback for the extension's native events. Registering
    /// twice would duplicate deliveries, so callers install exactly once.
    fn install_listener(&self, listener: Box<dyn Fn(ProviderEvent) + Send + Sync>);
}

/// Adapts a [`RawInjectedHost`] to the standard [`Eip1193Provider`] surface.
///
/// The callback-to-channel bridge is installed on first subscription and is
/// idempotent: later subscribers share the one installed hook.
pub struct InjectedBridge {
    host: Arc<dyn RawInjectedHost>,
    events: broadcast::Sender<ProviderEvent>,
    bridged: AtomicBool,
}

impl fmt::Debug for InjectedBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectedBridge")
            .field("host", &self.host)
            .field("bridged", &self.bridged.load(Ordering::Relaxed))
            .finish()
    }
}

impl InjectedBridge {
    const EVENT_CAPACITY: usize = 64;

    pub fn new(host: Arc<dyn RawInjectedHost>) -> Self {
        let (events, _) = broadcast::channel(Self::EVENT_CAPACITY);
        Self { host, events, bridged: AtomicBool::new(false) }
    }

    fn ensure_bridge(&self) {
        if self.bridged.swap(true, Ordering::SeqCst) {
            return;
        }
        trace!("installing injected event bridge");
        let tx = self.events.clone();
        self.host.install_listener(Box::new(move |event| {
            let _ = tx.send(event);
        }));
    }
}

#[async_trait]
impl Eip1193Provider for InjectedBridge {
    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        self.host.request(method, params).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.ensure_bridge();
        self.events.subscribe()
    }
}

impl InjectedProvider for InjectedBridge {}
