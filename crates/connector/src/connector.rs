use alloy_primitives::{Address, ChainId};
use futures::{FutureExt, future::BoxFuture, future::Shared};
use parking_lot::Mutex;
use ronin_chains::{AddChainParams, SupportedChain};
use serde_json::json;
use std::{fmt, sync::Arc};
use tokio::{sync::broadcast, task::JoinHandle};
use url::Url;

use crate::{
    client::WalletClient,
    error::{ConnectorError, TransportError},
    events::{ConnectorEvent, ConnectorMessage, EventBus, ProviderEvent},
    provider::{
        Eip1193Provider, InjectedProvider, RelayProvider, Transport, WalletEnvironment,
        chain_id_from_value, decode, first_account, parse_chain_id,
    },
    relay::RelayConfig,
    storage::{self, ConnectorStorage},
    types::{ChainRef, ConnectionResult, ConnectorOptions, TransportKind},
};

/// Connector identifier, also the prefix of its storage keys.
pub const CONNECTOR_ID: &str = "ronin";

/// Human-readable connector name.
pub const CONNECTOR_NAME: &str = "Ronin Wallet";

/// Deep link opened on mobile runtimes instead of rendering a pairing code.
const AUTH_CONNECT_URL: &str = "https://wallet.roninchain.com/auth-connect";

type SharedRelayInit = Shared<BoxFuture<'static, Result<Arc<dyn RelayProvider>, TransportError>>>;

/// Lifecycle of the lazily-built relay provider. Concurrent initializers
/// share the one in-flight future instead of racing to build two providers.
enum RelayState {
    Uninitialized,
    Initializing(SharedRelayInit),
    Ready(Arc<dyn RelayProvider>),
}

impl fmt::Debug for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("Uninitialized"),
            Self::Initializing(_) => f.write_str("Initializing"),
            Self::Ready(provider) => f.debug_tuple("Ready").field(provider).finish(),
        }
    }
}

/// Dual-transport Ronin wallet connector.
///
/// Talks to the injected extension provider when one is present, and falls
/// back to a relay pairing session otherwise. The transport is re-detected on
/// every provider acquisition since the extension may be injected after the
/// application starts.
#[derive(Debug)]
pub struct RoninConnector {
    inner: Arc<ConnectorInner>,
}

#[derive(Debug)]
struct ConnectorInner {
    options: ConnectorOptions,
    chains: Vec<SupportedChain>,
    env: Arc<dyn WalletEnvironment>,
    storage: Arc<dyn ConnectorStorage>,
    events: EventBus,
    relay: Mutex<RelayState>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl RoninConnector {
    pub fn new(
        options: ConnectorOptions,
        chains: Vec<SupportedChain>,
        env: Arc<dyn WalletEnvironment>,
        storage: Arc<dyn ConnectorStorage>,
    ) -> Self {
        Self {
            inner: Arc::new(ConnectorInner {
                options,
                chains,
                env,
                storage,
                events: EventBus::new(),
                relay: Mutex::new(RelayState::Uninitialized),
                pump: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> &'static str {
        CONNECTOR_ID
    }

    pub fn name(&self) -> &'static str {
        CONNECTOR_NAME
    }

    /// Whether a connect attempt can currently do anything: an extension is
    /// injected, or at least one chain is configured for relay pairing.
    pub fn ready(&self) -> bool {
        self.inner.env.injected().is_some() || !self.inner.chains.is_empty()
    }

    /// Subscribes to the unified lifecycle events. The host subscribes once
    /// at construction.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectorEvent> {
        self.inner.events.subscribe()
    }

    /// Connects through whichever transport is available, returning the
    /// active account and chain.
    pub async fn connect(&self) -> Result<ConnectionResult, ConnectorError> {
        self.inner.connect().await
    }

    /// Disconnects and clears connector-held session state. Idempotent for
    /// already-terminated relay sessions.
    pub async fn disconnect(&self) -> Result<(), ConnectorError> {
        self.inner.disconnect().await
    }

    /// The first authorized account.
    pub async fn get_account(&self) -> Result<Address, ConnectorError> {
        let transport = self.inner.require_transport().await?;
        self.inner.account_on(&transport).await
    }

    /// The chain id the active transport is currently on.
    pub async fn get_chain_id(&self) -> Result<ChainId, ConnectorError> {
        let transport = self.inner.require_transport().await?;
        self.inner.chain_id_on(&transport).await
    }

    /// The transport resolved for the current environment, if any.
    pub async fn get_provider(&self) -> Result<Option<Transport>, ConnectorError> {
        self.inner.transport().await
    }

    /// A request facade bound to the connected account and chain.
    pub async fn get_wallet_client(&self) -> Result<WalletClient, ConnectorError> {
        self.inner.get_wallet_client().await
    }

    /// Whether a session can be resumed silently. Never fails: every probe
    /// error reads as "not authorized".
    pub async fn is_authorized(&self) -> bool {
        match self.inner.check_authorized().await {
            Ok(authorized) => authorized,
            Err(err) => {
                trace!(%err, "authorization probe failed");
                false
            }
        }
    }

    /// Switches the wallet to `chain_id`, authorizing it first if needed.
    pub async fn switch_chain(&self, chain_id: ChainId) -> Result<SupportedChain, ConnectorError> {
        self.inner.switch_chain(chain_id).await
    }
}

impl Drop for RoninConnector {
    fn drop(&mut self) {
        self.inner.remove_listeners();
    }
}

impl ConnectorInner {
    fn chain_ref(&self, id: ChainId) -> ChainRef {
        ChainRef::new(id, !self.chains.iter().any(|chain| chain.id == id))
    }

    /// Resolves the transport for one operation. Re-probes the environment
    /// every time; the result is never cached.
    async fn transport(self: &Arc<Self>) -> Result<Option<Transport>, ConnectorError> {
        if let Some(injected) = self.env.injected() {
            trace!("resolved injected transport");
            return Ok(Some(Transport::Injected(injected)));
        }
        Ok(self.relay_provider().await?.map(Transport::Relay))
    }

    async fn require_transport(self: &Arc<Self>) -> Result<Transport, ConnectorError> {
        self.transport().await?.ok_or(ConnectorError::ProviderMissing)
    }

    /// The transport as it stands right now, without triggering relay
    /// initialization.
    fn current_transport(&self) -> Option<Transport> {
        if let Some(injected) = self.env.injected() {
            return Some(Transport::Injected(injected));
        }
        match &*self.relay.lock() {
            RelayState::Ready(provider) => Some(Transport::Relay(provider.clone())),
            _ => None,
        }
    }

    /// Returns the relay provider, building it on first use. Concurrent
    /// callers share a single in-flight initialization.
    async fn relay_provider(
        self: &Arc<Self>,
    ) -> Result<Option<Arc<dyn RelayProvider>>, ConnectorError> {
        let Some(config) = RelayConfig::new(&self.options, &self.chains) else {
            debug!("no chains configured, skipping relay initialization");
            return Ok(None);
        };

        let init = {
            let mut state = self.relay.lock();
            match &*state {
                RelayState::Ready(provider) => return Ok(Some(provider.clone())),
                RelayState::Initializing(init) => init.clone(),
                RelayState::Uninitialized => {
                    debug!(chain = config.chain, "initializing relay provider");
                    let env = self.env.clone();
                    let init: SharedRelayInit =
                        async move { env.build_relay(config).await }.boxed().shared();
                    *state = RelayState::Initializing(init.clone());
                    init
                }
            }
        };

        match init.await {
            Ok(provider) => {
                *self.relay.lock() = RelayState::Ready(provider.clone());
                Ok(Some(provider))
            }
            Err(err) => {
                *self.relay.lock() = RelayState::Uninitialized;
                Err(err.into())
            }
        }
    }

    async fn connect(self: &Arc<Self>) -> Result<ConnectionResult, ConnectorError> {
        let transport = self.require_transport().await?;
        let result = match &transport {
            Transport::Injected(provider) => {
                self.connect_injected(&transport, provider.clone()).await
            }
            Transport::Relay(provider) => self.connect_relay(&transport, provider.clone()).await,
        };
        result.map_err(|err| {
            // a failed connect leaves no pending chain authorizations behind
            storage::clear_requested_chains(&*self.storage);
            err.normalize_rejection()
        })
    }

    async fn connect_injected(
        self: &Arc<Self>,
        transport: &Transport,
        provider: Arc<dyn InjectedProvider>,
    ) -> Result<ConnectionResult, ConnectorError> {
        self.install_listeners(transport);
        self.events.emit(ConnectorEvent::Message(ConnectorMessage::Connecting));

        let accounts: Vec<String> =
            decode(provider.request("eth_requestAccounts", json!([])).await?)?;
        let account = first_account(&accounts)?;
        let chain_id = chain_id_from_value(&provider.request("eth_chainId", json!([])).await?)?;
        let chain = self.chain_ref(chain_id);

        // the extension cannot be told to end a session, so remember that one
        // is open until the user explicitly disconnects
        if self.options.shim_disconnect {
            storage::set_shim_flag(&*self.storage);
        }

        self.events.emit(ConnectorEvent::Connect { account, chain });
        debug!(%account, chain_id, "connected via injected provider");
        Ok(ConnectionResult { account, chain })
    }

    async fn connect_relay(
        self: &Arc<Self>,
        transport: &Transport,
        provider: Arc<dyn RelayProvider>,
    ) -> Result<ConnectionResult, ConnectorError> {
        self.install_listeners(transport);

        if provider.session().is_none() {
            self.events.emit(ConnectorEvent::Message(ConnectorMessage::Connecting));
            provider.connect().await?;
            let requested = self.chains.iter().map(|chain| chain.id).collect();
            storage::write_requested_chains(&*self.storage, &requested);
        } else {
            // session survived from an earlier pairing; enable for the chains
            // it already authorizes instead of re-running the handshake
            provider.enable().await?;
        }

        let session =
            provider.session().ok_or_else(|| TransportError::new("no relay session established"))?;
        let account = *session
            .accounts
            .first()
            .ok_or_else(|| TransportError::new("no accounts available"))?;
        let chain = self.chain_ref(session.chain_id);
        debug!(%account, chain_id = session.chain_id, "connected via relay session");
        Ok(ConnectionResult { account, chain })
    }

    async fn disconnect(self: &Arc<Self>) -> Result<(), ConnectorError> {
        let transport = self.current_transport();
        let result = match &transport {
            Some(Transport::Relay(provider)) => match provider.disconnect().await {
                Err(err) if err.is_stale_session() => {
                    debug!("relay session already terminated");
                    Ok(())
                }
                other => other.map_err(ConnectorError::from),
            },
            // injected wallets have no transport-level disconnect
            Some(Transport::Injected(_)) | None => Ok(()),
        };

        // teardown runs regardless of the transport outcome
        self.remove_listeners();
        storage::clear_requested_chains(&*self.storage);
        storage::clear_shim_flag(&*self.storage);

        result?;

        match transport.map(|transport| transport.kind()) {
            Some(TransportKind::Injected) => {
                self.events.emit(ConnectorEvent::Change { account: None, chain: None });
                self.events.emit(ConnectorEvent::Disconnect);
            }
            Some(TransportKind::Relay) => self.events.emit(ConnectorEvent::Disconnect),
            None => {}
        }
        Ok(())
    }

    async fn account_on(&self, transport: &Transport) -> Result<Address, ConnectorError> {
        match transport {
            Transport::Relay(provider) => {
                let session =
                    provider.session().ok_or_else(|| TransportError::new("no relay session"))?;
                Ok(*session
                    .accounts
                    .first()
                    .ok_or_else(|| TransportError::new("no accounts available"))?)
            }
            Transport::Injected(provider) => {
                let accounts: Vec<String> =
                    decode(provider.request("eth_accounts", json!([])).await?)?;
                Ok(first_account(&accounts)?)
            }
        }
    }

    async fn chain_id_on(&self, transport: &Transport) -> Result<ChainId, ConnectorError> {
        match transport {
            Transport::Relay(provider) => provider
                .session()
                .map(|session| session.chain_id)
                .ok_or_else(|| TransportError::new("no relay session").into()),
            Transport::Injected(provider) => {
                Ok(chain_id_from_value(&provider.request("eth_chainId", json!([])).await?)?)
            }
        }
    }

    async fn get_wallet_client(self: &Arc<Self>) -> Result<WalletClient, ConnectorError> {
        let transport = self.transport().await?.ok_or(ConnectorError::ProviderMissing)?;
        let account = self.account_on(&transport).await?;
        let chain_id = self.chain_id_on(&transport).await?;
        let chain = self.chain_ref(chain_id);
        Ok(WalletClient::new(transport, account, chain))
    }

    async fn check_authorized(self: &Arc<Self>) -> Result<bool, ConnectorError> {
        let Some(transport) = self.transport().await? else {
            return Ok(false);
        };
        // the shim flag compensates for the injected transport's missing
        // disconnect: its absence means the user explicitly ended the session
        if self.options.shim_disconnect
            && transport.kind() == TransportKind::Injected
            && !storage::shim_flag_set(&*self.storage)
        {
            return Ok(false);
        }
        Ok(self.account_on(&transport).await.is_ok())
    }

    async fn switch_chain(
        self: &Arc<Self>,
        chain_id: ChainId,
    ) -> Result<SupportedChain, ConnectorError> {
        let chain = self
            .chains
            .iter()
            .find(|chain| chain.id == chain_id)
            .cloned()
            .ok_or(ConnectorError::ChainNotFound { chain_id })?;
        let transport = self.require_transport().await?;

        let (authorized, supports_add) = match &transport {
            Transport::Relay(provider) => match provider.session() {
                Some(session) => (
                    session.authorizes(chain_id),
                    session.supports_method("wallet_addEthereumChain"),
                ),
                None => (false, false),
            },
            // no session namespace to consult; the extension treats re-adding
            // a known chain as a no-op
            Transport::Injected(_) => (false, true),
        };

        let result = self.request_switch(&transport, &chain, authorized, supports_add).await;
        match result {
            Ok(()) => {
                debug!(chain_id, "switched chain");
                Ok(chain)
            }
            Err(err) if err.is_user_rejection() => {
                Err(ConnectorError::UserRejected { message: err.message })
            }
            Err(err) => Err(ConnectorError::SwitchChainFailed { chain_id, source: err }),
        }
    }

    async fn request_switch(
        &self,
        transport: &Transport,
        chain: &SupportedChain,
        authorized: bool,
        supports_add: bool,
    ) -> Result<(), TransportError> {
        if !authorized && supports_add {
            transport
                .request("wallet_addEthereumChain", json!([AddChainParams::from(chain)]))
                .await?;
            storage::record_requested_chain(&*self.storage, chain.id);
        }
        transport
            .request("wallet_switchEthereumChain", json!([{ "chainId": chain.hex_id() }]))
            .await?;
        Ok(())
    }

    /// Installs the native-event pump for the transport, replacing any
    /// previous one.
    fn install_listeners(self: &Arc<Self>, transport: &Transport) {
        let rx = transport.subscribe();
        let inner = self.clone();
        let transport = transport.clone();
        let handle = tokio::spawn(async move { inner.pump_events(transport, rx).await });
        if let Some(old) = self.pump.lock().replace(handle) {
            old.abort();
        }
    }

    fn remove_listeners(&self) {
        if let Some(handle) = self.pump.lock().take() {
            handle.abort();
        }
    }

    async fn pump_events(
        self: Arc<Self>,
        transport: Transport,
        mut rx: broadcast::Receiver<ProviderEvent>,
    ) {
        let kind = transport.kind();
        loop {
            match rx.recv().await {
                Ok(event) => self.forward_native_event(kind, &transport, event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "provider event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Translates one transport-native event into its unified lifecycle
    /// event.
    fn forward_native_event(&self, kind: TransportKind, transport: &Transport, event: ProviderEvent) {
        // the injected transport only participates in the account, chain and
        // disconnect events
        if kind == TransportKind::Injected
            && !matches!(
                event,
                ProviderEvent::AccountsChanged(_)
                    | ProviderEvent::ChainChanged(_)
                    | ProviderEvent::Disconnect
            )
        {
            return;
        }

        trace!(?event, ?kind, "translating provider event");
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                Some(account) => self
                    .events
                    .emit(ConnectorEvent::Change { account: Some(*account), chain: None }),
                None => self.events.emit(ConnectorEvent::Disconnect),
            },
            ProviderEvent::ChainChanged(raw) => match parse_chain_id(&raw) {
                Ok(id) => self
                    .events
                    .emit(ConnectorEvent::Change { account: None, chain: Some(self.chain_ref(id)) }),
                Err(err) => warn!(%err, "ignoring malformed chain id"),
            },
            ProviderEvent::Disconnect | ProviderEvent::SessionDelete => {
                match kind {
                    TransportKind::Injected => storage::clear_shim_flag(&*self.storage),
                    TransportKind::Relay => storage::clear_requested_chains(&*self.storage),
                }
                self.events.emit(ConnectorEvent::Disconnect);
            }
            ProviderEvent::DisplayUri(uri) => self.display_uri(uri),
            ProviderEvent::Connect { chain_id } => {
                let Transport::Relay(provider) = transport else { return };
                let Some(session) = provider.session() else { return };
                let Some(account) = session.accounts.first().copied() else { return };
                let id = parse_chain_id(&chain_id).unwrap_or(session.chain_id);
                self.events.emit(ConnectorEvent::Connect { account, chain: self.chain_ref(id) });
            }
        }
    }

    /// Hands the pairing URI to the host, redirecting into the companion app
    /// first on mobile runtimes. The `mobile` flag tells the UI which of the
    /// two happened.
    fn display_uri(&self, uri: String) {
        let mobile = self.env.is_mobile();
        if mobile {
            match Url::parse_with_params(AUTH_CONNECT_URL, [("uri", uri.as_str())]) {
                Ok(link) => {
                    debug!(%link, "redirecting to companion app");
                    self.env.navigate(&link);
                }
                Err(err) => warn!(%err, "failed to build companion deep link"),
            }
        }
        self.events
            .emit(ConnectorEvent::Message(ConnectorMessage::DisplayUri { uri, mobile }));
    }
}
