use std::cell::{Cell, RefCell};

use futures::{
    StreamExt as _,
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

use crate::{
    bridge::EventBridge,
    error::{ConnectError, ProviderError},
    ethereum::{Address, ChainId, NetworkInfo},
    provider::{Provider, ProviderEvent},
};

/// Connection lifecycle, exactly one variant active at a time.
///
/// The address and the network exist if and only if the connection is
/// established: a half-connected record (address set while disconnected)
/// is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// transient, awaiting the capability's answer
    Connecting,
    Connected {
        address: Address,
        network: NetworkInfo,
    },
    /// recoverable: another `connect` starts a fresh attempt
    Failed { error: ConnectError },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    pub fn address(&self) -> Option<&Address> {
        match self {
            ConnectionState::Connected { address, .. } => Some(address),
            _ => None,
        }
    }

    pub fn network(&self) -> Option<&NetworkInfo> {
        match self {
            ConnectionState::Connected { network, .. } => Some(network),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ConnectError> {
        match self {
            ConnectionState::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// What the UI reads: a plain value snapshot of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub address: Option<Address>,
    pub network: Option<NetworkInfo>,
    pub is_connected: bool,
    pub error: Option<ConnectError>,
}

/// The connection state machine. Sole writer of [`ConnectionState`].
///
/// State changes happen on four operations only: [`WalletConnector::connect`],
/// [`WalletConnector::disconnect`], and the two capability events bridged
/// in from the wallet side. The machine never transitions on a timer.
///
/// Bridged events are queued and applied in order when the connector is
/// driven, either by [`crate::WalletSession::run`] in a browser host or by
/// [`WalletConnector::process_pending_events`] directly.
pub struct WalletConnector<P: Provider + Clone + 'static> {
    provider: Option<P>,
    state: RefCell<ConnectionState>,
    bridge: EventBridge<P>,
    // attempts issued so far; a settling attempt that is no longer the
    // latest is discarded
    attempts: Cell<u64>,
    event_sink: UnboundedSender<ProviderEvent>,
    events: RefCell<UnboundedReceiver<ProviderEvent>>,
}

impl<P: Provider + Clone + 'static> WalletConnector<P> {
    /// a connector over the capability found in the host, if any; `None`
    /// makes every `connect` settle in `Failed { NoCapability }`
    pub fn new(provider: Option<P>) -> Self {
        let (event_sink, events) = mpsc::unbounded();
        Self {
            provider,
            state: RefCell::new(ConnectionState::Disconnected),
            bridge: EventBridge::new(),
            attempts: Cell::new(0),
            event_sink,
            events: RefCell::new(events),
        }
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        let state = self.state.borrow();
        ConnectionSnapshot {
            address: state.address().copied(),
            network: state.network().cloned(),
            is_connected: state.is_connected(),
            error: state.error().cloned(),
        }
    }

    /// connect to the wallet: prompt for account access, query the network
    /// identity and subscribe to the capability's change events
    ///
    /// Safe to call from any state. A `disconnect` issued while the
    /// capability is still answering wins over the late answer.
    pub async fn connect(&self) {
        let Some(provider) = self.provider.as_ref() else {
            log::warn!("no wallet capability injected in this host");
            self.transition(ConnectionState::Failed {
                error: ConnectError::NoCapability,
            });
            return;
        };

        let attempt = self.attempts.get() + 1;
        self.attempts.set(attempt);
        self.transition(ConnectionState::Connecting);

        let accounts = match provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(error) => {
                self.settle(attempt, ConnectionState::Failed {
                    error: connect_error(error),
                });
                return;
            }
        };

        // the capability answered but granted nothing
        let Some(address) = accounts.into_iter().next() else {
            self.settle(attempt, ConnectionState::Failed {
                error: ConnectError::ConnectionDenied,
            });
            return;
        };

        let network = match provider.chain_id().await {
            Ok(chain_id) => NetworkInfo::from_chain_id(chain_id),
            Err(error) => {
                self.settle(attempt, ConnectionState::Failed {
                    error: ConnectError::RequestFailed(error),
                });
                return;
            }
        };

        if self.settle(attempt, ConnectionState::Connected { address, network }) {
            self.bridge.attach(provider, self.event_sink.clone());
        }
    }

    /// drop the connection and the event subscription; a no-op state-wise
    /// when already disconnected
    pub fn disconnect(&self) {
        self.bridge.detach();
        self.transition(ConnectionState::Disconnected);
    }

    /// apply every event the bridge has queued so far
    pub async fn process_pending_events(&self) {
        while let Some(event) = self.try_next_event() {
            self.apply_event(event).await;
        }
    }

    pub(crate) fn try_next_event(&self) -> Option<ProviderEvent> {
        self.events.borrow_mut().try_next().ok().flatten()
    }

    /// wait for the next bridged event; only one caller may drive this at
    /// a time
    pub(crate) async fn next_event(&self) -> Option<ProviderEvent> {
        let mut events = self.events.borrow_mut();
        events.next().await
    }

    pub(crate) async fn apply_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => self.on_accounts_changed(accounts),
            ProviderEvent::ChainChanged(chain_id) => self.on_chain_changed(chain_id).await,
        }
    }

    /// the wallet-side account selection changed: an empty list behaves as
    /// a disconnect, otherwise the address is replaced and the network kept
    fn on_accounts_changed(&self, accounts: Vec<Address>) {
        let Some(address) = accounts.into_iter().next() else {
            log::debug!("wallet reports no account left, disconnecting");
            self.disconnect();
            return;
        };

        let mut state = self.state.borrow_mut();
        if let ConnectionState::Connected { network, .. } = &*state {
            log::debug!("wallet account changed to {address}");
            *state = ConnectionState::Connected {
                address,
                network: network.clone(),
            };
        } else {
            log::debug!("ignoring account change while not connected");
        }
    }

    /// the wallet now points at another chain: re-query the network
    /// identity and replace the snapshot wholesale
    async fn on_chain_changed(&self, chain_id: ChainId) {
        if !self.state.borrow().is_connected() {
            log::debug!("ignoring chain change while not connected");
            return;
        }

        let network = match self.provider.as_ref() {
            Some(provider) => match provider.chain_id().await {
                Ok(chain_id) => NetworkInfo::from_chain_id(chain_id),
                Err(error) => {
                    // the event payload already carries the new id, only
                    // the display name may be missing
                    log::warn!("failed to re-query the network identity: {error}");
                    NetworkInfo::from_chain_id(chain_id)
                }
            },
            None => NetworkInfo::from_chain_id(chain_id),
        };

        let mut state = self.state.borrow_mut();
        if let ConnectionState::Connected { network: current, .. } = &mut *state {
            log::debug!("wallet network changed to {network}");
            *current = network;
        }
    }

    /// apply the outcome of a connection attempt, unless the attempt was
    /// superseded by a newer `connect` or a `disconnect` in the meantime
    fn settle(&self, attempt: u64, next: ConnectionState) -> bool {
        let superseded = self.attempts.get() != attempt
            || !matches!(*self.state.borrow(), ConnectionState::Connecting);
        if superseded {
            log::debug!("discarding the outcome of superseded connection attempt {attempt}");
            return false;
        }
        self.transition(next);
        true
    }

    fn transition(&self, next: ConnectionState) {
        let mut state = self.state.borrow_mut();
        if *state != next {
            log::debug!("connection: {state:?} -> {next:?}");
        }
        *state = next;
    }
}

fn connect_error(error: ProviderError) -> ConnectError {
    if error.is_rejection() {
        ConnectError::ConnectionDenied
    } else {
        ConnectError::RequestFailed(error)
    }
}
