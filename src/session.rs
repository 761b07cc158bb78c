use crate::{
    balance::{BalanceResolver, BalanceSnapshot},
    connector::{ConnectionSnapshot, WalletConnector},
    provider::{Provider, ProviderEvent},
};

/// The one entry point a front end consumes: a [`WalletConnector`] and a
/// [`BalanceResolver`] wired together.
///
/// The session resolves the balance of the connected account on its own,
/// both right after a successful [`WalletSession::connect`] and whenever
/// the wallet-side account selection changes; the front end only needs
/// [`WalletSession::resolve_balance`] for addresses the user types in.
pub struct WalletSession<P: Provider + Clone + 'static> {
    connector: WalletConnector<P>,
    resolver: BalanceResolver,
}

impl<P: Provider + Clone + 'static> WalletSession<P> {
    pub fn new(provider: Option<P>) -> Self {
        Self {
            connector: WalletConnector::new(provider),
            resolver: BalanceResolver::new(),
        }
    }

    pub fn connector(&self) -> &WalletConnector<P> {
        &self.connector
    }

    pub fn resolver(&self) -> &BalanceResolver {
        &self.resolver
    }

    /// snapshot of the connection, for rendering
    pub fn connection(&self) -> ConnectionSnapshot {
        self.connector.snapshot()
    }

    /// snapshot of the latest balance query, for rendering
    pub fn balance(&self) -> BalanceSnapshot {
        self.resolver.snapshot()
    }

    /// connect to the wallet and, on success, resolve the connected
    /// account's balance
    pub async fn connect(&self) {
        self.connector.connect().await;
        if let Some(address) = self.connector.snapshot().address {
            self.resolve_balance(&address.to_hex()).await;
        }
    }

    pub fn disconnect(&self) {
        self.connector.disconnect();
    }

    /// resolve the balance of a user supplied address
    pub async fn resolve_balance(&self, raw_address: &str) {
        self.resolver
            .resolve(raw_address, self.connector.provider())
            .await;
    }

    /// drive the wallet-side events forever; spawn this on the host's
    /// event loop (e.g. `wasm_bindgen_futures::spawn_local`)
    pub async fn run(&self) {
        while let Some(event) = self.connector.next_event().await {
            self.handle_bridged(event).await;
        }
    }

    /// apply every wallet-side event queued so far
    pub async fn process_pending_events(&self) {
        while let Some(event) = self.connector.try_next_event() {
            self.handle_bridged(event).await;
        }
    }

    async fn handle_bridged(&self, event: ProviderEvent) {
        let before = self.connector.snapshot().address;
        self.connector.apply_event(event).await;
        let after = self.connector.snapshot().address;

        if after != before {
            if let Some(address) = after {
                self.resolve_balance(&address.to_hex()).await;
            }
        }
    }
}
