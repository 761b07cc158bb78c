/*!

# Ethereum Wallet Connector

This library is meant to be used for web applications that need to interact with
an injected Ethereum-compatible wallet (EIP-1193, e.g. MetaMask). It keeps a
single consistent view of the connection: am I connected, to whom, on which
network, and what does an address hold.

## Features

- Connect to the injected wallet and track the connection lifecycle
- Follow account and network changes made from the wallet side
- Resolve the native currency balance of any address, with exact decimal
  formatting of the base units

## Usage

A [`WalletSession`] owns the connection state machine and the balance query.
In the browser, discover the injected capability with `ffi::ethereum()` and
hand it to the session; anywhere else (including tests), hand it any
[`Provider`] implementation.

```no_run
use ethereum_connector::{Provider, WalletSession};

async fn demo<P: Provider + Clone + 'static>(provider: Option<P>) {
    let session = WalletSession::new(provider);

    // prompts the user; on success the connected account's balance is
    // resolved right away
    session.connect().await;

    let connection = session.connection();
    if connection.is_connected {
        println!("connected to {:?} on {:?}", connection.address, connection.network);
    }

    // balance of any address the user typed in
    session
        .resolve_balance("0xd8da6bf26964af9d7eed9e03e53415d37aa96045")
        .await;
    println!("balance: {:?}", session.balance().value);
}
```

Wallet-side changes (the user switches account or network in the extension)
are delivered through the capability's events once connected. Drive them by
spawning [`WalletSession::run`] on the browser's event loop
(`ffi::spawn_event_loop` does exactly that).

The lower level pieces are available individually: [`WalletConnector`] for
the connection state machine alone and [`BalanceResolver`] for the balance
query alone.

```no_run
# use ethereum_connector::{BalanceResolver, Provider};
#
# async fn test<P: Provider>(provider: &P) -> anyhow::Result<()> {
let resolver = BalanceResolver::new();
resolver
    .resolve("0xd8da6bf26964af9d7eed9e03e53415d37aa96045", Some(provider))
    .await;
anyhow::ensure!(resolver.snapshot().value.is_some());
# Ok(()) }
```

*/

mod balance;
mod bridge;
mod connector;
pub mod error;
pub mod ethereum;
#[cfg(target_arch = "wasm32")]
pub mod ffi;
pub mod provider;
mod session;

pub use self::{
    balance::{BalanceResolver, BalanceSnapshot, BalanceState, BalanceStatus},
    connector::{ConnectionSnapshot, ConnectionState, WalletConnector},
    error::{BalanceError, ConnectError, ProviderError, ProviderErrorCode},
    ethereum::{Address, ChainId, NetworkInfo, Wei},
    provider::{EventHandler, EventKind, Provider, ProviderEvent},
    session::WalletSession,
};
