//! Bindings to the wallet capability injected in the browser
//! (`window.ethereum`, EIP-1193).

pub mod eip1193;

use std::rc::Rc;

pub use self::eip1193::{BrowserProvider, Eip1193, ethereum};
use crate::WalletSession;

/// Drive the session's wallet-side events on the browser event loop.
///
/// Call this once, after creating the session; account and network changes
/// made from the wallet extension are applied from there on.
pub fn spawn_event_loop(session: Rc<WalletSession<BrowserProvider>>) {
    wasm_bindgen_futures::spawn_local(async move { session.run().await });
}
