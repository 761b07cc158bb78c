use std::{cell::RefCell, rc::Rc};

use wasm_bindgen::{JsCast as _, prelude::*};

use crate::{
    error::ProviderError,
    ethereum::{Address, ChainId, Wei},
    provider::{EventHandler, EventKind, Provider, ProviderEvent},
};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(thread_local_v2, js_namespace = ["window"], js_name = "ethereum")]
    pub static ETHEREUM: Option<Eip1193>;
}

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, PartialEq)]
    pub type Eip1193;

    /// Submit an RPC request to the wallet. Takes a single
    /// `{ method, params }` object and resolves with the method's result,
    /// or rejects with a `{ code, message }` provider error.
    #[wasm_bindgen(method, catch)]
    pub async fn request(this: &Eip1193, args: JsValue) -> Result<JsValue, JsValue>;

    /// Subscribe to one of the provider events (`accountsChanged`,
    /// `chainChanged`, ...). The same function reference must be handed to
    /// `removeListener` to unsubscribe.
    #[wasm_bindgen(method, js_name = "on")]
    pub fn on(this: &Eip1193, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method, js_name = "removeListener")]
    pub fn remove_listener(this: &Eip1193, event: &str, handler: &js_sys::Function);
}

/// The capability injected in this page, if the user has a wallet
/// extension installed.
///
/// It is possible the wallet was not injected yet by the extension: make
/// sure the page is fully loaded before calling this function (or refresh
/// the value from time to time).
pub fn ethereum() -> Option<BrowserProvider> {
    ETHEREUM.with(|injected| injected.clone().map(BrowserProvider::new))
}

struct Registration {
    kind: EventKind,
    handler: EventHandler,
    closure: Closure<dyn Fn(JsValue)>,
}

/// [`Provider`] implementation over the injected EIP-1193 object.
///
/// The JS closures backing the event subscriptions are kept here, keyed by
/// the registered handler reference, so that `off` removes exactly the
/// function that `on` registered. Clones share the registry.
#[derive(Clone)]
pub struct BrowserProvider {
    inner: Eip1193,
    registrations: Rc<RefCell<Vec<Registration>>>,
}

impl BrowserProvider {
    fn new(inner: Eip1193) -> Self {
        Self {
            inner,
            registrations: Rc::new(RefCell::new(Vec::new())),
        }
    }

    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<JsValue, ProviderError> {
        let args = serde_wasm_bindgen::to_value(&serde_json::json!({
            "method": method,
            "params": params,
        }))
        .map_err(|encode_error| {
            ProviderError::unexpected(format!("Couldn't encode the request: {encode_error}"))
        })?;

        self.inner.request(args).await.map_err(decode_error)
    }
}

impl Provider for BrowserProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let accounts = self
            .request("eth_requestAccounts", serde_json::json!([]))
            .await?;
        let accounts: Vec<String> =
            serde_wasm_bindgen::from_value(accounts).map_err(|decode_error| {
                ProviderError::unexpected(format!(
                    "Couldn't decode the account list: {decode_error}"
                ))
            })?;

        accounts
            .iter()
            .map(|account| {
                Address::from_hex(account).map_err(|error| {
                    ProviderError::unexpected(format!("Invalid account `{account}': {error}"))
                })
            })
            .collect()
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        let quantity = self.request("eth_chainId", serde_json::json!([])).await?;
        let Some(quantity) = quantity.as_string() else {
            return Err(ProviderError::unexpected(format!(
                "Unknown chain id: {quantity:?}"
            )));
        };

        ChainId::from_hex_quantity(&quantity).map_err(|error| {
            ProviderError::unexpected(format!("Invalid chain id `{quantity}': {error}"))
        })
    }

    async fn balance_of(&self, address: &Address) -> Result<Wei, ProviderError> {
        let quantity = self
            .request(
                "eth_getBalance",
                serde_json::json!([address.to_hex(), "latest"]),
            )
            .await?;
        let Some(quantity) = quantity.as_string() else {
            return Err(ProviderError::unexpected(format!(
                "Unknown balance: {quantity:?}"
            )));
        };

        Wei::from_hex_quantity(&quantity).map_err(|error| {
            ProviderError::unexpected(format!("Invalid balance `{quantity}': {error}"))
        })
    }

    fn on(&self, kind: EventKind, handler: EventHandler) {
        let closure = event_closure(kind, Rc::clone(&handler));
        self.inner
            .on(event_name(kind), closure.as_ref().unchecked_ref());
        self.registrations.borrow_mut().push(Registration {
            kind,
            handler,
            closure,
        });
    }

    fn off(&self, kind: EventKind, handler: &EventHandler) {
        let mut registrations = self.registrations.borrow_mut();
        let Some(index) = registrations
            .iter()
            .position(|registration| {
                registration.kind == kind && Rc::ptr_eq(&registration.handler, handler)
            })
        else {
            return;
        };

        let registration = registrations.remove(index);
        self.inner.remove_listener(
            event_name(kind),
            registration.closure.as_ref().unchecked_ref(),
        );
    }
}

fn event_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::AccountsChanged => "accountsChanged",
        EventKind::ChainChanged => "chainChanged",
    }
}

fn event_closure(kind: EventKind, handler: EventHandler) -> Closure<dyn Fn(JsValue)> {
    Closure::new(move |payload: JsValue| match decode_event(kind, &payload) {
        Ok(event) => handler(&event),
        Err(info) => log::warn!("Ignoring malformed `{}' payload: {info}", event_name(kind)),
    })
}

fn decode_event(kind: EventKind, payload: &JsValue) -> Result<ProviderEvent, String> {
    match kind {
        EventKind::AccountsChanged => {
            let accounts: Vec<String> = serde_wasm_bindgen::from_value(payload.clone())
                .map_err(|decode_error| decode_error.to_string())?;
            let accounts = accounts
                .iter()
                .map(|account| Address::from_hex(account))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| error.to_string())?;
            Ok(ProviderEvent::AccountsChanged(accounts))
        }
        EventKind::ChainChanged => {
            let quantity = payload
                .as_string()
                .ok_or_else(|| format!("expecting a string, got {payload:?}"))?;
            ChainId::from_hex_quantity(&quantity)
                .map(ProviderEvent::ChainChanged)
                .map_err(|error| error.to_string())
        }
    }
}

fn decode_error(error: JsValue) -> ProviderError {
    serde_wasm_bindgen::from_value(error).unwrap_or_else(|decode_error| {
        ProviderError::unexpected(format!("Couldn't decode the error content: {decode_error}"))
    })
}
