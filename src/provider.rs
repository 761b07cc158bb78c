use std::rc::Rc;

use crate::{
    error::ProviderError,
    ethereum::{Address, ChainId, Wei},
};

/// The two event kinds a wallet capability emits that the connector cares
/// about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AccountsChanged,
    ChainChanged,
}

/// Event emitted by the wallet capability, already normalized into domain
/// types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// the selected accounts changed; an empty list means the user fully
    /// disconnected the application from the wallet
    AccountsChanged(Vec<Address>),
    /// the capability now points at another chain
    ChainChanged(ChainId),
}

impl ProviderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProviderEvent::AccountsChanged(_) => EventKind::AccountsChanged,
            ProviderEvent::ChainChanged(_) => EventKind::ChainChanged,
        }
    }
}

/// Subscription handler. Handlers are registered and removed by reference:
/// removing with anything but the originally registered `Rc` is a no-op,
/// so keep the clone you registered with.
pub type EventHandler = Rc<dyn Fn(&ProviderEvent)>;

/// The wallet capability the connector borrows.
///
/// In a browser this is implemented over the injected EIP-1193 object
/// (`window.ethereum`, see the `ffi` module); tests implement it with a
/// scripted mock. The capability is never owned by the connector: it is
/// borrowed per call, and only the event subscription outlives a call.
#[allow(async_fn_in_trait)]
pub trait Provider {
    /// prompt the user for account access (`eth_requestAccounts`)
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// the chain the capability currently points at (`eth_chainId`)
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;

    /// native currency balance of the address, in base units
    /// (`eth_getBalance`)
    async fn balance_of(&self, address: &Address) -> Result<Wei, ProviderError>;

    /// register a handler for the given event kind
    fn on(&self, kind: EventKind, handler: EventHandler);

    /// remove a handler previously registered with [`Provider::on`],
    /// identified by the same `Rc` reference
    fn off(&self, kind: EventKind, handler: &EventHandler);
}

#[cfg(test)]
pub(crate) mod mock {
    use std::cell::RefCell;

    use futures::channel::oneshot;

    use super::*;

    pub(crate) fn test_address(tag: u8) -> Address {
        Address::from([tag; Address::SIZE])
    }

    enum Reply<T> {
        Ready(Result<T, ProviderError>),
        Deferred(oneshot::Receiver<Result<T, ProviderError>>),
    }

    impl<T> Reply<T> {
        async fn resolve(self) -> Result<T, ProviderError> {
            match self {
                Reply::Ready(result) => result,
                Reply::Deferred(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ProviderError::unexpected("reply channel dropped"))),
            }
        }
    }

    #[derive(Default)]
    struct Inner {
        accounts_replies: Vec<Reply<Vec<Address>>>,
        chain_replies: Vec<Result<ChainId, ProviderError>>,
        balance_replies: Vec<Reply<Wei>>,
        accounts_calls: usize,
        chain_calls: usize,
        balance_calls: usize,
        handlers: Vec<(EventKind, EventHandler)>,
    }

    /// Scripted capability: replies are consumed in push order, and fall
    /// back to benign defaults (one account, mainnet, zero balance) when
    /// nothing was scripted.
    #[derive(Clone, Default)]
    pub(crate) struct MockProvider {
        inner: Rc<RefCell<Inner>>,
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_accounts(&self, reply: Result<Vec<Address>, ProviderError>) {
            self.inner
                .borrow_mut()
                .accounts_replies
                .push(Reply::Ready(reply));
        }

        /// script an account request that stays pending until the returned
        /// sender fires, to observe the `Connecting` state
        pub fn push_deferred_accounts(&self) -> oneshot::Sender<Result<Vec<Address>, ProviderError>> {
            let (tx, rx) = oneshot::channel();
            self.inner
                .borrow_mut()
                .accounts_replies
                .push(Reply::Deferred(rx));
            tx
        }

        pub fn push_chain_id(&self, reply: Result<ChainId, ProviderError>) {
            self.inner.borrow_mut().chain_replies.push(reply);
        }

        pub fn push_balance(&self, reply: Result<Wei, ProviderError>) {
            self.inner
                .borrow_mut()
                .balance_replies
                .push(Reply::Ready(reply));
        }

        /// script a balance reply that stays pending until the returned
        /// sender fires, to control completion order in race tests
        pub fn push_deferred_balance(&self) -> oneshot::Sender<Result<Wei, ProviderError>> {
            let (tx, rx) = oneshot::channel();
            self.inner
                .borrow_mut()
                .balance_replies
                .push(Reply::Deferred(rx));
            tx
        }

        /// invoke every handler registered for the event's kind, the way
        /// the injected object would
        pub fn fire(&self, event: ProviderEvent) {
            let handlers: Vec<EventHandler> = self
                .inner
                .borrow()
                .handlers
                .iter()
                .filter(|(kind, _)| *kind == event.kind())
                .map(|(_, handler)| Rc::clone(handler))
                .collect();
            for handler in handlers {
                handler(&event);
            }
        }

        pub fn accounts_calls(&self) -> usize {
            self.inner.borrow().accounts_calls
        }

        pub fn chain_calls(&self) -> usize {
            self.inner.borrow().chain_calls
        }

        pub fn balance_calls(&self) -> usize {
            self.inner.borrow().balance_calls
        }

        pub fn handler_count(&self, kind: EventKind) -> usize {
            self.inner
                .borrow()
                .handlers
                .iter()
                .filter(|(k, _)| *k == kind)
                .count()
        }
    }

    impl Provider for MockProvider {
        async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
            let reply = {
                let mut inner = self.inner.borrow_mut();
                inner.accounts_calls += 1;
                if inner.accounts_replies.is_empty() {
                    Reply::Ready(Ok(vec![test_address(0xaa)]))
                } else {
                    inner.accounts_replies.remove(0)
                }
            };
            reply.resolve().await
        }

        async fn chain_id(&self) -> Result<ChainId, ProviderError> {
            let mut inner = self.inner.borrow_mut();
            inner.chain_calls += 1;
            if inner.chain_replies.is_empty() {
                Ok(ChainId::MAINNET)
            } else {
                inner.chain_replies.remove(0)
            }
        }

        async fn balance_of(&self, _address: &Address) -> Result<Wei, ProviderError> {
            let reply = {
                let mut inner = self.inner.borrow_mut();
                inner.balance_calls += 1;
                if inner.balance_replies.is_empty() {
                    Reply::Ready(Ok(Wei::from(0)))
                } else {
                    inner.balance_replies.remove(0)
                }
            };
            reply.resolve().await
        }

        fn on(&self, kind: EventKind, handler: EventHandler) {
            self.inner.borrow_mut().handlers.push((kind, handler));
        }

        fn off(&self, kind: EventKind, handler: &EventHandler) {
            self.inner
                .borrow_mut()
                .handlers
                .retain(|(k, h)| *k != kind || !Rc::ptr_eq(h, handler));
        }
    }
}
