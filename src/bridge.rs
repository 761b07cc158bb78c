use std::{cell::RefCell, rc::Rc};

use futures::channel::mpsc::UnboundedSender;

use crate::provider::{EventHandler, EventKind, Provider, ProviderEvent};

/// Owns the subscription to the capability's events for the lifetime of a
/// connection session.
///
/// The registered handlers are kept here so that [`EventBridge::detach`]
/// removes the very same references it registered: removing with a freshly
/// built closure would leave the subscription dangling. At most one
/// subscription pair is active at a time; attaching again detaches the
/// previous pair first.
pub(crate) struct EventBridge<P: Provider + Clone + 'static> {
    active: RefCell<Option<Subscription<P>>>,
}

struct Subscription<P> {
    provider: P,
    accounts: EventHandler,
    chain: EventHandler,
}

impl<P: Provider + Clone + 'static> EventBridge<P> {
    pub fn new() -> Self {
        Self {
            active: RefCell::new(None),
        }
    }

    /// subscribe to the capability's `accountsChanged` and `chainChanged`
    /// events, forwarding them into the connector's event queue
    pub fn attach(&self, provider: &P, sink: UnboundedSender<ProviderEvent>) {
        self.detach();

        // one handler per event kind, each its own Rc so it can be
        // removed independently
        let accounts = forwarder(sink.clone());
        let chain = forwarder(sink);

        provider.on(EventKind::AccountsChanged, Rc::clone(&accounts));
        provider.on(EventKind::ChainChanged, Rc::clone(&chain));

        *self.active.borrow_mut() = Some(Subscription {
            provider: provider.clone(),
            accounts,
            chain,
        });
    }

    /// remove the handlers registered by the matching [`EventBridge::attach`];
    /// a no-op when nothing is attached
    pub fn detach(&self) {
        if let Some(subscription) = self.active.borrow_mut().take() {
            subscription
                .provider
                .off(EventKind::AccountsChanged, &subscription.accounts);
            subscription
                .provider
                .off(EventKind::ChainChanged, &subscription.chain);
            log::debug!("wallet event subscription removed");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.active.borrow().is_some()
    }
}

fn forwarder(sink: UnboundedSender<ProviderEvent>) -> EventHandler {
    Rc::new(move |event: &ProviderEvent| {
        if sink.unbounded_send(event.clone()).is_err() {
            log::warn!("wallet event dropped, the connector is gone");
        }
    })
}
