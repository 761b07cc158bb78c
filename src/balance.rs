use std::cell::{Cell, RefCell};

use crate::{error::BalanceError, ethereum::Address, provider::Provider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceStatus {
    Idle,
    Pending,
    Ready,
    Failed,
}

/// Outcome of the latest issued balance query. Superseded wholesale by each
/// new query, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BalanceState {
    #[default]
    Idle,
    Pending {
        target: Address,
    },
    Ready {
        target: Address,
        /// exact decimal ether string, see [`crate::Wei::to_ether`]
        value: String,
    },
    Failed {
        error: BalanceError,
    },
}

impl BalanceState {
    pub fn status(&self) -> BalanceStatus {
        match self {
            BalanceState::Idle => BalanceStatus::Idle,
            BalanceState::Pending { .. } => BalanceStatus::Pending,
            BalanceState::Ready { .. } => BalanceStatus::Ready,
            BalanceState::Failed { .. } => BalanceStatus::Failed,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            BalanceState::Ready { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&BalanceError> {
        match self {
            BalanceState::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// What the UI reads: a plain value snapshot of the balance query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub status: BalanceStatus,
    pub value: Option<String>,
    pub error: Option<BalanceError>,
}

/// Resolves the native currency balance of an arbitrary address. Sole
/// writer of [`BalanceState`].
///
/// Queries may overlap: every call to [`BalanceResolver::resolve`] takes
/// the next sequence number, and a completion is applied only while its
/// sequence is still the latest issued. The displayed balance therefore
/// always belongs to the most recently issued query, whatever order the
/// capability answers in. Nothing is cancelled; a hung query is simply
/// superseded by the next one.
pub struct BalanceResolver {
    state: RefCell<BalanceState>,
    sequence: Cell<u64>,
}

impl BalanceResolver {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(BalanceState::Idle),
            sequence: Cell::new(0),
        }
    }

    pub fn state(&self) -> BalanceState {
        self.state.borrow().clone()
    }

    pub fn snapshot(&self) -> BalanceSnapshot {
        let state = self.state.borrow();
        BalanceSnapshot {
            status: state.status(),
            value: state.value().map(str::to_owned),
            error: state.error().cloned(),
        }
    }

    /// resolve the balance of `raw_address` through the capability
    ///
    /// The address is validated before anything is sent: a malformed input
    /// settles in `Failed { InvalidAddressFormat }` without a capability
    /// call.
    pub async fn resolve<P: Provider>(&self, raw_address: &str, provider: Option<&P>) {
        let sequence = self.sequence.get() + 1;
        self.sequence.set(sequence);

        let address = match Address::from_hex(raw_address) {
            Ok(address) => address,
            Err(error) => {
                log::debug!("rejecting balance query for `{raw_address}': {error}");
                self.apply(sequence, BalanceState::Failed {
                    error: BalanceError::InvalidAddressFormat,
                });
                return;
            }
        };

        let Some(provider) = provider else {
            self.apply(sequence, BalanceState::Failed {
                error: BalanceError::ProviderUnavailable,
            });
            return;
        };

        self.apply(sequence, BalanceState::Pending { target: address });

        match provider.balance_of(&address).await {
            Ok(wei) => self.apply(sequence, BalanceState::Ready {
                target: address,
                value: wei.to_ether(),
            }),
            Err(error) => self.apply(sequence, BalanceState::Failed {
                error: BalanceError::NetworkQueryFailed(error),
            }),
        }
    }

    /// apply a query outcome, unless a newer query was issued since
    fn apply(&self, sequence: u64, next: BalanceState) {
        if sequence != self.sequence.get() {
            log::debug!("discarding stale balance outcome of request {sequence}");
            return;
        }
        *self.state.borrow_mut() = next;
    }
}

impl Default for BalanceResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        future::Future,
        pin::Pin,
        task::{Context, Poll},
    };

    use futures::{executor::block_on, join};

    use super::*;
    use crate::{
        error::{ProviderError, ProviderErrorCode},
        ethereum::{WEI_PER_ETHER, Wei},
        provider::mock::{MockProvider, test_address},
    };

    const ADDR_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const ADDR_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    /// suspend once and resume, to hand control back to sibling futures
    fn yield_now() -> impl Future<Output = ()> {
        struct YieldNow(bool);
        impl Future for YieldNow {
            type Output = ();
            fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
                if self.0 {
                    Poll::Ready(())
                } else {
                    self.0 = true;
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
            }
        }
        YieldNow(false)
    }

    #[test]
    fn starts_idle() {
        let resolver = BalanceResolver::new();
        assert_eq!(resolver.state(), BalanceState::Idle);
        assert_eq!(resolver.snapshot().status, BalanceStatus::Idle);
    }

    #[test]
    fn invalid_address_fails_without_any_capability_call() {
        let provider = MockProvider::new();
        let resolver = BalanceResolver::new();

        block_on(resolver.resolve("not-an-address", Some(&provider)));

        assert_eq!(resolver.state(), BalanceState::Failed {
            error: BalanceError::InvalidAddressFormat
        });
        assert_eq!(provider.balance_calls(), 0);
    }

    #[test]
    fn missing_capability() {
        let resolver = BalanceResolver::new();
        block_on(resolver.resolve(ADDR_A, Option::<&MockProvider>::None));

        assert_eq!(resolver.state(), BalanceState::Failed {
            error: BalanceError::ProviderUnavailable
        });
    }

    #[test]
    fn one_ether_formats_exactly_and_round_trips() {
        let provider = MockProvider::new();
        provider.push_balance(Ok(Wei::from(WEI_PER_ETHER)));
        let resolver = BalanceResolver::new();

        block_on(resolver.resolve(ADDR_A, Some(&provider)));

        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.status, BalanceStatus::Ready);
        assert_eq!(snapshot.value.as_deref(), Some("1.0"));

        // re-parsing the displayed value yields the base units back
        let value = snapshot.value.unwrap();
        assert_eq!(Wei::from_ether(&value).unwrap(), Wei::from(WEI_PER_ETHER));
    }

    #[test]
    fn query_failure_is_recorded() {
        let provider = MockProvider::new();
        let error = ProviderError {
            code: ProviderErrorCode::InternalError,
            message: "boom".to_owned(),
        };
        provider.push_balance(Err(error.clone()));
        let resolver = BalanceResolver::new();

        block_on(resolver.resolve(ADDR_A, Some(&provider)));

        assert_eq!(resolver.state(), BalanceState::Failed {
            error: BalanceError::NetworkQueryFailed(error)
        });

        // recoverable: the next query supersedes the failure
        provider.push_balance(Ok(Wei::from(0)));
        block_on(resolver.resolve(ADDR_A, Some(&provider)));
        assert_eq!(resolver.snapshot().status, BalanceStatus::Ready);
    }

    #[test]
    fn latest_issued_query_wins_whatever_the_completion_order() {
        let provider = MockProvider::new();
        let answer_first = provider.push_deferred_balance();
        let answer_second = provider.push_deferred_balance();
        let resolver = BalanceResolver::new();

        block_on(async {
            let first = resolver.resolve(ADDR_A, Some(&provider)); // sequence 1
            let second = resolver.resolve(ADDR_B, Some(&provider)); // sequence 2
            let driver = async {
                // both queries are in flight; let the second complete first
                answer_second.send(Ok(Wei::from(2 * WEI_PER_ETHER))).unwrap();
                yield_now().await;
                // the second outcome is applied by now; the first answers last
                assert_eq!(resolver.snapshot().value.as_deref(), Some("2.0"));
                answer_first.send(Ok(Wei::from(WEI_PER_ETHER))).unwrap();
            };
            join!(first, second, driver);
        });

        // the stale first outcome was discarded silently
        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.status, BalanceStatus::Ready);
        assert_eq!(snapshot.value.as_deref(), Some("2.0"));
        assert_eq!(resolver.state(), BalanceState::Ready {
            target: Address::from_hex(ADDR_B).unwrap(),
            value: "2.0".to_owned()
        });
        assert_eq!(provider.balance_calls(), 2);
    }

    #[test]
    fn completion_in_issuance_order_also_keeps_the_latest() {
        let provider = MockProvider::new();
        provider.push_balance(Ok(Wei::from(WEI_PER_ETHER)));
        provider.push_balance(Ok(Wei::from(3 * WEI_PER_ETHER)));
        let resolver = BalanceResolver::new();

        block_on(async {
            resolver.resolve(ADDR_A, Some(&provider)).await;
            resolver.resolve(ADDR_B, Some(&provider)).await;
        });

        assert_eq!(resolver.snapshot().value.as_deref(), Some("3.0"));
    }

    #[test]
    fn pending_while_in_flight() {
        let provider = MockProvider::new();
        let answer = provider.push_deferred_balance();
        let resolver = BalanceResolver::new();

        block_on(async {
            let query = resolver.resolve(ADDR_A, Some(&provider));
            let driver = async {
                assert_eq!(resolver.state(), BalanceState::Pending {
                    target: test_address(0xaa)
                });
                answer.send(Ok(Wei::from(0))).unwrap();
            };
            join!(query, driver);
        });

        assert_eq!(resolver.snapshot().status, BalanceStatus::Ready);
    }
}
