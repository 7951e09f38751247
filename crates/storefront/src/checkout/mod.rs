//! Checkout coordination.
//!
//! # State machine
//!
//! ```text
//! Idle -> TokenFetching -> Ready -> Submitting -> Succeeded
//!           |    ^                     |
//!           v    |                     v
//!          Idle (token fetch failed)  Failed (re-armed to Ready on retry)
//! ```
//!
//! The coordinator owns the gateway handles and the session's client
//! token. A token fetch failure returns to `Idle` so the fetch can simply
//! be attempted again. A nonce or submission failure leaves the cart
//! intact and parks the machine in `Failed`; re-triggering `submit`
//! re-arms it. The cart is cleared only after the backend confirms the
//! order, and the nonce is always acquired before the order request goes
//! out.

pub mod gateway;
pub mod orders;

pub use gateway::{ClientToken, HttpPaymentGateway, PaymentError, PaymentGateway, PaymentNonce};
pub use orders::{HttpOrderGateway, OrderConfirmation, OrderError, OrderGateway};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::cart::{CartStorage, CartStore};
use crate::config::CustomerProfile;

/// Position of the checkout state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// No client token yet.
    Idle,
    /// Token request in flight.
    TokenFetching,
    /// Token held; waiting for the user to submit.
    Ready,
    /// Nonce acquisition or order submission in flight.
    Submitting,
    /// Order placed and cart cleared.
    Succeeded,
    /// Last submission failed; cart intact, retry allowed.
    Failed,
}

/// A checkout precondition that is not currently met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("cart is empty")]
    EmptyCart,
    #[error("customer is not signed in")]
    NotAuthenticated,
    #[error("no delivery address on file")]
    MissingDeliveryAddress,
    #[error("payment is not ready")]
    PaymentNotReady,
}

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The payment token could not be fetched. Retryable: the coordinator
    /// is back in `Idle`.
    #[error("payment token fetch failed: {0}")]
    TokenFetch(#[source] PaymentError),

    /// The provider rejected the payment method.
    #[error("payment method rejected: {0}")]
    Nonce(#[source] PaymentError),

    /// The backend rejected or failed the order.
    #[error("order submission failed: {0}")]
    Submission(#[from] OrderError),

    /// A precondition blocks submission.
    #[error("checkout blocked: {0}")]
    Blocked(Precondition),

    /// Operation not valid in the current state.
    #[error("invalid checkout state: expected {expected}, was {actual:?}")]
    InvalidState {
        expected: &'static str,
        actual: CheckoutState,
    },
}

/// Drives a cart through payment to a confirmed order.
#[derive(Debug)]
pub struct CheckoutCoordinator<P, O> {
    payment: P,
    orders: O,
    state: CheckoutState,
    token: Option<ClientToken>,
}

impl<P: PaymentGateway, O: OrderGateway> CheckoutCoordinator<P, O> {
    /// Create a coordinator in `Idle`.
    pub const fn new(payment: P, orders: O) -> Self {
        Self {
            payment,
            orders,
            state: CheckoutState::Idle,
            token: None,
        }
    }

    /// Current state machine position.
    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    /// The order gateway, for reads outside the submission flow (order
    /// history).
    #[must_use]
    pub const fn orders(&self) -> &O {
        &self.orders
    }

    /// Fetch the session's client token: `Idle -> TokenFetching -> Ready`.
    ///
    /// On failure the coordinator returns to `Idle`, so callers retry by
    /// calling this again.
    ///
    /// # Errors
    ///
    /// Returns `TokenFetch` if the token service fails, or `InvalidState`
    /// when not in `Idle`.
    pub async fn fetch_token(&mut self) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::Idle {
            return Err(CheckoutError::InvalidState {
                expected: "Idle",
                actual: self.state,
            });
        }

        self.state = CheckoutState::TokenFetching;
        match self.payment.client_token().await {
            Ok(token) => {
                self.token = Some(token);
                self.state = CheckoutState::Ready;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "payment token fetch failed");
                self.state = CheckoutState::Idle;
                Err(CheckoutError::TokenFetch(e))
            }
        }
    }

    /// The first unmet submission precondition, if any.
    ///
    /// The rendering layer disables the submit action while this returns
    /// `Some`; `submit` enforces the same checks.
    #[must_use]
    pub fn blocked_by<S: CartStorage>(
        &self,
        cart: &CartStore<S>,
        customer: &CustomerProfile,
    ) -> Option<Precondition> {
        if cart.is_empty() {
            return Some(Precondition::EmptyCart);
        }
        if !customer.is_authenticated() {
            return Some(Precondition::NotAuthenticated);
        }
        if customer.delivery_address.is_none() {
            return Some(Precondition::MissingDeliveryAddress);
        }

        let payment_ready = matches!(
            self.state,
            CheckoutState::Ready | CheckoutState::Failed
        ) && self.token.is_some();
        if !payment_ready {
            return Some(Precondition::PaymentNotReady);
        }
        None
    }

    /// Submit the cart as an order.
    ///
    /// Acquires a nonce, then posts the order; the cart (memory and
    /// persisted document) is cleared only after the backend confirms.
    /// A failed attempt leaves the cart intact in `Failed`; calling
    /// `submit` again re-arms and retries.
    ///
    /// # Errors
    ///
    /// Returns `Blocked` without leaving `Ready` when a precondition is
    /// unmet, `Nonce` or `Submission` for provider/backend failures.
    pub async fn submit<S: CartStorage>(
        &mut self,
        cart: &mut CartStore<S>,
        customer: &CustomerProfile,
    ) -> Result<OrderConfirmation, CheckoutError> {
        if let Some(unmet) = self.blocked_by(cart, customer) {
            return Err(CheckoutError::Blocked(unmet));
        }
        let Some(token) = self.token.clone() else {
            return Err(CheckoutError::Blocked(Precondition::PaymentNotReady));
        };

        self.state = CheckoutState::Submitting;

        let nonce = match self.payment.request_nonce(&token).await {
            Ok(nonce) => nonce,
            Err(e) => {
                error!(error = %e, "payment nonce request failed");
                self.state = CheckoutState::Failed;
                return Err(CheckoutError::Nonce(e));
            }
        };

        match self.orders.submit(&nonce, cart.items(), customer).await {
            Ok(confirmation) => {
                // The order exists on the backend now; a failure to clear
                // the local cart must not turn success into an error.
                if let Err(e) = cart.clear() {
                    error!(error = %e, "order placed but clearing the persisted cart failed");
                }
                self.state = CheckoutState::Succeeded;
                info!(order_id = %confirmation.order_id, "order placed");
                Ok(confirmation)
            }
            Err(e) => {
                error!(error = %e, "order submission failed");
                self.state = CheckoutState::Failed;
                Err(CheckoutError::Submission(e))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use bramble_core::{CurrencyCode, Money, OrderId, OrderStatus, ProductId};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use secrecy::SecretString;

    use super::*;
    use crate::cart::{MemoryCartStorage, ProductSnapshot};

    #[derive(Default)]
    struct FakePayment {
        fail_token: AtomicBool,
        fail_nonce: AtomicBool,
        nonce_requests: AtomicU32,
    }

    impl PaymentGateway for &FakePayment {
        async fn client_token(&self) -> Result<ClientToken, PaymentError> {
            if self.fail_token.load(Ordering::SeqCst) {
                return Err(PaymentError::Api {
                    status: 503,
                    message: "token service down".to_string(),
                });
            }
            Ok(ClientToken::new("sandbox-token"))
        }

        async fn request_nonce(&self, _token: &ClientToken) -> Result<PaymentNonce, PaymentError> {
            self.nonce_requests.fetch_add(1, Ordering::SeqCst);
            if self.fail_nonce.load(Ordering::SeqCst) {
                return Err(PaymentError::Api {
                    status: 422,
                    message: "card declined".to_string(),
                });
            }
            Ok(PaymentNonce::new("fake-valid-nonce"))
        }
    }

    #[derive(Default)]
    struct FakeOrders {
        fail_submit: AtomicBool,
    }

    impl OrderGateway for &FakeOrders {
        async fn submit(
            &self,
            _nonce: &PaymentNonce,
            items: &[crate::cart::CartLineItem],
            _customer: &CustomerProfile,
        ) -> Result<OrderConfirmation, OrderError> {
            if self.fail_submit.load(Ordering::SeqCst) {
                return Err(OrderError::Api {
                    status: 500,
                    message: "order creation failed".to_string(),
                });
            }
            Ok(OrderConfirmation {
                order_id: OrderId::new("ord-1"),
                status: OrderStatus::NotProcessed,
                total: Money::new(
                    crate::cart::pricing::cart_total(items),
                    CurrencyCode::USD,
                ),
                placed_at: Utc::now(),
            })
        }

        async fn history(
            &self,
            _customer: &CustomerProfile,
        ) -> Result<Vec<OrderConfirmation>, OrderError> {
            Ok(Vec::new())
        }
    }

    fn customer() -> CustomerProfile {
        CustomerProfile {
            email: Some("jo@example.com".to_string()),
            delivery_address: Some("12 Fern Lane".to_string()),
            auth_token: Some(SecretString::from("token-abc")),
        }
    }

    fn snapshot() -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new("p1"),
            name: "Canvas Tote".to_string(),
            slug: "canvas-tote".to_string(),
            price: Decimal::new(2000, 2),
            attributes: Vec::new(),
        }
    }

    fn cart_with_items(count: usize) -> CartStore<MemoryCartStorage> {
        let mut cart = CartStore::open(MemoryCartStorage::new());
        for _ in 0..count {
            cart.add_with_defaults(snapshot()).unwrap();
        }
        cart
    }

    #[tokio::test]
    async fn test_token_fetch_moves_to_ready() {
        let payment = FakePayment::default();
        let orders = FakeOrders::default();
        let mut coordinator = CheckoutCoordinator::new(&payment, &orders);

        assert_eq!(coordinator.state(), CheckoutState::Idle);
        coordinator.fetch_token().await.unwrap();
        assert_eq!(coordinator.state(), CheckoutState::Ready);
    }

    #[tokio::test]
    async fn test_token_fetch_failure_is_retryable() {
        let payment = FakePayment::default();
        payment.fail_token.store(true, Ordering::SeqCst);
        let orders = FakeOrders::default();
        let mut coordinator = CheckoutCoordinator::new(&payment, &orders);

        let err = coordinator.fetch_token().await.unwrap_err();
        assert!(matches!(err, CheckoutError::TokenFetch(_)));
        assert_eq!(coordinator.state(), CheckoutState::Idle);

        payment.fail_token.store(false, Ordering::SeqCst);
        coordinator.fetch_token().await.unwrap();
        assert_eq!(coordinator.state(), CheckoutState::Ready);
    }

    #[tokio::test]
    async fn test_token_fetch_rejected_outside_idle() {
        let payment = FakePayment::default();
        let orders = FakeOrders::default();
        let mut coordinator = CheckoutCoordinator::new(&payment, &orders);

        coordinator.fetch_token().await.unwrap();
        let err = coordinator.fetch_token().await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_preconditions_checked_in_order() {
        let payment = FakePayment::default();
        let orders = FakeOrders::default();
        let coordinator = CheckoutCoordinator::new(&payment, &orders);

        let empty = CartStore::open(MemoryCartStorage::new());
        assert_eq!(
            coordinator.blocked_by(&empty, &customer()),
            Some(Precondition::EmptyCart)
        );

        let cart = cart_with_items(1);
        let anonymous = CustomerProfile::default();
        assert_eq!(
            coordinator.blocked_by(&cart, &anonymous),
            Some(Precondition::NotAuthenticated)
        );

        let no_address = CustomerProfile {
            delivery_address: None,
            ..customer()
        };
        assert_eq!(
            coordinator.blocked_by(&cart, &no_address),
            Some(Precondition::MissingDeliveryAddress)
        );

        // All customer preconditions met, but no token fetched yet.
        assert_eq!(
            coordinator.blocked_by(&cart, &customer()),
            Some(Precondition::PaymentNotReady)
        );
    }

    #[tokio::test]
    async fn test_blocked_submit_requests_no_nonce() {
        let payment = FakePayment::default();
        let orders = FakeOrders::default();
        let mut coordinator = CheckoutCoordinator::new(&payment, &orders);
        coordinator.fetch_token().await.unwrap();

        let mut empty = CartStore::open(MemoryCartStorage::new());
        let err = coordinator.submit(&mut empty, &customer()).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Blocked(Precondition::EmptyCart)
        ));
        assert_eq!(coordinator.state(), CheckoutState::Ready);
        assert_eq!(payment.nonce_requests.load(Ordering::SeqCst), 0);
    }
}
