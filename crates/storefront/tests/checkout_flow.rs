//! End-to-end checkout flows over in-memory fakes.
//!
//! These cover the contract between the cart store and the checkout
//! coordinator: what gets submitted, when the cart is cleared, and what
//! survives a failed attempt.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use bramble_core::{CurrencyCode, Money, OrderId, OrderStatus, ProductId};
use bramble_storefront::cart::{
    CartLineItem, CartStore, MemoryCartStorage, ProductSnapshot, pricing,
};
use bramble_storefront::checkout::{
    CheckoutCoordinator, CheckoutError, CheckoutState, ClientToken, OrderConfirmation, OrderError,
    OrderGateway, PaymentError, PaymentGateway, PaymentNonce, Precondition,
};
use bramble_storefront::config::CustomerProfile;
use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;

#[derive(Default)]
struct FakePayment {
    fail_nonce: AtomicBool,
}

impl PaymentGateway for &FakePayment {
    async fn client_token(&self) -> Result<ClientToken, PaymentError> {
        Ok(ClientToken::new("sandbox-token"))
    }

    async fn request_nonce(&self, _token: &ClientToken) -> Result<PaymentNonce, PaymentError> {
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
    submitted: Mutex<Vec<Vec<CartLineItem>>>,
}

impl OrderGateway for &FakeOrders {
    async fn submit(
        &self,
        _nonce: &PaymentNonce,
        items: &[CartLineItem],
        _customer: &CustomerProfile,
    ) -> Result<OrderConfirmation, OrderError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(OrderError::Api {
                status: 500,
                message: "order creation failed".to_string(),
            });
        }

        self.submitted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(items.to_vec());

        Ok(OrderConfirmation {
            order_id: OrderId::new("ord-81422"),
            status: OrderStatus::NotProcessed,
            total: Money::new(pricing::cart_total(items), CurrencyCode::USD),
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

fn snapshot(id: &str, cents: i64) -> ProductSnapshot {
    ProductSnapshot {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        slug: format!("product-{id}"),
        price: Decimal::new(cents, 2),
        attributes: Vec::new(),
    }
}

fn two_item_cart(storage: MemoryCartStorage) -> CartStore<MemoryCartStorage> {
    let mut cart = CartStore::open(storage);
    cart.add_with_defaults(snapshot("p1", 2000)).unwrap();
    cart.add_with_defaults(snapshot("p2", 1050)).unwrap();
    cart
}

#[tokio::test]
async fn successful_checkout_clears_cart_and_storage() {
    let payment = FakePayment::default();
    let orders = FakeOrders::default();
    let storage = MemoryCartStorage::new();
    let mut cart = two_item_cart(storage.clone());

    let mut coordinator = CheckoutCoordinator::new(&payment, &orders);
    coordinator.fetch_token().await.unwrap();

    let confirmation = coordinator.submit(&mut cart, &customer()).await.unwrap();

    assert_eq!(coordinator.state(), CheckoutState::Succeeded);
    assert!(cart.is_empty());
    assert!(storage.raw().is_none());
    assert_eq!(confirmation.total.amount, Decimal::new(3050, 2));

    let submitted = orders
        .submitted
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].len(), 2);
}

#[tokio::test]
async fn nonce_failure_keeps_cart_intact() {
    let payment = FakePayment::default();
    payment.fail_nonce.store(true, Ordering::SeqCst);
    let orders = FakeOrders::default();
    let storage = MemoryCartStorage::new();
    let mut cart = two_item_cart(storage.clone());

    let mut coordinator = CheckoutCoordinator::new(&payment, &orders);
    coordinator.fetch_token().await.unwrap();

    let err = coordinator.submit(&mut cart, &customer()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Nonce(_)));
    assert_eq!(coordinator.state(), CheckoutState::Failed);
    assert_eq!(cart.len(), 2);

    // Persisted state survives too: a reopened cart still has both items.
    let reopened = CartStore::open(storage);
    assert_eq!(reopened.len(), 2);
}

#[tokio::test]
async fn failed_attempt_can_be_retried() {
    let payment = FakePayment::default();
    payment.fail_nonce.store(true, Ordering::SeqCst);
    let orders = FakeOrders::default();
    let storage = MemoryCartStorage::new();
    let mut cart = two_item_cart(storage.clone());

    let mut coordinator = CheckoutCoordinator::new(&payment, &orders);
    coordinator.fetch_token().await.unwrap();

    coordinator.submit(&mut cart, &customer()).await.unwrap_err();
    assert_eq!(coordinator.state(), CheckoutState::Failed);

    // Re-triggering the user action retries the whole submission.
    payment.fail_nonce.store(false, Ordering::SeqCst);
    coordinator.submit(&mut cart, &customer()).await.unwrap();
    assert_eq!(coordinator.state(), CheckoutState::Succeeded);
    assert!(cart.is_empty());
    assert!(storage.raw().is_none());
}

#[tokio::test]
async fn submission_failure_keeps_cart_intact() {
    let payment = FakePayment::default();
    let orders = FakeOrders::default();
    orders.fail_submit.store(true, Ordering::SeqCst);
    let storage = MemoryCartStorage::new();
    let mut cart = two_item_cart(storage.clone());

    let mut coordinator = CheckoutCoordinator::new(&payment, &orders);
    coordinator.fetch_token().await.unwrap();

    let err = coordinator.submit(&mut cart, &customer()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Submission(_)));
    assert_eq!(coordinator.state(), CheckoutState::Failed);
    assert_eq!(cart.len(), 2);
    assert!(storage.raw().is_some());
}

#[tokio::test]
async fn empty_cart_never_submits() {
    let payment = FakePayment::default();
    let orders = FakeOrders::default();
    let mut cart = CartStore::open(MemoryCartStorage::new());

    let mut coordinator = CheckoutCoordinator::new(&payment, &orders);
    coordinator.fetch_token().await.unwrap();

    let err = coordinator.submit(&mut cart, &customer()).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Blocked(Precondition::EmptyCart)
    ));
    assert_eq!(coordinator.state(), CheckoutState::Ready);
    assert!(
        orders
            .submitted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_empty()
    );
}
