//! Checkout and order history commands.

use bramble_storefront::cart::{CartStore, FileCartStorage};
use bramble_storefront::checkout::{
    CheckoutCoordinator, HttpOrderGateway, HttpPaymentGateway, OrderGateway,
};
use bramble_storefront::config::StorefrontConfig;
use bramble_storefront::error::Result;

/// Pay for the cart and place the order.
///
/// Token fetch failures surface as an error; rerunning the command is the
/// retry. Unmet preconditions block submission without attempting it.
pub async fn run(config: &StorefrontConfig) -> Result<()> {
    let mut cart = CartStore::open(FileCartStorage::new(&config.cart_path));
    let customer = config.customer.clone();

    let payment = HttpPaymentGateway::new(config)?;
    let orders = HttpOrderGateway::new(config)?;
    let mut coordinator = CheckoutCoordinator::new(payment, orders);

    coordinator.fetch_token().await?;

    if let Some(unmet) = coordinator.blocked_by(&cart, &customer) {
        tracing::warn!("Checkout unavailable: {unmet}");
        return Ok(());
    }

    let confirmation = coordinator.submit(&mut cart, &customer).await?;

    tracing::info!("Payment completed successfully!");
    tracing::info!(
        "Order {} ({}) - {}",
        confirmation.order_id,
        confirmation.status,
        confirmation.total
    );

    // Land on the order-history view, like the web flow does after paying.
    show_history(coordinator.orders(), &customer).await;
    Ok(())
}

/// Show the customer's order history.
pub async fn history(config: &StorefrontConfig) -> Result<()> {
    let orders = HttpOrderGateway::new(config)?;
    show_history(&orders, &config.customer).await;
    Ok(())
}

async fn show_history(
    orders: &impl OrderGateway,
    customer: &bramble_storefront::config::CustomerProfile,
) {
    let rows = match orders.history(customer).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Failed to fetch order history: {e}");
            return;
        }
    };

    if rows.is_empty() {
        tracing::info!("No orders yet");
        return;
    }

    tracing::info!("Your orders:");
    for order in &rows {
        tracing::info!(
            "{}  {}  {}  {}",
            order.order_id,
            order.placed_at.format("%Y-%m-%d"),
            order.status,
            order.total
        );
    }
}
