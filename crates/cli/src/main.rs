//! Bramble CLI - Command-line storefront client.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! bramble products --page 1
//! bramble product canvas-tote
//!
//! # Work the cart (persisted between invocations)
//! bramble cart add canvas-tote --attr Size=Large
//! bramble cart show
//!
//! # Place the order
//! bramble checkout
//! ```
//!
//! # Commands
//!
//! - `products` / `product` / `categories` / `search` - catalog reads
//! - `cart` - cart mutations and display
//! - `checkout` - payment and order submission
//! - `orders` - order history

#![cfg_attr(not(test), forbid(unsafe_code))]

use bramble_core::LineItemId;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use bramble_storefront::config::StorefrontConfig;
use bramble_storefront::error::Result;

#[derive(Parser)]
#[command(name = "bramble")]
#[command(author, version, about = "Bramble storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Page of the product list
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one product with its variant attributes
    Product {
        /// Product slug
        slug: String,
    },
    /// List categories
    Categories,
    /// Search products by category and price range
    Search {
        /// Category IDs to filter by (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Minimum price
        #[arg(long)]
        min: Option<Decimal>,

        /// Maximum price
        #[arg(long)]
        max: Option<Decimal>,

        /// Page of the result list
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Inspect or mutate the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Pay for the cart and place the order
    Checkout,
    /// Show order history
    Orders,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart with line prices and the total
    Show,
    /// Add a product to the cart
    Add {
        /// Product slug
        slug: String,

        /// Attribute selection as key=value (repeatable); unspecified
        /// attributes get the product's first option
        #[arg(long = "attr")]
        attrs: Vec<String>,
    },
    /// Remove every line item for a product
    Remove {
        /// Product ID
        product_id: String,
    },
    /// Remove a single line item
    RemoveLine {
        /// Line item ID
        line_id: LineItemId,
    },
    /// Change an attribute selection on every line item for a product
    SetAttr {
        /// Product ID
        product_id: String,

        /// Attribute key (e.g., Size)
        key: String,

        /// Option value (e.g., Large)
        value: String,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    // Initialize tracing with EnvFilter.
    // Defaults to info level for our crates if RUST_LOG is not set.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bramble=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = StorefrontConfig::from_env()?;

    match cli.command {
        Commands::Products { page } => commands::catalog::list_products(&config, page).await?,
        Commands::Product { slug } => commands::catalog::show_product(&config, &slug).await?,
        Commands::Categories => commands::catalog::list_categories(&config).await?,
        Commands::Search {
            categories,
            min,
            max,
            page,
        } => commands::catalog::search(&config, categories, min, max, page).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&config),
            CartAction::Add { slug, attrs } => {
                commands::cart::add(&config, &slug, &attrs).await?;
            }
            CartAction::Remove { product_id } => commands::cart::remove(&config, &product_id)?,
            CartAction::RemoveLine { line_id } => {
                commands::cart::remove_line(&config, line_id)?;
            }
            CartAction::SetAttr {
                product_id,
                key,
                value,
            } => commands::cart::set_attribute(&config, &product_id, &key, &value)?,
            CartAction::Clear => commands::cart::clear(&config)?,
        },
        Commands::Checkout => commands::checkout::run(&config).await?,
        Commands::Orders => commands::checkout::history(&config).await?,
    }
    Ok(())
}
