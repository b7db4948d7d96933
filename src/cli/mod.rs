use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use nft_core::core::bits::{format_eth, CollectionId, CurrencyId, NftId, OrderId};

use crate::{
    app::{application::Application, config::CliOverrides},
    cart::{
        cart_events::CartError,
        slot::{CartAggregate, CartSlot},
        sort::SortCriterion,
    },
    service::collections::CollectionSortCriterion,
};

/// Command line interface definition
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Application command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, short)]
    pub config_path: Option<PathBuf>,

    /// API base URL override
    #[arg(long, short)]
    pub base_url: Option<String>,

    /// Access token override
    #[arg(long)]
    pub token: Option<String>,

    /// Order id override
    #[arg(long, short)]
    pub order_id: Option<OrderId>,

    /// Where to keep user preferences
    #[arg(long, short)]
    pub preferences_path: Option<PathBuf>,

    /// Log directory override
    #[arg(long, short)]
    pub log_path: Option<PathBuf>,

    /// Disable terminal logging
    #[arg(long, short)]
    pub term_log_off: bool,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            order_id: self.order_id.clone(),
            preferences_path: self.preferences_path.clone(),
            log_path: self.log_path.clone(),
            term_log_off: self.term_log_off.then_some(true),
        }
    }
}

/// Available application commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the cart once every item has loaded
    Cart {
        /// Sort by price, rating or name
        #[arg(long, short)]
        sort: Option<SortCriterion>,
    },
    /// Remove an item from the cart
    Remove { id: NftId },
    /// Pay for the cart
    Pay { currency_id: CurrencyId },
    /// List currencies accepted for payment
    Currencies,
    /// List NFT collections
    Collections {
        /// Order by name or count; the choice is remembered
        #[arg(long, short)]
        sort: Option<CollectionSortCriterion>,
    },
    /// Show one collection with its items
    Collection { id: CollectionId },
    /// Like or unlike an NFT
    Like { id: NftId },
    /// Put an NFT into the cart
    Add { id: NftId },
}

fn print_cart(aggregate: &CartAggregate) {
    if aggregate.is_empty() {
        println!("Cart is empty");
        return;
    }

    for slot in aggregate.slots() {
        match slot {
            CartSlot::Ready(detail) => println!(
                "{:<12} {:<24} {:>12}  {}",
                detail.id,
                detail.name,
                format_eth(detail.price),
                "*".repeat(detail.rating as usize)
            ),
            CartSlot::Pending(id) => println!("{:<12} loading...", id),
            CartSlot::Failed(..) => {
                if let Some(err) = CartError::from_slot(slot) {
                    println!("{:<12} {}", slot.id(), err.user_message());
                }
            }
        }
    }

    if let Some(footer) = aggregate.footer() {
        println!(
            "{} items, total {}{}",
            footer.item_count,
            format_eth(footer.total_price),
            if footer.can_pay { "" } else { " (cannot pay)" }
        );
    }
}

/// Execute one command against a started application.
pub async fn run_command(app: &mut Application, command: Commands) -> Result<()> {
    match command {
        // Without --sort the cart comes back in the order chosen last time
        Commands::Cart { sort } => {
            let aggregate = app.settled_cart(sort).await?;
            print_cart(&aggregate);
        }
        Commands::Remove { id } => {
            let aggregate = app.remove_item(id).await?;
            print_cart(&aggregate);
        }
        Commands::Pay { currency_id } => {
            app.settled_cart(None).await?;
            let mut checkout = app.checkout();
            checkout.load_currencies().await?;
            let currency = checkout.select_currency(currency_id)?;
            println!("Paying with {}", currency.display_name);
            checkout.pay().await?;
            println!("Payment complete");
        }
        Commands::Currencies => {
            let mut checkout = app.checkout();
            for currency in checkout.load_currencies().await? {
                println!(
                    "{:<6} {:<8} {}",
                    currency.id, currency.short_name, currency.display_name
                );
            }
        }
        Commands::Collections { sort } => {
            let browser = app.browser();
            let collections = match sort {
                Some(criterion) => browser.collections_sorted_by(criterion).await?,
                None => browser.collections().await?,
            };
            for collection in collections {
                println!(
                    "{:<6} {:<24} {} items",
                    collection.id,
                    collection.name,
                    collection.nfts.len()
                );
            }
        }
        Commands::Collection { id } => {
            let browser = app.browser();
            let collection = browser.collection(&id).await?;
            println!("{} by {}", collection.name, collection.author);
            for detail in browser.collection_items(&collection).await {
                println!("{:<12} {:<24} {:>12}", detail.id, detail.name, format_eth(detail.price));
            }
        }
        Commands::Like { id } => {
            let state = app.nft_state();
            state.refresh_likes().await?;
            let liked = state.toggle_like(&id).await?;
            println!("{} {}", id, if liked { "liked" } else { "unliked" });
        }
        Commands::Add { id } => {
            let item_ids = app.nft_state().set_in_cart(&id, true).await?;
            println!("Order has {} items", item_ids.len());
        }
    }
    Ok(())
}
