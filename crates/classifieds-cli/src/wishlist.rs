use clap::Subcommand;
use classifieds_core::{AppConfig, CategoriesFile, ListingId, WishlistKey};
use classifieds_feed::{ToggleOutcome, TracingInteraction, WishlistToggle};

use crate::browse::print_listings;
use crate::{build_client, find_category};

/// Sub-commands available under `wishlist`.
#[derive(Debug, Subcommand)]
pub enum WishlistCommands {
    /// Show one page of saved listings for a category
    List {
        /// Category slug (e.g. cars)
        category: String,
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// Add a listing to the wishlist, or remove it with --favorite
    Toggle {
        /// Category slug (e.g. cars)
        category: String,
        /// Listing id
        id: String,
        /// The listing is currently a favourite (toggle removes it)
        #[arg(long)]
        favorite: bool,
    },
}

/// Runs a `wishlist` sub-command.
///
/// # Errors
///
/// Returns an error if the category is unknown, the request fails, or the
/// API requires a login.
pub(crate) async fn run_wishlist(
    config: &AppConfig,
    categories: &CategoriesFile,
    command: WishlistCommands,
) -> anyhow::Result<()> {
    if config.auth_token.is_none() {
        tracing::warn!("CLASSIFIEDS_AUTH_TOKEN is not set; the API will likely answer 401");
    }
    let client = build_client(config)?;

    match command {
        WishlistCommands::List { category, page } => {
            let category = find_category(categories, &category)?;
            let wishlist = client.wishlist(page, &category.wishable_type).await?;
            if wishlist.items.is_empty() {
                println!("wishlist is empty for {}", category.slug);
                return Ok(());
            }
            print_listings(&wishlist.items);
            println!();
            println!(
                "page {}, {} saved{}",
                wishlist.current_page,
                wishlist.total,
                if wishlist.has_more { "; more available" } else { "" }
            );
        }
        WishlistCommands::Toggle {
            category,
            id,
            favorite,
        } => {
            let category = find_category(categories, &category)?;
            let toggle = WishlistToggle::new(
                WishlistKey {
                    wishable_type: category.wishable_type.clone(),
                    wishable_id: ListingId::from(id.as_str()),
                },
                favorite,
            );
            match toggle.toggle(&client, &TracingInteraction).await {
                ToggleOutcome::Added => println!("added {id} to wishlist"),
                ToggleOutcome::Removed => println!("removed {id} from wishlist"),
                ToggleOutcome::Ignored => println!("a toggle for {id} is already in flight"),
                ToggleOutcome::LoginRequired => {
                    anyhow::bail!("login required; set CLASSIFIEDS_AUTH_TOKEN and retry")
                }
                ToggleOutcome::Failed(message) => anyhow::bail!("wishlist update failed: {message}"),
            }
        }
    }

    Ok(())
}

