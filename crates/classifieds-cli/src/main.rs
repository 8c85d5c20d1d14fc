mod browse;
mod location;
mod wishlist;

use clap::{Parser, Subcommand};
use classifieds_client::{MarketplaceClient, SessionToken};
use classifieds_core::{AppConfig, CategoriesFile, CategoryConfig};
use tracing_subscriber::EnvFilter;

use crate::location::LocationCommands;
use crate::wishlist::WishlistCommands;

#[derive(Debug, Parser)]
#[command(name = "classifieds")]
#[command(about = "Browse a classifieds marketplace from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the configured categories
    Categories,
    /// Fetch a category feed, optionally filtered, across one or more pages
    Browse {
        /// Category slug (e.g. cars)
        category: String,
        /// Filter entry as key=value; repeatable
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: u32,
        /// Print the listings as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the banner images for a category
    Sliders {
        /// Category slug (e.g. cars)
        category: String,
    },
    /// Wishlist operations (requires CLASSIFIEDS_AUTH_TOKEN)
    Wishlist {
        #[command(subcommand)]
        command: WishlistCommands,
    },
    /// Manage the stored location used to geo-filter feeds
    Location {
        #[command(subcommand)]
        command: LocationCommands,
    },
}

/// Parses `key=value`. The value may be empty; the key may not.
fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("filter key is empty in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub(crate) fn build_client(config: &AppConfig) -> anyhow::Result<MarketplaceClient> {
    let client = MarketplaceClient::new(
        &config.api_base_url,
        config.request_timeout_secs,
        &config.user_agent,
        SessionToken::new(config.auth_token.clone()),
    )?;
    Ok(client)
}

pub(crate) fn find_category<'a>(
    categories: &'a CategoriesFile,
    slug: &str,
) -> anyhow::Result<&'a CategoryConfig> {
    categories.find(slug).ok_or_else(|| {
        anyhow::anyhow!("category '{slug}' not found; run `classifieds categories` to list them")
    })
}

/// Shortens `text` to `max` characters, marking the cut with `...`.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = classifieds_core::load_app_config_from_env()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let load_categories = || classifieds_core::load_categories(&config.categories_path);

    match cli.command {
        Some(Commands::Categories) => {
            let categories = load_categories()?;
            println!("{:<14}{:<6}{:<14}NAME", "SLUG", "ID", "WISHABLE");
            for c in &categories.categories {
                println!(
                    "{:<14}{:<6}{:<14}{}",
                    c.slug, c.category_id, c.wishable_type, c.name
                );
            }
        }
        Some(Commands::Browse {
            category,
            filters,
            pages,
            json,
        }) => {
            let categories = load_categories()?;
            let category = find_category(&categories, &category)?;
            browse::run_browse(&config, category, &filters, pages, json).await?;
        }
        Some(Commands::Sliders { category }) => {
            let categories = load_categories()?;
            let category = find_category(&categories, &category)?;
            browse::run_sliders(&config, category).await?;
        }
        Some(Commands::Wishlist { command }) => {
            let categories = load_categories()?;
            wishlist::run_wishlist(&config, &categories, command).await?;
        }
        Some(Commands::Location { command }) => location::run_location(&config, &command)?,
        None => println!("classifieds: no command given; run with --help"),
    }

    Ok(())
}
