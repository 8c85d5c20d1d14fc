//! Feed and banner commands.

use std::sync::Arc;

use classifieds_core::{AppConfig, CategoryConfig, FeedState, Listing};
use classifieds_feed::{FeedConfig, FeedController, FetchOutcome, JsonFileStore, TracingInteraction};

use crate::{build_client, truncate};

/// Fetches page 1 of a category with the given filters, then keeps loading
/// until `pages` pages are in or the feed runs out.
///
/// The stored location, if any, is appended to every request.
///
/// # Errors
///
/// Returns an error if the client cannot be built or any page request fails.
pub(crate) async fn run_browse(
    config: &AppConfig,
    category: &CategoryConfig,
    filters: &[(String, String)],
    pages: u32,
    json: bool,
) -> anyhow::Result<()> {
    let mut selection = category.default_filter_state();
    for (key, value) in filters {
        if !category.filters.contains(key) {
            tracing::warn!(key = %key, category = %category.slug, "filter is not listed for this category");
        }
        selection.set(key.clone(), value.as_str());
    }

    let controller = Arc::new(FeedController::new(
        Arc::new(build_client(config)?),
        FeedConfig::for_category(category),
        Arc::new(JsonFileStore::new(&config.storage_path)),
        Arc::new(TracingInteraction),
    ));

    if let FetchOutcome::Failed(err) = controller.fetch(1, false, Some(selection.cleaned())).await {
        return Err(err.into());
    }
    for _ in 1..pages {
        match controller.load_more().await {
            None => break,
            Some(FetchOutcome::Failed(err)) => return Err(err.into()),
            Some(_) => {}
        }
    }

    let state = controller.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&state.items)?);
    } else {
        print_feed(category, &state);
    }
    Ok(())
}

fn print_feed(category: &CategoryConfig, state: &FeedState) {
    if state.items.is_empty() {
        println!("no {} listings match", category.name.to_lowercase());
        return;
    }
    print_listings(&state.items);
    println!();
    println!(
        "{} of {} shown (page {} of {}){}",
        state.items.len(),
        state.total,
        state.current_page,
        state.last_page,
        if state.has_more { "; more available" } else { "" }
    );
}

pub(crate) fn print_listings(items: &[Listing]) {
    println!("{:<10}{:<16}{:<4}TITLE", "ID", "PRICE", "FAV");
    for listing in items {
        println!(
            "{:<10}{:<16}{:<4}{}",
            listing.id.to_string(),
            truncate(&listing.price_label(), 14),
            if listing.wishlist { "*" } else { "" },
            truncate(listing.display_title(), 50)
        );
    }
}

/// Lists the banner images for a category.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the request fails.
pub(crate) async fn run_sliders(config: &AppConfig, category: &CategoryConfig) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let images = client.slider_images(category.category_id).await?;
    if images.is_empty() {
        println!("no slider images for {}", category.slug);
        return Ok(());
    }
    println!("{:<8}{:<30}IMAGE", "ID", "TITLE");
    for image in &images {
        println!(
            "{:<8}{:<30}{}",
            image.id.as_ref().map(ToString::to_string).unwrap_or_default(),
            truncate(image.title.as_deref().unwrap_or(""), 28),
            image.image.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
