//! Per-card favourite toggle.
//!
//! `is_favorite` changes only after the server confirms. While a request is
//! in flight the entry is pending and further toggles are ignored.

use std::sync::{Mutex, MutexGuard, PoisonError};

use classifieds_client::{ClientError, MarketplaceClient};
use classifieds_core::{Listing, WishlistEntry, WishlistKey};

use crate::interaction::{Interaction, NoticeLevel};

const REMOVED_MESSAGE: &str = "Removed from wishlist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// 401: the flag is unchanged and the login flow was opened.
    LoginRequired,
    /// Any other failure, with the message shown to the user.
    Failed(String),
    /// A toggle for this card was already in flight.
    Ignored,
}

pub struct WishlistToggle {
    key: WishlistKey,
    entry: Mutex<WishlistEntry>,
}

impl WishlistToggle {
    #[must_use]
    pub fn new(key: WishlistKey, is_favorite: bool) -> Self {
        Self {
            key,
            entry: Mutex::new(WishlistEntry {
                is_favorite,
                is_pending: false,
            }),
        }
    }

    /// Initial state comes from the listing's own `wishlist` flag.
    #[must_use]
    pub fn from_listing(listing: &Listing, wishable_type: &str) -> Self {
        Self::new(
            WishlistKey {
                wishable_type: wishable_type.to_owned(),
                wishable_id: listing.id.clone(),
            },
            listing.wishlist,
        )
    }

    #[must_use]
    pub fn key(&self) -> &WishlistKey {
        &self.key
    }

    #[must_use]
    pub fn entry(&self) -> WishlistEntry {
        *self.lock_entry()
    }

    fn lock_entry(&self) -> MutexGuard<'_, WishlistEntry> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes the listing if it is a favourite, adds it otherwise.
    pub async fn toggle(
        &self,
        client: &MarketplaceClient,
        interaction: &dyn Interaction,
    ) -> ToggleOutcome {
        let was_favorite = {
            let mut entry = self.lock_entry();
            if entry.is_pending {
                return ToggleOutcome::Ignored;
            }
            entry.is_pending = true;
            entry.is_favorite
        };

        let result = if was_favorite {
            client.remove_from_wishlist(&self.key).await
        } else {
            client.add_to_wishlist(&self.key).await
        };

        {
            let mut entry = self.lock_entry();
            entry.is_pending = false;
            if result.is_ok() {
                entry.is_favorite = !was_favorite;
            }
        }

        match result {
            Ok(message) if was_favorite => {
                tracing::debug!(id = %self.key.wishable_id, "removed from wishlist");
                interaction.notify(
                    NoticeLevel::Success,
                    message.as_deref().unwrap_or(REMOVED_MESSAGE),
                );
                ToggleOutcome::Removed
            }
            Ok(_) => {
                tracing::debug!(id = %self.key.wishable_id, "added to wishlist");
                ToggleOutcome::Added
            }
            Err(err) => self.report_failure(&err, interaction),
        }
    }

    fn report_failure(&self, err: &ClientError, interaction: &dyn Interaction) -> ToggleOutcome {
        if err.is_unauthorized() {
            tracing::info!(id = %self.key.wishable_id, "wishlist toggle needs login");
            interaction.notify(NoticeLevel::Warning, &err.user_message());
            interaction.open_login();
            return ToggleOutcome::LoginRequired;
        }
        tracing::warn!(id = %self.key.wishable_id, error = %err, "wishlist toggle failed");
        let message = err.user_message();
        interaction.notify(NoticeLevel::Error, &message);
        ToggleOutcome::Failed(message)
    }
}
