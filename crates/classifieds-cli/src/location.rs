//! The stored location that geo-filters every feed request.

use clap::Subcommand;
use classifieds_core::{AppConfig, Location};
use classifieds_feed::{JsonFileStore, LocationProvider, SELECTED_LOCATION_KEY};

/// Sub-commands available under `location`.
#[derive(Debug, Subcommand)]
pub enum LocationCommands {
    /// Store the location sent with feed requests
    Set {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
    },
    /// Print the stored location
    Show,
    /// Forget the stored location
    Clear,
}

/// Runs a `location` sub-command against the configured storage file.
///
/// # Errors
///
/// Returns an error if the coordinates are out of range or the storage file
/// cannot be read or written.
pub(crate) fn run_location(config: &AppConfig, command: &LocationCommands) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&config.storage_path);

    match command {
        LocationCommands::Set {
            lat,
            lng,
            address,
            city,
            state,
        } => {
            if !(-90.0..=90.0).contains(lat) || !(-180.0..=180.0).contains(lng) {
                anyhow::bail!("coordinates out of range: lat={lat}, lng={lng}");
            }
            let location = Location {
                latitude: *lat,
                longitude: *lng,
                address: address.clone(),
                city: city.clone(),
                state: state.clone(),
            };
            store.set(SELECTED_LOCATION_KEY, &location)?;
            tracing::info!(path = %store.path().display(), "location stored");
            println!("location set to {lat}, {lng}");
        }
        LocationCommands::Show => match store.current() {
            Some(loc) => {
                let place = [loc.address, loc.city, loc.state]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{}, {} {place}", loc.latitude, loc.longitude);
            }
            None => println!("no location stored"),
        },
        LocationCommands::Clear => {
            store.remove(SELECTED_LOCATION_KEY)?;
            println!("location cleared");
        }
    }

    Ok(())
}
