//! Hand a city off to the system map viewer.

use std::process::Command;

use crate::geocode::Geocoder;
use crate::types::{GeocodeError, Location};

const MAP_ZOOM: u8 = 12;

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
    #[error("Failed to start map viewer: {0}")]
    Launch(#[from] std::io::Error),
    #[error("Map viewer exited with {0}")]
    Exit(std::process::ExitStatus),
}

/// OpenStreetMap link with a marker at `location`
pub fn map_url(location: &Location) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={lat:.5}&mlon={lon:.5}#map={zoom}/{lat:.5}/{lon:.5}",
        lat = location.latitude,
        lon = location.longitude,
        zoom = MAP_ZOOM,
    )
}

pub trait MapLauncher {
    fn open(&self, url: &str) -> Result<(), MapError>;
}

/// Opens URLs with the platform's default handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMapLauncher;

impl MapLauncher for SystemMapLauncher {
    fn open(&self, url: &str) -> Result<(), MapError> {
        let mut command = opener_command(url);
        let status = command.status()?;
        if status.success() {
            Ok(())
        } else {
            Err(MapError::Exit(status))
        }
    }
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

// Not `cmd /C start`: cmd would split the URL at `&`
#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("rundll32");
    cmd.args(["url.dll,FileProtocolHandler", url]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

/// Geocode `city` and open it on a map. Returns the URL that was opened.
pub async fn open_city_in_maps(
    geocoder: &Geocoder,
    launcher: &dyn MapLauncher,
    city: &str,
) -> Result<String, MapError> {
    let location = geocoder.search(city).await.map_err(|e| {
        tracing::warn!("No map position for {}: {}", city, e);
        e
    })?;

    let url = map_url(&location);
    launcher.open(&url).map_err(|e| {
        tracing::warn!("Could not open map for {}: {}", city, e);
        e
    })?;

    tracing::info!("Opened map for {}", city);
    Ok(url)
}
