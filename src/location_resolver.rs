//! Address to coordinate resolution
//!
//! Raw `lat,lon` input is accepted as is; everything else goes to the
//! Nominatim search API.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::Result;
use crate::client::{build_http_client, ensure_success};
use crate::config::GeocodingConfig;
use crate::error::CitySenseError;
use crate::models::Location;

/// What the user typed into the address box
#[derive(Debug, Clone, PartialEq)]
pub enum AddressInput {
    /// A `lat,lon` (or `lat lon`) pair within range
    Coordinates { latitude: f64, longitude: f64 },
    /// Anything else, sent to the geocoder verbatim
    Query(String),
}

impl AddressInput {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CitySenseError::validation("Address cannot be empty"));
        }

        Ok(match coordinate_pair(input) {
            Some((latitude, longitude)) => AddressInput::Coordinates {
                latitude,
                longitude,
            },
            None => AddressInput::Query(input.to_string()),
        })
    }
}

fn coordinate_pair(input: &str) -> Option<(f64, f64)> {
    let mut numbers = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::parse::<f64>);

    let latitude = numbers.next()?.ok()?;
    let longitude = numbers.next()?.ok()?;
    if numbers.next().is_some() {
        return None;
    }

    ((-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude))
        .then_some((latitude, longitude))
}

/// Turns an address into coordinates
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// `Ok(None)` when the address is unknown; `Err` only on transport failure
    async fn resolve(&self, address: &str) -> Result<Option<Location>>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Parse a Nominatim `search` response, taking the first hit
pub fn parse_search_response(body: &str) -> Result<Option<(f64, f64)>> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body)
        .map_err(|e| CitySenseError::api(format!("Invalid geocoding response: {e}")))?;

    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let lat = place.lat.parse::<f64>().map_err(|_| {
        CitySenseError::api(format!("Invalid latitude in geocoding response: {}", place.lat))
    })?;
    let lon = place.lon.parse::<f64>().map_err(|_| {
        CitySenseError::api(format!("Invalid longitude in geocoding response: {}", place.lon))
    })?;

    if let Some(name) = place.display_name {
        debug!("Best geocoding match: {name}");
    }
    Ok(Some((lat, lon)))
}

/// Geocoder backed by the Nominatim (OpenStreetMap) search API
pub struct NominatimResolver {
    client: ClientWithMiddleware,
    base_url: String,
}

impl NominatimResolver {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = build_http_client(
            config.timeout_seconds,
            config.max_retries,
            Some(&config.user_agent),
        )?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    #[must_use]
    pub fn with_client(client: ClientWithMiddleware, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    async fn search(&self, query: &str) -> Result<Option<(f64, f64)>> {
        let response = self.client.get(self.search_url(query)).send().await?;
        let response = ensure_success(response, "Nominatim").await?;
        let body = response.text().await?;
        parse_search_response(&body)
    }
}

#[async_trait]
impl LocationResolver for NominatimResolver {
    #[tracing::instrument(name = "geocode", level = "debug", skip(self))]
    async fn resolve(&self, address: &str) -> Result<Option<Location>> {
        let query = match AddressInput::parse(address)? {
            AddressInput::Coordinates {
                latitude,
                longitude,
            } => {
                debug!("Address is a coordinate pair, skipping lookup");
                return Ok(Some(Location::new(address.trim(), latitude, longitude)));
            }
            AddressInput::Query(query) => query,
        };

        match self.search(&query).await {
            Ok(Some((lat, lon))) => {
                info!("Successfully geocoded: {address}");
                Ok(Some(Location::new(address.trim(), lat, lon)))
            }
            Ok(None) => {
                warn!("No geocoding results for: {address}");
                Ok(None)
            }
            Err(e) => {
                warn!("Geocoding error for {address}: {e}");
                Err(e)
            }
        }
    }
}
