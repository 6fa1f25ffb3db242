//! City autocomplete backed by a GeoNames cities table

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::Result;
use crate::error::CitySenseError;

pub mod fuzzy;

// GeoNames "cities" dump columns
const NAME_COLUMN: usize = 1;
const LATITUDE_COLUMN: usize = 4;
const LONGITUDE_COLUMN: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// In-memory list of known cities, one entry per distinct name
#[derive(Debug, Clone, Default)]
pub struct CityIndex {
    cities: Vec<CitySuggestion>,
}

impl CityIndex {
    #[must_use]
    pub fn from_cities(cities: Vec<CitySuggestion>) -> Self {
        let mut seen = HashSet::new();
        let cities = cities
            .into_iter()
            .filter(|city| seen.insert(city.name.clone()))
            .collect();
        Self { cities }
    }

    /// Load a tab-separated GeoNames table from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            CitySenseError::config(format!(
                "Failed to open cities file '{}': {e}",
                path.display()
            ))
        })?;
        let index = Self::from_reader(file)?;
        info!("Loaded {} cities from {}", index.len(), path.display());
        Ok(index)
    }

    /// Parse a GeoNames table; rows without a name or valid coordinates are skipped
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut cities = Vec::new();
        let mut skipped = 0usize;

        for result in reader.records() {
            let record = result
                .map_err(|e| CitySenseError::general(format!("Failed to read cities table: {e}")))?;

            let name = record.get(NAME_COLUMN).map(str::trim).unwrap_or_default();
            let lat = record
                .get(LATITUDE_COLUMN)
                .and_then(|v| v.trim().parse::<f64>().ok());
            let lon = record
                .get(LONGITUDE_COLUMN)
                .and_then(|v| v.trim().parse::<f64>().ok());

            match (name.is_empty(), lat, lon) {
                (false, Some(lat), Some(lon)) => cities.push(CitySuggestion {
                    name: name.to_string(),
                    lat,
                    lon,
                }),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("Skipped {skipped} malformed city rows");
        }
        Ok(Self::from_cities(cities))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Best `limit` fuzzy matches scoring above `min_score`, best first.
    ///
    /// Queries shorter than `min_query_chars` return nothing. Matching is
    /// case-insensitive; ties keep table order.
    #[must_use]
    pub fn suggest(
        &self,
        query: &str,
        limit: usize,
        min_score: f64,
        min_query_chars: usize,
    ) -> Vec<CitySuggestion> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < min_query_chars || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f64, usize)> = self
            .cities
            .iter()
            .enumerate()
            .map(|(idx, city)| (fuzzy::score(&query, &city.name.to_lowercase()), idx))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        let results: Vec<CitySuggestion> = scored
            .into_iter()
            .take(limit)
            .filter(|(score, _)| *score > min_score)
            .map(|(_, idx)| self.cities[idx].clone())
            .collect();

        debug!("City suggestions for '{query}': {} results", results.len());
        results
    }
}
