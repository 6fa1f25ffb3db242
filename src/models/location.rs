//! Location model for analyzed addresses and their coordinates

use serde::{Deserialize, Serialize};

/// A geographic location that has been analyzed
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Address or city name as entered by the user
    pub address: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(address: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            address: address.into(),
            latitude,
            longitude,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Cache key under which the forecast for this location is stored
    #[must_use]
    pub fn weather_cache_key(&self) -> String {
        weather_cache_key(self.latitude, self.longitude)
    }
}

/// Cache key for a forecast at the given coordinates
#[must_use]
pub fn weather_cache_key(latitude: f64, longitude: f64) -> String {
    format!("weather:{latitude:.4}:{longitude:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_cache_key() {
        let location = Location::new("Interlaken", 46.818_234, 8.227_456);
        assert_eq!(location.weather_cache_key(), "weather:46.8182:8.2275");
    }

    #[test]
    fn test_location_rounded_coordinates() {
        let location = Location::new("Test", 46.818_234, 8.227_456);
        let (lat, lon) = location.rounded_coordinates(2);
        assert_eq!(lat, 46.82);
        assert_eq!(lon, 8.23);
    }

    #[test]
    fn test_format_coordinates() {
        let location = Location::new("London, UK", 51.5074, -0.1278);
        assert_eq!(location.format_coordinates(), "51.5074, -0.1278");
    }
}
