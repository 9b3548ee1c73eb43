//! Feed source configuration.
//!
//! Each source is resolved from the command line first, then the
//! environment (a `.env` file is loaded at startup), then a built-in default.

use std::fmt;

pub const DEFAULT_STATIONS_SOURCE: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-stations.json";
pub const DEFAULT_TRIPS_SOURCE: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-traffic-2024-03.csv";

pub const STATIONS_SOURCE_VAR: &str = "STATIONS_SOURCE";
pub const TRIPS_SOURCE_VAR: &str = "TRIPS_SOURCE";

/// Where to load the two feeds from. Either may be a URL or a local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub stations_source: String,
    pub trips_source: String,
}

impl FeedConfig {
    /// Resolves sources against the process environment.
    pub fn resolve(stations: Option<String>, trips: Option<String>) -> Self {
        Self::resolve_with(stations, trips, |key| std::env::var(key).ok())
    }

    /// Resolves sources using `lookup` in place of the process environment.
    /// Empty values count as unset.
    pub fn resolve_with(
        stations: Option<String>,
        trips: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let set = |value: &String| !value.trim().is_empty();
        let pick = |flag: Option<String>, var: &str, default: &str| {
            flag.filter(set)
                .or_else(|| lookup(var).filter(set))
                .unwrap_or_else(|| default.to_string())
        };

        FeedConfig {
            stations_source: pick(stations, STATIONS_SOURCE_VAR, DEFAULT_STATIONS_SOURCE),
            trips_source: pick(trips, TRIPS_SOURCE_VAR, DEFAULT_TRIPS_SOURCE),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            stations_source: DEFAULT_STATIONS_SOURCE.to_string(),
            trips_source: DEFAULT_TRIPS_SOURCE.to_string(),
        }
    }
}

impl fmt::Display for FeedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stations={} trips={}", self.stations_source, self.trips_source)
    }
}
