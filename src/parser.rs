//! Parsers for the station JSON feed and the trip CSV feed.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::types::{Station, Trip};

/// Timestamp layouts seen in trip exports, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a trip timestamp as a wall-clock time.
///
/// Timestamps without an offset are taken as local already; RFC 3339
/// timestamps with an offset are converted to the local zone.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Local).naive_local())
        .map_err(|_| anyhow!("unparseable timestamp '{}'", raw))
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StationDocument {
    Wrapped { data: StationData },
    Bare(Vec<Station>),
}

#[derive(Deserialize)]
struct StationData {
    stations: Vec<Station>,
}

/// Decodes the station feed: `{"data": {"stations": [...]}}` or a bare array.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON of either shape.
pub fn parse_stations(bytes: &[u8]) -> Result<Vec<Station>> {
    let document: StationDocument =
        serde_json::from_slice(bytes).context("station feed is not a recognised station list")?;
    let stations = match document {
        StationDocument::Wrapped { data } => data.stations,
        StationDocument::Bare(stations) => stations,
    };
    debug!(stations = stations.len(), "Station feed parsed");
    Ok(stations)
}

/// Decodes the trip CSV feed.
///
/// # Errors
///
/// Fails on the first row that is missing a required column or carries an
/// unparseable timestamp; no partial trip list is returned.
pub fn parse_trips(bytes: &[u8]) -> Result<Vec<Trip>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut trips = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        // +2: one for the header line, one for 1-based numbering.
        let trip: Trip = result.with_context(|| format!("invalid trip on line {}", index + 2))?;
        trips.push(trip);
    }

    debug!(trips = trips.len(), "Trip feed parsed");
    Ok(trips)
}
