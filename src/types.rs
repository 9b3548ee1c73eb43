//! Data types shared by the loader, the bucketer and the aggregator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::buckets::minutes_since_midnight;
use crate::parser::deserialize_timestamp;

/// A single row of the trip feed.
///
/// Only the station ids and the two timestamps drive the traffic counts; the
/// remaining columns are carried along when the feed provides them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Trip {
    #[serde(default)]
    pub ride_id: Option<String>,
    #[serde(default)]
    pub rideable_type: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub started_at: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub ended_at: NaiveDateTime,
    #[serde(default)]
    pub start_station_id: String,
    #[serde(default)]
    pub end_station_id: String,
    #[serde(default)]
    pub member_casual: Option<String>,
}

impl Trip {
    pub fn new(
        start_station_id: &str,
        end_station_id: &str,
        started_at: NaiveDateTime,
        ended_at: NaiveDateTime,
    ) -> Self {
        Trip {
            ride_id: None,
            rideable_type: None,
            started_at,
            ended_at,
            start_station_id: start_station_id.to_string(),
            end_station_id: end_station_id.to_string(),
            member_casual: None,
        }
    }

    /// Minute of day (0..=1439) the trip left its start station.
    pub fn start_minute(&self) -> usize {
        minutes_since_midnight(&self.started_at)
    }

    /// Minute of day (0..=1439) the trip reached its end station.
    pub fn end_minute(&self) -> usize {
        minutes_since_midnight(&self.ended_at)
    }
}

/// Static station metadata from the station feed.
///
/// `lon` and `lat` are kept exactly as loaded (number, numeric string, or
/// anything else); fields the crate does not model are preserved in `extra`
/// so they survive into JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    #[serde(default, deserialize_with = "string_or_number")]
    pub short_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lon: Value,
    #[serde(default)]
    pub lat: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Station {
    pub fn new(short_name: &str, lon: impl Into<Value>, lat: impl Into<Value>) -> Self {
        Station {
            short_name: short_name.to_string(),
            name: None,
            lon: lon.into(),
            lat: lat.into(),
            extra: Map::new(),
        }
    }

    /// Returns `(lon, lat)` when both coordinates are numeric.
    ///
    /// A station without usable coordinates still takes part in aggregation;
    /// it just cannot be placed on the map.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((coordinate(&self.lon)?, coordinate(&self.lat)?))
    }
}

fn coordinate(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// A station together with the traffic it saw under one time filter.
///
/// Built fresh on every aggregation pass. The counts are private so that
/// `total_traffic` can never drift from `departures + arrivals`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationTraffic {
    #[serde(flatten)]
    station: Station,
    departures: usize,
    arrivals: usize,
    total_traffic: usize,
}

impl StationTraffic {
    pub fn new(station: Station, departures: usize, arrivals: usize) -> Self {
        StationTraffic {
            station,
            departures,
            arrivals,
            total_traffic: departures + arrivals,
        }
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    pub fn short_name(&self) -> &str {
        &self.station.short_name
    }

    pub fn departures(&self) -> usize {
        self.departures
    }

    pub fn arrivals(&self) -> usize {
        self.arrivals
    }

    pub fn total_traffic(&self) -> usize {
        self.total_traffic
    }

    /// Share of the station's traffic that were departures, or `None` when
    /// the station saw no traffic at all.
    pub fn departure_ratio(&self) -> Option<f64> {
        if self.total_traffic == 0 {
            None
        } else {
            Some(self.departures as f64 / self.total_traffic as f64)
        }
    }

    /// Hover text for the station marker.
    pub fn tooltip(&self) -> String {
        format!(
            "{} trips ({} departures, {} arrivals)",
            self.total_traffic, self.departures, self.arrivals
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coordinates_from_numbers_and_strings() {
        let numeric = Station::new("A", -71.09, 42.36);
        assert_eq!(numeric.coordinates(), Some((-71.09, 42.36)));

        let strings = Station::new("B", " -71.1", "42.3");
        assert_eq!(strings.coordinates(), Some((-71.1, 42.3)));
    }

    #[test]
    fn test_coordinates_malformed() {
        assert_eq!(Station::new("A", "west", 42.36).coordinates(), None);
        assert_eq!(Station::new("A", -71.0, Value::Null).coordinates(), None);
        assert_eq!(Station::new("A", "NaN", "1.0").coordinates(), None);
    }

    #[test]
    fn test_station_deserialize_keeps_extra_fields() {
        let station: Station = serde_json::from_value(json!({
            "short_name": 32012,
            "name": "Kendall T",
            "lon": "-71.0862",
            "lat": 42.3625,
            "capacity": 19
        }))
        .unwrap();

        assert_eq!(station.short_name, "32012");
        assert_eq!(station.name.as_deref(), Some("Kendall T"));
        assert_eq!(station.extra.get("capacity"), Some(&json!(19)));
        assert_eq!(station.coordinates(), Some((-71.0862, 42.3625)));
    }

    #[test]
    fn test_station_without_short_name_still_loads() {
        let stations: Vec<Station> = serde_json::from_value(json!([
            {"name": "No id", "lon": -71.0, "lat": 42.0},
            {"short_name": "A32012", "lon": -71.1, "lat": 42.1}
        ]))
        .unwrap();

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].short_name, "");
        assert_eq!(stations[1].short_name, "A32012");
    }

    #[test]
    fn test_station_traffic_total() {
        let traffic = StationTraffic::new(Station::new("A", 0, 0), 3, 4);
        assert_eq!(traffic.total_traffic(), 7);
        assert_eq!(traffic.tooltip(), "7 trips (3 departures, 4 arrivals)");
    }

    #[test]
    fn test_departure_ratio_zero_traffic() {
        let idle = StationTraffic::new(Station::new("A", 0, 0), 0, 0);
        assert_eq!(idle.departure_ratio(), None);

        let busy = StationTraffic::new(Station::new("A", 0, 0), 1, 3);
        assert_eq!(busy.departure_ratio(), Some(0.25));
    }

    #[test]
    fn test_station_traffic_serializes_flat() {
        let traffic = StationTraffic::new(Station::new("A", 1.5, 2.5), 2, 1);
        let value = serde_json::to_value(&traffic).unwrap();

        assert_eq!(value["short_name"], "A");
        assert_eq!(value["departures"], 2);
        assert_eq!(value["arrivals"], 1);
        assert_eq!(value["total_traffic"], 3);
    }
}
