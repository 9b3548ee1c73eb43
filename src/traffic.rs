//! Per-station departure and arrival counts under a time filter.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::identifiers::normalize_station_id;
use crate::types::{Station, StationTraffic, Trip};

/// Counts trips per normalized station id, using `key` to pick which end of
/// the trip to attribute them to.
pub fn count_by_station(trips: &[Arc<Trip>], key: impl Fn(&Trip) -> &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for trip in trips {
        *counts.entry(normalize_station_id(key(trip.as_ref()))).or_default() += 1;
    }
    counts
}

/// Merges filtered departure and arrival counts onto the station list.
///
/// Returns one record per station, in station order. Trips whose station id
/// matches no station are dropped from the per-station view.
pub fn aggregate(
    stations: &[Station],
    departures: &[Arc<Trip>],
    arrivals: &[Arc<Trip>],
) -> Vec<StationTraffic> {
    let departure_counts = count_by_station(departures, |t| t.start_station_id.as_str());
    let arrival_counts = count_by_station(arrivals, |t| t.end_station_id.as_str());

    let result: Vec<StationTraffic> = stations
        .iter()
        .map(|station| {
            let id = normalize_station_id(&station.short_name);
            StationTraffic::new(
                station.clone(),
                departure_counts.get(&id).copied().unwrap_or(0),
                arrival_counts.get(&id).copied().unwrap_or(0),
            )
        })
        .collect();

    let station_ids: HashSet<String> = stations
        .iter()
        .map(|s| normalize_station_id(&s.short_name))
        .collect();
    debug!(
        stations = result.len(),
        departures = departures.len(),
        arrivals = arrivals.len(),
        unmatched_departures = unmatched_trips(&departure_counts, &station_ids),
        unmatched_arrivals = unmatched_trips(&arrival_counts, &station_ids),
        "Station traffic aggregated"
    );

    result
}

/// Trips counted under an id that no station carries.
fn unmatched_trips(counts: &HashMap<String, usize>, station_ids: &HashSet<String>) -> usize {
    counts
        .iter()
        .filter(|(id, _)| !station_ids.contains(*id))
        .map(|(_, count)| count)
        .sum()
}
