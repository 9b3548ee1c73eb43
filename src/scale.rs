//! Visual scales derived from a traffic pass.
//!
//! Marker radius grows with the square root of traffic so that area, not
//! radius, tracks trip counts. Departure flow buckets a station into mostly
//! arriving, balanced, or mostly departing.

use serde::Serialize;

use crate::types::StationTraffic;
use crate::window::TimeFilter;

/// Radius range when every trip is shown.
pub const ALL_TRIPS_RANGE: (f64, f64) = (3.0, 25.0);
/// Radius range when a time window is active; a narrow window has fewer
/// trips, so markers get more room to differ.
pub const FILTERED_RANGE: (f64, f64) = (3.0, 50.0);

/// Square-root scale from `[0, max_traffic]` onto a radius range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadiusScale {
    max_traffic: usize,
    range: (f64, f64),
}

impl RadiusScale {
    pub fn new(max_traffic: usize, range: (f64, f64)) -> Self {
        RadiusScale { max_traffic, range }
    }

    /// Scale for one aggregation pass: domain tops out at the busiest station.
    pub fn for_stations(stations: &[StationTraffic], filter: TimeFilter) -> Self {
        let max_traffic = stations
            .iter()
            .map(StationTraffic::total_traffic)
            .max()
            .unwrap_or(0);
        let range = if filter.is_active() {
            FILTERED_RANGE
        } else {
            ALL_TRIPS_RANGE
        };
        Self::new(max_traffic, range)
    }

    pub fn max_traffic(&self) -> usize {
        self.max_traffic
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Maps a traffic count onto a radius. An all-zero domain maps every
    /// value to the middle of the range.
    pub fn radius(&self, total_traffic: usize) -> f64 {
        let (low, high) = self.range;
        let t = if self.max_traffic == 0 {
            0.5
        } else {
            (total_traffic as f64).sqrt() / (self.max_traffic as f64).sqrt()
        };
        low + (high - low) * t
    }
}

/// Quantizes a departure ratio in [0, 1] to 0, 0.5 or 1. Out-of-range
/// ratios land in the nearest end step.
///
/// Thresholds sit at 1/3 and 2/3; a value exactly on a threshold takes the
/// upper step.
pub fn departure_flow(ratio: f64) -> f64 {
    const STEPS: [f64; 3] = [0.0, 0.5, 1.0];
    const THRESHOLDS: [f64; 2] = [1.0 / 3.0, 2.0 / 3.0];
    let index = THRESHOLDS.iter().filter(|&&t| ratio >= t).count();
    STEPS[index]
}

impl StationTraffic {
    /// Departure flow step for the station, `None` when it saw no traffic.
    pub fn departure_flow(&self) -> Option<f64> {
        self.departure_ratio().map(departure_flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Station;

    fn traffic(departures: usize, arrivals: usize) -> StationTraffic {
        StationTraffic::new(Station::new("A", 0, 0), departures, arrivals)
    }

    #[test]
    fn test_range_depends_on_filter() {
        let stations = vec![traffic(4, 0), traffic(1, 0)];

        let all = RadiusScale::for_stations(&stations, TimeFilter::Disabled);
        assert_eq!(all.range(), (3.0, 25.0));
        assert_eq!(all.max_traffic(), 4);

        let filtered = RadiusScale::for_stations(&stations, TimeFilter::Minute(480));
        assert_eq!(filtered.range(), (3.0, 50.0));
    }

    #[test]
    fn test_radius_is_sqrt() {
        let scale = RadiusScale::new(100, (3.0, 25.0));
        assert_eq!(scale.radius(0), 3.0);
        assert_eq!(scale.radius(100), 25.0);
        assert!((scale.radius(25) - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_radius_with_empty_domain() {
        let scale = RadiusScale::for_stations(&[traffic(0, 0)], TimeFilter::Disabled);
        assert_eq!(scale.radius(0), 14.0);

        let none = RadiusScale::for_stations(&[], TimeFilter::Minute(0));
        assert_eq!(none.max_traffic(), 0);
        assert_eq!(none.radius(0), 26.5);
    }

    #[test]
    fn test_departure_flow_steps() {
        assert_eq!(departure_flow(0.0), 0.0);
        assert_eq!(departure_flow(0.3), 0.0);
        assert_eq!(departure_flow(1.0 / 3.0), 0.5);
        assert_eq!(departure_flow(0.5), 0.5);
        assert_eq!(departure_flow(0.7), 1.0);
        assert_eq!(departure_flow(1.0), 1.0);
        assert_eq!(departure_flow(1.5), 1.0);
        assert_eq!(departure_flow(-0.5), 0.0);
    }

    #[test]
    fn test_station_departure_flow() {
        assert_eq!(traffic(0, 0).departure_flow(), None);
        assert_eq!(traffic(3, 1).departure_flow(), Some(1.0));
        assert_eq!(traffic(1, 3).departure_flow(), Some(0.0));
        assert_eq!(traffic(1, 1).departure_flow(), Some(0.5));
    }
}
