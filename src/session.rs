//! Loaded station and trip data plus the current time filter.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::buckets::MinuteBuckets;
use crate::config::FeedConfig;
use crate::fetch::{HttpClient, load_source};
use crate::parser::{parse_stations, parse_trips};
use crate::scale::RadiusScale;
use crate::traffic::aggregate;
use crate::types::{Station, StationTraffic, Trip};
use crate::window::{TimeFilter, WINDOW_RADIUS, select_trips};

/// One viewing session over a station list and a month of trips.
///
/// Buckets are built once on construction. Every filter change rebuilds the
/// derived station list from scratch.
#[derive(Debug)]
pub struct TrafficSession {
    stations: Vec<Station>,
    buckets: MinuteBuckets,
    filter: TimeFilter,
    filtered_departures: Vec<Arc<Trip>>,
    filtered_arrivals: Vec<Arc<Trip>>,
    traffic: Vec<StationTraffic>,
}

impl TrafficSession {
    /// Buckets `trips` and computes unfiltered station traffic.
    pub fn new(stations: Vec<Station>, trips: Vec<Trip>) -> Self {
        let buckets = MinuteBuckets::build(trips);
        let mut session = TrafficSession {
            stations,
            buckets,
            filter: TimeFilter::Disabled,
            filtered_departures: Vec::new(),
            filtered_arrivals: Vec::new(),
            traffic: Vec::new(),
        };
        session.recompute();
        session
    }

    /// Fetches both feeds concurrently and builds a session from them.
    ///
    /// # Errors
    ///
    /// Fails if either feed cannot be loaded or parsed; nothing is built in
    /// that case.
    #[tracing::instrument(skip_all, fields(stations = %config.stations_source, trips = %config.trips_source))]
    pub async fn load<C: HttpClient>(client: &C, config: &FeedConfig) -> Result<Self> {
        let (station_bytes, trip_bytes) = tokio::try_join!(
            load_source(client, &config.stations_source),
            load_source(client, &config.trips_source),
        )?;

        let stations = parse_stations(&station_bytes).context("failed to parse station feed")?;
        let trips = parse_trips(&trip_bytes).context("failed to parse trip feed")?;
        info!(stations = stations.len(), trips = trips.len(), "Feeds loaded");

        Ok(Self::new(stations, trips))
    }

    /// Applies a new filter and recomputes station traffic.
    pub fn set_filter(&mut self, filter: TimeFilter) -> &[StationTraffic] {
        self.filter = filter;
        self.recompute();
        &self.traffic
    }

    fn recompute(&mut self) {
        self.filtered_departures =
            select_trips(self.buckets.departures(), self.filter, WINDOW_RADIUS);
        self.filtered_arrivals = select_trips(self.buckets.arrivals(), self.filter, WINDOW_RADIUS);
        self.traffic = aggregate(
            &self.stations,
            &self.filtered_departures,
            &self.filtered_arrivals,
        );
        debug!(
            filter = %self.filter,
            departures = self.filtered_departures.len(),
            arrivals = self.filtered_arrivals.len(),
            "Traffic recomputed"
        );
    }

    pub fn filter(&self) -> TimeFilter {
        self.filter
    }

    /// Derived station records for the current filter, in station order.
    pub fn stations(&self) -> &[StationTraffic] {
        &self.traffic
    }

    pub fn base_stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn filtered_departures(&self) -> &[Arc<Trip>] {
        &self.filtered_departures
    }

    pub fn filtered_arrivals(&self) -> &[Arc<Trip>] {
        &self.filtered_arrivals
    }

    pub fn buckets(&self) -> &MinuteBuckets {
        &self.buckets
    }

    pub fn trip_count(&self) -> usize {
        self.buckets.len()
    }

    /// Marker radius scale for the current station list and filter.
    pub fn radius_scale(&self) -> RadiusScale {
        RadiusScale::for_stations(&self.traffic, self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn single_station_session() -> TrafficSession {
        TrafficSession::new(
            vec![Station::new("A", 0, 0)],
            vec![Trip::new("A", "A", at(0, 30), at(0, 45))],
        )
    }

    #[test]
    fn test_unfiltered_counts() {
        let session = single_station_session();
        let station = &session.stations()[0];

        assert_eq!(session.filter(), TimeFilter::Disabled);
        assert_eq!(station.short_name(), "A");
        assert_eq!(station.departures(), 1);
        assert_eq!(station.arrivals(), 1);
        assert_eq!(station.total_traffic(), 2);
    }

    #[test]
    fn test_noon_filter_excludes_early_trip() {
        let mut session = single_station_session();
        let stations = session.set_filter(TimeFilter::Minute(720));

        assert_eq!(stations[0].departures(), 0);
        assert_eq!(stations[0].arrivals(), 0);
        assert_eq!(stations[0].total_traffic(), 0);
    }

    #[test]
    fn test_filter_changes_do_not_accumulate() {
        let mut session = single_station_session();
        session.set_filter(TimeFilter::Minute(720));
        session.set_filter(TimeFilter::Minute(30));
        session.set_filter(TimeFilter::Minute(30));

        assert_eq!(session.stations()[0].total_traffic(), 2);
        assert_eq!(session.filtered_departures().len(), 1);
        assert_eq!(session.filtered_arrivals().len(), 1);

        session.set_filter(TimeFilter::Disabled);
        assert_eq!(session.stations()[0].total_traffic(), 2);
    }

    #[test]
    fn test_window_edge_splits_departure_and_arrival() {
        // Departs 00:30, arrives 00:45; a window centred at 01:40 spans 00:40..02:40.
        let mut session = single_station_session();
        let stations = session.set_filter(TimeFilter::Minute(100));

        assert_eq!(stations[0].departures(), 0);
        assert_eq!(stations[0].arrivals(), 1);
    }

    #[test]
    fn test_base_stations_untouched() {
        let mut session = single_station_session();
        session.set_filter(TimeFilter::Minute(30));
        assert_eq!(session.base_stations(), &[Station::new("A", 0, 0)]);
        assert_eq!(session.trip_count(), 1);
    }

    #[test]
    fn test_radius_scale_follows_filter() {
        let mut session = single_station_session();
        assert_eq!(session.radius_scale().range(), (3.0, 25.0));
        assert_eq!(session.radius_scale().max_traffic(), 2);

        session.set_filter(TimeFilter::Minute(30));
        assert_eq!(session.radius_scale().range(), (3.0, 50.0));
    }
}
