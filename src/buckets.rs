//! Minute-of-day bucketing of trips.
//!
//! Every trip lands in exactly one departure slot (by `started_at`) and one
//! arrival slot (by `ended_at`). The date is thrown away, so a month of trips
//! collapses onto a single 1440-minute day.

use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike};
use tracing::debug;

use crate::types::Trip;

pub const MINUTES_PER_DAY: usize = 1440;

/// One slot per minute of day, each holding trips in load order.
pub type MinuteSlots = [Vec<Arc<Trip>>; MINUTES_PER_DAY];

/// `hour * 60 + minute`; seconds and anything finer are truncated.
pub fn minutes_since_midnight(timestamp: &NaiveDateTime) -> usize {
    (timestamp.hour() * 60 + timestamp.minute()) as usize
}

/// Departure and arrival slots for a fixed trip set. Built once, read many times.
#[derive(Debug)]
pub struct MinuteBuckets {
    departures: Box<MinuteSlots>,
    arrivals: Box<MinuteSlots>,
    trip_count: usize,
}

impl MinuteBuckets {
    pub fn build(trips: impl IntoIterator<Item = Trip>) -> Self {
        let mut departures = empty_slots();
        let mut arrivals = empty_slots();
        let mut trip_count = 0;

        for trip in trips {
            let trip = Arc::new(trip);
            departures[trip.start_minute()].push(Arc::clone(&trip));
            arrivals[trip.end_minute()].push(trip);
            trip_count += 1;
        }

        debug!(trip_count, "Trips bucketed by minute of day");

        MinuteBuckets {
            departures,
            arrivals,
            trip_count,
        }
    }

    pub fn departures(&self) -> &MinuteSlots {
        &self.departures
    }

    pub fn arrivals(&self) -> &MinuteSlots {
        &self.arrivals
    }

    pub fn departures_at(&self, minute: usize) -> &[Arc<Trip>] {
        &self.departures[minute % MINUTES_PER_DAY]
    }

    pub fn arrivals_at(&self, minute: usize) -> &[Arc<Trip>] {
        &self.arrivals[minute % MINUTES_PER_DAY]
    }

    /// Number of trips bucketed (each trip counted once, not once per axis).
    pub fn len(&self) -> usize {
        self.trip_count
    }

    pub fn is_empty(&self) -> bool {
        self.trip_count == 0
    }
}

fn empty_slots() -> Box<MinuteSlots> {
    Box::new(std::array::from_fn(|_| Vec::new()))
}
