//! Output formatting and persistence for station traffic.
//!
//! Supports pretty-printing, JSON serialization, a CSV snapshot of one pass,
//! and CSV append for day sweeps.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::scale::RadiusScale;
use crate::types::StationTraffic;
use crate::window::TimeFilter;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Flat CSV row for one station under one filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficRecord {
    pub filter_minute: i32,
    pub filter_label: String,
    pub short_name: String,
    pub name: Option<String>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub departures: usize,
    pub arrivals: usize,
    pub total_traffic: usize,
    pub radius: f64,
    pub departure_flow: Option<f64>,
}

impl TrafficRecord {
    pub fn new(traffic: &StationTraffic, filter: TimeFilter, scale: &RadiusScale) -> Self {
        let coordinates = traffic.station().coordinates();
        TrafficRecord {
            filter_minute: filter.slider_value(),
            filter_label: filter.to_string(),
            short_name: traffic.short_name().to_string(),
            name: traffic.station().name.clone(),
            lon: coordinates.map(|(lon, _)| lon),
            lat: coordinates.map(|(_, lat)| lat),
            departures: traffic.departures(),
            arrivals: traffic.arrivals(),
            total_traffic: traffic.total_traffic(),
            radius: scale.radius(traffic.total_traffic()),
            departure_flow: traffic.departure_flow(),
        }
    }
}

/// Builds CSV rows for a whole pass.
pub fn records(stations: &[StationTraffic], filter: TimeFilter) -> Vec<TrafficRecord> {
    let scale = RadiusScale::for_stations(stations, filter);
    stations
        .iter()
        .map(|s| TrafficRecord::new(s, filter, &scale))
        .collect()
}

/// Logs one pass using Rust's debug pretty-print format.
pub fn print_pretty(stations: &[StationTraffic], filter: TimeFilter) {
    info!(filter = %filter, stations = stations.len(), "Station traffic");
    for station in stations {
        info!(short_name = station.short_name(), "{}", station.tooltip());
        debug!("{:#?}", station);
    }
}

/// Logs one pass as pretty-printed JSON.
pub fn print_json(stations: &[StationTraffic]) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(stations)?);
    Ok(())
}

/// Writes one pass to `path` as CSV, replacing any existing file.
pub fn write_records(path: &str, records: &[TrafficRecord]) -> Result<()> {
    debug!(path, rows = records.len(), "Writing CSV snapshot");
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Appends rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &str, records: &[TrafficRecord]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = records.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
