//! Station identifier normalization.
//!
//! The trip feed and the station feed spell the same station id with
//! different casing and stray whitespace, so every join goes through
//! [`normalize_station_id`].

/// Returns the canonical join key for a station identifier: trimmed and upper-cased.
pub fn normalize_station_id(id: &str) -> String {
    id.trim().to_uppercase()
}
