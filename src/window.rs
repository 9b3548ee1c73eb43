//! Time-of-day filter and the circular window it selects.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{NaiveTime, Timelike};

use crate::buckets::{MINUTES_PER_DAY, MinuteSlots};
use crate::types::Trip;

/// Minutes on either side of the filter's centre minute.
pub const WINDOW_RADIUS: usize = 60;

/// Slider value meaning "show all trips".
pub const DISABLED_SENTINEL: i32 = -1;

/// Which trips are visible: all of them, or those near a minute of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    #[default]
    Disabled,
    /// Centre minute, 0..=1439.
    Minute(u16),
}

impl TimeFilter {
    /// Builds a filter from a minute of day, rejecting anything past 23:59.
    pub fn at_minute(minute: usize) -> Result<Self> {
        if minute >= MINUTES_PER_DAY {
            bail!("minute of day {} out of range 0..={}", minute, MINUTES_PER_DAY - 1);
        }
        Ok(TimeFilter::Minute(minute as u16))
    }

    /// Interprets a slider position in [-1, 1439].
    pub fn from_slider(value: i32) -> Result<Self> {
        match value {
            DISABLED_SENTINEL => Ok(TimeFilter::Disabled),
            v if v >= 0 => Self::at_minute(v as usize),
            v => bail!("slider value {} out of range {}..={}", v, DISABLED_SENTINEL, MINUTES_PER_DAY - 1),
        }
    }

    pub fn slider_value(&self) -> i32 {
        match self {
            TimeFilter::Disabled => DISABLED_SENTINEL,
            TimeFilter::Minute(m) => i32::from(*m),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TimeFilter::Minute(_))
    }

    /// Short clock label for the centre minute ("12:00 AM", "1:05 PM").
    ///
    /// `None` when disabled, or for a hand-built minute past 23:59.
    pub fn label(&self) -> Option<String> {
        match self {
            TimeFilter::Disabled => None,
            TimeFilter::Minute(m) => {
                let m = u32::from(*m);
                let time = NaiveTime::from_hms_opt(m / 60, m % 60, 0)?;
                Some(time.format("%-I:%M %p").to_string())
            }
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.label()) {
            (_, Some(label)) => f.write_str(&label),
            (TimeFilter::Disabled, None) => f.write_str("(any time)"),
            (TimeFilter::Minute(m), None) => write!(f, "invalid minute {}", m),
        }
    }
}

/// Accepts `any`, a clock time (`HH:MM`, 24-hour) or a raw slider value.
impl FromStr for TimeFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("any") {
            return Ok(TimeFilter::Disabled);
        }
        if s.contains(':') {
            let time = NaiveTime::parse_from_str(s, "%H:%M")
                .with_context(|| format!("invalid time of day '{}'", s))?;
            return Self::at_minute((time.hour() * 60 + time.minute()) as usize);
        }
        let value: i32 = s
            .parse()
            .with_context(|| format!("invalid time filter '{}'", s))?;
        Self::from_slider(value)
    }
}

/// Lower (inclusive) and upper (exclusive) slot indices of the window around
/// `center`. When `lower > upper` the window wraps past midnight.
pub fn window_bounds(center: usize, radius: usize) -> (usize, usize) {
    let center = center % MINUTES_PER_DAY;
    let radius = radius % MINUTES_PER_DAY;
    let lower = (center + MINUTES_PER_DAY - radius) % MINUTES_PER_DAY;
    let upper = (center + radius) % MINUTES_PER_DAY;
    (lower, upper)
}

/// Collects the trips visible under `filter` from one axis of the buckets.
///
/// Output is in slot order (the pre-midnight part first when wrapping), then
/// load order within each slot.
pub fn select_trips(slots: &MinuteSlots, filter: TimeFilter, radius: usize) -> Vec<Arc<Trip>> {
    let center = match filter {
        TimeFilter::Disabled => return flatten(slots.iter()),
        TimeFilter::Minute(m) => usize::from(m),
    };

    // A window at least a day wide covers every slot.
    if 2 * radius >= MINUTES_PER_DAY {
        return flatten(slots.iter());
    }

    let (lower, upper) = window_bounds(center, radius);
    if lower > upper {
        flatten(slots[lower..].iter().chain(slots[..upper].iter()))
    } else {
        flatten(slots[lower..upper].iter())
    }
}

fn flatten<'a>(slots: impl Iterator<Item = &'a Vec<Arc<Trip>>>) -> Vec<Arc<Trip>> {
    slots.flat_map(|slot| slot.iter().cloned()).collect()
}
