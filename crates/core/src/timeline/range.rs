use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open time span in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Parses the `"M:SS-M:SS"` wire format.
    ///
    /// Parsing is best-effort: a malformed side yields `NaN` instead of an
    /// error, so callers must check [`TimeRange::is_valid`] before doing
    /// arithmetic with the result.
    ///
    /// ```
    /// use scene_timeline_core::TimeRange;
    ///
    /// let range = TimeRange::parse("1:05-1:30");
    /// assert_eq!((range.start, range.end), (65.0, 90.0));
    /// assert!(TimeRange::parse("soon").start.is_nan());
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut sides = raw.split('-');
        let start = sides.next().map(parse_clock).unwrap_or(f64::NAN);
        let end = match (sides.next(), sides.next()) {
            (Some(end), None) => parse_clock(end),
            _ => f64::NAN,
        };
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start >= 0.0 && self.start < self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Serialises the range back into the wire format. Sub-second precision
    /// is rounded away.
    pub fn to_timestamp(&self) -> String {
        format!("{}-{}", format_clock(self.start), format_clock(self.end))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_timestamp())
    }
}

fn parse_clock(raw: &str) -> f64 {
    let mut fields = raw.trim().split(':');
    let (Some(minutes), Some(seconds), None) = (fields.next(), fields.next(), fields.next()) else {
        return f64::NAN;
    };

    match (minutes.trim().parse::<f64>(), seconds.trim().parse::<f64>()) {
        (Ok(minutes), Ok(seconds)) => minutes * 60.0 + seconds,
        _ => f64::NAN,
    }
}

fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
