//! Time-of-use tariff band classification.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

/// Tariff band under the supported three-band time-of-use regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouBand {
    /// Peak pricing band (weekdays and Saturday only).
    Peak,
    /// Normal pricing band.
    Normal,
    /// Off-peak pricing band (late night, every day).
    OffPeak,
}

impl TouBand {
    /// Classifies a timestamp into its tariff band.
    ///
    /// Band rules:
    /// - Sunday: off-peak for hours `[22,24) ∪ [0,4)`, otherwise normal.
    ///   Sunday has no peak band.
    /// - Monday–Saturday: peak for hours `[9,11) ∪ [17,20)`, off-peak for
    ///   `[22,24) ∪ [0,4)`, otherwise normal.
    ///
    /// A `None` timestamp (a row the ingestion boundary failed to parse)
    /// classifies as `Normal`. This is fail-safe rather than fail-fast:
    /// the tool estimates savings from end-user spreadsheets, and a bad
    /// row should degrade the estimate, not abort it.
    pub fn classify(timestamp: Option<NaiveDateTime>) -> Self {
        let Some(ts) = timestamp else {
            return Self::Normal;
        };
        let hour = ts.hour();
        let off_peak = hour >= 22 || hour < 4;

        if ts.weekday() == Weekday::Sun {
            return if off_peak { Self::OffPeak } else { Self::Normal };
        }
        if (9..11).contains(&hour) || (17..20).contains(&hour) {
            Self::Peak
        } else if off_peak {
            Self::OffPeak
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for TouBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Peak => "peak",
            Self::Normal => "normal",
            Self::OffPeak => "off_peak",
        };
        write!(f, "{s}")
    }
}
