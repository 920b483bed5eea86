//! Normalized input time series consumed by the dispatch simulator.

use chrono::NaiveDateTime;

/// One time step of normalized input data.
///
/// Produced once by the ingestion boundary and read-only thereafter; the
/// whole series is held in memory for the duration of a simulation.
///
/// A `None` timestamp marks a row whose timestamp could not be parsed at
/// the boundary. Such rows still participate in the energy balance but
/// classify into the normal tariff band (see [`crate::tou::TouBand`]).
#[derive(Debug, Clone)]
pub struct TimeSeriesPoint {
    /// Timestamp of the sample, `None` if unparsable at ingestion.
    pub timestamp: Option<NaiveDateTime>,
    /// Instantaneous average power draw over the step (kW, >= 0).
    pub load_kw: f64,
    /// Normalized solar output per kWp before scaling by system size,
    /// typically in `[0, 1]`.
    pub solar_unit: f64,
    /// Duration this sample represents in hours (typically 1.0 or 0.5).
    pub time_step_hours: f64,
}

impl TimeSeriesPoint {
    /// Creates a point with the default one-hour step duration.
    pub fn new(timestamp: Option<NaiveDateTime>, load_kw: f64, solar_unit: f64) -> Self {
        Self {
            timestamp,
            load_kw,
            solar_unit,
            time_step_hours: 1.0,
        }
    }

    /// Creates a point with an explicit step duration in hours.
    pub fn with_step(
        timestamp: Option<NaiveDateTime>,
        load_kw: f64,
        solar_unit: f64,
        time_step_hours: f64,
    ) -> Self {
        Self {
            timestamp,
            load_kw,
            solar_unit,
            time_step_hours,
        }
    }
}

/// Coerces a possibly-NaN external numeric to a documented fallback.
///
/// The simulator and its callers sanitize every externally supplied number
/// at the point of use so a NaN can never contaminate a running total.
pub(crate) fn sane(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}
