//! Zero-export capacity advice from the load profile.
//!
//! Suggests the largest solar capacity that a site can absorb without
//! meaningful curtailment, anchored on the weakest month's midday load.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};

use crate::config::LossFactors;
use crate::series::{TimeSeriesPoint, sane};

/// Midday window used for the anchor load, hours inclusive.
const MIDDAY_HOURS: std::ops::RangeInclusive<u32> = 11..=13;

/// A month is considered fully metered with at least this many points.
const FULL_MONTH_POINTS: usize = 360;

/// Full-year threshold: below this many points the curtailment scan is
/// skipped and the midday anchor is returned directly.
const FULL_YEAR_POINTS: usize = 8760;

/// Curtailment tolerance for the upward scan (%).
const CURTAILMENT_LIMIT_PCT: f64 = 0.75;

/// Suggests a safe solar capacity (kWp) for the metered load profile.
///
/// The anchor is the minimum midday load of the lowest-consumption month,
/// grossed up by the system derate. Series covering a full year are then
/// scanned upward for the largest capacity whose simulated curtailment
/// stays within tolerance.
///
/// Returns `None` when no month has usable data or the midday window is
/// never observed.
pub fn suggest_safe_capacity(series: &[TimeSeriesPoint], losses: &LossFactors) -> Option<f64> {
    // group by calendar month, dropping rows without a timestamp
    let mut months: BTreeMap<(i32, u32), Vec<&TimeSeriesPoint>> = BTreeMap::new();
    for point in series {
        if let Some(ts) = point.timestamp {
            months
                .entry((ts.year(), ts.month()))
                .or_default()
                .push(point);
        }
    }
    if months.is_empty() {
        return None;
    }

    // prefer fully metered months, fall back to whatever is there
    let full: Vec<&Vec<&TimeSeriesPoint>> = months
        .values()
        .filter(|pts| pts.len() >= FULL_MONTH_POINTS)
        .collect();
    let candidates: Vec<&Vec<&TimeSeriesPoint>> =
        if full.is_empty() { months.values().collect() } else { full };

    let weakest = candidates
        .into_iter()
        .map(|pts| {
            let total: f64 = pts.iter().map(|p| sane(p.load_kw, 0.0)).sum();
            (total, pts)
        })
        .filter(|(total, _)| *total > 0.0)
        .min_by(|a, b| a.0.total_cmp(&b.0))?
        .1;

    let midday_min = weakest
        .iter()
        .filter(|p| {
            p.timestamp
                .is_some_and(|ts| MIDDAY_HOURS.contains(&ts.hour()))
        })
        .map(|p| sane(p.load_kw, 0.0))
        .min_by(f64::total_cmp)?;

    let derate = ((100.0 - losses.total_pct()) / 100.0).max(0.1);
    let anchor = midday_min / derate;
    if series.len() < FULL_YEAR_POINTS {
        return Some(anchor.round());
    }

    // full-year data: start from the floored anchor and push the capacity
    // up while curtailment stays inside tolerance, coarse pass then fine
    let mut kwp = anchor.floor();
    for step in [10.0, 1.0] {
        while curtailment_pct(series, kwp + step, derate)
            .is_some_and(|pct| pct <= CURTAILMENT_LIMIT_PCT)
        {
            kwp += step;
        }
    }
    Some(kwp)
}

/// Power-based curtailment share (%) for a candidate capacity, or `None`
/// when the series produces no generation at all.
fn curtailment_pct(series: &[TimeSeriesPoint], kwp: f64, derate: f64) -> Option<f64> {
    let mut generated = 0.0;
    let mut curtailed = 0.0;
    for point in series {
        let gen_kw = sane(point.solar_unit, 0.0) * kwp * derate;
        generated += gen_kw;
        curtailed += (gen_kw - sane(point.load_kw, 0.0)).max(0.0);
    }
    if generated > 0.0 {
        Some(curtailed / generated * 100.0)
    } else {
        None
    }
}
