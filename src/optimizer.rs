//! Grid search over solar capacity and battery duration, ranked by
//! payback period.

use crate::config::{FinancialParams, PriceSchedule, SearchConstraints, TechnicalParams};
use crate::finance::{FinancialResult, appraise};
use crate::hardware::{InverterModel, InverterSelection, select_inverters};
use crate::series::{TimeSeriesPoint, sane};
use crate::sim::{DispatchStrategy, SystemDesign, simulate};

/// Battery capacity granted per search hour, as a fraction of solar kWp.
const BESS_KWH_PER_KWP_HOUR: f64 = 0.25;

/// One evaluated design candidate.
///
/// Per-step simulation detail is discarded to keep the candidate list
/// small; re-run [`simulate`] on the winning design when step traces are
/// needed.
#[derive(Debug, Clone)]
pub struct CandidateResult {
    /// Solar capacity (kWp).
    pub solar_kwp: f64,
    /// Battery capacity (kWh).
    pub bess_kwh: f64,
    /// Battery power rating (kW).
    pub bess_kw: f64,
    /// Estimated total installed cost.
    pub capex: f64,
    /// Inverter fleet chosen for this capacity.
    pub inverters: InverterSelection,
    /// Financial appraisal of the candidate.
    pub financials: FinancialResult,
}

/// Result of a full grid search.
#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    /// The candidate with the shortest payback.
    pub best: CandidateResult,
    /// All evaluated candidates, sorted by ascending payback.
    pub all: Vec<CandidateResult>,
}

/// Searches solar capacities and battery durations for the design with
/// the shortest payback.
///
/// The solar range is derived from the observed peak load: 20% to 150%
/// of it, rounded to tens, clamped to `search.max_kwp`, stepped by
/// `search.step_kwp`. A `search.fixed_kwp` collapses the range to that
/// single capacity; `tech.no_bess` restricts the battery axis to zero.
/// Candidates are dispatched with the TOU peak-shaving strategy and the
/// selected inverter fleet's AC rating as the clipping ceiling.
///
/// Returns `None` when the series is empty or yields no candidates.
pub fn optimize(
    series: &[TimeSeriesPoint],
    catalog: &[InverterModel],
    prices: &PriceSchedule,
    fin: &FinancialParams,
    tech: &TechnicalParams,
    search: &SearchConstraints,
) -> Option<OptimizationOutcome> {
    if series.is_empty() {
        return None;
    }
    let peak_load = series
        .iter()
        .map(|p| sane(p.load_kw, 0.0))
        .fold(0.0, f64::max);

    let capacities: Vec<f64> = match search.fixed_kwp {
        Some(kwp) => vec![kwp],
        None => {
            let start = ((peak_load * 0.2 / 10.0).round() * 10.0).max(10.0);
            let end = ((peak_load * 1.5 / 10.0).round() * 10.0).min(search.max_kwp);
            let mut caps = Vec::new();
            let mut kwp = start;
            while kwp <= end + 1e-9 {
                caps.push(kwp);
                kwp += search.step_kwp;
            }
            caps
        }
    };
    let bess_hours: &[f64] = if tech.no_bess {
        &[0.0]
    } else {
        &search.bess_hours
    };

    let mut all = Vec::with_capacity(capacities.len() * bess_hours.len());
    for &kwp in &capacities {
        let selection = select_inverters(kwp, catalog, tech.dc_ac_ratio);
        let candidate_tech = TechnicalParams {
            inverter_max_ac_kw: selection.total_ac_kw,
            ..tech.clone()
        };
        for &hours in bess_hours {
            let bess_kwh = (kwp * hours * BESS_KWH_PER_KWP_HOUR).round();
            let bess_kw = (bess_kwh / 2.0).round();
            let design = SystemDesign::with_battery(
                kwp,
                bess_kwh,
                bess_kw,
                DispatchStrategy::PeakShavingTou,
            );

            let mut sim = simulate(series, &design, &candidate_tech);
            sim.steps.clear();

            let battery_capex = bess_kwh * fin.bess_price_per_kwh;
            let capex = kwp * fin.solar_price_per_kwp + battery_capex;
            let financials = appraise(capex, battery_capex, &sim, prices, fin);

            all.push(CandidateResult {
                solar_kwp: kwp,
                bess_kwh,
                bess_kw,
                capex,
                inverters: selection.clone(),
                financials,
            });
        }
    }

    all.sort_by(|a, b| {
        a.financials
            .payback_years
            .total_cmp(&b.financials.payback_years)
    });
    let best = all.first()?.clone();
    Some(OptimizationOutcome { best, all })
}
