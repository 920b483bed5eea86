//! Multi-year cash-flow projection and investment metrics.

use crate::config::{FinancialParams, PriceSchedule};
use crate::finance::loan::LoanSchedule;
use crate::finance::types::{FinancialResult, YearCashFlow};
use crate::sim::SimulationResult;

/// Fallback replacement interval when a component life is unset.
const DEFAULT_LIFE_YEARS: u32 = 10;

/// IRR bisection search bounds and iteration cap.
const IRR_LOW: f64 = -0.9;
const IRR_HIGH: f64 = 10.0;
const IRR_ITERATIONS: u32 = 100;

/// Appraises one simulated design over the project horizon.
///
/// `capex` is the total installed cost and `battery_capex` the battery
/// share of it; the two drive separate replacement schedules. Revenue is
/// priced from the simulated per-band self-consumption, export, and
/// off-peak grid-charge totals, then degraded and escalated year over
/// year.
pub fn appraise(
    capex: f64,
    battery_capex: f64,
    sim: &SimulationResult,
    prices: &PriceSchedule,
    fin: &FinancialParams,
) -> FinancialResult {
    let years = fin.years;
    let loan_amount = if fin.loan.enable {
        capex * fin.loan.ratio_pct / 100.0
    } else {
        0.0
    };
    let equity = capex - loan_amount;
    let mut loan = LoanSchedule::new(loan_amount, fin.loan.rate_pct, fin.loan.term_years);

    let first_year_revenue = sim.used_by_band.peak * prices.peak
        + sim.used_by_band.normal * prices.normal
        + sim.used_by_band.off_peak * prices.off_peak
        + sim.total_exported_kwh * prices.grid_injection
        - sim.total_grid_charge_kwh * prices.off_peak;

    let battery_life = life_or_default(fin.battery_life_years);
    let inverter_life = life_or_default(fin.inverter_life_years);
    let discount = 1.0 + fin.discount_rate_pct / 100.0;
    // billable energy basis for LCOE: served plus exported, net of what
    // the grid supplied for charging
    let energy_base =
        (sim.total_used_kwh + sim.total_exported_kwh - sim.total_grid_charge_kwh).max(0.0);

    let mut cash_flows = Vec::with_capacity(years as usize + 1);
    cash_flows.push(YearCashFlow {
        year: 0,
        net: -equity,
        accumulated: -equity,
        ..YearCashFlow::default()
    });

    let mut accumulated = -equity;
    let mut npv = -equity;
    let mut payback: Option<f64> = None;
    let mut npv_costs = capex;
    let mut npv_energy = 0.0;

    for year in 1..=years {
        let deg_factor = (1.0 - fin.degradation_pct / 100.0).powi(year as i32 - 1);
        let esc_factor = (1.0 + fin.escalation_pct / 100.0).powi(year as i32 - 1);

        let revenue = first_year_revenue * deg_factor * esc_factor;
        let om_cost = capex * fin.om_pct / 100.0 * esc_factor;
        let insurance_cost = capex * fin.insurance_pct / 100.0;

        let mut replacement_cost = 0.0;
        if battery_capex > 0.0 && year % battery_life == 0 && year < years {
            replacement_cost += battery_capex * fin.battery_replace_cost_pct / 100.0 * esc_factor;
        }
        if year % inverter_life == 0 && year < years {
            replacement_cost +=
                (capex - battery_capex) * fin.inverter_replace_cost_pct / 100.0 * esc_factor;
        }

        let debt = loan.year_service(year);

        let depreciation = if fin.tax.depreciation_years > 0 && year <= fin.tax.depreciation_years {
            capex / f64::from(fin.tax.depreciation_years)
        } else {
            0.0
        };
        let tax_paid = if fin.tax.enable {
            let taxable =
                (revenue - om_cost - insurance_cost - depreciation - debt.interest).max(0.0);
            taxable * fin.tax.rate_pct / 100.0
        } else {
            0.0
        };

        let net = revenue
            - om_cost
            - insurance_cost
            - tax_paid
            - replacement_cost
            - (debt.interest + debt.principal);

        let previous = accumulated;
        accumulated += net;
        if payback.is_none() && accumulated >= 0.0 {
            payback = Some(if net != 0.0 {
                f64::from(year - 1) + previous.abs() / net
            } else {
                f64::from(year)
            });
        }

        let disc_factor = discount.powi(year as i32);
        npv += net / disc_factor;
        npv_costs += (om_cost + insurance_cost + replacement_cost) / disc_factor;
        npv_energy += energy_base * deg_factor / disc_factor;

        cash_flows.push(YearCashFlow {
            year,
            net,
            accumulated,
            revenue,
            om_cost,
            insurance_cost,
            debt_interest: debt.interest,
            debt_principal: debt.principal,
            tax_paid,
            replacement_cost,
            depreciation,
        });
    }

    let irr_pct = if equity > 0.0 {
        bisect_irr(equity, &cash_flows) * 100.0
    } else {
        0.0
    };
    let roi_pct = if equity > 0.0 {
        (accumulated + equity) / equity * 100.0
    } else {
        0.0
    };
    let lcoe = if npv_energy > 0.0 {
        let value = npv_costs / npv_energy;
        if value.is_finite() { value } else { 0.0 }
    } else {
        0.0
    };

    FinancialResult {
        npv,
        irr_pct,
        payback_years: payback.unwrap_or(f64::from(years) + 1.0),
        roi_pct,
        lcoe,
        first_year_revenue,
        cash_flows,
    }
}

fn life_or_default(years: u32) -> u32 {
    if years == 0 { DEFAULT_LIFE_YEARS } else { years }
}

/// Bisection search for the discount rate where the equity NPV crosses
/// zero. Converges fast enough that the residual is well under one
/// currency unit for typical project magnitudes.
fn bisect_irr(equity: f64, cash_flows: &[YearCashFlow]) -> f64 {
    let npv_at = |rate: f64| -> f64 {
        let mut value = -equity;
        for row in cash_flows.iter().skip(1) {
            value += row.net / (1.0 + rate).powi(row.year as i32);
        }
        value
    };

    let mut low = IRR_LOW;
    let mut high = IRR_HIGH;
    let mut irr = 0.0;
    for _ in 0..IRR_ITERATIONS {
        let mid = (low + high) / 2.0;
        let value = npv_at(mid);
        irr = mid;
        if value.abs() < 1.0 {
            break;
        }
        if value > 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }
    irr
}
