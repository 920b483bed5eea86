//! Financial appraisal result types.

use std::fmt;

/// One row of the projected cash-flow table.
///
/// Cost columns hold positive magnitudes; only `net` and `accumulated`
/// carry sign. Year 0 is the equity outlay row.
#[derive(Debug, Clone, Default)]
pub struct YearCashFlow {
    /// Project year, 0-based (0 = investment year).
    pub year: u32,
    /// Net cash flow for the year.
    pub net: f64,
    /// Cumulative cash flow through this year.
    pub accumulated: f64,
    /// Energy revenue for the year.
    pub revenue: f64,
    /// O&M cost.
    pub om_cost: f64,
    /// Insurance cost.
    pub insurance_cost: f64,
    /// Interest portion of debt service.
    pub debt_interest: f64,
    /// Principal portion of debt service.
    pub debt_principal: f64,
    /// Income tax paid.
    pub tax_paid: f64,
    /// Battery and inverter replacement cost.
    pub replacement_cost: f64,
    /// Straight-line depreciation charged (non-cash, tax shield only).
    pub depreciation: f64,
}

/// Investment metrics plus the full per-year cash-flow table.
#[derive(Debug, Clone)]
pub struct FinancialResult {
    /// Net present value of equity cash flows.
    pub npv: f64,
    /// Internal rate of return (%); 0 when equity is zero.
    pub irr_pct: f64,
    /// Simple payback period in years; `years + 1` when the project never
    /// pays back within the horizon.
    pub payback_years: f64,
    /// Return on equity over the horizon (%).
    pub roi_pct: f64,
    /// Levelized cost of energy, currency per kWh.
    pub lcoe: f64,
    /// Year-1 energy revenue before degradation and escalation.
    pub first_year_revenue: f64,
    /// Per-year cash flows, row 0 being the equity outlay.
    pub cash_flows: Vec<YearCashFlow>,
}

impl fmt::Display for FinancialResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Financial Appraisal ---")?;
        writeln!(f, "NPV:              {:>16.0}", self.npv)?;
        writeln!(f, "IRR:              {:>15.2}%", self.irr_pct)?;
        writeln!(f, "Payback:          {:>13.1} yr", self.payback_years)?;
        writeln!(f, "ROI:              {:>15.1}%", self.roi_pct)?;
        writeln!(f, "LCOE:             {:>16.1}", self.lcoe)?;
        write!(f, "Year-1 revenue:   {:>16.0}", self.first_year_revenue)
    }
}
