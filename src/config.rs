//! TOML-based appraisal configuration: prices, technical and financial
//! parameters, and optimizer search constraints.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::series::sane;

/// Top-level configuration parsed from TOML.
///
/// All fields have defaults matching the reference tariff regime and the
/// documented financial-model default table. Load from TOML with
/// [`AppConfig::from_toml_file`] or use [`AppConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Per-band unit prices.
    pub prices: PriceSchedule,
    /// Plant-level technical parameters.
    pub technical: TechnicalParams,
    /// Financial-model parameters.
    pub financial: FinancialParams,
    /// Optimizer search constraints.
    pub search: SearchConstraints,
}

/// Unit prices in local currency per kWh, one per tariff band plus the
/// grid-injection (export) price.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceSchedule {
    /// Peak-band retail price.
    pub peak: f64,
    /// Normal-band retail price.
    pub normal: f64,
    /// Off-peak-band retail price.
    pub off_peak: f64,
    /// Price paid per exported kWh.
    pub grid_injection: f64,
}

impl Default for PriceSchedule {
    fn default() -> Self {
        // Manufacturing tariff, 22kV-110kV voltage level.
        Self {
            peak: 3398.0,
            normal: 1833.0,
            off_peak: 1190.0,
            grid_injection: 0.0,
        }
    }
}

/// Percentage losses applied to raw solar output.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LossFactors {
    /// Temperature loss (%).
    pub temp: f64,
    /// Soiling loss (%).
    pub soiling: f64,
    /// Cable loss (%).
    pub cable: f64,
    /// Inverter conversion loss (%).
    pub inverter: f64,
}

impl Default for LossFactors {
    fn default() -> Self {
        Self {
            temp: 4.0,
            soiling: 2.0,
            cable: 1.0,
            inverter: 1.5,
        }
    }
}

impl LossFactors {
    /// Loss factors with every component at zero.
    pub fn none() -> Self {
        Self {
            temp: 0.0,
            soiling: 0.0,
            cable: 0.0,
            inverter: 0.0,
        }
    }

    /// Sum of all loss percentages, with NaN entries coerced to 0.
    pub fn total_pct(&self) -> f64 {
        sane(self.temp, 0.0)
            + sane(self.soiling, 0.0)
            + sane(self.cable, 0.0)
            + sane(self.inverter, 0.0)
    }

    /// System derate multiplier, `1 - total_pct / 100`.
    pub fn derate(&self) -> f64 {
        1.0 - self.total_pct() / 100.0
    }
}

/// Plant-level technical parameters fed to the dispatch simulator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TechnicalParams {
    /// Combined inverter AC output ceiling (kW). Solar output is clipped
    /// to this value before the energy balance.
    pub inverter_max_ac_kw: f64,
    /// Grid-injection price used to gate export: exports are permitted
    /// only when this is positive, otherwise excess solar is curtailed.
    pub grid_injection_price: f64,
    /// Percentage losses applied to raw solar output.
    pub losses: LossFactors,
    /// Weather-scenario derate multiplier (1.0 = reference weather).
    pub weather_derate: f64,
    /// Battery round-trip efficiency, fraction in (0, 1].
    pub bess_eff_round_trip: f64,
    /// Battery depth-of-discharge limit, fraction in (0, 1].
    pub bess_dod: f64,
    /// Yield calibration factor (%); 100 = no adjustment.
    pub calibration_factor: f64,
    /// Target DC/AC oversizing ratio for inverter selection.
    pub dc_ac_ratio: f64,
    /// When set, the optimizer only evaluates battery-free candidates.
    pub no_bess: bool,
}

impl Default for TechnicalParams {
    fn default() -> Self {
        Self {
            inverter_max_ac_kw: 999_999.0,
            grid_injection_price: 0.0,
            losses: LossFactors::default(),
            weather_derate: 1.0,
            bess_eff_round_trip: 0.90,
            bess_dod: 0.90,
            calibration_factor: 100.0,
            dc_ac_ratio: 1.25,
            no_bess: false,
        }
    }
}

/// Debt-financing parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoanParams {
    /// Whether part of the capex is loan-financed.
    pub enable: bool,
    /// Loan share of capex (%).
    pub ratio_pct: f64,
    /// Annual interest rate (%).
    pub rate_pct: f64,
    /// Loan term in years.
    pub term_years: u32,
}

impl Default for LoanParams {
    fn default() -> Self {
        Self {
            enable: false,
            ratio_pct: 70.0,
            rate_pct: 8.0,
            term_years: 10,
        }
    }
}

/// Corporate income tax and depreciation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxParams {
    /// Whether income tax is modeled.
    pub enable: bool,
    /// Tax rate (%).
    pub rate_pct: f64,
    /// Straight-line depreciation period in years.
    pub depreciation_years: u32,
}

impl Default for TaxParams {
    fn default() -> Self {
        Self {
            enable: true,
            rate_pct: 20.0,
            depreciation_years: 20,
        }
    }
}

/// Financial-model parameters for the multi-year appraisal.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinancialParams {
    /// Project horizon in years.
    pub years: u32,
    /// Annual panel degradation (%).
    pub degradation_pct: f64,
    /// Annual price escalation (%).
    pub escalation_pct: f64,
    /// Discount rate for NPV and LCOE (%).
    pub discount_rate_pct: f64,
    /// Annual O&M cost as a share of capex (%), escalated yearly.
    pub om_pct: f64,
    /// Annual insurance cost as a share of capex (%), not escalated.
    pub insurance_pct: f64,
    /// Battery replacement interval in years.
    pub battery_life_years: u32,
    /// Battery replacement cost as a share of initial battery capex (%).
    pub battery_replace_cost_pct: f64,
    /// Inverter replacement interval in years.
    pub inverter_life_years: u32,
    /// Inverter replacement cost as a share of non-battery capex (%).
    pub inverter_replace_cost_pct: f64,
    /// Debt-financing parameters.
    pub loan: LoanParams,
    /// Tax and depreciation parameters.
    pub tax: TaxParams,
    /// Installed solar unit price per kWp, used for capex estimation.
    pub solar_price_per_kwp: f64,
    /// Installed battery unit price per kWh, used for capex estimation.
    pub bess_price_per_kwh: f64,
}

impl Default for FinancialParams {
    fn default() -> Self {
        Self {
            years: 20,
            degradation_pct: 0.55,
            escalation_pct: 2.0,
            discount_rate_pct: 10.0,
            om_pct: 1.0,
            insurance_pct: 0.5,
            battery_life_years: 10,
            battery_replace_cost_pct: 60.0,
            inverter_life_years: 10,
            inverter_replace_cost_pct: 10.0,
            loan: LoanParams::default(),
            tax: TaxParams::default(),
            solar_price_per_kwp: 12_000_000.0,
            bess_price_per_kwh: 6_000_000.0,
        }
    }
}

/// Optimizer search constraints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConstraints {
    /// Upper bound on solar capacity (kWp).
    pub max_kwp: f64,
    /// Solar capacity step (kWp).
    pub step_kwp: f64,
    /// Battery durations to evaluate, in hours of solar-peak coverage.
    pub bess_hours: Vec<f64>,
    /// When set, the solar search collapses to this single capacity.
    pub fixed_kwp: Option<f64>,
}

impl Default for SearchConstraints {
    fn default() -> Self {
        Self {
            max_kwp: 2000.0,
            step_kwp: 50.0,
            bess_hours: vec![0.0, 1.0, 2.0, 4.0],
            fixed_kwp: None,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"technical.bess_dod"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl AppConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let p = &self.prices;
        for (field, value) in [
            ("prices.peak", p.peak),
            ("prices.normal", p.normal),
            ("prices.off_peak", p.off_peak),
            ("prices.grid_injection", p.grid_injection),
        ] {
            if !(value >= 0.0) {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be >= 0".into(),
                });
            }
        }

        let t = &self.technical;
        if !(t.bess_dod > 0.0 && t.bess_dod <= 1.0) {
            errors.push(ConfigError {
                field: "technical.bess_dod".into(),
                message: "must be in (0.0, 1.0]".into(),
            });
        }
        if !(t.bess_eff_round_trip > 0.0 && t.bess_eff_round_trip <= 1.0) {
            errors.push(ConfigError {
                field: "technical.bess_eff_round_trip".into(),
                message: "must be in (0.0, 1.0]".into(),
            });
        }
        if !(t.dc_ac_ratio > 0.0) {
            errors.push(ConfigError {
                field: "technical.dc_ac_ratio".into(),
                message: "must be > 0".into(),
            });
        }
        if !(t.weather_derate > 0.0 && t.weather_derate <= 1.0) {
            errors.push(ConfigError {
                field: "technical.weather_derate".into(),
                message: "must be in (0.0, 1.0]".into(),
            });
        }
        if t.losses.total_pct() >= 100.0 {
            errors.push(ConfigError {
                field: "technical.losses".into(),
                message: "total losses must be < 100%".into(),
            });
        }

        let f = &self.financial;
        if f.years == 0 {
            errors.push(ConfigError {
                field: "financial.years".into(),
                message: "must be > 0".into(),
            });
        }
        if f.loan.enable && !(f.loan.ratio_pct > 0.0 && f.loan.ratio_pct <= 100.0) {
            errors.push(ConfigError {
                field: "financial.loan.ratio_pct".into(),
                message: "must be in (0, 100] when the loan is enabled".into(),
            });
        }
        if f.tax.enable && f.tax.depreciation_years == 0 {
            errors.push(ConfigError {
                field: "financial.tax.depreciation_years".into(),
                message: "must be > 0 when tax is enabled".into(),
            });
        }

        let s = &self.search;
        if !(s.step_kwp > 0.0) {
            errors.push(ConfigError {
                field: "search.step_kwp".into(),
                message: "must be > 0".into(),
            });
        }
        if !(s.max_kwp > 0.0) {
            errors.push(ConfigError {
                field: "search.max_kwp".into(),
                message: "must be > 0".into(),
            });
        }
        if s.bess_hours.iter().any(|h| !(*h >= 0.0)) {
            errors.push(ConfigError {
                field: "search.bess_hours".into(),
                message: "entries must be >= 0".into(),
            });
        }

        errors
    }
}
