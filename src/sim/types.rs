//! Simulation input design, per-band totals, step snapshots, and results.

use std::fmt;

use chrono::NaiveDateTime;

use crate::tou::TouBand;

/// Battery dispatch strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchStrategy {
    /// Discharge whenever solar falls short of load.
    #[default]
    SelfConsumption,
    /// Discharge only during peak tariff hours.
    PeakShavingTou,
}

/// One candidate solar + battery design point.
#[derive(Debug, Clone)]
pub struct SystemDesign {
    /// Installed DC capacity (kWp).
    pub solar_capacity_kwp: f64,
    /// Battery capacity (kWh); 0 means no battery.
    pub battery_capacity_kwh: f64,
    /// Battery power rating (kW); 0 means unconstrained.
    pub battery_max_power_kw: f64,
    /// Battery dispatch strategy.
    pub strategy: DispatchStrategy,
    /// Whether the battery may charge from the grid during off-peak hours.
    pub grid_charge_enabled: bool,
}

impl SystemDesign {
    /// A solar-only design with no battery.
    pub fn solar_only(solar_capacity_kwp: f64) -> Self {
        Self {
            solar_capacity_kwp,
            battery_capacity_kwh: 0.0,
            battery_max_power_kw: 0.0,
            strategy: DispatchStrategy::SelfConsumption,
            grid_charge_enabled: false,
        }
    }

    /// A solar + battery design.
    pub fn with_battery(
        solar_capacity_kwp: f64,
        battery_capacity_kwh: f64,
        battery_max_power_kw: f64,
        strategy: DispatchStrategy,
    ) -> Self {
        Self {
            solar_capacity_kwp,
            battery_capacity_kwh,
            battery_max_power_kw,
            strategy,
            grid_charge_enabled: false,
        }
    }
}

/// An energy total split across the three tariff bands.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandTotals {
    /// Peak-band total (kWh).
    pub peak: f64,
    /// Normal-band total (kWh).
    pub normal: f64,
    /// Off-peak-band total (kWh).
    pub off_peak: f64,
}

impl BandTotals {
    /// Adds an amount to the bucket for `band`.
    pub fn add(&mut self, band: TouBand, kwh: f64) {
        match band {
            TouBand::Peak => self.peak += kwh,
            TouBand::Normal => self.normal += kwh,
            TouBand::OffPeak => self.off_peak += kwh,
        }
    }

    /// Sum across all three bands.
    pub fn total(&self) -> f64 {
        self.peak + self.normal + self.off_peak
    }
}

/// Per-step snapshot of battery state and energy flows, used for
/// downstream charting and battery sizing advice.
#[derive(Debug, Clone)]
pub struct StepSnapshot {
    /// Timestamp of the step, if the source row had one.
    pub timestamp: Option<NaiveDateTime>,
    /// Battery state of charge after this step (kWh).
    pub soc_kwh: f64,
    /// Energy stored from solar this step (kWh, post-efficiency).
    pub charge_from_solar_kwh: f64,
    /// Energy stored from the grid this step (kWh, post-efficiency).
    pub charge_from_grid_kwh: f64,
    /// Energy delivered from the battery this step (kWh).
    pub discharge_kwh: f64,
    /// Solar energy generated this step (kWh, after derates and clipping).
    pub solar_kwh: f64,
    /// Load energy this step (kWh).
    pub load_kwh: f64,
    /// Curtailed energy this step (kWh).
    pub curtailed_kwh: f64,
    /// Exported energy this step (kWh).
    pub exported_kwh: f64,
    /// Grid import this step (kWh): unmet load plus grid-charge input.
    pub grid_import_kwh: f64,
}

impl StepSnapshot {
    /// Total energy stored this step, from solar and grid combined (kWh).
    pub fn charge_kwh(&self) -> f64 {
        self.charge_from_solar_kwh + self.charge_from_grid_kwh
    }
}

/// Aggregate output of one dispatch run over the full time series.
///
/// Recomputed fresh on every invocation and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Installed DC capacity the run was scaled by (kWp).
    pub solar_capacity_kwp: f64,
    /// Total solar generation (kWh).
    pub total_solar_gen_kwh: f64,
    /// Total energy served by the system: direct solar + discharge (kWh).
    pub total_used_kwh: f64,
    /// Total energy exported to the grid (kWh).
    pub total_exported_kwh: f64,
    /// Total energy curtailed (kWh).
    pub total_curtailed_kwh: f64,
    /// Total load over the series (kWh).
    pub total_load_kwh: f64,
    /// Total energy stored from solar (kWh, post-efficiency).
    pub total_charged_kwh: f64,
    /// Total energy delivered from the battery (kWh).
    pub total_discharged_kwh: f64,
    /// Total grid-charge input energy (kWh, pre-efficiency; billed at the
    /// off-peak price).
    pub total_grid_charge_kwh: f64,
    /// Total grid import: unmet load plus grid-charge input (kWh).
    pub grid_import_kwh: f64,
    /// Self-consumed energy split by tariff band.
    pub used_by_band: BandTotals,
    /// Exported energy split by tariff band.
    pub exported_by_band: BandTotals,
    /// Curtailed energy split by tariff band.
    pub curtailed_by_band: BandTotals,
    /// Per-step snapshots, same length and order as the input series.
    pub steps: Vec<StepSnapshot>,
}

impl SimulationResult {
    /// Share of generated energy that was curtailed, in `[0, 1]`.
    pub fn curtailment_rate(&self) -> f64 {
        if self.total_solar_gen_kwh > 0.0 {
            self.total_curtailed_kwh / self.total_solar_gen_kwh
        } else {
            0.0
        }
    }

    /// Share of generated energy that served the load, in `[0, 1]`.
    pub fn self_consumption_rate(&self) -> f64 {
        if self.total_solar_gen_kwh > 0.0 {
            self.total_used_kwh / self.total_solar_gen_kwh
        } else {
            0.0
        }
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Dispatch Summary ({} kWp) ---", self.solar_capacity_kwp)?;
        writeln!(f, "Solar generated:   {:>12.1} kWh", self.total_solar_gen_kwh)?;
        writeln!(f, "Self-consumed:     {:>12.1} kWh", self.total_used_kwh)?;
        writeln!(f, "Exported:          {:>12.1} kWh", self.total_exported_kwh)?;
        writeln!(f, "Curtailed:         {:>12.1} kWh", self.total_curtailed_kwh)?;
        writeln!(f, "Load:              {:>12.1} kWh", self.total_load_kwh)?;
        writeln!(f, "Battery charged:   {:>12.1} kWh", self.total_charged_kwh)?;
        writeln!(f, "Battery discharged:{:>12.1} kWh", self.total_discharged_kwh)?;
        writeln!(f, "Grid charged:      {:>12.1} kWh", self.total_grid_charge_kwh)?;
        writeln!(f, "Grid import:       {:>12.1} kWh", self.grid_import_kwh)?;
        writeln!(
            f,
            "Self-consumption:  {:>11.1}%",
            self.self_consumption_rate() * 100.0
        )?;
        write!(
            f,
            "Curtailment:       {:>11.1}%",
            self.curtailment_rate() * 100.0
        )
    }
}
