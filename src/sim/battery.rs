//! Battery energy storage state with efficiency losses and a DoD floor.

use crate::series::sane;

/// Tolerance for the SoC ceiling check when storing charge.
const SOC_EPSILON_KWH: f64 = 0.001;

/// Mutable battery state threaded through the dispatch loop.
///
/// All quantities are energies in kWh for the current step. Charge and
/// discharge each apply the single-way efficiency
/// `sqrt(round_trip_efficiency)`; the depth-of-discharge limit reserves a
/// floor of `capacity * (1 - dod)` that discharge never taps.
#[derive(Debug, Clone)]
pub struct BatteryState {
    /// Nameplate capacity (kWh).
    pub capacity_kwh: f64,
    /// Maximum charge/discharge power (kW); 0 means unconstrained.
    pub max_power_kw: f64,
    /// Current state of charge (kWh), starts empty.
    soc_kwh: f64,
    /// SoC floor from the DoD limit (kWh).
    min_soc_kwh: f64,
    /// Single-way charge efficiency.
    charge_eff: f64,
    /// Single-way discharge efficiency.
    discharge_eff: f64,
}

impl BatteryState {
    /// Creates a battery from nameplate figures.
    ///
    /// `round_trip_eff` and `dod` are sanitized to their documented
    /// defaults (0.90 each) when NaN.
    pub fn new(capacity_kwh: f64, max_power_kw: f64, round_trip_eff: f64, dod: f64) -> Self {
        let rt = sane(round_trip_eff, 0.90);
        let single_way = rt.max(0.0).sqrt();
        let dod = sane(dod, 0.90).clamp(0.0, 1.0);
        let capacity_kwh = sane(capacity_kwh, 0.0).max(0.0);
        Self {
            capacity_kwh,
            max_power_kw: sane(max_power_kw, 0.0).max(0.0),
            soc_kwh: 0.0,
            min_soc_kwh: capacity_kwh * (1.0 - dod),
            charge_eff: single_way,
            discharge_eff: single_way,
        }
    }

    /// Current state of charge (kWh).
    pub fn soc_kwh(&self) -> f64 {
        self.soc_kwh
    }

    /// SoC floor imposed by the DoD limit (kWh).
    pub fn min_soc_kwh(&self) -> f64 {
        self.min_soc_kwh
    }

    /// Maximum energy transferable in one step of `dt_hours`.
    ///
    /// An unspecified (zero) power rating falls back to 1000 kW, i.e.
    /// effectively unconstrained at C&I scale.
    pub fn max_transfer_kwh(&self, dt_hours: f64) -> f64 {
        let power = if self.max_power_kw > 0.0 {
            self.max_power_kw
        } else {
            1000.0
        };
        power * dt_hours
    }

    /// Charges from excess solar.
    ///
    /// Returns `(input_kwh, stored_kwh)`: the pre-efficiency energy drawn
    /// from the excess and the post-efficiency energy added to SoC.
    pub fn charge_from_solar(&mut self, excess_kwh: f64, max_transfer_kwh: f64) -> (f64, f64) {
        if excess_kwh <= 0.0 {
            return (0.0, 0.0);
        }
        let room = self.capacity_kwh - self.soc_kwh;
        let max_input = excess_kwh.min(max_transfer_kwh);
        let input = max_input.min(room / self.charge_eff.max(f64::MIN_POSITIVE));
        let stored = input * self.charge_eff;
        if self.soc_kwh + stored <= self.capacity_kwh + SOC_EPSILON_KWH {
            self.soc_kwh += stored;
            (input, stored)
        } else {
            (0.0, 0.0)
        }
    }

    /// Charges from the grid, filling remaining headroom up to the
    /// transfer limit.
    ///
    /// Returns `(input_kwh, stored_kwh)`; the input (pre-efficiency)
    /// amount is what the grid bills.
    pub fn charge_from_grid(&mut self, max_transfer_kwh: f64) -> (f64, f64) {
        if self.soc_kwh >= self.capacity_kwh {
            return (0.0, 0.0);
        }
        let room = self.capacity_kwh - self.soc_kwh;
        let stored = room.min(max_transfer_kwh * self.charge_eff);
        self.soc_kwh += stored;
        let input = if self.charge_eff > 0.0 {
            stored / self.charge_eff
        } else {
            0.0
        };
        (input, stored)
    }

    /// Discharges to cover a load deficit.
    ///
    /// Returns the energy delivered to the load; SoC is debited by
    /// `delivered / discharge_efficiency` and never drops below the DoD
    /// floor.
    pub fn discharge(&mut self, deficit_kwh: f64, max_transfer_kwh: f64) -> f64 {
        if deficit_kwh <= 0.0 || self.soc_kwh <= self.min_soc_kwh {
            return 0.0;
        }
        let available = (self.soc_kwh - self.min_soc_kwh) * self.discharge_eff;
        let delivered = deficit_kwh.min(available.min(max_transfer_kwh));
        if self.discharge_eff > 0.0 {
            self.soc_kwh -= delivered / self.discharge_eff;
        }
        delivered
    }
}
