//! Static hardware reference data and the inverter bank selector.
//!
//! The catalogs are read-only reference data loaded once per process; the
//! selector is a documented greedy heuristic, not a guaranteed optimum.

/// One inverter model from the hardware catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct InverterModel {
    /// Catalog identifier.
    pub id: &'static str,
    /// Human-readable model name.
    pub name: &'static str,
    /// Rated AC output power (kW).
    pub ac_power_kw: f64,
    /// Maximum DC (PV) input power (kW). Zero means the unit accepts no
    /// direct PV input and is excluded from selection.
    pub max_pv_kw: f64,
    /// Maximum DC input voltage (V).
    pub max_input_voltage_v: f64,
    /// Number of MPP trackers.
    pub num_mppt: u32,
}

/// One battery cabinet model from the hardware catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryModel {
    /// Catalog identifier.
    pub id: &'static str,
    /// Human-readable model name.
    pub name: &'static str,
    /// Usable energy capacity (kWh).
    pub capacity_kwh: f64,
    /// Maximum charge/discharge power (kW).
    pub max_power_kw: f64,
}

/// Default string-inverter catalog.
pub const INVERTER_CATALOG: &[InverterModel] = &[
    InverterModel {
        id: "12KTL-M5",
        name: "SUN2000-12KTL-M5",
        ac_power_kw: 12.0,
        max_pv_kw: 18.0,
        max_input_voltage_v: 1100.0,
        num_mppt: 2,
    },
    InverterModel {
        id: "15KTL-M5",
        name: "SUN2000-15KTL-M5",
        ac_power_kw: 15.0,
        max_pv_kw: 22.5,
        max_input_voltage_v: 1100.0,
        num_mppt: 2,
    },
    InverterModel {
        id: "17KTL-M5",
        name: "SUN2000-17KTL-M5",
        ac_power_kw: 17.0,
        max_pv_kw: 25.5,
        max_input_voltage_v: 1100.0,
        num_mppt: 2,
    },
    InverterModel {
        id: "20KTL-M5",
        name: "SUN2000-20KTL-M5",
        ac_power_kw: 20.0,
        max_pv_kw: 30.0,
        max_input_voltage_v: 1100.0,
        num_mppt: 2,
    },
    InverterModel {
        id: "25KTL-M5",
        name: "SUN2000-25KTL-M5",
        ac_power_kw: 25.0,
        max_pv_kw: 37.5,
        max_input_voltage_v: 1100.0,
        num_mppt: 3,
    },
    InverterModel {
        id: "30KTL-M3",
        name: "SUN2000-30KTL-M3",
        ac_power_kw: 30.0,
        max_pv_kw: 45.0,
        max_input_voltage_v: 1100.0,
        num_mppt: 4,
    },
    InverterModel {
        id: "40KTL-M3",
        name: "SUN2000-40KTL-M3",
        ac_power_kw: 40.0,
        max_pv_kw: 60.0,
        max_input_voltage_v: 1100.0,
        num_mppt: 4,
    },
    InverterModel {
        id: "50KTL-M3",
        name: "SUN2000-50KTL-M3",
        ac_power_kw: 50.0,
        max_pv_kw: 75.0,
        max_input_voltage_v: 1100.0,
        num_mppt: 6,
    },
    InverterModel {
        id: "100KTL-M2",
        name: "SUN2000-100KTL-M2",
        ac_power_kw: 100.0,
        max_pv_kw: 150.0,
        max_input_voltage_v: 1100.0,
        num_mppt: 10,
    },
    InverterModel {
        id: "150K-MG0",
        name: "SUN2000-150K-MG0",
        ac_power_kw: 150.0,
        max_pv_kw: 225.0,
        max_input_voltage_v: 1100.0,
        num_mppt: 12,
    },
    // Smart PCS: no direct PV input, excluded by the selector.
    InverterModel {
        id: "100KTL-M1",
        name: "LUNA2000-100KTL-M1",
        ac_power_kw: 100.0,
        max_pv_kw: 0.0,
        max_input_voltage_v: 1100.0,
        num_mppt: 0,
    },
];

/// Default battery cabinet catalog.
pub const BESS_CATALOG: &[BatteryModel] = &[
    BatteryModel {
        id: "LUNA-97",
        name: "LUNA2000-97KWH-1H1",
        capacity_kwh: 96.8,
        max_power_kw: 92.0,
    },
    BatteryModel {
        id: "LUNA-129",
        name: "LUNA2000-129KWH-2H1",
        capacity_kwh: 129.0,
        max_power_kw: 100.0,
    },
    BatteryModel {
        id: "LUNA-161",
        name: "LUNA2000-161KWH-2H1",
        capacity_kwh: 161.3,
        max_power_kw: 100.0,
    },
    BatteryModel {
        id: "LUNA-200",
        name: "LUNA2000-200KWH-2H1",
        capacity_kwh: 193.5,
        max_power_kw: 100.0,
    },
    BatteryModel {
        id: "LUNA-215",
        name: "LUNA2000-215-2S12",
        capacity_kwh: 215.0,
        max_power_kw: 100.0,
    },
];

/// A selected inverter model with its unit count.
#[derive(Debug, Clone)]
pub struct InverterUnit {
    /// The selected model.
    pub model: InverterModel,
    /// Number of units of this model.
    pub count: u32,
}

/// Result of inverter bank selection.
///
/// With an empty or unusable catalog the selection degrades to an analytic
/// AC figure (`target_dc_kw / dc_ac_ratio`) with no physical units.
#[derive(Debug, Clone)]
pub struct InverterSelection {
    /// Combined AC output of the selected bank (kW).
    pub total_ac_kw: f64,
    /// Combined DC input ceiling of the selected bank (kW).
    pub total_max_pv_kw: f64,
    /// Selected models in the order they were first added.
    pub units: Vec<InverterUnit>,
}

impl InverterSelection {
    /// Total number of physical units in the bank.
    pub fn unit_count(&self) -> u32 {
        self.units.iter().map(|u| u.count).sum()
    }
}

/// Upper bound on DC top-up passes; selections hitting it may still fall
/// short of the DC target.
const MAX_DC_TOPUP_ITERATIONS: u32 = 20;

/// Selects an inverter bank for a target DC capacity.
///
/// Greedy heuristic: compute the minimum AC requirement from the DC/AC
/// ratio and fill with the largest model; when the remaining AC need drops
/// below the largest model, take the smallest model that still covers it
/// (or the smallest available if none does). A second pass adds further
/// units of the largest model, bounded to [`MAX_DC_TOPUP_ITERATIONS`],
/// until the bank's combined DC input ceiling covers `target_dc_kw`.
///
/// # Arguments
///
/// * `target_dc_kw` - Target DC system size (kWp)
/// * `catalog` - Available inverter models
/// * `dc_ac_ratio` - Desired DC/AC oversizing ratio (values <= 0 or NaN
///   fall back to 1.25)
pub fn select_inverters(
    target_dc_kw: f64,
    catalog: &[InverterModel],
    dc_ac_ratio: f64,
) -> InverterSelection {
    let ratio = if dc_ac_ratio.is_finite() && dc_ac_ratio > 0.0 {
        dc_ac_ratio
    } else {
        1.25
    };

    if !(target_dc_kw > 0.0) {
        return InverterSelection {
            total_ac_kw: 0.0,
            total_max_pv_kw: 0.0,
            units: Vec::new(),
        };
    }

    // Usable models only: positive AC rating and direct PV input.
    let mut usable: Vec<&InverterModel> = catalog
        .iter()
        .filter(|m| m.ac_power_kw > 0.0 && m.max_pv_kw > 0.0)
        .collect();
    usable.sort_by(|a, b| b.ac_power_kw.total_cmp(&a.ac_power_kw));

    if usable.is_empty() {
        return InverterSelection {
            total_ac_kw: target_dc_kw / ratio,
            total_max_pv_kw: 0.0,
            units: Vec::new(),
        };
    }

    let largest = usable[0];
    let smallest = usable[usable.len() - 1];

    let mut selection = InverterSelection {
        total_ac_kw: 0.0,
        total_max_pv_kw: 0.0,
        units: Vec::new(),
    };
    let add = |sel: &mut InverterSelection, model: &InverterModel| {
        sel.total_ac_kw += model.ac_power_kw;
        sel.total_max_pv_kw += model.max_pv_kw;
        match sel.units.iter_mut().find(|u| u.model.id == model.id) {
            Some(unit) => unit.count += 1,
            None => sel.units.push(InverterUnit {
                model: model.clone(),
                count: 1,
            }),
        }
    };

    // First pass: meet the minimum AC requirement.
    let min_ac_required = target_dc_kw / ratio;
    let mut remaining_ac = min_ac_required;
    while remaining_ac > 0.0 {
        let pick = if remaining_ac < largest.ac_power_kw {
            usable
                .iter()
                .rev()
                .find(|m| m.ac_power_kw >= remaining_ac)
                .copied()
                .unwrap_or(smallest)
        } else {
            largest
        };
        add(&mut selection, pick);
        remaining_ac -= pick.ac_power_kw;
    }

    // Second pass: the bank must also accept the full DC array.
    let mut topup = 0;
    while selection.total_max_pv_kw < target_dc_kw && topup < MAX_DC_TOPUP_ITERATIONS {
        add(&mut selection, largest);
        topup += 1;
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_catalog_falls_back_to_analytic_ac() {
        let sel = select_inverters(500.0, &[], 1.25);
        assert!(sel.units.is_empty());
        assert!((sel.total_ac_kw - 400.0).abs() < 1e-9);
    }

    #[test]
    fn zero_target_selects_nothing() {
        let sel = select_inverters(0.0, INVERTER_CATALOG, 1.25);
        assert!(sel.units.is_empty());
        assert_eq!(sel.total_ac_kw, 0.0);
    }

    #[test]
    fn ac_meets_ratio_requirement() {
        let sel = select_inverters(1000.0, INVERTER_CATALOG, 1.25);
        assert!(sel.total_ac_kw >= 1000.0 / 1.25);
    }

    #[test]
    fn dc_ceiling_covers_target() {
        for target in [50.0, 130.0, 400.0, 1000.0, 1750.0] {
            let sel = select_inverters(target, INVERTER_CATALOG, 1.25);
            assert!(
                sel.total_max_pv_kw >= target,
                "target {target}: max_pv {} too small",
                sel.total_max_pv_kw
            );
        }
    }

    #[test]
    fn small_remainder_picks_best_fit_not_largest() {
        // 20 kWp / 1.25 = 16 kW AC needed: a 17 kW unit covers it, the
        // 150 kW flagship would be a gross overshoot.
        let sel = select_inverters(20.0, INVERTER_CATALOG, 1.25);
        assert_eq!(sel.unit_count(), 1);
        assert_eq!(sel.units[0].model.id, "17KTL-M5");
    }

    #[test]
    fn large_target_prefers_flagship_units() {
        let sel = select_inverters(1500.0, INVERTER_CATALOG, 1.25);
        let flagship = sel
            .units
            .iter()
            .find(|u| u.model.id == "150K-MG0")
            .map(|u| u.count)
            .unwrap_or(0);
        assert!(flagship >= 8, "expected mostly 150 kW units, got {sel:?}");
    }

    #[test]
    fn pcs_without_pv_input_is_never_selected() {
        let sel = select_inverters(2000.0, INVERTER_CATALOG, 1.25);
        assert!(sel.units.iter().all(|u| u.model.id != "100KTL-M1"));
    }

    #[test]
    fn battery_catalog_entries_are_plausible() {
        assert!(!BESS_CATALOG.is_empty());
        for m in BESS_CATALOG {
            assert!(m.capacity_kwh > 0.0, "{}", m.id);
            assert!(m.max_power_kw > 0.0, "{}", m.id);
        }
    }

    #[test]
    fn nan_ratio_falls_back() {
        let sel = select_inverters(100.0, INVERTER_CATALOG, f64::NAN);
        assert!(sel.total_ac_kw >= 100.0 / 1.25);
    }

    #[test]
    fn topup_cap_bounds_pathological_catalogs() {
        // A catalog whose only model has a tiny DC ceiling can never reach
        // a large DC target; the selector must still terminate.
        let tiny = [InverterModel {
            id: "TINY",
            name: "Tiny-5K",
            ac_power_kw: 5.0,
            max_pv_kw: 6.0,
            max_input_voltage_v: 1100.0,
            num_mppt: 1,
        }];
        let sel = select_inverters(10_000.0, &tiny, 1.25);
        assert!(sel.unit_count() > 0);
        // Known limit: the 20-iteration cap may leave the DC target unmet.
        assert!(sel.total_max_pv_kw < 10_000.0);
    }
}
