//! Simulation-to-appraisal pipeline checks.

use chrono::NaiveDate;
use pv_sizer::config::{AppConfig, LossFactors};
use pv_sizer::finance::appraise;
use pv_sizer::io::write_cash_flow_csv;
use pv_sizer::series::TimeSeriesPoint;
use pv_sizer::sim::{SystemDesign, simulate};

/// A week of hourly data with a midday solar bell.
fn week(load_kw: f64) -> Vec<TimeSeriesPoint> {
    let mut series = Vec::new();
    for day in 1..=7 {
        for h in 0..24 {
            let ts = NaiveDate::from_ymd_opt(2024, 1, day).and_then(|d| d.and_hms_opt(h, 0, 0));
            let solar_unit = if (6..18).contains(&h) {
                (std::f64::consts::PI * (h as f64 - 6.0) / 12.0).sin()
            } else {
                0.0
            };
            series.push(TimeSeriesPoint::new(ts, load_kw, solar_unit));
        }
    }
    series
}

#[test]
fn appraisal_follows_simulated_revenue() {
    let mut config = AppConfig::default();
    config.technical.losses = LossFactors::none();
    let series = week(200.0);
    let design = SystemDesign::solar_only(250.0);
    let sim = simulate(&series, &design, &config.technical);

    let capex = 250.0 * config.financial.solar_price_per_kwp;
    let result = appraise(capex, 0.0, &sim, &config.prices, &config.financial);

    let expected_revenue = sim.used_by_band.peak * config.prices.peak
        + sim.used_by_band.normal * config.prices.normal
        + sim.used_by_band.off_peak * config.prices.off_peak;
    assert!((result.first_year_revenue - expected_revenue).abs() < 1e-6);
    assert_eq!(
        result.cash_flows.len(),
        config.financial.years as usize + 1
    );
    assert!((result.cash_flows[0].accumulated + capex).abs() < 1e-6);
}

#[test]
fn accumulated_flows_are_cumulative() {
    let config = AppConfig::default();
    let series = week(150.0);
    let design = SystemDesign::solar_only(180.0);
    let sim = simulate(&series, &design, &config.technical);
    let capex = 180.0 * config.financial.solar_price_per_kwp;
    let result = appraise(capex, 0.0, &sim, &config.prices, &config.financial);

    let mut running = 0.0;
    for row in &result.cash_flows {
        running += row.net;
        assert!((row.accumulated - running).abs() < 1e-6, "year {}", row.year);
    }
}

#[test]
fn cash_flow_table_exports_cleanly() {
    let config = AppConfig::default();
    let series = week(150.0);
    let design = SystemDesign::solar_only(180.0);
    let sim = simulate(&series, &design, &config.technical);
    let result = appraise(
        2_160_000_000.0,
        0.0,
        &sim,
        &config.prices,
        &config.financial,
    );

    let mut buf = Vec::new();
    write_cash_flow_csv(&result.cash_flows, &mut buf).ok();
    let text = String::from_utf8(buf).unwrap_or_default();
    // header + year 0 + 20 project years
    assert_eq!(text.lines().count(), 22);
    assert!(text.lines().next().unwrap_or("").starts_with("year,revenue"));
}

#[test]
fn more_solar_never_reduces_first_year_revenue() {
    let mut config = AppConfig::default();
    config.technical.losses = LossFactors::none();
    let series = week(300.0);

    let mut previous = 0.0;
    for kwp in [100.0, 200.0, 300.0] {
        let sim = simulate(&series, &SystemDesign::solar_only(kwp), &config.technical);
        let result = appraise(
            kwp * config.financial.solar_price_per_kwp,
            0.0,
            &sim,
            &config.prices,
            &config.financial,
        );
        assert!(result.first_year_revenue >= previous);
        previous = result.first_year_revenue;
    }
}
