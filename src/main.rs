//! Sizing tool entry point — CLI wiring for simulation, optimization,
//! and capacity advice.

use std::path::Path;
use std::process;

use pv_sizer::advisor::suggest_safe_capacity;
use pv_sizer::config::AppConfig;
use pv_sizer::finance::appraise;
use pv_sizer::hardware::{INVERTER_CATALOG, select_inverters};
use pv_sizer::io::export::{export_cash_flow_csv, export_steps_csv};
use pv_sizer::io::import::read_series_file;
use pv_sizer::optimizer::optimize;
use pv_sizer::series::TimeSeriesPoint;
use pv_sizer::sim::{DispatchStrategy, SystemDesign, simulate};

/// Parsed CLI arguments.
struct CliArgs {
    series_path: Option<String>,
    config_path: Option<String>,
    demo: bool,
    suggest: bool,
    kwp: Option<f64>,
    bess_kwh: f64,
    bess_kw: f64,
    tou: bool,
    grid_charge: bool,
    steps_out: Option<String>,
    cashflow_out: Option<String>,
}

fn print_help() {
    eprintln!("pv-sizer — Commercial solar + storage sizing and appraisal tool");
    eprintln!();
    eprintln!("Usage: pv-sizer [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --series <path>       Load/irradiance time series CSV");
    eprintln!("  --demo                Use a built-in synthetic year instead of a CSV");
    eprintln!("  --config <path>       Load parameters from TOML config file");
    eprintln!("  --suggest             Print the safe zero-export capacity and exit");
    eprintln!("  --kwp <f64>           Evaluate a single design instead of searching");
    eprintln!("  --bess-kwh <f64>      Battery capacity for the single design (default 0)");
    eprintln!("  --bess-kw <f64>       Battery power for the single design (default kwh/2)");
    eprintln!("  --tou                 Use TOU peak shaving instead of self-consumption");
    eprintln!("  --grid-charge         Allow off-peak grid charging of the battery");
    eprintln!("  --steps-out <path>    Export the per-step dispatch trace to CSV");
    eprintln!("  --cashflow-out <path> Export the cash-flow table to CSV");
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("Without --suggest or --kwp, a full design search is run.");
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("error: {flag} requires an argument");
        process::exit(1);
    }
    args[*i].clone()
}

fn take_f64(args: &[String], i: &mut usize, flag: &str) -> f64 {
    let raw = take_value(args, i, flag);
    match raw.parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("error: {flag} value \"{raw}\" is not a valid number");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        series_path: None,
        config_path: None,
        demo: false,
        suggest: false,
        kwp: None,
        bess_kwh: 0.0,
        bess_kw: 0.0,
        tou: false,
        grid_charge: false,
        steps_out: None,
        cashflow_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--series" => cli.series_path = Some(take_value(&args, &mut i, "--series")),
            "--config" => cli.config_path = Some(take_value(&args, &mut i, "--config")),
            "--demo" => cli.demo = true,
            "--suggest" => cli.suggest = true,
            "--kwp" => cli.kwp = Some(take_f64(&args, &mut i, "--kwp")),
            "--bess-kwh" => cli.bess_kwh = take_f64(&args, &mut i, "--bess-kwh"),
            "--bess-kw" => cli.bess_kw = take_f64(&args, &mut i, "--bess-kw"),
            "--tou" => cli.tou = true,
            "--grid-charge" => cli.grid_charge = true,
            "--steps-out" => cli.steps_out = Some(take_value(&args, &mut i, "--steps-out")),
            "--cashflow-out" => {
                cli.cashflow_out = Some(take_value(&args, &mut i, "--cashflow-out"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Builds a deterministic synthetic year: hourly points with a weekday
/// factory load shape and a clear-sky bell modulated by season.
fn demo_series() -> Vec<TimeSeriesPoint> {
    use chrono::{Datelike, NaiveDate};

    let mut series = Vec::with_capacity(365 * 24);
    let mut date = match NaiveDate::from_ymd_opt(2024, 1, 1) {
        Some(d) => d,
        None => return series,
    };
    for day in 0..365 {
        let season = 0.85 + 0.15 * (2.0 * std::f64::consts::PI * (day as f64 - 170.0) / 365.0).cos();
        let weekday = date.weekday().number_from_monday() <= 6;
        for h in 0..24 {
            let working = weekday && (7..19).contains(&h);
            let load_kw = if working { 420.0 } else { 180.0 };
            let solar_unit = if (6..18).contains(&h) {
                season * (std::f64::consts::PI * (h as f64 - 6.0) / 12.0).sin()
            } else {
                0.0
            };
            series.push(TimeSeriesPoint::new(
                date.and_hms_opt(h, 0, 0),
                load_kw,
                solar_unit,
            ));
        }
        date = match date.succ_opt() {
            Some(d) => d,
            None => break,
        };
    }
    series
}

fn main() {
    let cli = parse_args();

    let config = if let Some(ref path) = cli.config_path {
        match AppConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        AppConfig::default()
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let series = if cli.demo {
        demo_series()
    } else if let Some(ref path) = cli.series_path {
        match read_series_file(Path::new(path)) {
            Ok(series) => series,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        eprintln!("error: either --series <path> or --demo is required");
        process::exit(1);
    };
    if series.is_empty() {
        eprintln!("error: the input series contains no rows");
        process::exit(1);
    }

    if cli.suggest {
        match suggest_safe_capacity(&series, &config.technical.losses) {
            Some(kwp) => println!("Safe zero-export capacity: {kwp:.0} kWp"),
            None => {
                eprintln!("error: the series has no usable timestamped load data");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(kwp) = cli.kwp {
        run_single_design(kwp, &cli, &config, &series);
        return;
    }

    run_search(&cli, &config, &series);
}

fn run_single_design(kwp: f64, cli: &CliArgs, config: &AppConfig, series: &[TimeSeriesPoint]) {
    let strategy = if cli.tou {
        DispatchStrategy::PeakShavingTou
    } else {
        DispatchStrategy::SelfConsumption
    };
    let bess_kw = if cli.bess_kw > 0.0 {
        cli.bess_kw
    } else {
        cli.bess_kwh / 2.0
    };
    let mut design = SystemDesign::with_battery(kwp, cli.bess_kwh, bess_kw, strategy);
    design.grid_charge_enabled = cli.grid_charge;

    let selection = select_inverters(kwp, INVERTER_CATALOG, config.technical.dc_ac_ratio);
    let mut tech = config.technical.clone();
    tech.inverter_max_ac_kw = tech.inverter_max_ac_kw.min(selection.total_ac_kw);

    let sim = simulate(series, &design, &tech);
    let battery_capex = cli.bess_kwh * config.financial.bess_price_per_kwh;
    let capex = kwp * config.financial.solar_price_per_kwp + battery_capex;
    let financials = appraise(capex, battery_capex, &sim, &config.prices, &config.financial);

    println!("Design: {kwp:.0} kWp / {:.0} kWh / {bess_kw:.0} kW", cli.bess_kwh);
    for unit in &selection.units {
        println!("  {}x {}", unit.count, unit.model.name);
    }
    println!("Capex: {capex:.0}");
    println!();
    println!("{sim}");
    println!();
    println!("{financials}");

    export_outputs(cli, &sim.steps, &financials.cash_flows);
}

fn run_search(cli: &CliArgs, config: &AppConfig, series: &[TimeSeriesPoint]) {
    let outcome = optimize(
        series,
        INVERTER_CATALOG,
        &config.prices,
        &config.financial,
        &config.technical,
        &config.search,
    );
    let Some(outcome) = outcome else {
        eprintln!("error: no design candidates could be evaluated");
        process::exit(1);
    };

    let best = &outcome.best;
    println!(
        "Best design: {:.0} kWp / {:.0} kWh / {:.0} kW (capex {:.0})",
        best.solar_kwp, best.bess_kwh, best.bess_kw, best.capex
    );
    for unit in &best.inverters.units {
        println!("  {}x {}", unit.count, unit.model.name);
    }
    println!();
    println!("{}", best.financials);
    println!();
    println!("Top candidates of {} evaluated:", outcome.all.len());
    println!("  {:>8}  {:>9}  {:>8}  {:>10}", "kWp", "kWh", "payback", "npv");
    for c in outcome.all.iter().take(10) {
        println!(
            "  {:>8.0}  {:>9.0}  {:>8.1}  {:>10.0}",
            c.solar_kwp, c.bess_kwh, c.financials.payback_years, c.financials.npv
        );
    }

    // candidates carry no step traces, rerun the winner when one is asked for
    let steps = cli.steps_out.as_ref().map(|_| {
        let mut design = SystemDesign::with_battery(
            best.solar_kwp,
            best.bess_kwh,
            best.bess_kw,
            DispatchStrategy::PeakShavingTou,
        );
        design.grid_charge_enabled = false;
        let mut tech = config.technical.clone();
        tech.inverter_max_ac_kw = best.inverters.total_ac_kw;
        simulate(series, &design, &tech).steps
    });
    export_outputs(
        cli,
        steps.as_deref().unwrap_or(&[]),
        &best.financials.cash_flows,
    );
}

fn export_outputs(
    cli: &CliArgs,
    steps: &[pv_sizer::sim::StepSnapshot],
    cash_flows: &[pv_sizer::finance::YearCashFlow],
) {
    if let Some(ref path) = cli.steps_out {
        if let Err(e) = export_steps_csv(steps, Path::new(path)) {
            eprintln!("error: failed to write step trace: {e}");
            process::exit(1);
        }
        eprintln!("Step trace written to {path}");
    }
    if let Some(ref path) = cli.cashflow_out {
        if let Err(e) = export_cash_flow_csv(cash_flows, Path::new(path)) {
            eprintln!("error: failed to write cash-flow table: {e}");
            process::exit(1);
        }
        eprintln!("Cash-flow table written to {path}");
    }
}
