//! CSV export for simulation step traces and cash-flow tables.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::finance::YearCashFlow;
use crate::sim::StepSnapshot;

/// Column header for the per-step trace export.
const STEPS_HEADER: &str = "timestamp,load_kwh,solar_kwh,soc_kwh,charge_solar_kwh,\
                            charge_grid_kwh,discharge_kwh,exported_kwh,curtailed_kwh,\
                            grid_import_kwh";

/// Column header for the cash-flow table export.
const CASH_FLOW_HEADER: &str = "year,revenue,om_cost,insurance_cost,replacement_cost,\
                                debt_interest,debt_principal,tax_paid,depreciation,\
                                net,accumulated";

/// Exports the per-step dispatch trace to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_steps_csv(steps: &[StepSnapshot], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_steps_csv(steps, io::BufWriter::new(file))
}

/// Writes the per-step dispatch trace as CSV to any writer.
///
/// One row per simulation step, in input order; deterministic for
/// identical inputs. Steps without a timestamp emit an empty first cell.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_steps_csv(steps: &[StepSnapshot], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(STEPS_HEADER.split(',').map(str::trim))?;
    for s in steps {
        wtr.write_record(&[
            s.timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            format!("{:.4}", s.load_kwh),
            format!("{:.4}", s.solar_kwh),
            format!("{:.4}", s.soc_kwh),
            format!("{:.4}", s.charge_from_solar_kwh),
            format!("{:.4}", s.charge_from_grid_kwh),
            format!("{:.4}", s.discharge_kwh),
            format!("{:.4}", s.exported_kwh),
            format!("{:.4}", s.curtailed_kwh),
            format!("{:.4}", s.grid_import_kwh),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the projected cash-flow table to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_cash_flow_csv(rows: &[YearCashFlow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_cash_flow_csv(rows, io::BufWriter::new(file))
}

/// Writes the projected cash-flow table as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_cash_flow_csv(rows: &[YearCashFlow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(CASH_FLOW_HEADER.split(',').map(str::trim))?;
    for r in rows {
        wtr.write_record(&[
            r.year.to_string(),
            format!("{:.0}", r.revenue),
            format!("{:.0}", r.om_cost),
            format!("{:.0}", r.insurance_cost),
            format!("{:.0}", r.replacement_cost),
            format!("{:.0}", r.debt_interest),
            format!("{:.0}", r.debt_principal),
            format!("{:.0}", r.tax_paid),
            format!("{:.0}", r.depreciation),
            format!("{:.0}", r.net),
            format!("{:.0}", r.accumulated),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
