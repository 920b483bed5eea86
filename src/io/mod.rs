//! CSV input and output: load/irradiance series import, step and
//! cash-flow export.

pub mod export;
pub mod import;

pub use export::{export_cash_flow_csv, export_steps_csv, write_cash_flow_csv, write_steps_csv};
pub use import::{IoError, read_series_csv, read_series_file};
