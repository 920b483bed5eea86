//! Commercial solar PV + battery sizing simulator and financial appraiser.
//!
//! Given a measured load time series and a candidate solar + BESS design,
//! this crate simulates hour-by-hour energy dispatch under a three-band
//! time-of-use tariff, projects a multi-year cash flow (NPV, IRR, payback,
//! LCOE), and searches the design space for the configuration with the
//! shortest payback period.

/// Conservative zero-export sizing heuristic.
pub mod advisor;
pub mod config;
/// Multi-year cash-flow projection and appraisal metrics.
pub mod finance;
/// Hardware catalogs and the inverter bank selector.
pub mod hardware;
pub mod io;
pub mod optimizer;
pub mod series;
/// Energy dispatch simulation engine and result types.
pub mod sim;
pub mod tou;
