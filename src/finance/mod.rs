//! Multi-year financial appraisal: debt service, cash-flow projection,
//! and investment metrics.

pub mod appraiser;
pub mod loan;
pub mod types;

pub use appraiser::appraise;
pub use loan::{LoanSchedule, monthly_payment};
pub use types::{FinancialResult, YearCashFlow};
