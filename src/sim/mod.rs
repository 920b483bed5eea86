//! Energy dispatch simulation: battery model, engine, and result types.

/// Stateful BESS model with efficiency losses and DoD floor.
pub mod battery;
pub mod engine;
pub mod types;

pub use battery::BatteryState;
pub use engine::{DispatchEngine, simulate};
pub use types::{DispatchStrategy, SimulationResult, StepSnapshot, SystemDesign};
