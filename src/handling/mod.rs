//! handling - engine-agnostic arcade handling models (pure types + per-step solvers)

pub mod types;
pub mod math;
pub mod steering;
pub mod longitudinal;
pub mod drift;
pub mod boost;
pub mod visual;

pub use types::*;
pub use boost::{BoostPhase, BoostReservoir};
pub use drift::{CounterDrift, GripMode};
pub use longitudinal::{BrakeDecision, BrakeReason};
pub use steering::SteeringState;
