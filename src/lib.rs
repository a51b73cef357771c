//! Arcade vehicle handling controller.
//!
//! [`controller::VehicleController`] turns driver input plus rigid-body motion
//! into wheel commands, forces and torques at two cadences: a variable visual
//! rate (`step`) and a fixed physics rate (`fixed_step`). The handling models
//! under [`handling`] are engine-agnostic; `physics`, `suspension_contact`,
//! `tire`, `state` and `net` form a rapier3d-backed demo host served over
//! WebSocket by the `arcade-drive` binary.

pub mod config;
pub mod controller;
pub mod curve;
pub mod error;
pub mod handling;
pub mod settings;

pub mod net;
pub mod physics;
pub mod state;
pub mod suspension_contact;
pub mod tire;

pub use controller::{ControllerSnapshot, PhysicsCommands, VehicleController, VisualCommands};
pub use error::{ConfigError, ControllerError, CurveError, SettingsError, SettingsWarning};
pub use settings::VehicleSettings;
