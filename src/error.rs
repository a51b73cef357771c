//! Error types for settings, curves, controller construction and server config.

use thiserror::Error;

use crate::handling::WheelId;

/// Curve keyframe validation failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    #[error("curve has no keyframes")]
    Empty,

    #[error("keyframe {index} time {time} is not after the previous key")]
    Unsorted { index: usize, time: f32 },

    #[error("keyframe {index} has a non-finite component")]
    NonFinite { index: usize },
}

/// Rejected vehicle tuning.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("setting `{field}` is not finite")]
    NonFinite { field: &'static str },

    #[error("setting `{field}` must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    #[error("curve `{name}` is invalid: {source}")]
    Curve {
        name: &'static str,
        #[source]
        source: CurveError,
    },

    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings file: {0}")]
    Io(#[from] std::io::Error),
}

/// Tuning that loads fine but disables a feature.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsWarning {
    #[error("drift angle stop ({stop}) <= start ({start}); counter-drift torque is disabled")]
    DriftAngleBand { start: f32, stop: f32 },

    #[error(
        "counter-drift stop speed ({stop}) <= start speed ({start}); counter-drift torque is disabled"
    )]
    CounterDriftSpeedBand { start: f32, stop: f32 },

    #[error("boost recharge rate ({rate}) is negative; boost never recharges")]
    NegativeBoostRecharge { rate: f32 },
}

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("particle emitters wired for some wheels but missing for {missing:?}")]
    PartialParticleWiring { missing: Vec<WheelId> },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} is malformed: {reason}")]
    Malformed { name: &'static str, reason: String },
}
