// ==============================================================================
// boost.rs — BOOST RESERVOIR STATE MACHINE (fixed rate)
// ==============================================================================
// Exactly one branch per tick, in priority order:
//   1) held                     -> cooldown = max_cooldown         (pinned while held)
//      && remaining > 0         -> force = forward * boost_force (Force mode, COM)
//                                  remaining = max(remaining - dt, 0)
//      && remaining == 0        -> nothing (tank stays empty until release)
//   2) remaining < max && cooldown == 0
//                               -> remaining = clamp(remaining + rate * dt, 0, max)
//   3) cooldown > 0             -> cooldown = max(cooldown - dt, 0)
//
// The reservoir is measured in seconds of boosting, so depletion is 1 * dt.
// Releasing boost leaves the reservoir flat until the cooldown has run out.
// A negative recharge rate counts as 0 (recharge disabled).
// ==============================================================================

use serde::Serialize;
use tracing::debug;

use crate::handling::types::{ForceCommand, ForceMode, Vec3};
use crate::settings::VehicleSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoostPhase {
    Boosting,
    CoolingDown,
    Charging,
    /// Reservoir at max, nothing pending.
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoostReservoir {
    pub remaining: f32,
    pub cooldown: f32,
    pub phase: BoostPhase,
}

impl BoostReservoir {
    /// A freshly spawned vehicle starts with a full tank.
    pub fn full(settings: &VehicleSettings) -> Self {
        Self { remaining: settings.max_boost, cooldown: 0.0, phase: BoostPhase::Full }
    }

    /// Advance one physics tick. Returns the forward boost force, if any.
    pub fn tick(
        &mut self,
        settings: &VehicleSettings,
        held: bool,
        forward: Vec3,
        dt: f32,
    ) -> Option<ForceCommand> {
        let max = settings.max_boost;
        let mut force = None;

        let phase = if held {
            self.cooldown = settings.max_boost_recharge_cooldown;
            if self.remaining > 0.0 {
                self.remaining = (self.remaining - dt).max(0.0);
                if settings.boost_force != 0.0 {
                    force = Some(ForceCommand {
                        force: forward * settings.boost_force,
                        at_point: None,
                        mode: ForceMode::Force,
                    });
                }
                BoostPhase::Boosting
            } else {
                BoostPhase::CoolingDown
            }
        } else if self.remaining < max && self.cooldown <= 0.0 {
            let rate = settings.boost_recharge_rate.max(0.0);
            self.remaining = (self.remaining + rate * dt).min(max).max(0.0);
            BoostPhase::Charging
        } else if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
            BoostPhase::CoolingDown
        } else {
            BoostPhase::Full
        };

        if phase != self.phase {
            debug!(from = ?self.phase, to = ?phase, remaining = self.remaining, "boost phase");
            self.phase = phase;
        }
        force
    }

    /// Reservoir fill, 0..1.
    pub fn fraction(&self, settings: &VehicleSettings) -> f32 {
        if settings.max_boost > 0.0 { self.remaining / settings.max_boost } else { 0.0 }
    }
}
