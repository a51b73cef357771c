//! Property tests for the handling models.

use proptest::prelude::*;

use arcade_drive::VehicleSettings;
use arcade_drive::handling::boost::BoostReservoir;
use arcade_drive::handling::drift::{self, CounterDriftInput, GripMode};
use arcade_drive::handling::longitudinal::{
    BrakeReason, HOLD_GAS_DEADZONE, HOLD_SPEED, MOVING_THRESHOLD, brake_decision,
};
use arcade_drive::handling::steering::target_steering_angle;
use arcade_drive::handling::types::{LOCAL_FORWARD, MotionState, Vec3};

fn sliding(slip_angle: f32, speed: f32) -> CounterDriftInput {
    CounterDriftInput {
        slip_angle,
        speed,
        gas: 1.0,
        drift_held: true,
        fully_grounded: true,
        lateral_velocity: 5.0,
        forward_velocity: 0.0,
        yaw_rate: -1.0,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn prop_brake_has_exactly_one_reason(
        gas in -1.0f32..=1.0,
        moving in -30.0f32..30.0,
        speed in 0.0f32..30.0,
    ) {
        let d = brake_decision(gas, moving, speed);
        let reversing = moving < -MOVING_THRESHOLD && gas > 0.0;
        let decelerating = !reversing && moving > MOVING_THRESHOLD && gas < 0.0;
        let hold = !reversing && !decelerating && speed < HOLD_SPEED && gas.abs() < HOLD_GAS_DEADZONE;

        let expected = if reversing {
            BrakeReason::Reversing
        } else if decelerating {
            BrakeReason::Decelerating
        } else if hold {
            BrakeReason::Hold
        } else {
            BrakeReason::Released
        };
        prop_assert_eq!(d.reason, expected);
        prop_assert!((0.0..=1.0).contains(&d.input));
        match d.reason {
            BrakeReason::Reversing | BrakeReason::Decelerating => prop_assert_eq!(d.input, gas.abs()),
            BrakeReason::Hold => prop_assert_eq!(d.input, 1.0),
            BrakeReason::Released => prop_assert_eq!(d.input, 0.0),
        }
    }

    #[test]
    fn prop_target_steer_within_ninety_degrees(
        steer in -1.0f32..=1.0,
        speed in 0.0f32..80.0,
        vx in -40.0f32..40.0,
        vz in -40.0f32..40.0,
        slip in 0.0f32..180.0,
    ) {
        let s = VehicleSettings::default();
        let m = MotionState { velocity: Vec3::new(vx, 0.0, vz), ..MotionState::default() };
        let t = target_steering_angle(&s, &m, steer, speed, slip);
        prop_assert!((-90.0..=90.0).contains(&t), "target {} out of range", t);
    }

    #[test]
    fn prop_boost_stays_within_reservoir(
        held in proptest::collection::vec(any::<bool>(), 1..400),
        dt in 0.005f32..0.05,
    ) {
        let s = VehicleSettings::default();
        let mut r = BoostReservoir::full(&s);
        for h in held {
            let was_boosting = h && r.remaining > 0.0;
            let before = r.remaining;
            let f = r.tick(&s, h, LOCAL_FORWARD, dt);
            prop_assert!((0.0..=s.max_boost).contains(&r.remaining));
            prop_assert_eq!(f.is_some(), was_boosting);
            if h {
                // pinned while held, even on an empty tank
                prop_assert_eq!(r.cooldown, s.max_boost_recharge_cooldown);
                if !was_boosting {
                    prop_assert_eq!(r.remaining, before);
                }
            } else if before < s.max_boost && r.cooldown > 0.0 {
                // cooling down: reservoir flat
                prop_assert_eq!(r.remaining, before);
            }
        }
    }

    #[test]
    fn prop_counter_drift_zero_at_or_below_start(
        slip in 0.0f32..=60.0,
        speed in 0.0f32..50.0,
        lateral in -20.0f32..20.0,
        yaw in -5.0f32..5.0,
    ) {
        let s = VehicleSettings::default();
        let i = CounterDriftInput { lateral_velocity: lateral, yaw_rate: yaw, ..sliding(slip, speed) };
        prop_assert_eq!(drift::solve_counter_drift(&s, &i).magnitude, 0.0);
    }

    #[test]
    fn prop_counter_drift_monotone_and_saturating(
        a in 60.0f32..=120.0,
        b in 60.0f32..=120.0,
        speed in 10.0f32..40.0,
    ) {
        let s = VehicleSettings::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let m_lo = drift::counter_drift_magnitude(&s, lo, speed);
        let m_hi = drift::counter_drift_magnitude(&s, hi, speed);
        prop_assert!(m_lo <= m_hi);
        if lo >= s.max_drift_angle_stop {
            prop_assert_eq!(m_lo, s.max_counter_drift_angular_accel);
        }
    }

    #[test]
    fn prop_rear_friction_follows_drift_button(held in any::<bool>()) {
        let s = VehicleSettings::default();
        let k = GripMode::from_input(held).rear_stiffness(&s);
        let expected = if held { s.drift_wheel_friction } else { s.normal_wheel_friction };
        prop_assert_eq!(k, expected);
    }
}
