//! Power-up sequencing
//!
//! Torque comes up in two phases: legs are held at a low current while
//! they travel to the startup vector, then raised to the operating level.

use crate::hardware::MotorBackend;
use crate::state::ActuatorState;
use crate::{Error, Result};

use super::config::{CurrentProfile, StartupConfig};
use super::control_loop::StopSignal;

/// Bring the motors from rest to the startup vector
///
/// Any backend failure here is fatal and returned as is. If `stop` fires
/// during the settle wait, returns [`Error::Interrupted`] with the legs
/// still at their initial current.
pub fn power_up(
    backend: &dyn MotorBackend,
    state: &ActuatorState,
    profile: &CurrentProfile,
    startup: &StartupConfig,
    stop: &StopSignal,
) -> Result<()> {
    profile.validate()?;

    let initial = profile.initial_currents();
    tracing::info!("{}: initial leg currents {:?}", backend.name(), initial);
    backend.set_leg_goal_currents(initial)?;

    backend.enable_torque()?;
    tracing::info!("{}: torque enabled", backend.name());

    let vector = state.positions();
    backend.set_goal_positions(vector)?;
    tracing::info!(
        "Moving to startup vector {:?}, settling for {:?}",
        vector.map(|a| a.to_degrees().round()),
        startup.settle
    );

    if !stop.sleep(startup.settle) {
        return Err(Error::Interrupted(
            "stopped while settling at the startup vector".into(),
        ));
    }

    let operating = profile.operating_currents();
    backend.set_leg_goal_currents(operating)?;
    tracing::info!("{}: operating leg currents {:?}", backend.name(), operating);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{BackendEvent, SimulatedBackend, NUM_LEGS};
    use crate::kinematics::StewartIk;
    use std::time::Duration;

    fn quick_startup() -> StartupConfig {
        StartupConfig::default().with_settle(Duration::ZERO)
    }

    #[test]
    fn test_power_up_sequence() {
        let backend = SimulatedBackend::new();
        let startup = quick_startup();
        let state = startup.initial_state(StewartIk::default());
        let profile = CurrentProfile::new(10, 40).with_ratios([1.0, 1.0, 0.5, 0.5, 1.25, 1.0]);

        power_up(&backend, &state, &profile, &startup, &StopSignal::new()).unwrap();

        assert_eq!(
            backend.events(),
            vec![
                BackendEvent::LegCurrents([10; NUM_LEGS]),
                BackendEvent::TorqueEnabled,
                BackendEvent::GoalPositions(ActuatorState::startup_vector()),
                BackendEvent::LegCurrents([40, 40, 20, 20, 50, 40]),
            ]
        );
    }

    #[test]
    fn test_interrupted_settle_keeps_initial_current() {
        let backend = SimulatedBackend::new();
        let startup = StartupConfig::default();
        let state = startup.initial_state(StewartIk::default());
        let stop = StopSignal::new();
        stop.stop();

        let result = power_up(&backend, &state, &CurrentProfile::default(), &startup, &stop);

        assert!(matches!(result, Err(Error::Interrupted(_))));
        assert_eq!(backend.leg_currents(), Some([30; NUM_LEGS]));
        assert_eq!(backend.events().len(), 3);
    }

    #[test]
    fn test_invalid_profile_touches_nothing() {
        let backend = SimulatedBackend::new();
        let startup = quick_startup();
        let state = startup.initial_state(StewartIk::default());
        let profile = CurrentProfile::new(-5, 30);

        let result = power_up(&backend, &state, &profile, &startup, &StopSignal::new());
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(backend.events().is_empty());
    }

    #[test]
    fn test_backend_failure_is_fatal() {
        let backend = SimulatedBackend::new();
        backend.set_fail_writes(true);
        let startup = quick_startup();
        let state = startup.initial_state(StewartIk::default());

        let result = power_up(
            &backend,
            &state,
            &CurrentProfile::default(),
            &startup,
            &StopSignal::new(),
        );
        assert!(matches!(result, Err(Error::Communication(_))));
        assert!(!backend.torque_enabled());
    }
}
