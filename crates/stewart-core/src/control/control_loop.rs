//! Rate-limited teleop loop
//!
//! Polls input at a short interval but dispatches to the backend at most
//! once per update interval. Snapshots arriving between dispatches are
//! discarded, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use arrayvec::ArrayVec;

use crate::hardware::{ActuatorVector, MotorBackend};
use crate::input::{InputSnapshot, InputSource};
use crate::state::ActuatorState;
use crate::Result;

use super::config::TeleopConfig;
use super::intent::{interpret, ControlIntent, MAX_INTENTS_PER_TICK};

/// Longest single sleep while waiting on a [`StopSignal`]
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Cloneable operator-interrupt flag
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create a signal that has not fired
    pub fn new() -> Self {
        Self::default()
    }

    /// Request every holder of this signal to stop
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// Whether [`stop`](Self::stop) has been called
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Sleep for `duration` in short slices, waking early on stop
    ///
    /// Returns `true` if the full duration elapsed, `false` if the signal
    /// fired first.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

/// Intents applied by one dispatched tick
pub type TickIntents = ArrayVec<ControlIntent, MAX_INTENTS_PER_TICK>;

/// What a tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Inside the rate-limit window; input discarded, nothing sent
    Skipped,
    /// Intents applied and the resulting vector forwarded
    Dispatched { intents: TickIntents },
}

impl TickOutcome {
    /// Whether the tick reached the backend
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

/// Counters for a teleop session
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeleopStats {
    /// Snapshots processed
    pub ticks: u64,
    /// Ticks that reached the backend
    pub dispatches: u64,
    /// Ticks dropped by rate limiting
    pub skipped: u64,
    /// Input polls that failed
    pub input_failures: u64,
    /// Goal-position writes that failed
    pub write_failures: u64,
    /// Feedback reads that failed
    pub feedback_failures: u64,
    /// Slowest backend round trip of a dispatched tick
    pub max_dispatch_time: Duration,
}

impl TeleopStats {
    /// Fraction of dispatches whose write failed (0.0 to 1.0)
    pub fn write_failure_ratio(&self) -> f64 {
        if self.dispatches == 0 {
            0.0
        } else {
            self.write_failures as f64 / self.dispatches as f64
        }
    }
}

/// Owns the actuator state and drives a motor backend from operator input
pub struct TeleopLoop {
    backend: Arc<dyn MotorBackend>,
    state: ActuatorState,
    config: TeleopConfig,
    last_dispatch: Option<Instant>,
    last_feedback: Option<ActuatorVector>,
    stats: TeleopStats,
}

impl TeleopLoop {
    /// Create a loop that starts from `state`
    pub fn new(
        backend: Arc<dyn MotorBackend>,
        state: ActuatorState,
        config: TeleopConfig,
    ) -> Self {
        Self {
            backend,
            state,
            config,
            last_dispatch: None,
            last_feedback: None,
            stats: TeleopStats::default(),
        }
    }

    /// Current commanded state
    pub fn state(&self) -> &ActuatorState {
        &self.state
    }

    /// Loop configuration
    pub fn config(&self) -> &TeleopConfig {
        &self.config
    }

    /// Counters so far
    pub fn stats(&self) -> TeleopStats {
        self.stats
    }

    /// Most recent positions read back from the motors
    ///
    /// Only refreshed when feedback is enabled. Never fed back into the
    /// commanded state.
    pub fn last_feedback(&self) -> Option<ActuatorVector> {
        self.last_feedback
    }

    /// Process one snapshot now
    pub fn tick(&mut self, snapshot: &InputSnapshot) -> TickOutcome {
        self.tick_at(snapshot, Instant::now())
    }

    /// Process one snapshot as if observed at `now`
    ///
    /// The first tick always dispatches. Later ticks dispatch only once the
    /// update interval has elapsed since the previous dispatch.
    pub fn tick_at(&mut self, snapshot: &InputSnapshot, now: Instant) -> TickOutcome {
        self.stats.ticks += 1;

        if let Some(last) = self.last_dispatch {
            if now.saturating_duration_since(last) < self.config.update_interval {
                self.stats.skipped += 1;
                return TickOutcome::Skipped;
            }
        }

        let intents = interpret(snapshot, &self.config.mapping);
        for intent in &intents {
            if !matches!(intent, ControlIntent::NoOp) {
                tracing::debug!("Applying {:?}", intent);
            }
            intent.apply(&mut self.state);
        }

        self.dispatch();
        self.last_dispatch = Some(now);
        TickOutcome::Dispatched { intents }
    }

    fn dispatch(&mut self) {
        let start = Instant::now();
        self.stats.dispatches += 1;

        if let Err(e) = self.backend.set_goal_positions(self.state.positions()) {
            self.stats.write_failures += 1;
            tracing::warn!("{}: goal position write failed: {}", self.backend.name(), e);
        }

        if self.config.read_feedback {
            match self.backend.read_all_positions() {
                Ok(positions) => self.last_feedback = Some(positions),
                Err(e) => {
                    self.stats.feedback_failures += 1;
                    tracing::warn!("{}: position read failed: {}", self.backend.name(), e);
                }
            }
        }

        let elapsed = start.elapsed();
        if !self.config.update_interval.is_zero() && elapsed > self.config.update_interval {
            tracing::warn!(
                "{}: dispatch took {:?}, longer than the update interval",
                self.backend.name(),
                elapsed
            );
        }
        self.stats.max_dispatch_time = self.stats.max_dispatch_time.max(elapsed);
    }

    /// Run until `stop` fires, polling `source` every poll interval
    ///
    /// Input and backend failures are logged and counted; the loop keeps
    /// going with the state it has.
    pub fn run(
        &mut self,
        source: &mut dyn InputSource,
        stop: &StopSignal,
    ) -> Result<TeleopStats> {
        tracing::info!(
            "Teleop loop started: input={}, backend={}, update every {:?}",
            source.name(),
            self.backend.name(),
            self.config.update_interval
        );

        while !stop.is_stopped() {
            match source.poll() {
                Ok(snapshot) => {
                    self.tick(&snapshot);
                }
                Err(e) => {
                    self.stats.input_failures += 1;
                    tracing::warn!("{}: input poll failed: {}", source.name(), e);
                }
            }

            if !stop.sleep(self.config.poll_interval) {
                break;
            }
        }

        tracing::info!(
            "Teleop loop stopped after {} dispatches ({} write failures)",
            self.stats.dispatches,
            self.stats.write_failures
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{slot, SimulatedBackend};
    use crate::input::ScriptedInput;
    use crate::state::{DirectJoint, HeadAxis};
    use crate::Error;
    use approx::assert_relative_eq;

    fn setup(config: TeleopConfig) -> (Arc<SimulatedBackend>, TeleopLoop) {
        let backend = Arc::new(SimulatedBackend::new());
        let teleop = TeleopLoop::new(backend.clone(), ActuatorState::default(), config);
        (backend, teleop)
    }

    fn antenna_input(value: f64) -> InputSnapshot {
        InputSnapshot::neutral().with_button(6).with_axis(0, value)
    }

    #[test]
    fn test_first_tick_dispatches() {
        let (backend, mut teleop) = setup(TeleopConfig::default());
        let outcome = teleop.tick_at(&InputSnapshot::neutral(), Instant::now());

        assert!(outcome.is_dispatched());
        assert_eq!(backend.position_writes(), 1);
        assert_eq!(backend.positions(), Some(teleop.state().positions()));
    }

    #[test]
    fn test_rate_limit_discards_input() {
        let (backend, mut teleop) = setup(TeleopConfig::default());
        let t0 = Instant::now();

        teleop.tick_at(&antenna_input(-0.5), t0);
        let after_first = teleop.state().positions();
        assert_relative_eq!(
            teleop.state().joint(DirectJoint::AntennaB),
            10f64.to_radians(),
            epsilon = 1e-12
        );

        let outcome = teleop.tick_at(&antenna_input(1.0), t0 + Duration::from_millis(50));
        assert_eq!(outcome, TickOutcome::Skipped);
        assert_eq!(teleop.state().positions(), after_first);
        assert_eq!(backend.position_writes(), 1);

        // The window is measured from the last dispatch, not the last tick
        let outcome = teleop.tick_at(&antenna_input(-0.5), t0 + Duration::from_millis(100));
        assert!(outcome.is_dispatched());
        assert_eq!(backend.position_writes(), 2);
        assert_relative_eq!(
            teleop.state().joint(DirectJoint::AntennaB),
            20f64.to_radians(),
            epsilon = 1e-12
        );

        let stats = teleop.stats();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.dispatches, 2);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_neutral_tick_still_forwards() {
        let (backend, mut teleop) = setup(TeleopConfig::default());
        let t0 = Instant::now();
        teleop.tick_at(&InputSnapshot::neutral(), t0);
        teleop.tick_at(&InputSnapshot::neutral(), t0 + Duration::from_millis(100));

        assert_eq!(backend.position_writes(), 2);
        assert_eq!(backend.positions(), Some(ActuatorState::startup_vector()));
    }

    #[test]
    fn test_deadzone_changes_nothing() {
        let (_, mut teleop) = setup(TeleopConfig::default());
        let before = teleop.state().positions();
        let snapshot = InputSnapshot::neutral()
            .with_button(6)
            .with_button(7)
            .with_axis(0, 0.05)
            .with_axis(1, 0.05)
            .with_axis(3, -0.05)
            .with_axis(4, 0.05);

        teleop.tick_at(&snapshot, Instant::now());
        assert_eq!(teleop.state().positions(), before);
        assert_eq!(teleop.state().head_pose(), crate::state::HeadPose::STARTUP);
    }

    #[test]
    fn test_write_failure_keeps_running() {
        let (backend, mut teleop) = setup(TeleopConfig::default());
        let t0 = Instant::now();

        backend.set_fail_writes(true);
        teleop.tick_at(&antenna_input(-0.5), t0);
        // State advanced even though the write failed
        assert_relative_eq!(
            teleop.state().joint(DirectJoint::AntennaB),
            10f64.to_radians(),
            epsilon = 1e-12
        );
        assert_eq!(backend.positions(), None);

        backend.set_fail_writes(false);
        teleop.tick_at(&InputSnapshot::neutral(), t0 + Duration::from_millis(100));
        assert_eq!(backend.positions(), Some(teleop.state().positions()));

        let stats = teleop.stats();
        assert_eq!(stats.write_failures, 1);
        assert_eq!(stats.dispatches, 2);
        assert_relative_eq!(stats.write_failure_ratio(), 0.5);
    }

    #[test]
    fn test_feedback_failure_keeps_last_feedback() {
        let (backend, mut teleop) = setup(TeleopConfig::default().with_read_feedback(true));
        let t0 = Instant::now();

        teleop.tick_at(&InputSnapshot::neutral(), t0);
        let feedback = teleop.last_feedback();
        assert_eq!(feedback, Some(ActuatorState::startup_vector()));

        backend.set_fail_reads(true);
        teleop.tick_at(&antenna_input(-0.5), t0 + Duration::from_millis(100));

        assert_eq!(teleop.last_feedback(), feedback);
        assert_eq!(teleop.stats().feedback_failures, 1);
        // Commanded state is untouched by feedback
        assert_relative_eq!(
            teleop.state().joint(DirectJoint::AntennaB),
            10f64.to_radians(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_feedback_disabled_by_default() {
        let (_, mut teleop) = setup(TeleopConfig::default());
        teleop.tick_at(&InputSnapshot::neutral(), Instant::now());
        assert_eq!(teleop.last_feedback(), None);
    }

    #[test]
    fn test_preset_then_head_move_resolves_legs() {
        let (backend, mut teleop) = setup(TeleopConfig::default());
        let t0 = Instant::now();

        teleop.tick_at(&InputSnapshot::neutral().with_button(1), t0);
        for i in slot::LEGS {
            assert_relative_eq!(
                teleop.state().positions()[i],
                (-60f64).to_radians(),
                epsilon = 1e-12
            );
        }

        let lift = InputSnapshot::neutral().with_button(7).with_axis(1, -1.0);
        let outcome = teleop.tick_at(&lift, t0 + Duration::from_millis(100));
        match outcome {
            TickOutcome::Dispatched { intents } => assert_eq!(
                intents.as_slice(),
                &[ControlIntent::AdjustHeadPose {
                    axis: HeadAxis::Z,
                    delta: 5.0,
                }]
            ),
            TickOutcome::Skipped => panic!("expected dispatch"),
        }

        let state = teleop.state();
        let solved = state.ik().solve(&state.head_pose());
        for (i, angle) in slot::LEGS.zip(solved) {
            assert_relative_eq!(state.positions()[i], angle, epsilon = 1e-12);
        }
        assert_eq!(backend.positions(), Some(state.positions()));
    }

    #[test]
    fn test_stop_signal_sleep() {
        let stop = StopSignal::new();
        assert!(stop.sleep(Duration::from_millis(1)));

        stop.stop();
        let start = Instant::now();
        assert!(!stop.sleep(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(stop.clone().is_stopped());
    }

    #[test]
    fn test_run_until_stopped() {
        let (backend, mut teleop) = setup(
            TeleopConfig::default()
                .with_update_interval(Duration::ZERO)
                .with_poll_interval(Duration::from_millis(1)),
        );
        let mut source = ScriptedInput::new([antenna_input(-0.5), antenna_input(-0.5)]);
        let stop = StopSignal::new();

        let stopper = {
            let stop = stop.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                stop.stop();
            })
        };
        let stats = teleop.run(&mut source, &stop).unwrap();
        stopper.join().unwrap();

        assert!(stats.dispatches >= 2);
        assert_eq!(stats.ticks, stats.dispatches);
        assert_eq!(backend.position_writes(), stats.dispatches);
        assert_relative_eq!(
            teleop.state().joint(DirectJoint::AntennaB),
            20f64.to_radians(),
            epsilon = 1e-12
        );
    }

    struct FailingInput;

    impl InputSource for FailingInput {
        fn name(&self) -> &str {
            "failing"
        }

        fn poll(&mut self) -> Result<InputSnapshot> {
            Err(Error::Input("device unplugged".into()))
        }
    }

    #[test]
    fn test_run_survives_input_failures() {
        let (backend, mut teleop) =
            setup(TeleopConfig::default().with_poll_interval(Duration::from_millis(1)));
        let stop = StopSignal::new();
        let stopper = {
            let stop = stop.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                stop.stop();
            })
        };

        let stats = teleop.run(&mut FailingInput, &stop).unwrap();
        stopper.join().unwrap();

        assert!(stats.input_failures > 0);
        assert_eq!(stats.dispatches, 0);
        assert_eq!(backend.position_writes(), 0);
    }

    #[test]
    fn test_run_returns_immediately_when_already_stopped() {
        let (_, mut teleop) = setup(TeleopConfig::default());
        let stop = StopSignal::new();
        stop.stop();
        let stats = teleop.run(&mut ScriptedInput::default(), &stop).unwrap();
        assert_eq!(stats, TeleopStats::default());
    }
}
