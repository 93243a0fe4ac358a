use std::fmt;

use tracing::{debug, info, warn};

use crate::config::AutopilotConfig;
use crate::dynamics::state::{RateCommand, ThrusterCommand, VehicleState};
use crate::error::{AutopilotError, Result};
use crate::vehicle::VehicleAdapter;
use super::attitude::AttitudeController;
use super::guidance::terminal_throttle;

// ---------------------------------------------------------------------------
// Descent phases
// ---------------------------------------------------------------------------

/// Phases of the descent sequence, in the only order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AutopilotPhase {
    Idle,
    HoldForRetro,
    RetroDescent,
    FinalDescent,
    Shutdown,
}

impl AutopilotPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::HoldForRetro => "Hold for retro ignition",
            Self::RetroDescent => "Initial descent",
            Self::FinalDescent => "Final descent",
            Self::Shutdown => "Shutdown",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Shutdown
    }
}

impl fmt::Display for AutopilotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one phase handler: the command for this tick and, if the phase
/// is over, the phase to enter next.
#[derive(Debug, Clone, Copy)]
struct PhaseOutcome {
    command: ThrusterCommand,
    target_throttle: Option<f64>,
    next: Option<AutopilotPhase>,
}

impl PhaseOutcome {
    fn stay(command: ThrusterCommand) -> Self {
        Self { command, target_throttle: None, next: None }
    }

    fn steer(command: RateCommand, throttle: f64) -> Self {
        Self {
            command: ThrusterCommand::vernier(command),
            target_throttle: Some(throttle),
            next: None,
        }
    }

    fn then(mut self, next: AutopilotPhase) -> Self {
        self.next = Some(next);
        self
    }
}

// ---------------------------------------------------------------------------
// Autopilot
// ---------------------------------------------------------------------------

/// Phase sequencer driving the attitude controller and the terminal-descent law.
///
/// One instance flies one descent. The phase timer restarts at zero on every
/// transition and is advanced by the caller-supplied step, never by a clock.
#[derive(Debug, Clone)]
pub struct Autopilot {
    config: AutopilotConfig,
    attitude: AttitudeController,
    phase: AutopilotPhase,
    timer: f64,
    target_throttle: Option<f64>,
    last_command: ThrusterCommand,
}

impl Autopilot {
    pub fn new(config: AutopilotConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: AutopilotConfig) -> Self {
        let attitude = AttitudeController::new(&config.gains, &config.vernier);
        Self {
            config,
            attitude,
            phase: AutopilotPhase::Idle,
            timer: 0.0,
            target_throttle: None,
            last_command: ThrusterCommand::hold(),
        }
    }

    /// Resume from an arbitrary point of the sequence.
    pub fn with_phase(mut self, phase: AutopilotPhase, timer: f64) -> Self {
        self.phase = phase;
        self.timer = timer;
        self
    }

    pub fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    pub fn phase(&self) -> AutopilotPhase {
        self.phase
    }

    /// Time spent in the current phase, s.
    pub fn timer(&self) -> f64 {
        self.timer
    }

    /// Steady-state throttle requested from the attitude controller on the
    /// last tick, `None` if the attitude controller did not run.
    pub fn target_throttle(&self) -> Option<f64> {
        self.target_throttle
    }

    pub fn last_command(&self) -> ThrusterCommand {
        self.last_command
    }

    /// Validating variant of [`Autopilot::step`].
    pub fn try_step(&mut self, state: &VehicleState, dt: f64) -> Result<ThrusterCommand> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(AutopilotError::InvalidTimeStep(dt));
        }
        state.check_finite()?;
        Ok(self.step(state, dt))
    }

    /// Run one control tick.
    pub fn step(&mut self, state: &VehicleState, dt: f64) -> ThrusterCommand {
        let timer = self.timer + dt;
        let outcome = match self.phase {
            AutopilotPhase::Idle => self.idle(timer),
            AutopilotPhase::HoldForRetro => self.hold_for_retro(state),
            AutopilotPhase::RetroDescent => self.retro_descent(state, timer),
            AutopilotPhase::FinalDescent => self.final_descent(state),
            AutopilotPhase::Shutdown => PhaseOutcome::stay(ThrusterCommand::idle()),
        };

        match outcome.next {
            Some(next) => {
                info!(
                    from = %self.phase,
                    to = %next,
                    altitude = state.radar_altitude(),
                    phase_time = timer,
                    "autopilot phase change"
                );
                self.phase = next;
                self.timer = 0.0;
            }
            None => self.timer = timer,
        }
        self.target_throttle = outcome.target_throttle;
        self.last_command = outcome.command;
        outcome.command
    }

    /// Read the vehicle through its adapter, run one tick and write the
    /// command back.
    pub fn update<V: VehicleAdapter + ?Sized>(&mut self, vehicle: &mut V, dt: f64) -> Result<ThrusterCommand> {
        let state = vehicle.state();
        let cmd = self.try_step(&state, dt)?;
        vehicle.apply(&cmd);

        let levels = vehicle.vernier_levels();
        debug!(
            phase = %self.phase,
            altitude = state.radar_altitude(),
            speed = state.speed(),
            vernier = ?levels,
            retro = vehicle.retro_level(),
            "autopilot tick"
        );
        Ok(cmd)
    }

    fn steer(&self, state: &VehicleState, throttle: f64) -> PhaseOutcome {
        let cmd = self.attitude.command(&state.surface_velocity, &state.angular_velocity, throttle);
        PhaseOutcome::steer(cmd, throttle)
    }

    // Verniers off while the vehicle settles after separation. The exit tick
    // leaves the thrusters alone.
    fn idle(&self, timer: f64) -> PhaseOutcome {
        if timer >= self.config.schedule.idle_duration {
            return PhaseOutcome::stay(ThrusterCommand::hold()).then(AutopilotPhase::HoldForRetro);
        }
        PhaseOutcome::stay(ThrusterCommand::idle())
    }

    // Point retrograde and wait for the arming altitude.
    fn hold_for_retro(&self, state: &VehicleState) -> PhaseOutcome {
        let out = self.steer(state, 0.0);
        if state.radar_altitude() <= self.config.schedule.retro_arm_altitude {
            out.then(AutopilotPhase::RetroDescent)
        } else {
            out
        }
    }

    // Coast for the ignition delay, then burn the retro to depletion while
    // the verniers hold attitude.
    fn retro_descent(&self, state: &VehicleState, timer: f64) -> PhaseOutcome {
        let schedule = &self.config.schedule;
        let mut out = PhaseOutcome::stay(ThrusterCommand::hold());
        if timer >= schedule.retro_ignition_delay {
            out = self.steer(state, 0.0);
            out.command.retro = Some(1.0);
        }
        if timer >= schedule.retro_phase_duration {
            out.command.retro = Some(0.0);
            out = out.then(AutopilotPhase::FinalDescent);
        }
        out
    }

    // Verniers only steer above the engage altitude, then also brake.
    fn final_descent(&self, state: &VehicleState) -> PhaseOutcome {
        let altitude = state.radar_altitude();
        let schedule = &self.config.schedule;
        if altitude <= schedule.shutdown_altitude {
            return PhaseOutcome::stay(ThrusterCommand::hold()).then(AutopilotPhase::Shutdown);
        }
        if altitude > schedule.terminal_engage_altitude {
            return self.steer(state, 0.0);
        }
        let throttle = terminal_throttle(
            &self.config.terminal,
            &self.config.vernier,
            self.config.gravity,
            altitude,
            state.mass,
            state.speed(),
        );
        self.steer(state, throttle)
    }
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::from_valid(AutopilotConfig::surveyor())
    }
}

impl super::Controller for Autopilot {
    /// Rejected inputs leave the thrusters and the sequence untouched.
    fn control(&mut self, state: &VehicleState, dt: f64) -> ThrusterCommand {
        match self.try_step(state, dt) {
            Ok(cmd) => cmd,
            Err(err) => {
                warn!(phase = %self.phase, %err, "autopilot tick skipped");
                ThrusterCommand::hold()
            }
        }
    }

    fn reset(&mut self) {
        self.phase = AutopilotPhase::Idle;
        self.timer = 0.0;
        self.target_throttle = None;
        self.last_command = ThrusterCommand::hold();
    }

    fn name(&self) -> &str {
        "SurveyorAutopilot"
    }

    fn phase(&self) -> Option<AutopilotPhase> {
        Some(self.phase)
    }

    fn target_throttle(&self) -> Option<f64> {
        self.target_throttle
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
