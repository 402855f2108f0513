//! Actuator state machine.
//!
//! One machine drives one physical actuator (the door servo, the rain cover
//! servo) through a fixed four phase cycle:
//!
//! ```text
//!          trigger_open                 hold expired
//! Closed ───────────────► Opening ──► Open ─────────────► Closing ──► Closed
//!    ▲                    (next tick)   │                  (settle)     │
//!    │                                  │ request_close                 │
//!    │                                  └──────────────────► Closing    │
//!    └──────────────────────────────────────────────────────────────────┘
//!                          Closing ──► Opening  (re-open during travel)
//! ```
//!
//! # Rules
//!
//! - [`ActuatorMachine::transition`] is idempotent: asking for the current
//!   phase does nothing.
//! - Every real transition records its timestamp and issues the matching
//!   drive command: open on `Opening`, closed on `Closing`, release on
//!   `Closed`.
//! - A trigger while `Opening` or `Open` re-arms the hold deadline to
//!   `now + hold` but never moves it earlier, and never re-issues a drive
//!   command.
//! - Reaching `Open` re-arms the hold the same way, so the actuator stays
//!   fully open for at least `hold` however late the tick ran.
//! - `Closing` always completes after the settle time. A jammed actuator is
//!   not detected.
//!
//! Time is passed in by the caller. Nothing here sleeps, so a late tick
//! simply advances the machine late.
//!
//! # Examples
//!
//! ```
//! use std::time::{Duration, Instant};
//! use hearthgate_controller::actuator::{ActuatorMachine, Phase};
//! use hearthgate_hardware::mock::MockDrive;
//!
//! let (mut drive, _handle) = MockDrive::new();
//! let t0 = Instant::now();
//! let mut door = ActuatorMachine::new("door", Duration::from_secs(5), Duration::from_millis(700), t0);
//!
//! door.trigger_open(t0, &mut drive).unwrap();
//! assert_eq!(door.phase(), Phase::Opening);
//!
//! door.advance(t0 + Duration::from_millis(10), &mut drive).unwrap();
//! assert_eq!(door.phase(), Phase::Open);
//! ```

use hearthgate_core::{Error, Result};
use hearthgate_hardware::traits::ActuatorDrive;
use hearthgate_protocol::PhaseName;
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Transitions kept per machine for diagnostics.
const MAX_HISTORY_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

impl Phase {
    /// Legal single-step transitions.
    ///
    /// ```
    /// use hearthgate_controller::actuator::Phase;
    ///
    /// assert!(Phase::Closed.can_transition_to(Phase::Opening));
    /// assert!(!Phase::Closed.can_transition_to(Phase::Open));
    /// assert!(!Phase::Open.can_transition_to(Phase::Closed));
    /// ```
    pub fn can_transition_to(self, target: Phase) -> bool {
        matches!(
            (self, target),
            (Phase::Closed, Phase::Opening)
                | (Phase::Opening, Phase::Open)
                | (Phase::Open, Phase::Closing)
                | (Phase::Closing, Phase::Closed)
                | (Phase::Closing, Phase::Opening)
        )
    }

    /// True while the actuator is open or on its way there.
    pub fn is_open_or_opening(self) -> bool {
        matches!(self, Phase::Opening | Phase::Open)
    }

    pub fn name(self) -> PhaseName {
        match self {
            Phase::Closed => PhaseName::Closed,
            Phase::Opening => PhaseName::Opening,
            Phase::Open => PhaseName::Open,
            Phase::Closing => PhaseName::Closing,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A recorded phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub at: Instant,
}

/// Result of an open trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Motion towards open was started.
    Opened,
    /// Already open or opening; the hold deadline was re-armed.
    Extended,
}

pub struct ActuatorMachine {
    name: &'static str,
    phase: Phase,
    phase_entered_at: Instant,
    /// Meaningful only while `Opening` or `Open`.
    hold_until: Option<Instant>,
    hold: Duration,
    settle: Duration,
    history: VecDeque<PhaseTransition>,
}

impl ActuatorMachine {
    /// A machine at rest in `Closed`.
    pub fn new(name: &'static str, hold: Duration, settle: Duration, now: Instant) -> Self {
        Self {
            name,
            phase: Phase::Closed,
            phase_entered_at: now,
            hold_until: None,
            hold,
            settle,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_entered_at(&self) -> Instant {
        self.phase_entered_at
    }

    pub fn hold_until(&self) -> Option<Instant> {
        self.hold_until
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<PhaseTransition> {
        &self.history
    }

    /// Move to `target`.
    ///
    /// Returns `Ok(None)` if already in `target`. Drive failures are logged
    /// and do not stop the transition: motion is assumed to complete.
    ///
    /// # Errors
    /// `Error::InvalidStateTransition` if `target` is not a legal next phase.
    pub fn transition(
        &mut self,
        target: Phase,
        now: Instant,
        drive: &mut dyn ActuatorDrive,
    ) -> Result<Option<PhaseTransition>> {
        if target == self.phase {
            return Ok(None);
        }
        if !self.phase.can_transition_to(target) {
            return Err(Error::InvalidStateTransition {
                from: self.phase.to_string(),
                to: target.to_string(),
            });
        }

        let drive_result = match target {
            Phase::Opening => drive.drive_open(),
            Phase::Closing => drive.drive_closed(),
            Phase::Closed => drive.release(),
            Phase::Open => Ok(()),
        };
        if let Err(e) = drive_result {
            warn!(actuator = self.name, phase = %target, error = %e, "Drive command failed");
        }

        let transition = PhaseTransition {
            from: self.phase,
            to: target,
            at: now,
        };
        self.phase = target;
        self.phase_entered_at = now;
        if !target.is_open_or_opening() {
            self.hold_until = None;
        }

        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(transition);

        debug!(actuator = self.name, from = %transition.from, to = %transition.to, "Actuator transition");
        Ok(Some(transition))
    }

    /// Open, or extend the hold if already open or opening.
    ///
    /// # Errors
    /// Only on an internal transition error, which the phase rules exclude.
    pub fn trigger_open(
        &mut self,
        now: Instant,
        drive: &mut dyn ActuatorDrive,
    ) -> Result<TriggerOutcome> {
        if self.phase.is_open_or_opening() {
            self.extend_hold(now);
            return Ok(TriggerOutcome::Extended);
        }

        self.transition(Phase::Opening, now, drive)?;
        self.hold_until = Some(now + self.hold);
        Ok(TriggerOutcome::Opened)
    }

    /// Push the hold deadline to `now + hold`, never earlier than it was.
    fn extend_hold(&mut self, now: Instant) {
        let deadline = now + self.hold;
        self.hold_until = Some(self.hold_until.map_or(deadline, |current| current.max(deadline)));
    }

    /// Start closing now, regardless of the hold deadline.
    ///
    /// Returns `false` if the actuator is already closed or closing.
    ///
    /// # Errors
    /// Only on an internal transition error, which the phase rules exclude.
    pub fn request_close(&mut self, now: Instant, drive: &mut dyn ActuatorDrive) -> Result<bool> {
        match self.phase {
            Phase::Closed | Phase::Closing => Ok(false),
            Phase::Opening => {
                self.transition(Phase::Open, now, drive)?;
                self.transition(Phase::Closing, now, drive)?;
                Ok(true)
            }
            Phase::Open => {
                self.transition(Phase::Closing, now, drive)?;
                Ok(true)
            }
        }
    }

    /// Apply time-based transitions due at `now`.
    ///
    /// - `Opening` becomes `Open` on the first advance after it was entered,
    ///   and the hold is re-armed from `now`.
    /// - `Open` becomes `Closing` once `now >= hold_until`.
    /// - `Closing` becomes `Closed` once the settle time has elapsed.
    ///
    /// # Errors
    /// Only on an internal transition error, which the phase rules exclude.
    pub fn advance(
        &mut self,
        now: Instant,
        drive: &mut dyn ActuatorDrive,
    ) -> Result<Vec<PhaseTransition>> {
        let mut transitions = Vec::new();

        // Each phase is visited at most once per advance.
        for _ in 0..3 {
            let next = match self.phase {
                // Opening lasts until a later tick.
                Phase::Opening if now > self.phase_entered_at => Some(Phase::Open),
                Phase::Open if self.hold_until.is_none_or(|until| now >= until) => {
                    Some(Phase::Closing)
                }
                Phase::Closing if now.saturating_duration_since(self.phase_entered_at) >= self.settle => {
                    Some(Phase::Closed)
                }
                _ => None,
            };

            match next {
                Some(target) => {
                    if let Some(t) = self.transition(target, now, drive)? {
                        if t.to == Phase::Open {
                            self.extend_hold(now);
                        }
                        transitions.push(t);
                    }
                }
                None => break,
            }
        }

        Ok(transitions)
    }
}

impl fmt::Debug for ActuatorMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActuatorMachine")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("hold_until", &self.hold_until)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearthgate_hardware::DriveCommand;
    use hearthgate_hardware::mock::{MockDrive, MockDriveHandle};
    use proptest::prelude::*;
    use rstest::rstest;

    const HOLD: Duration = Duration::from_millis(5000);
    const SETTLE: Duration = Duration::from_millis(700);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn machine() -> (ActuatorMachine, MockDrive, MockDriveHandle, Instant) {
        let (drive, handle) = MockDrive::new();
        let t0 = Instant::now();
        (ActuatorMachine::new("door", HOLD, SETTLE, t0), drive, handle, t0)
    }

    #[rstest]
    #[case(Phase::Closed, Phase::Opening, true)]
    #[case(Phase::Opening, Phase::Open, true)]
    #[case(Phase::Open, Phase::Closing, true)]
    #[case(Phase::Closing, Phase::Closed, true)]
    #[case(Phase::Closing, Phase::Opening, true)]
    #[case(Phase::Closed, Phase::Open, false)]
    #[case(Phase::Open, Phase::Closed, false)]
    #[case(Phase::Opening, Phase::Closing, false)]
    #[case(Phase::Closed, Phase::Closing, false)]
    fn test_transition_rules(#[case] from: Phase, #[case] to: Phase, #[case] legal: bool) {
        assert_eq!(from.can_transition_to(to), legal);
    }

    #[test]
    fn test_transition_is_idempotent() {
        let (mut m, mut drive, handle, t0) = machine();
        assert_eq!(m.transition(Phase::Closed, t0, &mut drive).unwrap(), None);
        assert!(handle.commands().is_empty());
        assert!(m.history().is_empty());
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let (mut m, mut drive, _handle, t0) = machine();
        assert!(matches!(
            m.transition(Phase::Open, t0, &mut drive),
            Err(Error::InvalidStateTransition { .. })
        ));
        assert_eq!(m.phase(), Phase::Closed);
    }

    #[test]
    fn test_full_cycle() {
        let (mut m, mut drive, handle, t0) = machine();

        assert_eq!(m.trigger_open(t0, &mut drive).unwrap(), TriggerOutcome::Opened);
        assert_eq!(m.hold_until(), Some(t0 + HOLD));

        m.advance(t0 + ms(10), &mut drive).unwrap();
        assert_eq!(m.phase(), Phase::Open);
        assert_eq!(m.hold_until(), Some(t0 + ms(5010)));

        m.advance(t0 + ms(5009), &mut drive).unwrap();
        assert_eq!(m.phase(), Phase::Open);

        let changes = m.advance(t0 + ms(5010), &mut drive).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(m.phase(), Phase::Closing);
        assert_eq!(m.hold_until(), None);

        m.advance(t0 + ms(5709), &mut drive).unwrap();
        assert_eq!(m.phase(), Phase::Closing);

        m.advance(t0 + ms(5710), &mut drive).unwrap();
        assert_eq!(m.phase(), Phase::Closed);

        assert_eq!(
            handle.commands(),
            vec![DriveCommand::Open, DriveCommand::Closed, DriveCommand::Release]
        );
    }

    #[test]
    fn test_retrigger_extends_without_drive() {
        let (mut m, mut drive, handle, t0) = machine();
        m.trigger_open(t0, &mut drive).unwrap();
        m.advance(t0 + ms(10), &mut drive).unwrap();

        let outcome = m.trigger_open(t0 + ms(4000), &mut drive).unwrap();
        assert_eq!(outcome, TriggerOutcome::Extended);
        assert_eq!(m.hold_until(), Some(t0 + ms(9000)));
        assert_eq!(handle.count(DriveCommand::Open), 1);

        m.advance(t0 + ms(5000), &mut drive).unwrap();
        assert_eq!(m.phase(), Phase::Open);
    }

    #[test]
    fn test_extend_while_opening() {
        let (mut m, mut drive, handle, t0) = machine();
        m.trigger_open(t0, &mut drive).unwrap();
        assert_eq!(
            m.trigger_open(t0 + ms(5), &mut drive).unwrap(),
            TriggerOutcome::Extended
        );
        assert_eq!(m.hold_until(), Some(t0 + ms(5005)));
        assert_eq!(handle.count(DriveCommand::Open), 1);
    }

    #[test]
    fn test_reopen_while_closing() {
        let (mut m, mut drive, handle, t0) = machine();
        m.trigger_open(t0, &mut drive).unwrap();
        m.advance(t0 + ms(10), &mut drive).unwrap();
        m.request_close(t0 + ms(100), &mut drive).unwrap();
        assert_eq!(m.phase(), Phase::Closing);

        assert_eq!(
            m.trigger_open(t0 + ms(200), &mut drive).unwrap(),
            TriggerOutcome::Opened
        );
        assert_eq!(m.phase(), Phase::Opening);
        assert_eq!(handle.count(DriveCommand::Open), 2);
    }

    #[test]
    fn test_close_while_opening_passes_through_open() {
        let (mut m, mut drive, _handle, t0) = machine();
        m.trigger_open(t0, &mut drive).unwrap();
        assert!(m.request_close(t0 + ms(1), &mut drive).unwrap());
        assert_eq!(m.phase(), Phase::Closing);

        let phases: Vec<Phase> = m.history().iter().map(|t| t.to).collect();
        assert_eq!(phases, vec![Phase::Opening, Phase::Open, Phase::Closing]);
    }

    #[test]
    fn test_close_when_closed_is_noop() {
        let (mut m, mut drive, handle, t0) = machine();
        assert!(!m.request_close(t0, &mut drive).unwrap());
        assert!(handle.commands().is_empty());
    }

    #[test]
    fn test_opening_holds_within_same_instant() {
        let (mut m, mut drive, _handle, t0) = machine();
        m.trigger_open(t0, &mut drive).unwrap();
        assert!(m.advance(t0, &mut drive).unwrap().is_empty());
        assert_eq!(m.phase(), Phase::Opening);
    }

    #[test]
    fn test_late_tick_runs_late() {
        let (mut m, mut drive, _handle, t0) = machine();
        m.trigger_open(t0, &mut drive).unwrap();
        // One very late tick reaches Open, and the full hold starts there.
        let changes = m.advance(t0 + ms(60_000), &mut drive).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(m.phase(), Phase::Open);
        assert_eq!(m.hold_until(), Some(t0 + ms(65_000)));

        m.advance(t0 + ms(64_999), &mut drive).unwrap();
        assert_eq!(m.phase(), Phase::Open);
        m.advance(t0 + ms(65_000), &mut drive).unwrap();
        assert_eq!(m.phase(), Phase::Closing);
    }

    #[test]
    fn test_open_keeps_longer_hold() {
        let (mut m, mut drive, _handle, t0) = machine();
        m.trigger_open(t0, &mut drive).unwrap();
        m.trigger_open(t0 + ms(3000), &mut drive).unwrap();
        assert_eq!(m.hold_until(), Some(t0 + ms(8000)));

        // Reaching Open at 10 ms would give 5010, which is earlier.
        m.advance(t0 + ms(10), &mut drive).unwrap();
        assert_eq!(m.phase(), Phase::Open);
        assert_eq!(m.hold_until(), Some(t0 + ms(8000)));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Trigger(u64),
        Close(u64),
        Advance(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..3000).prop_map(Op::Trigger),
            (0u64..3000).prop_map(Op::Close),
            (0u64..3000).prop_map(Op::Advance),
        ]
    }

    proptest! {
        /// Every recorded transition is a legal single step, and re-triggers
        /// never pull the hold deadline earlier.
        #[test]
        fn prop_only_legal_transitions(ops in prop::collection::vec(op(), 1..60)) {
            let (mut m, mut drive, handle, t0) = machine();
            let mut now = t0;

            for op in ops {
                match op {
                    Op::Trigger(dt) => {
                        now += ms(dt);
                        let before = m.hold_until();
                        let was_open = m.phase().is_open_or_opening();
                        let opens_before = handle.count(DriveCommand::Open);
                        m.trigger_open(now, &mut drive).unwrap();
                        if was_open {
                            prop_assert!(m.hold_until() >= before);
                            prop_assert_eq!(handle.count(DriveCommand::Open), opens_before);
                        }
                    }
                    Op::Close(dt) => {
                        now += ms(dt);
                        m.request_close(now, &mut drive).unwrap();
                    }
                    Op::Advance(dt) => {
                        now += ms(dt);
                        m.advance(now, &mut drive).unwrap();
                    }
                }
            }

            for t in m.history() {
                prop_assert!(t.from.can_transition_to(t.to), "illegal {:?} -> {:?}", t.from, t.to);
            }
        }
    }
}
