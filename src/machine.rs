//! This module defines the `Machine` execution engine, which runs transition
//! tables over a reusable bounded tape. It enforces a step budget, applies
//! the configured halting convention, and feeds the optional non-halting
//! detectors as the run progresses.

use crate::analyzer::analyze;
use crate::recurrence::{drifts_past_edge, RecurrenceDetector, Verdict};
use crate::tape::Tape;
use crate::types::{
    state_letter, HaltingMode, MachineError, Outcome, State, TransitionTable, BLANK,
    DEFAULT_STEP_BUDGET, HALT, START_STATE,
};

/// Configuration for a [`Machine`], fixed at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    /// Maximum number of steps one run may execute.
    pub step_budget: usize,
    /// The halting convention runs obey.
    pub halting: HaltingMode,
    /// Step budget for the recurrence detector. `None` disables both
    /// non-halting detectors.
    pub detector_budget: Option<usize>,
    /// The state runs begin in.
    pub start_state: State,
    /// Tape capacity override. When `None` the capacity is derived from the
    /// step budget.
    pub capacity: Option<usize>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            step_budget: DEFAULT_STEP_BUDGET,
            halting: HaltingMode::default(),
            detector_budget: None,
            start_state: START_STATE,
            capacity: None,
        }
    }
}

/// The engine's view of the current run.
///
/// Detector verdicts classify a run through [`Outcome`] without the engine
/// itself terminating, so a detected loop or spill leaves the status at
/// `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The run has not ended.
    Running,
    /// An instruction jumped to the halt sentinel.
    Halted,
    /// The step budget ran out.
    StepLimitExceeded,
    /// The tape blanked under [`HaltingMode::BlankTapeHalt`].
    BlankHalt,
}

/// A bounded interpreter for transition tables.
///
/// The tape and detector buffers are allocated once in [`Machine::new`] and
/// reused across runs, so one machine can classify a long stream of
/// candidate tables without further allocation. The table itself is borrowed
/// for the duration of each call and never stored.
pub struct Machine {
    config: MachineConfig,
    tape: Tape,
    state: State,
    step_count: usize,
    status: Status,
    outcome: Option<Outcome>,
    detector: Option<RecurrenceDetector>,
    window_active: bool,
}

impl Machine {
    /// Creates a machine for the given configuration, allocating the tape
    /// and detector buffers.
    ///
    /// # Returns
    ///
    /// * `Err(MachineError::CapacityTooSmall)` if an explicit capacity cannot
    ///   cover the step budget.
    /// * `Err(MachineError::ValidationError)` if the start state is the halt
    ///   sentinel.
    pub fn new(config: MachineConfig) -> Result<Self, MachineError> {
        let required = Tape::capacity_for(config.step_budget);
        let capacity = config.capacity.unwrap_or(required);
        if capacity < required {
            return Err(MachineError::CapacityTooSmall {
                capacity,
                budget: config.step_budget,
            });
        }
        if config.start_state == HALT {
            return Err(MachineError::ValidationError(
                "Start state cannot be the halt sentinel".to_string(),
            ));
        }

        let detector = config.detector_budget.map(RecurrenceDetector::new);
        Ok(Machine {
            tape: Tape::new(capacity),
            state: config.start_state,
            step_count: 0,
            status: Status::Running,
            outcome: None,
            window_active: detector.is_some(),
            detector,
            config,
        })
    }

    /// Validates a table against this machine's configuration and resets the
    /// run state, ready for stepping.
    ///
    /// # Returns
    ///
    /// * `Err(MachineError::UnsupportedAlphabet)` if detection is enabled and
    ///   the table is not two-symbol.
    /// * `Err(MachineError::UndefinedSlot)` if the start cell is undefined.
    pub fn load(&mut self, table: &TransitionTable) -> Result<(), MachineError> {
        analyze(table)?;
        if self.detector.is_some() && table.symbols() != 2 {
            return Err(MachineError::UnsupportedAlphabet(table.symbols()));
        }
        let start = self.config.start_state;
        if start as usize > table.states() {
            return Err(MachineError::ValidationError(format!(
                "Start state {} is not defined by the table",
                state_letter(start)
            )));
        }
        if table.get(start, BLANK).is_none() {
            return Err(MachineError::UndefinedSlot(start, BLANK));
        }
        self.reset();
        Ok(())
    }

    /// Executes one step of the loaded run.
    ///
    /// # Arguments
    ///
    /// * `table` - The table passed to [`Machine::load`].
    ///
    /// # Returns
    ///
    /// * `Ok(None)` while the run continues.
    /// * `Ok(Some(outcome))` once the run has ended; repeated calls return
    ///   the same outcome.
    /// * `Err(MachineError::UndefinedSlot)` if the scanned cell has no
    ///   instruction.
    pub fn step(&mut self, table: &TransitionTable) -> Result<Option<Outcome>, MachineError> {
        if self.outcome.is_some() {
            return Ok(self.outcome);
        }
        if self.step_count >= self.config.step_budget {
            self.status = Status::StepLimitExceeded;
            // An exhausted detector means a recurrence hunt was attempted
            // and failed, which is worth distinguishing from a plain
            // budget run-out.
            let outcome = if self.detector.is_some() && !self.window_active {
                Outcome::NoRecurrenceFound
            } else {
                Outcome::StepLimitExceeded
            };
            self.outcome = Some(outcome);
            return Ok(self.outcome);
        }

        let scanned = self.tape.read();
        let instruction = table
            .get(self.state, scanned)
            .ok_or(MachineError::UndefinedSlot(self.state, scanned))?;

        if self.detector.is_some() && drifts_past_edge(&self.tape, self.state, &instruction) {
            self.outcome = Some(Outcome::LoopDetected);
            return Ok(self.outcome);
        }

        self.tape.write(instruction.write);
        if instruction.next_state == HALT {
            // The halting step prints and counts but does not move the head.
            self.step_count += 1;
            self.status = Status::Halted;
            self.outcome = Some(Outcome::Halted {
                steps: self.step_count,
                marks: self.tape.marks(),
            });
            return Ok(self.outcome);
        }

        self.tape.move_head(instruction.direction)?;
        self.state = instruction.next_state;
        self.step_count += 1;

        if self.config.halting == HaltingMode::BlankTapeHalt && self.tape.is_blank() {
            self.status = Status::BlankHalt;
            self.outcome = Some(Outcome::Halted {
                steps: self.step_count,
                marks: 0,
            });
            return Ok(self.outcome);
        }

        match self.detector.as_mut() {
            Some(detector) if self.window_active => {
                match detector.observe(instruction.write, instruction.direction, self.state) {
                    Verdict::Continue => {}
                    Verdict::Recurrence => {
                        self.outcome = Some(Outcome::LoopDetected);
                        return Ok(self.outcome);
                    }
                    Verdict::Spill => {
                        self.outcome = Some(Outcome::Spill);
                        return Ok(self.outcome);
                    }
                    Verdict::BudgetExhausted => self.window_active = false,
                }
            }
            _ => {}
        }

        Ok(None)
    }

    /// Runs a table from a fresh start until the run ends.
    ///
    /// Equivalent to [`Machine::load`] followed by stepping to completion.
    /// Running the same table twice produces identical outcomes and
    /// counters.
    pub fn run(&mut self, table: &TransitionTable) -> Result<Outcome, MachineError> {
        self.load(table)?;
        loop {
            if let Some(outcome) = self.step(table)? {
                return Ok(outcome);
            }
        }
    }

    /// Clears all run state while keeping the allocated buffers.
    pub fn reset(&mut self) {
        self.tape.clear_touched();
        self.state = self.config.start_state;
        self.step_count = 0;
        self.status = Status::Running;
        self.outcome = None;
        self.window_active = self.detector.is_some();
        if let Some(detector) = self.detector.as_mut() {
            detector.reset();
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the number of steps executed so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Returns the number of marks currently on the tape.
    pub fn marks(&self) -> usize {
        self.tape.marks()
    }

    /// Returns the engine status of the current run.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the settled outcome, or `None` while the run continues.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Returns the tape, for inspection and rendering.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Returns the machine's configuration.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }
}

#[cfg(test)]
mod engine_tests {
    use super::*;

    const BB2: &str = "1RB 1LB  1LA 1RH";
    const BB3_STEPS: &str = "1RB 1RH  1LB 0RC  1LC 1LA";
    const BB3_MARKS: &str = "1RB 1LC  1RC 1RH  1LA 0LB";
    const BB4_STEPS: &str = "1RB 1LB  1LA 0LC  1RH 1LD  1RD 0RA";
    const BB4_MARKS: &str = "1RB 0RC  1LA 1RA  1RH 1RD  1LD 0LB";

    fn table(notation: &str) -> TransitionTable {
        crate::parser::parse(notation).unwrap()
    }

    fn budgeted(step_budget: usize) -> MachineConfig {
        MachineConfig {
            step_budget,
            ..MachineConfig::default()
        }
    }

    fn detecting(step_budget: usize, detector_budget: usize) -> MachineConfig {
        MachineConfig {
            step_budget,
            detector_budget: Some(detector_budget),
            ..MachineConfig::default()
        }
    }

    fn run_with(notation: &str, config: MachineConfig) -> Outcome {
        let mut machine = Machine::new(config).unwrap();
        machine.run(&table(notation)).unwrap()
    }

    #[test]
    fn test_halting_records() {
        assert_eq!(
            run_with(BB2, budgeted(100)),
            Outcome::Halted { steps: 6, marks: 4 }
        );
        assert_eq!(
            run_with(BB3_STEPS, budgeted(100)),
            Outcome::Halted { steps: 21, marks: 5 }
        );
        assert_eq!(
            run_with(BB3_MARKS, budgeted(100)),
            Outcome::Halted { steps: 11, marks: 6 }
        );
        assert_eq!(
            run_with(BB4_STEPS, budgeted(1000)),
            Outcome::Halted {
                steps: 107,
                marks: 13
            }
        );
        assert_eq!(
            run_with(BB4_MARKS, budgeted(1000)),
            Outcome::Halted {
                steps: 96,
                marks: 13
            }
        );
    }

    #[test]
    fn test_five_state_champion() {
        let outcome = run_with(
            "1RB 1LC  1RC 1RB  1RD 0LE  1LA 1LD  1RH 0LA",
            budgeted(47_176_870),
        );
        assert_eq!(
            outcome,
            Outcome::Halted {
                steps: 47_176_870,
                marks: 4098
            }
        );
    }

    #[test]
    fn test_budget_boundary() {
        // One step short of the halt leaves the question open; the exact
        // budget settles it.
        assert_eq!(run_with(BB2, budgeted(5)), Outcome::StepLimitExceeded);
        assert_eq!(
            run_with(BB2, budgeted(6)),
            Outcome::Halted { steps: 6, marks: 4 }
        );
    }

    #[test]
    fn test_step_by_step() {
        let bb2 = table(BB2);
        let mut machine = Machine::new(budgeted(10)).unwrap();
        machine.load(&bb2).unwrap();
        assert_eq!(machine.status(), Status::Running);

        for _ in 0..5 {
            assert_eq!(machine.step(&bb2).unwrap(), None);
        }
        let outcome = Outcome::Halted { steps: 6, marks: 4 };
        assert_eq!(machine.step(&bb2).unwrap(), Some(outcome));
        assert_eq!(machine.status(), Status::Halted);
        assert_eq!(machine.step_count(), 6);
        assert_eq!(machine.marks(), 4);
        assert_eq!(machine.outcome(), Some(outcome));

        // Further stepping repeats the settled outcome.
        assert_eq!(machine.step(&bb2).unwrap(), Some(outcome));
        assert_eq!(machine.step_count(), 6);
    }

    #[test]
    fn test_machine_reuse_across_runs() {
        let mut machine = Machine::new(budgeted(100)).unwrap();
        assert_eq!(
            machine.run(&table(BB2)).unwrap(),
            Outcome::Halted { steps: 6, marks: 4 }
        );
        assert_eq!(
            machine.run(&table("1RB 1LA  1LA 1RB")).unwrap(),
            Outcome::StepLimitExceeded
        );
        // A reused machine behaves exactly like a fresh one.
        assert_eq!(
            machine.run(&table(BB2)).unwrap(),
            Outcome::Halted { steps: 6, marks: 4 }
        );
    }

    #[test]
    fn test_right_mover_drifts_off_the_edge() {
        let mut machine = Machine::new(detecting(100, 50)).unwrap();
        let mover = table("1RA ...");
        assert_eq!(machine.run(&mover).unwrap(), Outcome::LoopDetected);
        // The drift check fires before the first step executes.
        assert_eq!(machine.step_count(), 0);

        // Without detection the same machine just burns its budget.
        let mut plain = Machine::new(budgeted(100)).unwrap();
        assert_eq!(plain.run(&mover).unwrap(), Outcome::StepLimitExceeded);
    }

    #[test]
    fn test_bouncer_recurs_in_window() {
        let bouncer = table("1RB 1LA  1LA 1RB");
        let mut machine = Machine::new(detecting(2000, 1000)).unwrap();
        assert_eq!(machine.run(&bouncer).unwrap(), Outcome::LoopDetected);
    }

    #[test]
    fn test_partially_defined_machines_recur() {
        // None of these ever scans its undefined cell; the detector settles
        // each one long before the budget.
        let mut machine = Machine::new(detecting(100, 50)).unwrap();
        for notation in [
            "1RB ...  0RC 1LB  1LA 0RB",
            "1RB ...  1LB 0LC  1LA 1RA",
            "1RB ...  1LC 1RA  1LA 0LC",
        ] {
            assert_eq!(
                machine.run(&table(notation)).unwrap(),
                Outcome::LoopDetected,
                "{}",
                notation
            );
        }
    }

    #[test]
    fn test_counter_defeats_the_window() {
        // The binary counter never recurs; the detector gives up and the
        // run ends indeterminate.
        assert_eq!(
            run_with("1RB 1LA  0LA 0RB", detecting(200, 50)),
            Outcome::NoRecurrenceFound
        );
    }

    #[test]
    fn test_window_spill() {
        let spiller = "1RB 0LA  0LC 0RA  1LA 1LB";

        let mut machine = Machine::new(detecting(1000, 200)).unwrap();
        assert_eq!(machine.run(&table(spiller)).unwrap(), Outcome::Spill);
        assert_eq!(machine.step_count(), 150);

        // With a smaller detector budget the hunt ends before the spill.
        assert_eq!(
            run_with(spiller, detecting(400, 50)),
            Outcome::NoRecurrenceFound
        );
        assert_eq!(
            run_with(spiller, budgeted(400)),
            Outcome::StepLimitExceeded
        );
    }

    #[test]
    fn test_detection_leaves_halting_runs_alone() {
        assert_eq!(
            run_with(BB4_STEPS, detecting(200, 150)),
            Outcome::Halted {
                steps: 107,
                marks: 13
            }
        );
    }

    #[test]
    fn test_blank_tape_halting() {
        let blanker = "1RB 0LA  0LA 0RB";
        let config = MachineConfig {
            step_budget: 100,
            halting: HaltingMode::BlankTapeHalt,
            ..MachineConfig::default()
        };
        assert_eq!(
            run_with(blanker, config),
            Outcome::Halted { steps: 3, marks: 0 }
        );

        // Under the explicit convention the same machine never stops.
        assert_eq!(run_with(blanker, budgeted(100)), Outcome::StepLimitExceeded);
    }

    #[test]
    fn test_undefined_slot_is_an_error() {
        let mut machine = Machine::new(budgeted(100)).unwrap();
        let result = machine.run(&table("1RB ...  1LA 1RB"));
        assert_eq!(result, Err(MachineError::UndefinedSlot(1, 1)));
        assert_eq!(machine.step_count(), 2);
    }

    #[test]
    fn test_detection_requires_two_symbols() {
        let wide = table("1RA 2LA 1RH");
        let mut machine = Machine::new(detecting(100, 50)).unwrap();
        assert_eq!(
            machine.run(&wide),
            Err(MachineError::UnsupportedAlphabet(3))
        );

        // The same table is fine without detection.
        let mut plain = Machine::new(budgeted(100)).unwrap();
        assert!(plain.run(&wide).is_ok());
    }

    #[test]
    fn test_capacity_validation() {
        let result = Machine::new(MachineConfig {
            step_budget: 100,
            capacity: Some(10),
            ..MachineConfig::default()
        });
        assert_eq!(
            result.err(),
            Some(MachineError::CapacityTooSmall {
                capacity: 10,
                budget: 100
            })
        );

        // An explicit capacity that covers the budget is accepted.
        assert!(Machine::new(MachineConfig {
            step_budget: 100,
            capacity: Some(1000),
            ..MachineConfig::default()
        })
        .is_ok());
    }

    #[test]
    fn test_start_state_override() {
        let config = MachineConfig {
            step_budget: 100,
            start_state: 2,
            ..MachineConfig::default()
        };
        assert_eq!(
            run_with("1RH 1RH  0RA 1RH", config),
            Outcome::Halted { steps: 2, marks: 1 }
        );
    }

    #[test]
    fn test_halt_sentinel_start_rejected() {
        let result = Machine::new(MachineConfig {
            start_state: HALT,
            ..MachineConfig::default()
        });
        assert!(matches!(
            result,
            Err(MachineError::ValidationError(_))
        ));
    }
}
