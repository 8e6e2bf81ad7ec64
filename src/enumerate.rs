//! This module provides the normalized enumeration of 3-state 2-symbol
//! programs and the search driver that classifies every one of them as a
//! stopper, a proven non-halter, or a holdout.
//!
//! The enumeration follows Lin's lot scheme: the start cell A0 is pinned to
//! `1RB` and a single halting stop line `1RH` is placed at one of four slots,
//! one per lot. The four remaining cells range over every non-halting
//! instruction, so each lot holds 12^4 programs and the whole census holds
//! four lots of them.

use crate::analyzer::has_halt_instruction;
use crate::encoder::{encode_octal, SERIAL_STATES, SERIAL_SYMBOLS};
use crate::machine::{Machine, MachineConfig};
use crate::types::{
    Direction, HaltingMode, Instruction, MachineError, Outcome, State, Symbol, TransitionTable,
    HALT,
};
use serde::Serialize;

/// Step budget for the halting scan. The three-state shift champion stops at
/// exactly this count, so every known stopper is caught.
pub const STOP_SCAN_BUDGET: usize = 21;

/// Observation budget for the recurrence hunt over the survivors.
pub const RECURRENCE_BUDGET: usize = 50;

/// Number of lots in the enumeration, one per stop line placement.
pub const LOTS: usize = 4;

/// Number of cells left free in each lot.
pub const FREE_SLOTS: usize = 4;

/// Number of non-halting instructions a free cell ranges over: two symbols
/// to print, two shift directions, three states to call.
pub const FREE_CASES: usize = SERIAL_SYMBOLS * 2 * SERIAL_STATES;

const LOT_SIZE: usize = FREE_CASES * FREE_CASES * FREE_CASES * FREE_CASES;

/// Returns the 12 instructions a free cell ranges over.
pub fn free_cases() -> Vec<Instruction> {
    let mut cases = Vec::with_capacity(FREE_CASES);
    for write in 0..SERIAL_SYMBOLS as Symbol {
        for direction in [Direction::Left, Direction::Right] {
            for next_state in 1..=SERIAL_STATES as State {
                cases.push(Instruction::new(write, direction, next_state));
            }
        }
    }

    cases
}

/// Returns the slot holding the stop line in the given lot.
///
/// # Panics
///
/// Panics if `lot` is not in `1..=LOTS`.
pub fn lot_stop_slot(lot: usize) -> (State, Symbol) {
    match lot {
        1 => (1, 1),
        2 => (2, 1),
        3 => (3, 0),
        4 => (3, 1),
        _ => panic!("Lot {} out of range", lot),
    }
}

/// Builds one lot member: A0 pinned to `1RB`, the stop line `1RH` at the
/// lot's slot, and the free cells filled in slot order.
pub fn lot_table(lot: usize, free: [Instruction; FREE_SLOTS]) -> TransitionTable {
    let mut table = TransitionTable::new(SERIAL_STATES, SERIAL_SYMBOLS);
    table.set(1, 0, Instruction::new(1, Direction::Right, 2));

    let (stop_state, stop_symbol) = lot_stop_slot(lot);
    table.set(stop_state, stop_symbol, Instruction::new(1, Direction::Right, HALT));

    let mut cases = free.into_iter();
    for state in 1..=SERIAL_STATES as State {
        for symbol in 0..SERIAL_SYMBOLS as Symbol {
            if table.get(state, symbol).is_none() {
                if let Some(instruction) = cases.next() {
                    table.set(state, symbol, instruction);
                }
            }
        }
    }

    table
}

/// Returns an iterator over all 12^4 members of the given lot.
pub fn lot_tables(lot: usize) -> impl Iterator<Item = TransitionTable> {
    let cases = free_cases();
    (0..LOT_SIZE).map(move |index| {
        let mut counter = index;
        let mut free = [cases[0]; FREE_SLOTS];
        for slot in free.iter_mut() {
            *slot = cases[counter % FREE_CASES];
            counter /= FREE_CASES;
        }

        lot_table(lot, free)
    })
}

/// Reports whether a lot member's stop line is unreachable by construction.
///
/// A lot 1 member can only halt by re-entering state A, which requires some
/// cell of B or C to call A. A lot 3 or 4 member can only halt by entering
/// state C, which requires A1, B0 or B1 to call C. Lot 2 members always
/// reach B through the pinned start cell, so none are pruned.
pub fn prune_obvious(lot: usize, table: &TransitionTable) -> bool {
    match lot {
        1 => !(2..=SERIAL_STATES as State).any(|state| calls(table, state, 1)),
        3 | 4 => {
            !table.get(1, 1).is_some_and(|i| i.next_state == 3) && !calls(table, 2, 3)
        }
        _ => false,
    }
}

/// Reports whether any cell of the given state calls the target state.
fn calls(table: &TransitionTable, state: State, target: State) -> bool {
    (0..table.symbols() as Symbol)
        .any(|symbol| table.get(state, symbol).is_some_and(|i| i.next_state == target))
}

/// Classifies one program with a short halting scan followed by a recurrence
/// hunt.
///
/// Both machines are reused across calls; each `run` starts from a blank
/// tape. A program that cannot halt at all skips the scan and goes straight
/// to the recurrence machine.
///
/// # Arguments
///
/// * `table` - The program to classify.
/// * `halt_scan` - A machine with a short step budget and no detector.
/// * `recurrence` - A machine configured with a recurrence detector.
///
/// # Returns
///
/// * `Ok(Outcome)` holding the halting scan's outcome if it halted, and the
///   recurrence machine's outcome otherwise.
pub fn classify(
    table: &TransitionTable,
    halt_scan: &mut Machine,
    recurrence: &mut Machine,
) -> Result<Outcome, MachineError> {
    let can_halt = match halt_scan.config().halting {
        HaltingMode::ExplicitHaltState => has_halt_instruction(table),
        HaltingMode::BlankTapeHalt => true,
    };

    if can_halt {
        let outcome = halt_scan.run(table)?;
        if outcome.is_halted() {
            return Ok(outcome);
        }
    }

    recurrence.run(table)
}

/// Tallies and records from one full census run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    /// Programs enumerated across all lots.
    pub enumerated: usize,
    /// Programs that halted within the halting scan budget.
    pub stoppers: usize,
    /// Programs that survived the halting scan.
    pub candidates: usize,
    /// Candidates whose stop line was unreachable by construction.
    pub pruned: usize,
    /// Candidates discarded by a partial recurrence proof.
    pub looping: usize,
    /// Serial numbers of the candidates left unresolved, in octal, sorted.
    pub holdouts: Vec<String>,
    /// Candidates whose tape record outgrew the detector window.
    pub spills: usize,
    /// Candidates that halted after the halting scan budget.
    pub late_stoppers: usize,
    /// Highest step count over all halters.
    pub best_steps: usize,
    /// Notation of the first program reaching `best_steps`.
    pub best_steps_table: String,
    /// Marks left by that program.
    pub best_steps_marks: usize,
    /// Highest mark count over all halters.
    pub best_marks: usize,
    /// Notation of the first program reaching `best_marks`.
    pub best_marks_table: String,
    /// Steps taken by that program.
    pub best_marks_steps: usize,
}

impl SearchReport {
    fn record_halter(&mut self, table: &TransitionTable, steps: usize, marks: usize) {
        if steps > self.best_steps {
            self.best_steps = steps;
            self.best_steps_marks = marks;
            self.best_steps_table = table.to_string();
        }
        if marks > self.best_marks {
            self.best_marks = marks;
            self.best_marks_steps = steps;
            self.best_marks_table = table.to_string();
        }
    }
}

/// Runs the full census of normalized 3-state 2-symbol programs.
///
/// Every lot member is scanned for halting, pruned when its stop line is
/// unreachable, and otherwise handed to the recurrence detector. The report
/// carries the tallies, the champion records, and the serial numbers of the
/// holdouts.
///
/// # Returns
///
/// * `Ok(SearchReport)` summarizing the census.
/// * `Err(MachineError)` if any program fails to execute or encode, which
///   indicates a bug rather than an interesting machine.
pub fn search_lin_3_2() -> Result<SearchReport, MachineError> {
    let mut halt_scan = Machine::new(MachineConfig {
        step_budget: STOP_SCAN_BUDGET,
        ..MachineConfig::default()
    })?;
    let mut recurrence = Machine::new(MachineConfig {
        step_budget: 2 * RECURRENCE_BUDGET,
        detector_budget: Some(RECURRENCE_BUDGET),
        ..MachineConfig::default()
    })?;

    let mut report = SearchReport::default();

    for lot in 1..=LOTS {
        for table in lot_tables(lot) {
            report.enumerated += 1;

            if prune_obvious(lot, &table) {
                report.candidates += 1;
                report.pruned += 1;
                continue;
            }

            match classify(&table, &mut halt_scan, &mut recurrence)? {
                Outcome::Halted { steps, marks } => {
                    report.record_halter(&table, steps, marks);
                    if steps > STOP_SCAN_BUDGET {
                        report.candidates += 1;
                        report.late_stoppers += 1;
                    } else {
                        report.stoppers += 1;
                    }
                }
                Outcome::LoopDetected => {
                    report.candidates += 1;
                    report.looping += 1;
                }
                Outcome::Spill => {
                    report.candidates += 1;
                    report.spills += 1;
                }
                Outcome::NoRecurrenceFound | Outcome::StepLimitExceeded => {
                    report.candidates += 1;
                    report.holdouts.push(encode_octal(&table)?);
                }
            }
        }
    }

    report.holdouts.sort();
    Ok(report)
}
