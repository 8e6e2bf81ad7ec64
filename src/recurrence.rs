//! This module implements the two non-halting provers that back the search:
//! a constant-time edge-drift check for machines marching off into blank
//! tape, and a bounded-window recurrence detector that recognizes machines
//! whose configuration repeats, possibly translated along the tape.
//!
//! The window detector keeps a 36-bit image of the tape centered on the
//! starting cell and records one snapshot of it after every step, keyed by
//! the state about to run and the symbol about to be scanned. A later step
//! with the same key whose window agrees with a snapshot on every cell the
//! head visited in between proves the machine loops forever. Two-symbol
//! machines only, one bit per cell.

use crate::tape::Tape;
use crate::types::{Direction, Instruction, State, Symbol, BLANK, MAX_STATES};

/// Width of the tracked tape window in bits.
pub const WINDOW_BITS: i32 = 36;

/// Bit position of the run's starting cell within the window.
pub const START_BIT: i32 = 18;

/// Largest head deviation the window can represent. One step beyond it in
/// either direction is a spill.
pub const DEV_LIMIT: i32 = 17;

/// What the window detector concluded after observing one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing decided yet.
    Continue,
    /// The configuration recurred: the machine never halts.
    Recurrence,
    /// The head left the window; nothing can be concluded.
    Spill,
    /// The detector's step budget ran out without a conclusion.
    BudgetExhausted,
}

/// One recorded configuration: the window image, the step it was taken
/// after, and the head deviation at that point.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    window: u64,
    step: usize,
    deviation: i32,
}

/// Bounded-window translated-recurrence detector.
///
/// Buffers are allocated once and survive [`RecurrenceDetector::reset`], so
/// a single detector can serve an entire enumeration run.
#[derive(Debug)]
pub struct RecurrenceDetector {
    budget: usize,
    window: u64,
    deviation: i32,
    /// Head deviation after each step; entry 0 is the starting position.
    history: Vec<i32>,
    /// Snapshots bucketed by `(state, scanned symbol)`.
    snapshots: Vec<Vec<Snapshot>>,
}

impl RecurrenceDetector {
    /// Creates a detector that gives up after `budget` observed steps.
    pub fn new(budget: usize) -> Self {
        let mut history = Vec::with_capacity(budget + 1);
        history.push(0);
        RecurrenceDetector {
            budget,
            window: 0,
            deviation: 0,
            history,
            snapshots: vec![Vec::new(); MAX_STATES * 2],
        }
    }

    /// Returns the detector's step budget.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Clears all run state while keeping the allocated buffers.
    pub fn reset(&mut self) {
        self.window = 0;
        self.deviation = 0;
        self.history.clear();
        self.history.push(0);
        for bucket in &mut self.snapshots {
            bucket.clear();
        }
    }

    /// Feeds one executed step into the detector: the symbol printed at the
    /// old head position, the direction the head shifted, and the state
    /// about to run.
    ///
    /// Callers stop feeding after any verdict other than `Continue`.
    pub fn observe(&mut self, written: Symbol, direction: Direction, next_state: State) -> Verdict {
        let bit = 1u64 << (START_BIT + self.deviation);
        if written == BLANK {
            self.window &= !bit;
        } else {
            self.window |= bit;
        }

        self.deviation += match direction {
            Direction::Left => -1,
            Direction::Right => 1,
        };
        self.history.push(self.deviation);
        if self.deviation.abs() > DEV_LIMIT {
            return Verdict::Spill;
        }

        let step = self.history.len() - 1;
        let scanned = bit_at(self.window, self.deviation);
        let key = (next_state as usize - 1) * 2 + scanned as usize;
        for snapshot in &self.snapshots[key] {
            if self.matches(snapshot, step) {
                return Verdict::Recurrence;
            }
        }

        self.snapshots[key].push(Snapshot {
            window: self.window,
            step,
            deviation: self.deviation,
        });
        if step >= self.budget {
            return Verdict::BudgetExhausted;
        }
        Verdict::Continue
    }

    /// Compares the current window against a snapshot over the cells the
    /// head visited between the snapshot's step and `step`.
    fn matches(&self, snapshot: &Snapshot, step: usize) -> bool {
        let (dev_min, dev_max) = self.deviation_extremes(snapshot.step, step);
        let delta = self.deviation - snapshot.deviation;

        if delta > 0 {
            // Shifted right: cells past the right barrier are unreachable
            // without first crossing everything compared here.
            let end = DEV_LIMIT - delta;
            (dev_min..=end).all(|dev| {
                bit_at(snapshot.window, dev) == bit_at(self.window, dev + delta)
            })
        } else if delta < 0 {
            let start = (-DEV_LIMIT - delta).max(-DEV_LIMIT);
            (start..=dev_max).all(|dev| {
                bit_at(snapshot.window, dev) == bit_at(self.window, dev + delta)
            })
        } else {
            let mask = window_mask(START_BIT + dev_min, START_BIT + dev_max);
            snapshot.window & mask == self.window & mask
        }
    }

    /// Returns the minimum and maximum head deviation over the inclusive
    /// step range `from..=to`.
    fn deviation_extremes(&self, from: usize, to: usize) -> (i32, i32) {
        let mut min = i32::MAX;
        let mut max = i32::MIN;
        for &deviation in &self.history[from..=to] {
            min = min.min(deviation);
            max = max.max(deviation);
        }
        (min, max)
    }
}

/// Returns the window bit for a head deviation, reading positions outside
/// the window as blank.
fn bit_at(window: u64, deviation: i32) -> u64 {
    let position = START_BIT + deviation;
    if !(0..WINDOW_BITS).contains(&position) {
        return 0;
    }
    (window >> position) & 1
}

/// Builds a mask covering window bits `low..=high`.
fn window_mask(low: i32, high: i32) -> u64 {
    let width = (high - low + 1) as u32;
    ((1u64 << width) - 1) << low
}

/// Constant-time check for a machine about to march off into blank tape.
///
/// When the head sits on the outermost touched cell, scans a blank, and the
/// instruction keeps the current state while moving further outward, the
/// next step faces the identical configuration one cell over. The machine
/// can never halt.
pub fn drifts_past_edge(tape: &Tape, state: State, instruction: &Instruction) -> bool {
    instruction.next_state == state
        && tape.read() == BLANK
        && tape.at_edge(instruction.direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rightward_translation_recurs() {
        let mut detector = RecurrenceDetector::new(100);
        assert_eq!(detector.observe(1, Direction::Right, 2), Verdict::Continue);
        // One cell over, the same state scans the same blank with the same
        // trail behind it.
        assert_eq!(
            detector.observe(1, Direction::Right, 2),
            Verdict::Recurrence
        );
    }

    #[test]
    fn test_in_place_recurrence() {
        let mut detector = RecurrenceDetector::new(100);
        // Bounce between two cells printing marks; the fourth step revisits
        // the second step's configuration with zero net shift.
        assert_eq!(detector.observe(1, Direction::Right, 2), Verdict::Continue);
        assert_eq!(detector.observe(1, Direction::Left, 2), Verdict::Continue);
        assert_eq!(detector.observe(1, Direction::Right, 2), Verdict::Continue);
        assert_eq!(detector.observe(1, Direction::Left, 2), Verdict::Recurrence);
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut detector = RecurrenceDetector::new(2);
        assert_eq!(detector.observe(1, Direction::Right, 1), Verdict::Continue);
        // Different state, so the fresh bucket cannot match; the budget ends
        // on this step instead.
        assert_eq!(
            detector.observe(0, Direction::Right, 2),
            Verdict::BudgetExhausted
        );
    }

    #[test]
    fn test_reset_clears_run_state() {
        let mut detector = RecurrenceDetector::new(100);
        detector.observe(1, Direction::Right, 2);
        detector.reset();
        // After a reset the first observation starts a fresh history.
        assert_eq!(detector.observe(1, Direction::Right, 2), Verdict::Continue);
        assert_eq!(
            detector.observe(1, Direction::Right, 2),
            Verdict::Recurrence
        );
    }

    #[test]
    fn test_window_bit_addressing() {
        let window = 1u64 << START_BIT;
        assert_eq!(bit_at(window, 0), 1);
        assert_eq!(bit_at(window, 1), 0);
        assert_eq!(bit_at(window, -1), 0);
        // Positions outside the window read as blank.
        assert_eq!(bit_at(u64::MAX, 100), 0);
        assert_eq!(bit_at(u64::MAX, -100), 0);
    }

    #[test]
    fn test_window_mask_bounds() {
        assert_eq!(window_mask(0, 0), 1);
        assert_eq!(window_mask(1, 2), 0b110);
        assert_eq!(window_mask(18, 19), 0b11 << 18);
    }

    #[test]
    fn test_drift_detection_at_edges() {
        use crate::types::Instruction;

        let tape = Tape::new(11);
        let onward = Instruction::new(1, Direction::Right, 1);
        assert!(drifts_past_edge(&tape, 1, &onward));

        // A state change breaks the argument.
        let elsewhere = Instruction::new(1, Direction::Right, 2);
        assert!(!drifts_past_edge(&tape, 1, &elsewhere));

        // So does scanning a mark.
        let mut marked = Tape::new(11);
        marked.write(1);
        assert!(!drifts_past_edge(&marked, 1, &onward));

        // Or a head that is not at the touched edge in the move direction.
        let mut inside = Tape::new(11);
        inside.move_head(Direction::Right).unwrap();
        let leftward = Instruction::new(1, Direction::Left, 1);
        assert!(!drifts_past_edge(&inside, 1, &leftward));
    }
}
