//! This module provides the bounded tape a machine runs on: a fixed-capacity
//! buffer of symbols with a head position, the touched-cell range, and an
//! incrementally maintained mark count.

use crate::types::{Direction, MachineError, Symbol, BLANK};

/// Extra cells allocated beyond the span a step budget can reach, so the
/// final head move of a maximal run still lands inside the buffer.
pub const TAPE_MARGIN: usize = 10;

/// A fixed-capacity tape.
///
/// The buffer is allocated once and reused across runs; a run of `n` steps
/// can move the head at most `n` cells from the start, so a capacity from
/// [`Tape::capacity_for`] guarantees the head never leaves the buffer. All
/// operations are constant time, including the mark count, which is updated
/// on every write instead of recounted.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<Symbol>,
    head: usize,
    touched_min: usize,
    touched_max: usize,
    marks: usize,
}

impl Tape {
    /// Creates a blank tape of the given capacity with the head centered.
    pub fn new(capacity: usize) -> Self {
        let head = capacity / 2;
        Tape {
            cells: vec![BLANK; capacity],
            head,
            touched_min: head,
            touched_max: head,
            marks: 0,
        }
    }

    /// Returns the capacity that covers any run of `step_budget` steps.
    pub fn capacity_for(step_budget: usize) -> usize {
        2 * step_budget + TAPE_MARGIN
    }

    /// Returns the total number of cells in the buffer.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Returns the current head position.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Returns the symbol under the head.
    pub fn read(&self) -> Symbol {
        self.cells[self.head]
    }

    /// Prints a symbol at the head position, keeping the mark count current.
    pub fn write(&mut self, symbol: Symbol) {
        let old = self.cells[self.head];
        if old == BLANK && symbol != BLANK {
            self.marks += 1;
        } else if old != BLANK && symbol == BLANK {
            self.marks -= 1;
        }
        self.cells[self.head] = symbol;
    }

    /// Moves the head one cell and widens the touched range to include the
    /// new position.
    ///
    /// # Returns
    ///
    /// `Err(MachineError::TapeOverrun)` when the move would leave the buffer,
    /// which indicates the capacity was not sized for the run's step budget.
    pub fn move_head(&mut self, direction: Direction) -> Result<(), MachineError> {
        match direction {
            Direction::Left => {
                if self.head == 0 {
                    return Err(MachineError::TapeOverrun(self.head));
                }
                self.head -= 1;
                if self.head < self.touched_min {
                    self.touched_min = self.head;
                }
            }
            Direction::Right => {
                if self.head + 1 >= self.cells.len() {
                    return Err(MachineError::TapeOverrun(self.head));
                }
                self.head += 1;
                if self.head > self.touched_max {
                    self.touched_max = self.head;
                }
            }
        }
        Ok(())
    }

    /// Returns the number of non-blank cells on the tape.
    pub fn marks(&self) -> usize {
        self.marks
    }

    /// Returns true when the tape holds no marks.
    pub fn is_blank(&self) -> bool {
        self.marks == 0
    }

    /// Returns the inclusive `(min, max)` range of cells the head has
    /// visited.
    pub fn touched(&self) -> (usize, usize) {
        (self.touched_min, self.touched_max)
    }

    /// Returns true when the head sits on the outermost touched cell in the
    /// given direction.
    pub fn at_edge(&self, direction: Direction) -> bool {
        match direction {
            Direction::Left => self.head == self.touched_min,
            Direction::Right => self.head == self.touched_max,
        }
    }

    /// Returns the touched cells as a slice, for rendering.
    pub fn touched_symbols(&self) -> &[Symbol] {
        &self.cells[self.touched_min..=self.touched_max]
    }

    /// Blanks every touched cell, recenters the head, and collapses the
    /// touched range back to the single starting cell. Untouched cells are
    /// already blank, so this keeps reuse constant-cost per touched cell
    /// rather than per capacity.
    pub fn clear_touched(&mut self) {
        for cell in &mut self.cells[self.touched_min..=self.touched_max] {
            *cell = BLANK;
        }
        self.head = self.cells.len() / 2;
        self.touched_min = self.head;
        self.touched_max = self.head;
        self.marks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tape_is_blank_and_centered() {
        let tape = Tape::new(11);
        assert_eq!(tape.capacity(), 11);
        assert_eq!(tape.head(), 5);
        assert_eq!(tape.read(), BLANK);
        assert_eq!(tape.marks(), 0);
        assert!(tape.is_blank());
        assert_eq!(tape.touched(), (5, 5));
    }

    #[test]
    fn test_capacity_covers_budget() {
        // A budget of n steps reaches at most n cells either way from center.
        let capacity = Tape::capacity_for(100);
        let tape = Tape::new(capacity);
        assert!(tape.head() >= 100);
        assert!(tape.head() + 100 < capacity);
    }

    #[test]
    fn test_write_maintains_mark_count() {
        let mut tape = Tape::new(11);
        tape.write(1);
        assert_eq!(tape.marks(), 1);

        // Overwriting a mark with a mark does not change the count.
        tape.write(1);
        assert_eq!(tape.marks(), 1);

        tape.write(BLANK);
        assert_eq!(tape.marks(), 0);
        assert!(tape.is_blank());
    }

    #[test]
    fn test_moves_widen_touched_range() {
        let mut tape = Tape::new(11);
        tape.move_head(Direction::Right).unwrap();
        tape.move_head(Direction::Right).unwrap();
        assert_eq!(tape.touched(), (5, 7));

        tape.move_head(Direction::Left).unwrap();
        tape.move_head(Direction::Left).unwrap();
        tape.move_head(Direction::Left).unwrap();
        assert_eq!(tape.touched(), (4, 7));
        assert_eq!(tape.head(), 4);
    }

    #[test]
    fn test_overrun_at_both_ends() {
        let mut tape = Tape::new(3);
        assert_eq!(tape.head(), 1);

        tape.move_head(Direction::Left).unwrap();
        assert_eq!(
            tape.move_head(Direction::Left),
            Err(MachineError::TapeOverrun(0))
        );

        let mut tape = Tape::new(3);
        tape.move_head(Direction::Right).unwrap();
        assert_eq!(
            tape.move_head(Direction::Right),
            Err(MachineError::TapeOverrun(2))
        );
    }

    #[test]
    fn test_at_edge_tracks_touched_bounds() {
        let mut tape = Tape::new(11);
        // A fresh head is at both edges of its one-cell range.
        assert!(tape.at_edge(Direction::Left));
        assert!(tape.at_edge(Direction::Right));

        tape.move_head(Direction::Right).unwrap();
        assert!(tape.at_edge(Direction::Right));
        assert!(!tape.at_edge(Direction::Left));

        tape.move_head(Direction::Left).unwrap();
        assert!(!tape.at_edge(Direction::Right));
        assert!(tape.at_edge(Direction::Left));
    }

    #[test]
    fn test_clear_touched_restores_blank_tape() {
        let mut tape = Tape::new(11);
        tape.write(1);
        tape.move_head(Direction::Right).unwrap();
        tape.write(2);
        tape.move_head(Direction::Right).unwrap();
        tape.write(1);

        tape.clear_touched();
        assert_eq!(tape.head(), 5);
        assert_eq!(tape.touched(), (5, 5));
        assert_eq!(tape.marks(), 0);

        // Every previously touched cell is blank again.
        for _ in 0..2 {
            assert_eq!(tape.read(), BLANK);
            tape.move_head(Direction::Right).unwrap();
        }
        assert_eq!(tape.read(), BLANK);
    }

    #[test]
    fn test_touched_symbols_slice() {
        let mut tape = Tape::new(11);
        tape.write(1);
        tape.move_head(Direction::Right).unwrap();
        tape.move_head(Direction::Right).unwrap();
        tape.write(1);
        assert_eq!(tape.touched_symbols(), &[1, 0, 1]);
    }
}
