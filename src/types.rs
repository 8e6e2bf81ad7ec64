//! This module defines the core data types used throughout the library:
//! symbols, states, instructions, transition tables, halting conventions,
//! run outcomes, and the error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// A tape symbol. Symbol `0` is the blank.
pub type Symbol = u8;

/// A machine state. States are numbered from 1 (state `A`); `0` is reserved
/// for the halt sentinel.
pub type State = u8;

/// The blank tape symbol.
pub const BLANK: Symbol = 0;

/// The reserved state value that ends a run when jumped to.
pub const HALT: State = 0;

/// The state every run begins in (state `A`).
pub const START_STATE: State = 1;

/// Largest supported state count (states `A` through `E`).
pub const MAX_STATES: usize = 5;

/// Largest supported alphabet size.
pub const MAX_SYMBOLS: usize = 5;

/// Default engine step budget when none is configured.
pub const DEFAULT_STEP_BUDGET: usize = 10_000;

/// Head movement direction for a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
}

impl Direction {
    /// Returns the single-letter notation form (`L` or `R`).
    pub fn letter(&self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }
}

/// One transition-table cell: the symbol to print, the direction to shift,
/// and the state to call next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    /// The symbol printed over the scanned cell.
    pub write: Symbol,
    /// The direction the head shifts after printing.
    pub direction: Direction,
    /// The state called next, or [`HALT`] to end the run.
    pub next_state: State,
}

impl Instruction {
    pub fn new(write: Symbol, direction: Direction, next_state: State) -> Self {
        Instruction {
            write,
            direction,
            next_state,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.write,
            self.direction.letter(),
            state_letter(self.next_state)
        )
    }
}

/// Returns the notation letter for a state (`H` for the halt sentinel).
pub fn state_letter(state: State) -> char {
    if state == HALT {
        'H'
    } else {
        (b'A' + state - 1) as char
    }
}

/// A complete machine program: a dense grid of optional instructions indexed
/// by `(state, symbol)`.
///
/// A `None` cell is an explicitly undefined entry. Scanning one during a run
/// is reported as an error rather than treated as a halt, so partially
/// specified programs stay honest about which cells they never reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTable {
    states: usize,
    symbols: usize,
    cells: Vec<Option<Instruction>>,
}

impl TransitionTable {
    /// Creates a table of the given dimensions with every cell undefined.
    pub fn new(states: usize, symbols: usize) -> Self {
        TransitionTable {
            states,
            symbols,
            cells: vec![None; states * symbols],
        }
    }

    /// Returns the number of states in the table.
    pub fn states(&self) -> usize {
        self.states
    }

    /// Returns the alphabet size of the table.
    pub fn symbols(&self) -> usize {
        self.symbols
    }

    /// Returns the instruction for `(state, symbol)`, or `None` when the cell
    /// is undefined or the coordinates fall outside the table.
    pub fn get(&self, state: State, symbol: Symbol) -> Option<Instruction> {
        if state == HALT || state as usize > self.states || symbol as usize >= self.symbols {
            return None;
        }
        self.cells[self.index(state, symbol)]
    }

    /// Stores an instruction in the `(state, symbol)` cell. The coordinates
    /// must lie within the table's dimensions.
    pub fn set(&mut self, state: State, symbol: Symbol, instruction: Instruction) {
        let index = self.index(state, symbol);
        self.cells[index] = Some(instruction);
    }

    /// Iterates over every cell in row-major order together with its
    /// `(state, symbol)` coordinates.
    pub fn slots(&self) -> impl Iterator<Item = (State, Symbol, Option<Instruction>)> + '_ {
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let state = (i / self.symbols) as State + 1;
            let symbol = (i % self.symbols) as Symbol;
            (state, symbol, *cell)
        })
    }

    /// Returns true when no cell is undefined.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    fn index(&self, state: State, symbol: Symbol) -> usize {
        (state as usize - 1) * self.symbols + symbol as usize
    }
}

impl fmt::Display for TransitionTable {
    /// Renders the table back into the standard notation.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rows: Vec<String> = (0..self.states)
            .map(|row| {
                (0..self.symbols)
                    .map(|col| match self.cells[row * self.symbols + col] {
                        Some(instruction) => instruction.to_string(),
                        None => "...".to_string(),
                    })
                    .collect::<Vec<String>>()
                    .join(" ")
            })
            .collect();
        write!(f, "{}", rows.join("  "))
    }
}

/// The halting convention a run obeys.
///
/// A jump to the halt sentinel always ends a run. `BlankTapeHalt`
/// additionally ends the run as soon as no marks remain on the tape after at
/// least one step, which is the convention used when hunting machines that
/// erase their own work.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltingMode {
    /// A run ends only on a jump to the halt sentinel.
    #[default]
    ExplicitHaltState,
    /// A run also ends once the tape holds no marks.
    BlankTapeHalt,
}

/// Final classification of one run.
///
/// `Halted` and `LoopDetected` are proven results; the remaining variants
/// record that the run ended without settling the halting question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The machine halted. `steps` counts executed steps including the
    /// halting one, `marks` counts non-blank cells left on the tape.
    Halted { steps: usize, marks: usize },
    /// The engine's step budget ran out before anything was decided.
    StepLimitExceeded,
    /// Non-halting was proven, either by edge drift or by a recurring
    /// configuration inside the detector window.
    LoopDetected,
    /// The head left the detector window before anything was proven.
    Spill,
    /// The detector budget ran out without a recurrence or a spill.
    NoRecurrenceFound,
}

impl Outcome {
    /// Returns true when the machine halted.
    pub fn is_halted(&self) -> bool {
        matches!(self, Outcome::Halted { .. })
    }

    /// Returns true when the run settled the halting question either way.
    pub fn is_proven(&self) -> bool {
        matches!(self, Outcome::Halted { .. } | Outcome::LoopDetected)
    }

    /// Returns true when the run ended without a proof.
    pub fn is_indeterminate(&self) -> bool {
        !self.is_proven()
    }
}

/// Errors surfaced while parsing, validating, configuring, or running a
/// machine.
///
/// These are faults in the caller's setup or input. A run that merely fails
/// to decide halting is not an error; that is reported through [`Outcome`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MachineError {
    /// A run scanned a `(state, symbol)` cell with no instruction.
    #[error("No instruction defined for state {0} scanning symbol {1}")]
    UndefinedSlot(State, Symbol),

    /// The head was about to move outside the tape buffer.
    #[error("Tape capacity exceeded at head position {0}")]
    TapeOverrun(usize),

    /// The configured tape capacity cannot cover the step budget.
    #[error("Tape capacity {capacity} is too small for step budget {budget}")]
    CapacityTooSmall { capacity: usize, budget: usize },

    /// Recurrence detection tracks one bit per cell and so only supports
    /// two-symbol machines.
    #[error("Recurrence detection requires a 2-symbol alphabet, got {0}")]
    UnsupportedAlphabet(usize),

    /// An error during parsing of the program notation.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),

    /// An error during validation of a transition table's structure.
    #[error("Program validation error: {0}")]
    ValidationError(String),

    /// An error related to file system operations while loading programs.
    #[error("File error: {0}")]
    FileError(String),
}
