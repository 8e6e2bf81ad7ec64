//! This crate provides the core logic for a Busy Beaver search engine.
//! It includes modules for parsing machine notation, bounded execution,
//! proving non-halting through partial recurrence detection, and running
//! the normalized census of 3-state 2-symbol programs.

pub mod analyzer;
pub mod encoder;
pub mod enumerate;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod recurrence;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the serial number codec from the encoder module.
pub use encoder::{decode, decode_octal, encode, encode_octal};
/// Re-exports the census driver from the enumerate module.
pub use enumerate::{classify, search_lin_3_2, SearchReport};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `Machine` struct and its configuration from the machine module.
pub use machine::{Machine, MachineConfig, Status};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `MachineInfo`, `MachineCatalog`, and `MACHINES` from the programs module.
pub use programs::{MachineCatalog, MachineInfo, MACHINES};
/// Re-exports the `RecurrenceDetector` and its verdicts from the recurrence module.
pub use recurrence::{drifts_past_edge, RecurrenceDetector, Verdict};
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports various types related to machine definition and execution from the types module.
pub use types::{
    Direction, HaltingMode, Instruction, MachineError, Outcome, State, Symbol, TransitionTable,
    DEFAULT_STEP_BUDGET,
};
