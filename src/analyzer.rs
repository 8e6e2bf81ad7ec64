//! This module provides validation of transition tables before execution,
//! catching dimension and range problems that would otherwise surface as
//! errors mid-run. It also offers structural predicates used to prune
//! candidates cheaply during enumeration.

use crate::types::{
    state_letter, MachineError, State, Symbol, TransitionTable, BLANK, HALT, MAX_STATES,
    MAX_SYMBOLS, START_STATE,
};

/// Represents the problems that can be found during analysis of a transition
/// table.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The table's dimensions fall outside the supported range.
    InvalidDimensions(usize, usize),
    /// An instruction prints a symbol outside the table's alphabet.
    InvalidWrite {
        state: State,
        symbol: Symbol,
        write: Symbol,
    },
    /// An instruction calls a state the table does not define.
    InvalidNextState {
        state: State,
        symbol: Symbol,
        next_state: State,
    },
    /// The cell every run begins in has no instruction.
    UndefinedStartSlot,
}

impl From<AnalysisError> for MachineError {
    /// Converts an `AnalysisError` into a `MachineError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::InvalidDimensions(states, symbols) => {
                MachineError::ValidationError(format!(
                    "Unsupported table dimensions: {} states, {} symbols",
                    states, symbols
                ))
            }
            AnalysisError::InvalidWrite {
                state,
                symbol,
                write,
            } => MachineError::ValidationError(format!(
                "Instruction {}{} prints symbol {} outside the alphabet",
                state_letter(state),
                symbol,
                write
            )),
            AnalysisError::InvalidNextState {
                state,
                symbol,
                next_state,
            } => MachineError::ValidationError(format!(
                "Instruction {}{} calls undefined state {}",
                state_letter(state),
                symbol,
                state_letter(next_state)
            )),
            AnalysisError::UndefinedStartSlot => MachineError::ValidationError(
                "The start cell (state A scanning blank) has no instruction".to_string(),
            ),
        }
    }
}

/// Analyzes a transition table for structural errors.
///
/// Undefined cells are allowed; a partially specified table is valid as long
/// as its defined instructions stay within bounds and a run can begin.
///
/// # Arguments
///
/// * `table` - A reference to the `TransitionTable` to be analyzed.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(MachineError::ValidationError)` if any validation rule is violated.
pub fn analyze(table: &TransitionTable) -> Result<(), MachineError> {
    let errors = [check_dimensions, check_instructions, check_start_slot]
        .iter()
        .filter_map(|f| f(table).err())
        .collect::<Vec<_>>();

    if !errors.is_empty() {
        // Return the first error
        if let Some(first_error) = errors.first() {
            return Err((*first_error).clone().into());
        }
    }

    Ok(())
}

/// Checks that the table's dimensions are within the supported range.
fn check_dimensions(table: &TransitionTable) -> Result<(), AnalysisError> {
    let states = table.states();
    let symbols = table.symbols();
    if !(1..=MAX_STATES).contains(&states) || !(2..=MAX_SYMBOLS).contains(&symbols) {
        return Err(AnalysisError::InvalidDimensions(states, symbols));
    }

    Ok(())
}

/// Checks that every defined instruction prints within the alphabet and
/// calls a state the table defines (or the halt sentinel).
fn check_instructions(table: &TransitionTable) -> Result<(), AnalysisError> {
    for (state, symbol, cell) in table.slots() {
        let Some(instruction) = cell else {
            continue;
        };
        if instruction.write as usize >= table.symbols() {
            return Err(AnalysisError::InvalidWrite {
                state,
                symbol,
                write: instruction.write,
            });
        }
        if instruction.next_state != HALT && instruction.next_state as usize > table.states() {
            return Err(AnalysisError::InvalidNextState {
                state,
                symbol,
                next_state: instruction.next_state,
            });
        }
    }

    Ok(())
}

/// Checks that the cell a run begins in has an instruction.
fn check_start_slot(table: &TransitionTable) -> Result<(), AnalysisError> {
    if table.get(START_STATE, BLANK).is_none() {
        return Err(AnalysisError::UndefinedStartSlot);
    }

    Ok(())
}

/// Returns true when every state is reachable from the start state through
/// next-state calls.
///
/// Tables that fail this are redundant in an enumeration: they behave like a
/// smaller machine plus unreachable baggage.
pub fn is_connected(table: &TransitionTable) -> bool {
    let mut visited = vec![false; table.states() + 1];
    let mut queue = vec![START_STATE];

    while let Some(state) = queue.pop() {
        if visited[state as usize] {
            continue;
        }
        visited[state as usize] = true;

        for symbol in 0..table.symbols() {
            if let Some(instruction) = table.get(state, symbol as Symbol) {
                let next = instruction.next_state;
                if next != HALT && (next as usize) <= table.states() && !visited[next as usize] {
                    queue.push(next);
                }
            }
        }
    }

    (1..=table.states()).all(|state| visited[state])
}

/// Returns true when some cell jumps to the halt sentinel. A table without
/// one can never halt under the explicit convention.
pub fn has_halt_instruction(table: &TransitionTable) -> bool {
    table
        .slots()
        .any(|(_, _, cell)| matches!(cell, Some(instruction) if instruction.next_state == HALT))
}

/// Returns true when some cell prints a non-blank symbol. A table without
/// one leaves the tape blank forever.
pub fn writes_any_mark(table: &TransitionTable) -> bool {
    table
        .slots()
        .any(|(_, _, cell)| matches!(cell, Some(instruction) if instruction.write != BLANK))
}
