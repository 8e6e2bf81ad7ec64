//! This module provides the parser for the standard Busy Beaver program
//! notation, utilizing the `pest` crate. One row of instructions per state,
//! rows separated by two spaces, instructions by one space, as in
//! `"1RB 1LB  1LA 1RH"`.

use crate::{
    analyzer::analyze,
    types::{Direction, Instruction, MachineError, State, Symbol, TransitionTable, HALT},
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;

/// Derives a `PestParser` for the program notation defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct NotationParser;

/// Parses the given notation string into a `TransitionTable`.
///
/// This is the main entry point for reading programs. It trims the input,
/// parses it using the `NotationParser`, builds the table, and validates it
/// before returning.
///
/// # Arguments
///
/// * `input` - A string slice containing one program in standard notation.
///
/// # Returns
///
/// * `Ok(TransitionTable)` if the input is successfully parsed and validated.
/// * `Err(MachineError::ParseError)` if there are any syntax errors.
/// * `Err(MachineError::ValidationError)` if the table fails validation.
pub fn parse(input: &str) -> Result<TransitionTable, MachineError> {
    let root = NotationParser::parse(Rule::program, input.trim())
        .map_err(|e| MachineError::ParseError(e.into()))?
        .next()
        .unwrap();

    let table = parse_table(root)?;

    // Analyze the parsed table
    analyze(&table)?;

    Ok(table)
}

/// Builds a `TransitionTable` from a `Pair<Rule::program>`.
///
/// Every row must hold the same number of instructions; the row count gives
/// the state count and the row width gives the alphabet size.
fn parse_table(pair: Pair<Rule>) -> Result<TransitionTable, MachineError> {
    let mut rows: Vec<Vec<Option<Instruction>>> = Vec::new();
    let mut symbols = 0;

    for row_pair in pair.into_inner() {
        if row_pair.as_rule() != Rule::row {
            continue;
        }
        let span = row_pair.as_span();
        let row = parse_row(row_pair)?;
        if rows.is_empty() {
            symbols = row.len();
        } else if row.len() != symbols {
            return Err(parse_error(
                &format!(
                    "Expected {} instructions in every row, found {}",
                    symbols,
                    row.len()
                ),
                span,
            ));
        }
        rows.push(row);
    }

    let mut table = TransitionTable::new(rows.len(), symbols);
    for (row_index, row) in rows.into_iter().enumerate() {
        for (col_index, cell) in row.into_iter().enumerate() {
            if let Some(instruction) = cell {
                table.set(row_index as State + 1, col_index as Symbol, instruction);
            }
        }
    }

    Ok(table)
}

/// Parses one state's row of instructions from a `Pair<Rule::row>`.
fn parse_row(pair: Pair<Rule>) -> Result<Vec<Option<Instruction>>, MachineError> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::instruction)
        .map(parse_instruction)
        .collect()
}

/// Parses a single cell, which is either an action or the `...` marker for
/// an undefined cell.
fn parse_instruction(pair: Pair<Rule>) -> Result<Option<Instruction>, MachineError> {
    let span = pair.as_span();
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::undefined => Ok(None),
        Rule::action => Ok(Some(parse_action(inner)?)),
        _ => Err(parse_error("Unsupported instruction", span)),
    }
}

/// Parses a print/shift/call triple from a `Pair<Rule::action>`.
fn parse_action(pair: Pair<Rule>) -> Result<Instruction, MachineError> {
    let mut pairs = pair.into_inner();
    let write = parse_print(pairs.next().unwrap());
    let direction = parse_shift(pairs.next().unwrap())?;
    let next_state = parse_call(pairs.next().unwrap())?;

    Ok(Instruction {
        write,
        direction,
        next_state,
    })
}

/// Parses the printed symbol from a `Pair<Rule::print>`.
fn parse_print(pair: Pair<Rule>) -> Symbol {
    // The grammar guarantees a single ASCII digit.
    pair.as_str().as_bytes()[0] - b'0'
}

/// Parses the shift direction from a `Pair<Rule::shift>`.
fn parse_shift(pair: Pair<Rule>) -> Result<Direction, MachineError> {
    let span = pair.as_span();
    match pair.as_str() {
        "L" => Ok(Direction::Left),
        "R" => Ok(Direction::Right),
        _ => Err(parse_error(
            &format!("Unsupported shift direction: {}", pair.as_str()),
            span,
        )),
    }
}

/// Parses the called state from a `Pair<Rule::call>`.
///
/// `H` and `_` both name the halt state; letters `A` through `E` name
/// ordinary states.
fn parse_call(pair: Pair<Rule>) -> Result<State, MachineError> {
    let span = pair.as_span();
    match pair.as_str().as_bytes()[0] {
        b'H' | b'_' => Ok(HALT),
        letter @ b'A'..=b'E' => Ok(letter - b'A' + 1),
        _ => Err(parse_error(
            &format!("Unsupported state letter: {}", pair.as_str()),
            span,
        )),
    }
}

/// Creates a `MachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> MachineError {
    MachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}
