//! This module provides serial number encoding for 3-state 2-symbol programs.
//! A complete table packs into a 24-bit word, one 4-bit cell per slot in slot
//! order (A0 in the most significant position), conventionally rendered as 8
//! octal digits.

use crate::analyzer::analyze;
use crate::types::{
    state_letter, Direction, Instruction, MachineError, State, Symbol, TransitionTable,
};

/// Number of states covered by a serial number.
pub const SERIAL_STATES: usize = 3;
/// Number of symbols covered by a serial number.
pub const SERIAL_SYMBOLS: usize = 2;
/// Width of the octal rendering of a serial number.
pub const SERIAL_DIGITS: usize = 8;

const SERIAL_BITS: usize = 4 * SERIAL_STATES * SERIAL_SYMBOLS;

/// Encodes a complete 3-state 2-symbol table into its serial number.
///
/// Each cell becomes a 4-bit field: the printed symbol in bit 3, the shift
/// direction in bit 2 (1 for right), and the called state in bits 1 and 0
/// (0 for the halt state). Fields are laid out A0, A1, B0, B1, C0, C1 from
/// the most significant nibble down.
///
/// # Arguments
///
/// * `table` - The table to encode.
///
/// # Returns
///
/// * `Ok(u32)` holding the 24-bit serial number.
/// * `Err(MachineError::ValidationError)` if the table has the wrong shape
///   or an undefined cell.
pub fn encode(table: &TransitionTable) -> Result<u32, MachineError> {
    if table.states() != SERIAL_STATES || table.symbols() != SERIAL_SYMBOLS {
        return Err(MachineError::ValidationError(format!(
            "Serial numbers cover {}-state {}-symbol tables, found {} states and {} symbols",
            SERIAL_STATES,
            SERIAL_SYMBOLS,
            table.states(),
            table.symbols()
        )));
    }
    analyze(table)?;

    let mut serial = 0;
    for (state, symbol, cell) in table.slots() {
        let instruction = cell.ok_or_else(|| {
            MachineError::ValidationError(format!(
                "Cannot encode a partial table: no instruction at {}{}",
                state_letter(state),
                symbol
            ))
        })?;
        serial = (serial << 4) | cell_bits(instruction);
    }

    Ok(serial)
}

/// Encodes a table into the 8-digit octal rendering of its serial number.
pub fn encode_octal(table: &TransitionTable) -> Result<String, MachineError> {
    Ok(format!("{:0width$o}", encode(table)?, width = SERIAL_DIGITS))
}

/// Decodes a serial number back into a complete 3-state 2-symbol table.
///
/// # Arguments
///
/// * `serial` - A 24-bit serial number.
///
/// # Returns
///
/// * `Ok(TransitionTable)` holding the decoded table.
/// * `Err(MachineError::ValidationError)` if the value does not fit in 24
///   bits.
pub fn decode(serial: u32) -> Result<TransitionTable, MachineError> {
    if serial >= 1 << SERIAL_BITS {
        return Err(MachineError::ValidationError(format!(
            "Serial numbers are {}-bit values, found {:#o}",
            SERIAL_BITS, serial
        )));
    }

    let mut table = TransitionTable::new(SERIAL_STATES, SERIAL_SYMBOLS);
    let mut shift = SERIAL_BITS;
    for state in 1..=SERIAL_STATES as State {
        for symbol in 0..SERIAL_SYMBOLS as Symbol {
            shift -= 4;
            table.set(state, symbol, cell_instruction((serial >> shift) & 0xF));
        }
    }

    Ok(table)
}

/// Decodes the octal rendering of a serial number back into a table.
pub fn decode_octal(text: &str) -> Result<TransitionTable, MachineError> {
    let serial = u32::from_str_radix(text.trim(), 8).map_err(|e| {
        MachineError::ValidationError(format!("Invalid octal serial number {:?}: {}", text, e))
    })?;

    decode(serial)
}

/// Packs one instruction into its 4-bit cell value.
fn cell_bits(instruction: Instruction) -> u32 {
    let shift = match instruction.direction {
        Direction::Right => 1,
        Direction::Left => 0,
    };

    ((instruction.write as u32) << 3) | (shift << 2) | instruction.next_state as u32
}

/// Unpacks one 4-bit cell value into an instruction.
fn cell_instruction(bits: u32) -> Instruction {
    let direction = if bits & 0b100 != 0 {
        Direction::Right
    } else {
        Direction::Left
    };

    Instruction::new(((bits >> 3) & 1) as Symbol, direction, (bits & 0b11) as State)
}
