//! This module provides a built-in catalog of reference machines: the known
//! champions up to five states plus the recurrent and pathological machines
//! used to exercise the engine and the recurrence detector.

use crate::types::{MachineError, TransitionTable};
use serde::Serialize;

use std::sync::RwLock;

// Embedded reference machines
const MACHINE_TEXTS: [(&str, &str); 16] = [
    ("bb2", "1RB 1LB  1LA 1RH"),
    ("bb3-shift", "1RB 1RH  1LB 0RC  1LC 1LA"),
    ("bb3-sigma", "1RB 1LC  1RC 1RH  1LA 0LB"),
    ("bb4-shift", "1RB 1LB  1LA 0LC  1RH 1LD  1RD 0RA"),
    ("bb4-sigma", "1RB 0RC  1LA 1RA  1RH 1RD  1LD 0LB"),
    ("bb5", "1RB 1LC  1RC 1RB  1RD 0LE  1LA 1LD  1RH 0LA"),
    ("right-mover", "1RA ..."),
    ("counter", "1RB 1LA  0LA 0RB"),
    ("xmas-tree", "1RB 1LA  1LA 1RB"),
    ("xmas-one-side", "1RB 1LA  0LA 1RB"),
    ("xmas-spaces", "1RB 0LB  1LA 0RA"),
    ("window-spiller", "1RB 0LA  0LC 0RA  1LA 1LB"),
    ("tape-blanker", "1RB 0LA  0LA 0RB"),
    ("lin-total-recurrence", "1RB ...  0RC 1LB  1LA 0RB"),
    ("lin-left-barrier", "1RB ...  1LB 0LC  1LA 1RA"),
    ("lin-right-barrier", "1RB ...  1LC 1RA  1LA 0LC"),
];

lazy_static::lazy_static! {
    pub static ref MACHINES: RwLock<Vec<(String, TransitionTable)>> = RwLock::new(Vec::new());
}

pub struct MachineCatalog;

impl MachineCatalog {
    /// Initialize the MachineCatalog with the embedded machines
    pub fn load() -> Result<(), MachineError> {
        let mut machines = Vec::new();

        for (name, text) in MACHINE_TEXTS {
            if let Ok(table) = crate::parser::parse(text) {
                machines.push((name.to_string(), table));
            } else {
                eprintln!("Failed to parse embedded machine '{}'", name);
            }
        }

        // Store the loaded machines
        if let Ok(mut write_guard) = MACHINES.write() {
            *write_guard = machines;
        } else {
            return Err(MachineError::FileError(
                "Failed to acquire write lock".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the number of available machines
    pub fn count() -> usize {
        // Initialize with the embedded machines if not already initialized
        let _ = Self::load();

        MACHINES.read().map(|machines| machines.len()).unwrap_or(0)
    }

    /// Get a machine's table by its index
    pub fn get_by_index(index: usize) -> Result<TransitionTable, MachineError> {
        // Initialize with the embedded machines if not already initialized
        let _ = Self::load();

        MACHINES
            .read()
            .map_err(|_| MachineError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .map(|(_, table)| table.clone())
            .ok_or_else(|| {
                MachineError::ValidationError(format!("Machine index {} out of range", index))
            })
    }

    /// Get a machine's table by its name
    pub fn get(name: &str) -> Result<TransitionTable, MachineError> {
        // Initialize with the embedded machines if not already initialized
        let _ = Self::load();

        MACHINES
            .read()
            .map_err(|_| MachineError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|(machine_name, _)| machine_name == name)
            .map(|(_, table)| table.clone())
            .ok_or_else(|| MachineError::ValidationError(format!("Machine '{}' not found", name)))
    }

    /// List all machine names
    pub fn names() -> Vec<String> {
        // Initialize with the embedded machines if not already initialized
        let _ = Self::load();

        MACHINES
            .read()
            .map(|machines| machines.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_else(|_| Vec::new())
    }

    /// Get information about a machine by its name
    pub fn info(name: &str) -> Result<MachineInfo, MachineError> {
        let table = Self::get(name)?;

        Ok(MachineInfo {
            name: name.to_string(),
            states: table.states(),
            symbols: table.symbols(),
            notation: table.to_string(),
        })
    }

    /// Get the notation text of a machine by its name
    pub fn notation(name: &str) -> Result<&'static str, MachineError> {
        MACHINE_TEXTS
            .iter()
            .find(|(machine_name, _)| *machine_name == name)
            .map(|(_, text)| *text)
            .ok_or_else(|| MachineError::ValidationError(format!("Machine '{}' not found", name)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MachineInfo {
    pub name: String,
    pub states: usize,
    pub symbols: usize,
    pub notation: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::machine::{Machine, MachineConfig};
    use crate::types::Outcome;

    #[test]
    fn test_catalog_initialization() {
        let result = MachineCatalog::load();
        assert!(result.is_ok());

        // Every embedded text parses.
        assert_eq!(MachineCatalog::count(), MACHINE_TEXTS.len());
    }

    #[test]
    fn test_all_machines_are_valid() {
        let count = MachineCatalog::count();
        for i in 0..count {
            let table = MachineCatalog::get_by_index(i).unwrap();
            assert!(analyze(&table).is_ok(), "Machine {} is invalid", i);
        }
    }

    #[test]
    fn test_machine_names() {
        let names = MachineCatalog::names();
        assert!(names.contains(&"bb2".to_string()));
        assert!(names.contains(&"bb5".to_string()));
        assert!(names.contains(&"counter".to_string()));
        assert!(names.contains(&"xmas-tree".to_string()));
    }

    #[test]
    fn test_catalog_lookup() {
        assert!(MachineCatalog::get("bb2").is_ok());
        assert!(MachineCatalog::get("nonexistent").is_err());

        assert!(MachineCatalog::get_by_index(0).is_ok());
        assert!(MachineCatalog::get_by_index(999).is_err());
    }

    #[test]
    fn test_machine_info() {
        let info = MachineCatalog::info("bb3-shift").unwrap();
        assert_eq!(info.name, "bb3-shift");
        assert_eq!(info.states, 3);
        assert_eq!(info.symbols, 2);
        assert_eq!(info.notation, "1RB 1RH  1LB 0RC  1LC 1LA");

        assert!(MachineCatalog::info("nonexistent").is_err());
    }

    #[test]
    fn test_machine_notation() {
        assert_eq!(MachineCatalog::notation("bb2").unwrap(), "1RB 1LB  1LA 1RH");
        assert!(MachineCatalog::notation("nonexistent").is_err());
    }

    #[test]
    fn test_champion_runs_to_its_record() {
        let table = MachineCatalog::get("bb2").unwrap();
        let mut machine = Machine::new(MachineConfig::default()).unwrap();
        let outcome = machine.run(&table).unwrap();
        assert_eq!(outcome, Outcome::Halted { steps: 6, marks: 4 });
    }

    #[test]
    fn test_all_machines_execute() {
        // Every catalog machine runs to some outcome without a machine error,
        // halting detection aside.
        let count = MachineCatalog::count();
        for i in 0..count {
            let table = MachineCatalog::get_by_index(i).unwrap();
            let mut machine = Machine::new(MachineConfig::default()).unwrap();
            let result = machine.run(&table);
            assert!(result.is_ok(), "Machine {} failed: {:?}", i, result);
        }
    }
}
