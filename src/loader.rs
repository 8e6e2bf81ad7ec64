//! This module provides the `ProgramLoader` struct, responsible for loading
//! machine programs from files. A program file holds one notation per line;
//! blank lines and lines starting with `#` are skipped.

use crate::parser::parse;
use crate::types::{MachineError, TransitionTable};
use std::fs;
use std::path::{Path, PathBuf};

/// `ProgramLoader` is a utility struct for loading machine programs.
/// It provides methods to load a single program or a whole list from a file,
/// and to discover and load all program files with a chosen extension within
/// a specified directory.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads the first program from the specified file path.
    ///
    /// # Arguments
    ///
    /// * `path` - A reference to the `Path` of the program file to load.
    ///
    /// # Returns
    ///
    /// * `Ok(TransitionTable)` if a program line is found and parsed.
    /// * `Err(MachineError::FileError)` if the file cannot be read or holds
    ///   no program line.
    /// * `Err(MachineError::ParseError)` if the line is not valid notation.
    pub fn load_table(path: &Path) -> Result<TransitionTable, MachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        let line = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .ok_or_else(|| {
                MachineError::FileError(format!("File {} contains no program", path.display()))
            })?;

        parse(line)
    }

    /// Loads every program from the specified file path, one per line.
    ///
    /// # Arguments
    ///
    /// * `path` - A reference to the `Path` of the program file to load.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<TransitionTable>)` holding one table per program line.
    /// * `Err(MachineError::FileError)` if the file cannot be read or any
    ///   line fails to parse; the error names the offending line.
    pub fn load_tables(path: &Path) -> Result<Vec<TransitionTable>, MachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        let mut tables = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let table = parse(line).map_err(|e| {
                MachineError::FileError(format!(
                    "Failed to parse {} line {}: {}",
                    path.display(),
                    number + 1,
                    e
                ))
            })?;
            tables.push(table);
        }

        Ok(tables)
    }

    /// Loads all program files with the given extension from a directory.
    ///
    /// It iterates through the directory, attempts to load each matching
    /// file, and collects the results. Directories and files with other
    /// extensions are skipped.
    ///
    /// # Arguments
    ///
    /// * `directory` - A reference to the `Path` of the directory to scan.
    /// * `extension` - The file extension to match, without the dot.
    ///
    /// # Returns
    ///
    /// * `Vec<Result<(PathBuf, Vec<TransitionTable>), MachineError>>` - A
    ///   vector where each element is a `Result` indicating whether a file
    ///   was successfully loaded (containing its path and the tables it
    ///   holds) or if an error occurred during loading.
    pub fn load_programs(
        directory: &Path,
        extension: &str,
    ) -> Vec<Result<(PathBuf, Vec<TransitionTable>), MachineError>> {
        if !directory.exists() {
            return vec![Err(MachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(MachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(MachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                // Skip directories and files with other extensions
                if path.is_dir() || path.extension().is_none_or(|ext| ext != extension) {
                    return None;
                }

                match Self::load_tables(&path) {
                    Ok(tables) => Some(Ok((path, tables))),
                    Err(e) => Some(Err(e)),
                }
            })
            .collect()
    }
}
