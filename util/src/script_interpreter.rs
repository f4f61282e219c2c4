//! # Command script interpreter module
//!
//! This module provides an interpreter for timed command scripts. A script is
//! a text file in which each command is written as
//!
//! ```text
//! <exec time in seconds>: <json payload>;
//! ```
//!
//! The JSON payload is deserialised into the command type chosen by the user
//! of the interpreter. Anything outside of that pattern (e.g. comments) is
//! ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
#[derive(Debug)]
struct Command<T> {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The command to run
    cmd: T,
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending` to
/// acquire a list of commands that need executing.
#[derive(Debug)]
pub struct ScriptInterpreter<T> {
    script_path: PathBuf,
    cmds: VecDeque<Command<T>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid timestamp: {0}. Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCommand(f64, serde_json::Error),

    #[error("Script commands are not in time order ({0} s follows {1} s)")]
    OutOfOrder(f64, f64),

    #[error("Internal regex error: {0}")]
    RegexError(regex::Error),
}

/// Commands which are pending execution.
#[derive(Debug, PartialEq)]
pub enum Pending<T> {
    None,
    Some(Vec<T>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T: DeserializeOwned> ScriptInterpreter<T> {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        let mut interp = Self::from_str(&script)?;
        interp.script_path = path;

        Ok(interp)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {
        // Empty queue of commands
        let mut queue: VecDeque<Command<T>> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .map_err(ScriptError::RegexError)?;

        for cap in re.captures_iter(script) {
            let (time_str, payload) = match (cap.get(1), cap.get(3)) {
                (Some(t), Some(p)) => (t.as_str(), p.as_str()),
                _ => continue,
            };

            // Parse the exec time
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            if let Some(last) = queue.back() {
                if exec_time_s < last.exec_time_s {
                    return Err(ScriptError::OutOfOrder(exec_time_s, last.exec_time_s));
                }
            }

            // Parse the command from the payload. The scripts contain JSON only.
            let cmd = serde_json::from_str(payload)
                .map_err(|e| ScriptError::InvalidCommand(exec_time_s, e))?;

            queue.push_back(Command { exec_time_s, cmd });
        }

        if queue.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter {
            script_path: PathBuf::new(),
            cmds: queue,
        })
    }
}

impl<T> ScriptInterpreter<T> {
    /// Return all commands whose exec time is at or before `now_s`.
    pub fn get_pending(&mut self, now_s: f64) -> Pending<T> {
        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return Pending::EndOfScript;
        }

        let mut cmds = vec![];

        while let Some(front) = self.cmds.front() {
            if front.exec_time_s > now_s {
                break;
            }
            if let Some(c) = self.cmds.pop_front() {
                cmds.push(c.cmd);
            }
        }

        if cmds.is_empty() {
            Pending::None
        } else {
            Pending::Some(cmds)
        }
    }

    /// Get the number of commands left in the script
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        self.cmds.back().map(|c| c.exec_time_s).unwrap_or(0.0)
    }

    /// Path the script was loaded from (empty if loaded from a string).
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    enum Cmd {
        Go { dist: f64 },
        Halt,
    }

    #[test]
    fn test_pending() {
        let script = "\
            # start moving\n\
            0.0: {\"Go\": {\"dist\": 2.0}};\n\
            1.5: \"Halt\";\n\
            1.5: {\"Go\": {\"dist\": 1.0}};\n";

        let mut si: ScriptInterpreter<Cmd> = ScriptInterpreter::from_str(script).unwrap();
        assert_eq!(si.get_num_cmds(), 3);
        assert_eq!(si.get_duration(), 1.5);

        assert_eq!(si.get_pending(0.0), Pending::Some(vec![Cmd::Go { dist: 2.0 }]));
        assert_eq!(si.get_pending(1.0), Pending::None);
        assert_eq!(
            si.get_pending(2.0),
            Pending::Some(vec![Cmd::Halt, Cmd::Go { dist: 1.0 }])
        );
        assert_eq!(si.get_pending(3.0), Pending::EndOfScript);
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            ScriptInterpreter::<Cmd>::from_str("nothing here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::<Cmd>::from_str("1.0: {\"Fly\": 1};"),
            Err(ScriptError::InvalidCommand(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::<Cmd>::from_str("2.0: \"Halt\";\n1.0: \"Halt\";"),
            Err(ScriptError::OutOfOrder(_, _))
        ));
    }
}
