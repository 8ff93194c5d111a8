//! Handing a compiled program to the host interpreter.

use std::ffi::OsString;
use std::process::Command;

use log::debug;

use crate::config::RuntimeConfig;
use crate::error::ExecError;

/// Run `program` as `INTERPRETER -c PROGRAM ARGS...` and wait for it.
/// The child inherits stdin, stdout and stderr.
pub fn run_program(program: &str, runtime: &RuntimeConfig, args: &[OsString]) -> Result<(), ExecError> {
    debug!("exec {} -c <{} bytes> {:?}", runtime.interpreter, program.len(), args);
    let status = Command::new(&runtime.interpreter)
        .arg("-c")
        .arg(program)
        .args(args)
        .status()
        .map_err(|source| ExecError::Spawn {
            interpreter: runtime.interpreter.clone(),
            source,
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(ExecError::Failed {
            status: status.code(),
        })
    }
}
