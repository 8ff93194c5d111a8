//! Error taxonomy for compilation and execution.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal compiler-stage failures. A compilation either fully succeeds or
/// aborts with one of these; there is no partial output.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Malformed source: unterminated string or bracket, bad indentation,
    /// or an unterminated / invalid regex literal.
    #[error("line {line}: {message}")]
    Tokenize { line: usize, message: String },

    /// The rewritten token stream does not serialize into valid text.
    /// `tokens` holds the rewritten stream as JSON.
    #[error("emission failed: {message}")]
    Emission { message: String, tokens: String },

    /// The script could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    pub fn tokenize(line: usize, message: impl Into<String>) -> Self {
        CompileError::Tokenize {
            line,
            message: message.into(),
        }
    }

    /// Dump of the rewritten token stream, for emission failures.
    pub fn token_dump(&self) -> Option<&str> {
        match self {
            CompileError::Emission { tokens, .. } => Some(tokens),
            _ => None,
        }
    }
}

/// Failures handing the generated program to the host interpreter.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("cannot start {interpreter}: {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully. `None` means killed by a signal.
    #[error("program exited with {}", describe_status(.status))]
    Failed { status: Option<i32> },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl ExecError {
    /// Process exit code to report for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::Spawn { .. } => 127,
            ExecError::Failed { status } => status.unwrap_or(1),
        }
    }
}
