//! shellweave: a source-to-source compiler for Python scripts with bare
//! command lines.
//!
//! A script may mix ordinary Python with lines such as `ls -l *.py | wc -l`.
//! Those lines are rewritten at the token level into calls on a runtime
//! module (`run`, `grab`, `Pipe`, ...) and the result is plain Python that
//! the interpreter runs directly. No shell is ever involved.
//!
//! # Architecture
//!
//! - **[`scan`]**: Python tokenizer that keeps every byte of whitespace.
//! - **[`commands`]**: command registry built from `PATH`, `unbind` directive.
//! - **[`rewrite`]**: frame-stack rewriter, argument segmenter, regex sugar.
//! - **[`emit`]**: token stream back to text, with consistency checks.
//! - **[`compiler`]**: the whole pipeline plus the runtime preamble.
//! - **[`exec`]**: runs the generated program under the interpreter.
//! - **[`config`]**: embedded defaults + user overlay merge.
//! - **[`logging`]**: `log` facade backed by `simplelog`.

/// Command registry and PATH discovery.
pub mod commands;
/// Compilation pipeline and generated-program assembly.
pub mod compiler;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Token serialization.
pub mod emit;
/// Error types for compilation and execution.
pub mod error;
/// Interpreter hand-off.
pub mod exec;
/// Logger setup.
pub mod logging;
/// Token-stream rewriting.
pub mod rewrite;
/// Python lexical scanner.
pub mod scan;

pub use compiler::{Compiled, Compiler};
pub use error::{CompileError, ExecError};

/// Compile `source` with the default configuration and the current `PATH`.
///
/// This is the main entry point for simple usage. For repeated
/// compilations, build a [`Compiler`] once and reuse it.
pub fn compile(source: &str) -> Result<Compiled, CompileError> {
    let config = config::Config::default_config();
    Compiler::new(&config).compile(source)
}
