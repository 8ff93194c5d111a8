//! shellweave: compile a script with bare command lines to Python and run it.
//!
//! Prints the generated program (unless disabled in the config), then runs
//! it with the configured interpreter. Arguments after the script path are
//! passed to the program as `ARGV`.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use shellweave::config::Config;
use shellweave::{Compiler, exec, logging};

#[derive(Debug, Parser)]
#[command(
    name = "shellweave",
    version,
    about = "Run a Python script that contains bare shell command lines."
)]
struct Args {
    /// Script to compile and run.
    script: PathBuf,
    /// Arguments passed to the script.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<OsString>,
}

/// Compile `script`, print the program if configured, and run it. Returns
/// the process exit status. Diagnostics go to `err`.
fn run_script(
    compiler: &Compiler,
    config: &Config,
    script: &Path,
    args: &[OsString],
    out: &mut impl Write,
    err: &mut impl Write,
) -> u8 {
    let compiled = match compiler.compile_file(script) {
        Ok(c) => c,
        Err(e) => {
            let _ = writeln!(err, "shellweave: {}: {e}", script.display());
            if let Some(dump) = e.token_dump() {
                let _ = writeln!(err, "{dump}");
            }
            return 1;
        }
    };

    let program = compiled.program();
    if config.settings.print_source {
        let _ = writeln!(out, "{program}");
        let _ = out.flush();
    }

    match exec::run_program(&program, &config.runtime, args) {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(err, "shellweave: {e}");
            let _ = writeln!(err, "--- generated program ---\n{program}");
            u8::try_from(e.exit_code()).unwrap_or(1)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = Config::load();
    logging::init(&config.settings);

    let compiler = Compiler::new(&config);
    let status = run_script(
        &compiler,
        &config,
        &args.script,
        &args.args,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    );
    ExitCode::from(status)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use shellweave::commands::CommandRegistry;

    fn config(interpreter: &str, print_source: bool) -> Config {
        let mut config = Config::default_config();
        config.runtime.interpreter = interpreter.into();
        config.settings.print_source = print_source;
        config
    }

    fn script(name: &str, source: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "shellweave-main-{}-{name}.py",
            std::process::id()
        ));
        std::fs::write(&path, source).unwrap();
        path
    }

    /// Run with `ls` registered; returns (status, stdout, stderr).
    fn run_with(config: &Config, path: &Path) -> (u8, String, String) {
        let compiler = Compiler::with_registry(config, CommandRegistry::from_names(["ls"], ["cd"]));
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let status = run_script(&compiler, config, path, &[], &mut out, &mut err);
        (
            status,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn prints_program_before_running() {
        let path = script("print", "ls -l\n");
        let (status, out, err) = run_with(&config("true", true), &path);
        assert_eq!(status, 0);
        assert!(out.starts_with("from shellweave_runtime import ("));
        assert!(out.contains("run(['ls', '-l'])\n"));
        assert!(err.is_empty());
    }

    #[test]
    fn print_source_disabled() {
        let path = script("quiet", "ls\n");
        let (status, out, _) = run_with(&config("true", false), &path);
        assert_eq!(status, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn compile_error_reported() {
        let path = script("broken", "x = (1,\n");
        let (status, out, err) = run_with(&config("true", true), &path);
        assert_eq!(status, 1);
        assert!(out.is_empty());
        assert!(err.contains("never closed"));
    }

    #[test]
    fn missing_script_reported() {
        let (status, _, err) = run_with(&config("true", true), Path::new("/nonexistent/s.py"));
        assert_eq!(status, 1);
        assert!(err.contains("cannot read"));
    }

    #[test]
    fn failure_dumps_program_and_keeps_status() {
        let path = script("fails", "ls\n");
        let (status, _, err) = run_with(&config("false", false), &path);
        assert_eq!(status, 1);
        assert!(err.contains("program exited with status 1"));
        assert!(err.contains("--- generated program ---\n"));
        assert!(err.contains("run(['ls'])"));
    }

    #[test]
    fn missing_interpreter_exits_127() {
        let path = script("nointerp", "ls\n");
        let (status, _, err) = run_with(&config("/nonexistent/python", false), &path);
        assert_eq!(status, 127);
        assert!(err.contains("cannot start /nonexistent/python"));
    }
}
