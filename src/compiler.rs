//! Compilation pipeline: directive strip, scan, rewrite, emit, infix pass,
//! preamble.

use std::path::Path;

use log::{debug, info};

use crate::commands::{CommandRegistry, directive};
use crate::config::Config;
use crate::emit;
use crate::error::CompileError;
use crate::rewrite::{self, regex::RegexTable};
use crate::scan::{self, literal};

/// Names the preamble imports from the runtime module.
pub const RUNTIME_NAMES: &[&str] = &[
    "run",
    "grab",
    "Pipe",
    "GrabPipe",
    "builtin",
    "env",
    "globarg",
    "obj2args",
    "GlobError",
    "Matcher",
    "Substituter",
    "Splitter",
    "CalledProcessError",
    "PIPE",
    "STDOUT",
    "DEVNULL",
];

/// Compiles scripts against a registry captured once at construction, so
/// every compilation sees the same commands.
pub struct Compiler {
    registry: CommandRegistry,
    module: String,
}

/// A successful compilation.
#[derive(Debug)]
pub struct Compiled {
    code: String,
    regexen: RegexTable,
    module: String,
}

impl Compiler {
    /// Compiler using the commands found on the current `PATH`.
    pub fn new(config: &Config) -> Self {
        Self::with_registry(config, CommandRegistry::from_config(config))
    }

    pub fn with_registry(config: &Config, registry: CommandRegistry) -> Self {
        Self {
            registry,
            module: config.runtime.module.clone(),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn compile(&self, source: &str) -> Result<Compiled, CompileError> {
        let stripped = directive::strip_unbind(source);
        let mut registry = self.registry.clone();
        for name in &stripped.names {
            debug!("unbind {name}");
            registry.discard(name);
        }

        let tokens = scan::scan(&stripped.source)?;
        let rewritten = rewrite::rewrite(&stripped.source, tokens, &mut registry)?;
        let text = emit::emit(&rewritten.tokens)?;
        let code = rewrite::regex::apply_infix(&text, &rewritten.tokens)?;
        info!(
            "compiled {} bytes, {} regex literal(s)",
            code.len(),
            rewritten.regexen.len()
        );

        Ok(Compiled {
            code,
            regexen: rewritten.regexen,
            module: self.module.clone(),
        })
    }

    pub fn compile_file(&self, path: &Path) -> Result<Compiled, CompileError> {
        let source = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.compile(&source)
    }
}

impl Compiled {
    /// The rewritten script, without the preamble.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn regexen(&self) -> &RegexTable {
        &self.regexen
    }

    /// Imports and regex table that the code relies on.
    pub fn preamble(&self) -> String {
        let mut out = format!(
            "from {} import ({})\nimport re as _re\nimport sys as _sys\nARGV = _sys.argv[1:]\n",
            self.module,
            RUNTIME_NAMES.join(", ")
        );
        if self.regexen.is_empty() {
            out.push_str("_regexen = []\n");
        } else {
            out.push_str("_regexen = [\n");
            for entry in self.regexen.iter() {
                match entry {
                    Some(e) => {
                        out.push_str(&format!("    _re.compile({}),\n", literal::quote(e.pattern())))
                    }
                    None => out.push_str("    None,\n"),
                }
            }
            out.push_str("]\n");
        }
        out
    }

    /// The complete program handed to the interpreter.
    pub fn program(&self) -> String {
        format!("{}{}", self.preamble(), self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiler() -> Compiler {
        let config = Config::default_config();
        Compiler::with_registry(&config, CommandRegistry::from_names(["ls"], ["cd"]))
    }

    #[test]
    fn preamble_imports_runtime() {
        let compiled = compiler().compile("ls\n").unwrap();
        let preamble = compiled.preamble();
        assert!(preamble.starts_with("from shellweave_runtime import (run, grab, Pipe,"));
        assert!(preamble.contains("ARGV = _sys.argv[1:]\n"));
        assert!(preamble.ends_with("_regexen = []\n"));
        assert!(compiled.program().ends_with("run(['ls'])\n"));
    }

    #[test]
    fn preamble_lists_regexen() {
        let compiled = compiler().compile("a = m/'x'/i\nb = m/'y\\\\d'/\n").unwrap();
        let preamble = compiled.preamble();
        assert!(preamble.contains("_regexen = [\n    _re.compile('(?i)x'),\n    _re.compile('y\\\\d'),\n]\n"));
    }

    #[test]
    fn compile_does_not_leak_discards() {
        let c = compiler();
        c.compile("unbind ls\nls = 1\n").unwrap();
        assert!(c.registry().contains("ls"));
        assert_eq!(c.compile("ls\n").unwrap().code(), "run(['ls'])\n");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = compiler()
            .compile_file(Path::new("/nonexistent/script.sw"))
            .unwrap_err();
        assert!(matches!(err, CompileError::Io { .. }));
    }

    #[test]
    fn infix_applied() {
        let compiled = compiler().compile("x =~ s/'a'/'b'/\n").unwrap();
        assert_eq!(
            compiled.code(),
            "x = Substituter.apply(x, _regexen[0], 'b', 1)\n"
        );
    }
}
