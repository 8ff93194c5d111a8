//! The command registry: which bare names are process invocations.
//!
//! A name is a command when an executable of that name is on `PATH` (or it
//! is listed in `[registry].extra`) and it is not a host keyword or builtin.
//! Runtime builtins (`cd`, `pushd`, ...) are commands too, but compile to
//! in-process calls. The set only shrinks after construction: the `unbind`
//! directive and shadowing assignments discard names.

/// Leading `unbind` directive handling.
pub mod directive;
/// Executable discovery on `PATH`.
pub mod path;

use std::collections::BTreeSet;
use std::ffi::OsStr;

use log::debug;

use crate::config::{Config, RegistryConfig};

/// Registered command names. Cheap to clone; each compilation works on its
/// own copy so discards never leak between compilations.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeSet<String>,
    builtins: BTreeSet<String>,
}

impl CommandRegistry {
    /// Build the registry from the process `PATH` and configuration.
    pub fn from_config(config: &Config) -> Self {
        let path = std::env::var_os("PATH").unwrap_or_default();
        Self::from_path(&path, &config.registry)
    }

    /// Build the registry from an explicit `PATH` value.
    pub fn from_path(path: &OsStr, config: &RegistryConfig) -> Self {
        let mut commands = path::executables(path);
        commands.extend(config.extra.iter().cloned());
        for name in config.reserved.iter().chain(&config.exclude) {
            commands.remove(name);
        }
        let builtins: BTreeSet<String> = config
            .builtins
            .iter()
            .filter(|b| !config.reserved.contains(b))
            .cloned()
            .collect();
        debug!(
            "registry: {} commands, {} builtins",
            commands.len(),
            builtins.len()
        );
        Self { commands, builtins }
    }

    /// Registry with a fixed set of names, independent of the environment.
    pub fn from_names<C, B>(commands: C, builtins: B) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            builtins: builtins.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `name` starts a command (external or builtin).
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains(name) || self.builtins.contains(name)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains(name)
    }

    /// Stop treating `name` as a command. Returns whether it was registered.
    pub fn discard(&mut self, name: &str) -> bool {
        let removed = self.commands.remove(name) | self.builtins.remove(name);
        if removed {
            debug!("registry: discarded {name}");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.commands.len() + self.builtins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.builtins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_config() -> RegistryConfig {
        RegistryConfig {
            reserved: vec!["print".into(), "type".into()],
            exclude: vec!["python3".into()],
            extra: vec!["mytool".into(), "type".into()],
            builtins: vec!["cd".into()],
        }
    }

    #[test]
    fn from_names_membership() {
        let reg = CommandRegistry::from_names(["ls", "grep"], ["cd"]);
        assert!(reg.contains("ls"));
        assert!(reg.contains("cd"));
        assert!(reg.is_builtin("cd"));
        assert!(!reg.is_builtin("ls"));
        assert!(!reg.contains("print"));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn discard_shrinks() {
        let mut reg = CommandRegistry::from_names(["ls"], ["cd"]);
        assert!(reg.discard("ls"));
        assert!(!reg.discard("ls"));
        assert!(reg.discard("cd"));
        assert!(reg.is_empty());
    }

    #[test]
    fn clones_are_independent() {
        let base = CommandRegistry::from_names(["ls"], Vec::<String>::new());
        let mut copy = base.clone();
        copy.discard("ls");
        assert!(base.contains("ls"));
    }

    #[test]
    fn empty_path_keeps_extra_minus_reserved() {
        let reg = CommandRegistry::from_path(OsStr::new(""), &registry_config());
        assert!(reg.contains("mytool"));
        assert!(!reg.contains("type"));
        assert!(reg.is_builtin("cd"));
    }

    #[cfg(unix)]
    #[test]
    fn path_entries_filtered() {
        let dir = path::tests::scratch_dir("registry");
        path::tests::touch(&dir, "python3", 0o755);
        path::tests::touch(&dir, "print", 0o755);
        path::tests::touch(&dir, "rg", 0o755);
        let reg = CommandRegistry::from_path(dir.as_os_str(), &registry_config());
        assert!(reg.contains("rg"));
        assert!(!reg.contains("python3"));
        assert!(!reg.contains("print"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
