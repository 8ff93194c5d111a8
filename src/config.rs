use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Terminal log level (`off`, `error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Also append logs to `~/.local/share/shellweave/compile.log`.
    #[serde(default)]
    pub log_file: bool,
    /// Print the generated program before executing it.
    #[serde(default = "default_true")]
    pub print_source: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: false,
            print_source: true,
        }
    }
}

/// Inputs to the command registry besides PATH itself.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RegistryConfig {
    /// Host keywords and builtins; never commands.
    #[serde(default)]
    pub reserved: Vec<String>,
    /// PATH executables that stay ordinary host names.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Names registered as commands without a PATH lookup.
    #[serde(default)]
    pub extra: Vec<String>,
    /// Commands the runtime implements in-process (`cd`, `pushd`, ...).
    #[serde(default)]
    pub builtins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeConfig {
    /// Module the preamble imports the execution API from.
    #[serde(default = "default_module")]
    pub module: String,
    /// Interpreter that receives the generated program.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
            interpreter: default_interpreter(),
        }
    }
}

fn default_log_level() -> String {
    "warn".into()
}

fn default_true() -> bool {
    true
}

fn default_module() -> String {
    "shellweave_runtime".into()
}

fn default_interpreter() -> String {
    "python3".into()
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    registry: RegistryOverlay,
    #[serde(default)]
    runtime: RuntimeOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    log_level: Option<String>,
    log_file: Option<bool>,
    print_source: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct RegistryOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    reserved: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    extra: Vec<String>,
    #[serde(default)]
    builtins: Vec<String>,
    #[serde(default)]
    remove_reserved: Vec<String>,
    #[serde(default)]
    remove_exclude: Vec<String>,
    #[serde(default)]
    remove_extra: Vec<String>,
    #[serde(default)]
    remove_builtins: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RuntimeOverlay {
    module: Option<String>,
    interpreter: Option<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/shellweave/config.toml (if exists)
    ///
    /// User config merges with defaults: lists extend, scalars override.
    /// Set `replace = true` in `[registry]` to replace its defaults entirely.
    /// Use `remove_<field>` lists to subtract specific items from defaults.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load user overlay from ~/.config/shellweave/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/shellweave/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                // Logging is not up yet: the log level itself lives in this file.
                eprintln!("shellweave: config parse error: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let s = overlay.settings;
        if let Some(v) = s.log_level {
            self.settings.log_level = v;
        }
        if let Some(v) = s.log_file {
            self.settings.log_file = v;
        }
        if let Some(v) = s.print_source {
            self.settings.print_source = v;
        }

        let r = overlay.registry;
        merge_list(
            &mut self.registry.reserved,
            r.reserved,
            &r.remove_reserved,
            r.replace,
        );
        merge_list(
            &mut self.registry.exclude,
            r.exclude,
            &r.remove_exclude,
            r.replace,
        );
        merge_list(&mut self.registry.extra, r.extra, &r.remove_extra, r.replace);
        merge_list(
            &mut self.registry.builtins,
            r.builtins,
            &r.remove_builtins,
            r.replace,
        );

        if let Some(v) = overlay.runtime.module {
            self.runtime.module = v;
        }
        if let Some(v) = overlay.runtime.interpreter {
            self.runtime.interpreter = v;
        }
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
