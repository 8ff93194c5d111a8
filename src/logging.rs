use std::fs::OpenOptions;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use crate::config::Settings;

/// Environment variable that overrides `[settings].log_level`.
pub const LOG_ENV: &str = "SHELLWEAVE_LOG";

/// Parse a level name; unknown names fall back to `warn`.
pub fn parse_level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(LevelFilter::Warn)
}

/// Install the global logger: stderr at the configured level, plus
/// `~/.local/share/shellweave/compile.log` when `log_file` is set.
/// Best-effort: failures are silently ignored (logging must never block
/// compilation).
pub fn init(settings: &Settings) {
    let level = std::env::var(LOG_ENV)
        .map(|v| parse_level(&v))
        .unwrap_or_else(|_| parse_level(&settings.log_level));
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if settings.log_file
        && let Some(home) = std::env::var_os("HOME")
    {
        let log_dir = std::path::Path::new(&home).join(".local/share/shellweave");
        let _ = std::fs::create_dir_all(&log_dir);
        if let Ok(file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("compile.log"))
        {
            let file_config = ConfigBuilder::new()
                .set_time_format_rfc3339()
                .build();
            loggers.push(WriteLogger::new(LevelFilter::Debug, file_config, file));
        }
    }

    let _ = CombinedLogger::init(loggers);
}
