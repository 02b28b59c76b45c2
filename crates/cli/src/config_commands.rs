use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result},
    fieldex_config::{FieldexConfig, Severity, ValidationResult, validate},
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// A config resolved from the command line, a discovered file, or defaults.
pub struct LoadedConfig {
    /// File the config was read from, if any.
    pub path: Option<PathBuf>,
    pub config: FieldexConfig,
}

/// Resolve the effective configuration.
///
/// An explicit `--config` path must load; a discovered file that fails to
/// parse falls back to defaults with a warning. A token given on the command
/// line or in the environment replaces the file's.
pub fn resolve(explicit: Option<&Path>, token: Option<String>) -> Result<LoadedConfig> {
    let (path, mut config) = match explicit {
        Some(path) => {
            let config = fieldex_config::load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            (Some(path.to_path_buf()), config)
        },
        None => (
            fieldex_config::find_config_file(),
            fieldex_config::discover_and_load(),
        ),
    };
    config.apply_token_override(token);
    Ok(LoadedConfig { path, config })
}

/// `fieldex check`: report diagnostics for the resolved config.
///
/// Exits with status 1 when any error is found.
pub fn check(loaded: &LoadedConfig) -> Result<()> {
    match &loaded.path {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    let result = validate(&loaded.config);
    print_diagnostics(&result);

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_diagnostics(result: &ValidationResult) {
    for d in &result.diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
    }

    let errors = result.errors().count();
    let warnings = result.warnings().count();
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("\n{errors} error(s), {warnings} warning(s)");
    }
}
