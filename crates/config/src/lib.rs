//! Configuration loading, validation, and env substitution.
//!
//! Config file: `fieldex.toml`, searched in `./` then `~/.config/fieldex/`,
//! or passed explicitly. Supports `${ENV_VAR}` substitution in the raw file.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{TOKEN_ENV, config_dir, discover_and_load, find_config_file, load_config},
    schema::{DefaultsConfig, FieldexConfig, FilesConfig, TelegramConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
