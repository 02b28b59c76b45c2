use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::FieldexConfig,
};

/// Config file name, looked up in the working directory then the user
/// config directory.
const CONFIG_FILENAME: &str = "fieldex.toml";

/// Environment variable holding the bot token.
pub const TOKEN_ENV: &str = "BOT_TOKEN";

/// Load config from an explicit path.
pub fn load_config(path: &Path) -> Result<FieldexConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    toml::from_str(&raw).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./fieldex.toml`
/// 2. `~/.config/fieldex/fieldex.toml`
///
/// Returns `FieldexConfig::default()` if no file is found or the file
/// cannot be loaded; the token can still come from the environment.
pub fn discover_and_load() -> FieldexConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    FieldexConfig::default()
}

/// Find the first existing config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }
    config_dir()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .filter(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/fieldex/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "fieldex").map(|d| d.config_dir().to_path_buf())
}
