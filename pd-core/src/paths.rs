//! Where prodev keeps its files.
//!
//! `PRODEV_HOME` overrides both locations; otherwise the platform's data and
//! config directories are used (`~/.local/share/prodev`,
//! `~/.config/prodev` on Linux).

use std::path::PathBuf;

use crate::constants::APP_NAME;
use crate::error::{PdError, PdResult};

/// Environment variable that relocates every prodev directory.
pub const HOME_ENV: &str = "PRODEV_HOME";

fn home_override() -> Option<PathBuf> {
    std::env::var_os(HOME_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Directory for databases and logs.
pub fn data_dir() -> PdResult<PathBuf> {
    if let Some(home) = home_override() {
        return Ok(home.join("data"));
    }
    dirs::data_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or_else(|| PdError::Config("could not determine data directory".into()))
}

/// Directory holding `config.toml`.
pub fn config_dir() -> PdResult<PathBuf> {
    if let Some(home) = home_override() {
        return Ok(home);
    }
    dirs::config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or_else(|| PdError::Config("could not determine config directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_end_with_app_name_or_override() {
        let data = data_dir().unwrap();
        let config = config_dir().unwrap();
        match home_override() {
            Some(home) => {
                assert_eq!(config, home);
                assert_eq!(data, home.join("data"));
            }
            None => {
                assert!(data.ends_with(APP_NAME));
                assert!(config.ends_with(APP_NAME));
            }
        }
    }
}
