//! Shared configuration loading for the scheduler and filesystem simulators.
//!
//! Loading hierarchy: environment variables override the TOML config file,
//! which overrides built-in defaults.

mod env;
mod error;
mod schema;

pub use env::{apply_filesystem_env_overrides, apply_scheduler_env_overrides};
pub use error::{ConfigError, Result};
pub use schema::{Config, FilesystemSection, SchedulerSection};

use std::path::PathBuf;

/// Returns `~/.config/<app_name>/config.toml`.
pub fn config_file_path(app_name: &str) -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| ConfigError::NoHomeDir)?;
    let mut path = PathBuf::from(home);
    path.push(".config");
    path.push(app_name);
    path.push("config.toml");
    Ok(path)
}

fn load_from_file(path: &PathBuf) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Loads configuration for `app_name`, applying `file-then-env` precedence.
/// Missing config files fall back to defaults silently; only a malformed
/// file that does exist is an error.
pub fn load_config(app_name: &str) -> Result<Config> {
    let mut config = match config_file_path(app_name) {
        Ok(path) if path.exists() => load_from_file(&path)?,
        _ => Config::default(),
    };

    apply_scheduler_env_overrides(&mut config.scheduler)?;
    apply_filesystem_env_overrides(&mut config.filesystem)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_file_present() {
        let config = Config::default();
        assert_eq!(config.scheduler.tick_millis, 1000);
        assert_eq!(config.filesystem.block_size, 4_000);
        assert_eq!(config.filesystem.capacity, 100_000_000);
    }

    #[test]
    fn env_overrides_scheduler_section() {
        std::env::set_var("SCHEDSIM_TICK_MILLIS", "25");
        let mut section = SchedulerSection::default();
        apply_scheduler_env_overrides(&mut section).unwrap();
        assert_eq!(section.tick_millis, 25);
        std::env::remove_var("SCHEDSIM_TICK_MILLIS");
    }

    #[test]
    fn invalid_env_override_is_rejected() {
        std::env::set_var("FATFS_BLOCK_SIZE", "not-a-number");
        let mut section = FilesystemSection::default();
        let result = apply_filesystem_env_overrides(&mut section);
        assert!(result.is_err());
        std::env::remove_var("FATFS_BLOCK_SIZE");
    }

    #[test]
    fn file_values_parse_through_toml() {
        let toml_str = r#"
            [scheduler]
            tick_millis = 5
            max_jobs = 50

            [filesystem]
            block_size = 512
            capacity = 1048576
            fill_byte = 0
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scheduler.tick_millis, 5);
        assert_eq!(config.filesystem.block_size, 512);
    }
}
