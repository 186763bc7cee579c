// Environment-variable overrides, applied after the TOML file is loaded so
// the precedence is always env > file > defaults.

use crate::error::{ConfigError, Result};
use crate::schema::{FilesystemSection, SchedulerSection};

fn parse_override<T: std::str::FromStr>(key: &str, value: String) -> Result<T> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { key: key.to_string(), value })
}

/// Applies `SCHEDSIM_TICK_MILLIS` and `SCHEDSIM_MAX_JOBS`, if present.
pub fn apply_scheduler_env_overrides(section: &mut SchedulerSection) -> Result<()> {
    if let Ok(value) = std::env::var("SCHEDSIM_TICK_MILLIS") {
        section.tick_millis = parse_override("SCHEDSIM_TICK_MILLIS", value)?;
    }
    if let Ok(value) = std::env::var("SCHEDSIM_MAX_JOBS") {
        section.max_jobs = parse_override("SCHEDSIM_MAX_JOBS", value)?;
    }
    Ok(())
}

/// Applies `FATFS_BLOCK_SIZE`, `FATFS_CAPACITY`, and `FATFS_FILL_BYTE`, if present.
pub fn apply_filesystem_env_overrides(section: &mut FilesystemSection) -> Result<()> {
    if let Ok(value) = std::env::var("FATFS_BLOCK_SIZE") {
        section.block_size = parse_override("FATFS_BLOCK_SIZE", value)?;
    }
    if let Ok(value) = std::env::var("FATFS_CAPACITY") {
        section.capacity = parse_override("FATFS_CAPACITY", value)?;
    }
    if let Ok(value) = std::env::var("FATFS_FILL_BYTE") {
        section.fill_byte = parse_override("FATFS_FILL_BYTE", value)?;
    }
    Ok(())
}
