use serde::{Deserialize, Serialize};

/// Tunables for the CPU scheduler simulator.
///
/// None of these change scheduling semantics; they only affect pacing and
/// the job-table capacity, so tests can shrink `tick_millis` without
/// touching the scheduler loop itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerSection {
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_max_jobs() -> usize {
    1000
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            max_jobs: default_max_jobs(),
        }
    }
}

/// Tunables for the FAT-style filesystem engine's block layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilesystemSection {
    #[serde(default = "default_block_size")]
    pub block_size: u64,
    #[serde(default = "default_capacity")]
    pub capacity: u64,
    #[serde(default = "default_fill_byte")]
    pub fill_byte: u8,
}

fn default_block_size() -> u64 {
    4_000
}

fn default_capacity() -> u64 {
    100_000_000
}

fn default_fill_byte() -> u8 {
    0xFF
}

impl Default for FilesystemSection {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            capacity: default_capacity(),
            fill_byte: default_fill_byte(),
        }
    }
}

/// Root configuration shared by both simulators. Each binary only reads
/// the section it cares about; the other section's defaults are harmless.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub filesystem: FilesystemSection,
}
