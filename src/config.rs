use crate::cli::Cli;
use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::Path;
use tracing::Level;

const TRACE_LEVELS: [&str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

pub static SETTINGS: Lazy<Settings> = Lazy::new(Settings::new);

// Settings are a singleton generated at runtime. All settings may be
// configured via environment variables. Example:
// PORT=9000 would serve the API on port 9000.
#[derive(Deserialize, Debug)]
pub struct Settings {
    #[serde(default = "default_trace_level")]
    trace_level: String,
    #[serde(default = "default_port")]
    pub port: u16,
    // Seeded population size. Values below 10000 are raised to 10000.
    #[serde(default = "default_seed_users")]
    pub seed_users: usize,
    // How many random rating deltas the mutator applies per tick
    #[serde(default = "default_updates_per_tick")]
    pub updates_per_tick: usize,
    // Mutator tick period, in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    // Snapshot publisher period, in milliseconds
    #[serde(default = "default_snapshot_ms")]
    pub snapshot_ms: u64,
}

impl Settings {
    pub fn new() -> Self {
        let local_settings_yaml_file = ".env.local.yaml";
        let settings: Settings = match Path::new(local_settings_yaml_file).exists() {
            true => {
                println!(
                    "\n######################################\n\
                       ##   Found '.env.local.yaml' file,  ##\n\
                       ##   loading local configuration.   ##\n\
                       ######################################\n\
                    "
                );
                Figment::new()
                    .merge(Yaml::file(local_settings_yaml_file))
                    .merge(Env::raw())
                    .merge(Serialized::defaults(Cli::parse()))
                    .extract()
                    .unwrap()
            }
            false => Figment::new()
                .merge(Env::raw())
                .merge(Serialized::defaults(Cli::parse()))
                .extract()
                .unwrap(),
        };

        settings
    }

    pub fn get_trace_level(&self) -> Level {
        get_trace_level(&self.trace_level)
    }
}

fn get_trace_level(level_str: &str) -> Level {
    match level_str {
        level if level == TRACE_LEVELS[0] => Level::TRACE,
        level if level == TRACE_LEVELS[1] => Level::DEBUG,
        level if level == TRACE_LEVELS[2] => Level::INFO,
        level if level == TRACE_LEVELS[3] => Level::WARN,
        level if level == TRACE_LEVELS[4] => Level::ERROR,
        // Default trace level
        _ => Level::INFO,
    }
}

fn default_trace_level() -> String {
    "INFO".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_seed_users() -> usize {
    10000
}

fn default_updates_per_tick() -> usize {
    200
}

fn default_tick_ms() -> u64 {
    200
}

fn default_snapshot_ms() -> u64 {
    1000
}
