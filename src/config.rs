//! Runtime Configuration
//!
//! Values come from `SLOT_GATE_*` environment variables with defaults; `--bind` and
//! `--data-dir` on the command line override the environment.

use crate::notify::sender::VapidKeys;
use crate::ratelimit::limiter::RatePolicy;
use crate::schedule::window::WeekCycle;

use chrono::{FixedOffset, Weekday};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const BOARD_FILE: &str = "board_backup.json";
pub const CAPACITY_FILE: &str = "capacity.json";
pub const SUBSCRIPTIONS_FILE: &str = "push_subscriptions.json";

/// Claims and releases: 5 per 10 seconds per caller.
pub const REGISTER_POLICY: RatePolicy = RatePolicy::new(5, Duration::from_secs(10));
/// Notification toggles: 10 per minute per caller.
pub const TOGGLE_POLICY: RatePolicy = RatePolicy::new(10, Duration::from_secs(60));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: String, value: String },
    #[error("missing value after {flag}")]
    MissingArgument { flag: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub cycle: WeekCycle,
    pub save_interval: Duration,
    pub push_queue_capacity: usize,
    pub vapid_public_key: String,
    pub vapid: Option<VapidKeys>,
    pub register_policy: RatePolicy,
    pub toggle_policy: RatePolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_sources(|key| std::env::var(key).ok(), &args)
    }

    /// Builds the config from an environment lookup and command-line arguments.
    pub fn from_sources<F>(lookup: F, args: &[String]) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut bind = parse_or(&var, "SLOT_GATE_BIND", SocketAddr::from(([0, 0, 0, 0], 5000)))?;
        let mut data_dir = var("SLOT_GATE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--bind" => {
                    let value = flag_value(args, i)?;
                    bind = value.parse().map_err(|_| ConfigError::Invalid {
                        key: "--bind".to_string(),
                        value: value.to_string(),
                    })?;
                    i += 2;
                }
                "--data-dir" => {
                    data_dir = PathBuf::from(flag_value(args, i)?);
                    i += 2;
                }
                _ => {
                    i += 1;
                }
            }
        }

        let offset_hours: i32 = parse_or(&var, "SLOT_GATE_UTC_OFFSET_HOURS", 9)?;
        let offset = FixedOffset::east_opt(offset_hours * 3600).ok_or_else(|| invalid(
            "SLOT_GATE_UTC_OFFSET_HOURS",
            &offset_hours.to_string(),
        ))?;
        let weekday = match var("SLOT_GATE_CYCLE_WEEKDAY") {
            Some(v) => v
                .parse::<Weekday>()
                .map_err(|_| invalid("SLOT_GATE_CYCLE_WEEKDAY", &v))?,
            None => Weekday::Sat,
        };
        let hour: u32 = parse_or(&var, "SLOT_GATE_CYCLE_HOUR", 0)?;
        let cycle = WeekCycle::new(weekday, hour, offset)
            .ok_or_else(|| invalid("SLOT_GATE_CYCLE_HOUR", &hour.to_string()))?;

        let save_secs: u64 = parse_or(&var, "SLOT_GATE_SAVE_INTERVAL_SECS", 3)?;
        if save_secs == 0 {
            return Err(invalid("SLOT_GATE_SAVE_INTERVAL_SECS", "0"));
        }
        let push_queue_capacity: usize = parse_or(&var, "SLOT_GATE_PUSH_QUEUE_CAPACITY", 1024)?;

        let vapid = var("VAPID_PRIVATE_KEY").map(|private_key| VapidKeys {
            private_key,
            contact: var("VAPID_EMAIL").unwrap_or_else(|| "admin@localhost".to_string()),
        });

        Ok(Self {
            bind,
            data_dir,
            cycle,
            save_interval: Duration::from_secs(save_secs),
            push_queue_capacity,
            vapid_public_key: var("VAPID_PUBLIC_KEY").unwrap_or_default(),
            vapid,
            register_policy: REGISTER_POLICY,
            toggle_policy: TOGGLE_POLICY,
        })
    }

    pub fn board_path(&self) -> PathBuf {
        self.data_dir.join(BOARD_FILE)
    }

    pub fn capacity_path(&self) -> PathBuf {
        self.data_dir.join(CAPACITY_FILE)
    }

    pub fn subscriptions_path(&self) -> PathBuf {
        self.data_dir.join(SUBSCRIPTIONS_FILE)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn flag_value(args: &[String], i: usize) -> Result<&str, ConfigError> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| ConfigError::MissingArgument {
            flag: args[i].clone(),
        })
}

/// Parses `key` if set, otherwise returns `default`.
fn parse_or<T, V>(var: &V, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value.parse().map_err(|_| invalid(key, &value)),
        None => Ok(default),
    }
}
