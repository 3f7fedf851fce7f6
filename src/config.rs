use std::time::Duration;

use thiserror::Error;

use crate::models::Sender;

/// Application-level constants
pub const APP_NAME: &str = "MediCare+";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Length of one time unit in milliseconds (one real-time second).
pub const DEFAULT_TIME_UNIT_MS: u64 = 1_000;

/// Simulated connection delay, in time units.
pub const DEFAULT_CONNECT_DELAY_UNITS: u32 = 2;

/// Remote party shown in the consultation room.
pub const DEFAULT_REMOTE_PARTY: &str = "Dr. Sarah Johnson";

pub const ENV_TIME_UNIT_MS: &str = "MEDICARE_TIME_UNIT_MS";
pub const ENV_CONNECT_DELAY_UNITS: &str = "MEDICARE_CONNECT_DELAY_UNITS";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,medicare_core=debug"
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

/// Timing and identity of a consultation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallConfig {
    /// One tick of the elapsed-time counter.
    pub time_unit: Duration,
    pub connect_delay_units: u32,
    pub remote_party: String,
    /// Messages already in the log when a session opens. Empty by default.
    pub opening_exchange: Vec<(Sender, String)>,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            time_unit: Duration::from_millis(DEFAULT_TIME_UNIT_MS),
            connect_delay_units: DEFAULT_CONNECT_DELAY_UNITS,
            remote_party: DEFAULT_REMOTE_PARTY.to_string(),
            opening_exchange: Vec::new(),
        }
    }
}

impl CallConfig {
    /// Defaults overridden by `MEDICARE_TIME_UNIT_MS` / `MEDICARE_CONNECT_DELAY_UNITS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TIME_UNIT_MS) {
            let ms = parse_positive(ENV_TIME_UNIT_MS, &raw)?;
            config.time_unit = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup(ENV_CONNECT_DELAY_UNITS) {
            let units = parse_positive(ENV_CONNECT_DELAY_UNITS, &raw)?;
            config.connect_delay_units =
                u32::try_from(units).map_err(|_| ConfigError::InvalidValue {
                    var: ENV_CONNECT_DELAY_UNITS,
                    value: raw.clone(),
                })?;
        }

        Ok(config)
    }

    /// Seed each session's chat log with a greeting from the remote party
    /// and the patient's reply.
    pub fn with_opening_exchange(mut self, greeting: &str, reply: &str) -> Self {
        self.opening_exchange = vec![
            (Sender::Remote(self.remote_party.clone()), greeting.to_string()),
            (Sender::Me, reply.to_string()),
        ];
        self
    }

    /// Delay between session creation and the connected state.
    pub fn connect_delay(&self) -> Duration {
        self.time_unit * self.connect_delay_units
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let value: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
    })?;
    if value == 0 {
        return Err(ConfigError::Zero { var });
    }
    Ok(value)
}
