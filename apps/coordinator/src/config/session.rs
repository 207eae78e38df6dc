//! Session configuration, loaded from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `UNO_HAND_SIZE` | 7 |
//! | `UNO_TURN_PAUSE_MS` | 2000 |
//! | `UNO_ACK_TIMEOUT_MS` | 10000 |
//! | `UNO_FANOUT_DEADLINE_MS` | 10000 |
//! | `UNO_DEBUG` | false |
//! | `UNO_ACK_TIMEOUT_POLICY` | `proceed` |
//! | `UNO_SEED` | unset (OS entropy) |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::{MAX_HAND_SIZE, MIN_HAND_SIZE};
use crate::error::CoordinatorError;

/// What a barrier does when some replicas never ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckTimeoutPolicy {
    /// Log the missing acks and advance anyway.
    #[default]
    Proceed,
    /// Block the session in its current state until `restart()`.
    Stall,
}

impl FromStr for AckTimeoutPolicy {
    type Err = CoordinatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proceed" => Ok(Self::Proceed),
            "stall" => Ok(Self::Stall),
            other => Err(CoordinatorError::config(format!(
                "UNO_ACK_TIMEOUT_POLICY must be 'proceed' or 'stall', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub hand_size: u8,
    /// Pause between turns. Ignored in debug mode.
    pub turn_pause: Duration,
    pub ack_timeout: Duration,
    /// Deadline for a single outbound push.
    pub fanout_deadline: Duration,
    /// Turns advance only on an explicit `advance()`.
    pub debug_mode: bool,
    pub ack_timeout_policy: AckTimeoutPolicy,
    /// Seed for the shuffle. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hand_size: 7,
            turn_pause: Duration::from_millis(2000),
            ack_timeout: Duration::from_millis(10_000),
            fanout_deadline: Duration::from_millis(10_000),
            debug_mode: false,
            ack_timeout_policy: AckTimeoutPolicy::Proceed,
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by any `UNO_*` variables that are set.
    pub fn from_env() -> Result<Self, CoordinatorError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoordinatorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            hand_size: parse_var(&var, "UNO_HAND_SIZE")?.unwrap_or(defaults.hand_size),
            turn_pause: millis_var(&var, "UNO_TURN_PAUSE_MS")?.unwrap_or(defaults.turn_pause),
            ack_timeout: millis_var(&var, "UNO_ACK_TIMEOUT_MS")?.unwrap_or(defaults.ack_timeout),
            fanout_deadline: millis_var(&var, "UNO_FANOUT_DEADLINE_MS")?
                .unwrap_or(defaults.fanout_deadline),
            debug_mode: bool_var(&var, "UNO_DEBUG")?.unwrap_or(defaults.debug_mode),
            ack_timeout_policy: match var("UNO_ACK_TIMEOUT_POLICY") {
                Some(raw) => raw.parse()?,
                None => defaults.ack_timeout_policy,
            },
            seed: parse_var(&var, "UNO_SEED")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoordinatorError> {
        if !(MIN_HAND_SIZE..=MAX_HAND_SIZE).contains(&self.hand_size) {
            return Err(CoordinatorError::config(format!(
                "hand_size must be {MIN_HAND_SIZE}..={MAX_HAND_SIZE}, got {}",
                self.hand_size
            )));
        }
        if self.ack_timeout.is_zero() {
            return Err(CoordinatorError::config("ack_timeout must be positive"));
        }
        if self.fanout_deadline.is_zero() {
            return Err(CoordinatorError::config("fanout_deadline must be positive"));
        }
        Ok(())
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>, CoordinatorError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| CoordinatorError::config(format!("{key}='{raw}': {e}")))
        })
        .transpose()
}

fn millis_var<F>(var: &F, key: &str) -> Result<Option<Duration>, CoordinatorError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_var::<u64, F>(var, key)?.map(Duration::from_millis))
}

fn bool_var<F>(var: &F, key: &str) -> Result<Option<bool>, CoordinatorError>
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(CoordinatorError::config(format!(
                "{key} must be a boolean, got '{raw}'"
            ))),
        })
        .transpose()
}
