use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use chrono::{NaiveTime, Timelike};
use chrono_tz::Tz;
use log::{info, warn};
use serde::Serialize;

use crate::{BotError, Cli, Result, TimeOfDay, DEFAULT_TOLERANCE_MINUTES};

/// Application configuration settings, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token
    pub bot_token: String,

    /// Public URL pinged by the keep-alive loop, if any
    pub public_url: Option<String>,

    /// Port of the health-check server
    pub port: u16,

    /// Timezone of every time-of-day decision
    pub timezone: Tz,

    /// How often the scheduler wakes up
    pub check_interval: Duration,

    /// How often the keep-alive loop pings `public_url`
    pub ping_interval: Duration,

    /// Upper bound on a single send
    pub delivery_timeout: Duration,

    /// Match window around target times, in minutes
    pub tolerance_minutes: u32,

    /// Broadcast times at startup
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Validates command-line input. A missing bot token is the only fatal condition.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let bot_token = cli
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| BotError::Config {
                message: "BOT_TOKEN is not set".to_string(),
            })?
            .to_string();

        let public_url = cli
            .public_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        if public_url.is_none() {
            warn!("RENDER_URL is not set, keep-alive pings are disabled");
        }

        let timezone: Tz = cli.timezone.parse().map_err(|e| BotError::Config {
            message: format!("unknown timezone {}: {}", cli.timezone, e),
        })?;

        if cli.check_interval == 0 {
            return Err(BotError::Config {
                message: "check interval must be positive".to_string(),
            });
        }

        let schedule = ScheduleConfig {
            morning: parse_hh_mm(&cli.morning)?,
            evening: parse_hh_mm(&cli.evening)?,
        };

        info!(
            "Configuration loaded: timezone={}, check_interval={}s, schedule={}",
            timezone, cli.check_interval, schedule
        );

        Ok(Self {
            bot_token,
            public_url,
            port: cli.port,
            timezone,
            check_interval: Duration::from_secs(cli.check_interval),
            ping_interval: Duration::from_secs(cli.ping_interval.max(1)),
            delivery_timeout: Duration::from_secs(cli.delivery_timeout.max(1)),
            tolerance_minutes: DEFAULT_TOLERANCE_MINUTES,
            schedule,
        })
    }
}

fn parse_hh_mm(value: &str) -> Result<TimeOfDay> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| BotError::Config {
        message: format!("expected HH:MM, got {}: {}", value, e),
    })?;
    TimeOfDay::new(time.hour(), time.minute())
}

/// Target times of the two daily broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleConfig {
    pub morning: TimeOfDay,
    pub evening: TimeOfDay,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            morning: TimeOfDay::at(9, 0),
            evening: TimeOfDay::at(18, 0),
        }
    }
}

impl std::fmt::Display for ScheduleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "morning {}, evening {}", self.morning, self.evening)
    }
}

/// Shared, replaceable broadcast schedule
#[derive(Debug, Clone, Default)]
pub struct ScheduleHandle {
    inner: Arc<RwLock<ScheduleConfig>>,
}

impl ScheduleHandle {
    pub fn new(schedule: ScheduleConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(schedule)),
        }
    }

    pub fn current(&self) -> Result<ScheduleConfig> {
        self.inner
            .read()
            .map(|schedule| *schedule)
            .map_err(|_| BotError::poisoned("schedule"))
    }

    /// Replaces both targets at once
    pub fn replace(&self, schedule: ScheduleConfig) -> Result<()> {
        let mut current = self
            .inner
            .write()
            .map_err(|_| BotError::poisoned("schedule"))?;
        *current = schedule;
        info!("Broadcast schedule updated: {}", schedule);
        Ok(())
    }
}
