//! Process configuration loaded from the environment (and `.env` when present).

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::shared::errors::{AppError, AppResult};
use crate::{log_debug, log_info};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_size: u32,
    pub min_idle: u32,
}

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub max_conflict_retries: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            retry_base_delay: Duration::from_millis(10),
            retry_max_delay: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub ledger: LedgerConfig,
    pub repair_on_startup: bool,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let url = validated_database_url(env::var("DATABASE_URL").ok())?;
        let (default_max, default_min) = optimal_pool_size();
        let defaults = LedgerConfig::default();

        let config = Self {
            database: DatabaseConfig {
                url,
                max_size: try_load("DATABASE_POOL_MAX_SIZE", default_max)?,
                min_idle: try_load("DATABASE_POOL_MIN_IDLE", default_min)?,
            },
            ledger: LedgerConfig {
                max_conflict_retries: try_load(
                    "LEDGER_MAX_CONFLICT_RETRIES",
                    defaults.max_conflict_retries,
                )?,
                retry_base_delay: Duration::from_millis(try_load(
                    "LEDGER_RETRY_BASE_DELAY_MS",
                    defaults.retry_base_delay.as_millis() as u64,
                )?),
                retry_max_delay: Duration::from_millis(try_load(
                    "LEDGER_RETRY_MAX_DELAY_MS",
                    defaults.retry_max_delay.as_millis() as u64,
                )?),
            },
            repair_on_startup: try_load("REPAIR_ON_STARTUP", true)?,
        };

        if config.database.min_idle > config.database.max_size {
            return Err(AppError::ConfigError(format!(
                "DATABASE_POOL_MIN_IDLE ({}) exceeds DATABASE_POOL_MAX_SIZE ({})",
                config.database.min_idle, config.database.max_size
            )));
        }

        Ok(config)
    }
}

fn try_load<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid {} value '{}': {}", key, raw, e))),
        Err(_) => {
            log_debug!("{} not set, using default: {}", key, default);
            Ok(default)
        }
    }
}

pub(crate) fn validated_database_url(raw: Option<String>) -> AppResult<String> {
    let database_url = raw.ok_or_else(|| {
        AppError::ConfigError("DATABASE_URL environment variable not found".to_string())
    })?;

    if !database_url.starts_with("postgres://") && !database_url.starts_with("postgresql://") {
        return Err(AppError::ConfigError(
            "Invalid database URL format. Must start with postgres:// or postgresql://"
                .to_string(),
        ));
    }

    // Log the target host only, never credentials
    log_info!(
        "Database target: {}",
        database_url.rsplit('@').next().unwrap_or("unknown_host")
    );

    Ok(database_url)
}

/// Pool sizing based on available parallelism, capped for a single service instance.
fn optimal_pool_size() -> (u32, u32) {
    let cpu_count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);

    let max_size = std::cmp::min(cpu_count * 2, 20);
    let min_idle = std::cmp::max(2, max_size / 4);

    (max_size as u32, min_idle as u32)
}
