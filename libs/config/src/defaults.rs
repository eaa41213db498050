//! Default values shared across the producer

/// Default configuration file, relative to the working directory
pub const CONFIG_PATH: &str = "config/feed_producer.toml";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "FEED_PRODUCER";

/// Roster refresh period: fleet membership changes slowly (3 hours)
pub const ROSTER_INTERVAL_SECS: u64 = 3 * 60 * 60;

/// Position refresh period (seconds)
pub const POSITION_INTERVAL_SECS: u64 = 30;

/// First query cursor: the Unix epoch, so the first cycle sees every record
pub const INITIAL_CURSOR_MS: u64 = 0;

/// Suggested stale-entry age limit when eviction is switched on (10 minutes)
pub const SUGGESTED_STALE_AGE_LIMIT_MS: u64 = 10 * 60 * 1000;

pub const LOG_LEVEL: &str = "info";
