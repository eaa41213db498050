//! # Feed Producer Configuration
//!
//! Configuration loading and validation for the vehicle positions feed
//! producer, plus the default values every service shares.
//!
//! ## Sources
//!
//! Layered in increasing priority:
//! 1. Built-in defaults ([`defaults`])
//! 2. A TOML file (`config/feed_producer.toml` unless told otherwise)
//! 3. Environment variables prefixed `FEED_PRODUCER`, with `__` separating
//!    sections, e.g. `FEED_PRODUCER__STORE__URI`
//! 4. Overrides applied by the caller (command-line flags)
//!
//! Validation runs last; a missing store connection setting is fatal.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use producer_config::ProducerConfig;
//!
//! let config = ProducerConfig::load(None)?;
//! println!("polling {} every {:?}", config.store.collection, config.refresh.position_interval());
//! # Ok::<(), producer_config::ConfigError>(())
//! ```

pub mod defaults;
pub mod error;
pub mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{ExportSettings, LoggingSettings, ProducerConfig, RefreshSettings, StoreSettings};
