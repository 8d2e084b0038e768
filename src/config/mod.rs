//! Configuration loading.
//!
//! Sources, later ones winning: built-in defaults, an optional file
//! (`config/default.*` unless a path is given), then `SNBROKER_*` environment
//! variables with `__` between sections, e.g. `SNBROKER_SERVER__PORT=1885`.

mod settings;

use config::{Config, ConfigError, Environment, File};

pub use settings::{
    BrokerSettings, LogSettings, MIN_BUFFER_SIZE, PartialSettings, ServerSettings, SessionBackend,
    SessionSettings, Settings,
};

pub const DEFAULT_CONFIG_FILE: &str = "config/default";
pub const ENV_PREFIX: &str = "SNBROKER";

/// Loads the configuration and merges it with default values.
///
/// A missing default file is fine; a missing explicitly named file is an error.
pub fn load_config(path: Option<&str>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => File::with_name(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge())
}
