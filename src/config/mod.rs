//! Configuration loading.
//!
//! Sources, later ones winning: built-in defaults, `config/default.*` (any
//! format the `config` crate understands), then `MODRELAY_*` environment
//! variables with `__` between nesting levels (`MODRELAY_SERVER__PORT=9000`).

mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{BrokerSettings, LogSettings, ServerSettings, Settings, UserSettings};

pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("MODRELAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;
    Ok(merge(partial, Settings::default()))
}

fn merge(partial: PartialSettings, default: Settings) -> Settings {
    Settings {
        server: ServerSettings {
            host: partial
                .server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: partial
                .server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        broker: BrokerSettings {
            max_connections: partial
                .broker
                .as_ref()
                .and_then(|b| b.max_connections)
                .unwrap_or(default.broker.max_connections),
            heartbeat_interval_secs: partial
                .broker
                .as_ref()
                .and_then(|b| b.heartbeat_interval_secs)
                .unwrap_or(default.broker.heartbeat_interval_secs),
            heartbeat_timeout_secs: partial
                .broker
                .as_ref()
                .and_then(|b| b.heartbeat_timeout_secs)
                .unwrap_or(default.broker.heartbeat_timeout_secs),
        },
        log: LogSettings {
            level: partial
                .log
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.log.level),
        },
        users: partial.users.unwrap_or(default.users),
    }
}
