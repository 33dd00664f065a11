//! Configuration for the `sqlshape` CLI.
//!
//! The library itself never reads configuration; compile calls take all of
//! their inputs explicitly.

mod settings;

pub use settings::{
    expand_env_vars, LoggingSettings, MetadataSettings, Settings, SettingsError, CONFIG_ENV_VAR,
};
