//! Error taxonomy for configuration composition
//!
//! Three failure families, surfaced to the caller unmodified:
//! - `ConfigError`: structural or semantic misconfiguration
//! - `ConfigNotFoundError`: an explicitly requested config file is unreadable
//! - `ModuleResolutionError`: a path-builder reference does not resolve
//!
//! Composition is all-or-nothing; none of these are retried internally.

use std::io;
use std::path::PathBuf;

/// Structural or semantic misconfiguration.
///
/// Messages name the offending key path and, where applicable, the set of
/// accepted values, so they can be shown to the user verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("there are no device configurations in the given config")]
    NoDeviceConfigurations,

    #[error(
        "cannot determine which configuration to use: found {count} configurations ({names}); \
         pass --configuration or selectedConfiguration to choose one"
    )]
    CannotDetermineConfiguration { count: usize, names: String },

    #[error("cannot find a device configuration named \"{name}\"; available: {available}")]
    UnknownConfiguration { name: String, available: String },

    #[error(
        "configurations[\"{name}\"].type is missing or unsupported; \
         expected one of: {allowed}"
    )]
    InvalidDeviceType { name: String, allowed: String },

    #[error(
        "configurations[\"{name}\"].device is missing or empty; provide a device name string \
         or a non-empty device query object such as {{\"type\": \"iPhone 15\"}} or \
         {{\"avdName\": \"Pixel_7_API_34\"}}"
    )]
    MissingDeviceQuery { name: String },

    #[error("session.server property is missing; server and sessionId must be set together")]
    MissingSessionServer,

    #[error("session.sessionId property is missing; server and sessionId must be set together")]
    MissingSessionId,

    #[error(
        "unrecognized preset \"{value}\" for the {plugin} plugin; \
         expected one of: disabled, failing, all"
    )]
    InvalidPluginPreset { plugin: String, value: String },

    #[error(
        "binaryPath property is missing in the selected configuration; \
         set it to the app binary to install"
    )]
    MissingBinaryPath,

    #[error("cannot start without a configuration: no config file found and no override given")]
    NoConfiguration,

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// An explicitly requested configuration file could not be read.
///
/// Propagates the underlying I/O error together with the offending path.
#[derive(Debug, thiserror::Error)]
#[error("failed to read configuration at {}: {source}", path.display())]
pub struct ConfigNotFoundError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// A path-builder string reference did not resolve to a loadable module.
#[derive(Debug, thiserror::Error)]
pub enum ModuleResolutionError {
    #[error("cannot resolve path builder \"{reference}\": no such file at {}", path.display())]
    NotFound { reference: String, path: PathBuf },

    #[error("cannot load path builder module at {}: {reason}", path.display())]
    Unloadable { path: PathBuf, reason: String },
}

/// Umbrella error returned by the top-level composition entry points.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ConfigNotFound(#[from] ConfigNotFoundError),

    #[error(transparent)]
    ModuleResolution(#[from] ModuleResolutionError),
}
