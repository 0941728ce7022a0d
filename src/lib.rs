//! devlane-config - layered configuration composition for the devlane E2E lane
//!
//! Resolves one effective run configuration from four competing sources -
//! configuration file, in-process override, CLI/environment arguments, and
//! built-in defaults - under a fixed precedence order (CLI > selected
//! configuration > global document > default), validating structure along
//! the way and producing resolved device, artifacts, behavior, and session
//! sub-configurations.

pub mod args;
pub mod compose;
pub mod document;
pub mod errors;
pub mod merge;
pub mod path_builder;

pub use args::{ArgSource, ChainArgSource, EnvArgSource, MapArgSource, NullArgSource};
pub use compose::{
    compose_config, compose_config_with, ComposeParams, ComposedConfig, UserParams,
};
pub use document::{DeviceQuery, Preset, RawConfigDocument};
pub use errors::{ComposeError, ConfigError, ConfigNotFoundError, ModuleResolutionError};
pub use path_builder::{DefaultPathBuilder, PathBuilder, PathBuilderResolver, ResolvedPathBuilder};
