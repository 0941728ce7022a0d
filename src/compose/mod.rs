//! Full configuration composition
//!
//! One call resolves the effective run configuration from the configuration
//! document, an in-process override, CLI/environment arguments, and built-in
//! defaults. The four section composers run in a fixed order: device,
//! artifacts, behavior, session. Composition is all-or-nothing.

pub mod artifacts;
pub mod behavior;
pub mod device;
pub mod plugins;
pub mod session;

use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::debug;

use crate::args::ArgSource;
use crate::document::{self, RawConfigDocument};
use crate::errors::{ComposeError, ConfigError};
use crate::merge::deep_merge;
use crate::path_builder::PathBuilderResolver;

pub use artifacts::{compose_artifacts_config, ArtifactsConfig, PluginsConfig};
pub use behavior::{compose_behavior_config, BehaviorConfig, UserParams};
pub use device::{compose_device_config, DeviceConfig, KNOWN_DRIVERS};
pub use plugins::{BuiltinPresets, PluginKind, PresetRegistry};
pub use session::{compose_session_config, SessionConfig};

/// Inputs of a composition call.
#[derive(Debug, Default)]
pub struct ComposeParams {
    /// Working directory for document discovery and relative references.
    /// Defaults to the process working directory.
    pub cwd: Option<PathBuf>,

    /// Configuration name to select; the CLI `configuration` argument wins
    /// over this.
    pub selected_configuration: Option<String>,

    /// Object deep-merged onto the loaded document. Can stand in for a
    /// document entirely.
    pub override_config: Option<Value>,

    /// Short-hand behavior overrides.
    pub user_params: Option<UserParams>,
}

/// The fully composed run configuration.
#[derive(Debug)]
pub struct ComposedConfig {
    /// Name of the selected configuration.
    pub configuration_name: String,
    pub device_config: DeviceConfig,
    pub artifacts_config: ArtifactsConfig,
    pub behavior_config: BehaviorConfig,
    pub session_config: SessionConfig,
}

impl ComposedConfig {
    /// JSON rendering for diagnostics and the CLI `show` command.
    pub fn to_value(&self) -> Value {
        json!({
            "configurationName": &self.configuration_name,
            "deviceConfig": {
                "type": &self.device_config.driver,
                "device": &self.device_config.device,
            },
            "artifactsConfig": {
                "rootDir": &self.artifacts_config.root_dir,
                "pathBuilder": self.artifacts_config.path_builder.describe(),
                "plugins": &self.artifacts_config.plugins,
            },
            "behaviorConfig": &self.behavior_config,
            "sessionConfig": &self.session_config,
        })
    }
}

/// Compose with the built-in path-builder resolver and preset registry.
pub fn compose_config(
    params: &ComposeParams,
    args: &dyn ArgSource,
) -> Result<ComposedConfig, ComposeError> {
    let cwd = effective_cwd(params);
    let resolver = PathBuilderResolver::new(&cwd);
    compose_config_with(params, args, &resolver, &BuiltinPresets)
}

/// Compose with injected collaborators (custom path builders, preset sets).
pub fn compose_config_with(
    params: &ComposeParams,
    args: &dyn ArgSource,
    resolver: &PathBuilderResolver,
    presets: &dyn PresetRegistry,
) -> Result<ComposedConfig, ComposeError> {
    let cwd = effective_cwd(params);

    let loaded = document::load_document(&cwd, args)?;
    if loaded.is_none() && params.override_config.is_none() {
        return Err(ConfigError::NoConfiguration.into());
    }

    let base = loaded.map(|l| l.value).unwrap_or_else(|| json!({}));
    let merged = match &params.override_config {
        Some(override_config) => deep_merge(base, override_config.clone()),
        None => base,
    };
    let doc: RawConfigDocument = document::parse_document(merged)?;

    let (configuration_name, device_config) = compose_device_config(
        args,
        &doc.configurations,
        params.selected_configuration.as_deref(),
    )?;
    let artifacts_config = compose_artifacts_config(
        args,
        &configuration_name,
        &device_config,
        &doc,
        resolver,
        presets,
    )?;
    let behavior_config =
        compose_behavior_config(args, &device_config, &doc, params.user_params.as_ref());
    let session_config = compose_session_config(&device_config, &doc)?;

    debug!(configuration = %configuration_name, "composed run configuration");

    Ok(ComposedConfig {
        configuration_name,
        device_config,
        artifacts_config,
        behavior_config,
        session_config,
    })
}

fn effective_cwd(params: &ComposeParams) -> PathBuf {
    params
        .cwd
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
