//! Artifacts configuration resolution
//!
//! Resolves the artifacts root directory, the path builder, and the five
//! capture plugins into one `ArtifactsConfig`.

use chrono::Utc;
use serde_json::Value;

use crate::args::{str_arg, ArgSource};
use crate::compose::device::DeviceConfig;
use crate::compose::plugins::{cli_preset, resolve_plugin, PluginKind, PresetRegistry};
use crate::document::RawConfigDocument;
use crate::errors::ComposeError;
use crate::path_builder::{DefaultPathBuilder, PathBuilderResolver, ResolvedPathBuilder};

/// Root directory used when no source specifies one.
pub const DEFAULT_ROOT_DIR: &str = "artifacts";

/// Fully resolved artifacts configuration.
#[derive(Debug)]
pub struct ArtifactsConfig {
    pub root_dir: String,
    pub path_builder: ResolvedPathBuilder,
    pub plugins: PluginsConfig,
}

/// Resolved option object per capture plugin.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PluginsConfig {
    pub log: Value,
    pub screenshot: Value,
    pub video: Value,
    pub instruments: Value,
    pub timeline: Value,
}

impl PluginsConfig {
    fn slot(&mut self, kind: PluginKind) -> &mut Value {
        match kind {
            PluginKind::Log => &mut self.log,
            PluginKind::Screenshot => &mut self.screenshot,
            PluginKind::Video => &mut self.video,
            PluginKind::Instruments => &mut self.instruments,
            PluginKind::Timeline => &mut self.timeline,
        }
    }
}

/// Compose the artifacts configuration for the selected device configuration.
pub fn compose_artifacts_config(
    args: &dyn ArgSource,
    configuration_name: &str,
    device: &DeviceConfig,
    doc: &RawConfigDocument,
    resolver: &PathBuilderResolver,
    presets: &dyn PresetRegistry,
) -> Result<ArtifactsConfig, ComposeError> {
    let device_artifacts = device.artifacts.as_ref();
    let doc_artifacts = doc.artifacts.as_ref();

    let root_dir = resolve_root_dir(
        str_arg(args, "artifacts-location")
            .or_else(|| device_artifacts.and_then(|a| a.root_dir.clone()))
            .or_else(|| doc_artifacts.and_then(|a| a.root_dir.clone()))
            .unwrap_or_else(|| DEFAULT_ROOT_DIR.to_string()),
        configuration_name,
    );

    let path_builder_setting = device_artifacts
        .and_then(|a| a.path_builder.as_ref())
        .or_else(|| doc_artifacts.and_then(|a| a.path_builder.as_ref()));
    let path_builder = match path_builder_setting {
        Some(value) => resolver.resolve(value, root_dir.as_ref())?,
        None => ResolvedPathBuilder::Instance(Box::new(DefaultPathBuilder::new(&root_dir))),
    };

    let mut plugins = PluginsConfig {
        log: Value::Null,
        screenshot: Value::Null,
        video: Value::Null,
        instruments: Value::Null,
        timeline: Value::Null,
    };
    fn setting_of<'a>(
        artifacts: Option<&'a crate::document::RawArtifactsConfig>,
        kind: PluginKind,
    ) -> Option<&'a crate::document::PluginSetting> {
        artifacts.and_then(|a| a.plugins.get(kind.as_str()))
    }
    for kind in PluginKind::ALL {
        *plugins.slot(kind) = resolve_plugin(
            presets,
            kind,
            cli_preset(args, kind)?,
            setting_of(device_artifacts, kind),
            setting_of(doc_artifacts, kind),
        );
    }

    Ok(ArtifactsConfig {
        root_dir,
        path_builder,
        plugins,
    })
}

/// Suffix the root directory with `<name>.<timestamp>` unless it already ends
/// in a path separator; a trailing separator disables auto-naming.
fn resolve_root_dir(root: String, configuration_name: &str) -> String {
    if root.ends_with('/') || root.ends_with('\\') {
        return root;
    }
    let timestamp = Utc::now().format("%Y-%m-%d %H-%M-%SZ");
    format!("{root}/{configuration_name}.{timestamp}")
}
