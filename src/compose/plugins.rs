//! Artifact-capture plugin resolution
//!
//! Each plugin resolves to a canonical option object. Named presets expand
//! through the `PresetRegistry`; a custom object from the document refines
//! the winning preset baseline by deep merge, it never replaces it.
//!
//! Baseline rule: the preset name comes from the highest-priority source that
//! supplies one (CLI flag, then selected configuration, then global
//! document), defaulting to `disabled`. The custom object comes from the
//! highest-priority file-level source that supplies one; CLI flags only carry
//! preset names.

use serde_json::{json, Value};

use crate::args::{str_arg, ArgSource};
use crate::document::{PluginSetting, Preset};
use crate::errors::ConfigError;
use crate::merge::deep_merge;

/// The five capture plugins the lane knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Log,
    Screenshot,
    Video,
    Instruments,
    Timeline,
}

impl PluginKind {
    pub const ALL: [PluginKind; 5] = [
        PluginKind::Log,
        PluginKind::Screenshot,
        PluginKind::Video,
        PluginKind::Instruments,
        PluginKind::Timeline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginKind::Log => "log",
            PluginKind::Screenshot => "screenshot",
            PluginKind::Video => "video",
            PluginKind::Instruments => "instruments",
            PluginKind::Timeline => "timeline",
        }
    }

    /// CLI flag toggling this plugin.
    ///
    /// `instruments` and `timeline` have none on purpose: performance capture
    /// is resolved purely from file-level precedence.
    pub fn cli_flag(&self) -> Option<&'static str> {
        match self {
            PluginKind::Log => Some("record-logs"),
            PluginKind::Screenshot => Some("take-screenshots"),
            PluginKind::Video => Some("record-videos"),
            PluginKind::Instruments | PluginKind::Timeline => None,
        }
    }
}

/// Maps plugin + preset to its canonical option object.
pub trait PresetRegistry {
    fn expand(&self, plugin: PluginKind, preset: Preset) -> Value;
}

/// Built-in preset definitions for all five plugins.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinPresets;

impl PresetRegistry for BuiltinPresets {
    fn expand(&self, plugin: PluginKind, preset: Preset) -> Value {
        let enabled = preset != Preset::Disabled;
        let keep_only_failed = preset == Preset::Failing;

        match plugin {
            PluginKind::Log => json!({
                "enabled": enabled,
                "keepOnlyFailedTestsArtifacts": keep_only_failed,
            }),
            PluginKind::Screenshot => json!({
                "enabled": enabled,
                "keepOnlyFailedTestsArtifacts": keep_only_failed,
                "takeWhen": {
                    "testStart": preset == Preset::All,
                    "testFailure": enabled,
                    "testDone": preset == Preset::All,
                },
            }),
            PluginKind::Video => json!({
                "enabled": enabled,
                "keepOnlyFailedTestsArtifacts": keep_only_failed,
                "android": { "bitRate": 2_000_000 },
                "simulator": { "codec": "h264" },
            }),
            PluginKind::Instruments => json!({
                "enabled": enabled,
                "keepOnlyFailedTestsArtifacts": keep_only_failed,
            }),
            PluginKind::Timeline => json!({
                "enabled": enabled,
                "keepOnlyFailedTestsArtifacts": keep_only_failed,
            }),
        }
    }
}

/// Read and validate the preset named on a plugin's CLI flag, if any.
pub fn cli_preset(args: &dyn ArgSource, kind: PluginKind) -> Result<Option<Preset>, ConfigError> {
    let Some(flag) = kind.cli_flag() else {
        return Ok(None);
    };
    let Some(raw) = str_arg(args, flag) else {
        return Ok(None);
    };
    match Preset::parse(&raw) {
        Some(preset) => Ok(Some(preset)),
        None => Err(ConfigError::InvalidPluginPreset {
            plugin: kind.as_str().to_string(),
            value: raw,
        }),
    }
}

/// Resolve one plugin from its prioritized sources.
pub fn resolve_plugin(
    presets: &dyn PresetRegistry,
    kind: PluginKind,
    cli: Option<Preset>,
    device_setting: Option<&PluginSetting>,
    doc_setting: Option<&PluginSetting>,
) -> Value {
    let preset_of = |setting: Option<&PluginSetting>| match setting {
        Some(PluginSetting::Preset(p)) => Some(*p),
        _ => None,
    };
    let custom_of = |setting: Option<&PluginSetting>| match setting {
        Some(PluginSetting::Custom(map)) => Some(map.clone()),
        _ => None,
    };

    let preset = cli
        .or_else(|| preset_of(device_setting))
        .or_else(|| preset_of(doc_setting))
        .unwrap_or(Preset::Disabled);
    let baseline = presets.expand(kind, preset);

    match custom_of(device_setting).or_else(|| custom_of(doc_setting)) {
        Some(custom) => deep_merge(baseline, Value::Object(custom)),
        None => baseline,
    }
}
