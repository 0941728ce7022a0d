//! Raw configuration document model and loading
//!
//! The document is located either explicitly (the `config-path` argument) or
//! by discovery in the working directory: a `devlane` section in
//! `package.json`, then `.devlanerc` (JSON), then `devlane.toml`. TOML input
//! is converted to JSON values so the merge and the typed model see one
//! representation.
//!
//! Loading produces an untyped `serde_json::Value` first; the in-process
//! override is deep-merged onto it before `RawConfigDocument` is
//! deserialized, so overrides can add whole configurations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::args::{str_arg, ArgSource};
use crate::errors::{ComposeError, ConfigError, ConfigNotFoundError};

/// Parsed configuration document, after override merge.
///
/// Every section is optional; the composers fill gaps from lower-priority
/// sources and built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfigDocument {
    #[serde(default)]
    pub configurations: BTreeMap<String, RawDeviceEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<RawArtifactsConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior: Option<RawBehaviorConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<RawSessionConfig>,
}

/// One entry of the `configurations` map, prior to validation.
///
/// `type` and `device` are optional here so that their absence surfaces as an
/// actionable `ConfigError` instead of a deserialization failure. Keys the
/// composer does not interpret (e.g. `binaryPath`) are carried through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeviceEntry {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceQuery>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<RawSessionConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior: Option<RawBehaviorConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<RawArtifactsConfig>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A device identified either by plain name or by a structured query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceQuery {
    Name(String),
    Query(serde_json::Map<String, Value>),
}

impl DeviceQuery {
    /// An empty name or an empty query object identifies nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            DeviceQuery::Name(name) => name.is_empty(),
            DeviceQuery::Query(map) => map.is_empty(),
        }
    }
}

/// Artifacts section as it appears in a document or device entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArtifactsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,

    /// Either a string reference (registry name or file path) or an inline
    /// object taken as the path builder itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_builder: Option<Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, PluginSetting>,
}

/// Named preset for an artifact-capture plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// No capture.
    Disabled,
    /// Capture kept only for failed tests.
    Failing,
    /// Maximal capture.
    All,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Disabled => "disabled",
            Preset::Failing => "failing",
            Preset::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "disabled" => Some(Preset::Disabled),
            "failing" => Some(Preset::Failing),
            "all" => Some(Preset::All),
            _ => None,
        }
    }
}

/// Per-plugin setting: a preset name, or a custom option object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginSetting {
    Preset(Preset),
    Custom(serde_json::Map<String, Value>),
}

/// Behavior section with every leaf optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBehaviorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<RawInitBehavior>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<RawCleanupBehavior>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInitBehavior {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose_globals: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reinstall_app: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_app: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCleanupBehavior {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_device: Option<bool>,
}

/// Session section with every field optional; presence switches the session
/// composer into strict mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSessionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
}

/// Where a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// The `config-path` argument.
    ExplicitPath,
    /// The `devlane` section of `package.json`.
    PackageManifest,
    /// A `.devlanerc` JSON file.
    RcFile,
    /// A `devlane.toml` file.
    TomlFile,
}

/// A located document with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub value: Value,
    pub source: DocumentSource,
    pub path: PathBuf,
}

/// Locate and parse the configuration document.
///
/// Returns `Ok(None)` when nothing was found; the caller decides whether an
/// override object can stand in for a document.
pub fn load_document(
    cwd: &Path,
    args: &dyn ArgSource,
) -> Result<Option<LoadedDocument>, ComposeError> {
    if let Some(explicit) = str_arg(args, "config-path") {
        let path = resolve_path(cwd, &explicit);
        let contents = fs::read_to_string(&path).map_err(|source| ConfigNotFoundError {
            path: path.clone(),
            source,
        })?;
        let value = parse_by_extension(&path, &contents)?;
        debug!(path = %path.display(), "loaded configuration from explicit config-path");
        return Ok(Some(LoadedDocument {
            value,
            source: DocumentSource::ExplicitPath,
            path,
        }));
    }

    let manifest = cwd.join("package.json");
    if manifest.exists() {
        let value: Value = serde_json::from_str(&read_discovered(&manifest)?)
            .map_err(|e| parse_error(&manifest, &e.to_string()))?;
        if let Some(section) = value.get("devlane").filter(|s| !s.is_null()) {
            debug!(path = %manifest.display(), "using devlane section of package.json");
            return Ok(Some(LoadedDocument {
                value: section.clone(),
                source: DocumentSource::PackageManifest,
                path: manifest,
            }));
        }
    }

    let rc = cwd.join(".devlanerc");
    if rc.exists() {
        let value: Value = serde_json::from_str(&read_discovered(&rc)?)
            .map_err(|e| parse_error(&rc, &e.to_string()))?;
        debug!(path = %rc.display(), "loaded .devlanerc");
        return Ok(Some(LoadedDocument {
            value,
            source: DocumentSource::RcFile,
            path: rc,
        }));
    }

    let toml_path = cwd.join("devlane.toml");
    if toml_path.exists() {
        let contents = read_discovered(&toml_path)?;
        let value = parse_toml(&toml_path, &contents)?;
        debug!(path = %toml_path.display(), "loaded devlane.toml");
        return Ok(Some(LoadedDocument {
            value,
            source: DocumentSource::TomlFile,
            path: toml_path,
        }));
    }

    Ok(None)
}

/// Deserialize the merged raw value into the typed document model.
pub fn parse_document(value: Value) -> Result<RawConfigDocument, ConfigError> {
    serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))
}

fn resolve_path(cwd: &Path, given: &str) -> PathBuf {
    let candidate = Path::new(given);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        cwd.join(candidate)
    }
}

fn read_discovered(path: &Path) -> Result<String, ComposeError> {
    fs::read_to_string(path).map_err(|e| parse_error(path, &e.to_string()).into())
}

fn parse_error(path: &Path, reason: &str) -> ConfigError {
    ConfigError::Parse(format!("{}: {}", path.display(), reason))
}

fn parse_by_extension(path: &Path, contents: &str) -> Result<Value, ComposeError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_toml(path, contents),
        _ => serde_json::from_str(contents).map_err(|e| parse_error(path, &e.to_string()).into()),
    }
}

fn parse_toml(path: &Path, contents: &str) -> Result<Value, ComposeError> {
    let parsed: toml::Value =
        toml::from_str(contents).map_err(|e| parse_error(path, &e.to_string()))?;
    Ok(toml_to_json(parsed))
}

/// Convert a TOML value to its JSON equivalent.
pub(crate) fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{MapArgSource, NullArgSource};
    use serde_json::json;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_typed_document() {
        let doc = parse_document(json!({
            "configurations": {
                "ios.sim": { "type": "ios.simulator", "device": "iPhone 15", "binaryPath": "x" }
            },
            "session": { "server": "ws://localhost:8099", "sessionId": "abc" }
        }))
        .unwrap();

        let entry = &doc.configurations["ios.sim"];
        assert_eq!(entry.driver.as_deref(), Some("ios.simulator"));
        assert_eq!(entry.device, Some(DeviceQuery::Name("iPhone 15".into())));
        assert_eq!(entry.extra["binaryPath"], "x");
        assert_eq!(doc.session.unwrap().server.as_deref(), Some("ws://localhost:8099"));
    }

    #[test]
    fn test_plugin_setting_parses_presets_and_objects() {
        let artifacts: RawArtifactsConfig = serde_json::from_value(json!({
            "plugins": {
                "log": "failing",
                "screenshot": { "takeWhen": { "testDone": true } }
            }
        }))
        .unwrap();

        assert_eq!(artifacts.plugins["log"], PluginSetting::Preset(Preset::Failing));
        assert!(matches!(&artifacts.plugins["screenshot"], PluginSetting::Custom(_)));
    }

    #[test]
    fn test_device_query_object() {
        let entry: RawDeviceEntry = serde_json::from_value(json!({
            "type": "android.emulator",
            "device": { "avdName": "Pixel_7_API_34" }
        }))
        .unwrap();

        match entry.device.unwrap() {
            DeviceQuery::Query(map) => assert_eq!(map["avdName"], "Pixel_7_API_34"),
            other => panic!("expected query object, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_config_path_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = MapArgSource::new();
        args.set("config-path", "missing.json");

        let err = load_document(dir.path(), &args).unwrap_err();
        match err {
            ComposeError::ConfigNotFound(e) => {
                assert!(e.to_string().contains("missing.json"));
            }
            other => panic!("expected ConfigNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_config_path_wins_over_discovery() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), ".devlanerc", r#"{"configurations":{}}"#);
        let explicit = write_file(
            dir.path(),
            "explicit.json",
            r#"{"configurations":{"only":{"type":"ios.simulator","device":"iPhone 15"}}}"#,
        );

        let mut args = MapArgSource::new();
        args.set("config-path", explicit.to_string_lossy().to_string());

        let loaded = load_document(dir.path(), &args).unwrap().unwrap();
        assert_eq!(loaded.source, DocumentSource::ExplicitPath);
        assert!(loaded.value["configurations"]["only"].is_object());
    }

    #[test]
    fn test_package_manifest_section_discovered() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "package.json",
            r#"{"name":"app","devlane":{"configurations":{"a":{"type":"ios.simulator","device":"From package.json"}}}}"#,
        );

        let loaded = load_document(dir.path(), &NullArgSource).unwrap().unwrap();
        assert_eq!(loaded.source, DocumentSource::PackageManifest);
        assert_eq!(
            loaded.value["configurations"]["a"]["device"],
            "From package.json"
        );
    }

    #[test]
    fn test_rc_file_used_when_manifest_has_no_section() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "package.json", r#"{"name":"app"}"#);
        write_file(
            dir.path(),
            ".devlanerc",
            r#"{"configurations":{"a":{"type":"ios.simulator","device":"From .devlanerc"}}}"#,
        );

        let loaded = load_document(dir.path(), &NullArgSource).unwrap().unwrap();
        assert_eq!(loaded.source, DocumentSource::RcFile);
        assert_eq!(
            loaded.value["configurations"]["a"]["device"],
            "From .devlanerc"
        );
    }

    #[test]
    fn test_toml_document_converted_to_json() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "devlane.toml",
            "[configurations.\"ios.sim\"]\ntype = \"ios.simulator\"\ndevice = \"iPhone 15\"\n",
        );

        let loaded = load_document(dir.path(), &NullArgSource).unwrap().unwrap();
        assert_eq!(loaded.source, DocumentSource::TomlFile);
        assert_eq!(
            loaded.value["configurations"]["ios.sim"]["type"],
            "ios.simulator"
        );
    }

    #[test]
    fn test_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_document(dir.path(), &NullArgSource).unwrap().is_none());
    }
}
