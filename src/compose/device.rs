//! Device configuration selection and validation

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::args::{str_arg, ArgSource};
use crate::document::{DeviceQuery, RawArtifactsConfig, RawBehaviorConfig, RawDeviceEntry, RawSessionConfig};
use crate::errors::ConfigError;

/// Driver families a configuration's `type` may name.
pub const KNOWN_DRIVERS: &[&str] = &[
    "ios.simulator",
    "ios.none",
    "android.emulator",
    "android.attached",
];

/// A validated device configuration.
///
/// Same shape as `RawDeviceEntry`, with `type` and `device` required and the
/// CLI `device-name` override already applied.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub driver: String,
    pub device: DeviceQuery,
    pub session: Option<RawSessionConfig>,
    pub behavior: Option<RawBehaviorConfig>,
    pub artifacts: Option<RawArtifactsConfig>,
    pub extra: serde_json::Map<String, Value>,
}

impl DeviceConfig {
    /// The `binaryPath` passthrough key, when the configuration sets one.
    pub fn binary_path(&self) -> Option<&str> {
        self.extra
            .get("binaryPath")
            .and_then(Value::as_str)
            .filter(|path| !path.is_empty())
    }

    /// Require a non-empty `binaryPath`; app installation needs it.
    pub fn require_binary_path(&self) -> Result<&str, ConfigError> {
        self.binary_path().ok_or(ConfigError::MissingBinaryPath)
    }
}

/// Select one configuration and validate it.
///
/// The name comes from the CLI `configuration` argument, falling back to the
/// `selected` parameter. With no name, a lone entry is taken; multiple
/// entries are never guessed between.
pub fn compose_device_config(
    args: &dyn ArgSource,
    configurations: &BTreeMap<String, RawDeviceEntry>,
    selected: Option<&str>,
) -> Result<(String, DeviceConfig), ConfigError> {
    if configurations.is_empty() {
        return Err(ConfigError::NoDeviceConfigurations);
    }

    let requested = str_arg(args, "configuration");
    let name = match requested.as_deref().or(selected) {
        Some(name) => {
            if !configurations.contains_key(name) {
                return Err(ConfigError::UnknownConfiguration {
                    name: name.to_string(),
                    available: joined_names(configurations),
                });
            }
            name.to_string()
        }
        None => {
            let mut keys = configurations.keys();
            match (keys.next(), keys.next()) {
                (Some(only), None) => only.clone(),
                _ => {
                    return Err(ConfigError::CannotDetermineConfiguration {
                        count: configurations.len(),
                        names: joined_names(configurations),
                    });
                }
            }
        }
    };

    let entry = &configurations[&name];
    let driver = match entry.driver.as_deref() {
        Some(driver) if KNOWN_DRIVERS.contains(&driver) => driver.to_string(),
        _ => {
            return Err(ConfigError::InvalidDeviceType {
                name: name.clone(),
                allowed: KNOWN_DRIVERS.join(", "),
            });
        }
    };

    let mut device = match &entry.device {
        Some(device) if !device.is_empty() => device.clone(),
        _ => return Err(ConfigError::MissingDeviceQuery { name: name.clone() }),
    };

    // shallow override: only the device query is replaced
    if let Some(override_name) = str_arg(args, "device-name") {
        device = DeviceQuery::Name(override_name);
    }

    debug!(configuration = %name, driver = %driver, "selected device configuration");

    Ok((
        name,
        DeviceConfig {
            driver,
            device,
            session: entry.session.clone(),
            behavior: entry.behavior.clone(),
            artifacts: entry.artifacts.clone(),
            extra: entry.extra.clone(),
        },
    ))
}

fn joined_names(configurations: &BTreeMap<String, RawDeviceEntry>) -> String {
    configurations
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{MapArgSource, NullArgSource};
    use serde_json::json;

    fn entry(driver: &str, device: &str) -> RawDeviceEntry {
        RawDeviceEntry {
            driver: Some(driver.to_string()),
            device: Some(DeviceQuery::Name(device.to_string())),
            ..Default::default()
        }
    }

    fn two_configs() -> BTreeMap<String, RawDeviceEntry> {
        BTreeMap::from([
            ("config1".to_string(), entry("ios.simulator", "iPhone 15")),
            ("config2".to_string(), entry("android.emulator", "Pixel_7")),
        ])
    }

    #[test]
    fn test_no_configurations() {
        let err = compose_device_config(&NullArgSource, &BTreeMap::new(), None).unwrap_err();
        assert!(err.to_string().contains("no device configurations"));
    }

    #[test]
    fn test_single_configuration_selected_implicitly() {
        let configs = BTreeMap::from([("only".to_string(), entry("ios.simulator", "iPhone 15"))]);

        let (name, config) = compose_device_config(&NullArgSource, &configs, None).unwrap();
        assert_eq!(name, "only");
        assert_eq!(config.driver, "ios.simulator");
        assert_eq!(config.device, DeviceQuery::Name("iPhone 15".into()));
    }

    #[test]
    fn test_ambiguous_selection_rejected() {
        let err = compose_device_config(&NullArgSource, &two_configs(), None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cannot determine"));
        assert!(msg.contains("config1"));
        assert!(msg.contains("config2"));
    }

    #[test]
    fn test_selected_parameter_resolves_ambiguity() {
        let (name, config) =
            compose_device_config(&NullArgSource, &two_configs(), Some("config1")).unwrap();
        assert_eq!(name, "config1");
        assert_eq!(config.driver, "ios.simulator");
    }

    #[test]
    fn test_cli_configuration_beats_selected_parameter() {
        let mut args = MapArgSource::new();
        args.set("configuration", "config2");

        let (name, config) =
            compose_device_config(&args, &two_configs(), Some("config1")).unwrap();
        assert_eq!(name, "config2");
        assert_eq!(config.driver, "android.emulator");
    }

    #[test]
    fn test_unknown_name_lists_available() {
        let err =
            compose_device_config(&NullArgSource, &two_configs(), Some("config3")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("config3"));
        assert!(msg.contains("config1, config2"));
    }

    #[test]
    fn test_missing_type_names_allowed_set() {
        let configs = BTreeMap::from([(
            "undefinedDriver".to_string(),
            RawDeviceEntry {
                device: Some(DeviceQuery::Name("iPhone X".into())),
                ..Default::default()
            },
        )]);

        let err = compose_device_config(&NullArgSource, &configs, None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("type"));
        assert!(msg.contains("missing"));
        assert!(msg.contains("ios.simulator"));
        assert!(msg.contains("android.emulator"));
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let configs =
            BTreeMap::from([("bad".to_string(), entry("windows.phone", "Lumia"))]);

        let err = compose_device_config(&NullArgSource, &configs, None).unwrap_err();
        assert!(err.to_string().contains("ios.none"));
    }

    #[test]
    fn test_missing_device_query_describes_shape() {
        let configs = BTreeMap::from([(
            "undefinedDeviceQuery".to_string(),
            RawDeviceEntry {
                driver: Some("ios.simulator".into()),
                ..Default::default()
            },
        )]);

        let err = compose_device_config(&NullArgSource, &configs, None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("device"));
        assert!(msg.contains("empty"));
        assert!(msg.contains("type"));
        assert!(msg.contains("avdName"));
    }

    #[test]
    fn test_empty_device_query_object_rejected() {
        let configs = BTreeMap::from([(
            "empty".to_string(),
            RawDeviceEntry {
                driver: Some("android.emulator".into()),
                device: Some(DeviceQuery::Query(serde_json::Map::new())),
                ..Default::default()
            },
        )]);

        let err = compose_device_config(&NullArgSource, &configs, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDeviceQuery { .. }));
    }

    #[test]
    fn test_device_name_override_is_shallow() {
        let mut configs = two_configs();
        configs.get_mut("config2").unwrap().extra =
            json!({ "binaryPath": "app.apk" }).as_object().unwrap().clone();

        let mut args = MapArgSource::new();
        args.set("configuration", "config2");
        args.set("device-name", "Override");

        let (_, config) = compose_device_config(&args, &configs, None).unwrap();
        assert_eq!(config.device, DeviceQuery::Name("Override".into()));
        // the rest of the entry is untouched
        assert_eq!(config.driver, "android.emulator");
        assert_eq!(config.extra["binaryPath"], "app.apk");
    }

    #[test]
    fn test_binary_path_passthrough() {
        let mut configs = two_configs();
        configs.get_mut("config2").unwrap().extra =
            json!({ "binaryPath": "app.apk" }).as_object().unwrap().clone();

        let (_, config) =
            compose_device_config(&NullArgSource, &configs, Some("config2")).unwrap();
        assert_eq!(config.require_binary_path().unwrap(), "app.apk");
    }

    #[test]
    fn test_missing_binary_path() {
        let configs = two_configs();
        let (_, config) =
            compose_device_config(&NullArgSource, &configs, Some("config1")).unwrap();

        let err = config.require_binary_path().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("binaryPath"), "{msg}");
        assert!(msg.contains("missing"), "{msg}");
    }

    #[test]
    fn test_empty_binary_path_counts_as_missing() {
        let mut configs = two_configs();
        configs.get_mut("config1").unwrap().extra =
            json!({ "binaryPath": "" }).as_object().unwrap().clone();

        let (_, config) =
            compose_device_config(&NullArgSource, &configs, Some("config1")).unwrap();
        assert!(matches!(
            config.require_binary_path(),
            Err(ConfigError::MissingBinaryPath)
        ));
    }
}
