//! Artifact path building
//!
//! The artifacts composer hands every capture plugin a path builder: an
//! object that, given test metadata, returns the destination path for an
//! artifact. The builder receives the resolved root directory at
//! construction.
//!
//! A configured `pathBuilder` value is either an inline object (used as-is),
//! a registry name (resolved to a factory injected by the embedding tool), or
//! a file path whose JSON/TOML content is taken as an opaque builder object.
//! The file's shape is deliberately not validated here.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ModuleResolutionError;

/// Minimal test metadata handed to a path builder.
#[derive(Debug, Clone)]
pub struct TestSummary {
    pub full_name: String,
}

/// Capability exposed to artifact-writing collaborators.
pub trait PathBuilder: fmt::Debug {
    /// Root directory this builder was constructed with.
    fn root_dir(&self) -> &Path;

    /// Destination path for one named artifact of one test.
    fn path_for_test_artifact(&self, artifact_name: &str, test: &TestSummary) -> PathBuf;
}

/// Built-in builder: `<root>/<sanitized test name>/<artifact>`.
#[derive(Debug, Clone)]
pub struct DefaultPathBuilder {
    root_dir: PathBuf,
}

impl DefaultPathBuilder {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }
}

impl PathBuilder for DefaultPathBuilder {
    fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn path_for_test_artifact(&self, artifact_name: &str, test: &TestSummary) -> PathBuf {
        self.root_dir
            .join(sanitize_component(&test.full_name))
            .join(sanitize_component(artifact_name))
    }
}

/// Replace characters that are hostile to at least one supported filesystem.
fn sanitize_component(component: &str) -> String {
    component
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// A resolved path builder: a live instance, or an opaque object loaded from
/// configuration. Callers that expect a builder treat an opaque value as a
/// plain object.
#[derive(Debug)]
pub enum ResolvedPathBuilder {
    Instance(Box<dyn PathBuilder>),
    Opaque(Value),
}

impl ResolvedPathBuilder {
    /// Root directory, when this is a live instance.
    pub fn root_dir(&self) -> Option<&Path> {
        match self {
            ResolvedPathBuilder::Instance(builder) => Some(builder.root_dir()),
            ResolvedPathBuilder::Opaque(_) => None,
        }
    }

    /// JSON rendering for diagnostics and the CLI `show` command.
    pub fn describe(&self) -> Value {
        match self {
            ResolvedPathBuilder::Instance(builder) => serde_json::json!({
                "rootDir": builder.root_dir().to_string_lossy(),
            }),
            ResolvedPathBuilder::Opaque(value) => value.clone(),
        }
    }
}

/// Factory for a registered builder; receives the resolved root directory.
pub type PathBuilderFactory = Box<dyn Fn(&Path) -> Box<dyn PathBuilder>>;

/// Resolves a configured `pathBuilder` value into an instance.
///
/// String references are looked up in the factory registry first, then
/// treated as a file path relative to the working directory.
pub struct PathBuilderResolver {
    cwd: PathBuf,
    registry: BTreeMap<String, PathBuilderFactory>,
}

impl PathBuilderResolver {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            registry: BTreeMap::new(),
        }
    }

    /// Register an in-process builder under a name usable from configuration.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&Path) -> Box<dyn PathBuilder> + 'static,
    ) -> &mut Self {
        self.registry.insert(name.into(), Box::new(factory));
        self
    }

    /// Resolve a configured value into a builder rooted at `root_dir`.
    pub fn resolve(
        &self,
        value: &Value,
        root_dir: &Path,
    ) -> Result<ResolvedPathBuilder, ModuleResolutionError> {
        match value {
            Value::String(reference) => self.resolve_reference(reference, root_dir),
            other => Ok(ResolvedPathBuilder::Opaque(other.clone())),
        }
    }

    fn resolve_reference(
        &self,
        reference: &str,
        root_dir: &Path,
    ) -> Result<ResolvedPathBuilder, ModuleResolutionError> {
        if let Some(factory) = self.registry.get(reference) {
            return Ok(ResolvedPathBuilder::Instance(factory(root_dir)));
        }

        let candidate = Path::new(reference);
        let path = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.cwd.join(candidate)
        };

        if !path.exists() {
            return Err(ModuleResolutionError::NotFound {
                reference: reference.to_string(),
                path,
            });
        }

        let contents = fs::read_to_string(&path).map_err(|e| ModuleResolutionError::Unloadable {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let value = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str::<toml::Value>(&contents)
                .map(crate::document::toml_to_json)
                .map_err(|e| ModuleResolutionError::Unloadable {
                    path: path.clone(),
                    reason: e.to_string(),
                })?,
            _ => serde_json::from_str(&contents).map_err(|e| ModuleResolutionError::Unloadable {
                path: path.clone(),
                reason: e.to_string(),
            })?,
        };

        Ok(ResolvedPathBuilder::Opaque(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn test_named(name: &str) -> TestSummary {
        TestSummary {
            full_name: name.to_string(),
        }
    }

    #[test]
    fn test_default_builder_layout() {
        let builder = DefaultPathBuilder::new("artifacts/run.0001");
        let path = builder.path_for_test_artifact("device.log", &test_named("login flow"));

        assert_eq!(
            path,
            PathBuf::from("artifacts/run.0001/login flow/device.log")
        );
        assert_eq!(builder.root_dir(), Path::new("artifacts/run.0001"));
    }

    #[test]
    fn test_default_builder_sanitizes_hostile_characters() {
        let builder = DefaultPathBuilder::new("artifacts");
        let path = builder.path_for_test_artifact(
            "screenshot.png",
            &test_named("signs in: with \"special\" <chars>?"),
        );

        let component = path.parent().unwrap().file_name().unwrap();
        assert_eq!(component, "signs in_ with _special_ _chars__");
    }

    #[test]
    fn test_inline_object_used_as_is() {
        let resolver = PathBuilderResolver::new(".");
        let resolved = resolver
            .resolve(&json!({"buildPath": "custom"}), Path::new("artifacts"))
            .unwrap();

        match resolved {
            ResolvedPathBuilder::Opaque(value) => assert_eq!(value["buildPath"], "custom"),
            other => panic!("expected opaque object, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_name_resolves_to_instance() {
        let mut resolver = PathBuilderResolver::new(".");
        resolver.register("default", |root| Box::new(DefaultPathBuilder::new(root)));

        let resolved = resolver
            .resolve(&json!("default"), Path::new("artifacts/abc.2026"))
            .unwrap();

        assert_eq!(resolved.root_dir(), Some(Path::new("artifacts/abc.2026")));
    }

    #[test]
    fn test_file_reference_loads_opaque_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builder.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(br#"{"name": "fake-builder", "version": "1.0.0"}"#)
            .unwrap();

        let resolver = PathBuilderResolver::new(dir.path());
        let resolved = resolver
            .resolve(&json!("builder.json"), Path::new("artifacts"))
            .unwrap();

        match resolved {
            ResolvedPathBuilder::Opaque(value) => {
                assert_eq!(value["name"], "fake-builder");
                assert_eq!(value["version"], "1.0.0");
            }
            other => panic!("expected opaque object, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_reference_fails() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathBuilderResolver::new(dir.path());

        let err = resolver
            .resolve(&json!("./no-such-builder.json"), Path::new("artifacts"))
            .unwrap_err();

        match err {
            ModuleResolutionError::NotFound { reference, .. } => {
                assert_eq!(reference, "./no-such-builder.json");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
