//! Plugin manifest — declarative identity and metadata of a plugin.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use renderhub_core::error::AppError;

/// Declarative identity of a plugin.
///
/// The manifest is a JSON-serializable contract shared with external
/// tooling: required `name`, `version`, and `main` fields, plus optional
/// metadata, hook declarations, dependencies, and permissions.
///
/// Immutable once the plugin is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Globally-unique plugin name; primary key within the catalog.
    pub name: String,
    /// Version string, strict `MAJOR.MINOR.PATCH` with numeric components.
    pub version: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Author or maintainer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Entry-point reference.
    pub main: String,
    /// Hook names this plugin wishes to expose.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<String>,
    /// Dependency name → required version string.
    ///
    /// The version string is recorded but not compared against the
    /// dependency's registered version; only name presence in the active
    /// set is checked at load time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    /// Permissions requested by the plugin.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
}

impl PluginManifest {
    /// Creates a manifest with the three required fields and no metadata.
    pub fn new(name: impl Into<String>, version: impl Into<String>, main: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            author: None,
            main: main.into(),
            hooks: Vec::new(),
            dependencies: BTreeMap::new(),
            permissions: Vec::new(),
        }
    }

    /// Validates the manifest, collecting every problem into one error.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();

        if self.name.is_empty() {
            problems.push("manifest is missing required field 'name'".to_string());
        }
        if self.version.is_empty() {
            problems.push("manifest is missing required field 'version'".to_string());
        } else if !is_valid_version(&self.version) {
            problems.push(format!(
                "version '{}' does not match MAJOR.MINOR.PATCH",
                self.version
            ));
        }
        if self.main.is_empty() {
            problems.push("manifest is missing required field 'main'".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(problems.join("; ")))
        }
    }
}

/// Checks the strict three-component numeric version pattern.
fn is_valid_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}
