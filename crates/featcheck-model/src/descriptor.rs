//! Descriptor types: the scanned shape of a deployable.
//!
//! A [`DescriptorSet`] is produced by an external scanner and consumed
//! read-only by the analysers. It is exchanged as a camelCase JSON
//! document:
//!
//! ```text
//! {
//!   "schema": 1,
//!   "deployable": { "id": "g:f:1", "capabilities": [...], "requirements": [...] },
//!   "framework": { ...module... },
//!   "modules": [ { "symbolicName": "b1", "version": "1.0.0", "startLevel": 1,
//!                  "exports": [...], "imports": [...],
//!                  "capabilities": [...], "requirements": [...] } ],
//!   "artifacts": [ { "id": "g:a:1", "capabilities": [...], "requirements": [...] } ],
//!   "apiRegions": [ { "name": "global", "exports": [...] } ]
//! }
//! ```

use crate::error::ModelError;
use crate::filter::Filter;
use crate::version::{Version, VersionRange};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub const DESCRIPTOR_SET_SCHEMA: u32 = 1;

/// Namespace owned by package imports/exports.
pub const PACKAGE_NAMESPACE: &str = "osgi.wiring.package";
/// Namespace whose providers are registered at runtime and cannot be seen statically.
pub const SERVICE_NAMESPACE: &str = "osgi.service";

/// A capability attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Long(i64),
    Double(f64),
    Text(String),
    List(Vec<AttributeValue>),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Long(n) => write!(f, "{n}"),
            AttributeValue::Double(d) => write!(f, "{d}"),
            AttributeValue::Text(text) => f.write_str(text),
            AttributeValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageExport {
    pub name: String,
    /// Absent means undeclared, which is the empty version.
    #[serde(default, skip_serializing_if = "Version::is_empty")]
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageImport {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionRange>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl PackageImport {
    pub fn accepts(&self, export: &PackageExport) -> bool {
        export.name == self.name
            && self
                .version
                .as_ref()
                .is_none_or(|range| range.includes(&export.version))
    }
}

impl fmt::Display for PackageImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(range) => write!(f, "{};{}", self.name, range),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub namespace: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub namespace: String,
    /// No filter matches every capability in the namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl Requirement {
    pub fn is_satisfied_by(&self, capability: &Capability) -> bool {
        capability.namespace == self.namespace
            && self
                .filter
                .as_ref()
                .is_none_or(|filter| filter.matches(&capability.attributes))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.namespace)?;
        if let Some(filter) = &self.filter {
            write!(f, "; filter:=\"{filter}\"")?;
        }
        if self.optional {
            f.write_str("; resolution:=optional")?;
        }
        Ok(())
    }
}

/// A module: the unit that activates at a level and wires packages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub symbolic_name: String,
    #[serde(default)]
    pub version: Version,
    /// Coordinates of the artifact carrying the module, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    #[serde(default)]
    pub start_level: i32,
    #[serde(default)]
    pub exports: Vec<PackageExport>,
    #[serde(default)]
    pub imports: Vec<PackageImport>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

impl ModuleDescriptor {
    pub fn new(symbolic_name: impl Into<String>, version: Version, start_level: i32) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            version,
            artifact: None,
            start_level,
            exports: Vec::new(),
            imports: Vec::new(),
            capabilities: Vec::new(),
            requirements: Vec::new(),
        }
    }

    /// `symbolic-name:version`, used to name the module in findings.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.symbolic_name, self.version)
    }

    pub fn exports_package_named(&self, name: &str) -> bool {
        self.exports.iter().any(|export| export.name == name)
    }

    /// True iff some export matches both the name and the import's range.
    pub fn is_exporting_package(&self, import: &PackageImport) -> bool {
        self.exports.iter().any(|export| import.accepts(export))
    }
}

/// A non-module artifact that still provides or requires capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDescriptor {
    pub id: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

/// The deployable itself, with capabilities and requirements of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployableDescriptor {
    pub id: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorSet {
    #[serde(default = "default_schema")]
    pub schema: u32,
    pub deployable: DeployableDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<ModuleDescriptor>,
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactDescriptor>,
    /// Raw region declaration; parsed by the analysers, not here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_regions: Option<Value>,
}

fn default_schema() -> u32 {
    DESCRIPTOR_SET_SCHEMA
}

impl DescriptorSet {
    pub fn new(deployable_id: impl Into<String>) -> Self {
        Self {
            schema: DESCRIPTOR_SET_SCHEMA,
            deployable: DeployableDescriptor {
                id: deployable_id.into(),
                capabilities: Vec::new(),
                requirements: Vec::new(),
            },
            framework: None,
            modules: Vec::new(),
            artifacts: Vec::new(),
            api_regions: None,
        }
    }

    pub fn from_json_str(raw: &str, origin: &str) -> Result<Self, ModelError> {
        let set: DescriptorSet =
            serde_json::from_str(raw).map_err(|source| ModelError::ParseJson {
                path: origin.to_string(),
                source,
            })?;
        if set.schema != DESCRIPTOR_SET_SCHEMA {
            return Err(ModelError::UnsupportedSchema {
                found: set.schema,
                expected: DESCRIPTOR_SET_SCHEMA,
            });
        }
        Ok(set)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw, &path.display().to_string())
    }
}
