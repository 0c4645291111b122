//! The region sieve.
//!
//! Regions partition the packages a deployable declares as exported. The
//! sieve starts from the declaration and only ever shrinks: every package a
//! module really exports is removed from all regions, and whatever is left
//! is declared but unbacked.

use crate::error::AnalysisError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Region whose exports are visible to every consumer.
pub const GLOBAL_REGION: &str = "global";

const NAME_KEY: &str = "name";
const EXPORTS_KEY: &str = "exports";
const COMMENT_MARKER: char = '#';

static NO_EXPORTS: BTreeSet<String> = BTreeSet::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub name: String,
    pub exports: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilitySieve {
    regions: Vec<Region>,
}

impl VisibilitySieve {
    pub fn from_json(raw: &str) -> Result<Self, AnalysisError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| AnalysisError::malformed(format!("invalid json: {e}")))?;
        Self::from_value(&value)
    }

    /// Builds the sieve from a parsed declaration.
    ///
    /// Records without a name or an export list are skipped. Export entries
    /// starting with `#` are comments. A region named twice merges into its
    /// first position.
    pub fn from_value(declaration: &Value) -> Result<Self, AnalysisError> {
        let Some(records) = declaration.as_array() else {
            return Err(AnalysisError::malformed(
                "root must be an array of region records",
            ));
        };

        let mut sieve = Self::default();
        for (idx, record) in records.iter().enumerate() {
            let Some(obj) = record.as_object() else {
                return Err(AnalysisError::malformed(format!(
                    "regions[{idx}] must be an object"
                )));
            };
            let name = match obj.get(NAME_KEY) {
                None => None,
                Some(Value::String(name)) => Some(name.as_str()),
                Some(_) => {
                    return Err(AnalysisError::malformed(format!(
                        "regions[{idx}].{NAME_KEY} must be a string"
                    )));
                }
            };
            let exports = match obj.get(EXPORTS_KEY) {
                None => None,
                Some(Value::Array(entries)) => Some(parse_exports(idx, entries)?),
                Some(_) => {
                    return Err(AnalysisError::malformed(format!(
                        "regions[{idx}].{EXPORTS_KEY} must be an array"
                    )));
                }
            };
            if let (Some(name), Some(exports)) = (name, exports) {
                sieve.add(name, exports);
            }
        }
        Ok(sieve)
    }

    fn add(&mut self, region: &str, exports: Vec<String>) {
        match self.regions.iter_mut().find(|r| r.name == region) {
            Some(existing) => existing.exports.extend(exports),
            None => self.regions.push(Region {
                name: region.to_string(),
                exports: exports.into_iter().collect(),
            }),
        }
    }

    /// Removes `name` from every region, whichever region declared it.
    pub fn remove(&mut self, name: &str) {
        for region in &mut self.regions {
            region.exports.remove(name);
        }
    }

    /// Region names in declaration order.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|region| region.name.as_str())
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Current exports of `region`; an unknown region has none.
    pub fn exports_of(&self, region: &str) -> &BTreeSet<String> {
        self.regions
            .iter()
            .find(|r| r.name == region)
            .map(|r| &r.exports)
            .unwrap_or(&NO_EXPORTS)
    }

    pub fn declares(&self, region: &str, name: &str) -> bool {
        self.exports_of(region).contains(name)
    }

    pub fn is_exhausted(&self) -> bool {
        self.regions.iter().all(|region| region.exports.is_empty())
    }
}

fn parse_exports(idx: usize, entries: &[Value]) -> Result<Vec<String>, AnalysisError> {
    let mut exports = Vec::with_capacity(entries.len());
    for (pos, entry) in entries.iter().enumerate() {
        let Some(export) = entry.as_str() else {
            return Err(AnalysisError::malformed(format!(
                "regions[{idx}].{EXPORTS_KEY}[{pos}] must be a string"
            )));
        };
        if export.is_empty() || export.starts_with(COMMENT_MARKER) {
            continue;
        }
        exports.push(export.to_string());
    }
    Ok(exports)
}

impl fmt::Display for VisibilitySieve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for region in &self.regions {
            let exports: Vec<&str> = region.exports.iter().map(String::as_str).collect();
            writeln!(f, "{}: [{}]", region.name, exports.join(", "))?;
        }
        Ok(())
    }
}
