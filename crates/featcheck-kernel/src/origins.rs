//! Origin tracking: which units introduced a module, and which regions each
//! unit contributes.
//!
//! The index is persisted by whatever assembled the deployable, as two
//! properties files inside the configured storage directory:
//!
//! ```text
//! bundleOrigins.properties   module symbolic name -> unit,unit,...
//! regionOrigins.properties   unit                 -> region,region,...
//! ```
//!
//! A missing directory or file is an empty table. A module or unit without
//! an entry carries no region constraint, which is not the same as an entry
//! listing zero regions.

use crate::error::AnalysisError;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub const MODULE_ORIGINS_FILE: &str = "bundleOrigins.properties";
pub const REGION_ORIGINS_FILE: &str = "regionOrigins.properties";

pub type OriginTable = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginIndex {
    module_units: OriginTable,
    unit_regions: OriginTable,
}

impl OriginIndex {
    pub fn new(module_units: OriginTable, unit_regions: OriginTable) -> Self {
        Self {
            module_units,
            unit_regions,
        }
    }

    /// Reads both tables from `storage`. `None` means no origin store.
    pub fn load(storage: Option<&Path>) -> Result<Self, AnalysisError> {
        let Some(dir) = storage else {
            return Ok(Self::default());
        };
        Ok(Self {
            module_units: read_table(dir, MODULE_ORIGINS_FILE)?,
            unit_regions: read_table(dir, REGION_ORIGINS_FILE)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.module_units.is_empty() && self.unit_regions.is_empty()
    }

    pub fn units_of(&self, module: &str) -> Option<&BTreeSet<String>> {
        self.module_units.get(module)
    }

    pub fn regions_of_unit(&self, unit: &str) -> Option<&BTreeSet<String>> {
        self.unit_regions.get(unit)
    }

    /// Union of the regions of every unit that introduced `module`.
    pub fn regions_of_module(&self, module: &str) -> BTreeSet<String> {
        self.units_of(module)
            .into_iter()
            .flatten()
            .filter_map(|unit| self.regions_of_unit(unit))
            .flatten()
            .cloned()
            .collect()
    }
}

fn read_table(dir: &Path, file_name: &str) -> Result<OriginTable, AnalysisError> {
    let path = dir.join(file_name);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "origin table absent");
        return Ok(OriginTable::new());
    }
    let raw = std::fs::read_to_string(&path).map_err(|source| AnalysisError::ReadOrigins {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_properties(&raw)
        .into_iter()
        .map(|(key, value)| (key, split_list(&value)))
        .collect())
}

fn split_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Parses Java-style properties text.
///
/// Supports `#`/`!` comment lines, `=`, `:` or whitespace separators,
/// backslash line continuation and backslash escapes (including `\uXXXX`).
/// A repeated key keeps its last value.
pub fn parse_properties(text: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }
        let mut logical = trimmed.to_string();
        while continues(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }
        let (key, value) = split_entry(&logical);
        entries.insert(key, value);
    }
    entries
}

fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let chars: Vec<char> = line.chars().collect();
    let mut idx = 0;
    let mut escaped = false;
    while idx < chars.len() {
        let c = chars[idx];
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            break;
        }
        idx += 1;
    }
    let key: String = chars[..idx].iter().collect();

    while idx < chars.len() && chars[idx].is_whitespace() {
        idx += 1;
    }
    if idx < chars.len() && (chars[idx] == '=' || chars[idx] == ':') {
        idx += 1;
    }
    while idx < chars.len() && chars[idx].is_whitespace() {
        idx += 1;
    }
    let value: String = chars[idx..].iter().collect();
    (unescape(&key), unescape(&value))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&hex),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    struct TempDirGuard {
        path: PathBuf,
    }

    impl TempDirGuard {
        fn new(prefix: &str) -> Self {
            let unique = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock should be after unix epoch")
                .as_nanos();
            let path = std::env::temp_dir().join(format!(
                "featcheck-origins-{prefix}-{}-{unique}",
                std::process::id()
            ));
            fs::create_dir_all(&path).expect("temp dir should be created");
            Self { path }
        }
    }

    impl Drop for TempDirGuard {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn properties_syntax() {
        let parsed = parse_properties(
            "# comment\n! also comment\n\na=1\nb : 2\nc 3\nd=x,\\\n   y\ne\\:f=g\nh=\\u0041\n",
        );
        assert_eq!(parsed.get("a").map(String::as_str), Some("1"));
        assert_eq!(parsed.get("b").map(String::as_str), Some("2"));
        assert_eq!(parsed.get("c").map(String::as_str), Some("3"));
        assert_eq!(parsed.get("d").map(String::as_str), Some("x,y"));
        assert_eq!(parsed.get("e:f").map(String::as_str), Some("g"));
        assert_eq!(parsed.get("h").map(String::as_str), Some("A"));
        assert_eq!(parsed.len(), 6);
    }

    #[test]
    fn missing_storage_is_empty() {
        assert!(OriginIndex::load(None).expect("load").is_empty());
        let dir = TempDirGuard::new("absent");
        let index = OriginIndex::load(Some(&dir.path.join("not-there"))).expect("load");
        assert!(index.is_empty());
    }

    #[test]
    fn loads_both_tables() {
        let dir = TempDirGuard::new("tables");
        fs::write(
            dir.path.join(MODULE_ORIGINS_FILE),
            "b1=g:f1:1\nb2=g:f1:1, g:f2:1\n",
        )
        .expect("write module origins");
        fs::write(
            dir.path.join(REGION_ORIGINS_FILE),
            "g\\:f1\\:1=global,internal\ng\\:f2\\:1=extra\n",
        )
        .expect("write region origins");

        let index = OriginIndex::load(Some(&dir.path)).expect("load");
        assert_eq!(index.units_of("b2"), Some(&set(&["g:f1:1", "g:f2:1"])));
        assert_eq!(
            index.regions_of_unit("g:f1:1"),
            Some(&set(&["global", "internal"]))
        );
        assert_eq!(
            index.regions_of_module("b2"),
            set(&["extra", "global", "internal"])
        );
        assert!(index.regions_of_module("unknown").is_empty());
        assert!(index.units_of("unknown").is_none());
    }

    #[test]
    fn unreadable_table_is_an_error() {
        let dir = TempDirGuard::new("unreadable");
        fs::create_dir_all(dir.path.join(MODULE_ORIGINS_FILE)).expect("dir in place of file");
        let err = OriginIndex::load(Some(&dir.path)).expect_err("load should fail");
        assert!(matches!(err, AnalysisError::ReadOrigins { .. }));
    }
}
