//! Golden range fixtures.
//!
//! A manifest is a TOML file with one `[[case]]` table per document:
//!
//! ```toml
//! [[case]]
//! id = "nested-bold"
//! input = '{\rtf1 {\b x}}'
//! expected = ["P0 \"x\"", "commit 0:0..0:1 bold=true"]
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoldenCase {
    pub id: String,
    pub input: String,
    /// Snapshot lines: paragraphs, then commits in emission order.
    pub expected: Vec<String>,
    /// Parse into an existing document instead of a fresh one.
    #[serde(default)]
    pub existing_document: bool,
    #[serde(default)]
    pub check_style_attrs: bool,
    /// Expected color table, one display string per entry.
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    /// Case is known to fail; a match fails the run so the flag gets removed.
    #[serde(default)]
    pub xfail: bool,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(rename = "case", default)]
    cases: Vec<GoldenCase>,
}

pub fn load_manifest(path: &Path) -> Vec<GoldenCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read golden manifest {path:?}: {err}"));
    let manifest: Manifest = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse golden manifest {path:?}: {err}"));
    let mut seen = std::collections::BTreeSet::new();
    for case in &manifest.cases {
        assert!(
            seen.insert(case.id.as_str()),
            "duplicate case id '{}' in {path:?}",
            case.id
        );
        assert!(
            !case.expected.is_empty(),
            "case '{}' in {path:?} has no expected lines",
            case.id
        );
    }
    manifest.cases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_cases_deserialize_with_defaults() {
        let manifest: Manifest = toml::from_str(
            r#"
            [[case]]
            id = "a"
            input = '{\rtf1 x}'
            expected = ['P0 "x"']
            "#,
        )
        .expect("manifest");
        assert_eq!(manifest.cases.len(), 1);
        let case = &manifest.cases[0];
        assert_eq!(case.input, "{\\rtf1 x}");
        assert!(!case.existing_document);
        assert!(case.colors.is_none());
    }
}
