//! Core metadata record generation
//!
//! Renders the single canonical `Key: Value` metadata block. The same string
//! is embedded verbatim as the sdist `PKG-INFO` and the wheel `METADATA`;
//! both archive writers consume one rendering, they never re-render.

use crate::license::ResolvedLicenseFile;
use crate::metadata::ProjectMetadata;

/// Metadata format revision written to the record
pub const METADATA_VERSION: &str = "2.4";

/// Render the canonical metadata record.
///
/// Pure function: identical inputs produce byte-identical output. Field
/// order is fixed; one `License-File` line per resolved license file is
/// appended last, in resolver order, with forward-slash paths.
pub fn render_metadata(meta: &ProjectMetadata, licenses: &[ResolvedLicenseFile]) -> String {
    let mut out = String::new();
    push_field(&mut out, "Metadata-Version", METADATA_VERSION);
    push_field(&mut out, "Name", &meta.name);
    push_field(&mut out, "Version", &meta.version);
    if let Some(summary) = &meta.summary {
        push_field(&mut out, "Summary", summary);
    }
    if !meta.keywords.is_empty() {
        push_field(&mut out, "Keywords", &meta.keywords.join(","));
    }
    if let Some(requires_python) = &meta.requires_python {
        push_field(&mut out, "Requires-Python", requires_python);
    }
    for field in &meta.dynamic {
        push_field(&mut out, "Dynamic", field);
    }
    for license in licenses {
        push_field(&mut out, "License-File", &license.record_path());
    }
    out
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}
