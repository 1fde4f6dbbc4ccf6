//! Project metadata resolution
//!
//! Turns the raw `[project]` table into a fully resolved [`ProjectMetadata`]:
//! a concrete version (explicit, read from a version file, or the tolerant
//! `0.0.0` fallback) and the name forms used for artifact naming.

use std::path::{Component, Path};
use tracing::debug;

use crate::config::{ProjectTable, ToolConfig};
use crate::version::read_version_literal;
use crate::{CoreError, Result};

/// Fully resolved project metadata
///
/// Once constructed, `version` is concrete and `dynamic` no longer lists it.
#[derive(Debug, Clone)]
pub struct ProjectMetadata {
    /// Raw declared name, used in the metadata record and sdist naming
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub requires_python: Option<String>,
    pub keywords: Vec<String>,
    /// Declared license-file glob patterns
    pub license_files: Vec<String>,
    /// Remaining dynamic fields after version resolution
    pub dynamic: Vec<String>,
}

impl ProjectMetadata {
    /// Canonical name: lower-cased, runs of `-`, `_`, `.` collapsed to `-`
    pub fn canonical_name(&self) -> String {
        canonicalize_name(&self.name)
    }

    /// Canonical name with `-` replaced by `_`, for wheel/dist-info naming
    pub fn dist_name(&self) -> String {
        self.canonical_name().replace('-', "_")
    }

    /// `<name>-<version>` using the raw declared name (sdist naming)
    pub fn sdist_stem(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// `<dist_name>-<version>` (wheel and dist-info naming)
    pub fn dist_stem(&self) -> String {
        format!("{}-{}", self.dist_name(), self.version)
    }
}

/// Standard package-name canonicalization
pub fn canonicalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_sep = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !prev_sep {
                out.push('-');
            }
            prev_sep = true;
        } else {
            out.extend(c.to_lowercase());
            prev_sep = false;
        }
    }
    out
}

/// Resolve raw `[project]` metadata against the project root and tool config
pub fn resolve_metadata(
    project: &ProjectTable,
    project_root: &Path,
    tool: &ToolConfig,
) -> Result<ProjectMetadata> {
    let name = project
        .name
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    let mut version = project.version.clone().filter(|v| !v.is_empty());
    if version.is_none() {
        version = version_from_tool_config(project_root, tool)?;
        if project.version_is_dynamic() && version.is_none() {
            return Err(CoreError::UnresolvedDynamicVersion);
        }
    }
    let version = version.unwrap_or_else(|| "0.0.0".to_string());
    debug!("Resolved {} version {}", name, version);

    let dynamic = project
        .dynamic
        .iter()
        .filter(|f| f.as_str() != "version")
        .cloned()
        .collect();

    Ok(ProjectMetadata {
        name,
        version,
        summary: project.description.clone(),
        requires_python: project.requires_python.clone(),
        keywords: project.keywords.clone(),
        license_files: project.license_file_patterns(),
        dynamic,
    })
}

/// Read the version from `[tool.natdist] version-file`, if configured.
///
/// The path must stay inside the project root; a missing file is merely
/// unresolved, an escaping path is a configuration error.
fn version_from_tool_config(project_root: &Path, tool: &ToolConfig) -> Result<Option<String>> {
    let Some(version_file) = &tool.version_file else {
        return Ok(None);
    };

    let relative = Path::new(version_file);
    if relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(CoreError::Config(format!(
            "version-file must be inside project: '{}'",
            version_file
        )));
    }

    let candidate = project_root.join(relative);
    match dunce::canonicalize(&candidate) {
        Ok(resolved) => {
            let root = dunce::canonicalize(project_root)?;
            if !resolved.starts_with(&root) {
                return Err(CoreError::Config(format!(
                    "version-file must be inside project: '{}'",
                    version_file
                )));
            }
            Ok(read_version_literal(&resolved))
        }
        // Missing file: unresolved, not an error
        Err(_) => Ok(None),
    }
}
