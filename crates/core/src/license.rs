//! License file resolution
//!
//! Expands the declared `license-files` glob patterns into a concrete,
//! ordered, deduplicated file list, and copies the files into the wheel's
//! license-storage subdirectory.

use globset::GlobBuilder;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::manifest::forward_slashes;
use crate::{CoreError, Result};

/// A declared license file resolved to a concrete path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLicenseFile {
    /// Canonical absolute path
    pub source: PathBuf,
    /// Path relative to the project root; also the destination layout under
    /// the license-storage subdirectory
    pub relative: PathBuf,
}

impl ResolvedLicenseFile {
    /// Relative path with forward slashes, as written to the metadata record
    pub fn record_path(&self) -> String {
        forward_slashes(&self.relative)
    }
}

/// Expand license-file patterns against the project root.
///
/// Matches are canonicalized and rejected if they escape the project root.
/// Every pattern must match at least one real file. Order is first-match
/// order of pattern expansion, deduplicated by canonical path.
pub fn resolve_license_files(
    patterns: &[String],
    project_root: &Path,
) -> Result<Vec<ResolvedLicenseFile>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    let root = dunce::canonicalize(project_root)?;
    // One deterministic snapshot of the tree; patterns are applied in order
    let files = collect_files(&root)?;

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut resolved = Vec::new();

    for pattern in patterns {
        validate_pattern(pattern)?;
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()?
            .compile_matcher();

        let mut matched_any = false;
        for (abs, rel) in &files {
            if !matcher.is_match(rel) {
                continue;
            }
            let canonical = dunce::canonicalize(abs)?;
            // Symlink targets must stay inside the project root
            if !canonical.starts_with(&root) {
                return Err(CoreError::InvalidLicensePattern(pattern.clone()));
            }
            matched_any = true;
            if seen.insert(canonical.clone()) {
                debug!("License file: {}", rel.display());
                resolved.push(ResolvedLicenseFile {
                    source: canonical,
                    relative: rel.clone(),
                });
            }
        }

        if !matched_any {
            return Err(CoreError::NoMatchingLicenseFiles(pattern.clone()));
        }
    }

    Ok(resolved)
}

/// Copy resolved license files into `dest_dir`, preserving their relative
/// directory structure. Existing copies are overwritten.
pub fn copy_license_files(files: &[ResolvedLicenseFile], dest_dir: &Path) -> Result<()> {
    for file in files {
        if !file.source.is_file() {
            return Err(CoreError::MissingLicenseFile(file.record_path()));
        }
        let dest = dest_dir.join(&file.relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&file.source, &dest)?;
        debug!(
            "Copied license file {} -> {}",
            file.source.display(),
            dest.display()
        );
    }
    Ok(())
}

/// Patterns must be root-relative and must not traverse upward
fn validate_pattern(pattern: &str) -> Result<()> {
    let path = Path::new(pattern);
    if path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
    {
        return Err(CoreError::InvalidLicensePattern(pattern.to_string()));
    }
    Ok(())
}

/// All files under `root` in name-sorted order, as (absolute, relative) pairs.
/// Symlinks are kept as candidates; their targets are checked by the caller.
fn collect_files(root: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let is_file = entry.file_type().is_file()
            || (entry.file_type().is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        files.push((entry.path().to_path_buf(), rel));
    }
    Ok(files)
}
