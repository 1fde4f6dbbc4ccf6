//! Archive manifest construction
//!
//! Computes the ordered set of (source path, archive path) pairs embedded in
//! the source archive, under glob-based include/exclude rules. Archive paths
//! are unique (first occurrence wins) and always use forward slashes.

use globset::GlobBuilder;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::Result;

/// Include rules every project layout gets by default
pub const DEFAULT_INCLUDE: &[&str] = &[
    "pyproject.toml",
    "CMakeLists.txt",
    "conanfile.py",
    "cmake",
    "src",
    "include",
    "README.md",
    "README.rst",
    "LICENSE",
];

/// Exclude rules applied to every candidate file
pub const DEFAULT_EXCLUDE: &[&str] = &[
    "__pycache__",
    "*.pyc",
    "*.pyo",
    ".git",
    ".gitignore",
    "build",
    "dist",
    "*.egg-info",
    ".eggs",
];

/// One file selected for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Absolute source path on disk
    pub source: PathBuf,
    /// Destination inside the archive, forward slashes
    pub archive_path: String,
}

/// Ordered file manifest with unique archive paths
#[derive(Debug, Clone, Default)]
pub struct ArchiveManifest {
    entries: Vec<ManifestEntry>,
    seen: HashSet<String>,
}

impl ArchiveManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair. A later duplicate of an archive path is silently
    /// skipped; returns whether the entry was added.
    pub fn insert(&mut self, source: PathBuf, archive_path: String) -> bool {
        if self.seen.contains(&archive_path) {
            return false;
        }
        self.seen.insert(archive_path.clone());
        self.entries.push(ManifestEntry {
            source,
            archive_path,
        });
        true
    }

    pub fn contains(&self, archive_path: &str) -> bool {
        self.seen.contains(archive_path)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the manifest for `project_root`, evaluating `include_rules` in
/// order. Every archive path is `<prefix>/<relative-path>`.
pub fn build_manifest(
    project_root: &Path,
    prefix: &str,
    include_rules: &[String],
    exclude_rules: &[String],
) -> Result<ArchiveManifest> {
    let mut manifest = ArchiveManifest::new();

    for rule in include_rules {
        let rule = rule.trim();
        if rule.contains('*') || rule.contains('?') {
            expand_glob_rule(project_root, prefix, rule, exclude_rules, &mut manifest)?;
        } else {
            expand_literal_rule(project_root, prefix, rule, exclude_rules, &mut manifest)?;
        }
    }

    debug!("Manifest: {} file(s) under {}/", manifest.len(), prefix);
    Ok(manifest)
}

/// Exclude semantics: a leading `*` matches by file-name suffix; any other
/// rule matches the file name exactly or any segment of the relative path
/// (so a matching directory excludes everything beneath it).
pub fn is_excluded(relative: &Path, exclude_rules: &[String]) -> bool {
    let name = relative.file_name().unwrap_or_default();
    for rule in exclude_rules {
        if let Some(suffix) = rule.strip_prefix('*') {
            if name.to_string_lossy().ends_with(suffix) {
                return true;
            }
        } else if name == OsStr::new(rule) || relative.iter().any(|seg| seg == OsStr::new(rule)) {
            return true;
        }
    }
    false
}

/// Render a relative path with forward slashes regardless of host convention
pub(crate) fn forward_slashes(path: &Path) -> String {
    let parts: Vec<_> = path.iter().map(|c| c.to_string_lossy()).collect();
    parts.join("/")
}

fn archive_path(prefix: &str, relative: &Path) -> String {
    format!("{}/{}", prefix, forward_slashes(relative))
}

/// A literal rule names a file or a directory; missing paths are tolerated
fn expand_literal_rule(
    project_root: &Path,
    prefix: &str,
    rule: &str,
    exclude_rules: &[String],
    manifest: &mut ArchiveManifest,
) -> Result<()> {
    let path = project_root.join(rule);
    if path.is_file() {
        let relative = PathBuf::from(rule);
        if !is_excluded(&relative, exclude_rules) {
            manifest.insert(path, archive_path(prefix, &relative));
        }
    } else if path.is_dir() {
        for entry in WalkDir::new(&path).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(project_root)
                .unwrap_or(entry.path())
                .to_path_buf();
            if is_excluded(&relative, exclude_rules) {
                continue;
            }
            manifest.insert(entry.path().to_path_buf(), archive_path(prefix, &relative));
        }
    }
    Ok(())
}

/// A glob rule is expanded against the whole project tree in sorted order
fn expand_glob_rule(
    project_root: &Path,
    prefix: &str,
    rule: &str,
    exclude_rules: &[String],
    manifest: &mut ArchiveManifest,
) -> Result<()> {
    let matcher = GlobBuilder::new(rule)
        .literal_separator(true)
        .build()?
        .compile_matcher();

    for entry in WalkDir::new(project_root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(project_root)
            .unwrap_or(entry.path())
            .to_path_buf();
        if !matcher.is_match(&relative) || is_excluded(&relative, exclude_rules) {
            continue;
        }
        manifest.insert(entry.path().to_path_buf(), archive_path(prefix, &relative));
    }
    Ok(())
}
