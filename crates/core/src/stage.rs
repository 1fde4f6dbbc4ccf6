//! Package-root staging for the binary artifact
//!
//! Validates the declared package roots and copies their trees into the
//! staging directory that later becomes the wheel payload.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::{CoreError, Result};

/// Marker file expected at each declared package root
pub const PACKAGE_MARKER: &str = "__init__.py";

/// Validate and copy the package roots into `staging_dir`.
///
/// `packages` comes from `[tool.natdist.wheel] packages`; the default is the
/// single root `src/<dist_name>`. Every root is validated before anything is
/// copied, so a bad declaration fails without touching the staging tree.
pub fn stage_packages(
    project_root: &Path,
    staging_dir: &Path,
    packages: Option<&[String]>,
    dist_name: &str,
) -> Result<Vec<PathBuf>> {
    let default_package = format!("src/{dist_name}");
    let declared: Vec<&str> = match packages {
        Some(list) if !list.is_empty() => list.iter().map(String::as_str).collect(),
        _ => vec![default_package.as_str()],
    };

    let mut validated = Vec::new();
    for package in &declared {
        validated.push(check_package_path(project_root, package)?);
    }

    let mut staged = Vec::new();
    for package_dir in validated {
        let name = package_dir
            .file_name()
            .ok_or_else(|| CoreError::PackagePath {
                path: package_dir.display().to_string(),
                message: "package root has no directory name".to_string(),
            })?;
        let dest = staging_dir.join(name);
        copy_tree(&package_dir, &dest)?;
        debug!("Staged package {} -> {}", package_dir.display(), dest.display());
        staged.push(dest);
    }
    Ok(staged)
}

/// A declared package root must stay inside the project, exist as a
/// directory, and carry the package marker file.
fn check_package_path(project_root: &Path, declared: &str) -> Result<PathBuf> {
    let declared_path = Path::new(declared);
    if declared_path.is_absolute()
        || declared_path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(CoreError::PackagePath {
            path: declared.to_string(),
            message: "package root must be inside the project root".to_string(),
        });
    }

    let candidate = project_root.join(declared_path);
    let package_dir = dunce::canonicalize(&candidate).map_err(|_| CoreError::PackagePath {
        path: declared.to_string(),
        message: "package root does not exist".to_string(),
    })?;

    let root = dunce::canonicalize(project_root)?;
    if !package_dir.starts_with(&root) {
        return Err(CoreError::PackagePath {
            path: declared.to_string(),
            message: "package root must be inside the project root".to_string(),
        });
    }
    if !package_dir.is_dir() {
        return Err(CoreError::PackagePath {
            path: declared.to_string(),
            message: "package root is not a directory".to_string(),
        });
    }
    if !package_dir.join(PACKAGE_MARKER).is_file() {
        return Err(CoreError::PackagePath {
            path: declared.to_string(),
            message: format!("package root must contain {PACKAGE_MARKER}"),
        });
    }

    Ok(package_dir)
}

/// Recursive copy; existing files are overwritten
fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
