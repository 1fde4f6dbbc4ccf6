//! Packaging pipeline
//!
//! Runs the strict sequence resolve metadata -> resolve license files ->
//! render the metadata record -> build the manifest / stage the payload ->
//! write the archive, and owns the seam to the external native build tool.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::PyProject;
use crate::license::resolve_license_files;
use crate::manifest::{DEFAULT_EXCLUDE, DEFAULT_INCLUDE, build_manifest};
use crate::metadata::resolve_metadata;
use crate::record::render_metadata;
use crate::sdist::write_sdist;
use crate::stage::stage_packages;
use crate::wheel::{WheelTags, create_dist_info, write_wheel};
use crate::{CoreError, Result};

/// The external native build collaborator.
///
/// Implementations install the compiled outputs into `staging_dir` and keep
/// the build tree under `build_dir`; failures must surface as errors.
pub trait NativeBuilder {
    fn build(&self, project_root: &Path, staging_dir: &Path, build_dir: &Path) -> Result<()>;
}

/// Conan invoked as a subprocess
#[derive(Debug, Clone)]
pub struct ConanBuilder {
    pub host_profile: String,
    pub build_profile: String,
}

impl Default for ConanBuilder {
    fn default() -> Self {
        Self {
            host_profile: "default".to_string(),
            build_profile: "default".to_string(),
        }
    }
}

impl NativeBuilder for ConanBuilder {
    fn build(&self, project_root: &Path, staging_dir: &Path, build_dir: &Path) -> Result<()> {
        info!(
            "Running conan build (profiles: host={}, build={})",
            self.host_profile, self.build_profile
        );

        // -of <staging>: the package folder, so the install step lands there.
        // build_folder keeps the build tree out of the staging directory.
        let output = Command::new("conan")
            .arg("build")
            .arg(".")
            .arg("-of")
            .arg(staging_dir)
            .arg("-c")
            .arg(format!(
                "tools.cmake.cmake_layout:build_folder={}",
                build_dir.display()
            ))
            .arg("-c")
            .arg("tools.cmake.cmaketoolchain:user_presets=")
            .arg("--build=missing")
            .arg(format!("-pr:h={}", self.host_profile))
            .arg(format!("-pr:b={}", self.build_profile))
            .current_dir(project_root)
            .output()
            .map_err(|e| CoreError::BuildTool {
                message: "failed to invoke conan".to_string(),
                source: Some(e),
            })?;

        if !output.status.success() {
            return Err(CoreError::BuildTool {
                message: format!(
                    "conan build exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                source: None,
            });
        }
        Ok(())
    }
}

/// Options for a wheel build. Build-tool profiles live on the
/// [`NativeBuilder`] implementation, not here.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Persistent build directory; a temporary one scoped to the invocation
    /// is used when unset
    pub build_dir: Option<PathBuf>,
    pub tags: WheelTags,
}

/// Invocation-scoped base directory: persistent when configured, otherwise
/// a temp directory removed on every exit path
enum BaseDir {
    Persistent(PathBuf),
    Temporary(TempDir),
}

impl BaseDir {
    fn create(build_dir: Option<&Path>) -> Result<Self> {
        match build_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                debug!("Using persistent build directory: {}", dir.display());
                Ok(Self::Persistent(dir.to_path_buf()))
            }
            None => Ok(Self::Temporary(TempDir::new()?)),
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Persistent(path) => path,
            Self::Temporary(temp) => temp.path(),
        }
    }
}

/// Build the source archive for `project_root` into `out_dir`.
pub fn build_sdist(project_root: &Path, out_dir: &Path) -> Result<PathBuf> {
    let pyproject = PyProject::load(project_root)?;
    let tool = pyproject.tool();
    let meta = resolve_metadata(&pyproject.project, project_root, tool)?;
    let licenses = resolve_license_files(&meta.license_files, project_root)?;
    let block = render_metadata(&meta, &licenses);

    let stem = meta.sdist_stem();
    info!("Building sdist: {stem}.tar.gz");

    let include: Vec<String> = DEFAULT_INCLUDE
        .iter()
        .map(|s| s.to_string())
        .chain(tool.sdist.include.iter().cloned())
        .collect();
    let exclude: Vec<String> = DEFAULT_EXCLUDE
        .iter()
        .map(|s| s.to_string())
        .chain(tool.sdist.exclude.iter().cloned())
        .collect();

    let mut manifest = build_manifest(project_root, &stem, &include, &exclude)?;

    // License files are always embedded, even when no include rule matched
    for license in &licenses {
        if !license.source.is_file() {
            return Err(CoreError::MissingLicenseFile(license.record_path()));
        }
        manifest.insert(
            license.source.clone(),
            format!("{}/{}", stem, license.record_path()),
        );
    }

    write_sdist(out_dir, &stem, &manifest, &block)
}

/// Build the binary archive for `project_root` into `out_dir`, delegating
/// the native compile step to `builder`.
pub fn build_wheel(
    project_root: &Path,
    out_dir: &Path,
    options: &BuildOptions,
    builder: &dyn NativeBuilder,
) -> Result<PathBuf> {
    let pyproject = PyProject::load(project_root)?;
    let tool = pyproject.tool();
    let meta = resolve_metadata(&pyproject.project, project_root, tool)?;
    let licenses = resolve_license_files(&meta.license_files, project_root)?;
    let block = render_metadata(&meta, &licenses);

    info!("Building wheel for {}", meta.dist_name());

    let base = BaseDir::create(options.build_dir.as_deref())?;
    let staging = base.path().join("package");
    fs::create_dir_all(&staging)?;

    stage_packages(
        project_root,
        &staging,
        tool.wheel.packages.as_deref(),
        &meta.dist_name(),
    )?;
    builder.build(project_root, &staging, &base.path().join("build"))?;

    create_dist_info(&staging, &meta, &block, &licenses)?;
    write_wheel(&staging, out_dir, &meta, &options.tags)
}
