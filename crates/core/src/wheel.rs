//! Binary archive (wheel) writer
//!
//! Consumes a staged file tree, the shared metadata record, the resolved
//! license files, and a platform tag triple, and emits the final zip-based
//! wheel. Tag resolution itself is a caller concern; this module only
//! consumes the final triple.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::Result;
use crate::license::{ResolvedLicenseFile, copy_license_files};
use crate::manifest::forward_slashes;
use crate::metadata::ProjectMetadata;

/// Suffix of the wheel metadata directory
pub const DIST_INFO_SUFFIX: &str = "dist-info";
/// License-storage subdirectory inside the metadata directory
pub const LICENSES_DIR: &str = "licenses";

/// Platform compatibility tag triple encoded into the wheel filename
///
/// An explicit configuration object by design: callers resolve it (from
/// overrides or detection) and pass it in; nothing here reads the process
/// environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelTags {
    /// Interpreter tag, e.g. `cp312` or `py3`
    pub pyver: String,
    /// ABI tag, e.g. `cp312`, `abi3`, `none`
    pub abi: String,
    /// Platform tag, e.g. `manylinux_2_28_x86_64`, `win_amd64`
    pub arch: String,
}

impl Default for WheelTags {
    fn default() -> Self {
        Self {
            pyver: "py3".to_string(),
            abi: "none".to_string(),
            arch: "any".to_string(),
        }
    }
}

impl WheelTags {
    /// The `<pyver>-<abi>-<arch>` form used in filenames and the WHEEL file
    pub fn tag(&self) -> String {
        format!("{}-{}-{}", self.pyver, self.abi, self.arch)
    }
}

/// Create `<dist_name>-<version>.dist-info/` inside the staging tree.
///
/// Writes the shared metadata record verbatim as `METADATA` and copies the
/// resolved license files under `licenses/`, preserving their structure.
pub fn create_dist_info(
    staging_dir: &Path,
    meta: &ProjectMetadata,
    metadata_block: &str,
    licenses: &[ResolvedLicenseFile],
) -> Result<PathBuf> {
    let dist_info = staging_dir.join(format!("{}.{}", meta.dist_stem(), DIST_INFO_SUFFIX));
    fs::create_dir_all(&dist_info)?;

    fs::write(dist_info.join("METADATA"), metadata_block)?;
    if !licenses.is_empty() {
        copy_license_files(licenses, &dist_info.join(LICENSES_DIR))?;
    }

    debug!("Created {}", dist_info.display());
    Ok(dist_info)
}

/// Write the wheel for the staged tree into `out_dir`.
///
/// Adds the `WHEEL` and `RECORD` files to the dist-info directory, then zips
/// the whole staging tree in sorted order with forward-slash names. The
/// archive is written under a temporary name and renamed on success.
pub fn write_wheel(
    staging_dir: &Path,
    out_dir: &Path,
    meta: &ProjectMetadata,
    tags: &WheelTags,
) -> Result<PathBuf> {
    let dist_info = staging_dir.join(format!("{}.{}", meta.dist_stem(), DIST_INFO_SUFFIX));
    fs::create_dir_all(&dist_info)?;

    let wheel_file = format!(
        "Wheel-Version: 1.0\nGenerator: natdist {}\nRoot-Is-Purelib: false\nTag: {}\n",
        env!("CARGO_PKG_VERSION"),
        tags.tag()
    );
    fs::write(dist_info.join("WHEEL"), wheel_file)?;

    write_record(staging_dir, &dist_info)?;

    fs::create_dir_all(out_dir)?;
    let filename = format!("{}-{}.whl", meta.dist_stem(), tags.tag());
    let final_path = out_dir.join(&filename);
    let tmp_path = out_dir.join(format!(".{filename}.tmp"));

    if let Err(err) = write_zip(&tmp_path, staging_dir) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    fs::rename(&tmp_path, &final_path)?;

    info!("Built wheel: {}", filename);
    Ok(final_path)
}

/// `RECORD`: one line per archived file with its sha256 digest and size;
/// the RECORD entry itself is listed last with empty fields.
fn write_record(staging_dir: &Path, dist_info: &Path) -> Result<()> {
    let record_rel = {
        let name = dist_info.file_name().unwrap_or_default().to_string_lossy();
        format!("{name}/RECORD")
    };

    let mut record = String::new();
    for (path, rel) in staged_files(staging_dir)? {
        if rel == record_rel {
            continue;
        }
        let data = fs::read(&path)?;
        let digest = URL_SAFE_NO_PAD.encode(Sha256::digest(&data));
        record.push_str(&format!("{rel},sha256={digest},{}\n", data.len()));
    }
    record.push_str(&format!("{record_rel},,\n"));

    fs::write(dist_info.join("RECORD"), record)?;
    Ok(())
}

fn write_zip(path: &Path, staging_dir: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (source, rel) in staged_files(staging_dir)? {
        zip.start_file(rel, options)?;
        zip.write_all(&fs::read(&source)?)?;
    }

    zip.finish()?;
    Ok(())
}

/// All files under the staging tree in name-sorted order, with
/// forward-slash relative names
fn staged_files(staging_dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(staging_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(staging_dir)
            .unwrap_or(entry.path());
        files.push((entry.path().to_path_buf(), forward_slashes(rel)));
    }
    Ok(files)
}
