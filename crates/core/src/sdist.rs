//! Source archive writer
//!
//! Serializes a manifest into a gzip-compressed tar stream, then appends the
//! metadata record as a synthetic `PKG-INFO` entry at the archive root.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::{Builder, Header};
use tracing::info;

use crate::Result;
use crate::manifest::ArchiveManifest;

/// Record name of the synthetic metadata entry
pub const PKG_INFO: &str = "PKG-INFO";

/// Write the source archive `<stem>.tar.gz` into `out_dir`.
///
/// Entries are written in manifest order with the metadata record appended
/// last as `<stem>/PKG-INFO`. The archive is written under a temporary name
/// and renamed on success, so a failed run leaves nothing in `out_dir`.
pub fn write_sdist(
    out_dir: &Path,
    stem: &str,
    manifest: &ArchiveManifest,
    metadata_block: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let filename = format!("{stem}.tar.gz");
    let final_path = out_dir.join(&filename);
    let tmp_path = out_dir.join(format!(".{filename}.tmp"));

    if let Err(err) = write_archive(&tmp_path, stem, manifest, metadata_block) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    fs::rename(&tmp_path, &final_path)?;

    info!("Built sdist: {}", filename);
    Ok(final_path)
}

fn write_archive(
    path: &Path,
    stem: &str,
    manifest: &ArchiveManifest,
    metadata_block: &str,
) -> Result<()> {
    let file = File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut tar = Builder::new(encoder);

    for entry in manifest.entries() {
        tar.append_path_with_name(&entry.source, &entry.archive_path)?;
    }

    // Synthetic metadata record, always the final entry. GNU-format headers
    // (the tar crate's long-name extension) stand in for pax here; installers
    // accept both and names round-trip either way.
    let data = metadata_block.as_bytes();
    let mut header = Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    tar.append_data(&mut header, format!("{stem}/{PKG_INFO}"), data)?;

    let encoder = tar.into_inner()?;
    encoder.finish()?;
    Ok(())
}
