//! natdist-core: artifact assembly for native Python distributions
//!
//! This crate packages a compiled native project into the two standard
//! distributable artifacts: a source archive (sdist) and a binary archive
//! (wheel), sharing one byte-identical metadata record between them.

mod backend;
mod config;
mod error;
mod license;
mod manifest;
mod metadata;
mod record;
mod sdist;
mod stage;
mod version;
mod wheel;

pub use backend::{BuildOptions, ConanBuilder, NativeBuilder, build_sdist, build_wheel};
pub use config::{ProjectTable, PyProject, SdistSection, StringOrList, ToolConfig, WheelSection};
pub use error::CoreError;
pub use license::{ResolvedLicenseFile, copy_license_files, resolve_license_files};
pub use manifest::{
    ArchiveManifest, DEFAULT_EXCLUDE, DEFAULT_INCLUDE, ManifestEntry, build_manifest, is_excluded,
};
pub use metadata::{ProjectMetadata, canonicalize_name, resolve_metadata};
pub use record::{METADATA_VERSION, render_metadata};
pub use sdist::{PKG_INFO, write_sdist};
pub use stage::{PACKAGE_MARKER, stage_packages};
pub use version::read_version_literal;
pub use wheel::{DIST_INFO_SUFFIX, LICENSES_DIR, WheelTags, create_dist_info, write_wheel};

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
