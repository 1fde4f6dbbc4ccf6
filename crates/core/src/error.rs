//! Error types for natdist-core

use thiserror::Error;

/// Errors that can occur while assembling distribution artifacts
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse pyproject.toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(
        "dynamic = [\"version\"] but version could not be resolved. \
         Set [tool.natdist] version-file to a file with a module-level \
         __version__ = \"x.y.z\" assignment"
    )]
    UnresolvedDynamicVersion,

    #[error(
        "Invalid license-files pattern '{0}': patterns must be relative and must not contain '..'"
    )]
    InvalidLicensePattern(String),

    #[error("license-files pattern '{0}' matched no files under the project root")]
    NoMatchingLicenseFiles(String),

    #[error("License file not found: {0}")]
    MissingLicenseFile(String),

    #[error("Package path error for '{path}': {message}")]
    PackagePath { path: String, message: String },

    #[error("Native build failed: {message}")]
    BuildTool {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
