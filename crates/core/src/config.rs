//! Declarative project configuration (`pyproject.toml`)
//!
//! Only the tables this backend consumes are modeled; everything else in the
//! file is ignored.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::{CoreError, Result};

/// Parsed `pyproject.toml`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PyProject {
    /// The `[project]` metadata table
    #[serde(default)]
    pub project: ProjectTable,
    #[serde(default)]
    tool: ToolTable,
}

impl PyProject {
    /// Load and parse `pyproject.toml` from the project root
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join("pyproject.toml");
        if !path.is_file() {
            return Err(CoreError::Config(format!(
                "pyproject.toml not found in {}",
                project_root.display()
            )));
        }
        let content = fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    /// The `[tool.natdist]` table (defaults if absent)
    pub fn tool(&self) -> &ToolConfig {
        &self.tool.natdist
    }
}

/// Raw `[project]` metadata as declared by the user
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectTable {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub requires_python: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub license_files: Option<StringOrList>,
    #[serde(default)]
    pub dynamic: Vec<String>,
}

impl ProjectTable {
    /// Declared license-file glob patterns, in declaration order
    pub fn license_file_patterns(&self) -> Vec<String> {
        match &self.license_files {
            Some(StringOrList::One(s)) => vec![s.clone()],
            Some(StringOrList::Many(v)) => v.clone(),
            None => Vec::new(),
        }
    }

    /// Whether `version` is declared as a dynamic (deferred) field
    pub fn version_is_dynamic(&self) -> bool {
        self.dynamic.iter().any(|f| f == "version")
    }
}

/// A value that may be written as a single string or a list of strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ToolTable {
    #[serde(default)]
    natdist: ToolConfig,
}

/// Overrides scoped to this packaging tool (`[tool.natdist]`)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ToolConfig {
    /// File to read a module-level `__version__` literal from
    pub version_file: Option<String>,
    #[serde(default)]
    pub wheel: WheelSection,
    #[serde(default)]
    pub sdist: SdistSection,
}

/// `[tool.natdist.wheel]`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WheelSection {
    /// Package roots to embed in the wheel (default: `src/<dist_name>`)
    pub packages: Option<Vec<String>>,
}

/// `[tool.natdist.sdist]`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SdistSection {
    /// Extra include rules, appended after the built-in defaults
    #[serde(default)]
    pub include: Vec<String>,
    /// Extra exclude rules, appended after the built-in defaults
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_pyproject(content: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("pyproject.toml"), content).unwrap();
        temp
    }

    #[test]
    fn test_load_minimal() {
        let temp = write_pyproject(
            r#"
[project]
name = "demo"
version = "1.2.3"
"#,
        );

        let config = PyProject::load(temp.path()).unwrap();
        assert_eq!(config.project.name.as_deref(), Some("demo"));
        assert_eq!(config.project.version.as_deref(), Some("1.2.3"));
        assert!(config.project.license_file_patterns().is_empty());
        assert!(config.tool().version_file.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = PyProject::load(temp.path()).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp = write_pyproject("this is not toml {{{");
        let err = PyProject::load(temp.path()).unwrap_err();
        assert!(matches!(err, CoreError::Toml(_)));
    }

    #[test]
    fn test_license_files_string_or_list() {
        let temp = write_pyproject(
            r#"
[project]
name = "demo"
license-files = "LICENSE"
"#,
        );
        let config = PyProject::load(temp.path()).unwrap();
        assert_eq!(config.project.license_file_patterns(), vec!["LICENSE"]);

        let temp = write_pyproject(
            r#"
[project]
name = "demo"
license-files = ["LICENSE", "licenses/*.txt"]
"#,
        );
        let config = PyProject::load(temp.path()).unwrap();
        assert_eq!(
            config.project.license_file_patterns(),
            vec!["LICENSE", "licenses/*.txt"]
        );
    }

    #[test]
    fn test_tool_config() {
        let temp = write_pyproject(
            r#"
[project]
name = "demo"
dynamic = ["version"]

[tool.natdist]
version-file = "src/demo/__init__.py"

[tool.natdist.wheel]
packages = ["src/demo"]

[tool.natdist.sdist]
include = ["extras/*.cfg"]
exclude = ["*.tmp"]
"#,
        );

        let config = PyProject::load(temp.path()).unwrap();
        assert!(config.project.version_is_dynamic());
        assert_eq!(
            config.tool().version_file.as_deref(),
            Some("src/demo/__init__.py")
        );
        assert_eq!(
            config.tool().wheel.packages.as_deref(),
            Some(&["src/demo".to_string()][..])
        );
        assert_eq!(config.tool().sdist.include, vec!["extras/*.cfg"]);
        assert_eq!(config.tool().sdist.exclude, vec!["*.tmp"]);
    }

    #[test]
    fn test_unknown_tables_are_ignored() {
        let temp = write_pyproject(
            r#"
[build-system]
requires = ["natdist"]

[project]
name = "demo"

[tool.other-tool]
setting = true
"#,
        );
        let config = PyProject::load(temp.path()).unwrap();
        assert_eq!(config.project.name.as_deref(), Some("demo"));
    }
}
