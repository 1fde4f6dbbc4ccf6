//! End-to-end packaging tests.
//!
//! These drive the full sdist and wheel pipelines against a fixture project,
//! with the native build step replaced by an in-process stub.

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use flate2::read::GzDecoder;
use tar::Archive;
use tempfile::TempDir;

use natdist_core::{BuildOptions, CoreError, NativeBuilder, build_sdist, build_wheel};

/// Build stub that drops a fake compiled artifact into the staging tree.
struct StubBuilder {
  called: AtomicBool,
}

impl StubBuilder {
  fn new() -> Self {
    Self { called: AtomicBool::new(false) }
  }

  fn was_called(&self) -> bool {
    self.called.load(Ordering::SeqCst)
  }
}

impl NativeBuilder for StubBuilder {
  fn build(
    &self,
    _project_root: &Path,
    staging_dir: &Path,
    _build_dir: &Path,
  ) -> natdist_core::Result<()> {
    self.called.store(true, Ordering::SeqCst);
    fs::write(staging_dir.join("integration_pkg").join("native.so"), b"\x7fELF")?;
    Ok(())
  }
}

/// Fixture project: pyproject.toml, build files, a license, and one package.
fn fixture_project() -> TempDir {
  let temp = TempDir::new().unwrap();
  let root = temp.path();

  fs::write(
    root.join("pyproject.toml"),
    r#"
[project]
name = "integration-pkg"
version = "0.1.0"
license-files = ["LICENSE"]
"#,
  )
  .unwrap();
  fs::write(root.join("CMakeLists.txt"), "project(integration_pkg)\n").unwrap();
  fs::write(root.join("conanfile.py"), "from conan import ConanFile\n").unwrap();
  fs::write(root.join("LICENSE"), "MIT\n").unwrap();
  fs::create_dir_all(root.join("src/integration_pkg")).unwrap();
  fs::write(root.join("src/integration_pkg/__init__.py"), "").unwrap();

  temp
}

fn read_sdist_entries(archive_path: &Path) -> Vec<(String, Vec<u8>)> {
  let file = fs::File::open(archive_path).unwrap();
  let mut archive = Archive::new(GzDecoder::new(file));
  let mut out = Vec::new();
  for entry in archive.entries().unwrap() {
    let mut entry = entry.unwrap();
    let name = entry.path().unwrap().to_string_lossy().into_owned();
    let mut data = Vec::new();
    entry.read_to_end(&mut data).unwrap();
    out.push((name, data));
  }
  out
}

fn read_wheel_file(wheel_path: &Path, name: &str) -> String {
  let file = fs::File::open(wheel_path).unwrap();
  let mut zip = zip::ZipArchive::new(file).unwrap();
  let mut entry = zip.by_name(name).unwrap();
  let mut out = String::new();
  entry.read_to_string(&mut out).unwrap();
  out
}

/// Trim trailing whitespace per line plus any trailing newlines.
fn trimmed(text: &str) -> String {
  let mut out: String = text
    .lines()
    .map(|l| l.trim_end())
    .collect::<Vec<_>>()
    .join("\n");
  while out.ends_with('\n') {
    out.pop();
  }
  out
}

#[test]
fn sdist_contains_exact_entry_set() {
  let project = fixture_project();
  let out = TempDir::new().unwrap();

  let archive = build_sdist(project.path(), out.path()).unwrap();
  assert_eq!(
    archive.file_name().unwrap().to_str().unwrap(),
    "integration-pkg-0.1.0.tar.gz"
  );

  let entries = read_sdist_entries(&archive);
  let names: BTreeSet<String> = entries.iter().map(|(n, _)| n.clone()).collect();
  let expected: BTreeSet<String> = [
    "integration-pkg-0.1.0/CMakeLists.txt",
    "integration-pkg-0.1.0/LICENSE",
    "integration-pkg-0.1.0/PKG-INFO",
    "integration-pkg-0.1.0/conanfile.py",
    "integration-pkg-0.1.0/pyproject.toml",
    "integration-pkg-0.1.0/src/integration_pkg/__init__.py",
  ]
  .into_iter()
  .map(String::from)
  .collect();
  assert_eq!(names, expected);

  let pkg_info = entries
    .iter()
    .find(|(n, _)| n == "integration-pkg-0.1.0/PKG-INFO")
    .map(|(_, d)| String::from_utf8(d.clone()).unwrap())
    .unwrap();
  assert!(pkg_info.contains("Name: integration-pkg"));
  assert!(pkg_info.contains("Version: 0.1.0"));
  assert!(pkg_info.contains("License-File: LICENSE"));
}

#[test]
fn sdist_and_wheel_metadata_are_identical() {
  let project = fixture_project();
  let sdist_out = TempDir::new().unwrap();
  let wheel_out = TempDir::new().unwrap();

  let sdist = build_sdist(project.path(), sdist_out.path()).unwrap();
  let pkg_info = read_sdist_entries(&sdist)
    .into_iter()
    .find(|(n, _)| n == "integration-pkg-0.1.0/PKG-INFO")
    .map(|(_, d)| String::from_utf8(d).unwrap())
    .unwrap();

  let builder = StubBuilder::new();
  let wheel = build_wheel(
    project.path(),
    wheel_out.path(),
    &BuildOptions::default(),
    &builder,
  )
  .unwrap();
  assert!(builder.was_called());
  assert_eq!(
    wheel.file_name().unwrap().to_str().unwrap(),
    "integration_pkg-0.1.0-py3-none-any.whl"
  );

  let metadata = read_wheel_file(&wheel, "integration_pkg-0.1.0.dist-info/METADATA");
  assert_eq!(trimmed(&pkg_info), trimmed(&metadata));
}

#[test]
fn wheel_contains_payload_and_licenses() {
  let project = fixture_project();
  let out = TempDir::new().unwrap();

  let builder = StubBuilder::new();
  let wheel = build_wheel(project.path(), out.path(), &BuildOptions::default(), &builder).unwrap();

  let file = fs::File::open(&wheel).unwrap();
  let mut zip = zip::ZipArchive::new(file).unwrap();
  let names: BTreeSet<String> = (0..zip.len())
    .map(|i| zip.by_index(i).unwrap().name().to_string())
    .collect();

  assert!(names.contains("integration_pkg/__init__.py"));
  assert!(names.contains("integration_pkg/native.so"));
  assert!(names.contains("integration_pkg-0.1.0.dist-info/METADATA"));
  assert!(names.contains("integration_pkg-0.1.0.dist-info/WHEEL"));
  assert!(names.contains("integration_pkg-0.1.0.dist-info/RECORD"));
  assert!(names.contains("integration_pkg-0.1.0.dist-info/licenses/LICENSE"));

  let record = read_wheel_file(&wheel, "integration_pkg-0.1.0.dist-info/RECORD");
  let last = record.lines().last().unwrap();
  assert!(last.starts_with("integration_pkg-0.1.0.dist-info/RECORD,,"));
}

#[test]
fn unmatched_license_pattern_fails_without_output() {
  let project = fixture_project();
  fs::write(
    project.path().join("pyproject.toml"),
    r#"
[project]
name = "integration-pkg"
version = "0.1.0"
license-files = ["nonexistent.txt"]
"#,
  )
  .unwrap();
  let out = TempDir::new().unwrap();

  let err = build_sdist(project.path(), out.path()).unwrap_err();
  assert!(matches!(err, CoreError::NoMatchingLicenseFiles(_)));
  assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn package_root_outside_project_fails_before_build() {
  let outer = TempDir::new().unwrap();
  let root = outer.path().join("project");
  fs::create_dir_all(&root).unwrap();
  fs::write(
    root.join("pyproject.toml"),
    r#"
[project]
name = "integration-pkg"
version = "0.1.0"

[tool.natdist.wheel]
packages = ["../other/pkg"]
"#,
  )
  .unwrap();
  fs::create_dir_all(outer.path().join("other/pkg")).unwrap();
  fs::write(outer.path().join("other/pkg/__init__.py"), "").unwrap();

  let out = TempDir::new().unwrap();
  let builder = StubBuilder::new();
  let err = build_wheel(&root, out.path(), &BuildOptions::default(), &builder).unwrap_err();
  assert!(matches!(err, CoreError::PackagePath { .. }));
  assert!(!builder.was_called());
  assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}
