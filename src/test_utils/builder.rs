//! A fluent builder for the common case: a project directory with a
//! `Cartfile` (and optionally a `Cartfile.resolved`) plus a ready [`Session`]
//! pointed at an isolated cache directory.

use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::GlobalConfig;
use crate::core::Session;

/// Builder for [`TestEnvironment`].
pub struct TestEnvironmentBuilder {
    temp_dir: TempDir,
    project_dir: PathBuf,
    cache_dir: PathBuf,
    cartfile: Option<String>,
    resolved: Option<String>,
    files: Vec<(String, String)>,
}

impl TestEnvironmentBuilder {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        let cache_dir = temp_dir.path().join("cache");

        Ok(Self {
            temp_dir,
            project_dir,
            cache_dir,
            cartfile: None,
            resolved: None,
            files: Vec::new(),
        })
    }

    /// Sets the `Cartfile` contents.
    #[must_use]
    pub fn with_cartfile(mut self, content: impl Into<String>) -> Self {
        self.cartfile = Some(content.into());
        self
    }

    /// Sets the `Cartfile.resolved` contents.
    #[must_use]
    pub fn with_resolved(mut self, content: impl Into<String>) -> Self {
        self.resolved = Some(content.into());
        self
    }

    /// Adds an arbitrary file, relative to the project directory.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    pub fn build(self) -> Result<TestEnvironment> {
        std::fs::create_dir_all(&self.project_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;

        let cartfile_path = self.project_dir.join("Cartfile");
        if let Some(content) = &self.cartfile {
            std::fs::write(&cartfile_path, content)?;
        }

        let resolved_path = self.project_dir.join("Cartfile.resolved");
        if let Some(content) = &self.resolved {
            std::fs::write(&resolved_path, content)?;
        }

        for (path, content) in &self.files {
            let full_path = self.project_dir.join(path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full_path, content)?;
        }

        let session = Session::new(GlobalConfig {
            cache_root: Some(self.cache_dir.clone()),
            ..GlobalConfig::default()
        })?;

        Ok(TestEnvironment {
            _temp_dir: self.temp_dir,
            project_dir: self.project_dir,
            session,
            cartfile_path,
            resolved_path,
        })
    }
}

/// A built test environment: an isolated project directory plus a [`Session`]
/// whose cache root lives alongside it.
pub struct TestEnvironment {
    _temp_dir: TempDir,
    pub project_dir: PathBuf,
    pub session: Session,
    pub cartfile_path: PathBuf,
    pub resolved_path: PathBuf,
}

impl TestEnvironment {
    pub fn builder() -> Result<TestEnvironmentBuilder> {
        TestEnvironmentBuilder::new()
    }

    pub fn new() -> Result<Self> {
        TestEnvironmentBuilder::new()?.build()
    }

    #[must_use]
    pub fn file_exists(&self, path: impl AsRef<std::path::Path>) -> bool {
        self.project_dir.join(path).exists()
    }

    pub fn read_file(&self, path: impl AsRef<std::path::Path>) -> Result<String> {
        Ok(std::fs::read_to_string(self.project_dir.join(path))?)
    }

    pub fn write_file(&self, path: impl AsRef<std::path::Path>, content: impl AsRef<str>) -> Result<()> {
        let full_path = self.project_dir.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full_path, content.as_ref())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creates_environment() {
        let env = TestEnvironment::builder()
            .unwrap()
            .with_file("test.txt", "test content")
            .with_file("dir/nested.txt", "nested content")
            .build()
            .unwrap();

        assert!(env.file_exists("test.txt"));
        assert!(env.file_exists("dir/nested.txt"));
        assert_eq!(env.read_file("test.txt").unwrap(), "test content");
        assert_eq!(env.read_file("dir/nested.txt").unwrap(), "nested content");
    }

    #[test]
    fn test_builder_with_cartfile() {
        let env = TestEnvironmentBuilder::new()
            .unwrap()
            .with_cartfile("github \"example-org/Alamofire\" ~> 1.0\n")
            .build()
            .unwrap();

        assert!(env.file_exists("Cartfile"));
        assert!(env.session.cache_root.exists());
    }
}
