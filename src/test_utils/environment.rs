//! A complete, disposable project + cache layout for integration-style tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::fixtures::{CartfileFixture, FileFixture, GitRepoFixture, ResolvedFixture};

/// A temp-backed project directory, a sibling directory of mock git sources,
/// and a sibling cache directory — the three locations a `bootstrap`/
/// `update`/`build` run touches.
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub project_dir: PathBuf,
    pub sources_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        let sources_dir = temp_dir.path().join("sources");
        let cache_dir = temp_dir.path().join("cache");

        fs::create_dir_all(&project_dir)?;
        fs::create_dir_all(&sources_dir)?;
        fs::create_dir_all(&cache_dir)?;

        Ok(Self {
            temp_dir,
            project_dir,
            sources_dir,
            cache_dir,
        })
    }

    /// A project with a single-dependency `Cartfile` and no resolved
    /// manifest yet.
    pub fn with_basic_manifest() -> Result<Self> {
        let env = Self::new()?;
        CartfileFixture::basic().write_to(&env.project_dir)?;
        Ok(env)
    }

    /// A project with a `Cartfile` and matching `Cartfile.resolved`, as if
    /// `bootstrap` had already run.
    pub fn with_manifest_and_resolved() -> Result<Self> {
        let env = Self::new()?;
        CartfileFixture::basic().write_to(&env.project_dir)?;
        ResolvedFixture::basic().write_to(&env.project_dir)?;
        Ok(env)
    }

    /// Initializes a tagged mock git repository under `sources_dir/<name>`
    /// and returns its path, suitable for a `Cartfile` line using a
    /// `file://` URL.
    pub fn add_mock_source(&self, name: &str, files: Vec<FileFixture>) -> Result<PathBuf> {
        let source_dir = self.sources_dir.join(name);
        let mut fixture = GitRepoFixture::new(source_dir.clone());
        for file in files {
            fixture = fixture.with_file(file);
        }
        fixture.init().context("initializing mock source repository")?;
        Ok(source_dir)
    }

    /// `file://` URL for a mock source created with [`Self::add_mock_source`].
    #[must_use]
    pub fn source_url(&self, name: &str) -> String {
        format!("file://{}", self.sources_dir.join(name).display())
    }

    #[must_use]
    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    #[must_use]
    pub fn sources_path(&self) -> &Path {
        &self.sources_dir
    }

    #[must_use]
    pub fn cache_path(&self) -> &Path {
        &self.cache_dir
    }

    pub fn create_file(&self, path: impl AsRef<Path>, content: &str) -> Result<PathBuf> {
        let full_path = self.project_dir.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, content)?;
        Ok(full_path)
    }

    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<String> {
        Ok(fs::read_to_string(self.project_dir.join(path))?)
    }

    #[must_use]
    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.project_dir.join(path).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_basic_manifest_writes_cartfile() {
        let env = TestEnvironment::with_basic_manifest().unwrap();
        assert!(env.file_exists("Cartfile"));
    }

    #[test]
    fn test_with_manifest_and_resolved_writes_both() {
        let env = TestEnvironment::with_manifest_and_resolved().unwrap();
        assert!(env.file_exists("Cartfile"));
        assert!(env.file_exists("Cartfile.resolved"));
    }

    #[test]
    fn test_add_mock_source_creates_tagged_repo() {
        let env = TestEnvironment::new().unwrap();
        let source_dir = env
            .add_mock_source("Alamofire", vec![FileFixture::new("README.md", "# Alamofire")])
            .unwrap();
        assert!(source_dir.join(".git").exists());
    }
}
