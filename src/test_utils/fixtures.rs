//! Test fixtures for creating sample manifests, resolved manifests, and
//! mock git repositories.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A `Cartfile` (or `Cartfile.private`) fixture.
#[derive(Clone, Debug)]
pub struct CartfileFixture {
    pub content: String,
    pub name: String,
}

impl CartfileFixture {
    /// A single `github` dependency with a caret-compatible constraint.
    pub fn basic() -> Self {
        Self {
            name: "basic".to_string(),
            content: "github \"example-org/Alamofire\" ~> 1.0\n".to_string(),
        }
    }

    /// A mix of all three dependency kinds.
    pub fn mixed_kinds() -> Self {
        Self {
            name: "mixed_kinds".to_string(),
            content: concat!(
                "github \"example-org/Alamofire\" ~> 1.0\n",
                "git \"https://example.com/path/CoolFramework.git\" >= 2.0\n",
                "binary \"https://example.com/project.json\" == 1.3.0\n",
            )
            .to_string(),
        }
    }

    /// Two root dependencies pinned to incompatible requirements on the same
    /// transitive dependency, for resolver conflict tests.
    pub fn version_conflicts() -> Self {
        Self {
            name: "version_conflicts".to_string(),
            content: concat!(
                "github \"example-org/First\" == 1.0.0\n",
                "github \"example-org/Second\" == 2.0.0\n",
            )
            .to_string(),
        }
    }

    /// Malformed syntax: an unterminated quote.
    pub fn invalid_syntax() -> Self {
        Self {
            name: "invalid_syntax".to_string(),
            content: "github \"example-org/Alamofire ~> 1.0\n".to_string(),
        }
    }

    /// Only comments, no dependencies.
    pub fn empty() -> Self {
        Self {
            name: "empty".to_string(),
            content: "# No dependencies declared\n".to_string(),
        }
    }

    /// Write as `Cartfile` in `dir` (or `Cartfile.private` via
    /// [`Self::write_private_to`]).
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join("Cartfile");
        fs::write(&path, &self.content).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    pub fn write_private_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join("Cartfile.private");
        fs::write(&path, &self.content).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

/// A `Cartfile.resolved` fixture.
#[derive(Clone, Debug)]
pub struct ResolvedFixture {
    pub content: String,
}

impl ResolvedFixture {
    /// A resolved pin matching [`CartfileFixture::basic`].
    pub fn basic() -> Self {
        Self {
            content: "github \"example-org/Alamofire\" \"v1.2.0\"\n".to_string(),
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join("Cartfile.resolved");
        fs::write(&path, &self.content).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

/// An arbitrary file to seed into a mock git repository (a source file, a
/// podspec-like descriptor, or a nested `Cartfile` for transitive-dependency
/// tests).
#[derive(Clone, Debug)]
pub struct FileFixture {
    pub path: String,
    pub content: String,
}

impl FileFixture {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let file_path = dir.join(&self.path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, &self.content)?;
        Ok(file_path)
    }
}

/// A mock git repository fixture: initializes a real repository, commits the
/// given files, and tags the result so the Retriever/Resolver tests have
/// something to clone and resolve against.
#[derive(Clone, Debug)]
pub struct GitRepoFixture {
    pub path: PathBuf,
    pub files: Vec<FileFixture>,
}

impl GitRepoFixture {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            files: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_file(mut self, file: FileFixture) -> Self {
        self.files.push(file);
        self
    }

    /// Initializes the repository, commits every added file, and tags the
    /// result `v1.0.0`.
    pub fn init(&self) -> Result<()> {
        self.init_tagged("v1.0.0")
    }

    /// Like [`Self::init`] but with a caller-chosen tag, for fixtures that
    /// need to build up several tagged commits.
    pub fn init_tagged(&self, tag: &str) -> Result<()> {
        fs::create_dir_all(&self.path)?;

        run_git(&self.path, &["init"], "initialize git repository")?;
        run_git(&self.path, &["config", "user.email", "test@drydock.example"], "configure git user email")?;
        run_git(&self.path, &["config", "user.name", "Test User"], "configure git user name")?;

        for file in &self.files {
            file.write_to(&self.path)?;
        }

        run_git(&self.path, &["add", "."], "stage files")?;
        run_git(&self.path, &["commit", "-m", "Initial commit"], "commit files")?;
        run_git(&self.path, &["tag", tag], "create tag")?;

        Ok(())
    }

    /// Commits whatever files currently differ from the last commit and tags
    /// the result, for fixtures that grow a tag history over several calls.
    pub fn commit_and_tag(&self, tag: &str) -> Result<()> {
        run_git(&self.path, &["add", "."], "stage files")?;
        run_git(&self.path, &["commit", "-m", format!("Release {tag}").as_str()], "commit files")?;
        run_git(&self.path, &["tag", tag], "create tag")?;
        Ok(())
    }
}

fn run_git(dir: &Path, args: &[&str], action: &str) -> Result<()> {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("failed to {action}"))?;
    if !output.status.success() {
        anyhow::bail!("failed to {action}: {}", String::from_utf8_lossy(&output.stderr));
    }
    Ok(())
}
