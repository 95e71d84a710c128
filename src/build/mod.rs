//! The build-task facade (spec §1: "the native compiler toolchain \[is\]
//! consumed through a build-task facade" — deliberately out of core scope).
//!
//! [`BuildTaskFacade`] is the seam the Orchestrator calls through; the only
//! implementation this crate ships, [`SubprocessBuildTask`], shells out to an
//! external build tool and is intentionally thin glue, not a toolchain.

use crate::core::error::DrydockError;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// One build invocation's parameters (spec §4.5 step 4).
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub project_descriptor: PathBuf,
    pub scheme: String,
    pub platform: String,
    pub configuration: String,
    pub toolchain: String,
    pub derived_data: PathBuf,
}

/// A framework artifact path produced by a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub platform: String,
    pub framework_paths: Vec<PathBuf>,
}

/// The seam between the Orchestrator and an external compiler toolchain.
pub trait BuildTaskFacade: Send + Sync {
    /// Runs one build, streaming combined stdout/stderr into `log_sink`, and
    /// returns the framework paths it produced.
    fn run(&self, request: &BuildRequest, log_sink: &Path) -> impl std::future::Future<Output = Result<BuildOutput, DrydockError>> + Send;
}

/// Default [`BuildTaskFacade`]: invokes a configurable external command
/// (`xcodebuild`-shaped by default) as a subprocess per spec §4.5.
pub struct SubprocessBuildTask {
    /// The build command's executable name, overridable for testing.
    executable: String,
}

impl SubprocessBuildTask {
    #[must_use]
    pub fn new() -> Self {
        Self {
            executable: "xcodebuild".to_string(),
        }
    }

    #[must_use]
    pub fn with_executable(executable: impl Into<String>) -> Self {
        Self { executable: executable.into() }
    }
}

impl Default for SubprocessBuildTask {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildTaskFacade for SubprocessBuildTask {
    async fn run(&self, request: &BuildRequest, log_sink: &Path) -> Result<BuildOutput, DrydockError> {
        if let Some(parent) = log_sink.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| DrydockError::RetrievalWriteFailed {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        tokio::fs::create_dir_all(&request.derived_data).await.map_err(|e| DrydockError::RetrievalWriteFailed {
            path: request.derived_data.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut child = Command::new(&self.executable)
            .arg("-project")
            .arg(&request.project_descriptor)
            .arg("-scheme")
            .arg(&request.scheme)
            .arg("-sdk")
            .arg(&request.platform)
            .arg("-configuration")
            .arg(&request.configuration)
            .arg("-derivedDataPath")
            .arg(&request.derived_data)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| DrydockError::BuildFailed {
                target: request.scheme.clone(),
                reason: format!("failed to spawn build task: {e}"),
            })?;

        let mut log_file = tokio::fs::File::create(log_sink).await.map_err(|e| DrydockError::RetrievalWriteFailed {
            path: log_sink.display().to_string(),
            reason: e.to_string(),
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        if let Some(stdout) = stdout {
            stream_to_log(stdout, &mut log_file).await?;
        }
        if let Some(stderr) = stderr {
            stream_to_log(stderr, &mut log_file).await?;
        }

        let status = child.wait().await.map_err(|e| DrydockError::BuildFailed {
            target: request.scheme.clone(),
            reason: e.to_string(),
        })?;

        if !status.success() {
            return Err(DrydockError::BuildFailed {
                target: request.scheme.clone(),
                reason: format!("build task exited with {status}; see {}", log_sink.display()),
            });
        }

        let framework_paths = discover_frameworks(&request.derived_data);
        Ok(BuildOutput {
            platform: request.platform.clone(),
            framework_paths,
        })
    }
}

async fn stream_to_log<R: tokio::io::AsyncRead + Unpin>(reader: R, log_file: &mut tokio::fs::File) -> Result<(), DrydockError> {
    use tokio::io::AsyncWriteExt;
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        log_file.write_all(line.as_bytes()).await.ok();
        log_file.write_all(b"\n").await.ok();
    }
    Ok(())
}

fn discover_frameworks(derived_data: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(derived_data)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "framework"))
        .map(|e| e.path().to_path_buf())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_subprocess_build_task_fails_when_executable_missing() {
        let task = SubprocessBuildTask::with_executable("drydock-nonexistent-build-tool");
        let dir = TempDir::new().unwrap();
        let request = BuildRequest {
            project_descriptor: dir.path().join("App.xcodeproj"),
            scheme: "App".to_string(),
            platform: "iphoneos".to_string(),
            configuration: "Release".to_string(),
            toolchain: "16.0".to_string(),
            derived_data: dir.path().join("DerivedData"),
        };
        let log = dir.path().join("log.txt");
        let result = task.run(&request, &log).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_discover_frameworks_finds_framework_bundles() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("Build/Foo.framework")).unwrap();
        std::fs::create_dir_all(dir.path().join("Build/Other.bundle")).unwrap();
        let found = discover_frameworks(dir.path());
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("Foo.framework"));
    }
}
