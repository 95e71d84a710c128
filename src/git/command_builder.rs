//! Fluent builder for the handful of `git` subcommands the Retriever needs
//! (bare clone, fetch, worktree add, tag listing, rev-parse), with consistent
//! timeout handling and error-type mapping.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::DrydockError;
use crate::utils::platform::get_git_command;

/// A single `git` invocation under construction: arguments, working
/// directory, and an optional context label used in debug/perf logging to
/// tell concurrent dependency operations apart.
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<std::path::PathBuf>,
    timeout_duration: Option<Duration>,
    context: Option<String>,
    /// For clone commands, the URL, kept around for a precise error message.
    clone_url: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            clone_url: None,
            current_dir: None,
            timeout_duration: Some(Duration::from_secs(300)),
            context: None,
        }
    }
}

impl GitCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Tags this invocation for debug/perf logging, typically a dependency
    /// name, so concurrent worktree operations are distinguishable in logs.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub async fn execute(self) -> Result<GitCommandOutput> {
        let start = std::time::Instant::now();
        let git_command = get_git_command();
        let mut cmd = Command::new(git_command);

        // `-C <dir>` rather than a chdir, so this stays independent of the
        // calling task's working directory under concurrent execution.
        let mut full_args = Vec::new();
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.clone());

        cmd.args(&full_args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        if let Some(ref ctx) = self.context {
            tracing::debug!(target: "git", "({}) running: {} {}", ctx, git_command, full_args.join(" "));
        } else {
            tracing::debug!(target: "git", "running: {} {}", git_command, full_args.join(" "));
        }

        let output_future = cmd.output();
        let output = if let Some(duration) = self.timeout_duration {
            match timeout(duration, output_future).await {
                Ok(result) => result.context(format!("failed to execute git {}", full_args.join(" ")))?,
                Err(_) => {
                    let operation = effective_args(&full_args).first().cloned().unwrap_or_else(|| "unknown".to_string());
                    return Err(DrydockError::GitCommandError {
                        operation,
                        stderr: format!(
                            "git command timed out after {}s; try running it manually: git {}",
                            duration.as_secs(),
                            full_args.join(" ")
                        ),
                    }
                    .into());
                }
            }
        } else {
            output_future.await.context(format!("failed to execute git {}", full_args.join(" ")))?
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            tracing::debug!(target: "git", "command failed with {:?}: {}", output.status.code(), stderr);

            let effective = effective_args(&full_args);
            let error = match effective.first().map(String::as_str) {
                Some("clone") => DrydockError::GitCloneFailed {
                    url: self.clone_url.unwrap_or_else(|| "unknown".to_string()),
                    reason: stderr,
                },
                Some("worktree") => DrydockError::GitCommandError {
                    operation: format!("worktree {}", effective.get(1).cloned().unwrap_or_default()),
                    stderr: if stderr.is_empty() { stdout } else { stderr },
                },
                _ => DrydockError::GitCommandError {
                    operation: effective.first().cloned().unwrap_or_else(|| "unknown".to_string()),
                    stderr,
                },
            };
            return Err(error.into());
        }

        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 {
            let operation = effective_args(&full_args).first().cloned().unwrap_or_else(|| "unknown".to_string());
            tracing::debug!(target: "git::perf", "git {} took {}ms", operation, elapsed.as_millis());
        }

        Ok(GitCommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    pub async fn execute_stdout(self) -> Result<String> {
        Ok(self.execute().await?.stdout.trim().to_string())
    }

    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

/// Output of a finished `git` invocation.
pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Strips a leading `-C <dir>` pair so error mapping looks at the real
/// subcommand rather than the directory flag.
fn effective_args(full_args: &[String]) -> &[String] {
    if full_args.first().map(String::as_str) == Some("-C") && full_args.len() > 2 {
        &full_args[2..]
    } else {
        full_args
    }
}

impl GitCommand {
    /// `git clone --bare`, partial (`--filter=blob:none`) for remote URLs,
    /// full for local/`file://` sources where worktrees need complete history.
    pub fn clone_bare(url: &str, target: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new();
        let mut args = vec!["clone".to_string(), "--bare".to_string(), "--progress".to_string()];

        let is_local = url.starts_with("file://")
            || url.starts_with('/')
            || url.starts_with('.')
            || url.starts_with('~')
            || (url.len() > 1 && url.chars().nth(1) == Some(':'));
        if !is_local {
            args.push("--filter=blob:none".to_string());
        }
        args.extend([
            "--recurse-submodules".to_string(),
            url.to_string(),
            target.as_ref().display().to_string(),
        ]);

        cmd.args.extend(args);
        cmd.clone_url = Some(url.to_string());
        cmd
    }

    /// Refreshes a bare mirror's branches and tags from its one remote.
    pub fn fetch() -> Self {
        Self::new().args(["fetch", "--all", "--tags", "--force"])
    }

    /// `git worktree add <path> [reference]`, run with the bare mirror as
    /// the current directory.
    pub fn worktree_add(worktree_path: impl AsRef<Path>, reference: Option<&str>) -> Self {
        let mut cmd = Self::new();
        cmd.args.push("worktree".to_string());
        cmd.args.push("add".to_string());
        cmd.args.push(worktree_path.as_ref().display().to_string());
        if let Some(ref_name) = reference {
            cmd.args.push(ref_name.to_string());
        }
        cmd
    }

    pub fn list_tags() -> Self {
        Self::new().args(["tag", "-l"])
    }

    pub fn rev_parse(ref_name: &str) -> Self {
        Self::new().args(["rev-parse", ref_name])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_with_dir() {
        let cmd = GitCommand::new().current_dir("/tmp/repo").args(["status"]);
        assert_eq!(cmd.current_dir, Some(std::path::PathBuf::from("/tmp/repo")));
    }

    #[test]
    fn test_clone_bare_builder_is_partial_for_remote_url() {
        let cmd = GitCommand::clone_bare("https://example.com/repo.git", "/tmp/target.git");
        assert!(cmd.args.contains(&"--filter=blob:none".to_string()));
        assert_eq!(cmd.clone_url.as_deref(), Some("https://example.com/repo.git"));
    }

    #[test]
    fn test_clone_bare_builder_is_full_for_local_url() {
        let cmd = GitCommand::clone_bare("file:///tmp/source.git", "/tmp/target.git");
        assert!(!cmd.args.contains(&"--filter=blob:none".to_string()));
    }

    #[test]
    fn test_worktree_add_builder_with_reference() {
        let cmd = GitCommand::worktree_add("/tmp/work", Some("v1.0.0"));
        assert_eq!(cmd.args, vec!["worktree", "add", "/tmp/work", "v1.0.0"]);
    }

    #[tokio::test]
    async fn test_execute_runs_git_version() {
        let result = GitCommand::new().args(["--version"]).execute().await;
        assert!(result.is_ok());
        assert!(!result.unwrap().stdout.is_empty());
    }
}
