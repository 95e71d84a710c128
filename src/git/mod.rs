//! Git substrate for the Retriever (spec §4.2): clones each dependency's
//! repository once as a bare mirror, then checks out every resolved
//! revision into its own worktree, so N pinned versions of one repository
//! never require N full clones.
//!
//! Shells out to the system `git` binary rather than linking `libgit2`, for
//! the same reason most package managers do: authentication (SSH keys,
//! HTTPS credential helpers, `.netrc`) and platform quirks are already
//! solved by whatever `git` the user has installed.

pub mod command_builder;

use crate::core::DrydockError;
use crate::git::command_builder::GitCommand;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A handle onto one local Git repository (bare mirror or worktree),
/// reached entirely through CLI subprocess calls.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,

    /// Tags, cached per instance after the first `list_tags()` call — the
    /// resolver re-queries the same dependency's tag list many times during
    /// one backtracking search, and each call would otherwise be its own
    /// `git tag -l` subprocess.
    tag_cache: std::sync::Arc<OnceLock<Vec<String>>>,
}

impl GitRepo {
    /// Wraps an existing local repository path (bare or worktree).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            tag_cache: std::sync::Arc::new(OnceLock::new()),
        }
    }

    /// Fetches new branches/tags into a bare mirror without touching any
    /// worktree's working directory. `auth_url` temporarily repoints
    /// `origin` for this fetch when a credential-bearing URL is needed.
    pub async fn fetch(&self, auth_url: Option<&str>) -> Result<()> {
        if let Some(url) = auth_url {
            GitCommand::new()
                .args(["remote", "set-url", "origin", url])
                .current_dir(&self.path)
                .execute_success()
                .await?;
        }
        GitCommand::fetch().current_dir(&self.path).execute_success().await?;
        Ok(())
    }

    /// Lists every tag in the repository. Retries a handful of times on a
    /// lock-contention error, since a concurrent worktree checkout on the
    /// same mirror can momentarily hold git's index lock.
    pub async fn list_tags(&self) -> Result<Vec<String>> {
        if let Some(cached) = self.tag_cache.get() {
            return Ok(cached.clone());
        }
        if !self.is_git_repo() {
            return Err(anyhow::anyhow!("not a git repository: {:?}", self.path));
        }

        const MAX_RETRIES: u32 = 3;
        const RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(150);
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match GitCommand::list_tags().current_dir(&self.path).execute_stdout().await {
                Ok(stdout) => {
                    let tags: Vec<String> =
                        stdout.lines().filter(|line| !line.is_empty()).map(String::from).collect();
                    let _ = self.tag_cache.set(tags.clone());
                    return Ok(tags);
                }
                Err(e) => {
                    if e.to_string().contains("lock") {
                        last_error = Some(e);
                        tokio::time::sleep(RETRY_DELAY * (attempt + 1)).await;
                        continue;
                    }
                    return Err(e).context(format!("failed to list tags in {:?}", self.path));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("exhausted retries for list_tags")))
            .context(format!("failed to list tags in {:?} after {MAX_RETRIES} retries", self.path))
    }

    #[must_use]
    pub fn is_git_repo(&self) -> bool {
        is_git_repository(&self.path)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// After a bare clone, make sure `origin`'s branches land as remote
    /// tracking refs and that at least one ref actually resolves — needed
    /// for `file://` sources, which `git clone --bare` otherwise leaves
    /// without remote-tracking branches.
    async fn ensure_bare_repo_has_refs(&self) -> Result<()> {
        if GitCommand::fetch().current_dir(&self.path).execute_success().await.is_err() {
            GitCommand::new()
                .args(["show-ref", "--head"])
                .current_dir(&self.path)
                .execute_success()
                .await
                .map_err(|e| anyhow::anyhow!("bare repository has no refs available: {e}"))?;
        }
        Ok(())
    }

    /// Clones `url` as a bare mirror at `target`: no working directory, just
    /// the object database and refs, ready to be the source of many
    /// worktree checkouts.
    pub async fn clone_bare(url: &str, target: impl AsRef<Path>) -> Result<Self> {
        let target_path = target.as_ref();
        GitCommand::clone_bare(url, target_path).execute_success().await?;

        let repo = Self::new(target_path);
        GitCommand::new()
            .args(["config", "remote.origin.fetch", "+refs/heads/*:refs/remotes/origin/*"])
            .current_dir(repo.path())
            .execute_success()
            .await
            .ok();
        repo.ensure_bare_repo_has_refs().await.ok();

        Ok(repo)
    }

    /// Checks out `reference` (or the mirror's default branch) into a fresh
    /// worktree at `worktree_path`, retrying past the couple of transient
    /// failure modes `git worktree add` produces under concurrent checkouts
    /// of the same bare mirror (racy `commondir` reads, stale worktree
    /// registrations left by a crashed prior run).
    pub async fn create_worktree(&self, worktree_path: impl AsRef<Path>, reference: Option<&str>) -> Result<Self> {
        let worktree_path = worktree_path.as_ref();
        if let Some(parent) = worktree_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create parent directory for worktree: {parent:?}"))?;
        }

        const MAX_RETRIES: u32 = 3;
        let mut retry_count = 0;

        loop {
            let effective_ref = match reference {
                Some(r) => Some(r.to_string()),
                None => self.default_branch_guess().await,
            };

            let result = GitCommand::worktree_add(worktree_path, effective_ref.as_deref())
                .current_dir(&self.path)
                .execute_success()
                .await;

            match result {
                Ok(()) => {
                    init_submodules(worktree_path).await?;
                    return Ok(Self::new(worktree_path));
                }
                Err(e) => {
                    let error_str = e.to_string();

                    let transient = error_str.contains("already exists")
                        || error_str.contains("is already checked out")
                        || error_str.contains("could not create directory")
                        || (error_str.contains("failed to read") && error_str.contains("commondir"));
                    if transient {
                        retry_count += 1;
                        if retry_count >= MAX_RETRIES {
                            return Err(e).with_context(|| {
                                format!("failed to create worktree at {} after {MAX_RETRIES} retries", worktree_path.display())
                            });
                        }
                        tokio::time::sleep(tokio::time::Duration::from_millis(100 * u64::from(retry_count))).await;
                        continue;
                    }

                    if error_str.contains("missing but already registered worktree") {
                        return self.recover_stale_worktree(worktree_path, effective_ref.as_deref()).await;
                    }

                    if let Some(ref_name) = reference
                        && ["pathspec", "not found", "ambiguous", "invalid", "unknown revision"]
                            .iter()
                            .any(|needle| error_str.contains(needle))
                    {
                        return Err(anyhow::anyhow!("reference '{ref_name}' does not exist in the repository"));
                    }

                    return Err(e).with_context(|| format!("failed to create worktree at {}", worktree_path.display()));
                }
            }
        }
    }

    /// A bare mirror freshly cloned from a `file://` source has no
    /// `HEAD` symref to follow, so guess `main` when no explicit reference
    /// was given and let the worktree add fail (and fall through to the
    /// stale-registration recovery path) if that guess is wrong.
    async fn default_branch_guess(&self) -> Option<String> {
        GitCommand::new()
            .args(["symbolic-ref", "refs/remotes/origin/HEAD"])
            .current_dir(&self.path)
            .execute_stdout()
            .await
            .ok()
            .and_then(|s| s.strip_prefix("refs/remotes/origin/").map(String::from))
            .or_else(|| Some("main".to_string()))
    }

    /// Git reports "missing but already registered worktree" when a prior
    /// run crashed mid-checkout: the path is gone but git's metadata still
    /// claims it. Remove the directory, prune the stale registration, and
    /// retry once with `--force`.
    async fn recover_stale_worktree(&self, worktree_path: &Path, reference: Option<&str>) -> Result<Self> {
        if worktree_path.exists() {
            let _ = tokio::fs::remove_dir_all(worktree_path).await;
        }
        GitCommand::new().args(["worktree", "prune"]).current_dir(&self.path).execute_success().await.ok();
        if let Some(parent) = worktree_path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }

        let mut args = vec!["worktree".to_string(), "add".to_string(), "--force".to_string(), worktree_path.display().to_string()];
        if let Some(r) = reference {
            args.push(r.to_string());
        }
        GitCommand::new()
            .args(args)
            .current_dir(&self.path)
            .execute_success()
            .await
            .with_context(|| format!("failed to force-create worktree at {}", worktree_path.display()))?;

        init_submodules(worktree_path).await?;
        Ok(Self::new(worktree_path))
    }

    /// Resolves a tag, branch, or commit-ish to its full SHA-1. Tags are
    /// matched against the cached tag list rather than passed straight to
    /// `rev-parse`, so a branch and a tag that happen to share a name never
    /// get confused. Branch names are tried as `origin/<name>` first so a
    /// checkout always reflects the most recent fetch.
    pub async fn resolve_to_sha(&self, ref_spec: Option<&str>) -> Result<String> {
        let reference = ref_spec.unwrap_or("HEAD");
        if is_full_sha(reference) {
            return Ok(reference.to_string());
        }

        let ref_to_resolve = if !reference.contains('/') && reference != "HEAD" {
            let is_tag = self.list_tags().await.map(|tags| tags.iter().any(|t| t == reference)).unwrap_or(false);
            if is_tag {
                reference.to_string()
            } else {
                let origin_ref = format!("origin/{reference}");
                if GitCommand::rev_parse(&origin_ref).current_dir(&self.path).execute_stdout().await.is_ok() {
                    origin_ref
                } else {
                    reference.to_string()
                }
            }
        } else {
            reference.to_string()
        };

        let sha = GitCommand::rev_parse(&ref_to_resolve)
            .current_dir(&self.path)
            .execute_stdout()
            .await
            .with_context(|| format!("failed to resolve reference '{reference}' to a sha"))?;

        if is_full_sha(&sha) {
            Ok(sha)
        } else {
            GitCommand::new()
                .args(["rev-parse", "--verify", &format!("{reference}^{{commit}}")])
                .current_dir(&self.path)
                .execute_stdout()
                .await
                .with_context(|| format!("failed to get full sha for reference '{reference}'"))
        }
    }
}

fn is_full_sha(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Worktrees inherit a bare mirror's submodule config but not its checked
/// out state; missing-submodule errors are the expected case (most
/// dependencies have none) and are swallowed rather than surfaced.
async fn init_submodules(worktree_path: &Path) -> Result<()> {
    for args in [vec!["submodule", "init"], vec!["submodule", "update", "--recursive"]] {
        if let Err(e) = GitCommand::new().args(args).current_dir(worktree_path).execute_success().await {
            let error_str = e.to_string();
            if !error_str.contains("No submodule mapping found") && !error_str.contains("no submodule") {
                return Err(e).context("failed to initialize submodules");
            }
        }
    }
    Ok(())
}

/// Whether `git` itself is installed and runnable on this system.
#[must_use]
pub fn is_git_installed() -> bool {
    std::process::Command::new(crate::utils::platform::get_git_command())
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Fails fast with [`DrydockError::GitNotFound`] before any Session starts
/// spawning `git` subprocesses that would otherwise fail one-by-one.
pub fn ensure_git_available() -> Result<()> {
    if !is_git_installed() {
        return Err(DrydockError::GitNotFound.into());
    }
    Ok(())
}

/// Whether `path` looks like a Git repository, bare or otherwise.
#[must_use]
pub fn is_git_repository(path: &Path) -> bool {
    path.join(".git").exists() || path.join("HEAD").exists()
}
