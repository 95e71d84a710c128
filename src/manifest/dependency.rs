//! The [`Dependency`] identity type (spec §3 DATA MODEL).

use std::cmp::Ordering;
use std::fmt;

/// A uniquely identified source of code or binary artifacts.
///
/// Equality is structural (two dependencies are equal iff their variant and
/// fields match exactly); ordering is always by [`Dependency::name`], which
/// is what the Resolver's same-name elimination and the resolved manifest's
/// canonical serialization rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// A git-hosted repository identified by host, owner, and repository name.
    GitHub {
        host: String,
        owner: String,
        repo: String,
    },
    /// A raw git URL, either a remote (`https://`, `ssh://`, `git://`) or a
    /// local filesystem path.
    Git { url: String },
    /// A binary manifest URL (spec §6 "Binary manifest format").
    Binary { url: String },
}

impl Dependency {
    #[must_use]
    pub fn github(host: impl Into<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self::GitHub {
            host: host.into(),
            owner: owner.into(),
            repo: strip_git_suffix(&repo.into()).to_string(),
        }
    }

    #[must_use]
    pub fn git(url: impl Into<String>) -> Self {
        Self::Git { url: url.into() }
    }

    #[must_use]
    pub fn binary(url: impl Into<String>) -> Self {
        Self::Binary { url: url.into() }
    }

    /// The canonical name: for git-hosted and raw-git dependencies, the last
    /// path component with any `.git` suffix stripped; for binary
    /// dependencies, the last path component with its extension stripped.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::GitHub { repo, .. } => repo.clone(),
            Self::Git { url } => strip_git_suffix(last_path_component(url)).to_string(),
            Self::Binary { url } => {
                let last = last_path_component(url);
                match last.rsplit_once('.') {
                    Some((stem, _ext)) => stem.to_string(),
                    None => last.to_string(),
                }
            }
        }
    }

    /// The locator string as it appears quoted in a manifest line.
    #[must_use]
    pub fn locator(&self) -> String {
        match self {
            Self::GitHub { owner, repo, .. } => format!("{owner}/{repo}"),
            Self::Git { url } | Self::Binary { url } => url.clone(),
        }
    }

    #[must_use]
    pub fn kind_keyword(&self) -> &'static str {
        match self {
            Self::GitHub { .. } => "github",
            Self::Git { .. } => "git",
            Self::Binary { .. } => "binary",
        }
    }

    /// The URL the Retriever clones/fetches from. `None` for a [`Self::Binary`]
    /// dependency, which is never cloned (spec §4.2 "Manifest with a single
    /// `binary` dependency → no git fetch occurs").
    #[must_use]
    pub fn clone_url(&self) -> Option<String> {
        match self {
            Self::GitHub { host, owner, repo } => Some(format!("https://{host}/{owner}/{repo}.git")),
            Self::Git { url } => Some(url.clone()),
            Self::Binary { .. } => None,
        }
    }

    /// The `(host, owner, repo)` triple used to query a git host's releases
    /// API (spec §4.2 binary cache tier 2). Only git-hosted dependencies
    /// support this tier.
    #[must_use]
    pub fn host_repo(&self) -> Option<(&str, &str, &str)> {
        match self {
            Self::GitHub { host, owner, repo } => Some((host, owner, repo)),
            _ => None,
        }
    }
}

fn last_path_component(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or(url)
}

fn strip_git_suffix(name: &str) -> &str {
    name.strip_suffix(".git").unwrap_or(name)
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.kind_keyword(), self.locator())
    }
}

impl PartialOrd for Dependency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dependency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name().cmp(&other.name()).then_with(|| self.locator().cmp(&other.locator()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_name() {
        let dep = Dependency::github("github.com", "Alamofire", "Alamofire.git");
        assert_eq!(dep.name(), "Alamofire");
    }

    #[test]
    fn test_git_name_strips_dot_git() {
        let dep = Dependency::git("https://example.com/path/MyLib.git");
        assert_eq!(dep.name(), "MyLib");
    }

    #[test]
    fn test_git_name_local_path() {
        let dep = Dependency::git("../Local/CoolFramework");
        assert_eq!(dep.name(), "CoolFramework");
    }

    #[test]
    fn test_binary_name_strips_extension() {
        let dep = Dependency::binary("https://example.com/project.json");
        assert_eq!(dep.name(), "project");
    }

    #[test]
    fn test_ordering_by_name() {
        let a = Dependency::git("https://example.com/AAA.git");
        let b = Dependency::git("https://example.com/ZZZ.git");
        assert!(a < b);
    }
}
