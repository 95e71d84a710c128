//! Gitignore-subset matcher used by [`super::hash_directory`] (spec §4.1).
//!
//! Reproduces the slice of gitignore semantics the fingerprint algorithm
//! actually needs: trailing/leading whitespace escaping, `!` negation,
//! leading `/` anchoring to the directory the pattern came from, `**/`
//! arbitrary depth, and `*` within one path segment. Matching is delegated
//! to [`glob::Pattern`] so none of that has to be hand-rolled — only the
//! anchoring/negation/merge bookkeeping around it is ours.

use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// The default top-level ignore set applied to every `hashDirectory` call,
/// independent of any `.gitignore` present in the tree (spec §4.1).
pub const DEFAULT_IGNORES: &[&str] = &[
    ".DS_Store",
    "**/xcuserdata/**",
    "*.xcscheme",
    "IDEWorkspaceChecks.plist",
    "WorkspaceSettings.xcsettings",
    ".*",
    "Pods",
    "Build",
    "Checkouts",
    "*.o",
    "*.a",
    "*.dSYM",
];

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: Pattern,
    negate: bool,
    dir_only: bool,
}

impl CompiledRule {
    /// Parse one `.gitignore`-style line. Returns `None` for blank lines
    /// and full-line comments.
    fn parse(raw: &str) -> Option<Self> {
        let mut line = raw.to_string();
        // Trailing whitespace is ignored unless escaped with a backslash.
        while line.ends_with(' ') && !line.ends_with("\\ ") {
            line.pop();
        }
        line = line.replace("\\ ", " ");
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (negate, line) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let line = line.strip_prefix("\\!").unwrap_or(line);

        let dir_only = line.ends_with('/') && !line.ends_with("\\/");
        let body = line.trim_end_matches('/');
        if body.is_empty() {
            return None;
        }

        let anchored = body.starts_with('/');
        let body = body.strip_prefix('/').unwrap_or(body);
        let has_internal_slash = body.contains('/');

        // A pattern with no slash (other than a trailing one already
        // stripped) matches at any depth; one with a leading or internal
        // slash is anchored to the directory that defines it.
        let glob_source = if anchored || has_internal_slash {
            body.to_string()
        } else {
            format!("**/{body}")
        };

        let pattern = Pattern::new(&glob_source).ok()?;
        Some(Self {
            pattern,
            negate,
            dir_only,
        })
    }

    fn matches(&self, relative_path: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        self.pattern.matches_with(relative_path, MATCH_OPTIONS)
            || (is_dir && self.pattern.matches_with(&format!("{relative_path}/"), MATCH_OPTIONS))
    }
}

/// One `.gitignore`'s worth of compiled rules, anchored at `base_depth`
/// path components below the `hashDirectory` root.
#[derive(Debug, Clone)]
struct IgnoreLevel {
    base_depth: usize,
    rules: Vec<CompiledRule>,
}

/// The accumulated ignore state for one point in the tree: every level's
/// rules from the root down to here, parent-first so a child's rule is
/// evaluated last and therefore wins ties (spec §4.1 step 2: "child
/// overrides parent").
#[derive(Debug, Clone, Default)]
pub struct IgnoreStack {
    levels: Vec<IgnoreLevel>,
}

impl IgnoreStack {
    /// A fresh stack seeded with the tool's default top-level ignores.
    #[must_use]
    pub fn with_defaults() -> Self {
        let rules = DEFAULT_IGNORES.iter().filter_map(|p| CompiledRule::parse(p)).collect();
        Self {
            levels: vec![IgnoreLevel { base_depth: 0, rules }],
        }
    }

    /// Return a new stack with `gitignore_contents` (may be absent) merged
    /// in at `base_depth`, the number of path components between the hash
    /// root and the directory this `.gitignore` lives in.
    #[must_use]
    pub fn push(&self, base_depth: usize, gitignore_contents: Option<&str>) -> Self {
        let mut levels = self.levels.clone();
        if let Some(contents) = gitignore_contents {
            let rules = contents.lines().filter_map(CompiledRule::parse).collect();
            levels.push(IgnoreLevel { base_depth, rules });
        }
        Self { levels }
    }

    /// `true` iff `path_components` (relative to the hash root) should be
    /// skipped. `is_dir` distinguishes directory-only patterns.
    #[must_use]
    pub fn is_ignored(&self, path_components: &[&str], is_dir: bool) -> bool {
        let mut ignored = false;
        for level in &self.levels {
            if level.base_depth > path_components.len() {
                continue;
            }
            let local = path_components[level.base_depth..].join("/");
            for rule in &level.rules {
                if rule.matches(&local, is_dir) {
                    ignored = !rule.negate;
                }
            }
        }
        ignored
    }
}
