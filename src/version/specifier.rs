//! Version specifiers — the predicates a manifest line declares over a
//! dependency's versions (spec §3, §6).

use super::pinned::PinnedVersion;
use super::semantic::SemanticVersion;
use crate::core::DrydockError;
use std::fmt;

/// A predicate over a dependency's candidate versions, as declared by a
/// single manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpecifier {
    /// No constraint; admits any candidate.
    Any,
    /// `>= v` — admits any version greater than or equal to `v`.
    AtLeast(SemanticVersion),
    /// `~> v` — caret semantics: admits `[v, v.next_incompatible())`.
    CompatibleWith(SemanticVersion),
    /// `== v` — admits only `v` exactly.
    Exactly(SemanticVersion),
    /// `"ref"` — admits only the commit `ref` resolves to.
    GitReference(String),
}

impl VersionSpecifier {
    /// Precedence used for same-name elimination (spec §4.3): higher wins.
    #[must_use]
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Any => 0,
            Self::AtLeast(_) => 1,
            Self::CompatibleWith(_) => 2,
            Self::Exactly(_) => 3,
            Self::GitReference(_) => 4,
        }
    }

    /// Whether `candidate` satisfies this specifier.
    ///
    /// `gitReference` specifiers are resolved up front by the Retriever
    /// (spec §4.3 "Git-reference handling"); by the time this is called the
    /// caller is expected to have already turned the reference into the
    /// resolved commit's `PinnedVersion` for comparison.
    #[must_use]
    pub fn admits(&self, candidate: &PinnedVersion) -> bool {
        match self {
            Self::Any => true,
            Self::AtLeast(min) => candidate
                .as_semantic()
                .is_some_and(|v| Self::admissible_prerelease(min, v) && v >= min),
            Self::CompatibleWith(base) => candidate.as_semantic().is_some_and(|v| {
                Self::admissible_prerelease(base, v) && v >= base && v < &base.next_incompatible()
            }),
            Self::Exactly(exact) => candidate.as_semantic().is_some_and(|v| v == exact),
            Self::GitReference(ref_commit) => candidate.as_str() == ref_commit,
        }
    }

    /// Prerelease versions are only admitted when the specifier's own base
    /// version is itself a prerelease (spec §3, `compatibleWith` note).
    fn admissible_prerelease(base: &SemanticVersion, candidate: &SemanticVersion) -> bool {
        base.is_prerelease() || !candidate.is_prerelease()
    }

    /// Parse the specifier portion of a manifest line: `== v`, `>= v`,
    /// `~> v`, a bare quoted `"ref"`, or an omitted/empty specifier (`any`).
    pub fn parse(token: &str) -> Result<Self, DrydockError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(Self::Any);
        }

        if let Some(rest) = token.strip_prefix("==") {
            return Self::parse_semver(rest.trim()).map(Self::Exactly);
        }
        if let Some(rest) = token.strip_prefix(">=") {
            return Self::parse_semver(rest.trim()).map(Self::AtLeast);
        }
        if let Some(rest) = token.strip_prefix("~>") {
            return Self::parse_semver(rest.trim()).map(Self::CompatibleWith);
        }
        if token.starts_with('"') && token.ends_with('"') && token.len() >= 2 {
            return Ok(Self::GitReference(token[1..token.len() - 1].to_string()));
        }

        Err(DrydockError::ManifestValidationError {
            reason: format!("unrecognized version specifier: {token}"),
        })
    }

    /// Manifest version literals are often shorthand (`1.2`, `2.0`) rather
    /// than full `major.minor.patch`; pad missing components with zero
    /// before delegating to [`SemanticVersion::parse_lenient`].
    fn parse_semver(s: &str) -> Result<SemanticVersion, DrydockError> {
        let dots = s.trim_start_matches(['v']).matches('.').count();
        let padded = match dots {
            0 => format!("{s}.0.0"),
            1 => format!("{s}.0"),
            _ => s.to_string(),
        };
        SemanticVersion::parse_lenient(&padded).map_err(|e| DrydockError::ManifestValidationError {
            reason: format!("invalid semantic version {s:?}: {e}"),
        })
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, ""),
            Self::AtLeast(v) => write!(f, ">= {v}"),
            Self::CompatibleWith(v) => write!(f, "~> {v}"),
            Self::Exactly(v) => write!(f, "== {v}"),
            Self::GitReference(r) => write!(f, "\"{r}\""),
        }
    }
}
