//! `Cartfile.resolved` format: the output of the Resolver, persisted as one
//! `<kind> "<locator>" "<pinned-version>"` line per dependency, sorted by
//! name (spec §3 "Resolved manifest", §6 "Resolved manifest format").

use super::cartfile::{split_first_token, strip_comment, take_quoted};
use super::dependency::Dependency;
use crate::core::DrydockError;
use crate::version::PinnedVersion;
use std::collections::BTreeMap;

pub type ResolvedManifest = BTreeMap<Dependency, PinnedVersion>;

/// Parse a `Cartfile.resolved` file's contents.
///
/// # Errors
/// Returns [`DrydockError::ManifestParseError`] on the first malformed line.
pub fn parse(file: &str, contents: &str) -> Result<ResolvedManifest, DrydockError> {
    let mut map = BTreeMap::new();
    for (lineno, raw_line) in contents.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let (dep, pinned) = parse_line(line).map_err(|reason| DrydockError::ManifestParseError {
            file: file.to_string(),
            reason: format!("line {}: {reason}", lineno + 1),
        })?;
        map.insert(dep, pinned);
    }
    Ok(map)
}

/// Serialize to canonical form: one line per entry, already name-sorted by
/// virtue of the `BTreeMap<Dependency, _>` key ordering.
#[must_use]
pub fn serialize(map: &ResolvedManifest) -> String {
    let mut out = String::new();
    for (dep, pinned) in map {
        out.push_str(dep.kind_keyword());
        out.push_str(" \"");
        out.push_str(&dep.locator());
        out.push_str("\" \"");
        out.push_str(pinned.as_str());
        out.push_str("\"\n");
    }
    out
}

fn parse_line(line: &str) -> Result<(Dependency, PinnedVersion), String> {
    let (kind, rest) = split_first_token(line).ok_or_else(|| "missing dependency kind".to_string())?;
    let rest = rest.trim_start();
    let (locator, rest) = take_quoted(rest).ok_or_else(|| "expected a quoted locator".to_string())?;
    let (pinned, _rest) =
        take_quoted(rest.trim_start()).ok_or_else(|| "expected a quoted pinned version".to_string())?;

    let dep = match kind {
        "github" => {
            let (owner, repo) = locator
                .split_once('/')
                .ok_or_else(|| format!("github locator must be \"owner/name\", got {locator:?}"))?;
            Dependency::github("github.com", owner, repo)
        }
        "git" => Dependency::git(locator),
        "binary" => Dependency::binary(locator),
        other => return Err(format!("unknown dependency kind {other:?}")),
    };

    Ok((dep, PinnedVersion::new(pinned)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let mut map = ResolvedManifest::new();
        map.insert(Dependency::github("github.com", "owner", "name"), PinnedVersion::new("v1.2.0"));
        map.insert(Dependency::git("https://host/path.git"), PinnedVersion::new("deadbeef"));

        let rendered = serialize(&map);
        let reparsed = parse("Cartfile.resolved", &rendered).unwrap();
        assert_eq!(map, reparsed);
    }

    #[test]
    fn test_sorted_by_name() {
        let mut map = ResolvedManifest::new();
        map.insert(Dependency::git("https://host/ZZZ.git"), PinnedVersion::new("v1.0.0"));
        map.insert(Dependency::git("https://host/AAA.git"), PinnedVersion::new("v1.0.0"));

        let rendered = serialize(&map);
        let first_line = rendered.lines().next().unwrap();
        assert!(first_line.contains("AAA"));
    }
}
