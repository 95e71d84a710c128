//! Cartfile line-based format: parsing and canonical serialization
//! (spec §6 "Manifest file format" / "Resolved manifest format").

use super::dependency::Dependency;
use crate::core::DrydockError;
use crate::version::VersionSpecifier;
use std::collections::BTreeMap;

/// Parse the full contents of a `Cartfile`/`Cartfile.private` file into an
/// ordered map of dependency to version specifier.
///
/// # Errors
/// Returns [`DrydockError::ManifestParseError`] on the first malformed line.
pub fn parse(file: &str, contents: &str) -> Result<BTreeMap<Dependency, VersionSpecifier>, DrydockError> {
    let mut map = BTreeMap::new();
    for (lineno, raw_line) in contents.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let (dep, spec) = parse_line(line).map_err(|reason| DrydockError::ManifestParseError {
            file: file.to_string(),
            reason: format!("line {}: {reason}", lineno + 1),
        })?;
        map.insert(dep, spec);
    }
    Ok(map)
}

/// Serialize a dependency map back to Cartfile syntax, one line per entry,
/// dependencies already in `name`-sorted order because the caller stores
/// them in a `BTreeMap<Dependency, _>`.
#[must_use]
pub fn serialize(map: &BTreeMap<Dependency, VersionSpecifier>) -> String {
    let mut out = String::new();
    for (dep, spec) in map {
        out.push_str(dep.kind_keyword());
        out.push_str(" \"");
        out.push_str(&dep.locator());
        out.push('"');
        let rendered = spec.to_string();
        if !rendered.is_empty() {
            out.push(' ');
            out.push_str(&rendered);
        }
        out.push('\n');
    }
    out
}

pub(super) fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..idx],
            _ => {}
        }
    }
    line
}

fn parse_line(line: &str) -> Result<(Dependency, VersionSpecifier), String> {
    let (kind, rest) = split_first_token(line).ok_or_else(|| "missing dependency kind".to_string())?;
    let rest = rest.trim_start();
    let (locator, rest) = take_quoted(rest).ok_or_else(|| "expected a quoted locator".to_string())?;

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

    let spec = VersionSpecifier::parse(rest.trim()).map_err(|e| e.to_string())?;
    Ok((dep, spec))
}

pub(super) fn split_first_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((&s[..end], &s[end..]))
}

pub(super) fn take_quoted(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    let s = s.strip_prefix('"')?;
    let end = s.find('"')?;
    Some((&s[..end], &s[end + 1..]))
}
