//! Optional `Cartfile.project` YAML descriptor (spec §6 "Project manifest",
//! §8 boundary behavior "empty or `{}` triggers auto-discovery fallback").

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of `Cartfile.project`: the build unit the Orchestrator should
/// use for a named scheme instead of auto-discovering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeDescriptor {
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(default)]
    pub sdks: Vec<String>,
}

/// Map from scheme name to its build descriptor.
pub type ProjectManifest = BTreeMap<String, SchemeDescriptor>;

/// Parse `Cartfile.project` YAML. An empty document or `{}` yields an empty
/// map, which callers interpret as "fall back to auto-discovery" per spec §8.
pub fn parse(contents: &str) -> Result<ProjectManifest, serde_yaml::Error> {
    if contents.trim().is_empty() {
        return Ok(ProjectManifest::new());
    }
    serde_yaml::from_str(contents)
}
