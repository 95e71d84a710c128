//! Thin wrapper around `reqwest` for the binary cache's tier-2 lookup
//! (querying a git host's releases API) and the raw binary-manifest fetch
//! (spec §4.2, §6 "Binary manifest format").

use crate::constants::BINARY_ASSET_CONTENT_TYPES;
use crate::core::error::DrydockError;
use serde::de::DeserializeOwned;

/// A release asset as reported by a git host's releases API.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(rename = "content_type", default)]
    pub content_type: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// Facade over the HTTP client used by the Retriever, backed by a shared
/// `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestFacade {
    client: reqwest::Client,
}

impl ReqwestFacade {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("drydock/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Lists release assets for `owner/repo` on `host`'s releases API,
    /// filtering to [`BINARY_ASSET_CONTENT_TYPES`].
    pub async fn list_release_assets(&self, host: &str, owner: &str, repo: &str, tag: &str) -> Result<Vec<ReleaseAsset>, DrydockError> {
        let url = format!("https://api.{host}/repos/{owner}/{repo}/releases/tags/{tag}");
        #[derive(serde::Deserialize)]
        struct Release {
            #[serde(default)]
            assets: Vec<ReleaseAsset>,
        }
        let release: Release = self.get_json(&url).await?;
        Ok(release
            .assets
            .into_iter()
            .filter(|a| BINARY_ASSET_CONTENT_TYPES.contains(&a.content_type.as_str()))
            .collect())
    }
}

impl Default for ReqwestFacade {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::multiple_inherent_impl)]
impl ReqwestFacade {
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DrydockError> {
        let response = self.client.get(url).send().await.map_err(|e| DrydockError::HttpError {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(DrydockError::HttpError {
                url: url.to_string(),
                reason: format!("status {}", response.status()),
            });
        }
        response.json::<T>().await.map_err(|e| DrydockError::InvalidBinaryJson {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    pub async fn get_bytes(&self, url: &str) -> Result<(Vec<u8>, String), DrydockError> {
        let response = self.client.get(url).send().await.map_err(|e| DrydockError::HttpError {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(DrydockError::HttpError {
                url: url.to_string(),
                reason: format!("status {}", response.status()),
            });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .split(';')
            .next()
            .unwrap_or_default()
            .to_string();
        let bytes = response.bytes().await.map_err(|e| DrydockError::HttpError {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok((bytes.to_vec(), content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_asset_filters_by_content_type() {
        let assets = vec![
            ReleaseAsset {
                name: "Foo.framework.zip".into(),
                content_type: "application/zip".into(),
                download_url: "https://example.com/a".into(),
            },
            ReleaseAsset {
                name: "README.md".into(),
                content_type: "text/markdown".into(),
                download_url: "https://example.com/b".into(),
            },
        ];
        let filtered: Vec<_> = assets.into_iter().filter(|a| BINARY_ASSET_CONTENT_TYPES.contains(&a.content_type.as_str())).collect();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Foo.framework.zip");
    }
}
