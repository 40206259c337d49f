//! Network fetch for marketplace manifests and source content, with
//! content-hash verification (spec §4.J "Fetch").

use chrono::Utc;
use reqwest::Client;
use sha2::{Digest, Sha256};

use crate::error::PhotonError;

use super::manifest::{ManifestEntry, SourceManifest};
use super::source::{manifest_url, source_content_url};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub async fn fetch_manifest(client: &Client, source_name: &str, origin: &str) -> Result<SourceManifest, PhotonError> {
    let url = manifest_url(origin);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|_| PhotonError::UpstreamUnavailable(source_name.to_string()))?;

    if !response.status().is_success() {
        return Err(PhotonError::UpstreamUnavailable(source_name.to_string()));
    }

    let entries: Vec<ManifestEntry> = response
        .json()
        .await
        .map_err(|e| PhotonError::internal(format!("malformed manifest from '{source_name}': {e}")))?;

    Ok(SourceManifest {
        entries,
        fetched_at: Utc::now(),
    })
}

/// Fetches an entry's source content and verifies it against its declared
/// `contentHash`, failing with `IntegrityError` on mismatch (spec §4.J,
/// §8 "Integrity mismatch" scenario).
pub async fn fetch_source_content(
    client: &Client,
    origin: &str,
    entry: &ManifestEntry,
) -> Result<String, PhotonError> {
    let url = source_content_url(origin, &entry.source_path);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|_| PhotonError::UpstreamUnavailable(entry.name.clone()))?;

    if !response.status().is_success() {
        return Err(PhotonError::UpstreamUnavailable(entry.name.clone()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PhotonError::internal(format!("reading source for '{}': {e}", entry.name)))?;

    let computed = sha256_hex(&bytes);
    if computed != entry.content_hash {
        return Err(PhotonError::IntegrityError {
            name: entry.name.clone(),
            declared: entry.content_hash.clone(),
            computed,
        });
    }

    String::from_utf8(bytes.to_vec()).map_err(|e| PhotonError::internal(format!("non-UTF8 source: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_stable_hex_sha256() {
        assert_eq!(
            sha256_hex(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
