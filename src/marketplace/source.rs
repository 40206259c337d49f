//! Marketplace source coordinates (spec §3 "Marketplace Source").
//!
//! An origin is either a direct URL to a manifest-bearing location, or a
//! git-style `owner/repo` coordinate resolved against GitHub's raw content
//! host — the only registry this runtime consumes (spec §1 Non-goals: "not
//! a package registry, only a consumer of git-hosted manifests").

const RAW_GITHUB_HOST: &str = "https://raw.githubusercontent.com";
const DEFAULT_BRANCH: &str = "main";

pub fn manifest_url(origin: &str) -> String {
    if origin.contains("://") {
        format!("{}/manifest.json", origin.trim_end_matches('/'))
    } else {
        format!("{RAW_GITHUB_HOST}/{origin}/{DEFAULT_BRANCH}/manifest.json")
    }
}

pub fn source_content_url(origin: &str, source_path: &str) -> String {
    let source_path = source_path.trim_start_matches('/');
    if origin.contains("://") {
        format!("{}/{}", origin.trim_end_matches('/'), source_path)
    } else {
        format!("{RAW_GITHUB_HOST}/{origin}/{DEFAULT_BRANCH}/{source_path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_raw_github_manifest_url_from_owner_repo() {
        assert_eq!(
            manifest_url("acme/photons"),
            "https://raw.githubusercontent.com/acme/photons/main/manifest.json"
        );
    }

    #[test]
    fn direct_url_origin_is_used_as_a_base() {
        assert_eq!(
            manifest_url("https://photons.example.com/store"),
            "https://photons.example.com/store/manifest.json"
        );
    }

    #[test]
    fn builds_source_content_url() {
        assert_eq!(
            source_content_url("acme/photons", "tools/echo.ts"),
            "https://raw.githubusercontent.com/acme/photons/main/tools/echo.ts"
        );
    }
}
