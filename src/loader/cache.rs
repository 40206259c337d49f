//! Content-addressed compile cache (spec §4.B "Caching").
//!
//! Keyed by `sha256(sourceBytes ∥ normalizedDependencyList)`, laid out the
//! way the teacher's blob storage keys its content-addressed store
//! (`blobs/{hash[..2]}/{hash[2..]}`) — two hex characters of fan-out so a
//! single directory never holds more than a few hundred entries under
//! realistic cache sizes. Entries never expire on time, only on hash miss
//! (a new source byte sequence is simply a new key). Writes are atomic via
//! a temp-file-then-rename, same technique as the teacher's blob writer.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::deps::normalize;

pub struct CompileCache {
    root: PathBuf,
}

/// Computed from `source` and its declared dependencies; stable across
/// reorderings of the dependency list (spec §3 Invariants: "a stale hit is
/// impossible").
pub fn cache_key(source: &str, dependencies: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    for dep in normalize(dependencies) {
        hasher.update(b"\0");
        hasher.update(dep.as_bytes());
    }
    hex::encode(hasher.finalize())
}

impl CompileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        let (prefix, rest) = key.split_at(2.min(key.len()));
        self.root.join("blobs").join(prefix).join(rest)
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.blob_path(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn put(&self, key: &str, compiled: &str) -> anyhow::Result<()> {
        let path = self.blob_path(key);
        let dir = path.parent().expect("blob path has a parent");
        std::fs::create_dir_all(dir)?;

        let tmp = tmp_path_in(dir)?;
        std::fs::write(&tmp, compiled)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn tmp_path_in(dir: &Path) -> anyhow::Result<PathBuf> {
    let unique = uuid::Uuid::new_v4();
    Ok(dir.join(format!(".tmp-{unique}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let cache = CompileCache::new(dir.path());
        let key = cache_key("source", &["a".to_string()]);
        cache.put(&key, "compiled").unwrap();
        assert_eq!(cache.get(&key).unwrap().as_deref(), Some("compiled"));
    }

    #[test]
    fn miss_returns_none() {
        let dir = tempdir().unwrap();
        let cache = CompileCache::new(dir.path());
        assert!(cache.get("deadbeef").unwrap().is_none());
    }

    #[test]
    fn key_is_stable_under_dependency_reordering() {
        let a = cache_key("src", &["x".to_string(), "y".to_string()]);
        let b = cache_key("src", &["y".to_string(), "x".to_string()]);
        assert_eq!(a, b);
    }

    #[test]
    fn key_changes_with_source() {
        let a = cache_key("src-a", &[]);
        let b = cache_key("src-b", &[]);
        assert_ne!(a, b);
    }
}
