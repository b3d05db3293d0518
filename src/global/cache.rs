use std::io::Write;
use std::path::{Path, PathBuf};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use crate::db::DbFormat;
use crate::error::{CatalogError, CatalogResult};

/// Returns the cache file for the manifest fetched from `url`.
///
/// The file sits next to `prefix` and is named `<prefix>_<hash>.<ext>`, where
/// `<hash>` is the first 16 hex digits of the SHA-256 of the URL.
pub fn cache_path(prefix: &Path, url: &str, format: DbFormat) -> PathBuf {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!("_{}.{}", &digest[..16], format.extension()));
    PathBuf::from(name)
}

/// Atomically replaces the cached manifest at `path` with `bytes`.
pub fn cache_manifest(path: &Path, bytes: &[u8]) -> CatalogResult<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;
        log::debug!("Cache directory created: {}", dir.display());
    }
    let mut file = NamedTempFile::new_in(dir).map_err(|e| CatalogError::io(dir, e))?;
    file.write_all(bytes).map_err(|e| CatalogError::io(file.path(), e))?;
    file.persist(path)
        .map_err(|e| CatalogError::io(path, e.error))?;
    Ok(())
}

/// Reads a cached manifest, returning `None` if it was never fetched.
pub fn read_cached(path: &Path) -> CatalogResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|e| CatalogError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cache_path_is_stable_per_url() {
        let prefix = Path::new("/var/cache/layman/remote");
        let a = cache_path(prefix, "https://example.org/a.json", DbFormat::Json);
        let b = cache_path(prefix, "https://example.org/a.json", DbFormat::Json);
        let c = cache_path(prefix, "https://example.org/b.json", DbFormat::Json);
        assert_eq!(a, b);
        assert_ne!(a, c);
        let name = a.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("remote_"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "remote_".len() + 16 + ".json".len());
    }

    #[test]
    fn test_cache_manifest_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("remote_x.json");
        cache_manifest(&path, b"first").unwrap();
        cache_manifest(&path, b"second").unwrap();
        assert_eq!(read_cached(&path).unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_read_cached_missing_is_none() {
        let dir = tempdir().unwrap();
        assert!(read_cached(&dir.path().join("nothing.json")).unwrap().is_none());
    }
}
