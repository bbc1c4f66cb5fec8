//! Content hash naming the CSV output directory.
//!
//! Exports land in `<csv_root>/<hash>`, so runs of different packages or
//! modules never write into the same tree.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Hash used when neither a manifest nor an explicit hash is given.
pub const DEFAULT_HASH: &str = "default";

/// Lowercase hex SHA-256 over the manifest bytes followed by the module
/// name.
pub fn module_hash_bytes(manifest: &[u8], module_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(manifest);
    hasher.update(module_name.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash of a manifest file on disk.
pub fn module_hash(manifest: &Path, module_name: &str) -> std::io::Result<String> {
    let bytes = fs::read(manifest)?;
    Ok(module_hash_bytes(&bytes, module_name))
}

/// Resolve the hash for a run: explicit hash, then manifest, then
/// [`DEFAULT_HASH`].
pub fn resolve_hash(
    explicit: Option<&str>,
    manifest: Option<&Path>,
    module_name: &str,
) -> std::io::Result<String> {
    if let Some(hash) = explicit {
        return Ok(hash.to_string());
    }
    match manifest {
        Some(path) => module_hash(path, module_name),
        None => Ok(DEFAULT_HASH.to_string()),
    }
}

/// `<csv_root>/<hash>`.
pub fn output_root(csv_root: &Path, hash: &str) -> PathBuf {
    csv_root.join(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_depends_on_module() {
        let a = module_hash_bytes(b"package", "map_metrics");
        let b = module_hash_bytes(b"package", "map_other");
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_resolve_order() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("substreams.spkg");
        fs::write(&manifest, b"package").unwrap();

        assert_eq!(
            resolve_hash(Some("cafe"), Some(&manifest), "m").unwrap(),
            "cafe"
        );
        assert_eq!(
            resolve_hash(None, Some(&manifest), "m").unwrap(),
            module_hash_bytes(b"package", "m")
        );
        assert_eq!(resolve_hash(None, None, "m").unwrap(), DEFAULT_HASH);
    }

    #[test]
    fn test_output_root() {
        assert_eq!(
            output_root(Path::new("./csv"), "abc"),
            PathBuf::from("./csv/abc")
        );
    }
}
