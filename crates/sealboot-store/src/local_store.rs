use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::{SecretStore, Tags};

const ENTRY_SUFFIX: &str = ".secret";

/// On-disk form of one entry.
#[derive(Debug, Serialize, Deserialize)]
struct EntryFile {
    value: String,
    #[serde(default)]
    secure: bool,
    #[serde(default)]
    tags: Tags,
}

/// Directory-backed store for development and tests.
///
/// Entry `/a/b/0` lives at `<root>/a/b/0.secret`. Values are NOT encrypted;
/// files are created owner-only (0600) by the temp-file-and-rename write.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: &str) -> Result<Self> {
        let root = PathBuf::from(root);
        fs::create_dir_all(&root)?;
        let root = fs::canonicalize(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject names that could escape the store root.
    fn validate_name(name: &str) -> Result<()> {
        let invalid = |reason: &str| StoreError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        let Some(rest) = name.strip_prefix('/') else {
            return Err(invalid("must begin with '/'"));
        };
        if name.contains('\\') {
            return Err(invalid("contains backslash"));
        }
        for segment in rest.split('/') {
            match segment {
                "" => return Err(invalid("empty path segment")),
                "." | ".." => return Err(invalid("relative path segment")),
                _ => {}
            }
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        Self::validate_name(name)?;
        let mut path = self.root.join(name.trim_start_matches('/'));
        let mut file_name = path
            .file_name()
            .map(|f| f.to_os_string())
            .unwrap_or_default();
        file_name.push(ENTRY_SUFFIX);
        path.set_file_name(file_name);
        Ok(path)
    }

    fn atomic_write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl SecretStore for LocalStore {
    fn put(&self, name: &str, value: &str, tags: &Tags, secure: bool) -> Result<()> {
        let path = self.resolve(name)?;
        let entry = EntryFile {
            value: value.to_string(),
            secure,
            tags: tags.clone(),
        };
        let data = serde_yaml::to_string(&entry).map_err(|e| StoreError::Terminal {
            op: "put",
            name: name.to_string(),
            code: "SerializationError".into(),
            message: e.to_string(),
        })?;
        self.atomic_write(&path, data.as_bytes())?;
        tracing::debug!("local store: wrote {name}");
        Ok(())
    }

    fn get(&self, name: &str, _decrypt: bool) -> Result<String> {
        let path = self.resolve(name)?;
        let data = match fs::read_to_string(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let entry: EntryFile = serde_yaml::from_str(&data).map_err(|e| StoreError::Terminal {
            op: "get",
            name: name.to_string(),
            code: "CorruptEntry".into(),
            message: e.to_string(),
        })?;
        Ok(entry.value)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().to_str().unwrap()).unwrap();
        (dir, store)
    }

    #[test]
    fn roundtrip_with_tags() {
        let (_dir, store) = store();
        let mut tags = Tags::new();
        tags.insert("Name".into(), "cp-0".into());
        store.put("/cluster.x-k8s.io/abc/0", "Zm9v", &tags, true).unwrap();
        assert_eq!(store.get("/cluster.x-k8s.io/abc/0", true).unwrap(), "Zm9v");
        assert!(store.root().join("cluster.x-k8s.io/abc/0.secret").is_file());
    }

    #[test]
    fn overwrite_replaces_value() {
        let (_dir, store) = store();
        store.put("/p/0", "one", &Tags::new(), true).unwrap();
        store.put("/p/0", "two", &Tags::new(), true).unwrap();
        assert_eq!(store.get("/p/0", true).unwrap(), "two");
    }

    #[test]
    fn group_and_chunk_names_do_not_collide() {
        let (_dir, store) = store();
        store.put("/p", "group", &Tags::new(), true).unwrap();
        store.put("/p/0", "chunk", &Tags::new(), true).unwrap();
        assert_eq!(store.get("/p", true).unwrap(), "group");
        assert_eq!(store.get("/p/0", true).unwrap(), "chunk");
    }

    #[test]
    fn delete_twice_reports_not_found() {
        let (_dir, store) = store();
        store.put("/p/0", "x", &Tags::new(), true).unwrap();
        store.delete("/p/0").unwrap();
        assert!(store.delete("/p/0").unwrap_err().is_not_found());
        assert!(store.get("/p/0", true).unwrap_err().is_not_found());
    }

    #[test]
    fn rejects_unsafe_names() {
        let (_dir, store) = store();
        for name in ["relative/0", "/a/../b", "/a//b", "/a\\b", "/a/./b"] {
            match store.put(name, "x", &Tags::new(), true) {
                Err(StoreError::InvalidName { .. }) => {}
                other => panic!("expected InvalidName for {name}, got: {other:?}"),
            }
        }
    }
}
