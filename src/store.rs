use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;

use crate::domain::Dataset;
use crate::error::FetchError;

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone)]
pub struct Store {
    data_dir: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, FetchError> {
        let cwd = std::env::current_dir().map_err(|err| FetchError::Filesystem(err.to_string()))?;
        let data_dir = Utf8PathBuf::from_path_buf(cwd.join(DEFAULT_DATA_DIR))
            .map_err(|_| FetchError::Filesystem("invalid data directory path".to_string()))?;
        Ok(Self { data_dir })
    }

    pub fn new_with_root(data_dir: Utf8PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    pub fn default_path(&self, dataset: Dataset) -> Utf8PathBuf {
        self.data_dir.join(dataset.entry().file_name)
    }

    pub fn ensure_data_dir(&self) -> Result<(), FetchError> {
        Self::ensure_dir(&self.data_dir)
    }

    pub fn ensure_dir(dir: &Utf8Path) -> Result<(), FetchError> {
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("create {dir}: {err}")))
    }

    pub fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }

    pub fn ensure_parent(path: &Utf8Path) -> Result<(), FetchError> {
        match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => Self::ensure_dir(parent),
            _ => Ok(()),
        }
    }

    /// Writes `content` through a temp file in the destination's directory,
    /// so the destination name only ever holds a complete file.
    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), FetchError> {
        Self::ensure_parent(path)?;
        let mut temp = Self::temp_file_for(path)?;
        temp.write_all(content)
            .map_err(|err| FetchError::Filesystem(format!("write {path}: {err}")))?;
        temp.persist(path.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("persist {path}: {err}")))?;
        Ok(())
    }

    pub fn temp_file_for(path: &Utf8Path) -> Result<tempfile::NamedTempFile, FetchError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        Builder::new()
            .prefix(".cfd-part")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("temp file in {parent}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::new().unwrap();
        assert!(store.data_dir().ends_with("data"));

        let evidence = store.default_path(Dataset::Evidence);
        assert!(evidence.ends_with("data/evidence.json"));

        let test_claims = store.default_path(Dataset::TestClaims);
        assert!(test_claims.ends_with("data/test-claims-unlabelled.json"));
    }

    #[test]
    fn atomic_write_creates_parents() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let path = root.join("nested").join("out.json");

        Store::write_bytes_atomic(&path, b"[1, 2]").unwrap();

        assert_eq!(fs::read(path.as_std_path()).unwrap(), b"[1, 2]");
        let leftovers = fs::read_dir(root.join("nested").as_std_path())
            .unwrap()
            .count();
        assert_eq!(leftovers, 1);
    }
}
