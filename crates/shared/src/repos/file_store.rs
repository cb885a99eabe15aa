use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{BlobStore, StoreError};

/// One `<key>.json` file per blob inside `dir`.
///
/// Writes go to a temp file that is renamed over the target, so a crash
/// mid-write leaves the previous blob intact. Concurrent writers are not
/// coordinated; the last rename wins.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(StoreError::Unavailable(format!("invalid blob key '{key}'")));
        }

        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl BlobStore for JsonFileStore {
    fn read_blob(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.blob_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_blob(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        let path = self.blob_path(key)?;
        let tmp_path = self.dir.join(format!(".{key}.json.tmp"));

        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &path)?;
        debug!(key, bytes = contents.len(), "blob written");

        Ok(())
    }
}
