//! JSON file backend: one `<data_dir>/<key>.json` file per storage key.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use fs2::FileExt;

use super::StorageBackend;

pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    /// Create the data directory if needed.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|e| {
            anyhow!(
                "Failed to create data directory {}: {}",
                data_dir.display(),
                e
            )
        })?;
        Ok(Self { data_dir })
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(anyhow!("invalid storage key '{}'", key));
        }
        Ok(self.data_dir.join(format!("{}.json", key)))
    }

    /// Sibling temp path for `path`, unique per process and attempt.
    fn temp_path(path: &Path, attempt: u32) -> PathBuf {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("inventory.json");
        path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), attempt))
    }

    /// Replace `path` with `content` via temp file and rename, holding an
    /// exclusive lock on `path` for the duration. The temp file never outlives
    /// a failed write.
    fn write_file_locked(path: &Path, content: &str) -> Result<()> {
        let guard = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| anyhow!("Failed to open {}: {}", path.display(), e))?;
        guard
            .lock_exclusive()
            .map_err(|e| anyhow!("Failed to lock {}: {}", path.display(), e))?;

        let (tmp_path, mut tmp) = (0u32..1024)
            .map(|attempt| Self::temp_path(path, attempt))
            .find_map(|candidate| {
                match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                    Ok(file) => Some(Ok((candidate, file))),
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => None,
                    Err(e) => Some(Err(e)),
                }
            })
            .ok_or_else(|| anyhow!("no free temp name beside {}", path.display()))?
            .map_err(|e| anyhow!("Failed to create temp file for {}: {}", path.display(), e))?;

        let written = tmp
            .write_all(content.as_bytes())
            .and_then(|_| tmp.sync_all());
        drop(tmp);
        let written = written.and_then(|_| fs::rename(&tmp_path, path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(anyhow!("Failed to replace {}: {}", path.display(), e));
        }

        if let Some(dir) = path.parent() {
            if let Ok(dir_file) = File::open(dir) {
                let _ = dir_file.sync_all();
            }
        }
        drop(guard);
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            // Guard against any accidental leading NULs
            Ok(data) => Ok(Some(data.trim_start_matches('\0').to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow!("Failed reading {}: {}", path.display(), e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        Self::write_file_locked(&path, value)
    }

    fn clear(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow!("Failed removing {}: {}", path.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_get_clear() {
        let dir = TempDir::new().expect("tempdir");
        let mut storage = FileStorage::new(dir.path()).expect("storage");
        assert_eq!(storage.get("inv").unwrap(), None);

        storage.set("inv", "{\"items\":[]}").unwrap();
        storage.set("inv", "{\"items\":[1]}").unwrap();
        assert_eq!(storage.get("inv").unwrap().as_deref(), Some("{\"items\":[1]}"));
        assert!(dir.path().join("inv.json").exists());

        storage.clear("inv").unwrap();
        storage.clear("inv").unwrap();
        assert_eq!(storage.get("inv").unwrap(), None);
    }

    #[test]
    fn writes_leave_no_temp_files() {
        let dir = TempDir::new().expect("tempdir");
        let mut storage = FileStorage::new(dir.path()).expect("storage");
        for round in 0..3 {
            storage.set("inv", &format!("{{\"round\":{}}}", round)).unwrap();
        }
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["inv.json".to_string()]);
    }

    #[test]
    fn temp_path_is_hidden_sibling() {
        let tmp = FileStorage::temp_path(Path::new("/data/inv.json"), 2);
        assert_eq!(tmp.parent(), Some(Path::new("/data")));
        let name = tmp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".inv.json."));
        assert!(name.ends_with(".2.tmp"));
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = TempDir::new().expect("tempdir");
        let storage = FileStorage::new(dir.path()).expect("storage");
        for key in ["", "../inv", "a/b", ".hidden"] {
            assert!(storage.path_for(key).is_err(), "key {:?}", key);
        }
    }
}
