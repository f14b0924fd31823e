use std::path::Path;

use anyhow::{anyhow, Result};

use super::StorageBackend;

const TREE_INVENTORY: &str = "portals_inventory";

/// Sled-backed blob storage; every write is flushed before returning.
pub struct SledStorage {
    _db: sled::Db,
    tree: sled::Tree,
}

impl SledStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let tree = db.open_tree(TREE_INVENTORY)?;
        Ok(Self { _db: db, tree })
    }
}

impl StorageBackend for SledStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(bytes) = self.tree.get(key.as_bytes())? else {
            return Ok(None);
        };
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| anyhow!("stored blob for {} is not utf-8: {}", key, e))?;
        Ok(Some(text))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.tree.insert(key.as_bytes(), value.as_bytes())?;
        self.tree.flush()?;
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<()> {
        self.tree.remove(key.as_bytes())?;
        self.tree.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_get_clear() {
        let dir = TempDir::new().expect("tempdir");
        let mut storage = SledStorage::open(dir.path().join("db")).expect("open");
        assert_eq!(storage.get("inv").unwrap(), None);
        storage.set("inv", "blob-1").unwrap();
        storage.set("inv", "blob-2").unwrap();
        assert_eq!(storage.get("inv").unwrap().as_deref(), Some("blob-2"));
        storage.clear("inv").unwrap();
        assert_eq!(storage.get("inv").unwrap(), None);
    }
}
