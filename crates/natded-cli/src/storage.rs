//! File-backed session storage.
//!
//! A bare key such as `lecture` maps to `<data dir>/lecture.ndp`. A key that
//! already looks like a path (it has an extension or a directory part) is
//! used as given, relative to the working directory.

use natded_core::{CoreError, CoreResult, Storage, FILE_EXTENSION};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    /// `natded/` under the platform data directory, or the working directory.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("natded"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let path = Path::new(key);
        let has_dir = path.components().count() > 1 || path.is_absolute();
        if has_dir || path.extension().is_some() {
            path.to_path_buf()
        } else {
            self.dir.join(format!("{}.{}", key, FILE_EXTENSION))
        }
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        FileStorage::new(Self::default_dir())
    }
}

fn storage_error(key: &str, err: std::io::Error) -> CoreError {
    CoreError::Storage {
        key: key.to_string(),
        message: err.to_string(),
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> CoreResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(key, e)),
        }
    }

    fn write(&mut self, key: &str, contents: &str) -> CoreResult<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage_error(key, e))?;
        }
        fs::write(&path, contents).map_err(|e| storage_error(key, e))?;
        debug!(path = %path.display(), bytes = contents.len(), "wrote session file");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> CoreResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_resolution() {
        let storage = FileStorage::new("/data");
        assert_eq!(storage.path_for("lecture"), PathBuf::from("/data/lecture.ndp"));
        assert_eq!(storage.path_for("proof.json"), PathBuf::from("proof.json"));
        assert_eq!(storage.path_for("out/proof"), PathBuf::from("out/proof"));
    }

    #[test]
    fn test_read_write_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("sessions"));

        assert_eq!(storage.read("s1").unwrap(), None);
        storage.write("s1", "[]").unwrap();
        assert_eq!(storage.read("s1").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("sessions/s1.ndp").exists());

        storage.remove("s1").unwrap();
        assert_eq!(storage.read("s1").unwrap(), None);
        storage.remove("s1").unwrap();
    }

    #[test]
    fn test_workspace_round_trip_through_files() {
        use natded_core::{parse_expr, RuleCatalog, Workspace};

        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());
        let mut ws = Workspace::new(RuleCatalog::default());
        ws.add_goal(parse_expr("P => P").unwrap());
        ws.save(&mut storage, "demo").unwrap();

        let mut other = Workspace::new(RuleCatalog::default());
        assert!(other.load(&storage, "demo").unwrap());
        assert_eq!(other.items(), ws.items());
    }

    #[test]
    fn test_unreadable_path_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where a file is expected.
        std::fs::create_dir(dir.path().join("taken.ndp")).unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.read("taken"),
            Err(CoreError::Storage { .. })
        ));
    }
}
