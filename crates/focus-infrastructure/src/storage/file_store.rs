//! Directory-backed durable store with atomic writes.
//!
//! One file per key. Writes go to a temporary file which is fsynced and then
//! renamed over the target, under an exclusive lock file, so a reader in
//! another process sees either the old or the new value.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write as IoWrite};
use std::path::{Path, PathBuf};

use focus_core::error::{FocusError, Result};
use focus_core::store::DurableStore;

const VALUE_EXTENSION: &str = "json";

/// A [`DurableStore`] persisted under a directory.
///
/// Capacity is the total size of all stored values.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    capacity_bytes: usize,
}

impl FileStore {
    pub fn new(dir: PathBuf, capacity_bytes: usize) -> Self {
        Self {
            dir,
            capacity_bytes,
        }
    }

    /// Maps a key to its file, replacing characters unsafe in file names.
    fn value_path(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.{}", file_stem, VALUE_EXTENSION))
    }

    fn temp_path(path: &Path) -> Result<PathBuf> {
        let parent = path
            .parent()
            .ok_or_else(|| FocusError::persistence("store path has no parent directory"))?;
        let file_name = path
            .file_name()
            .ok_or_else(|| FocusError::persistence("store path has no file name"))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }

    /// Bytes used by every value except the one at `exclude`.
    fn used_bytes(&self, exclude: &Path) -> Result<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(unavailable("failed to scan store directory", e)),
        };
        let mut used = 0usize;
        for entry in entries {
            let entry = entry.map_err(|e| unavailable("failed to scan store directory", e))?;
            let path = entry.path();
            if path == exclude
                || path.extension().and_then(|ext| ext.to_str()) != Some(VALUE_EXTENSION)
            {
                continue;
            }
            let len = entry
                .metadata()
                .map_err(|e| unavailable("failed to stat stored value", e))?
                .len();
            used = used.saturating_add(usize::try_from(len).unwrap_or(usize::MAX));
        }
        Ok(used)
    }
}

fn unavailable(context: &str, err: std::io::Error) -> FocusError {
    FocusError::persistence(format!("{}: {} (kind: {:?})", context, err, err.kind()))
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.value_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(unavailable("failed to read stored value", e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.value_path(key);
        fs::create_dir_all(&self.dir)
            .map_err(|e| unavailable("failed to create store directory", e))?;

        let _lock = FileLock::acquire(&path)?;

        let needed = self.used_bytes(&path)?.saturating_add(value.len());
        if needed > self.capacity_bytes {
            return Err(FocusError::persistence(format!(
                "quota exceeded: {} of {} bytes",
                needed, self.capacity_bytes
            )));
        }

        let tmp_path = Self::temp_path(&path)?;
        let mut tmp_file =
            File::create(&tmp_path).map_err(|e| unavailable("failed to create temp file", e))?;
        tmp_file
            .write_all(value)
            .map_err(|e| unavailable("failed to write temp file", e))?;
        tmp_file
            .sync_all()
            .map_err(|e| unavailable("failed to sync temp file", e))?;
        drop(tmp_file);

        fs::rename(&tmp_path, &path).map_err(|e| unavailable("failed to replace value", e))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.value_path(key);
        if !self.dir.exists() {
            return Ok(());
        }
        let _lock = FileLock::acquire(&path)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable("failed to delete value", e)),
        }
    }
}

/// Exclusive lock on `<value>.lock`, released on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| unavailable("failed to open lock file", e))?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| unavailable("failed to acquire lock", e))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
