//! Temporary CA bundle file.
//!
//! TLS client libraries generally take trusted issuers as a path to a PEM
//! bundle. [`CaStore`] writes the issuers published in federation metadata
//! to a private temporary file and removes it again when dropped, so keep
//! the store alive until every connection using its path has been set up.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use crate::error::Error;

const CASTORE_PREFIX: &str = "fedtlsauthcastore";

/// A write-once, self-deleting PEM bundle file.
pub struct CaStore {
    file: NamedTempFile,
    written: bool,
}

impl CaStore {
    /// Create an empty store in the system temp directory.
    ///
    /// The file is created exclusively with a random suffix.
    pub fn create() -> Result<Self, Error> {
        let file = tempfile::Builder::new()
            .prefix(CASTORE_PREFIX)
            .suffix(".pem")
            .tempfile()?;
        debug!("created CA store at {}", file.path().display());
        Ok(Self {
            file,
            written: false,
        })
    }

    /// Create a store holding `bytes`.
    ///
    /// If writing fails the file is removed before the error is returned.
    pub fn with_contents(bytes: &[u8]) -> Result<Self, Error> {
        Self::filled_with(|file| file.write_all(bytes))
    }

    fn filled_with<F>(fill: F) -> Result<Self, Error>
    where
        F: FnOnce(&mut NamedTempFile) -> io::Result<()>,
    {
        let mut store = Self::create()?;
        store.write_with(fill)?;
        Ok(store)
    }

    /// Write the complete bundle. Only one write is allowed.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.write_with(|file| file.write_all(bytes))
    }

    fn write_with<F>(&mut self, fill: F) -> Result<(), Error>
    where
        F: FnOnce(&mut NamedTempFile) -> io::Result<()>,
    {
        if self.written {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("CA store {} already written", self.path().display()),
            )));
        }
        self.written = true;
        fill(&mut self.file)?;
        let file = self.file.as_file_mut();
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    /// Path of the bundle file. Invalid once the store is dropped.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl fmt::Debug for CaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaStore")
            .field("path", &self.path())
            .field("written", &self.written)
            .finish()
    }
}

impl Drop for CaStore {
    fn drop(&mut self) {
        // NamedTempFile removes the file itself; this only records it.
        debug!("removing CA store {}", self.path().display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &[u8] =
        b"-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

    #[test]
    fn test_write_then_read_back() {
        let mut store = CaStore::create().unwrap();
        store.write(BUNDLE).unwrap();
        assert_eq!(std::fs::read(store.path()).unwrap(), BUNDLE);
    }

    #[test]
    fn test_drop_removes_file() {
        let store = CaStore::with_contents(BUNDLE).unwrap();
        let path = store.path().to_path_buf();
        assert!(path.exists());
        drop(store);
        assert!(!path.exists());
    }

    #[test]
    fn test_second_write_rejected() {
        let mut store = CaStore::with_contents(BUNDLE).unwrap();
        let err = store.write(b"more").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(std::fs::read(store.path()).unwrap(), BUNDLE);
    }

    #[test]
    fn test_failed_write_removes_file() {
        let mut path = None;
        let err = CaStore::filled_with(|file| {
            path = Some(file.path().to_path_buf());
            file.write_all(b"-----BEGIN CERTIFICATE-----\n")?;
            Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
        })
        .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        let path = path.unwrap();
        assert!(path.starts_with(std::env::temp_dir()));
        assert!(!path.exists());
    }

    #[test]
    fn test_unique_paths_with_prefix() {
        let a = CaStore::create().unwrap();
        let b = CaStore::create().unwrap();
        assert_ne!(a.path(), b.path());
        let name = a.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(CASTORE_PREFIX));
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = CaStore::create().unwrap();
        assert!(std::fs::read(store.path()).unwrap().is_empty());
    }
}
