use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::certificate::{CUSTOM_ALIAS_SUFFIX, CertificateEntry, load_certificate_der, thumbprint};

/// Backing store for trusted certificates, keyed by alias. Mutations are
/// staged until `flush`, which must be idempotent: flushing twice without an
/// intervening mutation is a no-op.
pub trait TrustStore {
    /// The user-imported certificates currently in the store.
    fn certificates(&self) -> Vec<CertificateEntry>;

    fn contains(&self, alias: &str) -> bool;

    /// Loads the certificate bytes from `path` and stages them under `alias`.
    fn add_certificate(&mut self, alias: &str, path: &Path) -> Result<(), String>;

    fn delete_certificate(&mut self, alias: &str) -> Result<(), String>;

    /// Persists staged mutations to durable storage.
    fn flush(&mut self) -> Result<(), String>;
}

/// Trust store backed by a directory of raw DER files, one `<alias>.der` per
/// certificate. The directory is read once at open; adds and deletes stay in
/// memory until `flush` rewrites the directory.
pub struct FileTrustStore {
    directory: PathBuf,
    entries: BTreeMap<String, Vec<u8>>,
    dirty: bool,
}

const CERTIFICATE_EXTENSION: &str = "der";

impl FileTrustStore {
    pub fn default_directory() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("netprefs")
            .join("truststore")
    }

    pub fn open(directory: PathBuf) -> Self {
        if let Err(error) = std::fs::create_dir_all(&directory) {
            log::warn!(
                "[truststore] failed to create trust store directory {}: {error}",
                directory.display()
            );
        }

        let mut entries = BTreeMap::new();
        match std::fs::read_dir(&directory) {
            Ok(directory_entries) => {
                for entry in directory_entries.flatten() {
                    let path = entry.path();
                    if path.extension().and_then(|extension| extension.to_str())
                        != Some(CERTIFICATE_EXTENSION)
                    {
                        continue;
                    }
                    let Some(alias) = path.file_stem().and_then(|stem| stem.to_str()) else {
                        continue;
                    };
                    match std::fs::read(&path) {
                        Ok(der) => {
                            log::debug!("[truststore] loaded: {alias}");
                            entries.insert(alias.to_string(), der);
                        }
                        Err(error) => {
                            log::warn!(
                                "[truststore] failed to read {}: {error}",
                                path.display()
                            );
                        }
                    }
                }
            }
            Err(error) => {
                log::warn!(
                    "[truststore] failed to read {}: {error}",
                    directory.display()
                );
            }
        }

        log::info!(
            "[truststore] opened {} with {} certificates",
            directory.display(),
            entries.len()
        );

        Self {
            directory,
            entries,
            dirty: false,
        }
    }

    fn certificate_path(&self, alias: &str) -> PathBuf {
        self.directory
            .join(format!("{alias}.{CERTIFICATE_EXTENSION}"))
    }
}

impl TrustStore for FileTrustStore {
    fn certificates(&self) -> Vec<CertificateEntry> {
        self.entries
            .keys()
            .filter_map(|alias| alias.strip_suffix(CUSTOM_ALIAS_SUFFIX))
            .map(|stripped| CertificateEntry::new(stripped.to_string(), None))
            .collect()
    }

    fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    fn add_certificate(&mut self, alias: &str, path: &Path) -> Result<(), String> {
        let der = load_certificate_der(path)?;
        let expected = thumbprint(&der);
        if !alias.starts_with(&expected) {
            log::warn!(
                "[truststore] alias {alias} does not match the thumbprint of {}",
                path.display()
            );
        }
        log::info!("[truststore] staged {alias} from {}", path.display());
        self.entries.insert(alias.to_string(), der);
        self.dirty = true;
        Ok(())
    }

    fn delete_certificate(&mut self, alias: &str) -> Result<(), String> {
        if self.entries.remove(alias).is_some() {
            log::info!("[truststore] staged removal of {alias}");
            self.dirty = true;
        } else {
            log::warn!("[truststore] cannot delete unknown alias {alias}");
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), String> {
        if !self.dirty {
            log::debug!("[truststore] flush: nothing pending");
            return Ok(());
        }

        // Drop files for removed aliases first, then write the current set.
        if let Ok(directory_entries) = std::fs::read_dir(&self.directory) {
            for entry in directory_entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|extension| extension.to_str())
                    != Some(CERTIFICATE_EXTENSION)
                {
                    continue;
                }
                let stale = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_none_or(|alias| !self.entries.contains_key(alias));
                if stale {
                    std::fs::remove_file(&path).map_err(|error| {
                        format!("Failed to remove {}: {error}", path.display())
                    })?;
                }
            }
        }

        for (alias, der) in &self.entries {
            let path = self.certificate_path(alias);
            std::fs::write(&path, der)
                .map_err(|error| format!("Failed to write {}: {error}", path.display()))?;
        }

        self.dirty = false;
        log::info!(
            "[truststore] flushed {} certificates to {}",
            self.entries.len(),
            self.directory.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::custom_alias;
    use tempfile::TempDir;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn write_certificate(directory: &Path, name: &str, content: &[u8]) -> (PathBuf, String) {
        let path = directory.join(name);
        std::fs::write(&path, content).unwrap();
        (path, custom_alias(&thumbprint(content)))
    }

    #[test]
    fn added_certificates_are_visible_before_flush() {
        let directory = TempDir::new().unwrap();
        let (source, alias) = write_certificate(directory.path(), "server.cer", b"certificate");
        let mut store = FileTrustStore::open(directory.path().join("truststore"));

        store.add_certificate(&alias, &source).unwrap();
        assert!(store.contains(&alias));
        assert_eq!(store.certificates().len(), 1);
        // Staged only, nothing on disk yet.
        assert!(!store.certificate_path(&alias).exists());
    }

    #[test]
    fn flush_persists_and_reopen_lists_the_entry() {
        init_logging();
        let directory = TempDir::new().unwrap();
        let (source, alias) = write_certificate(directory.path(), "server.cer", b"certificate");
        let store_directory = directory.path().join("truststore");

        let mut store = FileTrustStore::open(store_directory.clone());
        store.add_certificate(&alias, &source).unwrap();
        store.flush().unwrap();
        assert!(store.certificate_path(&alias).exists());

        let reopened = FileTrustStore::open(store_directory);
        assert!(reopened.contains(&alias));
        let certificates = reopened.certificates();
        assert_eq!(certificates.len(), 1);
        assert_eq!(certificates[0].thumbprint, thumbprint(b"certificate"));
        assert_eq!(certificates[0].source_path, None);
    }

    #[test]
    fn delete_and_flush_removes_the_file() {
        let directory = TempDir::new().unwrap();
        let (source, alias) = write_certificate(directory.path(), "server.cer", b"certificate");
        let mut store = FileTrustStore::open(directory.path().join("truststore"));

        store.add_certificate(&alias, &source).unwrap();
        store.flush().unwrap();
        store.delete_certificate(&alias).unwrap();
        store.flush().unwrap();

        assert!(!store.contains(&alias));
        assert!(!store.certificate_path(&alias).exists());
    }

    #[test]
    fn flush_without_pending_mutations_is_a_no_op() {
        init_logging();
        let directory = TempDir::new().unwrap();
        let (source, alias) = write_certificate(directory.path(), "server.cer", b"certificate");
        let mut store = FileTrustStore::open(directory.path().join("truststore"));

        store.add_certificate(&alias, &source).unwrap();
        store.flush().unwrap();

        // A second flush with nothing staged must not rewrite the directory:
        // remove the file behind the store's back and check it stays gone.
        std::fs::remove_file(store.certificate_path(&alias)).unwrap();
        store.flush().unwrap();
        assert!(!store.certificate_path(&alias).exists());
    }

    #[test]
    fn only_custom_aliases_are_listed() {
        let directory = TempDir::new().unwrap();
        let store_directory = directory.path().join("truststore");
        std::fs::create_dir_all(&store_directory).unwrap();
        std::fs::write(store_directory.join("builtin-root.der"), b"root").unwrap();

        let store = FileTrustStore::open(store_directory);
        assert!(store.contains("builtin-root"));
        assert!(store.certificates().is_empty());
    }
}
