use std::path::{Path, PathBuf};

use crate::{certificate::CertificateEntry, truststore::TrustStore};

/// A trust-store mutation recorded by a list edit but not yet performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateDelta {
    Added { alias: String, path: PathBuf },
    Removed { alias: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateAddition {
    Added,
    /// An entry with the same alias already exists; the list is unchanged.
    Duplicate,
}

/// The editable certificate list. Edits only record deltas; `apply_deltas`
/// performs the trust-store calls, so list manipulation stays free of I/O.
#[derive(Debug, Default)]
pub struct CertificateList {
    entries: Vec<CertificateEntry>,
    pending: Vec<CertificateDelta>,
}

impl CertificateList {
    pub fn from_store(store: &dyn TrustStore) -> Self {
        Self {
            entries: store.certificates(),
            pending: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[CertificateEntry] {
        &self.entries
    }

    pub fn pending_deltas(&self) -> &[CertificateDelta] {
        &self.pending
    }

    /// Imports a certificate file. The alias is derived from the content's
    /// thumbprint alone, so a second file with identical content is a
    /// duplicate no matter where it came from.
    pub fn add_certificate_file(
        &mut self,
        path: &Path,
        store: &dyn TrustStore,
    ) -> Result<CertificateAddition, String> {
        let entry = CertificateEntry::from_file(path)?;
        let alias = entry.alias();

        if store.contains(&alias) || self.entries.iter().any(|existing| existing.alias() == alias)
        {
            log::info!(
                "[certificates] rejected duplicate {alias} from {}",
                path.display()
            );
            return Ok(CertificateAddition::Duplicate);
        }

        log::info!("[certificates] added {alias} from {}", path.display());
        self.pending.push(CertificateDelta::Added {
            alias,
            path: path.to_path_buf(),
        });
        self.entries.push(entry);
        Ok(CertificateAddition::Added)
    }

    /// Removes the entry at `index`. A pending, never-applied addition with
    /// the same alias is cancelled instead of recording a removal.
    pub fn remove(&mut self, index: usize) -> Option<CertificateEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        let alias = entry.alias();

        let unapplied = self.pending.iter().position(
            |delta| matches!(delta, CertificateDelta::Added { alias: added, .. } if *added == alias),
        );
        match unapplied {
            Some(position) => {
                log::debug!("[certificates] cancelled pending addition of {alias}");
                self.pending.remove(position);
            }
            None => {
                log::info!("[certificates] removed {alias}");
                self.pending.push(CertificateDelta::Removed { alias });
            }
        }
        Some(entry)
    }

    /// Performs the recorded trust-store calls in order. A failing call stays
    /// pending together with everything after it.
    pub fn apply_deltas(&mut self, store: &mut dyn TrustStore) -> Result<(), String> {
        while let Some(delta) = self.pending.first().cloned() {
            match &delta {
                CertificateDelta::Added { alias, path } => store.add_certificate(alias, path)?,
                CertificateDelta::Removed { alias } => store.delete_certificate(alias)?,
            }
            self.pending.remove(0);
        }
        Ok(())
    }
}
