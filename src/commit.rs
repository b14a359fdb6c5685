use std::path::Path;

use crate::{
    services::{Notifier, ProxyRegistrar, RemoteListener},
    settings::{EditBuffer, ProxySettings, SettingsStore},
    sync::CertificateAddition,
    truststore::TrustStore,
    validation::validate_all,
};

/// Orchestrates validate → apply across the three settings groups. The three
/// commit steps apply independently: a failure aborts the remaining steps but
/// rolls nothing back.
///
/// Callers are responsible for sequencing — `commit` assumes `validate` was
/// called and passed.
pub struct CommitCoordinator {
    store: SettingsStore,
    listener: Box<dyn RemoteListener>,
    registrar: Box<dyn ProxyRegistrar>,
    restart_warnings: Vec<String>,
}

impl CommitCoordinator {
    pub fn new(
        store: SettingsStore,
        listener: Box<dyn RemoteListener>,
        registrar: Box<dyn ProxyRegistrar>,
    ) -> Self {
        Self {
            store,
            listener,
            registrar,
            restart_warnings: Vec::new(),
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.store
    }

    pub fn proxy_settings(&self) -> &ProxySettings {
        &self.store.proxy
    }

    /// Snapshot of the committed proxy settings, taken at session start and
    /// threaded into `probe::check_connection` for the post-probe restore.
    pub fn backup_proxy_settings(&self) -> ProxySettings {
        self.store.proxy.clone()
    }

    pub fn restart_warnings(&self) -> &[String] {
        &self.restart_warnings
    }

    /// Runs the validators active for the buffer's toggles and surfaces the
    /// highest-priority failure through the notifier.
    pub fn validate(&self, buffer: &EditBuffer, notifier: &dyn Notifier) -> bool {
        match validate_all(buffer) {
            Ok(()) => true,
            Err(message) => {
                log::info!("[commit] validation failed: {}", message.message);
                notifier.error(message.section, message.message);
                false
            }
        }
    }

    pub fn commit(
        &mut self,
        buffer: &mut EditBuffer,
        trust_store: &mut dyn TrustStore,
    ) -> Result<(), String> {
        self.store_remote_settings(buffer)?;
        self.store_proxy_settings(buffer.proxy_candidate())?;
        self.store_certificate_settings(buffer, trust_store)
    }

    fn store_remote_settings(&mut self, buffer: &EditBuffer) -> Result<(), String> {
        let was_enabled = self.store.remote.enabled;

        // An unparsable port cannot occur after validation; commit just
        // leaves the committed port alone in that case.
        if let Ok(port) = buffer.remote_port.parse::<u16>()
            && port != self.store.remote.port
        {
            self.store.remote.port = port;
            if was_enabled && buffer.remote_enabled {
                self.restart_warnings.push(format!(
                    "Remote server port changed to {port}; restart for the listener to pick it up"
                ));
            }
        }

        self.store.remote.enabled = buffer.remote_enabled;
        if buffer.remote_enabled && !was_enabled {
            log::info!(
                "[commit] starting remote listener on port {}",
                self.store.remote.port
            );
            self.listener.start(self.store.remote.port)?;
        } else if !buffer.remote_enabled && was_enabled {
            log::info!("[commit] stopping remote listener");
            self.listener.stop();
        }

        self.store.save();
        Ok(())
    }

    /// Applies `candidate` as the committed proxy configuration. The
    /// registration side effect only fires when the candidate differs from
    /// what is committed; registration errors propagate before anything is
    /// persisted. Also the workhorse of the connectivity probe.
    pub fn store_proxy_settings(&mut self, candidate: ProxySettings) -> Result<(), String> {
        if candidate != self.store.proxy {
            let detail = self.registrar.register(&candidate)?;
            log::info!("[commit] proxy registered: {detail}");
        }

        self.store.proxy = candidate;
        self.store.save();
        Ok(())
    }

    fn store_certificate_settings(
        &mut self,
        buffer: &mut EditBuffer,
        trust_store: &mut dyn TrustStore,
    ) -> Result<(), String> {
        buffer.certificates.apply_deltas(trust_store)?;
        trust_store.flush()
    }

    /// Imports a certificate file picked by the user into the buffer's list.
    /// A duplicate is reported as a warning and changes nothing.
    pub fn import_certificate(
        &self,
        buffer: &mut EditBuffer,
        path: &Path,
        trust_store: &dyn TrustStore,
        notifier: &dyn Notifier,
    ) -> Result<(), String> {
        match buffer.certificates.add_certificate_file(path, trust_store)? {
            CertificateAddition::Added => Ok(()),
            CertificateAddition::Duplicate => {
                notifier.warning(
                    "Duplicate certificates",
                    "You already added this certificate",
                );
                Ok(())
            }
        }
    }
}
