use std::time::Duration;

use crate::{
    commit::CommitCoordinator,
    services::{Notifier, Reachability},
    settings::{EditBuffer, ProxySettings},
};

/// Plain-HTTP endpoint that answers 204 from anywhere; good enough to tell
/// "proxy works" from "proxy does not".
pub const PROBE_URL: &str = "http://clients3.google.com/generate_204";

const DIALOG_TITLE: &str = "Check proxy settings";

/// Temporarily commits the buffer's proxy candidate — deliberately without
/// validation, so the probe goes through exactly what the user typed — probes
/// the test endpoint, reports the outcome, and restores `backup` no matter
/// what happened. `backup` is the snapshot taken at session start.
pub fn check_connection(
    coordinator: &mut CommitCoordinator,
    buffer: &EditBuffer,
    backup: &ProxySettings,
    prober: &dyn Reachability,
    notifier: &dyn Notifier,
) {
    let candidate = buffer.proxy_candidate();

    let outcome = match coordinator.store_proxy_settings(candidate) {
        Ok(()) => prober.can_reach(PROBE_URL, coordinator.proxy_settings()),
        Err(error) => Err(error),
    };

    match outcome {
        Ok(true) => notifier.information(DIALOG_TITLE, "Connection successful!"),
        Ok(false) => notifier.error(DIALOG_TITLE, "Connection failed!"),
        Err(error) => {
            log::warn!("[probe] {error}");
            notifier.error(DIALOG_TITLE, "Connection failed!");
        }
    }

    if let Err(error) = coordinator.store_proxy_settings(backup.clone()) {
        log::warn!("[probe] failed to restore proxy settings: {error}");
    }
}

/// Blocking reachability check over reqwest. Connection and protocol errors
/// count as unreachable rather than bubbling up; only building the client
/// fails hard.
pub struct HttpProber {
    timeout: Duration,
}

impl Default for HttpProber {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl HttpProber {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Reachability for HttpProber {
    fn can_reach(&self, url: &str, proxy: &ProxySettings) -> Result<bool, String> {
        let mut builder = reqwest::blocking::Client::builder().timeout(self.timeout);

        if proxy.use_proxy {
            let address = format!("http://{}:{}", proxy.hostname, proxy.port);
            let mut proxy_configuration = reqwest::Proxy::all(address.as_str())
                .map_err(|error| format!("Invalid proxy address {address}: {error}"))?;
            if proxy.use_authentication {
                proxy_configuration =
                    proxy_configuration.basic_auth(&proxy.username, &proxy.password);
            }
            builder = builder.proxy(proxy_configuration);
        }

        let client = builder
            .build()
            .map_err(|error| format!("Failed to build HTTP client: {error}"))?;

        match client.get(url).send() {
            Ok(response) => {
                log::debug!("[probe] {url} answered {}", response.status());
                Ok(response.status().is_success() || response.status().is_redirection())
            }
            Err(error) => {
                log::debug!("[probe] {url} unreachable: {error}");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{ProxyRegistrar, RemoteListener},
        settings::SettingsStore,
    };
    use std::{cell::RefCell, rc::Rc};
    use tempfile::TempDir;

    struct IdleListener;

    impl RemoteListener for IdleListener {
        fn start(&mut self, _port: u16) -> Result<(), String> {
            Ok(())
        }

        fn stop(&mut self) {}
    }

    struct RecordingRegistrar(Rc<RefCell<Vec<ProxySettings>>>);

    impl ProxyRegistrar for RecordingRegistrar {
        fn register(&mut self, settings: &ProxySettings) -> Result<String, String> {
            self.0.borrow_mut().push(settings.clone());
            Ok("recorded".into())
        }
    }

    enum ProbeOutcome {
        Reachable,
        Unreachable,
        TransportError,
    }

    struct FixedProber(ProbeOutcome);

    impl Reachability for FixedProber {
        fn can_reach(&self, _url: &str, _proxy: &ProxySettings) -> Result<bool, String> {
            match self.0 {
                ProbeOutcome::Reachable => Ok(true),
                ProbeOutcome::Unreachable => Ok(false),
                ProbeOutcome::TransportError => Err("connection reset".into()),
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        information: RefCell<Vec<String>>,
        errors: RefCell<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn information(&self, _title: &str, message: &str) {
            self.information.borrow_mut().push(message.to_string());
        }

        fn warning(&self, _title: &str, _message: &str) {}

        fn error(&self, _title: &str, message: &str) {
            self.errors.borrow_mut().push(message.to_string());
        }
    }

    fn coordinator(
        directory: &TempDir,
    ) -> (CommitCoordinator, Rc<RefCell<Vec<ProxySettings>>>) {
        let mut store = SettingsStore::open(directory.path().join("settings.toml"));
        store.proxy.use_proxy = true;
        store.proxy.hostname = "old-proxy.example.com".into();
        store.proxy.port = "3128".into();

        let registrations = Rc::new(RefCell::new(Vec::new()));
        let coordinator = CommitCoordinator::new(
            store,
            Box::new(IdleListener),
            Box::new(RecordingRegistrar(registrations.clone())),
        );
        (coordinator, registrations)
    }

    fn probe_buffer() -> EditBuffer {
        EditBuffer {
            use_proxy: true,
            proxy_hostname: "new-proxy.example.com".into(),
            proxy_port: "8080".into(),
            ..EditBuffer::default()
        }
    }

    #[test]
    fn probe_restores_the_backup_whatever_the_outcome() {
        for outcome in [
            ProbeOutcome::Reachable,
            ProbeOutcome::Unreachable,
            ProbeOutcome::TransportError,
        ] {
            let directory = TempDir::new().unwrap();
            let (mut coordinator, _) = coordinator(&directory);
            let backup = coordinator.backup_proxy_settings();
            let notifier = RecordingNotifier::default();

            check_connection(
                &mut coordinator,
                &probe_buffer(),
                &backup,
                &FixedProber(outcome),
                &notifier,
            );

            assert_eq!(coordinator.proxy_settings(), &backup);
        }
    }

    #[test]
    fn probe_registers_the_candidate_and_then_the_backup() {
        let directory = TempDir::new().unwrap();
        let (mut coordinator, registrations) = coordinator(&directory);
        let backup = coordinator.backup_proxy_settings();
        let notifier = RecordingNotifier::default();

        check_connection(
            &mut coordinator,
            &probe_buffer(),
            &backup,
            &FixedProber(ProbeOutcome::Reachable),
            &notifier,
        );

        let registrations = registrations.borrow();
        assert_eq!(registrations.len(), 2);
        assert_eq!(registrations[0].hostname, "new-proxy.example.com");
        assert_eq!(registrations[1], backup);
    }

    #[test]
    fn success_and_failure_are_reported_through_the_notifier() {
        let directory = TempDir::new().unwrap();
        let (mut coordinator, _) = coordinator(&directory);
        let backup = coordinator.backup_proxy_settings();

        let notifier = RecordingNotifier::default();
        check_connection(
            &mut coordinator,
            &probe_buffer(),
            &backup,
            &FixedProber(ProbeOutcome::Reachable),
            &notifier,
        );
        assert_eq!(notifier.information.borrow().len(), 1);
        assert_eq!(notifier.information.borrow()[0], "Connection successful!");

        let notifier = RecordingNotifier::default();
        check_connection(
            &mut coordinator,
            &probe_buffer(),
            &backup,
            &FixedProber(ProbeOutcome::TransportError),
            &notifier,
        );
        assert_eq!(notifier.errors.borrow().len(), 1);
        assert_eq!(notifier.errors.borrow()[0], "Connection failed!");
    }
}
