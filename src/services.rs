use crate::settings::ProxySettings;

/// Lifecycle handle for the remote-control listener. Owned by the process
/// composition root and injected into the commit coordinator; starting and
/// stopping are synchronous.
pub trait RemoteListener {
    fn start(&mut self, port: u16) -> Result<(), String>;

    fn stop(&mut self);
}

/// Applies proxy settings to the active network stack. `Ok` carries a
/// human-readable detail of what was configured where.
pub trait ProxyRegistrar {
    fn register(&mut self, settings: &ProxySettings) -> Result<String, String>;
}

/// Reachability check against a single URL through the given proxy settings.
/// Transport-level failures may surface as `Err`; callers treat them the same
/// as an unreachable endpoint.
pub trait Reachability {
    fn can_reach(&self, url: &str, proxy: &ProxySettings) -> Result<bool, String>;
}

/// User-facing notification sink. Implementations block until the user
/// acknowledges the message.
pub trait Notifier {
    fn information(&self, title: &str, message: &str);

    fn warning(&self, title: &str, message: &str);

    fn error(&self, title: &str, message: &str);
}

/// Notifier for headless use: messages go to the log and nothing blocks.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn information(&self, title: &str, message: &str) {
        log::info!("[notify] {title}: {message}");
    }

    fn warning(&self, title: &str, message: &str) {
        log::warn!("[notify] {title}: {message}");
    }

    fn error(&self, title: &str, message: &str) {
        log::error!("[notify] {title}: {message}");
    }
}
