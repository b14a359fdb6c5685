//! Network preferences core: the validated settings model, commit workflow
//! and custom-certificate trust store behind a desktop application's network
//! preference pane, without the pane.
//!
//! - remote-control listener settings with user-port validation,
//! - HTTP proxy settings with optional authentication,
//! - a certificate list synchronized against a backing trust store,
//! - a connectivity probe that tries candidate proxy settings and always
//!   restores the committed ones.
//!
//! Edits stage in an [`EditBuffer`]; nothing reaches the committed
//! [`SettingsStore`], the running listener, the system proxy registration or
//! the trust store until the [`CommitCoordinator`] applies them. UI, file
//! pickers and the listener socket itself stay behind the traits in
//! [`services`].

pub mod certificate;
pub mod commit;
pub mod probe;
pub mod services;
pub mod settings;
pub mod sync;
pub mod system;
pub mod truststore;
pub mod validation;

pub use certificate::{CUSTOM_ALIAS_SUFFIX, CertificateEntry};
pub use commit::CommitCoordinator;
pub use probe::{HttpProber, PROBE_URL, check_connection};
pub use services::{LogNotifier, Notifier, ProxyRegistrar, Reachability, RemoteListener};
pub use settings::{EditBuffer, ProxySettings, RemoteSettings, SettingsStore};
pub use sync::{CertificateAddition, CertificateDelta, CertificateList};
pub use system::SystemProxyRegistrar;
pub use truststore::{FileTrustStore, TrustStore};
pub use validation::{ValidationMessage, validate_all};
