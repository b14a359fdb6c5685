use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{sync::CertificateList, truststore::TrustStore};

/// Lowest port the remote listener may bind; everything below is reserved.
pub const REMOTE_PORT_MINIMUM: u16 = 1025;

pub const DEFAULT_REMOTE_PORT: u16 = 6050;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_remote_port")]
    pub port: u16,
}

fn default_remote_port() -> u16 {
    DEFAULT_REMOTE_PORT
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            port: DEFAULT_REMOTE_PORT,
        }
    }
}

/// The port is kept as the entered string; it is only parsed where a numeric
/// value is actually needed.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    #[serde(default)]
    pub use_proxy: bool,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub use_authentication: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
struct SettingsFile {
    #[serde(default)]
    remote: RemoteSettings,
    #[serde(default)]
    proxy: ProxySettings,
}

/// Committed settings, persisted as a toml file. Values only change through a
/// commit; the edit buffer stages everything else.
pub struct SettingsStore {
    pub remote: RemoteSettings,
    pub proxy: ProxySettings,
    path: PathBuf,
}

impl SettingsStore {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("netprefs")
            .join("settings.toml")
    }

    /// A missing or unreadable file yields defaults; values come from a
    /// trusted persisted source, so no validation happens here.
    pub fn open(path: PathBuf) -> Self {
        let file = match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<SettingsFile>(&content) {
                Ok(file) => {
                    log::info!("[settings] loaded from {}", path.display());
                    file
                }
                Err(error) => {
                    log::warn!("[settings] failed to parse {}: {error}", path.display());
                    SettingsFile::default()
                }
            },
            Err(_) => {
                log::info!(
                    "[settings] no settings file at {}, using defaults",
                    path.display()
                );
                SettingsFile::default()
            }
        };

        Self {
            remote: file.remote,
            proxy: file.proxy,
            path,
        }
    }

    pub fn save(&self) {
        if let Some(parent) = self.path.parent()
            && let Err(error) = std::fs::create_dir_all(parent)
        {
            log::warn!(
                "[settings] failed to create settings directory {}: {error}",
                parent.display()
            );
        }
        let file = SettingsFile {
            remote: self.remote.clone(),
            proxy: self.proxy.clone(),
        };
        match toml::to_string_pretty(&file) {
            Ok(content) => {
                if let Err(error) = std::fs::write(&self.path, content) {
                    log::warn!(
                        "[settings] failed to write {}: {error}",
                        self.path.display()
                    );
                }
            }
            Err(error) => {
                log::warn!("[settings] failed to serialize settings: {error}");
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Session-scoped staging copy of the committed settings. Ports are staged as
/// entered text so a half-typed value never corrupts the committed state.
#[derive(Debug, Default)]
pub struct EditBuffer {
    pub remote_enabled: bool,
    pub remote_port: String,
    pub use_proxy: bool,
    pub proxy_hostname: String,
    pub proxy_port: String,
    pub use_authentication: bool,
    pub proxy_username: String,
    pub proxy_password: String,
    pub certificates: CertificateList,
}

impl EditBuffer {
    pub fn load(store: &SettingsStore, trust_store: &dyn TrustStore) -> Self {
        Self {
            remote_enabled: store.remote.enabled,
            remote_port: store.remote.port.to_string(),
            use_proxy: store.proxy.use_proxy,
            proxy_hostname: store.proxy.hostname.clone(),
            proxy_port: store.proxy.port.clone(),
            use_authentication: store.proxy.use_authentication,
            proxy_username: store.proxy.username.clone(),
            proxy_password: store.proxy.password.clone(),
            certificates: CertificateList::from_store(trust_store),
        }
    }

    /// Builds the proxy settings a commit would apply. Fields are trimmed of
    /// surrounding whitespace; the password is taken verbatim.
    pub fn proxy_candidate(&self) -> ProxySettings {
        ProxySettings {
            use_proxy: self.use_proxy,
            hostname: self.proxy_hostname.trim().to_string(),
            port: self.proxy_port.trim().to_string(),
            use_authentication: self.use_authentication,
            username: self.proxy_username.trim().to_string(),
            password: self.proxy_password.clone(),
        }
    }
}
