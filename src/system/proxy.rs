use std::path::PathBuf;

use super::{run_silent, run_silent_with_output};
use crate::settings::ProxySettings;

/// Proxy configuration in the form the backends consume: numeric port,
/// credentials only when authentication is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    pub host: String,
    pub port: u16,
    pub credentials: Option<(String, String)>,
}

impl ProxyTarget {
    /// `Ok(None)` when the proxy is disabled; `Err` when the staged port is
    /// not a valid port number.
    pub fn from_settings(settings: &ProxySettings) -> Result<Option<Self>, String> {
        if !settings.use_proxy {
            return Ok(None);
        }

        let port = settings
            .port
            .parse::<u16>()
            .map_err(|error| format!("Invalid proxy port {:?}: {error}", settings.port))?;

        let credentials = settings
            .use_authentication
            .then(|| (settings.username.clone(), settings.password.clone()));

        Ok(Some(Self {
            host: settings.hostname.clone(),
            port,
            credentials,
        }))
    }
}

pub trait ProxyBackend: Send {
    fn name(&self) -> &str;

    fn set(&mut self, target: &ProxyTarget) -> Result<String, String>;

    fn clear(&mut self);
}

/// Multiple backends may be returned (e.g. both GSettings and KDE KIO).
pub fn detect() -> Vec<Box<dyn ProxyBackend>> {
    let mut backends: Vec<Box<dyn ProxyBackend>> = Vec::new();

    if GnomeProxy::is_available() {
        log::info!("[proxy] detected backend: GSettings (GNOME-based)");
        backends.push(Box::new(GnomeProxy));
    }

    if KdeProxy::is_available() {
        log::info!("[proxy] detected backend: KDE KIO");
        backends.push(Box::new(KdeProxy));
    }

    if backends.is_empty() {
        let desktop = std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default();
        log::warn!(
            "[proxy] no proxy backend detected for desktop '{}'",
            if desktop.is_empty() {
                "unknown"
            } else {
                &desktop
            },
        );
    }

    backends
}

pub fn set_all(target: &ProxyTarget) -> (Vec<Box<dyn ProxyBackend>>, String) {
    let mut backends = detect();
    let mut details: Vec<String> = Vec::new();

    for backend in &mut backends {
        match backend.set(target) {
            Ok(detail) => {
                log::info!("[proxy] {} set OK: {detail}", backend.name());
                details.push(detail);
            }
            Err(detail) => {
                log::warn!("[proxy] {} set FAILED: {detail}", backend.name());
                details.push(detail);
            }
        }
    }

    let combined = if details.is_empty() {
        "No proxy backend available".to_string()
    } else {
        details.join("; ")
    };

    (backends, combined)
}

pub fn clear_all(backends: &mut [Box<dyn ProxyBackend>]) {
    for backend in backends {
        log::info!("[proxy] clearing proxy via {}", backend.name());
        backend.clear();
    }
}

pub struct GnomeProxy;

impl GnomeProxy {
    pub fn is_available() -> bool {
        let desktop = std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default();
        desktop.split(':').any(|d| {
            matches!(
                d,
                "GNOME" | "Unity" | "Cinnamon" | "X-Cinnamon" | "MATE" | "Budgie" | "Pantheon"
            )
        })
    }
}

impl ProxyBackend for GnomeProxy {
    fn name(&self) -> &str {
        "GSettings"
    }

    fn set(&mut self, target: &ProxyTarget) -> Result<String, String> {
        let port_string = target.port.to_string();

        log::info!(
            "[proxy] GSettings: setting HTTP proxy to {}:{}",
            target.host,
            target.port,
        );

        for protocol in &["http", "https"] {
            run_silent(
                "gsettings",
                &[
                    "set",
                    &format!("org.gnome.system.proxy.{protocol}"),
                    "host",
                    &target.host,
                ],
            );
            run_silent(
                "gsettings",
                &[
                    "set",
                    &format!("org.gnome.system.proxy.{protocol}"),
                    "port",
                    &port_string,
                ],
            );
        }

        for protocol in &["socks", "ftp"] {
            run_silent(
                "gsettings",
                &[
                    "set",
                    &format!("org.gnome.system.proxy.{protocol}"),
                    "host",
                    "",
                ],
            );
            run_silent(
                "gsettings",
                &[
                    "set",
                    &format!("org.gnome.system.proxy.{protocol}"),
                    "port",
                    "0",
                ],
            );
        }

        // Only the http schema carries authentication keys.
        match &target.credentials {
            Some((username, password)) => {
                run_silent(
                    "gsettings",
                    &[
                        "set",
                        "org.gnome.system.proxy.http",
                        "use-authentication",
                        "true",
                    ],
                );
                run_silent(
                    "gsettings",
                    &[
                        "set",
                        "org.gnome.system.proxy.http",
                        "authentication-user",
                        username.as_str(),
                    ],
                );
                run_silent(
                    "gsettings",
                    &[
                        "set",
                        "org.gnome.system.proxy.http",
                        "authentication-password",
                        password.as_str(),
                    ],
                );
            }
            None => {
                run_silent(
                    "gsettings",
                    &[
                        "set",
                        "org.gnome.system.proxy.http",
                        "use-authentication",
                        "false",
                    ],
                );
            }
        }

        run_silent(
            "gsettings",
            &["set", "org.gnome.system.proxy", "use-same-proxy", "false"],
        );
        run_silent(
            "gsettings",
            &["set", "org.gnome.system.proxy", "mode", "manual"],
        );

        let (_, verify_mode) =
            run_silent_with_output("gsettings", &["get", "org.gnome.system.proxy", "mode"]);
        let (_, verify_host) =
            run_silent_with_output("gsettings", &["get", "org.gnome.system.proxy.http", "host"]);
        log::info!(
            "[proxy] GSettings verify: mode={}, http_host={}",
            verify_mode.trim(),
            verify_host.trim(),
        );

        Ok(format!(
            "System proxy configured via GSettings (HTTP {}:{})",
            target.host, target.port,
        ))
    }

    fn clear(&mut self) {
        log::info!("[proxy] GSettings: clearing proxy settings");

        run_silent(
            "gsettings",
            &["set", "org.gnome.system.proxy", "mode", "none"],
        );
        run_silent(
            "gsettings",
            &[
                "set",
                "org.gnome.system.proxy.http",
                "use-authentication",
                "false",
            ],
        );

        let (_, verify_mode) =
            run_silent_with_output("gsettings", &["get", "org.gnome.system.proxy", "mode"]);
        log::info!("[proxy] GSettings cleared — mode={}", verify_mode.trim());
    }
}

pub struct KdeProxy;

impl KdeProxy {
    pub fn is_available() -> bool {
        let desktop = std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default();
        desktop.split(':').any(|d| d == "KDE" || d == "Trinity")
    }

    fn kwriteconfig_command() -> &'static str {
        match std::env::var("KDE_SESSION_VERSION")
            .unwrap_or_default()
            .as_str()
        {
            "6" => "kwriteconfig6",
            "5" => "kwriteconfig5",
            _ => "kwriteconfig6",
        }
    }

    fn kioslaverc_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kioslaverc")
    }

    fn notify_kio() {
        run_silent(
            "dbus-send",
            &[
                "--type=signal",
                "/KIO/Scheduler",
                "org.kde.KIO.Scheduler.reparseSlaveConfiguration",
                "string:''",
            ],
        );
    }

    fn write_proxy_key(kwriteconfig: &str, kioslaverc: &str, key: &str, value: &str) {
        run_silent(
            kwriteconfig,
            &[
                "--file",
                kioslaverc,
                "--group",
                "Proxy Settings",
                "--key",
                key,
                value,
            ],
        );
    }
}

impl ProxyBackend for KdeProxy {
    fn name(&self) -> &str {
        "KDE KIO"
    }

    fn set(&mut self, target: &ProxyTarget) -> Result<String, String> {
        let kwriteconfig = Self::kwriteconfig_command();
        let kioslaverc = Self::kioslaverc_path();
        let kioslaverc_str = kioslaverc.to_string_lossy().to_string();
        let proxy_url = format!("http://{}:{}", target.host, target.port);

        log::info!(
            "[proxy] KDE: setting HTTP proxy to {proxy_url} \
             (kwriteconfig={kwriteconfig}, kioslaverc={kioslaverc_str})",
        );
        if target.credentials.is_some() {
            // KIO prompts for credentials itself; they are not written to
            // kioslaverc.
            log::debug!("[proxy] KDE: proxy authentication left to KIO's own prompt");
        }

        Self::write_proxy_key(kwriteconfig, &kioslaverc_str, "ProxyType", "1");
        Self::write_proxy_key(kwriteconfig, &kioslaverc_str, "httpProxy", &proxy_url);
        Self::write_proxy_key(kwriteconfig, &kioslaverc_str, "httpsProxy", &proxy_url);
        for key in &["socksProxy", "ftpProxy"] {
            Self::write_proxy_key(kwriteconfig, &kioslaverc_str, key, "");
        }
        Self::write_proxy_key(
            kwriteconfig,
            &kioslaverc_str,
            "NoProxyFor",
            "localhost,127.0.0.0/8,::1,10.0.0.0/8,172.16.0.0/12,192.168.0.0/16",
        );

        Self::notify_kio();

        Ok(format!(
            "System proxy configured via KDE KIO (HTTP {}:{})",
            target.host, target.port,
        ))
    }

    fn clear(&mut self) {
        log::info!("[proxy] KDE: clearing proxy settings");

        let kwriteconfig = Self::kwriteconfig_command();
        let kioslaverc = Self::kioslaverc_path();
        let kioslaverc_str = kioslaverc.to_string_lossy().to_string();

        Self::write_proxy_key(kwriteconfig, &kioslaverc_str, "ProxyType", "0");

        Self::notify_kio();

        log::info!("[proxy] KDE: proxy type reset to 0");
    }
}
