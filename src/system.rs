use std::process::{Command, Stdio};

use crate::{services::ProxyRegistrar, settings::ProxySettings};

pub mod proxy;

/// Registers the committed proxy settings with the desktop environment.
/// Backends are detected at registration time; a disabled candidate clears
/// whatever was set before.
pub struct SystemProxyRegistrar {
    backends: Vec<Box<dyn proxy::ProxyBackend>>,
}

impl SystemProxyRegistrar {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }
}

impl Default for SystemProxyRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyRegistrar for SystemProxyRegistrar {
    fn register(&mut self, settings: &ProxySettings) -> Result<String, String> {
        match proxy::ProxyTarget::from_settings(settings)? {
            Some(target) => {
                let (backends, detail) = proxy::set_all(&target);
                self.backends = backends;
                Ok(detail)
            }
            None => {
                if self.backends.is_empty() {
                    self.backends = proxy::detect();
                }
                proxy::clear_all(&mut self.backends);
                Ok("System proxy cleared".into())
            }
        }
    }
}

pub fn run_silent_with_output(program: &str, arguments: &[&str]) -> (bool, String) {
    log::debug!("[cmd] {} {}", program, arguments.join(" "));

    match Command::new(program)
        .args(arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
    {
        Ok(output) => {
            let success = output.status.success();
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            if !success {
                let stderr = String::from_utf8_lossy(&output.stderr);
                log::debug!(
                    "[cmd] FAILED (exit {}): {} {}\n  stderr: {}",
                    output.status.code().unwrap_or(-1),
                    program,
                    arguments.join(" "),
                    stderr.trim(),
                );
            }
            (success, stdout)
        }
        Err(error) => {
            log::debug!("[cmd] spawn error for {program}: {error}");
            (false, error.to_string())
        }
    }
}

pub fn run_silent(program: &str, arguments: &[&str]) -> bool {
    run_silent_with_output(program, arguments).0
}
