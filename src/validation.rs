use std::fmt;

use crate::settings::{EditBuffer, REMOTE_PORT_MINIMUM};

/// A failed check over one edit-buffer field. `section` names the settings
/// group the way the preference pane does, so it doubles as a dialog title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationMessage {
    pub section: &'static str,
    pub message: &'static str,
}

const REMOTE_SECTION: &str = "Network > Remote operation";
const PROXY_SECTION: &str = "Network > Proxy configuration";

impl ValidationMessage {
    fn new(section: &'static str, message: &'static str) -> Self {
        Self { section, message }
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\n{}", self.section, self.message)
    }
}

pub fn validate_remote_port(value: &str) -> Result<(), ValidationMessage> {
    match value.parse::<u32>() {
        Ok(port) if port >= u32::from(REMOTE_PORT_MINIMUM) && port <= u32::from(u16::MAX) => Ok(()),
        _ => Err(ValidationMessage::new(
            REMOTE_SECTION,
            "You must enter an integer value in the interval 1025-65535",
        )),
    }
}

pub fn validate_proxy_hostname(value: &str) -> Result<(), ValidationMessage> {
    if value.is_empty() {
        Err(ValidationMessage::new(
            PROXY_SECTION,
            "Please specify a hostname",
        ))
    } else {
        Ok(())
    }
}

pub fn validate_proxy_port(value: &str) -> Result<(), ValidationMessage> {
    match value.parse::<i64>() {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationMessage::new(
            PROXY_SECTION,
            "Please specify a port",
        )),
    }
}

pub fn validate_proxy_username(value: &str) -> Result<(), ValidationMessage> {
    if value.is_empty() {
        Err(ValidationMessage::new(
            PROXY_SECTION,
            "Please specify a username",
        ))
    } else {
        Ok(())
    }
}

pub fn validate_proxy_password(value: &str) -> Result<(), ValidationMessage> {
    if value.is_empty() {
        Err(ValidationMessage::new(
            PROXY_SECTION,
            "Please specify a password",
        ))
    } else {
        Ok(())
    }
}

/// Runs the validators relevant to the enabled toggles and reports the first
/// failure: remote port, then hostname, port, username, password. Validation
/// only ever reads the edit buffer, never the committed settings.
pub fn validate_all(buffer: &EditBuffer) -> Result<(), ValidationMessage> {
    if buffer.remote_enabled {
        validate_remote_port(&buffer.remote_port)?;
    }

    if buffer.use_proxy {
        validate_proxy_hostname(&buffer.proxy_hostname)?;
        validate_proxy_port(&buffer.proxy_port)?;

        if buffer.use_authentication {
            validate_proxy_username(&buffer.proxy_username)?;
            validate_proxy_password(&buffer.proxy_password)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy_buffer() -> EditBuffer {
        EditBuffer {
            use_proxy: true,
            proxy_hostname: "proxy.example.com".into(),
            proxy_port: "3128".into(),
            ..EditBuffer::default()
        }
    }

    #[test]
    fn remote_port_accepts_exactly_the_user_port_range() {
        assert!(validate_remote_port("1025").is_ok());
        assert!(validate_remote_port("8080").is_ok());
        assert!(validate_remote_port("65535").is_ok());

        assert!(validate_remote_port("1024").is_err());
        assert!(validate_remote_port("0").is_err());
        assert!(validate_remote_port("65536").is_err());
        assert!(validate_remote_port("-1").is_err());
    }

    #[test]
    fn port_validators_reject_non_numeric_input() {
        for value in ["", "abc", "80 80", "12.5", "0x50"] {
            assert!(validate_remote_port(value).is_err(), "remote: {value:?}");
            assert!(validate_proxy_port(value).is_err(), "proxy: {value:?}");
        }
    }

    #[test]
    fn proxy_port_accepts_any_integer() {
        assert!(validate_proxy_port("80").is_ok());
        assert!(validate_proxy_port("0").is_ok());
        assert!(validate_proxy_port("-1").is_ok());
        assert!(validate_proxy_port("99999").is_ok());
    }

    #[test]
    fn disabled_groups_are_not_validated() {
        let buffer = EditBuffer::default();
        assert!(validate_all(&buffer).is_ok());

        let buffer = EditBuffer {
            remote_enabled: false,
            remote_port: "not a port".into(),
            ..EditBuffer::default()
        };
        assert!(validate_all(&buffer).is_ok());
    }

    #[test]
    fn enabled_proxy_requires_a_hostname() {
        let mut buffer = proxy_buffer();
        buffer.proxy_hostname.clear();

        let message = validate_all(&buffer).unwrap_err();
        assert_eq!(message.message, "Please specify a hostname");
    }

    #[test]
    fn enabled_proxy_with_hostname_and_numeric_port_passes() {
        assert!(validate_all(&proxy_buffer()).is_ok());
    }

    #[test]
    fn authentication_requires_username_and_password() {
        let mut buffer = proxy_buffer();
        buffer.use_authentication = true;

        let message = validate_all(&buffer).unwrap_err();
        assert_eq!(message.message, "Please specify a username");

        buffer.proxy_username = "user".into();
        let message = validate_all(&buffer).unwrap_err();
        assert_eq!(message.message, "Please specify a password");

        buffer.proxy_password = "secret".into();
        assert!(validate_all(&buffer).is_ok());
    }

    #[test]
    fn remote_port_failure_outranks_proxy_failures() {
        let buffer = EditBuffer {
            remote_enabled: true,
            remote_port: "80".into(),
            use_proxy: true,
            ..EditBuffer::default()
        };

        let message = validate_all(&buffer).unwrap_err();
        assert_eq!(message.section, "Network > Remote operation");
    }
}
