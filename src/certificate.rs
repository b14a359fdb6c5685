use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Marks a trust-store entry as user-imported, as opposed to one shipped with
/// the application.
pub const CUSTOM_ALIAS_SUFFIX: &str = "[custom]";

/// One certificate in the edit buffer's list. Entries loaded back from the
/// trust store carry no source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateEntry {
    pub thumbprint: String,
    pub source_path: Option<PathBuf>,
}

impl CertificateEntry {
    pub fn new(thumbprint: String, source_path: Option<PathBuf>) -> Self {
        Self {
            thumbprint,
            source_path,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let der = load_certificate_der(path)?;
        Ok(Self {
            thumbprint: thumbprint(&der),
            source_path: Some(path.to_path_buf()),
        })
    }

    pub fn alias(&self) -> String {
        custom_alias(&self.thumbprint)
    }
}

pub fn custom_alias(thumbprint: &str) -> String {
    format!("{thumbprint}{CUSTOM_ALIAS_SUFFIX}")
}

/// SHA-256 over the DER encoding, lowercase hex.
pub fn thumbprint(der: &[u8]) -> String {
    hex::encode(Sha256::digest(der))
}

/// Reads a certificate file and returns its DER bytes. PEM input takes the
/// first CERTIFICATE block; anything without PEM markers is treated as a raw
/// DER export (.cer files are commonly binary).
pub fn load_certificate_der(path: &Path) -> Result<Vec<u8>, String> {
    let bytes = std::fs::read(path)
        .map_err(|error| format!("Failed to read {}: {error}", path.display()))?;

    let first = {
        let mut reader = std::io::Cursor::new(&bytes);
        rustls_pemfile::certs(&mut reader).next()
    };
    match first {
        Some(Ok(der)) => Ok(der.as_ref().to_vec()),
        Some(Err(error)) => Err(format!("Failed to parse {}: {error}", path.display())),
        None => {
            if bytes.is_empty() {
                Err(format!("{} is empty", path.display()))
            } else {
                Ok(bytes)
            }
        }
    }
}
