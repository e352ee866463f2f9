//! use jkskit::error::JksKitError;

use thiserror::Error;

/// Represents errors that can occur while issuing a certificate or handling a keystore.
///
/// Payloads are rendered messages so the error stays `Clone`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JksKitError {
    /// Key pair generation failed or the requested strength is too weak.
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// The configured validity period cannot produce a certificate.
    #[error("Invalid validity: {0}")]
    InvalidValidity(String),

    /// DER encoding of the certificate template or signature failed.
    #[error("Failed to encode certificate: {0}")]
    CertificateEncoding(String),

    /// The alias cannot be stored in a keystore entry.
    #[error("Invalid keystore alias: {0}")]
    AliasEncoding(String),

    /// A password contains characters the keystore password encoding cannot carry.
    #[error("Unsupported keystore password: {0}")]
    UnsupportedPassword(String),

    /// The entry password based key protection could not be computed.
    #[error("Failed to protect keystore entry: {0}")]
    EntryProtection(String),

    /// The output could not be fully written.
    #[error("Failed to write output: {0}")]
    IoWrite(String),

    /// The configuration file could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    /// Error while decoding a certificate or keystore.
    #[error("Failed to decode data: {0}")]
    Decoding(String),

    /// The keystore digest does not match the container password.
    #[error("Keystore integrity check failed: wrong password or tampered data")]
    IntegrityCheckFailed,

    /// The entry password does not unlock the protected private key.
    #[error("Wrong password for keystore entry '{0}'")]
    WrongEntryPassword(String),

    /// No entry of the requested kind exists under the alias.
    #[error("No keystore entry found for alias '{0}'")]
    EntryNotFound(String),
}

pub type Result<T> = std::result::Result<T, JksKitError>;

impl From<der::Error> for JksKitError {
    /// Converts a `der::Error` into a `JksKitError`.
    fn from(err: der::Error) -> Self {
        JksKitError::Decoding(err.to_string())
    }
}

impl From<rsa::Error> for JksKitError {
    fn from(err: rsa::Error) -> Self {
        JksKitError::KeyGeneration(err.to_string())
    }
}

impl From<pkcs8::Error> for JksKitError {
    fn from(err: pkcs8::Error) -> Self {
        JksKitError::Decoding(err.to_string())
    }
}

impl From<std::io::Error> for JksKitError {
    fn from(err: std::io::Error) -> Self {
        JksKitError::IoWrite(err.to_string())
    }
}

impl From<x509_cert::spki::Error> for JksKitError {
    fn from(err: x509_cert::spki::Error) -> Self {
        JksKitError::CertificateEncoding(err.to_string())
    }
}
