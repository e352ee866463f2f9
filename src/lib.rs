//! # jkskit - Self-Signed Certificates in JKS Keystores
//!
//! jkskit issues a self-signed X.509 certificate for a fresh RSA key pair and
//! packages both into a password-protected Java KeyStore (JKS), the format
//! expected by `apksigner`, `jarsigner` and the Android Gradle plugin. It is
//! built entirely with rustcrypto libraries; no OpenSSL or `keytool` needed.
//!
//! ## Pipeline
//!
//! 1. [`key::KeyPair::generate`] creates an RSA key pair (at least 2048 bits).
//! 2. [`cert::Certificate::new_self_signed`] signs an X.509 v3 certificate
//!    described by a [`cert::params::CertificateTemplate`].
//! 3. [`fingerprint::FingerprintSet::from_der`] computes the MD5, SHA-1 and
//!    SHA-256 fingerprints of the DER certificate.
//! 4. [`keystore::KeyStore`] protects the PKCS#8 key under the entry password
//!    and serializes the container with its keyed integrity digest.
//!
//! [`pipeline::run`] strings these together from a [`config::Config`] and
//! writes the keystore plus a text report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jkskit::{
//!     cert::{Certificate, params::{CertificateTemplate, DistinguishedName}},
//!     fingerprint::FingerprintSet,
//!     key::KeyPair,
//!     keystore::KeyStore,
//! };
//!
//! # fn main() -> Result<(), jkskit::error::JksKitError> {
//! let key_pair = KeyPair::generate(2048)?;
//!
//! let subject = DistinguishedName::builder()
//!     .common_name("Example CA".to_string())
//!     .organization("Example Corp".to_string())
//!     .country("US".to_string())
//!     .build();
//! let template = CertificateTemplate::builder()
//!     .subject(subject)
//!     .validity_years(25)
//!     .build();
//!
//! let certificate = Certificate::new_self_signed(&template, &key_pair)?;
//! println!("{}", FingerprintSet::from_der(&certificate.to_der()?));
//!
//! let mut file = std::fs::File::create("release.jks")?;
//! jkskit::keystore::write(
//!     "release",
//!     &key_pair,
//!     &[certificate],
//!     template.issued_at,
//!     "entry password",
//!     "store password",
//!     &mut file,
//! )?;
//!
//! let keystore = KeyStore::load(&mut std::fs::File::open("release.jks")?, "store password")?;
//! let entry = keystore.get_private_key_entry("release", "entry password")?;
//! assert_eq!(entry.certificate_chain.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::JksKitError`]:
//!
//! ```rust
//! use jkskit::{error::JksKitError, keystore::KeyStore};
//!
//! match KeyStore::from_bytes(b"definitely not a keystore", "changeit") {
//!     Ok(_) => println!("Loaded"),
//!     Err(JksKitError::IntegrityCheckFailed) => println!("Wrong password or corrupted file"),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: RSA key generation, signing and PKCS#8 export
//! - [`cert`]: Certificate creation, encoding/decoding and inspection
//! - [`issuer`]: Certificate issuing
//! - [`tbs_certificate`]: Low-level certificate structure manipulation
//! - [`fingerprint`]: Certificate fingerprints
//! - [`keystore`]: JKS reading and writing
//! - [`config`], [`report`], [`pipeline`]: the issuance run behind the `jkskit` binary
//! - [`error`]: Error types

pub mod cert;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod issuer;
pub mod key;
pub mod keystore;
pub mod pipeline;
pub mod report;
pub mod tbs_certificate;
