//! Certificate fingerprints.
//!
//! MD5 and SHA-1 are kept for display next to tools that still print them
//! (`keytool -list -v`, app store consoles). Both are broken hash functions:
//! use them to recognise a certificate, never to trust one. Only the SHA-256
//! fingerprint identifies a certificate in a meaningful way.

use std::fmt;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Hex encoded digests of a certificate's DER bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FingerprintSet {
    /// 128-bit MD5 digest. Informational only.
    pub md5: String,
    /// 160-bit SHA-1 digest. Informational only.
    pub sha1: String,
    /// 256-bit SHA-256 digest.
    pub sha256: String,
}

impl FingerprintSet {
    /// Hashes the raw bytes as given, without re-encoding them.
    ///
    /// Total over any input: an empty slice yields the digests of the empty string.
    pub fn from_der(der: &[u8]) -> Self {
        Self {
            md5: hex::encode(Md5::digest(der)),
            sha1: hex::encode(Sha1::digest(der)),
            sha256: hex::encode(Sha256::digest(der)),
        }
    }
}

impl fmt::Display for FingerprintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MD5 (informational): {}", self.md5)?;
        writeln!(f, "SHA1 (informational): {}", self.sha1)?;
        write!(f, "SHA256: {}", self.sha256)
    }
}
