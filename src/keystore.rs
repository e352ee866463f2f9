//! Java KeyStore (JKS) containers.
//!
//! [`KeyStore`] wraps [`jks::KeyStore`], which handles the binary layout,
//! the entry key protector and the keyed SHA-1 integrity digest. This module
//! adds what the certificate pipeline needs on top: alias validation, Java
//! compatible password bytes, `time` based creation times and errors mapped
//! onto [`JksKitError`].

use std::fmt;
use std::io::{Read, Write};
use std::time::{Duration, SystemTime};

use jks::{KeyStoreError, KeyStoreOptions};
use time::OffsetDateTime;

use crate::cert::Certificate;
use crate::error::{JksKitError, Result};
use crate::key::KeyPair;

/// Certificate type written next to X.509 certificates.
pub const X509_CERT_TYPE: &str = "X.509";

/// Longest alias, in encoded bytes, that fits the `u16` length prefix.
pub const MAX_ALIAS_LEN: usize = u16::MAX as usize;

/// A certificate as stored in a keystore: type tag plus encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreCertificate {
    pub cert_type: String,
    pub content: Vec<u8>,
}

impl KeystoreCertificate {
    pub fn from_certificate(certificate: &Certificate) -> Result<Self> {
        Ok(Self {
            cert_type: X509_CERT_TYPE.to_string(),
            content: certificate.to_der()?,
        })
    }

    pub fn to_certificate(&self) -> Result<Certificate> {
        Certificate::from_der(&self.content)
    }
}

impl From<KeystoreCertificate> for jks::Certificate {
    fn from(value: KeystoreCertificate) -> Self {
        jks::Certificate {
            cert_type: value.cert_type,
            content: value.content,
        }
    }
}

impl From<jks::Certificate> for KeystoreCertificate {
    fn from(value: jks::Certificate) -> Self {
        KeystoreCertificate {
            cert_type: value.cert_type,
            content: value.content,
        }
    }
}

/// A private key with its certificate chain, leaf first.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKeyEntry {
    /// Stored with millisecond precision.
    pub creation_time: OffsetDateTime,
    /// PKCS#8 `PrivateKeyInfo` DER.
    pub private_key: Vec<u8>,
    pub certificate_chain: Vec<KeystoreCertificate>,
}

impl PrivateKeyEntry {
    pub fn key_pair(&self) -> Result<KeyPair> {
        KeyPair::from_pkcs8_der(&self.private_key)
    }
}

impl fmt::Debug for PrivateKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyEntry")
            .field("creation_time", &self.creation_time)
            .field("private_key", &format_args!("<{} bytes>", self.private_key.len()))
            .field("certificate_chain", &self.certificate_chain)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedCertificateEntry {
    pub creation_time: OffsetDateTime,
    pub certificate: KeystoreCertificate,
}

/// In-memory JKS container with case-insensitive aliases.
pub struct KeyStore {
    inner: jks::KeyStore,
}

impl KeyStore {
    pub fn new() -> Self {
        Self {
            inner: jks::KeyStore::with_options(KeyStoreOptions {
                ordered_aliases: true,
                min_password_len: 0,
                ..KeyStoreOptions::default()
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Stored aliases, lower-cased and sorted.
    pub fn aliases(&self) -> Vec<String> {
        self.inner.aliases()
    }

    pub fn is_private_key_entry(&self, alias: &str) -> bool {
        self.inner.is_private_key_entry(alias)
    }

    /// Adds or replaces the private key entry under `alias`.
    ///
    /// The key is protected with `password` right away; the keystore never
    /// holds it in the clear.
    pub fn set_private_key_entry(
        &mut self,
        alias: &str,
        entry: PrivateKeyEntry,
        password: &str,
    ) -> Result<()> {
        validate_alias(alias)?;
        if entry.certificate_chain.is_empty() {
            return Err(JksKitError::CertificateEncoding(
                "a private key entry needs at least one certificate".to_string(),
            ));
        }
        let password = PasswordBytes::new(password)?;
        let replaced = self.inner.is_private_key_entry(alias);

        let entry = jks::PrivateKeyEntry {
            creation_time: to_system_time(entry.creation_time)?,
            private_key: entry.private_key,
            certificate_chain: entry
                .certificate_chain
                .into_iter()
                .map(jks::Certificate::from)
                .collect(),
        };
        self.inner
            .set_private_key_entry(alias, entry, password.as_bytes())
            .map_err(|e| JksKitError::EntryProtection(e.to_string()))?;
        if replaced {
            log::debug!("Replaced keystore entry '{}'", alias.to_lowercase());
        }
        Ok(())
    }

    /// Decrypts the private key entry under `alias` with `password`.
    pub fn get_private_key_entry(&self, alias: &str, password: &str) -> Result<PrivateKeyEntry> {
        let password = PasswordBytes::new(password)?;
        let entry = self
            .inner
            .get_private_key_entry(alias, password.as_bytes())
            .map_err(|e| entry_error(e, alias))?;
        Ok(PrivateKeyEntry {
            creation_time: from_system_time(entry.creation_time)?,
            private_key: entry.private_key,
            certificate_chain: entry
                .certificate_chain
                .into_iter()
                .map(KeystoreCertificate::from)
                .collect(),
        })
    }

    /// Adds or replaces the trusted certificate entry under `alias`.
    pub fn set_trusted_certificate_entry(
        &mut self,
        alias: &str,
        entry: TrustedCertificateEntry,
    ) -> Result<()> {
        validate_alias(alias)?;
        let entry = jks::TrustedCertificateEntry {
            creation_time: to_system_time(entry.creation_time)?,
            certificate: entry.certificate.into(),
        };
        self.inner
            .set_trusted_certificate_entry(alias, entry)
            .map_err(|e| JksKitError::CertificateEncoding(e.to_string()))
    }

    pub fn get_trusted_certificate_entry(&self, alias: &str) -> Result<TrustedCertificateEntry> {
        let entry = self
            .inner
            .get_trusted_certificate_entry(alias)
            .map_err(|e| entry_error(e, alias))?;
        Ok(TrustedCertificateEntry {
            creation_time: from_system_time(entry.creation_time)?,
            certificate: entry.certificate.into(),
        })
    }

    /// Serializes the keystore, integrity digest included.
    pub fn to_bytes(&self, password: &str) -> Result<Vec<u8>> {
        let password = PasswordBytes::new(password)?;
        let mut bytes = Vec::new();
        self.inner
            .store(&mut bytes, password.as_bytes())
            .map_err(|e| match e {
                KeyStoreError::Io(e) => JksKitError::IoWrite(e.to_string()),
                other => JksKitError::EntryProtection(other.to_string()),
            })?;
        Ok(bytes)
    }

    /// Writes the whole keystore to `writer`.
    ///
    /// Serialization finishes in memory before the first byte is written, so
    /// encoding errors never leave partial output behind.
    pub fn store<W: Write>(&self, writer: &mut W, password: &str) -> Result<()> {
        let bytes = self.to_bytes(password)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        log::debug!(
            "Stored keystore with {} entries ({} bytes)",
            self.len(),
            bytes.len()
        );
        Ok(())
    }

    /// Parses a serialized keystore and verifies its integrity digest.
    pub fn from_bytes(data: &[u8], password: &str) -> Result<Self> {
        let password = PasswordBytes::new(password)?;
        let mut keystore = KeyStore::new();
        keystore
            .inner
            .load(data, password.as_bytes())
            .map_err(|e| match e {
                KeyStoreError::InvalidDigest => JksKitError::IntegrityCheckFailed,
                other => JksKitError::Decoding(other.to_string()),
            })?;
        Ok(keystore)
    }

    /// Reads a keystore from `reader`; see [`KeyStore::from_bytes`].
    pub fn load<R: Read>(reader: &mut R, password: &str) -> Result<Self> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| JksKitError::Decoding(e.to_string()))?;
        Self::from_bytes(&data, password)
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("aliases", &self.aliases())
            .finish()
    }
}

/// Packages `key_pair` and `chain` as the single entry `alias` and writes the
/// keystore to `writer`.
pub fn write<W: Write>(
    alias: &str,
    key_pair: &KeyPair,
    chain: &[Certificate],
    creation_time: OffsetDateTime,
    entry_password: &str,
    container_password: &str,
    writer: &mut W,
) -> Result<()> {
    let bytes = to_bytes(
        alias,
        key_pair,
        chain,
        creation_time,
        entry_password,
        container_password,
    )?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Serialized single-entry keystore, as written by [`write`].
pub fn to_bytes(
    alias: &str,
    key_pair: &KeyPair,
    chain: &[Certificate],
    creation_time: OffsetDateTime,
    entry_password: &str,
    container_password: &str,
) -> Result<Vec<u8>> {
    let entry = PrivateKeyEntry {
        creation_time,
        private_key: key_pair.to_pkcs8_der()?,
        certificate_chain: chain
            .iter()
            .map(KeystoreCertificate::from_certificate)
            .collect::<Result<Vec<_>>>()?,
    };
    let mut keystore = KeyStore::new();
    keystore.set_private_key_entry(alias, entry, entry_password)?;
    keystore.to_bytes(container_password)
}

/// Checks that `alias` can be stored and read back by Java.
///
/// Control characters are rejected since keytool cannot address them.
/// Aliases are written as plain UTF-8, which only matches Java's modified
/// UTF-8 inside the Basic Multilingual Plane.
fn validate_alias(alias: &str) -> Result<()> {
    if alias.is_empty() {
        return Err(JksKitError::AliasEncoding("alias must not be empty".to_string()));
    }
    if let Some(c) = alias.chars().find(|c| c.is_control()) {
        return Err(JksKitError::AliasEncoding(format!(
            "alias contains control character {c:?}"
        )));
    }
    if let Some(c) = alias.chars().find(|c| u32::from(*c) > 0xffff) {
        return Err(JksKitError::AliasEncoding(format!(
            "alias contains supplementary character {c:?}"
        )));
    }
    let encoded_len = alias.to_lowercase().len();
    if encoded_len > MAX_ALIAS_LEN {
        return Err(JksKitError::AliasEncoding(format!(
            "alias encodes to {encoded_len} bytes, the limit is {MAX_ALIAS_LEN}"
        )));
    }
    Ok(())
}

fn entry_error(err: KeyStoreError, alias: &str) -> JksKitError {
    match err {
        KeyStoreError::InvalidDigest => JksKitError::WrongEntryPassword(alias.to_lowercase()),
        KeyStoreError::EntryNotFound | KeyStoreError::WrongEntryType => {
            JksKitError::EntryNotFound(alias.to_lowercase())
        }
        other => JksKitError::Decoding(other.to_string()),
    }
}

/// Password bytes handed to `jks`, wiped on drop.
///
/// `jks` widens each byte to a big-endian UTF-16 unit, so one byte per
/// character reproduces Java's `char[]` encoding for Latin-1 text.
struct PasswordBytes(Vec<u8>);

impl PasswordBytes {
    fn new(password: &str) -> Result<Self> {
        password
            .chars()
            .map(|c| {
                u8::try_from(u32::from(c)).map_err(|_| {
                    JksKitError::UnsupportedPassword(
                        "only Latin-1 characters are supported".to_string(),
                    )
                })
            })
            .collect::<Result<Vec<u8>>>()
            .map(Self)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for PasswordBytes {
    fn drop(&mut self) {
        jks::zeroing(&mut self.0);
    }
}

/// Truncates to the millisecond precision of the keystore format.
fn to_system_time(value: OffsetDateTime) -> Result<SystemTime> {
    let millis = (value - OffsetDateTime::UNIX_EPOCH).whole_milliseconds();
    let millis = u64::try_from(millis).map_err(|_| {
        JksKitError::EntryProtection(format!("creation time {value} is before 1970"))
    })?;
    Ok(SystemTime::UNIX_EPOCH + Duration::from_millis(millis))
}

fn from_system_time(value: SystemTime) -> Result<OffsetDateTime> {
    let invalid = || JksKitError::Decoding("creation time out of range".to_string());
    let since_epoch = value
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|_| invalid())?;
    let nanos = i128::try_from(since_epoch.as_nanos()).map_err(|_| invalid())?;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_entry() -> PrivateKeyEntry {
        PrivateKeyEntry {
            creation_time: datetime!(2025-01-02 03:04:05.678 UTC),
            private_key: b"not really a pkcs8 key".to_vec(),
            certificate_chain: vec![KeystoreCertificate {
                cert_type: X509_CERT_TYPE.to_string(),
                content: vec![0x30, 0x03, 0x02, 0x01, 0x01],
            }],
        }
    }

    fn sample_keystore_bytes() -> Vec<u8> {
        let mut keystore = KeyStore::new();
        keystore
            .set_private_key_entry("testkey", sample_entry(), "pw2")
            .unwrap();
        keystore.to_bytes("pw1").unwrap()
    }

    #[test]
    fn test_round_trip_with_both_passwords() {
        let bytes = sample_keystore_bytes();
        assert_eq!(&bytes[..8], &[0xfe, 0xed, 0xfe, 0xed, 0, 0, 0, 2]);

        let loaded = KeyStore::from_bytes(&bytes, "pw1").unwrap();
        assert_eq!(loaded.aliases(), vec!["testkey".to_string()]);
        assert_eq!(loaded.get_private_key_entry("testkey", "pw2").unwrap(), sample_entry());
    }

    #[test]
    fn test_wrong_container_password_fails_integrity_check() {
        assert!(matches!(
            KeyStore::from_bytes(&sample_keystore_bytes(), "pw2"),
            Err(JksKitError::IntegrityCheckFailed)
        ));
    }

    #[test]
    fn test_tampering_fails_integrity_check() {
        let mut bytes = sample_keystore_bytes();
        // last byte of the certificate, just before the digest
        let index = bytes.len() - 21;
        bytes[index] ^= 0x01;

        assert!(matches!(
            KeyStore::from_bytes(&bytes, "pw1"),
            Err(JksKitError::IntegrityCheckFailed)
        ));
    }

    #[test]
    fn test_wrong_entry_password() {
        let loaded = KeyStore::from_bytes(&sample_keystore_bytes(), "pw1").unwrap();
        assert_eq!(
            loaded.get_private_key_entry("TestKey", "pw1"),
            Err(JksKitError::WrongEntryPassword("testkey".to_string()))
        );
    }

    #[test]
    fn test_same_alias_overwrites_entry() {
        let mut keystore = KeyStore::new();
        keystore
            .set_private_key_entry("TestKey", sample_entry(), "old")
            .unwrap();

        let mut newer = sample_entry();
        newer.private_key = b"replacement".to_vec();
        keystore.set_private_key_entry("testkey", newer.clone(), "new").unwrap();

        assert_eq!(keystore.len(), 1);
        assert!(keystore.is_private_key_entry("TESTKEY"));
        assert_eq!(keystore.get_private_key_entry("testkey", "new").unwrap(), newer);
    }

    #[test]
    fn test_rejects_unstorable_aliases() {
        let mut keystore = KeyStore::new();
        let too_long = "a".repeat(MAX_ALIAS_LEN + 1);
        for alias in ["", "tab\there", "nul\0", "key\u{1f511}", too_long.as_str()] {
            assert!(matches!(
                keystore.set_private_key_entry(alias, sample_entry(), "pw"),
                Err(JksKitError::AliasEncoding(_))
            ));
        }
        assert!(keystore.is_empty());
    }

    #[test]
    fn test_rejects_empty_chain() {
        let mut entry = sample_entry();
        entry.certificate_chain.clear();
        assert!(KeyStore::new()
            .set_private_key_entry("testkey", entry, "pw")
            .is_err());
    }

    #[test]
    fn test_creation_time_keeps_millisecond_precision() {
        let mut entry = sample_entry();
        entry.creation_time = datetime!(2025-01-02 03:04:05.678912345 UTC);
        let mut keystore = KeyStore::new();
        keystore.set_private_key_entry("testkey", entry, "pw").unwrap();

        let loaded = KeyStore::from_bytes(&keystore.to_bytes("pw").unwrap(), "pw").unwrap();
        assert_eq!(
            loaded.get_private_key_entry("testkey", "pw").unwrap().creation_time,
            datetime!(2025-01-02 03:04:05.678 UTC)
        );
    }

    #[test]
    fn test_rejects_creation_time_before_epoch() {
        let mut entry = sample_entry();
        entry.creation_time = datetime!(1969-12-31 23:59:59 UTC);
        assert!(matches!(
            KeyStore::new().set_private_key_entry("testkey", entry, "pw"),
            Err(JksKitError::EntryProtection(_))
        ));
    }

    #[test]
    fn test_trusted_certificate_entries() {
        let mut keystore = KeyStore::new();
        let trusted = TrustedCertificateEntry {
            creation_time: datetime!(2025-01-02 03:04:05 UTC),
            certificate: sample_entry().certificate_chain.remove(0),
        };
        keystore
            .set_trusted_certificate_entry("root", trusted.clone())
            .unwrap();
        keystore
            .set_private_key_entry("testkey", sample_entry(), "pw2")
            .unwrap();

        let loaded = KeyStore::from_bytes(&keystore.to_bytes("pw1").unwrap(), "pw1").unwrap();
        assert_eq!(loaded.aliases(), vec!["root".to_string(), "testkey".to_string()]);
        assert!(!loaded.is_private_key_entry("root"));
        assert_eq!(loaded.get_trusted_certificate_entry("root").unwrap(), trusted);
        assert_eq!(
            loaded.get_private_key_entry("root", "pw2"),
            Err(JksKitError::EntryNotFound("root".to_string()))
        );
    }

    #[test]
    fn test_rejects_truncated_and_foreign_data() {
        assert!(matches!(
            KeyStore::from_bytes(&[0u8; 10], "pw"),
            Err(JksKitError::Decoding(_))
        ));
        assert!(matches!(
            KeyStore::from_bytes(&[0xca, 0xfe, 0xba, 0xbe, 0, 0, 0, 2, 0, 0, 0, 0], "pw"),
            Err(JksKitError::Decoding(_))
        ));

        let bytes = sample_keystore_bytes();
        assert!(matches!(
            KeyStore::from_bytes(&bytes[..bytes.len() - 5], "pw1"),
            Err(JksKitError::Decoding(_))
        ));
    }

    #[test]
    fn test_password_bytes_match_java_char_encoding() {
        for password in ["changeit", "pässwörd", ""] {
            let java: Vec<u8> = password
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect();
            let bytes = PasswordBytes::new(password).unwrap();
            assert_eq!(jks::common::password_bytes(bytes.as_bytes()), java);
        }
        assert!(matches!(
            PasswordBytes::new("密码"),
            Err(JksKitError::UnsupportedPassword(_))
        ));
    }

    #[test]
    fn test_latin1_passwords_round_trip() {
        let mut keystore = KeyStore::new();
        keystore
            .set_private_key_entry("testkey", sample_entry(), "schlüssel")
            .unwrap();
        let loaded = KeyStore::from_bytes(&keystore.to_bytes("größe").unwrap(), "größe").unwrap();
        assert!(loaded.get_private_key_entry("testkey", "schlüssel").is_ok());
        assert!(matches!(
            loaded.get_private_key_entry("testkey", "schlussel"),
            Err(JksKitError::WrongEntryPassword(_))
        ));
    }

    #[test]
    fn test_entry_debug_hides_key_material() {
        let debug = format!("{:?}", sample_entry());
        assert!(!debug.contains("not really"));
        assert!(debug.contains("<22 bytes>"));
    }

    #[test]
    fn test_store_writes_everything_at_once() {
        let mut keystore = KeyStore::new();
        keystore
            .set_private_key_entry("testkey", sample_entry(), "pw2")
            .unwrap();

        let mut out = Vec::new();
        keystore.store(&mut out, "pw1").unwrap();
        let loaded = KeyStore::load(&mut out.as_slice(), "pw1").unwrap();
        assert_eq!(loaded.aliases(), keystore.aliases());
    }
}
