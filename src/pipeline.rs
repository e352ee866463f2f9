//! Issuance run: key pair, self-signed certificate, fingerprints, keystore.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use time::OffsetDateTime;

use crate::cert::Certificate;
use crate::cert::params::{CertificateTemplate, DistinguishedName, issuance_time};
use crate::config::{CaConfig, Config};
use crate::error::{JksKitError, Result};
use crate::fingerprint::FingerprintSet;
use crate::key::KeyPair;
use crate::keystore;
use crate::report::{OutputPaths, Report};

/// In-memory result of an issuance.
#[derive(Debug, Clone)]
pub struct Issued {
    pub issued_at: OffsetDateTime,
    pub key_pair: KeyPair,
    pub certificate: Certificate,
    pub fingerprints: FingerprintSet,
    /// Serialized keystore, ready to be written.
    pub keystore: Vec<u8>,
}

/// Files written by [`run`] and the report describing them.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub issued: Issued,
    pub report: Report,
    /// False when the report file could not be written.
    pub report_written: bool,
}

pub fn subject_from(ca: &CaConfig) -> DistinguishedName {
    DistinguishedName::builder()
        .common_name(ca.common_name.clone())
        .country(ca.country.clone())
        .state(ca.province.clone())
        .organization(ca.organization.clone())
        .organization_unit(ca.organizational_unit.clone())
        .build()
}

/// Generates the key pair and certificate and serializes the keystore.
///
/// Nothing touches the filesystem here.
pub fn issue(config: &Config, issued_at: OffsetDateTime) -> Result<Issued> {
    let template = CertificateTemplate::builder()
        .subject(subject_from(&config.ca))
        .validity_years(config.ca.validity_years)
        .issued_at(issued_at)
        .build();
    // Reject bad settings before paying for key generation.
    template.validity()?;
    template.subject.as_x509_name()?;

    let key_pair = KeyPair::generate(config.ca.key_size)?;
    log::info!("Generated {}-bit RSA key pair", key_pair.bits());

    let certificate = Certificate::new_self_signed(&template, &key_pair)?;
    let fingerprints = FingerprintSet::from_der(&certificate.to_der()?);

    let keystore = keystore::to_bytes(
        &config.keystore.key_alias,
        &key_pair,
        std::slice::from_ref(&certificate),
        issued_at,
        &config.keystore.key_pass,
        &config.keystore.password,
    )?;

    Ok(Issued {
        issued_at,
        key_pair,
        certificate,
        fingerprints,
        keystore,
    })
}

/// Issues a certificate and writes the timestamped keystore and report next
/// to the configured keystore path.
///
/// Failing to write the report is logged and reported through
/// [`RunOutput::report_written`]; every other failure aborts the run.
pub fn run(config: &Config, redact_passwords: bool) -> Result<RunOutput> {
    let issued_at = issuance_time();
    let paths = OutputPaths::timestamped(&config.keystore.file_path, issued_at)?;
    let issued = issue(config, issued_at)?;

    if let Some(parent) = paths.keystore.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| JksKitError::IoWrite(format!("{}: {e}", parent.display())))?;
    }
    write_keystore_file(&paths.keystore, &issued.keystore)?;
    log::info!("Wrote keystore to {}", paths.keystore.display());

    let report = Report {
        paths,
        alias: config.keystore.key_alias.clone(),
        container_password: config.keystore.password.clone(),
        entry_password: config.keystore.key_pass.clone(),
        certificate: issued.certificate.info()?,
        fingerprints: issued.fingerprints.clone(),
    };
    let report_written = match report.write(redact_passwords) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to save certificate report: {e}");
            false
        }
    };

    Ok(RunOutput {
        issued,
        report,
        report_written,
    })
}

/// Writes `bytes` to a new file at `path`.
///
/// An existing file is never replaced. If the write does not complete, the
/// file created here is removed again.
fn write_keystore_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_error = |e: std::io::Error| JksKitError::IoWrite(format!("{}: {e}", path.display()));
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(write_error)?;

    let result = file.write_all(bytes).and_then(|()| file.sync_all());
    if let Err(e) = result {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(write_error(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_from_ca_config() {
        let subject = subject_from(&Config::default_config().ca);
        assert_eq!(subject.common_name, "chrelyonly CA");
        assert_eq!(subject.country.as_deref(), Some("CN"));
        assert_eq!(subject.state.as_deref(), Some("Yunnan"));
    }

    #[test]
    fn test_invalid_validity_fails_before_key_generation() {
        let mut config = Config::default_config();
        config.ca.validity_years = 0;
        // an absurd key size would take forever if it were generated first
        config.ca.key_size = 1 << 20;
        assert!(matches!(
            issue(&config, issuance_time()),
            Err(JksKitError::InvalidValidity(_))
        ));
    }

    #[test]
    fn test_weak_key_size_is_rejected() {
        let mut config = Config::default_config();
        config.ca.key_size = 1024;
        assert!(matches!(
            issue(&config, issuance_time()),
            Err(JksKitError::KeyGeneration(_))
        ));
    }

    #[test]
    fn test_existing_keystore_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("release.jks");
        fs::write(&target, b"earlier keystore").unwrap();

        assert!(matches!(
            write_keystore_file(&target, b"second run"),
            Err(JksKitError::IoWrite(_))
        ));
        assert_eq!(fs::read(&target).unwrap(), b"earlier keystore");
    }

    #[test]
    fn test_keystore_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("release.jks");
        write_keystore_file(&target, b"keystore bytes").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"keystore bytes");
    }

    #[test]
    fn test_failed_keystore_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("release.jks");
        assert!(write_keystore_file(&target, b"data").is_err());
        assert!(!target.exists());
    }
}
