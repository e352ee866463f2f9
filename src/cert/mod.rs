pub mod extensions;
pub mod params;

use der::{Decode, Encode};
use extensions::{KeyUsage, SubjectKeyIdentifier, ToAndFromX509Extension};
use params::{CertificateTemplate, DistinguishedName, ExtensionParam};
use rsa::BigUint;
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::{JksKitError, Result};
use crate::issuer::Issuer;
use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;

const PEM_LABEL: &str = "CERTIFICATE";

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS #1 v1.5).
    Sha256WithRsa,
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA signature identifiers carry an explicit NULL parameter (RFC 4055).
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha256WithRsa => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(der::asn1::AnyRef::NULL.into()),
            },
        }
    }
}

impl TryFrom<&AlgorithmIdentifierOwned> for SignatureAlgorithm {
    type Error = JksKitError;

    fn try_from(value: &AlgorithmIdentifierOwned) -> Result<Self> {
        match value.oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha256WithRsa)
            }
            oid => Err(JksKitError::Decoding(format!(
                "Unsupported signature algorithm {oid}"
            ))),
        }
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER and to
/// inspect a decoded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

/// Displayable fields of a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Serial number as a decimal string.
    pub serial_number: String,
    /// Subject in RFC 4514 string form.
    pub subject: String,
    /// Issuer in RFC 4514 string form.
    pub issuer: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| JksKitError::CertificateEncoding(e.to_string()))
    }

    /// Decodes a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_der(der)?,
        })
    }

    /// Encodes the certificate as a `CERTIFICATE` PEM block with LF line endings.
    pub fn to_pem(&self) -> Result<String> {
        let pem = pem::Pem::new(PEM_LABEL, self.to_der()?);
        Ok(pem::encode_config(
            &pem,
            pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
        ))
    }

    /// Decodes the first `CERTIFICATE` PEM block of `pem`.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem::parse(pem).map_err(|e| JksKitError::Decoding(e.to_string()))?;
        if pem.tag() != PEM_LABEL {
            return Err(JksKitError::Decoding(format!(
                "expected a {PEM_LABEL} PEM block, found {}",
                pem.tag()
            )));
        }
        Self::from_der(pem.contents())
    }

    /// Creates a new self-signed certificate.
    ///
    /// # Arguments
    /// * `template` - Subject, serial number and validity of the certificate.
    /// * `key` - The key pair that is both certified and used for signing.
    pub fn new_self_signed(template: &CertificateTemplate, key: &KeyPair) -> Result<Self> {
        // For self-signed certificates, the issuer is the same as the subject
        let self_issuer = SelfIssuer {
            name: template.subject.clone(),
            key,
        };

        let certificate = self_issuer.issue(template, &key.public_key())?;
        log::info!(
            "Issued self-signed certificate for '{}'",
            template.subject.common_name
        );
        Ok(certificate)
    }

    /// Decodes the signed portion back into its parameters.
    pub fn tbs_certificate(&self) -> Result<TbsCertificate> {
        TbsCertificate::from_tbs_certificate_inner(&self.inner.tbs_certificate)
    }

    /// Checks that the issuer equals the subject and the signature verifies
    /// against the certificate's own public key.
    pub fn verify_self_signed(&self) -> Result<()> {
        let tbs = &self.inner.tbs_certificate;
        if tbs.issuer != tbs.subject {
            return Err(JksKitError::Decoding(
                "certificate issuer differs from its subject".to_string(),
            ));
        }
        SignatureAlgorithm::try_from(&self.inner.signature_algorithm)?;

        let public_key = PublicKey::from_x509spki(&tbs.subject_public_key_info)?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            JksKitError::Decoding("signature has unused bits".to_string())
        })?;
        public_key.verify(&tbs.to_der()?, signature)
    }

    /// Extracts the fields shown in reports.
    pub fn info(&self) -> Result<CertificateInfo> {
        let tbs = self.tbs_certificate()?;
        let inner_tbs = &self.inner.tbs_certificate;
        Ok(CertificateInfo {
            serial_number: BigUint::from_bytes_be(&tbs.serial_number).to_string(),
            subject: inner_tbs.subject.to_string(),
            issuer: inner_tbs.issuer.to_string(),
            not_before: tbs.validity.not_before,
            not_after: tbs.validity.not_after,
        })
    }

    pub fn subject(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    /// Key usage flags, if the extension is present.
    pub fn key_usage(&self) -> Result<Option<KeyUsage>> {
        self.tbs_certificate()?
            .extensions
            .iter()
            .find(|ext| ext.oid == KeyUsage::OID)
            .map(|ext| ext.to_extension::<KeyUsage>())
            .transpose()
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: DistinguishedName,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> DistinguishedName {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }

    fn extensions(&self, subject_public_key: &PublicKey) -> Result<Vec<ExtensionParam>> {
        let spki = subject_public_key.to_spki()?;
        let key_id = SubjectKeyIdentifier::from_public_key_bits(spki.subject_public_key.raw_bytes());
        Ok(vec![ExtensionParam::from_extension(key_id, false)?])
    }
}
