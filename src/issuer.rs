use der::Encode;
use x509_cert::certificate::CertificateInner;

use crate::cert::Certificate;
use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::KeyUsage;
use crate::cert::params::{CertificateTemplate, DistinguishedName, ExtensionParam};
use crate::error::{JksKitError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> DistinguishedName;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Issuer specific extensions added next to the key usage.
    fn extensions(&self, _subject_public_key: &PublicKey) -> Result<Vec<ExtensionParam>> {
        Ok(Vec::new())
    }

    /// Issues a certificate for `subject_public_key` based on the template.
    ///
    /// # Arguments
    /// * `template` - Subject, serial number, validity and key usage.
    /// * `subject_public_key` - The key being certified.
    ///
    /// # Returns
    /// A `Certificate` signed with [`Issuer::signing_key`].
    fn issue(
        &self,
        template: &CertificateTemplate,
        subject_public_key: &PublicKey,
    ) -> Result<Certificate> {
        let signature_algo = SignatureAlgorithm::Sha256WithRsa;

        let mut extensions: Vec<ExtensionParam> =
            vec![ExtensionParam::from_extension::<KeyUsage>(template.key_usage, true)?];
        extensions.extend(self.extensions(subject_public_key)?);

        let tbs_cert = TbsCertificate {
            serial_number: template.serial_number.clone(),
            signature_algorithm: signature_algo,
            issuer: self.issuer_name(),
            validity: template.validity()?,
            subject: template.subject.clone(),
            subject_public_key: subject_public_key.clone(),
            extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let tbs_der = tbs_cert_inner
            .to_der()
            .map_err(|e| JksKitError::CertificateEncoding(e.to_string()))?;

        let signature = self.signing_key().sign_data(&tbs_der)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algo.into(),
            signature: der::asn1::BitString::from_bytes(&signature)
                .map_err(|e| JksKitError::CertificateEncoding(e.to_string()))?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}
