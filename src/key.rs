use std::fmt;

use der::Encode;
use rand_core::OsRng;
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1v15::{Signature, SigningKey, VerifyingKey},
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey},
    signature::{SignatureEncoding, Signer, Verifier},
    traits::PublicKeyParts,
};
use sha2::Sha256;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{JksKitError, Result};

/// Weakest RSA modulus accepted for a new key pair.
pub const MIN_RSA_BITS: usize = 2048;

/// RSA key pair used to issue and sign a self-signed certificate.
///
/// The public half is always derived from the private half, so the pair can
/// never go out of sync.
#[derive(Clone)]
pub struct KeyPair {
    private: Box<RsaPrivateKey>,
    public: RsaPublicKey,
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    ///
    /// Randomness always comes from the operating system CSPRNG.
    pub fn generate(bits: usize) -> Result<Self> {
        if bits < MIN_RSA_BITS {
            return Err(JksKitError::KeyGeneration(format!(
                "{bits}-bit RSA keys are too weak, at least {MIN_RSA_BITS} bits are required"
            )));
        }
        let mut rng = OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        let public = RsaPublicKey::from(&private);
        log::debug!("Generated {bits}-bit RSA key pair");
        Ok(KeyPair {
            private: Box::new(private),
            public,
        })
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public.size() * 8
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_key_pair(self)
    }

    /// Signs `data` with RSASSA-PKCS1-v1_5 over SHA-256.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::<Sha256>::new((*self.private).clone());
        let signature = signing_key
            .try_sign(data)
            .map_err(|e| JksKitError::CertificateEncoding(e.to_string()))?;
        Ok(signature.to_vec())
    }

    /// SubjectPublicKeyInfo of the public half.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        self.public_key().to_spki()
    }

    /// PKCS#8 `PrivateKeyInfo` DER encoding of the private key.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let document = self
            .private
            .to_pkcs8_der()
            .map_err(|e| JksKitError::EntryProtection(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }

    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs8_der(der)?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair {
            private: Box::new(private),
            public,
        })
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// RSA public key as certified by a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        PublicKey(key_pair.public.clone())
    }

    /// Extracts the RSA key from a certificate's SubjectPublicKeyInfo.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki.to_der()?;
        let public = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| JksKitError::Decoding(e.to_string()))?;
        Ok(PublicKey(public))
    }

    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_key(self.0.clone())?)
    }

    /// Checks an RSASSA-PKCS1-v1_5 SHA-256 signature over `data`.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        let verifying_key = VerifyingKey::<Sha256>::new(self.0.clone());
        let signature = Signature::try_from(signature)
            .map_err(|e| JksKitError::Decoding(e.to_string()))?;
        verifying_key
            .verify(data, &signature)
            .map_err(|e| JksKitError::Decoding(format!("signature verification failed: {e}")))
    }
}
