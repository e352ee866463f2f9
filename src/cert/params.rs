use std::fmt;

use bon::Builder;
use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519;
use der::Tag;
use der::asn1::{Any, PrintableStringRef, SetOfVec};
use rand::RngCore;
use time::{Month, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use super::extensions::{KeyUsage, ToAndFromX509Extension};
use crate::error::{JksKitError, Result};

/// Parameters for issuing a self-signed certificate.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject (and issuer).
/// * `validity_years` - Number of calendar years the certificate stays valid.
/// * `issued_at` - Issuance time, used as `notBefore`. Whole seconds only.
/// * `serial_number` - Big-endian positive serial number.
/// * `key_usage` - Always digital signature + key encipherment.
#[derive(Clone, Debug, Builder)]
pub struct CertificateTemplate {
    pub subject: DistinguishedName,
    pub validity_years: i64,
    #[builder(default = issuance_time())]
    pub issued_at: OffsetDateTime,
    #[builder(default = random_serial_number())]
    pub serial_number: Vec<u8>,
    #[builder(skip = KeyUsage::signing_and_encipherment())]
    pub key_usage: KeyUsage,
}

impl CertificateTemplate {
    /// Validity window derived from `issued_at` and `validity_years`.
    pub fn validity(&self) -> Result<Validity> {
        Validity::for_years(self.issued_at, self.validity_years)
    }
}

/// Distinguished name parameters for building an X.509 certificate.
///
/// Empty optional fields are left out of the encoded name.
///
/// # Fields
/// * `common_name` - The common name (CN). Must not be empty.
/// * `country` - The country (C), encoded as a PrintableString.
/// * `state` - The state or province (ST).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509-compatible format.
    ///
    /// Attributes are emitted as C, ST, O, OU, CN.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName> {
        if self.common_name.trim().is_empty() {
            return Err(JksKitError::CertificateEncoding(
                "subject common name must not be empty".to_string(),
            ));
        }

        let mut rdns = Vec::new();
        if let Some(country) = non_empty(&self.country) {
            PrintableStringRef::new(country).map_err(|e| {
                JksKitError::CertificateEncoding(format!("invalid country '{country}': {e}"))
            })?;
            rdns.push(attribute(rfc4519::C, Tag::PrintableString, country)?);
        }
        if let Some(state) = non_empty(&self.state) {
            rdns.push(attribute(rfc4519::ST, Tag::Utf8String, state)?);
        }
        if let Some(organization) = non_empty(&self.organization) {
            rdns.push(attribute(rfc4519::O, Tag::Utf8String, organization)?);
        }
        if let Some(unit) = non_empty(&self.organization_unit) {
            rdns.push(attribute(rfc4519::OU, Tag::Utf8String, unit)?);
        }
        rdns.push(attribute(
            rfc4519::CN,
            Tag::Utf8String,
            &self.common_name,
        )?);

        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    ///
    /// Attributes other than C, ST, O, OU and CN are ignored.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Result<Self> {
        let mut dn = DistinguishedName::default();

        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let value = std::str::from_utf8(attr.value.value())
                    .map_err(|e| JksKitError::Decoding(e.to_string()))?
                    .to_string();
                match attr.oid {
                    rfc4519::CN => dn.common_name = value,
                    rfc4519::C => dn.country = Some(value),
                    rfc4519::ST => dn.state = Some(value),
                    rfc4519::O => dn.organization = Some(value),
                    rfc4519::OU => dn.organization_unit = Some(value),
                    _ => {}
                }
            }
        }

        Ok(dn)
    }
}

impl fmt::Display for DistinguishedName {
    /// RFC 4514 string form, most specific attribute first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_x509_name() {
            Ok(name) => write!(f, "{name}"),
            Err(_) => write!(f, "CN={}", self.common_name),
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

fn attribute(oid: ObjectIdentifier, tag: Tag, value: &str) -> Result<RelativeDistinguishedName> {
    let value = Any::new(tag, value.as_bytes())
        .map_err(|e| JksKitError::CertificateEncoding(e.to_string()))?;
    let set = SetOfVec::try_from(vec![AttributeTypeAndValue { oid, value }])
        .map_err(|e| JksKitError::CertificateEncoding(e.to_string()))?;
    Ok(RelativeDistinguishedName(set))
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period of `years` calendar years starting at `not_before`.
    ///
    /// February 29th rolls over to March 1st when the target year is not a
    /// leap year.
    pub fn for_years(not_before: OffsetDateTime, years: i64) -> Result<Self> {
        if years <= 0 {
            return Err(JksKitError::InvalidValidity(format!(
                "validity must be at least one year, got {years}"
            )));
        }

        let out_of_range =
            || JksKitError::InvalidValidity(format!("{years} years exceeds the supported range"));
        let target_year = i32::try_from(years)
            .ok()
            .and_then(|years| not_before.year().checked_add(years))
            .ok_or_else(out_of_range)?;

        let not_after = match not_before.replace_year(target_year) {
            Ok(not_after) => not_after,
            Err(_) if not_before.month() == Month::February && not_before.day() == 29 => not_before
                .replace_day(1)
                .and_then(|t| t.replace_month(Month::March))
                .and_then(|t| t.replace_year(target_year))
                .map_err(|_| out_of_range())?,
            Err(_) => return Err(out_of_range()),
        };

        Ok(Self {
            not_before,
            not_after,
        })
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        let value = extension
            .to_x509_extension_value()
            .map_err(|e| JksKitError::CertificateEncoding(e.to_string()))?;
        Ok(Self {
            oid: E::OID,
            critical,
            value,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }
}

/// Current UTC time truncated to whole seconds, the precision of X.509 times.
pub fn issuance_time() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}

/// A fresh 128-bit serial number from the thread-local CSPRNG.
///
/// The top bit is cleared so the DER INTEGER stays positive and the next bit
/// is set so the encoding always uses the full 16 bytes. Uniqueness is
/// probabilistic: two serials collide with chance around 2^-63 per pair.
pub fn random_serial_number() -> Vec<u8> {
    let mut serial = vec![0u8; 16];
    rand::rng().fill_bytes(&mut serial);
    serial[0] = (serial[0] & 0x7f) | 0x40;
    serial
}
