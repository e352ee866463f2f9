use std::path::Path;
use std::sync::OnceLock;

use jkskit::cert::Certificate;
use jkskit::cert::params::{CertificateTemplate, DistinguishedName};
use jkskit::config::{CaConfig, Config, KeystoreConfig};
use jkskit::key::KeyPair;

/// RSA generation is slow in debug builds, so tests that only need some key share one.
pub fn shared_key_pair() -> &'static KeyPair {
    static KEY_PAIR: OnceLock<KeyPair> = OnceLock::new();
    KEY_PAIR.get_or_init(|| KeyPair::generate(2048).expect("Failed to generate RSA key"))
}

pub fn test_subject() -> DistinguishedName {
    DistinguishedName::builder()
        .common_name("Test CA".to_string())
        .country("CN".to_string())
        .organization("Test".to_string())
        .build()
}

pub fn issue_test_certificate(validity_years: i64) -> (CertificateTemplate, Certificate) {
    let template = CertificateTemplate::builder()
        .subject(test_subject())
        .validity_years(validity_years)
        .build();
    let certificate = Certificate::new_self_signed(&template, shared_key_pair())
        .expect("Failed to issue certificate");
    (template, certificate)
}

/// CN=Test CA, O=Test, C=CN, 10 years, alias `testkey`, passwords pw1/pw2.
pub fn test_config(dir: &Path) -> Config {
    Config {
        keystore: KeystoreConfig {
            file_path: dir.join("out").join("test.jks"),
            password: "pw1".to_string(),
            key_alias: "testkey".to_string(),
            key_pass: "pw2".to_string(),
        },
        ca: CaConfig {
            country: "CN".to_string(),
            province: String::new(),
            organization: "Test".to_string(),
            organizational_unit: String::new(),
            common_name: "Test CA".to_string(),
            validity_years: 10,
            key_size: 2048,
        },
    }
}
