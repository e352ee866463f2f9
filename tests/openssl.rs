mod util;

use std::fs;
use std::process::Command;

use jkskit::fingerprint::FingerprintSet;
use jkskit::keystore::KeyStore;
use jkskit::pipeline;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::x509::{X509, X509NameRef};
use regex::Regex;

fn name_entry(name: &X509NameRef, nid: Nid) -> String {
    name.entries_by_nid(nid)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap()
        .to_string()
}

#[test]
fn test_openssl_crate_validate_cert() {
    let (_, certificate) = util::issue_test_certificate(10);
    let der = certificate.to_der().unwrap();
    let x509 = X509::from_der(&der).expect("Failed to parse DER");

    assert_eq!(name_entry(x509.subject_name(), Nid::COMMONNAME), "Test CA");
    assert_eq!(name_entry(x509.subject_name(), Nid::ORGANIZATIONNAME), "Test");
    assert_eq!(name_entry(x509.subject_name(), Nid::COUNTRYNAME), "CN");
    assert_eq!(name_entry(x509.issuer_name(), Nid::COMMONNAME), "Test CA");

    assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");

    let serial = x509.serial_number().to_bn().unwrap().to_dec_str().unwrap();
    assert_eq!(serial.to_string(), certificate.info().unwrap().serial_number);

    assert_eq!(
        x509.signature_algorithm().object().nid(),
        Nid::SHA256WITHRSAENCRYPTION
    );

    let from_pem = X509::from_pem(certificate.to_pem().unwrap().as_bytes()).unwrap();
    assert_eq!(from_pem.to_der().unwrap(), der);

    let public_key = x509.public_key().unwrap();
    assert_eq!(public_key.bits(), 2048);
    assert!(x509.verify(&public_key).unwrap(), "Self signature does not verify");
}

#[test]
fn test_openssl_digests_match_fingerprints() {
    let (_, certificate) = util::issue_test_certificate(1);
    let der = certificate.to_der().unwrap();
    let x509 = X509::from_der(&der).unwrap();
    let fingerprints = FingerprintSet::from_der(&der);

    let digest = |md: MessageDigest| hex::encode(&*x509.digest(md).unwrap());
    assert_eq!(digest(MessageDigest::md5()), fingerprints.md5);
    assert_eq!(digest(MessageDigest::sha1()), fingerprints.sha1);
    assert_eq!(digest(MessageDigest::sha256()), fingerprints.sha256);
}

#[test]
fn test_openssl_reads_keystore_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = util::test_config(dir.path());
    let output = pipeline::run(&config, false).unwrap();

    let keystore = KeyStore::from_bytes(&fs::read(&output.report.paths.keystore).unwrap(), "pw1")
        .unwrap();
    let entry = keystore.get_private_key_entry("testkey", "pw2").unwrap();

    let private_key =
        PKey::private_key_from_pkcs8(&entry.private_key).expect("Entry key is not PKCS#8");
    assert!(private_key.rsa().unwrap().check_key().unwrap());

    let x509 = X509::from_der(&entry.certificate_chain[0].content).unwrap();
    assert!(private_key.public_eq(&x509.public_key().unwrap()));
}

#[test]
#[ignore = "requires the openssl binary"]
fn test_openssl_cli_validate_cert() {
    let dir = tempfile::tempdir().unwrap();
    let (_, certificate) = util::issue_test_certificate(100);
    let cert_path = dir.path().join("cert.der");
    fs::write(&cert_path, certificate.to_der().unwrap()).expect("Failed to write certificate");

    let output = Command::new("openssl")
        .arg("x509")
        .arg("-inform")
        .arg("DER")
        .arg("-in")
        .arg(&cert_path)
        .arg("-noout")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");
    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output_text = String::from_utf8_lossy(&output.stdout);
    assert!(
        output_text.contains("Issuer: C=CN, O=Test, CN=Test CA"),
        "Issuer field is incorrect"
    );
    assert!(
        output_text.contains("Subject: C=CN, O=Test, CN=Test CA"),
        "Subject field is incorrect"
    );
    assert!(output_text.contains("Version: 3 (0x2)"));
    assert!(output_text.contains("Signature Algorithm: sha256WithRSAEncryption"));
    assert!(output_text.contains("X509v3 Key Usage: critical"));
    assert!(output_text.contains("Digital Signature, Key Encipherment"));
    assert!(output_text.contains("X509v3 Subject Key Identifier"));

    // a 100 year certificate ends past 2049 and needs GeneralizedTime
    let not_after = Regex::new(r"Not After : .+ (\d{4}) GMT").unwrap();
    let year: i32 = not_after.captures(&output_text).unwrap()[1].parse().unwrap();
    assert!(year >= 2125);
}
