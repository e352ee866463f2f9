//! Output naming and the human readable issuance report.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::cert::CertificateInfo;
use crate::error::{JksKitError, Result};
use crate::fingerprint::FingerprintSet;

const FILE_TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year][month][day]-[hour][minute][second]");
const DISPLAY_TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const RULE_WIDTH: usize = 51;

/// Keystore and report locations of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub keystore: PathBuf,
    pub report: PathBuf,
}

impl OutputPaths {
    /// Inserts `-YYYYMMDD-HHMMSS` before the extension of `base`; the report
    /// is the `.txt` sibling.
    ///
    /// `build/release.jks` at 2025-01-02 03:04:05 becomes
    /// `build/release-20250102-030405.jks` and `build/release-20250102-030405.txt`.
    pub fn timestamped(base: &Path, at: OffsetDateTime) -> Result<Self> {
        let stamp = at
            .format(FILE_TIMESTAMP)
            .map_err(|e| JksKitError::IoWrite(e.to_string()))?;
        let stem = base
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stamped = format!("{stem}-{stamp}");

        let keystore = match base.extension() {
            Some(ext) => base.with_file_name(format!("{stamped}.{}", ext.to_string_lossy())),
            None => base.with_file_name(&stamped),
        };
        let report = base.with_file_name(format!("{stamped}.txt"));
        Ok(Self { keystore, report })
    }
}

/// Everything shown to the operator after a successful run.
///
/// Passwords are printed in the clear unless redacted. That suits a local
/// build tool; do not ship the report where the keystore is secret.
#[derive(Debug, Clone)]
pub struct Report {
    pub paths: OutputPaths,
    pub alias: String,
    pub container_password: String,
    pub entry_password: String,
    pub certificate: CertificateInfo,
    pub fingerprints: FingerprintSet,
}

impl Report {
    /// Displays the report, with `********` in place of the passwords when
    /// `redact_passwords` is set.
    pub fn display(&self, redact_passwords: bool) -> ReportDisplay<'_> {
        ReportDisplay {
            report: self,
            redact_passwords,
        }
    }

    pub fn render(&self, redact_passwords: bool) -> String {
        self.display(redact_passwords).to_string()
    }

    /// Writes the rendered report to a new file at its path.
    pub fn write(&self, redact_passwords: bool) -> Result<()> {
        let path = &self.paths.report;
        let write_error = |e: std::io::Error| JksKitError::IoWrite(format!("{}: {e}", path.display()));
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(write_error)?;
        file.write_all(self.render(redact_passwords).as_bytes())
            .map_err(write_error)
    }
}

/// Helper returned by [`Report::display`].
pub struct ReportDisplay<'a> {
    report: &'a Report,
    redact_passwords: bool,
}

impl ReportDisplay<'_> {
    fn password<'p>(&self, value: &'p str) -> &'p str {
        if self.redact_passwords { "********" } else { value }
    }
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(f, "{heavy}")?;
        writeln!(f, "Signing certificate")?;
        writeln!(f, "{heavy}")?;
        writeln!(f)?;
        writeln!(f, "Keystore:")?;
        writeln!(f, "{light}")?;
        writeln!(f, "Keystore path: {}", report.paths.keystore.display())?;
        writeln!(f, "Report path: {}", report.paths.report.display())?;
        writeln!(f, "Key alias: {}", report.alias)?;
        writeln!(f, "Keystore password: {}", self.password(&report.container_password))?;
        writeln!(f, "Key password: {}", self.password(&report.entry_password))?;
        writeln!(f)?;
        writeln!(f, "Certificate:")?;
        writeln!(f, "Serial number: {}", report.certificate.serial_number)?;
        writeln!(f, "Subject: {}", report.certificate.subject)?;
        writeln!(f, "Issuer: {}", report.certificate.issuer)?;
        writeln!(
            f,
            "Valid: {} to {}",
            display_time(report.certificate.not_before),
            display_time(report.certificate.not_after)
        )?;
        writeln!(f)?;
        writeln!(f, "Fingerprints:")?;
        writeln!(f, "{}", report.fingerprints)?;
        writeln!(f, "{heavy}")
    }
}

fn display_time(value: OffsetDateTime) -> String {
    value
        .format(DISPLAY_TIMESTAMP)
        .map(|formatted| format!("{formatted} UTC"))
        .unwrap_or_else(|_| value.to_string())
}
