//! TLS posture inspection for a remote host.
//!
//! Three independent pieces compose the core, invoked in sequence by a
//! caller (the bundled CLI, or any other frontend):
//!
//! - [`resolve`] normalizes a user-supplied string (bare domain or full URL)
//!   into a connectable authority.
//! - [`CertificateInspector`] opens a verifying TLS connection, reads the
//!   peer certificate and classifies the outcome as a [`CertificateReport`].
//! - [`HeaderAuditor`] issues a plain HTTPS GET and reports on the security
//!   headers the response carries.
//!
//! The two probes share nothing but the hostname; a header failure never
//! downgrades a certificate result and vice versa.
//!
//! ```no_run
//! use tlsinspect::{resolve, CertificateInspector, HeaderAuditor, Inspection};
//!
//! let host = resolve("https://example.com/some/path")?;
//! let inspection = Inspection::of(
//!     &host,
//!     &CertificateInspector::new(),
//!     &HeaderAuditor::new(),
//! );
//! println!("{}", serde_json::to_string_pretty(&inspection)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod headers;
pub mod metrics;

pub use error::ProbeError;
pub use headers::{HeaderAuditor, HeaderReport};

use std::fmt;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use log::debug;
use openssl::ssl::{HandshakeError, SslConnector, SslMethod};
use openssl::x509::{X509NameRef, X509Ref, X509VerifyResult};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

/// Upper bound applied to connect, handshake reads/writes and header probes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const HTTPS_PORT: u16 = 443;

/// Normalizes a user-supplied target into a connectable authority.
///
/// Bare domains and scheme-qualified URLs yield the same result: anything
/// without an `http`-prefixed scheme gets `https://` prepended before
/// parsing, then only the authority (host plus explicit non-default port) is
/// kept. Path, query and fragment are discarded. Pure string work, no
/// network access.
///
/// Empty or unparseable input is a caller-side precondition violation and
/// comes back as [`ProbeError::InvalidTarget`].
pub fn resolve(input: &str) -> Result<String, ProbeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ProbeError::InvalidTarget {
            reason: "hostname cannot be empty".to_string(),
        });
    }
    let with_scheme = if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = Url::parse(&with_scheme).map_err(|e| ProbeError::InvalidTarget {
        reason: format!("{}: {}", trimmed, e),
    })?;
    let host = url.host_str().ok_or_else(|| ProbeError::InvalidTarget {
        reason: format!("no host in {}", trimmed),
    })?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Ordered mapping of distinguished-name attributes to values.
///
/// Different certificate authorities populate different attributes, so no
/// fixed key schema is assumed. Keys are OpenSSL long names (`commonName`,
/// `organizationName`, ...) in the order they appear in the certificate.
/// Serializes as a JSON object preserving that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    entries: Vec<(String, String)>,
}

impl DistinguishedName {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn common_name(&self) -> Option<&str> {
        self.get("commonName")
    }

    pub fn organization(&self) -> Option<&str> {
        self.get("organizationName")
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    fn from_x509_name(name: &X509NameRef) -> Self {
        let mut dn = Self::default();
        for entry in name.entries() {
            let key = match entry.object().nid().long_name() {
                Ok(long) => long.to_string(),
                Err(_) => entry.object().to_string(),
            };
            let value = match entry.data().as_utf8() {
                Ok(utf8) => utf8.to_string(),
                Err(_) => String::from_utf8_lossy(entry.data().as_slice()).into_owned(),
            };
            dn.push(key, value);
        }
        dn
    }
}

impl FromIterator<(String, String)> for DistinguishedName {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        DistinguishedName {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for DistinguishedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DistinguishedName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DnVisitor;

        impl<'de> Visitor<'de> for DnVisitor {
            type Value = DistinguishedName;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of distinguished-name attributes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut dn = DistinguishedName::default();
                while let Some((name, value)) = access.next_entry::<String, String>()? {
                    dn.push(name, value);
                }
                Ok(dn)
            }
        }

        deserializer.deserialize_map(DnVisitor)
    }
}

/// Outcome of a certificate inspection. Exactly one variant applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CertificateReport {
    /// Handshake completed and the verifier accepted the peer certificate.
    ///
    /// `days_remaining` may be negative: an expired certificate the verifier
    /// accepted anyway is still reported here, expiry judgment belongs to
    /// the caller.
    Valid {
        subject: DistinguishedName,
        issuer: DistinguishedName,
        /// Start of validity, day precision (`YYYY-MM-DD`)
        valid_from: String,
        /// End of validity, day precision (`YYYY-MM-DD`)
        valid_to: String,
        /// Whole days between now (UTC) and `valid_to`; negative once expired
        days_remaining: i64,
        /// Negotiated protocol, e.g. `TLSv1.3`
        tls_version: String,
        /// Serial number, uppercase hex
        serial_number: String,
    },
    /// The verifier rejected the peer certificate (trust chain, hostname
    /// mismatch, malformed chain). Retrying will not help.
    Invalid { reason: String },
    /// Transport-level failure: DNS, refusal, timeout, handshake transport
    /// fault. Retrying is at the caller's discretion.
    Unreachable { reason: String },
}

impl CertificateReport {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn days_remaining(&self) -> Option<i64> {
        match self {
            Self::Valid { days_remaining, .. } => Some(*days_remaining),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Invalid { reason } | Self::Unreachable { reason } => Some(reason),
            Self::Valid { .. } => None,
        }
    }
}

/// Parses a validity timestamp as OpenSSL renders it,
/// `"May 26 00:00:00 2026 GMT"` (day-of-month may be space padded).
pub fn parse_validity_timestamp(raw: &str) -> Result<NaiveDateTime, ProbeError> {
    let stripped = raw.trim().trim_end_matches("GMT").trim_end();
    NaiveDateTime::parse_from_str(stripped, "%b %e %H:%M:%S %Y").map_err(|e| {
        ProbeError::CertificateParse {
            reason: format!("unparseable validity timestamp {:?}: {}", raw, e),
        }
    })
}

/// Day-precision rendering (`YYYY-MM-DD`) used for the report dates.
pub fn format_day(ts: NaiveDateTime) -> String {
    ts.date().format("%Y-%m-%d").to_string()
}

fn days_remaining_at(not_after: NaiveDateTime, now: NaiveDateTime) -> i64 {
    // floored, not truncated: a certificate expired by a few hours must
    // already read -1, not 0
    (not_after - now).num_seconds().div_euclid(86_400)
}

/// Probes a host's TLS endpoint and classifies its certificate.
///
/// Carries its configuration explicitly instead of relying on process-wide
/// defaults, so tests can inject a custom trust store or timeout.
#[derive(Debug, Clone)]
pub struct CertificateInspector {
    timeout: Duration,
    ca_file: Option<PathBuf>,
}

impl Default for CertificateInspector {
    fn default() -> Self {
        CertificateInspector {
            timeout: DEFAULT_TIMEOUT,
            ca_file: None,
        }
    }
}

impl CertificateInspector {
    /// Inspector with the default 5s timeout and the platform trust store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Verify against the given PEM bundle instead of the platform store.
    pub fn with_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    /// Connects to `target` (host or host:port, default 443), performs a
    /// verifying TLS handshake with SNI set to the host, and reports the
    /// peer certificate. Never panics and never leaves the connection open;
    /// every failure comes back as the `Invalid` or `Unreachable` variant.
    pub fn inspect(&self, target: &str) -> CertificateReport {
        match self.probe(target) {
            Ok(report) => report,
            Err(err) => err.into_report(),
        }
    }

    fn probe(&self, target: &str) -> Result<CertificateReport, ProbeError> {
        let (host, port) = split_host_port(target);
        let address = format!("{}:{}", host, port);

        let socket_addr = address
            .to_socket_addrs()
            .map_err(|e| ProbeError::DnsResolution {
                host: host.to_string(),
                source: e,
            })?
            .next()
            .ok_or_else(|| ProbeError::DnsResolution {
                host: host.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
            })?;

        debug!("connecting to {} ({})", address, socket_addr);
        let tcp = TcpStream::connect_timeout(&socket_addr, self.timeout).map_err(|e| {
            if e.kind() == io::ErrorKind::TimedOut {
                ProbeError::ConnectTimeout {
                    address: address.clone(),
                    secs: self.timeout.as_secs(),
                }
            } else {
                ProbeError::ConnectionFailed {
                    address: address.clone(),
                    source: e,
                }
            }
        })?;
        tcp.set_read_timeout(Some(self.timeout))?;
        tcp.set_write_timeout(Some(self.timeout))?;

        let mut builder = SslConnector::builder(SslMethod::tls())?;
        if let Some(ca_file) = &self.ca_file {
            builder.set_ca_file(ca_file)?;
        }
        let connector = builder.build();

        // SslConnector verifies the chain against the trust store and the
        // peer identity against `host`, which it also sends as SNI.
        let mut stream = match connector.connect(host, tcp) {
            Ok(stream) => stream,
            Err(err) => {
                return Err(classify_handshake_error(
                    err,
                    &address,
                    self.timeout.as_secs(),
                ))
            }
        };

        let tls_version = stream.ssl().version_str().to_string();
        debug!("handshake with {} complete, protocol {}", address, tls_version);

        let report = match stream.ssl().peer_certificate() {
            Some(cert) => certificate_summary(&cert, &tls_version),
            None => Err(ProbeError::HandshakeFailed {
                details: format!("{} presented no certificate", address),
            }),
        };

        // Torn down before returning on every path: close_notify here, an
        // implicit drop on the error returns above.
        let _ = stream.shutdown();
        report
    }
}

fn split_host_port(target: &str) -> (&str, u16) {
    // bracketed IPv6 authority, "[::1]:8443" or "[::1]"
    if let Some(end) = target.rfind(']') {
        return match target[end + 1..]
            .strip_prefix(':')
            .and_then(|p| p.parse().ok())
        {
            Some(port) => (&target[..=end], port),
            None => (target, HTTPS_PORT),
        };
    }
    match target.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) if !host.is_empty() && !host.contains(':') => (host, port),
            _ => (target, HTTPS_PORT),
        },
        None => (target, HTTPS_PORT),
    }
}

fn classify_handshake_error(
    err: HandshakeError<TcpStream>,
    address: &str,
    timeout_secs: u64,
) -> ProbeError {
    match err {
        HandshakeError::Failure(mid) => {
            let verify = mid.ssl().verify_result();
            if verify != X509VerifyResult::OK {
                return ProbeError::VerificationFailed {
                    reason: verify.error_string().to_string(),
                };
            }
            if let Some(io_err) = mid.error().io_error() {
                if matches!(
                    io_err.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                ) {
                    return ProbeError::ConnectTimeout {
                        address: address.to_string(),
                        secs: timeout_secs,
                    };
                }
            }
            ProbeError::HandshakeFailed {
                details: format!("{} with {}", mid.error(), address),
            }
        }
        HandshakeError::SetupFailure(stack) => ProbeError::OpenSsl {
            details: stack.to_string(),
        },
        HandshakeError::WouldBlock(_) => ProbeError::HandshakeFailed {
            details: format!("handshake with {} interrupted", address),
        },
    }
}

fn certificate_summary(cert: &X509Ref, tls_version: &str) -> Result<CertificateReport, ProbeError> {
    let subject = DistinguishedName::from_x509_name(cert.subject_name());
    let issuer = DistinguishedName::from_x509_name(cert.issuer_name());
    let not_before = parse_validity_timestamp(&cert.not_before().to_string())?;
    let not_after = parse_validity_timestamp(&cert.not_after().to_string())?;
    let serial_number = cert.serial_number().to_bn()?.to_hex_str()?.to_string();
    Ok(valid_report(
        subject,
        issuer,
        not_before,
        not_after,
        tls_version.to_string(),
        serial_number,
        Utc::now().naive_utc(),
    ))
}

// A certificate the verifier accepted stays `Valid` even when `not_after`
// is already behind `now`; `days_remaining` goes negative instead. Expiry
// judgment is the caller's.
fn valid_report(
    subject: DistinguishedName,
    issuer: DistinguishedName,
    not_before: NaiveDateTime,
    not_after: NaiveDateTime,
    tls_version: String,
    serial_number: String,
    now: NaiveDateTime,
) -> CertificateReport {
    CertificateReport::Valid {
        subject,
        issuer,
        valid_from: format_day(not_before),
        valid_to: format_day(not_after),
        days_remaining: days_remaining_at(not_after, now),
        tls_version,
        serial_number,
    }
}

/// Inspects `target` with default settings. See [`CertificateInspector`].
pub fn inspect(target: &str) -> CertificateReport {
    CertificateInspector::new().inspect(target)
}

/// Audits `target`'s response headers with default settings.
/// See [`HeaderAuditor`].
pub fn audit(target: &str) -> HeaderReport {
    HeaderAuditor::new().audit(target)
}

/// Combined outcome of the two probes for one host.
#[derive(Debug, Serialize, Deserialize)]
pub struct Inspection {
    pub host: String,
    pub certificate: CertificateReport,
    pub headers: HeaderReport,
}

impl Inspection {
    /// Runs both probes sequentially against an already-resolved target.
    /// The probes are independent: each carries its own failure channel.
    pub fn of(host: &str, inspector: &CertificateInspector, auditor: &HeaderAuditor) -> Self {
        Inspection {
            host: host.to_string(),
            certificate: inspector.inspect(host),
            headers: auditor.audit(host),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use openssl::asn1::Asn1Time;
    use openssl::bn::BigNum;
    use openssl::hash::MessageDigest;
    use openssl::pkey::{PKey, Private};
    use openssl::rsa::Rsa;
    use openssl::ssl::SslAcceptor;
    use openssl::x509::{X509, X509NameBuilder};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn resolve_bare_domain_and_url_agree() {
        assert_eq!(
            resolve("example.com").unwrap(),
            resolve("https://example.com/anything?q=1#frag").unwrap()
        );
        assert_eq!(resolve("example.com").unwrap(), "example.com");
    }

    #[test]
    fn resolve_is_idempotent() {
        for input in ["example.com", "https://example.com/path", "example.com:8443"] {
            let once = resolve(input).unwrap();
            assert_eq!(resolve(&once).unwrap(), once);
        }
    }

    #[test]
    fn resolve_keeps_explicit_port() {
        assert_eq!(resolve("example.com:8443").unwrap(), "example.com:8443");
        assert_eq!(
            resolve("https://secure.example.com:9443/admin").unwrap(),
            "secure.example.com:9443"
        );
    }

    #[test]
    fn resolve_accepts_plain_http_scheme() {
        assert_eq!(resolve("http://example.com/login").unwrap(), "example.com");
    }

    #[test]
    fn resolve_rejects_empty_input() {
        for input in ["", "   "] {
            match resolve(input) {
                Err(ProbeError::InvalidTarget { reason }) => {
                    assert!(reason.contains("empty"));
                }
                other => panic!("expected InvalidTarget, got {:?}", other),
            }
        }
    }

    #[test]
    fn split_host_port_defaults_to_443() {
        assert_eq!(split_host_port("example.com"), ("example.com", 443));
        assert_eq!(split_host_port("example.com:8443"), ("example.com", 8443));
    }

    #[test]
    fn split_host_port_handles_bracketed_ipv6() {
        assert_eq!(split_host_port("[::1]:8443"), ("[::1]", 8443));
        assert_eq!(split_host_port("[::1]"), ("[::1]", 443));
        assert_eq!(split_host_port("[2001:db8::1]"), ("[2001:db8::1]", 443));
        // resolve() keeps the brackets, so the round trip stays connectable
        let authority = resolve("https://[::1]:8443").unwrap();
        assert_eq!(authority, "[::1]:8443");
        assert_eq!(split_host_port(&authority), ("[::1]", 8443));
    }

    #[test]
    fn parse_validity_timestamp_openssl_format() {
        let ts = parse_validity_timestamp("May 26 00:00:00 2026 GMT").unwrap();
        assert_eq!(format_day(ts), "2026-05-26");
        // day-of-month is space padded below 10
        let padded = parse_validity_timestamp("Jan  2 08:30:00 2031 GMT").unwrap();
        assert_eq!(format_day(padded), "2031-01-02");
    }

    #[test]
    fn parse_validity_timestamp_rejects_garbage() {
        match parse_validity_timestamp("not a timestamp") {
            Err(ProbeError::CertificateParse { reason }) => {
                assert!(reason.contains("not a timestamp"));
            }
            other => panic!("expected CertificateParse, got {:?}", other),
        }
    }

    #[test]
    fn day_precision_formatting_is_stable() {
        let ts = parse_validity_timestamp("May 26 13:45:10 2026 GMT").unwrap();
        let formatted = format_day(ts);
        let reparsed = NaiveDate::parse_from_str(&formatted, "%Y-%m-%d").unwrap();
        assert_eq!(reparsed, ts.date());
        assert_eq!(reparsed.format("%Y-%m-%d").to_string(), formatted);
    }

    #[test]
    fn days_remaining_signs() {
        let now = NaiveDate::from_ymd_opt(2026, 5, 26)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let future = now + chrono::Duration::days(90);
        let past = now - chrono::Duration::days(30);
        assert_eq!(days_remaining_at(future, now), 90);
        assert_eq!(days_remaining_at(past, now), -30);
        assert_eq!(days_remaining_at(now, now), 0);

        // sub-day boundaries: expired by hours is already negative,
        // expiring within the day is still 0
        let expired_hours_ago = now - chrono::Duration::hours(12);
        assert_eq!(days_remaining_at(expired_hours_ago, now), -1);
        let expires_in_hours = now + chrono::Duration::hours(12);
        assert_eq!(days_remaining_at(expires_in_hours, now), 0);
    }

    fn self_signed(not_before: Asn1Time, not_after: Asn1Time) -> (X509, PKey<Private>) {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("O", "Inspect Test Org").unwrap();
        name.append_entry_by_text("CN", "inspect.test").unwrap();
        let name = name.build();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder.set_not_before(&not_before).unwrap();
        builder.set_not_after(&not_after).unwrap();
        let serial = BigNum::from_u32(0xABCD).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();
        (builder.build(), key)
    }

    #[test]
    fn certificate_summary_extracts_ordered_names() {
        let (cert, _key) = self_signed(
            Asn1Time::days_from_now(0).unwrap(),
            Asn1Time::days_from_now(90).unwrap(),
        );
        match certificate_summary(&cert, "TLSv1.3").unwrap() {
            CertificateReport::Valid {
                subject,
                issuer,
                days_remaining,
                tls_version,
                serial_number,
                ..
            } => {
                assert_eq!(subject.common_name(), Some("inspect.test"));
                assert_eq!(subject.organization(), Some("Inspect Test Org"));
                // entries keep certificate order: O was appended before CN
                let keys: Vec<&str> = subject.iter().map(|(k, _)| k).collect();
                assert_eq!(keys, vec!["organizationName", "commonName"]);
                assert_eq!(issuer.common_name(), Some("inspect.test"));
                assert!((88..=90).contains(&days_remaining));
                assert_eq!(tls_version, "TLSv1.3");
                assert_eq!(serial_number, "ABCD");
            }
            other => panic!("expected Valid, got {:?}", other),
        }
    }

    #[test]
    fn expired_certificate_still_summarizes_as_valid() {
        // 2020-01-01T00:00:00Z, long expired
        let (cert, _key) = self_signed(
            Asn1Time::from_unix(1546300800).unwrap(),
            Asn1Time::from_unix(1577836800).unwrap(),
        );
        match certificate_summary(&cert, "TLSv1.2").unwrap() {
            CertificateReport::Valid {
                valid_from,
                valid_to,
                days_remaining,
                ..
            } => {
                assert_eq!(valid_from, "2019-01-01");
                assert_eq!(valid_to, "2020-01-01");
                assert!(days_remaining < 0, "expired cert must report negative days");
            }
            other => panic!("expired cert must stay Valid, got {:?}", other),
        }
    }

    #[test]
    fn distinguished_name_serde_preserves_order() {
        let dn: DistinguishedName = vec![
            ("organizationName".to_string(), "Example Org".to_string()),
            ("commonName".to_string(), "example.com".to_string()),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&dn).unwrap();
        assert_eq!(
            json,
            r#"{"organizationName":"Example Org","commonName":"example.com"}"#
        );
        let back: DistinguishedName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dn);
    }

    #[test]
    fn inspect_self_signed_peer_is_invalid() {
        let (cert, key) = self_signed(
            Asn1Time::days_from_now(0).unwrap(),
            Asn1Time::days_from_now(90).unwrap(),
        );

        let mut acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
        acceptor.set_private_key(&key).unwrap();
        acceptor.set_certificate(&cert).unwrap();
        let acceptor = acceptor.build();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                // the client aborts the handshake after rejecting the cert
                let _ = acceptor.accept(stream);
            }
        });

        let report = CertificateInspector::new().inspect(&format!("127.0.0.1:{}", port));
        server.join().unwrap();

        match report {
            CertificateReport::Invalid { reason } => {
                assert!(!reason.is_empty());
            }
            other => panic!("untrusted self-signed cert must be Invalid, got {:?}", other),
        }
    }

    #[test]
    fn inspect_refused_port_is_unreachable() {
        // bind to grab a free port, then drop the listener so nothing answers
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let target = format!("127.0.0.1:{}", port);

        let started = Instant::now();
        let report = CertificateInspector::new().inspect(&target);
        assert!(started.elapsed() < Duration::from_secs(6));

        match report {
            CertificateReport::Unreachable { reason } => {
                assert!(!reason.is_empty());
                assert!(reason.contains(&target), "reason was {:?}", reason);
            }
            other => panic!("expected Unreachable, got {:?}", other),
        }
    }

    #[test]
    fn inspect_unresolvable_host_is_unreachable() {
        // .invalid never resolves (RFC 2606)
        match CertificateInspector::new().inspect("host.invalid") {
            CertificateReport::Unreachable { reason } => {
                assert!(reason.contains("host.invalid"));
            }
            other => panic!("expected Unreachable, got {:?}", other),
        }
    }

    #[test]
    fn certificate_report_json_tagging() {
        let report = CertificateReport::Unreachable {
            reason: "Connection to example.com:443 timed out after 5s".to_string(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "unreachable");
        let back: CertificateReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
