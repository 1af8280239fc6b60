//! Error taxonomy for the inspection probes.
//!
//! Failures fall into two families with different remediation paths: the
//! client's verifier rejected the certificate (fix the certificate), or the
//! host could not be reached at all (fix connectivity). [`ProbeError`]
//! carries the fine-grained cause; [`ProbeError::into_report`] collapses it
//! into the two-variant classification callers pattern-match on.

use std::fmt;
use std::io;

use crate::CertificateReport;

/// Error raised while probing a host's TLS endpoint.
#[derive(Debug)]
pub enum ProbeError {
    /// The target string was empty or not a parseable authority
    InvalidTarget {
        /// Why the input was rejected
        reason: String,
    },

    /// DNS resolution failed for the given hostname
    DnsResolution {
        /// The hostname that failed to resolve
        host: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TCP connection to the target address failed (refused, unreachable, ...)
    ConnectionFailed {
        /// The address (host:port) that could not be reached
        address: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TCP connect did not complete within the configured deadline
    ConnectTimeout {
        /// The address (host:port) that timed out
        address: String,
        /// The deadline that elapsed, in seconds
        secs: u64,
    },

    /// TLS handshake failed for a transport or negotiation reason
    HandshakeFailed {
        /// Details about why the handshake failed
        details: String,
    },

    /// The verifier rejected the peer certificate (trust chain, hostname, ...)
    VerificationFailed {
        /// The verifier's human-readable diagnostic
        reason: String,
    },

    /// The peer certificate was received but a field could not be interpreted
    CertificateParse {
        /// Description of what went wrong
        reason: String,
    },

    /// OpenSSL error outside the handshake itself
    OpenSsl {
        /// The underlying OpenSSL error
        details: String,
    },

    /// Generic I/O error
    Io {
        /// The underlying I/O error
        source: io::Error,
    },
}

impl ProbeError {
    /// Collapses the error into the report variant a caller renders.
    ///
    /// Verifier rejections and uninterpretable certificates become
    /// `Invalid`; everything else is a transport fault and becomes
    /// `Unreachable` with a descriptive reason.
    pub fn into_report(self) -> CertificateReport {
        match self {
            Self::VerificationFailed { reason } | Self::CertificateParse { reason } => {
                CertificateReport::Invalid { reason }
            }
            other => CertificateReport::Unreachable {
                reason: other.to_string(),
            },
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTarget { reason } => {
                write!(f, "Invalid target: {}", reason)
            }
            Self::DnsResolution { host, .. } => {
                write!(
                    f,
                    "Failed to resolve hostname: {}. Check that the hostname is spelled correctly and your DNS configuration is working.",
                    host
                )
            }
            Self::ConnectionFailed { address, source } => {
                write!(
                    f,
                    "Connection failed to {}: {}. Verify the host is running a TLS service and is reachable.",
                    address, source
                )
            }
            Self::ConnectTimeout { address, secs } => {
                write!(f, "Connection to {} timed out after {}s", address, secs)
            }
            Self::HandshakeFailed { details } => {
                write!(f, "TLS handshake failed: {}", details)
            }
            Self::VerificationFailed { reason } => {
                write!(f, "Certificate verification failed: {}", reason)
            }
            Self::CertificateParse { reason } => {
                write!(f, "Certificate error: {}", reason)
            }
            Self::OpenSsl { details } => {
                write!(f, "OpenSSL error: {}", details)
            }
            Self::Io { source } => {
                write!(f, "I/O error: {}", source)
            }
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DnsResolution { source, .. } => Some(source),
            Self::ConnectionFailed { source, .. } => Some(source),
            Self::Io { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for ProbeError {
    fn from(e: io::Error) -> Self {
        Self::Io { source: e }
    }
}

impl From<openssl::error::ErrorStack> for ProbeError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSsl {
            details: e.to_string(),
        }
    }
}
