//! Security-header audit of a host's HTTPS response.
//!
//! Supplementary to the certificate probe: one GET against the host root,
//! three headers of interest, the final status code. Absence of a header is
//! a legitimate finding, not an error; any network fault collapses into a
//! single error variant because headers never carry the primary verdict.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderName, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::DEFAULT_TIMEOUT;

/// What the host's HTTPS response said about its security headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderReport {
    /// The probe itself failed (timeout, TLS, DNS, reset).
    ///
    /// Listed first so untagged deserialization tries the mandatory `error`
    /// field before the all-optional `Headers` shape can swallow it.
    Error { error: String },
    /// The request completed; each header is `None` when the host omits it.
    Headers {
        /// `Strict-Transport-Security`
        hsts: Option<String>,
        /// `X-Frame-Options`
        frame_options: Option<String>,
        /// `X-Content-Type-Options`
        content_type_options: Option<String>,
        /// Final status code after redirects
        status_code: Option<u16>,
    },
}

impl HeaderReport {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn hsts(&self) -> Option<&str> {
        match self {
            Self::Headers { hsts, .. } => hsts.as_deref(),
            Self::Error { .. } => None,
        }
    }
}

/// Probes `https://{target}/` for security headers.
///
/// The timeout is explicit per instance; redirects follow the client
/// library's default policy.
#[derive(Debug, Clone)]
pub struct HeaderAuditor {
    timeout: Duration,
}

impl Default for HeaderAuditor {
    fn default() -> Self {
        HeaderAuditor {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HeaderAuditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Issues the GET and summarizes the response headers. Never panics;
    /// any network-level failure becomes [`HeaderReport::Error`].
    pub fn audit(&self, target: &str) -> HeaderReport {
        let client = match Client::builder().timeout(self.timeout).build() {
            Ok(client) => client,
            Err(e) => {
                return HeaderReport::Error {
                    error: format!("could not build HTTP client: {}", e),
                }
            }
        };

        let url = format!("https://{}/", target);
        debug!("auditing headers at {}", url);
        match client.get(&url).send() {
            Ok(response) => {
                let status = response.status();
                summarize_headers(status, response.headers())
            }
            Err(e) => HeaderReport::Error {
                error: describe_request_error(&e, target, self.timeout),
            },
        }
    }
}

fn summarize_headers(status: StatusCode, headers: &HeaderMap) -> HeaderReport {
    HeaderReport::Headers {
        hsts: header_value(headers, &STRICT_TRANSPORT_SECURITY),
        frame_options: header_value(headers, &X_FRAME_OPTIONS),
        content_type_options: header_value(headers, &X_CONTENT_TYPE_OPTIONS),
        status_code: Some(status.as_u16()),
    }
}

fn header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn describe_request_error(err: &reqwest::Error, target: &str, timeout: Duration) -> String {
    if err.is_timeout() {
        format!(
            "request to {} timed out after {}s",
            target,
            timeout.as_secs()
        )
    } else if err.is_connect() {
        format!("could not connect to {}: {}", target, err)
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn present_headers_come_back_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000"),
        );
        headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

        match summarize_headers(StatusCode::OK, &headers) {
            HeaderReport::Headers {
                hsts,
                frame_options,
                content_type_options,
                status_code,
            } => {
                assert_eq!(hsts.as_deref(), Some("max-age=63072000"));
                assert_eq!(frame_options.as_deref(), Some("DENY"));
                assert_eq!(content_type_options.as_deref(), Some("nosniff"));
                assert_eq!(status_code, Some(200));
            }
            other => panic!("expected Headers, got {:?}", other),
        }
    }

    #[test]
    fn missing_headers_are_none_not_error() {
        let report = summarize_headers(StatusCode::NO_CONTENT, &HeaderMap::new());
        assert!(!report.is_error());
        match report {
            HeaderReport::Headers {
                hsts,
                frame_options,
                content_type_options,
                status_code,
            } => {
                assert_eq!(hsts, None);
                assert_eq!(frame_options, None);
                assert_eq!(content_type_options, None);
                assert_eq!(status_code, Some(204));
            }
            HeaderReport::Error { error } => panic!("unexpected error: {}", error),
        }
    }

    #[test]
    fn audit_failure_is_the_error_variant() {
        // .invalid never resolves, so this fails without touching the network
        let report = HeaderAuditor::new().audit("host.invalid");
        match report {
            HeaderReport::Error { error } => assert!(!error.is_empty()),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn report_serializes_flat() {
        let report = HeaderReport::Headers {
            hsts: Some("max-age=63072000".to_string()),
            frame_options: None,
            content_type_options: Some("nosniff".to_string()),
            status_code: Some(200),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["hsts"], "max-age=63072000");
        assert!(json["frame_options"].is_null());
        assert_eq!(json["status_code"], 200);

        let err = HeaderReport::Error {
            error: "request to example.com timed out after 5s".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert!(json["error"].as_str().unwrap().contains("timed out"));
    }
}
