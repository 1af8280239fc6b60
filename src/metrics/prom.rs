use lazy_static::lazy_static;
use log::warn;
use prometheus::{labels, register_gauge, Gauge};

use crate::{CertificateReport, Inspection};

lazy_static! {
    static ref TLSINSPECT_DAYS_REMAINING: Gauge = register_gauge!(
        "tlsinspect_days_remaining",
        "days until certificate expiry, negative once expired"
    )
    .unwrap();
    static ref TLSINSPECT_CERTIFICATE_STATUS: Gauge = register_gauge!(
        "tlsinspect_certificate_status",
        "certificate classification"
    )
    .unwrap();
}

/// Pushes one gauge set per inspected host to a Prometheus push gateway.
/// # Arguments
/// * `results` - Inspection outcomes to export
/// * `gateway_address` - Push gateway base address
pub fn push_inspections(results: &[Inspection], gateway_address: &str) {
    for inspection in results.iter() {
        TLSINSPECT_DAYS_REMAINING.set(inspection.certificate.days_remaining().unwrap_or(0) as f64);

        // 0 = valid, 1 = invalid, 2 = unreachable
        let status_value = match &inspection.certificate {
            CertificateReport::Valid { .. } => 0.0,
            CertificateReport::Invalid { .. } => 1.0,
            CertificateReport::Unreachable { .. } => 2.0,
        };
        TLSINSPECT_CERTIFICATE_STATUS.set(status_value);

        let issuer = match &inspection.certificate {
            CertificateReport::Valid { issuer, .. } => {
                issuer.common_name().unwrap_or("unknown").to_string()
            }
            _ => "unknown".to_string(),
        };

        let metric_families = prometheus::gather();
        let pushed = prometheus::push_metrics(
            "tlsinspect",
            labels! {
                "instance".to_owned() => "tlsinspect".to_owned(),
                "job".to_owned() => "tlsinspect".to_owned(),
                "host".to_owned() => inspection.host.to_owned(),
                "issuer".to_owned() => issuer,
                "valid".to_owned() => inspection.certificate.is_valid().to_string(),
                "hsts".to_owned() => inspection.headers.hsts().is_some().to_string(),
            },
            &format!("{}/metrics/job", gateway_address),
            metric_families,
            None,
        );

        if let Err(e) = pushed {
            warn!("failed to push metrics to {}: {}", gateway_address, e);
        }
    }
}
