use std::path::{Path, PathBuf};
use std::process::exit;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use strum_macros::{Display, EnumString};

use tlsinspect::config::Config;
use tlsinspect::metrics::prom;
use tlsinspect::{
    resolve, CertificateInspector, CertificateReport, HeaderAuditor, HeaderReport, Inspection,
};

const DEFAULT_CONFIG_FILE: &str = "tlsinspect.toml";

/// Inspects the TLS posture of remote hosts: peer certificate validity and
/// remaining lifetime, plus the HTTP security headers the host serves.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Hosts to inspect (bare domain, URL, or host:port)
    hosts: Vec<String>,

    /// Output format: text, summary or json
    #[arg(short, long)]
    output: Option<String>,

    /// Configuration file (defaults to ./tlsinspect.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Connect/handshake/request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// PEM bundle to verify against instead of the platform trust store
    #[arg(long)]
    ca_file: Option<String>,

    /// Exit code to use when any host is not valid
    #[arg(short, long)]
    exit_code: Option<i32>,

    /// Push metrics to a Prometheus push gateway after the run
    #[arg(long)]
    prometheus: bool,

    /// Push gateway address
    #[arg(long)]
    prometheus_address: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    example_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum OutputFormat {
    Text,
    Summary,
    Json,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if cli.example_config {
        println!("{}", Config::example_toml());
        return;
    }

    let config = load_config(&cli);

    let hosts = match &config.hosts {
        Some(hosts) if !hosts.is_empty() => hosts.clone(),
        _ => {
            eprintln!("No hosts given. Pass hosts on the command line or in the config file.");
            exit(2);
        }
    };

    let format_name = config.output.as_deref().unwrap_or("summary");
    let format = OutputFormat::from_str(format_name).unwrap_or_else(|_| {
        eprintln!(
            "Unknown output format {:?}, expected text, summary or json",
            format_name
        );
        exit(2);
    });

    let timeout = Duration::from_secs(config.timeout_seconds.unwrap_or(5));
    let mut inspector = CertificateInspector::new().with_timeout(timeout);
    if let Some(ca_file) = &config.ca_file {
        inspector = inspector.with_ca_file(ca_file.as_str());
    }
    let auditor = HeaderAuditor::new().with_timeout(timeout);

    let mut results: Vec<Inspection> = Vec::with_capacity(hosts.len());
    let mut skipped = 0usize;
    for raw in &hosts {
        match resolve(raw) {
            Ok(host) => results.push(Inspection::of(&host, &inspector, &auditor)),
            Err(err) => {
                eprintln!("Skipping {:?}: {}", raw, err);
                skipped += 1;
            }
        }
    }

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&results).unwrap_or_else(|_| "[]".to_string())
        ),
        OutputFormat::Text => {
            for inspection in &results {
                print_text(inspection);
            }
        }
        OutputFormat::Summary => print_summary(&results),
    }

    if let Some(prometheus) = &config.prometheus {
        if prometheus.enabled.unwrap_or(false) {
            let address = prometheus
                .address
                .as_deref()
                .unwrap_or("http://localhost:9091");
            prom::push_inspections(&results, address);
        }
    }

    let failures = skipped
        + results
            .iter()
            .filter(|inspection| !inspection.certificate.is_valid())
            .count();
    if failures > 0 {
        exit(config.exit_code.unwrap_or(0));
    }
}

fn load_config(cli: &Cli) -> Config {
    let mut config = Config::defaults();

    if let Some(path) = &cli.config {
        match Config::from_file(path) {
            Ok(file_config) => config = config.merge_with(file_config),
            Err(err) => {
                eprintln!("Failed to load {}: {}", path.display(), err);
                exit(2);
            }
        }
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        match Config::from_file(DEFAULT_CONFIG_FILE) {
            Ok(file_config) => config = config.merge_with(file_config),
            Err(err) => {
                eprintln!("Failed to load {}: {}", DEFAULT_CONFIG_FILE, err);
                exit(2);
            }
        }
    }

    let cli_hosts = if cli.hosts.is_empty() {
        None
    } else {
        Some(cli.hosts.clone())
    };
    config.merge_with(Config::from_cli_args(
        cli_hosts,
        cli.output.clone(),
        cli.exit_code,
        cli.timeout,
        cli.ca_file.clone(),
        if cli.prometheus { Some(true) } else { None },
        cli.prometheus_address.clone(),
    ))
}

fn print_text(inspection: &Inspection) {
    println!("--------------------------------------");
    println!("Hostname: {}", inspection.host);
    match &inspection.certificate {
        CertificateReport::Valid {
            subject,
            issuer,
            valid_from,
            valid_to,
            days_remaining,
            tls_version,
            serial_number,
        } => {
            println!("Certificate: valid");
            println!("Subject:");
            for (name, value) in subject.iter() {
                println!("\t{}: {}", name, value);
            }
            println!("Issuer:");
            for (name, value) in issuer.iter() {
                println!("\t{}: {}", name, value);
            }
            println!("Valid from: {}", valid_from);
            println!("Valid to: {}", valid_to);
            println!("Days remaining: {}", days_remaining);
            println!("Protocol: {}", tls_version);
            println!("Serial number: {}", serial_number);
        }
        CertificateReport::Invalid { reason } => {
            println!("Certificate: invalid");
            println!("Reason: {}", reason);
        }
        CertificateReport::Unreachable { reason } => {
            println!("Certificate: unreachable");
            println!("Reason: {}", reason);
        }
    }
    match &inspection.headers {
        HeaderReport::Headers {
            hsts,
            frame_options,
            content_type_options,
            status_code,
        } => {
            println!(
                "HTTP status: {}",
                status_code
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            );
            println!("Strict-Transport-Security: {}", header_or_not_set(hsts));
            println!("X-Frame-Options: {}", header_or_not_set(frame_options));
            println!(
                "X-Content-Type-Options: {}",
                header_or_not_set(content_type_options)
            );
        }
        HeaderReport::Error { error } => {
            println!("Header probe failed: {}", error);
        }
    }
}

fn header_or_not_set(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("not set")
}

fn print_summary(results: &[Inspection]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Host",
        "Status",
        "Expires",
        "Days left",
        "Protocol",
        "HSTS",
        "HTTP",
    ]);

    for inspection in results {
        let (status_cell, expires, days, protocol) = match &inspection.certificate {
            CertificateReport::Valid {
                valid_to,
                days_remaining,
                tls_version,
                ..
            } => {
                let color = if *days_remaining < 0 {
                    Color::Red
                } else if *days_remaining <= 30 {
                    Color::Yellow
                } else {
                    Color::Green
                };
                (
                    Cell::new("valid").fg(color),
                    valid_to.clone(),
                    days_remaining.to_string(),
                    tls_version.clone(),
                )
            }
            CertificateReport::Invalid { .. } => (
                Cell::new("invalid").fg(Color::Red),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
            ),
            CertificateReport::Unreachable { .. } => (
                Cell::new("unreachable").fg(Color::DarkGrey),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
            ),
        };

        let hsts = match &inspection.headers {
            HeaderReport::Headers { hsts: Some(_), .. } => "yes",
            HeaderReport::Headers { hsts: None, .. } => "no",
            HeaderReport::Error { .. } => "?",
        };
        let http_status = match &inspection.headers {
            HeaderReport::Headers {
                status_code: Some(code),
                ..
            } => code.to_string(),
            _ => "-".to_string(),
        };

        table.add_row(vec![
            Cell::new(&inspection.host),
            status_cell,
            Cell::new(expires),
            Cell::new(days),
            Cell::new(protocol),
            Cell::new(hsts),
            Cell::new(http_status),
        ]);
    }

    println!("{table}");

    for inspection in results {
        if let Some(reason) = inspection.certificate.failure_reason() {
            println!("{}: {}", inspection.host, reason);
        }
    }
}
