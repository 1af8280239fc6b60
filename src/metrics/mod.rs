//! Metrics export.
//!
//! Pushes per-host inspection gauges to a Prometheus Push Gateway when
//! enabled in the configuration.

pub mod prom;
