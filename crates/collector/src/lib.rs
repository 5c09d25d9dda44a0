//! Collector adapters for pagetrack.
//!
//! - [`HttpCollector`] delivers event payloads to `{endpoint}/track`
//! - [`HttpLogSink`] mirrors diagnostic messages to `{endpoint}/js-log`

pub mod http;
pub mod log_sink;

pub use http::HttpCollector;
pub use log_sink::HttpLogSink;
