//! Proxy module for checking proxies against sites
//!
//! This module provides functionality for:
//! - Modelling proxies and the sites they are checked against
//! - Parsing proxy and site lists from text files
//! - Probing a site through a proxy
//! - Checking many proxies against many sites concurrently
//! - Writing working proxies to per-site result files

pub mod checker;
pub mod models;
pub mod parser;
pub mod probe;
pub mod sink;
pub mod site;

pub use checker::{CheckSummary, CheckerConfig, ProxyChecker};
pub use models::Proxy;
pub use parser::{ProxyParser, SiteParser};
pub use probe::{ProbeOutcome, ProbeRequest, Prober, ReqwestTransport, Transport};
pub use sink::{print_working_proxies, write_working_proxies, FileSink, ResultSink};
pub use site::{Site, SiteReport};
