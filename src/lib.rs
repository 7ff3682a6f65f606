//! Site Proxy Checker
//!
//! Checks which proxies can reach which sites. Every proxy is probed against
//! every site concurrently, and the proxies that get an HTTP 200 back are
//! recorded per site and, optionally, written to result files.

pub mod error;
pub mod logging;
pub mod proxy;

pub use error::SiteError;
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
