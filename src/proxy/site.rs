//! Probe target model

use crate::error::SiteError;
use crate::proxy::models::Proxy;
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use url::{Host, Url};

/// A site that proxies are checked against
///
/// The working-proxy list is appended to by every proxy task that reaches
/// the site, so it lives behind a mutex. Everything else is fixed at
/// construction.
#[derive(Debug)]
pub struct Site {
    url: String,
    https: bool,
    timeout_ms: u64,
    name: String,
    working_proxies: Mutex<Vec<Proxy>>,
}

impl Site {
    /// Create a new site
    ///
    /// `timeout_ms` of 0 means the probe is not time bounded.
    pub fn new(url: &str, timeout_ms: i64) -> Result<Self, SiteError> {
        let parsed = Url::parse(url).map_err(|_| SiteError::InvalidUrl(url.to_string()))?;
        let name = derive_name(&parsed).ok_or_else(|| SiteError::InvalidUrl(url.to_string()))?;
        let timeout_ms =
            u64::try_from(timeout_ms).map_err(|_| SiteError::InvalidTimeout(timeout_ms.to_string()))?;

        Ok(Self {
            url: url.to_string(),
            https: parsed.scheme() == "https",
            timeout_ms,
            name,
            working_proxies: Mutex::new(Vec::new()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Timeout in milliseconds, 0 for none
    pub fn timeout(&self) -> u64 {
        self.timeout_ms
    }

    /// Timeout as a duration, `None` when unbounded
    pub fn timeout_duration(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Short name derived from the hostname, used for result files
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether probes against this site must tunnel through the proxy
    ///
    /// Decided from the parsed URL, so stray whitespace around the input
    /// can't hide the scheme.
    pub fn is_https(&self) -> bool {
        self.https
    }

    /// Append a proxy that reached this site
    ///
    /// Only [`Proxy`] values are accepted:
    ///
    /// ```compile_fail
    /// use site_proxy_checker::Site;
    ///
    /// let site = Site::new("https://example.com", 0).unwrap();
    /// site.add_working_proxy("10.0.0.1:8080");
    /// ```
    pub fn add_working_proxy(&self, proxy: Proxy) {
        self.lock().push(proxy);
    }

    /// Snapshot of the working proxies in the order they were added
    pub fn working_proxies(&self) -> Vec<Proxy> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Proxy>> {
        // A panic while pushing cannot leave the Vec half-written
        self.working_proxies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Serializable view of the site and its current results
    pub fn report(&self) -> SiteReport {
        SiteReport {
            url: self.url.clone(),
            name: self.name.clone(),
            timeout_ms: self.timeout_ms,
            working_proxies: self.working_proxies(),
        }
    }
}

/// Derive the site name from the host: its second-to-last dot-separated
/// label without a leading `www.`. Hosts with a single label (including
/// IPv6 literals) use the whole host.
fn derive_name(url: &Url) -> Option<String> {
    let host = match url.host()? {
        Host::Domain(domain) => domain.to_string(),
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => return Some(addr.to_string().replace(':', "_")),
    };

    let labels: Vec<&str> = host.split('.').collect();
    let label = match labels.len() {
        0 | 1 => host.as_str(),
        n => labels[n - 2],
    };
    let name = label.strip_prefix("www.").unwrap_or(label);

    (!name.is_empty()).then(|| name.to_string())
}

impl Clone for Site {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            https: self.https,
            timeout_ms: self.timeout_ms,
            name: self.name.clone(),
            working_proxies: Mutex::new(self.working_proxies()),
        }
    }
}

impl PartialEq for Site {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
            && self.timeout_ms == other.timeout_ms
            && self.working_proxies() == other.working_proxies()
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Site {{ url: {}, timeout: {}, name: {}, workingProxies: {} }}",
            self.url,
            self.timeout_ms,
            self.name,
            self.lock().len()
        )
    }
}

/// Site results as emitted by the JSON report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteReport {
    pub url: String,
    pub name: String,
    pub timeout_ms: u64,
    pub working_proxies: Vec<Proxy>,
}
