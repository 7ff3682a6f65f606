//! Proxy data models

use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use url::Url;

/// Proxy model representing a single forward proxy endpoint
///
/// Construction never fails: an ip that is not an IPv4/IPv6 literal, or a
/// port outside 1..=65535, is stored as `None` and the proxy is treated as
/// unusable by the checker. There is no way around that validation, so a
/// proxy can't be deserialized:
///
/// ```compile_fail
/// use site_proxy_checker::Proxy;
///
/// let proxy: Proxy = serde_json::from_str(r#"{"ip":"not-an-ip","port":8080}"#).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Proxy {
    ip: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
}

impl Proxy {
    /// Create a new proxy without authentication
    pub fn new(ip: &str, port: i64) -> Self {
        Self::with_auth(ip, port, None, None)
    }

    /// Create a new proxy with (possibly partial) authentication
    pub fn with_auth(
        ip: &str,
        port: i64,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self::from_raw(ip, Some(port), username, password)
    }

    /// Build a proxy from fields whose port may not even be a number
    pub(crate) fn from_raw(
        ip: &str,
        port: Option<i64>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            ip: ip.parse::<IpAddr>().ok().map(|_| ip.to_string()),
            port: port.and_then(|p| u16::try_from(p).ok()).filter(|p| *p > 0),
            username: username.filter(|u| !u.is_empty()),
            password: password.filter(|p| !p.is_empty()),
        }
    }

    /// Get the IP address, `None` if it was not a valid literal
    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    /// Get the port, `None` if it was outside 1..=65535
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Get the username, if any
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Get the password, if any
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Whether both the address and the port are valid
    pub fn is_usable(&self) -> bool {
        self.ip.is_some() && self.port.is_some()
    }

    /// Host part suitable for URLs and records (IPv6 gets brackets)
    fn host(&self) -> Option<String> {
        let ip = self.ip.as_deref()?;
        match ip.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => Some(format!("[{}]", ip)),
            _ => Some(ip.to_string()),
        }
    }

    /// Get the forward proxy URL, `http://[user:pass@]ip:port`
    ///
    /// Credentials are only included when both are present. Returns `None`
    /// for unusable proxies.
    pub fn url(&self) -> Option<String> {
        let host = self.host()?;
        let port = self.port?;
        let mut url = Url::parse(&format!("http://{}:{}", host, port)).ok()?;

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            url.set_username(username).ok()?;
            url.set_password(Some(password)).ok()?;
        }

        // Url keeps a trailing "/" path that proxy URLs don't need
        Some(url.as_str().trim_end_matches('/').to_string())
    }

    /// Get the proxy in the persisted line format
    ///
    /// `ip:port` without credentials, otherwise `ip:port:username:password`
    /// with an empty field for whichever part is missing.
    pub fn to_record(&self) -> String {
        let host = self.host().unwrap_or_default();
        let port = self.port.map(|p| p.to_string()).unwrap_or_default();

        if self.username.is_none() && self.password.is_none() {
            return format!("{}:{}", host, port);
        }

        format!(
            "{}:{}:{}:{}",
            host,
            port,
            self.username.as_deref().unwrap_or(""),
            self.password.as_deref().unwrap_or("")
        )
    }
}

struct NullOr<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for NullOr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => value.fmt(f),
            None => f.write_str("null"),
        }
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Proxy {{ ip: {}, port: {}, username: {}, password: {} }}",
            NullOr(self.ip()),
            NullOr(self.port),
            NullOr(self.username()),
            NullOr(self.password())
        )
    }
}
