//! Parsers for the proxy and site list files

use crate::error::SiteError;
use crate::proxy::models::Proxy;
use crate::proxy::site::Site;
use crate::Result;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::info;

/// `[v6-address]:rest`, the only way to write an IPv6 proxy in a colon list
static BRACKETED_HOST_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([^\]]*)\](?::(.*))?$").expect("Invalid bracketed host regex"));

/// Returns the trimmed line, or `None` for blank lines and comments
fn content_line(line: &str) -> Option<&str> {
    let line = line.trim();
    (!line.is_empty() && !line.starts_with('#')).then_some(line)
}

/// Parser for proxy lists
///
/// Lines are `ip:port` or `ip:port:username:password`; IPv6 addresses are
/// bracketed. Bad addresses or ports still produce a (unusable) proxy.
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single proxy line, `None` for blank and comment lines
    pub fn parse_line(line: &str) -> Option<Proxy> {
        let line = content_line(line)?;

        let (ip, rest) = match BRACKETED_HOST_REGEX.captures(line) {
            Some(caps) => (
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map_or("", |m| m.as_str()),
            ),
            None => line.split_once(':').unwrap_or((line, "")),
        };

        let mut fields = rest.split(':');
        let port = fields.next().and_then(|p| p.trim().parse::<i64>().ok());
        let username = fields.next().map(str::to_string);
        let password = fields.next().map(str::to_string);

        Some(Proxy::from_raw(ip, port, username, password))
    }

    /// Parse proxies from a string (multiple lines)
    pub fn parse_string(content: &str) -> Vec<Proxy> {
        content.lines().filter_map(Self::parse_line).collect()
    }

    /// Parse proxies from a file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Proxy>> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading proxies");

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read proxy list {}", path.display()))?;
        let proxies = Self::parse_string(&content);

        info!(count = proxies.len(), "Finished loading proxies");
        Ok(proxies)
    }

    /// Save proxies to a file in the persisted record format
    pub fn save_to_file<P: AsRef<Path>>(proxies: &[Proxy], path: P) -> Result<()> {
        let content: String = proxies.iter().map(|p| format!("{}\n", p.to_record())).collect();
        fs::write(path, content)?;
        Ok(())
    }
}

/// Parser for site lists
///
/// Lines are `url` or `url timeout_ms` separated by whitespace. Unlike
/// proxies, a bad site line is an error.
pub struct SiteParser;

impl SiteParser {
    /// Parse a single site line, `Ok(None)` for blank and comment lines
    pub fn parse_line(line: &str) -> std::result::Result<Option<Site>, SiteError> {
        let Some(line) = content_line(line) else {
            return Ok(None);
        };

        let mut fields = line.split_whitespace();
        let url = fields.next().unwrap_or_default();
        let timeout = match fields.next() {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| SiteError::InvalidTimeout(raw.to_string()))?,
            None => 0,
        };

        Site::new(url, timeout).map(Some)
    }

    /// Parse sites from a string; fails on the first bad line
    pub fn parse_string(content: &str) -> Result<Vec<Site>> {
        let mut sites = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if let Some(site) =
                Self::parse_line(line).with_context(|| format!("line {}", index + 1))?
            {
                sites.push(site);
            }
        }
        Ok(sites)
    }

    /// Parse sites from a file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Site>> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading sites");

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read site list {}", path.display()))?;
        let sites = Self::parse_string(&content)
            .with_context(|| format!("invalid site list {}", path.display()))?;

        info!(count = sites.len(), "Finished loading sites");
        Ok(sites)
    }
}
