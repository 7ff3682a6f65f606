//! Result sinks for working proxies
//!
//! The checker only talks to [`ResultSink`]; [`FileSink`] is the
//! directory-of-text-files implementation used by the CLI.

use crate::proxy::models::Proxy;
use crate::proxy::site::Site;
use crate::Result;
use anyhow::Context;
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// Default output directory for [`FileSink`]
pub const DEFAULT_OUTPUT_DIR: &str = "working_proxies";

/// File collecting proxies that worked against every site
pub const ALL_SITES_FILE: &str = "all_sites.txt";

/// Destination for successful probes
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Record that `proxy` reached `site`
    async fn persist_success(&self, site: &Site, proxy: &Proxy) -> Result<()>;

    /// Record that `proxy` reached every site of the run
    async fn persist_universal_success(&self, proxy: &Proxy) -> Result<()>;
}

/// Writes one `<site name>.txt` per site plus `all_sites.txt`
pub struct FileSink {
    dir: PathBuf,
    // Appends from concurrent proxy checks go through here one at a time
    write_lock: Mutex<()>,
}

impl FileSink {
    /// Recreate `dir` from scratch with an empty file for every site
    pub async fn create<P: AsRef<Path>>(dir: P, sites: &[Site]) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        info!(dir = %dir.display(), "Creating output directory");

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("failed to clear {}", dir.display()));
            }
        }
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let sink = Self {
            dir,
            write_lock: Mutex::new(()),
        };

        fs::write(sink.all_sites_path(), "").await?;
        for site in sites {
            fs::write(sink.site_path(site), "").await?;
        }

        Ok(sink)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn site_path(&self, site: &Site) -> PathBuf {
        self.dir.join(format!("{}.txt", site.name()))
    }

    pub fn all_sites_path(&self) -> PathBuf {
        self.dir.join(ALL_SITES_FILE)
    }

    async fn append(&self, path: &Path, proxy: &Proxy) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;
        file.write_all(format!("{}\n", proxy.to_record()).as_bytes())
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        file.flush().await?;

        Ok(())
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn persist_success(&self, site: &Site, proxy: &Proxy) -> Result<()> {
        self.append(&self.site_path(site), proxy).await
    }

    async fn persist_universal_success(&self, proxy: &Proxy) -> Result<()> {
        self.append(&self.all_sites_path(), proxy).await
    }
}

/// Write one line per working proxy of `site`
pub fn write_working_proxies<W: Write>(site: &Site, out: &mut W) -> io::Result<()> {
    for proxy in site.working_proxies() {
        writeln!(out, "{}", proxy)?;
    }
    Ok(())
}

/// Print the working proxies of `site` to stdout
pub fn print_working_proxies(site: &Site) -> io::Result<()> {
    write_working_proxies(site, &mut io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::parser::ProxyParser;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("site-proxy-checker-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_create_resets_directory() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.txt"), "old").unwrap();

        let sites = vec![
            Site::new("https://www.example.com", 0).unwrap(),
            Site::new("http://github.com", 0).unwrap(),
        ];
        let sink = FileSink::create(&dir, &sites).await.unwrap();

        assert!(!dir.join("stale.txt").exists());
        assert_eq!(std::fs::read_to_string(sink.all_sites_path()).unwrap(), "");
        assert_eq!(std::fs::read_to_string(dir.join("example.txt")).unwrap(), "");
        assert_eq!(std::fs::read_to_string(dir.join("github.txt")).unwrap(), "");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_appends_records() {
        let dir = temp_dir();
        let site = Site::new("https://example.com", 0).unwrap();
        let sink = FileSink::create(&dir, std::slice::from_ref(&site)).await.unwrap();

        sink.persist_success(&site, &Proxy::new("10.0.0.1", 8080)).await.unwrap();
        sink.persist_success(
            &site,
            &Proxy::with_auth("10.0.0.2", 8080, None, Some("pass".to_string())),
        )
        .await
        .unwrap();
        sink.persist_universal_success(&Proxy::new("10.0.0.1", 8080))
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(sink.site_path(&site)).unwrap(),
            "10.0.0.1:8080\n10.0.0.2:8080::pass\n"
        );
        assert_eq!(
            std::fs::read_to_string(sink.all_sites_path()).unwrap(),
            "10.0.0.1:8080\n"
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_username_only_round_trip() {
        let dir = temp_dir();
        let site = Site::new("https://example.com", 0).unwrap();
        let sink = FileSink::create(&dir, std::slice::from_ref(&site)).await.unwrap();
        let proxy = Proxy::with_auth("10.0.0.1", 8080, Some("user".to_string()), None);

        sink.persist_success(&site, &proxy).await.unwrap();
        let content = std::fs::read_to_string(sink.site_path(&site)).unwrap();
        assert_eq!(content, "10.0.0.1:8080:user:\n");

        let parsed = ProxyParser::parse_string(&content);
        assert_eq!(parsed, vec![proxy]);
        assert_eq!(parsed[0].username(), Some("user"));
        assert_eq!(parsed[0].password(), None);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_working_proxies() {
        let site = Site::new("https://example.com", 0).unwrap();
        site.add_working_proxy(Proxy::new("10.0.0.1", 8080));
        site.add_working_proxy(Proxy::with_auth(
            "10.0.0.2",
            3128,
            Some("u".to_string()),
            Some("p".to_string()),
        ));

        let mut out = Vec::new();
        write_working_proxies(&site, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Proxy { ip: 10.0.0.1, port: 8080, username: null, password: null }\n\
             Proxy { ip: 10.0.0.2, port: 3128, username: u, password: p }\n"
        );
    }
}
