//! Proxy checker: runs every proxy against every site

use crate::proxy::models::Proxy;
use crate::proxy::probe::{Prober, ReqwestTransport, Transport};
use crate::proxy::sink::ResultSink;
use crate::proxy::site::Site;
use crate::Result;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

/// Default user agent for probe requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Maximum number of proxies probed at once, `None` for all of them
    pub max_concurrency: Option<usize>,
    /// User agent sent with every probe
    pub user_agent: Option<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrency(mut self, max_concurrency: Option<usize>) -> Self {
        self.max_concurrency = max_concurrency.filter(|n| *n > 0);
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Totals for one checker run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub proxies: usize,
    pub sites: usize,
    pub probes: usize,
    pub successes: usize,
    /// Proxies that reached every site, in completion order
    pub universal: Vec<Proxy>,
}

/// What one proxy's walk over the sites produced
#[derive(Debug)]
struct ProxyRun {
    proxy: Proxy,
    probes: usize,
    successes: usize,
    universal: bool,
    error: Option<anyhow::Error>,
}

/// Proxy checker validating proxies against sites
///
/// One unit of work per proxy; each unit probes its sites in order while all
/// units run concurrently. The call returns once every unit has finished.
pub struct ProxyChecker<T: Transport = ReqwestTransport> {
    config: CheckerConfig,
    prober: Prober<T>,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        let transport = ReqwestTransport::new().with_user_agent(config.user_agent.clone());
        Self::with_transport(config, transport)
    }
}

impl Default for ProxyChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> ProxyChecker<T> {
    /// Create a proxy checker over a custom network transport
    pub fn with_transport(config: CheckerConfig, transport: T) -> Self {
        Self {
            config,
            prober: Prober::new(transport),
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn prober(&self) -> &Prober<T> {
        &self.prober
    }

    /// Check every proxy against every site, recording successes on the sites
    pub async fn validate(&self, sites: &[Site], proxies: &[Proxy]) -> CheckSummary {
        let (summary, _) = self.run(sites, proxies, None).await;
        summary
    }

    /// Like [`validate`](Self::validate), also writing every success to `sink`
    ///
    /// A proxy that reached all sites is additionally written once as a
    /// universal success; with no sites at all, every proxy counts as one.
    /// Sink errors don't stop other checks; the first one is returned after
    /// the whole run has finished.
    pub async fn validate_and_persist(
        &self,
        sites: &[Site],
        proxies: &[Proxy],
        sink: &dyn ResultSink,
    ) -> Result<CheckSummary> {
        match self.run(sites, proxies, Some(sink)).await {
            (summary, None) => Ok(summary),
            (_, Some(e)) => Err(e),
        }
    }

    async fn run(
        &self,
        sites: &[Site],
        proxies: &[Proxy],
        sink: Option<&dyn ResultSink>,
    ) -> (CheckSummary, Option<anyhow::Error>) {
        let mut summary = CheckSummary {
            proxies: proxies.len(),
            sites: sites.len(),
            ..Default::default()
        };
        if proxies.is_empty() {
            warn!(sites = sites.len(), "No proxies to check");
            return (summary, None);
        }
        if sites.is_empty() {
            // Every proxy trivially works on all of zero sites
            warn!(proxies = proxies.len(), "No sites to check proxies against");
        }

        info!(
            proxies = proxies.len(),
            sites = sites.len(),
            "Checking proxies..."
        );

        let concurrency = self.config.max_concurrency.unwrap_or(proxies.len());
        let runs: Vec<ProxyRun> = stream::iter(proxies)
            .map(|proxy| self.check_proxy(sites, proxy, sink))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut first_error = None;
        for run in runs {
            summary.probes += run.probes;
            summary.successes += run.successes;
            if run.universal {
                summary.universal.push(run.proxy);
            }
            if first_error.is_none() {
                first_error = run.error;
            }
        }

        info!(
            probes = summary.probes,
            successes = summary.successes,
            universal = summary.universal.len(),
            "Proxy checking complete."
        );

        (summary, first_error)
    }

    /// Walk all sites with one proxy
    async fn check_proxy(
        &self,
        sites: &[Site],
        proxy: &Proxy,
        sink: Option<&dyn ResultSink>,
    ) -> ProxyRun {
        let mut run = ProxyRun {
            proxy: proxy.clone(),
            probes: 0,
            successes: 0,
            universal: true,
            error: None,
        };

        for site in sites {
            let outcome = self.prober.probe(site, proxy).await;
            run.probes += 1;

            if !outcome.is_working() {
                run.universal = false;
                continue;
            }

            run.successes += 1;
            site.add_working_proxy(proxy.clone());

            if let Some(sink) = sink {
                if let Err(e) = sink.persist_success(site, proxy).await {
                    warn!(site = site.url(), %proxy, error = %e, "Failed to persist working proxy");
                    run.error.get_or_insert(e);
                }
            }
        }

        if run.universal {
            if let Some(sink) = sink {
                if let Err(e) = sink.persist_universal_success(proxy).await {
                    warn!(%proxy, error = %e, "Failed to persist universal proxy");
                    run.error.get_or_insert(e);
                }
            }
        }

        run
    }
}
