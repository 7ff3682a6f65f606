use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use site_proxy_checker::{
    logging::init_logging,
    proxy::{
        print_working_proxies, sink::DEFAULT_OUTPUT_DIR, CheckSummary, CheckerConfig, FileSink,
        ProxyChecker, ProxyParser, SiteParser, SiteReport,
    },
};
use std::path::PathBuf;

/// Checks which proxies can reach which sites
#[derive(Parser)]
#[command(name = "site-proxy-checker")]
#[command(about = "Checks which proxies can reach which sites")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log every failed probe
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxies against sites and save the working ones
    Check {
        /// File with one proxy per line (ip:port or ip:port:user:pass)
        #[arg(short, long)]
        proxies: PathBuf,
        /// File with one site per line (url or "url timeout_ms")
        #[arg(short, long)]
        sites: PathBuf,
        /// Directory for result files, recreated on every run
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
        /// Only print results, don't write any files
        #[arg(long)]
        no_save: bool,
        /// Maximum number of proxies checked at once (0 for no limit)
        #[arg(short = 'n', long, default_value = "50")]
        concurrency: usize,
        /// Print results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Parse a proxy list and print it in normalized form
    Parse {
        /// Input file containing proxies
        input: PathBuf,
        /// Output file for parsed proxies
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct JsonReport {
    summary: CheckSummary,
    sites: Vec<SiteReport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Check {
            proxies,
            sites,
            output,
            no_save,
            concurrency,
            json,
        } => {
            let proxies = ProxyParser::parse_file(&proxies)?;
            let sites = SiteParser::parse_file(&sites)?;

            let config = CheckerConfig::new().with_max_concurrency(Some(concurrency));
            let checker = ProxyChecker::with_config(config);

            let summary = if no_save {
                checker.validate(&sites, &proxies).await
            } else {
                let sink = FileSink::create(&output, &sites).await?;
                let summary = checker.validate_and_persist(&sites, &proxies, &sink).await?;
                eprintln!("Saved results to {:?}", sink.dir());
                summary
            };

            if json {
                let report = JsonReport {
                    summary,
                    sites: sites.iter().map(|s| s.report()).collect(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            for site in &sites {
                println!(
                    "{} ({}): {} working",
                    site.url(),
                    site.name(),
                    site.working_proxies().len()
                );
                print_working_proxies(site)?;
            }

            println!(
                "\nResults: {} probes, {} successes, {} proxies working on all sites",
                summary.probes,
                summary.successes,
                summary.universal.len()
            );
            for proxy in &summary.universal {
                println!("  {}", proxy.to_record());
            }
        }
        Commands::Parse { input, output } => {
            let proxies = ProxyParser::parse_file(&input)?;
            let usable = proxies.iter().filter(|p| p.is_usable()).count();

            println!(
                "Parsed {} proxies from {:?} ({} usable)",
                proxies.len(),
                input,
                usable
            );

            if let Some(output_path) = output {
                ProxyParser::save_to_file(&proxies, &output_path)?;
                println!("Saved parsed proxies to {:?}", output_path);
            } else {
                for proxy in &proxies {
                    println!("{}", proxy.to_record());
                }
            }
        }
    }

    Ok(())
}
