//! niche-finder - keyword-driven niche discovery on the seller portal
//!
//! Searches the opportunity explorer and keeps niches that meet your thresholds.

use anyhow::Result;
use clap::{Parser, Subcommand};
use niche_finder::commands::template::{self, TEMPLATE_FILE_NAME};
use niche_finder::commands::SearchCommand;
use niche_finder::config::{Config, OutputFormat};
use niche_finder::filters::parse_threshold;
use niche_finder::seller::Marketplace;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "niche-finder",
    version,
    about = "Keyword-driven niche discovery on the seller portal",
    long_about = "Searches the seller portal opportunity explorer for each keyword and keeps \
                  the niches that meet your demand, price and competition thresholds."
)]
struct Cli {
    /// Marketplace to search (country code, name or marketplace id)
    #[arg(short, long, global = true, env = "NICHE_COUNTRY")]
    marketplace: Option<Marketplace>,

    /// Anti-CSRF token of the portal session
    #[arg(long, global = true, env = "NICHE_CSRF", hide_env_values = true)]
    csrf: Option<String>,

    /// Session cookie of the portal
    #[arg(long, global = true, env = "NICHE_COOKIE", hide_env_values = true)]
    cookie: Option<String>,

    /// Relay URL; requests go straight to the portal when unset
    #[arg(long, global = true, env = "NICHE_RELAY")]
    relay: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "NICHE_PROXY")]
    proxy: Option<String>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search niches for one or more keywords
    #[command(alias = "s")]
    Search {
        /// Keywords to analyze
        keywords: Vec<String>,

        /// Read keywords from a CSV (column "keyword") or text file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Export results to a file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum 360-day search volume
        #[arg(long, value_parser = parse_threshold)]
        min_search_volume: Option<f64>,

        /// Minimum 180-day search growth, as a ratio (0.1 = 10%)
        #[arg(long, value_parser = parse_threshold)]
        min_growth: Option<f64>,

        /// Minimum units sold
        #[arg(long, value_parser = parse_threshold)]
        min_units_sold: Option<f64>,

        /// Minimum average price
        #[arg(long, value_parser = parse_threshold)]
        min_price: Option<f64>,

        /// Maximum average review count
        #[arg(long, value_parser = parse_threshold)]
        max_reviews: Option<f64>,
    },

    /// List supported marketplaces
    Marketplaces,

    /// Write a keyword template file
    Template {
        /// Destination file
        #[arg(default_value = TEMPLATE_FILE_NAME)]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(marketplace) = cli.marketplace {
        config.marketplace = marketplace;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(csrf) = cli.csrf {
        config.csrf_token = Some(csrf);
    }
    if let Some(cookie) = cli.cookie {
        config.cookie = Some(cookie);
    }
    if let Some(relay) = cli.relay {
        config.relay_url = Some(relay);
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Search {
            mut keywords,
            file,
            output,
            min_search_volume,
            min_growth,
            min_units_sold,
            min_price,
            max_reviews,
        } => {
            // Apply search-specific config
            let thresholds = &mut config.thresholds;
            if let Some(v) = min_search_volume {
                thresholds.min_search_volume = v;
            }
            if let Some(v) = min_growth {
                thresholds.min_growth_ratio = v;
            }
            if let Some(v) = min_units_sold {
                thresholds.min_units_sold = v;
            }
            if let Some(v) = min_price {
                thresholds.min_price = v;
            }
            if let Some(v) = max_reviews {
                thresholds.max_reviews = v;
            }

            if let Some(path) = file {
                let loaded = template::load_keyword_file(&path)?;
                eprintln!("Loaded {} keywords from \"{}\".", loaded.len(), path.display());
                keywords.extend(loaded);
            }

            let mut cmd = SearchCommand::new(config);
            if let Some(path) = output {
                cmd = cmd.with_output(path);
            }
            let output = cmd.execute(&keywords).await?;
            println!("{}", output);
        }

        Commands::Marketplaces => {
            println!("Supported marketplaces:\n");
            println!("{:<6} {:<22} {:<16} {}", "Code", "Name", "Marketplace ID", "Portal");
            println!("{:-<6} {:-<22} {:-<16} {:-<32}", "", "", "", "");

            for marketplace in Marketplace::all() {
                println!(
                    "{:<6} {:<22} {:<16} {}",
                    marketplace.code(),
                    marketplace.name(),
                    marketplace.obfuscated_id(),
                    marketplace.portal_url()
                );
            }
        }

        Commands::Template { path } => {
            template::write_template(&path)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
