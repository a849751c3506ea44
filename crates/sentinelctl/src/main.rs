//! Sentinel command-line tool
//!
//! Resolves and verifies the master of a sentinel-monitored cluster.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sentinelclient::config::DEFAULT_REDIS_TIMEOUT;
use sentinelclient::{
    query_role, ClusterConfig, Connector, MasterConnector, PoolConnector, RedisConnector,
    SentinelClient, Timeouts,
};
use sentinelconfig::{split_list, ConfigValue, SentinelConf};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sentinelctl")]
#[command(about = "Query sentinels for the current master", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(
        short = 'c',
        long,
        env = "SENTINEL_CONF",
        default_value = "/etc/redis/sentinel-client.conf"
    )]
    conf: String,

    /// Sentinel addresses (comma-separated, e.g., "10.0.0.1:26379,10.0.0.2:26379")
    /// If not specified, will be read from the config file
    #[arg(long, env = "SENTINEL_HOSTS")]
    sentinels: Option<String>,

    /// Name of the monitored master
    /// If not specified, will be read from the config file
    #[arg(short, long, env = "SENTINEL_MASTER")]
    master_name: Option<String>,

    /// Override every timeout (e.g., "200ms", "2s")
    #[arg(short, long, value_parser = parse_timeout)]
    timeout: Option<Duration>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current master address
    Master,
    /// Print the role a node reports
    Role {
        /// Node address (host:port)
        addr: String,
    },
    /// Resolve, connect and verify the master the way a pool would
    Dial,
}

fn parse_timeout(s: &str) -> std::result::Result<Duration, String> {
    sentinelconfig::Duration::parse_config_value(s)
        .map(|d| d.0)
        .map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let conf = if Path::new(&cli.conf).exists() {
        debug!("Loading configuration from: {}", cli.conf);
        SentinelConf::from_file(&cli.conf).context("Failed to parse config file")?
    } else {
        debug!("Configuration file not found: {}", cli.conf);
        SentinelConf::default()
    };

    match &cli.command {
        Commands::Master => {
            let config = cluster_config(&cli, &conf)?;
            let client = SentinelClient::new(config.sentinel_addrs, config.sentinel_timeouts)
                .context("Failed to create sentinel client")?;

            let addr = client
                .master_address(&config.master_name)
                .await
                .context("Failed to resolve master address")?;
            println!("{}", addr);

            let index = client.active_index().await;
            info!("Answered by sentinel {}", client.addrs()[index]);
            client.close().await;
        }
        Commands::Role { addr } => {
            let timeouts = cli
                .timeout
                .map(Timeouts::uniform)
                .unwrap_or(Timeouts::uniform(DEFAULT_REDIS_TIMEOUT));

            let mut conn = RedisConnector::new()
                .connect(addr, &timeouts)
                .await
                .with_context(|| format!("Failed to connect to {}", addr))?;
            let role = query_role(&mut conn)
                .await
                .context("Failed to query role")?;
            println!("{}", role);
        }
        Commands::Dial => {
            let config = cluster_config(&cli, &conf)?;
            let master_name = config.master_name.clone();
            let connector = MasterConnector::new(config).context("Invalid configuration")?;

            let conn = connector
                .dial()
                .await
                .with_context(|| format!("Failed to dial master {}", master_name))?;
            println!("{} master {} verified", master_name, conn.addr());

            connector.close().await;
        }
    }

    Ok(())
}

/// Build the cluster configuration (command line > config file > defaults)
fn cluster_config(cli: &Cli, conf: &SentinelConf) -> Result<ClusterConfig> {
    let master_name = match &cli.master_name {
        Some(name) => name.clone(),
        None => conf
            .master_name()
            .context("Master name not specified. Use --master-name or set 'master name'")?,
    };

    let sentinels = match &cli.sentinels {
        Some(hosts) => split_list(hosts),
        None => conf
            .sentinel_addrs()
            .context("Sentinels not specified. Use --sentinels or set 'sentinels'")?,
    };

    let mut config = ClusterConfig::new(master_name, sentinels);
    config
        .apply_conf(conf)
        .context("Invalid option in config file")?;

    if let Some(timeout) = cli.timeout {
        config.sentinel_timeouts = Timeouts::uniform(timeout);
        config.redis_timeouts = Timeouts::uniform(timeout);
    }

    config.validate().context("Invalid configuration")?;
    info!(
        "Looking up {} via sentinels {:?}",
        config.master_name, config.sentinel_addrs
    );

    Ok(config)
}
