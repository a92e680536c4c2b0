// # ddns - one-shot DNS address synchronizer
//
// The ddns binary is a thin integration layer. It is responsible for:
// 1. Parsing flags, environment variables and the optional JSON config file
// 2. Initializing logging and the runtime
// 3. Building the IP source, DNS provider and change cache
// 4. Running the DDNS engine once
//
// All change detection and reconciliation logic lives in ddns-core.
// Scheduling is external (cron, systemd timer).
//
// ## Configuration
//
// Every flag can also be set through its `DDNS_*` environment variable.
// When `--config` names a JSON file, keys present in the file override the
// flag values and the file's modification time is part of the cached state.
//
// ## Example
//
// ```bash
// export DDNS_TOKEN=your_token
// ddns --ipv4 "home.example.com vpn.example.com" --ipv6 home.example.com
//
// ddns --config /etc/ddns/config.json
// ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use ddns_core::config::DEFAULT_CACHE_PATH;
use ddns_core::{
    CacheStore, ChangeCache, DdnsConfig, DdnsEngine, FileConfig, IpSource, IpSourceKind,
    RunOutcome,
};
use ddns_ip_http::HttpIpSource;
use ddns_ip_local::LocalIpSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Run completed (including "nothing to do")
/// - 1: Configuration or startup error
/// - 2: Runtime error (address resolution, cache I/O)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Run completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep DNS records in sync with this host's address
#[derive(Parser, Debug)]
#[command(name = "ddns", version, about)]
struct Cli {
    /// JSON config file, its keys override the flags below
    #[arg(long, env = "DDNS_CONFIG")]
    config: Option<PathBuf>,

    /// Provider API token (required without --config)
    #[arg(long, env = "DDNS_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Space separated domains that get an A record
    #[arg(long, env = "DDNS_IPV4", default_value = "")]
    ipv4: String,

    /// Space separated domains that get an AAAA record
    #[arg(long, env = "DDNS_IPV6", default_value = "")]
    ipv6: String,

    /// "lan" for the local interface address, anything else for the public one
    #[arg(long, env = "DDNS_IP_SOURCE", default_value = "wan")]
    ip_source: String,

    /// Proxy for public address lookups (http://, socks5://)
    #[arg(long, env = "DDNS_PROXY")]
    proxy: Option<String>,

    /// Record TTL in seconds, 0 for automatic
    #[arg(long, env = "DDNS_TTL", default_value_t = 0)]
    ttl: u32,

    /// Proxy record traffic through the provider's edge
    #[arg(long, env = "DDNS_PROXIED")]
    proxied: bool,

    /// Reconcile even when the cached addresses are unchanged
    #[arg(long, env = "DDNS_NO_CACHE")]
    no_cache: bool,

    /// Change cache location
    #[arg(long, env = "DDNS_CACHE_PATH", default_value = DEFAULT_CACHE_PATH)]
    cache_path: PathBuf,

    /// Log level
    #[arg(
        long,
        env = "DDNS_LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        ignore_case = true
    )]
    log_level: String,
}

impl Cli {
    /// Assemble the run configuration and the config file's modification time
    fn build_config(&self) -> Result<(DdnsConfig, Option<DateTime<Utc>>)> {
        if self.config.is_none() && self.token.is_empty() {
            return Err(ddns_core::Error::config("Config file or API token are required.").into());
        }

        let mut config = DdnsConfig::new(self.token.clone())
            .with_ipv4_domains(split_domains(&self.ipv4))
            .with_ipv6_domains(split_domains(&self.ipv6))
            .with_cache(!self.no_cache);
        config.ip_source = IpSourceKind::from(self.ip_source.as_str());
        config.proxy = self.proxy.clone().filter(|p| !p.is_empty());
        config.ttl = self.ttl;
        config.proxied = self.proxied;
        config.cache_path = self.cache_path.clone();

        let mut mod_time = None;
        if let Some(path) = &self.config {
            let (file, modified) = FileConfig::load(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            config.apply_file(file);
            mod_time = Some(modified);
        }

        Ok((config, mod_time))
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Split a space separated domain list, ignoring repeated whitespace
fn split_domains(list: &str) -> Vec<String> {
    list.split_whitespace().map(str::to_string).collect()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let (config, mod_time) = match cli.build_config() {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!(
        "Configuration loaded: {} IPv4 domain(s), {} IPv6 domain(s)",
        config.domains.ipv4.len(),
        config.domains.ipv6.len()
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let engine = match build_engine(config, mod_time) {
        Ok(engine) => engine,
        Err(e) => {
            error!("{}", e);
            return exit_code_for(&e).into();
        }
    };

    let code = rt.block_on(async {
        match engine.run_once().await {
            Ok(outcome) => {
                report(&outcome);
                DdnsExitCode::Success
            }
            Err(e) => {
                error!("{}", e);
                exit_code_for(&e)
            }
        }
    });

    code.into()
}

/// Wire the configured strategy, provider and cache into an engine
fn build_engine(
    config: DdnsConfig,
    mod_time: Option<DateTime<Utc>>,
) -> ddns_core::Result<DdnsEngine> {
    let ip_source: Box<dyn IpSource> = match config.ip_source {
        IpSourceKind::Lan => Box::new(LocalIpSource::new()),
        IpSourceKind::Wan => Box::new(HttpIpSource::new(config.proxy.as_deref())?),
    };

    let provider = Box::new(CloudflareProvider::new(config.token.clone())?);

    let cache: Option<Box<dyn CacheStore>> = if config.cache {
        Some(Box::new(ChangeCache::new(&config.cache_path)))
    } else {
        None
    };

    Ok(DdnsEngine::new(ip_source, provider, cache, config, mod_time))
}

fn exit_code_for(error: &ddns_core::Error) -> DdnsExitCode {
    match error {
        ddns_core::Error::Config(_) => DdnsExitCode::ConfigError,
        _ => DdnsExitCode::RuntimeError,
    }
}

/// Line printed when the cache shows no change
const NOTHING_TO_DO: &str = "Nothing to do :)";

/// Console line for outcomes that are reported regardless of log level
fn console_line(outcome: &RunOutcome) -> Option<&'static str> {
    match outcome {
        RunOutcome::NothingToDo => Some(NOTHING_TO_DO),
        RunOutcome::Reconciled(_) => None,
    }
}

fn report(outcome: &RunOutcome) {
    if let Some(line) = console_line(outcome) {
        println!("{}", line);
    }

    if let RunOutcome::Reconciled(reports) = outcome {
        let failures = outcome.failures();
        if failures > 0 {
            warn!(
                "{} of {} domain(s) could not be updated",
                failures,
                reports.len()
            );
        } else {
            info!("{} domain(s) up to date", reports.len());
        }
    }
}
