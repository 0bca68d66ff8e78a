use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::RetryPolicy;
use crate::constants::{api, keep_alive};
use crate::router::{self, Route};
use crate::types::CarrierCode;

/// DakDash - Parcel Tracker
///
/// Terminal front end for the DakDash tracking backend.
/// Configuration priority: CLI args > Environment variables (.env included) > Defaults
#[derive(Parser, Debug)]
#[command(name = "dakdash")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Track Indian parcels from the terminal", long_about = None)]
pub struct CliArgs {
    /// Deep link to open, e.g. dakdash://track?number=RM123456789IN&carrier=india-post
    #[arg(value_name = "LINK")]
    pub link: Option<String>,

    /// Tracking number to look up on startup (overrides LINK)
    #[arg(short, long)]
    pub number: Option<String>,

    /// Tracking backend base URL
    #[arg(long, env = "DAKDASH_API_URL")]
    pub api_url: Option<String>,

    /// Default carrier code
    #[arg(short, long, env = "DAKDASH_CARRIER")]
    pub carrier: Option<String>,

    /// First-attempt request timeout in milliseconds (1000-300000)
    #[arg(long, env = "DAKDASH_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Timeout for retried attempts in milliseconds (must exceed --timeout-ms)
    #[arg(long, env = "DAKDASH_RETRY_TIMEOUT_MS")]
    pub retry_timeout_ms: Option<u64>,

    /// Retries after a timeout or network failure (0-3)
    #[arg(long, env = "DAKDASH_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Keep-alive ping interval in seconds (0 disables, otherwise 30-86400)
    #[arg(long, env = "DAKDASH_KEEP_ALIVE_SECS")]
    pub keep_alive_secs: Option<u64>,

    /// Path to SQLite database for recent searches and theme
    #[arg(long, env = "DAKDASH_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Target UI rendering FPS (1-120)
    #[arg(long, env = "DAKDASH_RENDER_FPS")]
    pub render_fps: Option<u32>,

    /// Log file (the terminal is owned by the UI)
    #[arg(long, env = "DAKDASH_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub default_carrier: CarrierCode,
    pub timeout_ms: u64,
    pub retry_timeout_ms: u64,
    pub max_retries: u32,
    pub keep_alive_secs: u64,
    pub db_path: PathBuf,
    pub render_fps: u32,
    pub log_file: PathBuf,
    /// Route to open on startup
    pub initial_route: Route,
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Validate URL format (basic check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

/// Load configuration from CLI args and environment variables
pub fn load() -> Result<Config> {
    Config::from_args(CliArgs::parse())
}

impl Config {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let api_url = args
            .api_url
            .unwrap_or_else(|| api::DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        validate_url(&api_url, "DAKDASH_API_URL")?;

        let default_carrier = match args.carrier {
            Some(c) if c.trim().is_empty() => {
                return Err(anyhow!("DAKDASH_CARRIER cannot be empty"));
            }
            Some(c) => CarrierCode::new(c.trim()),
            None => CarrierCode::default(),
        };

        let timeout_ms = validate_in_range(
            args.timeout_ms.unwrap_or(api::BASE_TIMEOUT_MS),
            1_000,
            300_000,
            "DAKDASH_TIMEOUT_MS",
        )?;
        let retry_timeout_ms = validate_in_range(
            args.retry_timeout_ms.unwrap_or(api::RETRY_TIMEOUT_MS),
            1_000,
            600_000,
            "DAKDASH_RETRY_TIMEOUT_MS",
        )?;
        if retry_timeout_ms <= timeout_ms {
            return Err(anyhow!(
                "DAKDASH_RETRY_TIMEOUT_MS ({retry_timeout_ms}) must be greater than DAKDASH_TIMEOUT_MS ({timeout_ms})"
            ));
        }
        let max_retries =
            validate_in_range(args.max_retries.unwrap_or(1), 0, 3, "DAKDASH_MAX_RETRIES")?;

        let keep_alive_secs = args.keep_alive_secs.unwrap_or(keep_alive::INTERVAL_SECS);
        if keep_alive_secs != 0 {
            validate_in_range(keep_alive_secs, 30, 86_400, "DAKDASH_KEEP_ALIVE_SECS")?;
        }

        let db_path = args.db_path.unwrap_or_else(|| PathBuf::from("./dakdash.db"));
        if db_path.as_os_str().is_empty() {
            return Err(anyhow!("DAKDASH_DB_PATH cannot be empty"));
        }

        let render_fps =
            validate_in_range(args.render_fps.unwrap_or(30), 1, 120, "DAKDASH_RENDER_FPS")?;

        let initial_route = match (args.number, args.link) {
            (Some(number), _) => Route::track(number.trim(), &default_carrier),
            (None, Some(link)) => {
                router::parse(&link).ok_or_else(|| anyhow!("Unrecognised link '{link}'"))?
            }
            (None, None) => Route::Home,
        };

        Ok(Config {
            api_url,
            default_carrier,
            timeout_ms,
            retry_timeout_ms,
            max_retries,
            keep_alive_secs,
            db_path,
            render_fps,
            log_file: args.log_file.unwrap_or_else(|| PathBuf::from("./dakdash.log")),
            initial_route,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_timeout: Duration::from_millis(self.timeout_ms),
            retry_timeout: Duration::from_millis(self.retry_timeout_ms),
        }
    }

    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Print current configuration (useful for debugging)
    pub fn print_summary(&self) {
        eprintln!("DakDash Configuration:");
        eprintln!("  API URL: {}", self.api_url);
        eprintln!("  Default Carrier: {}", self.default_carrier);
        eprintln!(
            "  Timeouts: {}ms, retry {}ms ({} retries)",
            self.timeout_ms, self.retry_timeout_ms, self.max_retries
        );
        if self.keep_alive_secs == 0 {
            eprintln!("  Keep-alive: off");
        } else {
            eprintln!("  Keep-alive: every {}s", self.keep_alive_secs);
        }
        eprintln!("  Database: {}", self.db_path.display());
        eprintln!("  Render FPS: {}", self.render_fps);
        eprintln!("  Log File: {}", self.log_file.display());
        eprintln!("  Start: {}", self.initial_route.to_link());
    }
}
