//! courier - issue a blocking GET, a blocking JSON POST and an async JSON POST
//!
//! Usage:
//!   courier --endpoint https://api.example.com/people
//!   courier --endpoint <url> --get-url https://example.com
//!   COURIER_ENDPOINT=<url> courier --log-level debug
//!
//! Status codes and bodies go to stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use courier_http::{HttpClient, HttpClientConfig, OutputSink, Person, RequestRunner};

#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(about = "Blocking and async HTTP requests through one shared client", long_about = None)]
#[command(version)]
struct Cli {
    /// URL for the blocking GET
    #[arg(long, env = "COURIER_GET_URL", default_value = "https://brave.com")]
    get_url: String,

    /// Endpoint that receives both JSON POSTs
    #[arg(long, env = "COURIER_ENDPOINT")]
    endpoint: String,

    /// Override the User-Agent header
    #[arg(long)]
    user_agent: Option<String>,

    /// Do not follow redirects
    #[arg(long)]
    no_redirects: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn client_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig::new().follow_redirects(!self.no_redirects);
        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let client = HttpClient::new(cli.client_config()).context("Failed to build HTTP client")?;
    let runner =
        RequestRunner::new(client, OutputSink::stdout()).context("Failed to start request runner")?;

    let person = Person::sample();

    runner
        .perform_get(&cli.get_url)
        .with_context(|| format!("GET {} failed", cli.get_url))?;

    runner
        .perform_sync_post(&cli.endpoint, &person)
        .with_context(|| format!("POST {} failed", cli.endpoint))?;

    runner
        .post_json_async(&cli.endpoint, &person)
        .with_context(|| format!("Could not dispatch async POST to {}", cli.endpoint))?;

    // Handlers of async dispatches only run while the runner is alive.
    let waited = runner.wait_for_pending();
    tracing::debug!(waited, "All async dispatches finished");

    Ok(())
}

/// Initialize logging based on log level
fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized

    Ok(())
}
