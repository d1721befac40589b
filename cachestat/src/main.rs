use clap::Parser;
use http_body::Body as HttpBody;
use revalbox::store::Store;
use revalbox::{CachingClient, ResponseStatus, Transport};
use revalbox_configuration::ClientConfig;
use revalbox_reqwest::ReqwestTransport;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod cli;
mod error;

use cli::CliArgs;
use error::AppError;

const VERBOSE_FILTER: &str = "cachestat=info,revalbox=debug";
const DEFAULT_FILTER: &str = "warn";

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    let default_filter = if args.verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    match args.config {
        Some(path) => {
            debug!(path = %path.display(), "Loading configuration");
            let client = ClientConfig::from_file(&path)?.into_client(ReqwestTransport::default())?;
            check_all(&client, &args.urls).await;
        }
        None => check_all(revalbox_reqwest::default_client(), &args.urls).await,
    }
    Ok(())
}

async fn check_all<T, S>(client: &CachingClient<T, S>, urls: &[String])
where
    T: Transport,
    S: Store,
    <T::Body as HttpBody>::Error: Into<T::Error>,
{
    for url in urls {
        println!("{}", check(client, url).await);
    }
}

/// Fetches `url` twice and describes how the second fetch was answered.
async fn check<T, S>(client: &CachingClient<T, S>, url: &str) -> String
where
    T: Transport,
    S: Store,
    <T::Body as HttpBody>::Error: Into<T::Error>,
{
    let first = match client.fetch_with_cache(url).await {
        Ok(response) => response,
        Err(e) => return format!("{e}, {url}"),
    };
    let succeeded = match first.status {
        ResponseStatus::Cached => true,
        ResponseStatus::Network(status) => status == http::StatusCode::OK,
    };
    if !succeeded {
        return format!(
            "not success HTTP request - {} - {url}",
            first.status.as_u16()
        );
    }

    match client.fetch_with_cache(url).await {
        Ok(second) => format!("{} - {url}", second.status),
        Err(e) => format!("{e}, {url}"),
    }
}
