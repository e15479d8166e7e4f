use anyhow::Context;
use fetch_core::{ClientConfig, HttpClient};
use fetch_runner::{run_all, Endpoints};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Results go to stdout; diagnostics stay on stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let client = HttpClient::new(ClientConfig::default());
    let outcome = run_all(&client, &Endpoints::default());
    client.shutdown().context("shutting down http client")?;

    let summary = outcome.context("example run failed")?;
    info!(
        post = summary.post.done().is_some(),
        json = summary.json.done().is_some(),
        downloaded = summary.download.received_bytes,
        "all examples finished"
    );
    Ok(())
}
