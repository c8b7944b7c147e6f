//! Authorizer HTTP server.
//!
//! Loads configuration, wires the AWS adapters, key-set discovery and the
//! tracing sinks into the authorizer service, then serves it until ctrl-c.
mod config;
mod http;
mod logging;

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use authorizer::infra::{HttpKeySetFetcher, TracingAuditSink, TracingMetricsSink};
use authorizer::{AuthorizerLocalClient, Collaborators, Service};
use authorizer_sdk::AuthorizerClient;
use aws_authorizer_plugin::AwsAdapters;
use clap::Parser;

use crate::config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "authorizer-server")]
#[command(about = "Tenant-isolating request authorizer")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address; overrides `server.bind_addr`
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut cfg = ServerConfig::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        cfg.server.bind_addr = bind;
    }
    if let Err(e) = cfg.authorizer.validate() {
        tracing::error!(alert = "configuration", error = %e, "refusing to start");
        return Err(e).context("invalid authorizer configuration");
    }

    run_with_shutdown(cfg, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(cfg: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let client = build_client(&cfg).await?;
    let app = http::router(client);

    let addr = cfg.server.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "authorizer listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    tracing::info!("authorizer stopped");
    Ok(())
}

async fn build_client(cfg: &ServerConfig) -> anyhow::Result<Arc<dyn AuthorizerClient>> {
    let aws = AwsAdapters::load(&cfg.aws).await;
    let key_sets = HttpKeySetFetcher::new(cfg.authorizer.key_set.fetch_timeout())
        .context("failed to build key-set client")?;

    let collaborators = Collaborators {
        key_sets: Arc::new(key_sets),
        broker: aws.broker,
        accounts: Some(aws.accounts),
        tier_keys: Some(aws.tier_keys),
        audit: Arc::new(TracingAuditSink),
        metrics: Arc::new(TracingMetricsSink::new(cfg.authorizer.metrics_prefix.clone())),
    };
    let service = Service::new(&cfg.authorizer, collaborators)?;

    Ok(Arc::new(AuthorizerLocalClient::new(Arc::new(service))))
}
