use anyhow::Context;
use clap::Parser;

use rinha_api::app::{build_app, services};
use rinha_api::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    rinha_observability::init(cli.log_format);

    let authority = services::build_authority(&cli).await?;
    let app = build_app(authority);

    let addr = cli.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server terminated")?;
    Ok(())
}
