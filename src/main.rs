use axum::http::Request;
use clap::{Parser, Subcommand};
use exn::ResultExt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use embedit::error::{ErrorKind, Result};
use embedit::{AppState, router};
use embedit_config::Config;
use embedit_dispatch::{Outcome, Resolved, Source};

/// Open Graph embeds for social media posts.
#[derive(Parser, Debug)]
#[command(name = "embedit", version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(long, short, global = true, env = "EMBEDIT_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Listen address, overriding the configured one.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Resolve one post URL and print its metadata as JSON.
    Resolve {
        url: String,
        /// Also report whether this client would be sent an embed or a redirect.
        #[arg(long)]
        user_agent: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config) {
        Ok(config) => match cli.command {
            Command::Serve { bind } => serve(config, bind).await,
            Command::Resolve { url, user_agent } => resolve(config, &url, user_agent.as_deref()).await,
        },
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "{}", *err);
            ExitCode::FAILURE
        },
    }
}

async fn serve(config: Config, bind: Option<SocketAddr>) -> Result<()> {
    let bind = bind.unwrap_or(config.bind);
    let state = AppState::from_config(&config).await?;
    let app = router(state).layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        tracing::span!(
            Level::INFO,
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
        )
    }));
    let listener = tokio::net::TcpListener::bind(bind).await.or_raise(|| ErrorKind::Serve)?;
    tracing::info!(addr = %bind, url = %config.url, "starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .or_raise(|| ErrorKind::Serve)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn resolve(config: Config, url: &str, user_agent: Option<&str>) -> Result<()> {
    let state = AppState::from_config(&config).await?;
    let dispatch_err = |err: embedit_dispatch::error::Error| {
        let kind = ErrorKind::Dispatch((*err).clone());
        err.raise(kind)
    };
    let resolved = state.dispatcher.resolve(url).await.map_err(dispatch_err)?;
    let outcome = user_agent.map(|user_agent| state.dispatcher.outcome(resolved.clone(), Some(user_agent)));
    println!("{}", report(&resolved, outcome.as_ref())?);
    Ok(())
}

fn report(resolved: &Resolved, outcome: Option<&Outcome>) -> Result<String> {
    let metadata: serde_json::Value = resolved
        .metadata
        .to_json()
        .and_then(|body| serde_json::from_str(&body))
        .or_raise(|| ErrorKind::Render)?;
    let mut report = serde_json::json!({
        "url": resolved.url.as_str(),
        "kind": resolved.metadata.kind().as_str(),
        "source": match resolved.source {
            Source::Cache => "cache",
            Source::Extracted => "extracted",
        },
        "metadata": metadata,
    });
    match outcome {
        Some(Outcome::Embed(_)) => report["outcome"] = "embed".into(),
        Some(Outcome::Redirect(location)) => {
            report["outcome"] = "redirect".into();
            report["location"] = location.as_str().into();
        },
        None => {},
    }
    serde_json::to_string_pretty(&report).or_raise(|| ErrorKind::Render)
}
