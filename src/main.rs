use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reolink_gateway::{Config, Daemon, Dispatched, Error, Normalized, StateValue, snapshot};

/// Reolink - state synchronization and command gateway for Reolink cameras
#[derive(Parser)]
#[command(name = "reolink", version, about)]
struct Cli {
    /// Camera host (overrides config)
    #[arg(long, env = "REOLINK_HOST")]
    host: Option<String>,

    /// Poll interval in seconds (overrides config)
    #[arg(long)]
    interval: Option<i64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Capture a snapshot from the camera
    Snapshot {
        /// Write the decoded image here instead of printing base64 JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print device info and network link as JSON
    Info,
    /// Write a feature value once (e.g. `set ir Auto`)
    Set {
        /// Feature id (e.g. "ir", "settings.ledBrightness")
        feature: String,
        /// Value to write
        value: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info",
        1 => "info,reolink_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(host) = cli.host {
        config.endpoint.host = host;
    }
    if let Some(interval) = cli.interval {
        config.poll_interval_secs = interval;
    }
    tracing::debug!(?config, "loaded configuration");

    let Some(command) = cli.command else {
        return Ok(Daemon::new(config)?.run().await?);
    };

    // One-shot commands never start the poll loop or control surface
    let daemon = Daemon::new(config)?;

    match command {
        Command::Snapshot { output } => cmd_snapshot(&daemon, output).await,
        Command::Info => cmd_info(&daemon).await,
        Command::Set { feature, value } => cmd_set(&daemon, &feature, &value).await,
    }
}

async fn cmd_snapshot(daemon: &Daemon, output: Option<PathBuf>) -> anyhow::Result<()> {
    let image = snapshot::capture(daemon.client()).await?;

    match output {
        Some(path) => {
            let bytes = image.decode()?;
            std::fs::write(&path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} bytes ({}) to {}", bytes.len(), image.content_type, path.display());
        }
        None => println!("{}", serde_json::to_string(&image)?),
    }
    Ok(())
}

async fn cmd_info(daemon: &Daemon) -> anyhow::Result<()> {
    if !daemon.refresher().identify().await {
        let reason = daemon
            .client()
            .health()
            .snapshot()
            .last_error
            .map_or_else(|| "unknown error".to_string(), |e| e.message);
        anyhow::bail!("camera did not return device info: {reason}");
    }

    let info: serde_json::Map<String, serde_json::Value> = daemon
        .store()
        .entries()
        .await
        .into_iter()
        .filter(|(id, _)| id.starts_with("device.") || id.starts_with("network."))
        .map(|(id, entry)| serde_json::to_value(entry.value).map(|v| (id, v)))
        .collect::<Result<_, serde_json::Error>>()?;

    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

async fn cmd_set(daemon: &Daemon, feature: &str, value: &str) -> anyhow::Result<()> {
    let value = StateValue::parse_loose(value);

    match daemon.dispatcher().dispatch(feature, &value).await? {
        Dispatched::Sent { command, outcome } => match outcome {
            Normalized::Success(_) => println!("{command}: ok"),
            Normalized::DeviceError(detail) => {
                anyhow::bail!("{command} rejected by camera: {detail}")
            }
            Normalized::TransportError(e) => anyhow::bail!("{command} not delivered: {e}"),
        },
        Dispatched::Requeried(feature) => println!("{feature}: re-queried"),
        Dispatched::Ignored => println!("{feature}: nothing to do"),
        Dispatched::Rejected { error, .. } => return Err(Error::from(error).into()),
    }
    Ok(())
}
