use anyhow::{bail, Result};
use buds_config::AppConfig;
use buds_opentrack::{FrameListener, OpenTrackSender};
use buds_pose::OrientationMapper;
use buds_tracking::simulate::SimulatedSource;
use buds_tracking::{TrackingClient, TrackingCommand};
use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const DEFAULT_LOG_FILTER: &str =
    "buds_bridge=info,buds_pose=info,buds_opentrack=info,buds_tracking=info";

const USAGE: &str = "\
usage: buds-bridge [simulate|listen] [--config <path>] [--write-config] [--debug]

  simulate        stream a synthetic head motion to OpenTrack (default)
  listen          receive OpenTrack frames and log them

console commands while streaming: r = recenter, c = clear recenter,
m = cycle axis mode, q = quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Simulate,
    Listen,
}

#[derive(Debug)]
struct Args {
    mode: RunMode,
    config_path: Option<PathBuf>,
    write_config: bool,
    debug: bool,
}

/// Parse command line arguments.
///
/// Supports:
/// - `buds-bridge [simulate|listen]` (positional mode)
/// - `buds-bridge --config <path>` / `-c <path>`
/// - `--write-config`, `--debug`
fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args {
        mode: RunMode::Simulate,
        config_path: None,
        write_config: false,
        debug: false,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "simulate" => parsed.mode = RunMode::Simulate,
            "listen" => parsed.mode = RunMode::Listen,
            "--config" | "-c" => match iter.next() {
                Some(path) => parsed.config_path = Some(PathBuf::from(path)),
                None => bail!("--config needs a path\n\n{USAGE}"),
            },
            "--write-config" => parsed.write_config = true,
            "--debug" => parsed.debug = true,
            other => bail!("unknown argument: {other}\n\n{USAGE}"),
        }
    }
    Ok(parsed)
}

fn console_command(line: &str) -> Option<Option<TrackingCommand>> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" => Some(Some(TrackingCommand::Recenter)),
        "c" => Some(Some(TrackingCommand::ClearRecenter)),
        "m" => Some(Some(TrackingCommand::CycleMode)),
        "q" => Some(None),
        _ => None,
    }
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let path = match &args.config_path {
        Some(path) => path.clone(),
        None => buds_config::config_path()?,
    };

    match buds_config::load_config_from(&path) {
        Ok(config) => {
            if args.write_config {
                buds_config::save_config_to(&config, &path)?;
            }
            Ok(config)
        }
        Err(e) => {
            warn!(?e, "Failed to load config, using defaults");
            if args.write_config {
                warn!(?path, "Leaving the unreadable config file untouched");
            }
            Ok(AppConfig::default())
        }
    }
}

async fn run_simulation(config: &AppConfig) -> Result<()> {
    let transport = &config.transport;
    let sender = OpenTrackSender::connect(&transport.host, transport.port, transport.target_hz)?;
    let mapper = OrientationMapper::new(config.mapping.modes.clone(), config.mapping.initial);
    let client = TrackingClient::spawn(mapper, sender);

    let sim = &config.simulation;
    let source = SimulatedSource::new(sim.sample_hz, sim.yaw_step_deg, sim.pitch_amplitude_deg)
        .spawn(client.sample_sink());

    info!("Streaming. Commands: r = recenter, c = clear, m = cycle mode, q = quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed, keep streaming until interrupted
                    tokio::signal::ctrl_c().await?;
                    break;
                };
                match console_command(&line) {
                    Some(Some(command)) => client.command(command),
                    Some(None) => break,
                    None if line.trim().is_empty() => {
                        info!(pose = %client.pose(), stats = ?client.stats(), "Status");
                    }
                    None => warn!(%line, "Unknown command (r, c, m, q)"),
                }
            }
        }
    }

    source.abort();
    let _ = source.await;
    client.shutdown().await;
    Ok(())
}

async fn run_listener(config: &AppConfig) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.listener.port));
    let listener = FrameListener::bind(addr).await?;
    info!("Listening for OpenTrack frames, Ctrl+C to stop");

    tokio::select! {
        result = listener.run(config.listener.report_every) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let argv: Vec<String> = env::args().collect();
    let args = parse_args(&argv)?;

    // Initialize logging.
    let default_filter = if args.debug { "debug" } else { DEFAULT_LOG_FILTER };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    info!("buds-bridge {} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    info!(
        host = %config.transport.host,
        port = config.transport.port,
        target_hz = config.transport.target_hz,
        mode = %config.mapping.initial,
        "Config loaded"
    );

    match args.mode {
        RunMode::Simulate => run_simulation(&config).await,
        RunMode::Listen => run_listener(&config).await,
    }
}
