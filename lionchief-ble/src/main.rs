//! Command line tool for LionChief trains
//!
//! Scans for trains and sends one-shot commands over BLE.
//!
//! Usage:
//!   lionchief-ble scan [--retry]
//!   lionchief-ble send [--device ADDR] motor,set_speed,10 sound,set_horn,true
//!   lionchief-ble commands

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use data_encoding::HEXLOWER;
use lionchief_ble_controller::{
    command::COMMANDS, discovery, Advertisement, BtleTransport, ControllerConfig, DeviceHandle,
    RetryPolicy, Session, SessionError, TrainCommand, Transport, TransportError,
};

/// Longest wait for a train to acknowledge the goodbye and drop the link
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "lionchief-ble")]
#[command(about = "Drive LionChief trains over Bluetooth Low Energy")]
struct Cli {
    /// Config file (JSON), defaults to $LIONCHIEF_CONFIG or the user config dir
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Log every frame sent
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for LionChief trains
    Scan {
        /// Keep scanning until a train shows up (Ctrl-C to stop)
        #[arg(short, long)]
        retry: bool,
        /// Scan passes before giving up
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        passes: Option<u32>,
    },
    /// Connect to a train and send commands, in order
    Send {
        /// Address (or part of it) of the train to use
        #[arg(short, long)]
        device: Option<String>,
        /// Keep scanning until a train shows up (Ctrl-C to stop)
        #[arg(short, long)]
        retry: bool,
        /// Print the frames instead of talking to a train
        #[arg(long)]
        dry_run: bool,
        /// Commands like motor,set_speed,10
        #[arg(required = true)]
        commands: Vec<TrainCommand>,
    },
    /// List the commands understood by `send`
    #[command(name = "commands")]
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let mut config = ControllerConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { retry, passes } => {
            config.discovery.retry |= retry;
            if let Some(passes) = passes {
                config.discovery.max_passes = passes;
            }
            scan_trains(&config).await?;
        }
        Commands::Send { device, retry, dry_run, commands } => {
            config.discovery.retry |= retry;
            if dry_run {
                print_frames(&config, &commands).await?;
            } else {
                send_commands(&config, device.as_deref(), &commands).await?;
            }
        }
        Commands::List => {
            for spec in &COMMANDS {
                println!("  {}", spec.usage());
            }
        }
    }

    Ok(())
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler, never cancel
        std::future::pending::<()>().await;
    }
}

async fn find_trains(
    transport: &BtleTransport,
    config: &ControllerConfig,
) -> Result<Vec<DeviceHandle>, Box<dyn std::error::Error>> {
    let policy = config.discovery.retry_policy();
    match policy {
        RetryPolicy::Unbounded => println!("Scanning for trains (Ctrl-C to stop)..."),
        RetryPolicy::Bounded { max_passes } => println!(
            "Scanning for trains ({} passes, {}s apart)...",
            max_passes, config.discovery.sample_interval_secs
        ),
    }

    let interval = config.discovery.sample_interval();
    let trains = discovery::discover_until(transport, interval, policy, ctrl_c()).await?;
    Ok(trains)
}

async fn scan_trains(config: &ControllerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let transport = BtleTransport::new().await?;
    let trains = find_trains(&transport, config).await?;

    if trains.is_empty() {
        println!("\nNo trains found.");
        println!("Make sure the locomotive is powered on and not connected to a remote.");
        return Ok(());
    }

    println!("\nFound {} train(s):", trains.len());
    for train in &trains {
        let rssi = train.rssi.map(|r| format!(" ({}dBm)", r)).unwrap_or_default();
        println!("  {}{}", train, rssi);
        let mut ids: Vec<_> = train.manufacturer_data.keys().collect();
        ids.sort();
        for id in ids {
            let data = HEXLOWER.encode(&train.manufacturer_data[id]);
            println!("    manufacturer {:#06x}: {}", id, data);
        }
    }

    Ok(())
}

async fn send_commands(
    config: &ControllerConfig,
    device: Option<&str>,
    commands: &[TrainCommand],
) -> Result<(), Box<dyn std::error::Error>> {
    let transport = BtleTransport::new().await?;
    let trains = find_trains(&transport, config).await?;

    let train = match device {
        Some(d) => {
            let d = d.to_ascii_lowercase();
            trains
                .into_iter()
                .find(|t| t.address.to_ascii_lowercase().contains(&d))
                .ok_or("No matching train found")?
        }
        None => trains.into_iter().next().ok_or("No train found")?,
    };

    println!("Connecting to {}...", train);
    let Some(mut session) = open_session(transport, train, ctrl_c()).await? else {
        println!("\nInterrupted.");
        return Ok(());
    };
    println!("Connected!");

    let result = tokio::select! {
        r = run_commands(&session, config, commands) => r,
        _ = ctrl_c() => {
            println!("\nInterrupted.");
            Ok(())
        }
    };

    println!("Disconnecting...");
    close_session(&mut session, DISCONNECT_TIMEOUT).await;

    result
}

/// Connect to `train`, or `None` if `cancel` completes first
async fn open_session<T, C>(
    transport: T,
    train: DeviceHandle,
    cancel: C,
) -> Result<Option<Session<T>>, SessionError>
where
    T: Transport,
    C: Future<Output = ()>,
{
    tokio::select! {
        session = Session::open(transport, train) => session.map(Some),
        _ = cancel => Ok(None),
    }
}

/// Best-effort disconnect that gives up after `timeout`
async fn close_session<T: Transport>(session: &mut Session<T>, timeout: Duration) {
    match tokio::time::timeout(timeout, session.disconnect()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("disconnect failed: {e}"),
        Err(_) => log::warn!("disconnect timed out after {timeout:?}"),
    }
}

async fn run_commands<T: Transport>(
    session: &Session<T>,
    config: &ControllerConfig,
    commands: &[TrainCommand],
) -> Result<(), Box<dyn std::error::Error>> {
    for (i, command) in commands.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(config.command_delay()).await;
        }
        println!("  {}", command);
        command.execute(session).await?;
    }
    Ok(())
}

/// Prints frames instead of writing them
struct DryRun;

impl Transport for DryRun {
    type Link = ();

    async fn start_scan(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn advertisements(&self) -> Result<Vec<Advertisement>, TransportError> {
        Ok(Vec::new())
    }

    async fn stop_scan(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn connect(&self, _device: &DeviceHandle) -> Result<(), TransportError> {
        Ok(())
    }

    async fn write(&self, _link: &(), bytes: &[u8]) -> Result<(), TransportError> {
        let ok = if lionchief_proto::verify(bytes) { "ok" } else { "BAD CHECKSUM" };
        println!("    {} [{}]", HEXLOWER.encode(bytes), ok);
        Ok(())
    }

    async fn disconnect(&self, _link: &()) -> Result<(), TransportError> {
        Ok(())
    }

    async fn is_connected(&self, _link: &()) -> bool {
        true
    }
}

async fn print_frames(
    config: &ControllerConfig,
    commands: &[TrainCommand],
) -> Result<(), Box<dyn std::error::Error>> {
    let device = DeviceHandle {
        address: "dry-run".to_string(),
        local_name: None,
        rssi: None,
        manufacturer_data: HashMap::new(),
    };

    let mut session = Session::open(DryRun, device).await?;
    let config = ControllerConfig { command_delay_ms: 0, ..config.clone() };
    run_commands(&session, &config, commands).await?;
    println!("  disconnect");
    session.disconnect().await?;
    Ok(())
}
