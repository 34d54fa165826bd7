//! BurstCreator command line front end
//!
//! Loads a JSON burst profile, sends it to the board and prints whatever the
//! board reports until Ctrl-C or the listen timeout.

use anyhow::{anyhow, bail, Context, Result};
use burstcreator_core::burst::{encode_with_mode, BurstFrame, RunMode};
use burstcreator_core::controller::BurstController;
use burstcreator_core::profile::BurstProfile;
use burstcreator_core::protocol::{list_ports, ReadEvent, SerialSession};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "BurstCreator")]
#[command(bin_name = "burstcreator")]
#[command(version, about = "Program bursts on a NeoDK board")]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List serial ports connected to the host")]
    Ports,
    Encode(EncodeArgs),
    Send(SendArgs),
    #[command(about = "Print a default profile to start from")]
    Profile,
}

#[derive(clap::Args)]
#[command(about = "Encode a profile and print the packet without sending it")]
struct EncodeArgs {
    profile: PathBuf,

    /// Queue the burst on the device instead of running it immediately
    #[arg(long)]
    queue: bool,
}

#[derive(clap::Args)]
#[command(about = "Send a profile's burst and print device output")]
struct SendArgs {
    profile: PathBuf,

    /// Serial port, overrides the profile
    #[arg(long, short)]
    port: Option<String>,

    /// Baud rate, overrides the profile
    #[arg(long, short)]
    baud: Option<u32>,

    /// Stop listening after this many seconds (default: until Ctrl-C)
    #[arg(long)]
    listen: Option<f64>,

    /// Queue the burst on the device instead of running it immediately
    #[arg(long)]
    queue: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Ports => ports(),
        Commands::Encode(args) => encode(args),
        Commands::Send(args) => send(args).await,
        Commands::Profile => {
            println!("{}", BurstProfile::default().to_json()?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Logs go to stderr so stdout carries only device text
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_mode(queue: bool) -> RunMode {
    if queue {
        RunMode::Queue
    } else {
        RunMode::Immediate
    }
}

fn load_profile(path: &Path) -> Result<BurstProfile> {
    BurstProfile::from_file(path).with_context(|| format!("loading {}", path.display()))
}

fn ports() -> Result<()> {
    let ports = list_ports();
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => println!(
                "{}  {:04x}:{:04x}  {}",
                port.name,
                vid,
                pid,
                port.product.as_deref().unwrap_or("")
            ),
            _ => println!("{}", port.name),
        }
    }
    Ok(())
}

fn encode(args: EncodeArgs) -> Result<()> {
    let profile = load_profile(&args.profile)?;
    let packet = encode_with_mode(&profile.burst, run_mode(args.queue))?;
    let frame = BurstFrame::parse(packet.as_bytes())?;

    println!("{}", packet);
    for (name, value) in frame.fields() {
        println!("{:<26}{}", name, value);
    }
    Ok(())
}

fn listen_duration(secs: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => Ok(duration),
        Err(e) => bail!("--listen {} is not a usable number of seconds: {}", secs, e),
    }
}

fn print_text(out: &mut impl Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

async fn send(args: SendArgs) -> Result<()> {
    let listen = args.listen.map(listen_duration).transpose()?;

    let mut profile = load_profile(&args.profile)?;
    if let Some(port) = args.port {
        profile.serial.port_name = port;
    }
    if let Some(baud) = args.baud {
        profile.serial.baud_rate = baud;
    }

    let mut controller = BurstController::new(profile.serial, SerialSession::new());
    controller.set_run_mode(run_mode(args.queue));

    let packet = controller
        .send_burst(&profile.burst)
        .context("sending burst")?;
    info!("Sent {}", packet);
    debug!("{:?}", BurstFrame::parse(packet.as_bytes())?);

    let (tx, mut rx) = mpsc::unbounded_channel();
    controller.listen(move |event| {
        let _ = tx.send(event);
    })?;

    let deadline = async {
        match listen {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stdout = io::stdout();
    let result = loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(ReadEvent::Data(text)) => {
                    if let Err(e) = print_text(&mut stdout, &text) {
                        break Err(anyhow!(e).context("writing device output"));
                    }
                }
                Some(ReadEvent::DecodeWarning { invalid_bytes }) => {
                    warn!("Device sent {} bytes of invalid UTF-8", invalid_bytes);
                }
                Some(ReadEvent::Error(e)) => warn!("Read error: {}", e),
                Some(ReadEvent::Disconnected(reason)) => {
                    break Err(anyhow!("device disconnected: {}", reason));
                }
                None => break Ok(()),
            },
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break Ok(());
            }
            _ = &mut deadline => break Ok(()),
        }
    };

    controller.shutdown();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_listen_duration() {
        assert_eq!(listen_duration(2.5).unwrap(), Duration::from_millis(2500));
        assert_eq!(listen_duration(0.0).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_listen_duration_rejects_unusable_values() {
        assert!(listen_duration(-1.0).is_err());
        assert!(listen_duration(f64::NAN).is_err());
        assert!(listen_duration(f64::INFINITY).is_err());
        assert!(listen_duration(1e30).is_err());
    }

    #[test]
    fn test_print_text_writes_and_reports_errors() {
        let mut out = Vec::new();
        print_text(&mut out, "Burst complete. ").unwrap();
        assert_eq!(out, b"Burst complete. ");

        let err = print_text(&mut ClosedPipe, "lost").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
