#[macro_use]
extern crate log;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use failure::Error;

use knockscan::{capture::Capture, Catalog, DetectionEvent, HostPairLog};

/// Detects port-knocking sequences from a knockd configuration in a capture
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    override_usage = "knock-detect <knockd.conf> <netlog.pcap>"
)]
struct Args {
    /// knockd configuration holding the knock sequences
    #[arg(value_name = "knockd.conf")]
    config: PathBuf,

    /// pcap/pcapng file to analyze
    #[arg(value_name = "netlog.pcap")]
    capture: PathBuf,
}

fn run(args: &Args) -> Result<Vec<DetectionEvent>, Error> {
    let catalog = Catalog::from_file(&args.config)?;

    info!(
        "loaded {} knock sequences from `{}`",
        catalog.len(),
        args.config.display()
    );

    let mut log = HostPairLog::new();
    let mut frames = 0;
    let mut attempts = 0;

    for record in Capture::open(&args.capture)? {
        let record = record?;

        frames += 1;

        if let Some(packet) = record.decode() {
            if log.record(&packet) {
                attempts += 1;
            }
        }
    }

    info!(
        "{} frames read, {} TCP connection attempts between {} host pairs",
        frames,
        attempts,
        log.len()
    );

    Ok(log.detect(&catalog))
}

fn main() {
    pretty_env_logger::init();

    let args = Args::parse();

    match run(&args) {
        Ok(events) => {
            for event in events {
                println!("{}", event);
            }
        }
        Err(err) => {
            eprintln!("error: {}", err);

            for cause in err.iter_causes() {
                eprintln!("  caused by: {}", cause);
            }

            process::exit(1);
        }
    }
}
