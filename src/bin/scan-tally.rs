#[macro_use]
extern crate log;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use failure::Error;

use knockscan::{capture::Capture, ScanTally};

/// Counts reconnaissance scan packets in a capture by TCP flag pattern
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input pcap/pcapng file
    #[arg(short, long, value_name = "PCAP")]
    input: PathBuf,
}

fn run(args: &Args) -> Result<ScanTally, Error> {
    let mut tally = ScanTally::new();
    let mut frames = 0;
    let mut decoded = 0;

    for record in Capture::open(&args.input)? {
        let record = record?;

        frames += 1;

        if let Some(packet) = record.decode() {
            decoded += 1;

            if let Some(category) = tally.observe(&packet) {
                trace!("{} packet {} -> {}", category, packet.source, packet.destination);
            }
        }
    }

    info!(
        "{} frames read, {} IPv4 packets decoded, {} classified",
        frames,
        decoded,
        tally.total()
    );

    Ok(tally)
}

fn main() {
    pretty_env_logger::init();

    let args = Args::parse();

    match run(&args) {
        Ok(tally) => println!("{}", tally),
        Err(err) => {
            eprintln!("error: {}", err);

            for cause in err.iter_causes() {
                eprintln!("  caused by: {}", cause);
            }

            process::exit(1);
        }
    }
}
