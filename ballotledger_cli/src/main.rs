use clap::{App, Arg, SubCommand};
use log::LevelFilter;

mod command_keygen;
mod command_replay;
mod command_sign;
mod config;
mod logging;

pub use command_keygen::*;
pub use command_replay::*;
pub use command_sign::*;
pub use config::*;

fn main() {
    let matches = App::new("BallotLedger CLI")
        .version("0.1")
        .about("Signs ballot ledger transactions and replays them against an in-memory ledger")
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::with_name("secret-key")
                .long("secret-key")
                .takes_value(true)
                .help("Hex ed25519 secret key - can also be set with BALLOTLEDGER_SECRET_KEY"),
        )
        .arg(
            Arg::with_name("registrar")
                .long("registrar")
                .takes_value(true)
                .help("Address of the registration authority - can also be set with BALLOTLEDGER_REGISTRAR"),
        )
        .subcommand(SubCommand::with_name("keygen").about("Generate a keypair and its address"))
        .subcommand(
            SubCommand::with_name("sign")
                .about("Sign a transaction with the configured secret key")
                .arg(
                    Arg::with_name("INPUT")
                        .index(1)
                        .required(true)
                        .help("Unsigned transaction file in JSON or CBOR format"),
                ),
        )
        .subcommand(
            SubCommand::with_name("replay")
                .about("Apply a scenario of timestamped signed transactions and print the outcome")
                .arg(
                    Arg::with_name("INPUT")
                        .index(1)
                        .required(true)
                        .help("Scenario file (JSON or CBOR list of {at, tx} entries)"),
                ),
        )
        .get_matches();

    let level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if let Err(e) = logging::init(level) {
        eprintln!("ballotledger: unable to initialise logging: {}", e);
        std::process::exit(1);
    }

    let config = Config::from_matches(&matches).unwrap_or_else(|e| {
        eprintln!("ballotledger: {}", e);
        std::process::exit(1);
    });

    // Subcommands
    match matches.subcommand() {
        ("keygen", Some(_)) => command_keygen(),
        ("sign", Some(matches)) => command_sign(matches, &config),
        ("replay", Some(matches)) => command_replay(matches, &config),
        _ => {
            eprintln!("{}", matches.usage());
            std::process::exit(1);
        }
    }
}

/// Read an input file named by the INPUT argument, or exit
pub fn read_input(matches: &clap::ArgMatches, command: &str) -> Vec<u8> {
    let filename = match matches.value_of("INPUT") {
        Some(filename) => filename,
        None => {
            eprintln!("ballotledger {}: input filename required", command);
            std::process::exit(1);
        }
    };

    match std::fs::read(filename) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("ballotledger {}: unable to read {}: {}", command, filename, e);
            std::process::exit(1);
        }
    }
}
