use super::{read_input, Config};
use ballotledger::{from_json_or_cbor, JournalEntry, Ledger};
use log::{info, warn};

/// Apply every entry at its own timestamp, reporting (not stopping on) rejections
pub fn command_replay(matches: &clap::ArgMatches, config: &Config) {
    let registrar = config.registrar().unwrap_or_else(|| {
        eprintln!(
            "Please provide the registrar via --registrar, BALLOTLEDGER_REGISTRAR or a secret key"
        );
        std::process::exit(1);
    });

    let bytes = read_input(matches, "replay");
    let entries: Vec<JournalEntry> = from_json_or_cbor(&bytes).unwrap_or_else(|e| {
        eprintln!("ballotledger replay: {}", e);
        std::process::exit(1);
    });

    let mut rejected = 0;
    let ledger = Ledger::replay_with(registrar, &entries, |i, e| {
        rejected += 1;
        warn!("entry {}: {}", i, e);
        Ok(())
    })
    .unwrap_or_else(|e| {
        eprintln!("ballotledger replay: {}", e);
        std::process::exit(1);
    });
    info!("replayed {} entries", entries.len() - rejected);
    if rejected > 0 {
        eprintln!(
            "ballotledger replay: {} of {} entries rejected",
            rejected,
            entries.len()
        );
    }

    let summary = ledger.summary().unwrap_or_else(|e| {
        eprintln!("ballotledger replay: {}", e);
        std::process::exit(1);
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("ballotledger replay: {}", e);
            std::process::exit(1);
        }
    }
}
