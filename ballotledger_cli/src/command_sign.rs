use super::{read_input, Config};
use ballotledger::{Signed, Transaction};

pub fn command_sign(matches: &clap::ArgMatches, config: &Config) {
    let secret_key = config.secret_key.as_ref().unwrap_or_else(|| {
        eprintln!(
            "Please provide a secret key either via --secret-key or BALLOTLEDGER_SECRET_KEY"
        );
        std::process::exit(1);
    });

    let bytes = read_input(matches, "sign");
    let tx = Transaction::from_bytes(&bytes).unwrap_or_else(|e| {
        eprintln!("ballotledger sign: {}", e);
        std::process::exit(1);
    });

    let signed = Signed::sign(secret_key, tx).unwrap_or_else(|e| {
        eprintln!("ballotledger sign: {}", e);
        std::process::exit(1);
    });

    match serde_json::to_string_pretty(&signed) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("ballotledger sign: {}", e);
            std::process::exit(1);
        }
    }
}
