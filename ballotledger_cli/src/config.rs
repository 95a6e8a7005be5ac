use ballotledger::Address;
use ed25519_dalek::PublicKey;
use ed25519_dalek::SecretKey;
use std::env::var;
use std::str::FromStr;

/// CLI configuration: flags first, then BALLOTLEDGER_* environment variables
pub struct Config {
    pub secret_key: Option<SecretKey>,
    pub registrar: Option<Address>,
}

impl Config {
    pub fn from_matches(matches: &clap::ArgMatches) -> Result<Self, String> {
        let secret_key = match flag_or_env(matches, "secret-key", "BALLOTLEDGER_SECRET_KEY") {
            Some(val) => {
                let bytes = hex::decode(val.trim())
                    .map_err(|e| format!("invalid secret key: {}", e))?;
                let secret = SecretKey::from_bytes(&bytes)
                    .map_err(|e| format!("invalid secret key: {}", e))?;
                Some(secret)
            }
            None => None,
        };

        let registrar = match flag_or_env(matches, "registrar", "BALLOTLEDGER_REGISTRAR") {
            Some(val) => Some(
                Address::from_str(val.trim())
                    .map_err(|e| format!("invalid registrar address: {}", e))?,
            ),
            None => None,
        };

        Ok(Config {
            secret_key,
            registrar,
        })
    }

    /// The registration authority, defaulting to ourselves
    pub fn registrar(&self) -> Option<Address> {
        self.registrar.or_else(|| {
            self.secret_key
                .as_ref()
                .map(|secret| Address::from(PublicKey::from(secret)))
        })
    }
}

fn flag_or_env(matches: &clap::ArgMatches, flag: &str, env_var: &str) -> Option<String> {
    match matches.value_of(flag) {
        Some(val) => Some(val.to_owned()),
        None => var(env_var).ok(),
    }
}
