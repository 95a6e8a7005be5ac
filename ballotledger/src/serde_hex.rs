//! Hex (de)serialization for the ed25519 types carried in signed transactions.
//!
//! Use with `#[serde(with = "EdPublicKeyHex")]` and
//! `#[serde(with = "EdSignatureHex")]`.

use ed25519_dalek::PublicKey;
use ed25519_dalek::Signature;
use std::borrow::Cow;
use std::convert::TryFrom;

pub use hex_buffer_serde::Hex;

// a single-purpose type for use in `#[serde(with)]`
pub enum EdPublicKeyHex {}

impl Hex<PublicKey> for EdPublicKeyHex {
    type Error = String;

    fn create_bytes(public_key: &PublicKey) -> Cow<[u8]> {
        public_key.as_ref().into()
    }

    fn from_bytes(bytes: &[u8]) -> Result<PublicKey, String> {
        PublicKey::from_bytes(bytes).map_err(|e| format!("{}", e))
    }
}

// a single-purpose type for use in `#[serde(with)]`
pub enum EdSignatureHex {}

impl Hex<Signature> for EdSignatureHex {
    type Error = String;

    fn create_bytes(sig: &Signature) -> Cow<[u8]> {
        Cow::from(sig.to_bytes().to_vec())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Signature, String> {
        Signature::try_from(bytes).map_err(|e| format!("{}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_keypair;

    #[derive(Serialize, Deserialize)]
    struct Keyed {
        #[serde(with = "EdPublicKeyHex")]
        public: PublicKey,
    }

    #[test]
    fn public_key_is_lowercase_hex() {
        let (_secret, public) = generate_keypair();
        let json = serde_json::to_value(&Keyed { public }).unwrap();
        assert_eq!(json["public"], hex::encode(public.as_bytes()));

        let back: Keyed = serde_json::from_value(json).unwrap();
        assert_eq!(back.public, public);

        let short = serde_json::json!({ "public": "abcd" });
        assert!(serde_json::from_value::<Keyed>(short).is_err());
    }
}
