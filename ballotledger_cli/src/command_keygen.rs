use ballotledger::{generate_keypair, Address};

pub fn command_keygen() {
    let (secret, public) = generate_keypair();
    println!("secret-key: {}", hex::encode(secret.as_bytes()));
    println!("public-key: {}", hex::encode(public.as_bytes()));
    println!("address: {}", Address::from(&public));
}
