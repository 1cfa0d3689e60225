// Wallet: keys, signing and addresses

mod keystore;

pub use keystore::{Keystore, Address, KeyPair, verify};
