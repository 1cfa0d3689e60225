// Key management and signing

use crate::core::{hash160, sha256_hash};
use secp256k1::{Secp256k1, SecretKey, PublicKey, Message, ecdsa::Signature};
use rand::rngs::OsRng;
use std::collections::HashMap;

/// Short display form of a public key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub String);

impl Address {
    /// Create address from a public key (hex of HASH160 of the compressed point)
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(hex::encode(hash160(&public_key.serialize())))
    }

    /// Get address string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key pair
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    pub address: Address,
}

impl KeyPair {
    /// Generate a new key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let mut rng = OsRng;

        let secret_key = SecretKey::new(&mut rng);
        Self::from_secret_key(&secp, secret_key)
    }

    /// Create from secret key bytes
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, String> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|e| format!("Invalid secret key: {}", e))?;
        Ok(Self::from_secret_key(&secp, secret_key))
    }

    fn from_secret_key(secp: &Secp256k1<secp256k1::All>, secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key(secp);
        let address = Address::from_public_key(&public_key);

        Self {
            secret_key,
            public_key,
            address,
        }
    }

    /// Sign an arbitrary message. Returns a DER-encoded ECDSA signature over SHA256(message).
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let secp = Secp256k1::signing_only();
        let digest = Message::from_digest(sha256_hash(message));
        secp.sign_ecdsa(&digest, &self.secret_key)
            .serialize_der()
            .to_vec()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Verify a DER signature produced by [`KeyPair::sign`].
///
/// Malformed signatures are reported as `false`, never as an error.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
    let secp = Secp256k1::verification_only();

    let signature = match Signature::from_der(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    let digest = Message::from_digest(sha256_hash(message));

    secp.verify_ecdsa(&digest, &signature, public_key).is_ok()
}

/// Keystore - in-memory set of key pairs
pub struct Keystore {
    keys: HashMap<Address, KeyPair>,
}

impl Keystore {
    /// Create a new keystore
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Generate a new address
    pub fn new_address(&mut self) -> Address {
        let keypair = KeyPair::generate();
        let address = keypair.address.clone();
        self.keys.insert(address.clone(), keypair);
        address
    }

    /// Get key pair for address
    pub fn get_keypair(&self, address: &Address) -> Option<&KeyPair> {
        self.keys.get(address)
    }

    /// Find the key pair owning a public key
    pub fn find_by_public_key(&self, public_key: &PublicKey) -> Option<&KeyPair> {
        self.keys.get(&Address::from_public_key(public_key))
    }

    /// All addresses, sorted
    pub fn list_addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.keys.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Count addresses
    pub fn count(&self) -> usize {
        self.keys.len()
    }
}

impl Default for Keystore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let kp = KeyPair::generate();

        assert_eq!(kp.public_key.serialize().len(), 33); // Compressed pubkey
        assert_eq!(kp.address.as_str().len(), 40);
    }

    #[test]
    fn test_from_secret_bytes_derives_same_key() {
        let kp = KeyPair::generate();
        let restored = KeyPair::from_secret_bytes(&kp.secret_key.secret_bytes()).unwrap();

        assert_eq!(kp.public_key, restored.public_key);
        assert_eq!(kp.address, restored.address);
        assert!(KeyPair::from_secret_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let sig = kp.sign(b"pay bob 10");

        assert!(verify(&kp.public_key, b"pay bob 10", &sig));
        assert!(!verify(&kp.public_key, b"pay bob 11", &sig));
        assert!(!verify(&other.public_key, b"pay bob 10", &sig));
        assert!(!verify(&kp.public_key, b"pay bob 10", &[]));
        assert!(!verify(&kp.public_key, b"pay bob 10", &[0x30, 0x01, 0x02]));
    }

    #[test]
    fn test_keystore() {
        let mut ks = Keystore::new();

        assert_eq!(ks.count(), 0);

        let addr1 = ks.new_address();
        assert_eq!(ks.count(), 1);
        assert!(ks.get_keypair(&addr1).is_some());

        let addr2 = ks.new_address();
        assert_eq!(ks.count(), 2);

        let kp2 = ks.get_keypair(&addr2).unwrap();
        assert_eq!(ks.find_by_public_key(&kp2.public_key).unwrap().address, addr2);
        assert!(ks.find_by_public_key(&KeyPair::generate().public_key).is_none());

        let addresses = ks.list_addresses();
        assert_eq!(addresses.len(), 2);
        assert!(addresses.windows(2).all(|w| w[0] <= w[1]));
    }
}
