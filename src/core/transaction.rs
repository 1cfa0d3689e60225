// Transaction data structures

use crate::wallet::KeyPair;
use secp256k1::PublicKey;

/// Value transfer between two public keys.
///
/// A transaction without a `source` is a reward: new value credited to the
/// miner of the block that carries it. Rewards are signed by the recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Sender, or `None` for a mining reward
    pub source: Option<PublicKey>,
    /// Receiver of the amount
    pub recipient: PublicKey,
    /// Amount moved; only positive amounts are valid
    pub amount: i64,
    /// DER-encoded ECDSA signature over [`Transaction::signing_message`]
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Create a transfer signed by `sender`
    pub fn new(sender: &KeyPair, recipient: PublicKey, amount: i64) -> Self {
        let source = Some(sender.public_key);
        let signature = sender.sign(&Self::signing_message(source.as_ref(), &recipient, amount));
        Self {
            source,
            recipient,
            amount,
            signature,
        }
    }

    /// Create a reward paying `amount` to the miner's own key
    pub fn reward(miner: &KeyPair, amount: i64) -> Self {
        let recipient = miner.public_key;
        let signature = miner.sign(&Self::signing_message(None, &recipient, amount));
        Self {
            source: None,
            recipient,
            amount,
            signature,
        }
    }

    /// Bytes covered by the signature: `source? ++ recipient ++ amount`
    pub fn signing_message(source: Option<&PublicKey>, recipient: &PublicKey, amount: i64) -> Vec<u8> {
        let mut buf = Vec::with_capacity(33 + 33 + 8);
        if let Some(source) = source {
            buf.extend_from_slice(&source.serialize());
        }
        buf.extend_from_slice(&recipient.serialize());
        buf.extend_from_slice(&amount.to_le_bytes());
        buf
    }

    /// Signing message for this transaction's current fields
    pub fn message(&self) -> Vec<u8> {
        Self::signing_message(self.source.as_ref(), &self.recipient, self.amount)
    }

    /// Check if this is a reward transaction
    pub fn is_reward(&self) -> bool {
        self.source.is_none()
    }

    /// Key the signature is checked against
    pub fn signer(&self) -> &PublicKey {
        self.source.as_ref().unwrap_or(&self.recipient)
    }

    /// Append the hashed encoding of this transaction to `buf`
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.message());
        buf.extend_from_slice(&(self.signature.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.signature);
    }
}
