use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use tracing::debug;

use crate::utils::keccak::keccak256;

#[derive(Debug, thiserror::Error)]
pub enum SigServiceError {
    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("Signature must be 65 bytes or 64 compact bytes, got {0}")]
    InvalidLength(usize),
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    #[error("Invalid ECDSA signature: {0}")]
    InvalidSignature(String),
    #[error("Signature recovery failed: {0}")]
    RecoveryFailed(String),
}

pub type SigServiceResult<T> = Result<T, SigServiceError>;

pub struct SignatureService;

impl SignatureService {
    /// EIP-191 `personal_sign` digest of `message`.
    pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
        let mut prefixed = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
        prefixed.extend_from_slice(message);
        keccak256(&prefixed)
    }

    /// Lowercase `0x` address derived from a secp256k1 public key.
    pub fn address_from_key(key: &VerifyingKey) -> String {
        let encoded = key.to_encoded_point(false);
        let hash = keccak256(&encoded.as_bytes()[1..]);
        format!("0x{}", hex::encode(&hash[12..]))
    }

    /// Recovers the address that produced `signature_hex` over `message`.
    pub fn recover_address(message: &[u8], signature_hex: &str) -> SigServiceResult<String> {
        let sig_hex = signature_hex.trim();
        let sig_hex = sig_hex.strip_prefix("0x").unwrap_or(sig_hex);
        let mut sig_bytes = hex::decode(sig_hex)?;

        let y_odd = match sig_bytes.len() {
            65 => match sig_bytes[64] {
                0 | 27 => false,
                1 | 28 => true,
                other => return Err(SigServiceError::InvalidRecoveryId(other)),
            },
            // EIP-2098 compact form: the top bit of `s` is the y parity.
            64 => {
                let y_odd = sig_bytes[32] & 0x80 != 0;
                sig_bytes[32] &= 0x7f;
                y_odd
            }
            other => return Err(SigServiceError::InvalidLength(other)),
        };

        let mut signature = Signature::from_slice(&sig_bytes[..64]).map_err(|e| SigServiceError::InvalidSignature(e.to_string()))?;
        let mut recovery_id = RecoveryId::new(y_odd, false);

        // k256 only accepts low-S signatures; flipping S flips the parity of R's y.
        if let Some(normalized) = signature.normalize_s() {
            signature = normalized;
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
        }

        let digest = Self::personal_message_hash(message);
        let key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
            .map_err(|e| SigServiceError::RecoveryFailed(e.to_string()))?;
        let address = Self::address_from_key(&key);

        debug!(message_len = message.len(), recovered = %address, "SignatureService::recover_address");
        Ok(address)
    }
}
