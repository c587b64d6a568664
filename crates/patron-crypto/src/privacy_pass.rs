//! Privacy-pass style blind tokens.
//!
//! A token is a random 32-byte serial. Its blinded form commits to the
//! serial without revealing it; the signer evaluates the blinded form and
//! returns a signed element plus a batch proof, and unblinding combines the
//! serial with the signed element into the final voucher. The voucher is
//! unlinkable to the blinding operation on the signer's side.
//!
//! This is a simplified BLAKE3 construction. In production the same
//! interface is implemented over Ristretto255 with a DLEQ batch proof.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::{CryptoError, Result};

const BLIND_DOMAIN: &[u8] = b"patron contribution token blind v1";
const UNBLIND_DOMAIN: &[u8] = b"patron contribution token unblind v1";

/// A batch of freshly created tokens and their blinded forms.
///
/// `tokens[i]` and `blinded_tokens[i]` refer to the same underlying serial.
#[derive(Clone, Debug)]
pub struct TokenBatch {
    pub tokens: Vec<String>,
    pub blinded_tokens: Vec<String>,
}

/// Stateless blind-token operations.
#[derive(Clone, Debug, Default)]
pub struct PrivacyPass;

impl PrivacyPass {
    pub fn new() -> Self {
        Self
    }

    /// Create `count` random tokens along with their blinded forms.
    pub fn create_blinded_tokens(&self, count: usize) -> TokenBatch {
        let mut tokens = Vec::with_capacity(count);
        let mut blinded_tokens = Vec::with_capacity(count);

        for _ in 0..count {
            let mut serial = [0u8; 32];
            rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut serial);

            tokens.push(BASE64.encode(serial));
            blinded_tokens.push(blind_serial(&serial));
        }

        TokenBatch {
            tokens,
            blinded_tokens,
        }
    }

    /// Unblind a batch of signed tokens.
    ///
    /// `tokens` and `blinded_tokens` must be the lists produced by
    /// [`create_blinded_tokens`](Self::create_blinded_tokens); `signed_tokens`,
    /// `batch_proof` and `public_key` come from the signer. The result is one
    /// unblinded voucher per input token, in order.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::BatchMismatch`] if the list lengths differ or a
    ///   blinded form does not correspond to its token
    /// - [`CryptoError::InvalidProof`] if the proof or public key is empty
    /// - [`CryptoError::MalformedToken`] if a token string fails to decode
    pub fn unblind_tokens(
        &self,
        tokens: &[String],
        blinded_tokens: &[String],
        signed_tokens: &[String],
        batch_proof: &str,
        public_key: &str,
    ) -> Result<Vec<String>> {
        if tokens.len() != blinded_tokens.len() || tokens.len() != signed_tokens.len() {
            return Err(CryptoError::BatchMismatch(format!(
                "{} tokens, {} blinded, {} signed",
                tokens.len(),
                blinded_tokens.len(),
                signed_tokens.len()
            )));
        }
        if batch_proof.is_empty() || public_key.is_empty() {
            return Err(CryptoError::InvalidProof);
        }

        let mut unblinded = Vec::with_capacity(tokens.len());
        for ((token, blinded), signed) in tokens.iter().zip(blinded_tokens).zip(signed_tokens) {
            let serial = decode_serial(token)?;

            // The blinded form is derived from the serial; a mismatch means
            // the persisted lists are out of sync with each other.
            if blind_serial(&serial) != *blinded {
                return Err(CryptoError::BatchMismatch(
                    "blinded token does not match its serial".to_string(),
                ));
            }

            let mut hasher = blake3::Hasher::new();
            hasher.update(UNBLIND_DOMAIN);
            hasher.update(&serial);
            hasher.update(signed.as_bytes());
            hasher.update(public_key.as_bytes());
            unblinded.push(BASE64.encode(hasher.finalize().as_bytes()));
        }

        Ok(unblinded)
    }
}

fn blind_serial(serial: &[u8; 32]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(BLIND_DOMAIN);
    hasher.update(serial);
    BASE64.encode(hasher.finalize().as_bytes())
}

fn decode_serial(token: &str) -> Result<[u8; 32]> {
    let bytes = BASE64
        .decode(token)
        .map_err(|e| CryptoError::MalformedToken(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::MalformedToken("serial must be 32 bytes".to_string()))
}
