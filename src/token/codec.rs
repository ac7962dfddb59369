//! Signing codec for compact HMAC tokens.

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;

use super::{Claims, Identity, TokenVerifier, decode_claims, now_unix_seconds, split_segments};

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

/// Signs and verifies compact tokens with one shared secret.
pub struct TokenCodec {
    secret: SecretString,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Mint a token for `identity` valid for `ttl_seconds` from now.
    ///
    /// # Errors
    /// Returns an error if serialization or keying fails; never returns a
    /// partially signed token.
    pub fn sign(&self, identity: &Identity, ttl_seconds: i64) -> Result<String> {
        let iat = now_unix_seconds();
        let claims = Claims {
            sub: identity.sub,
            email: identity.email.clone(),
            role: identity.role,
            verified: identity.verified,
            iat,
            exp: iat.saturating_add(ttl_seconds),
        };
        self.sign_claims(&claims)
    }

    /// Sign fully formed claims. Exposed within the crate so tests can pin
    /// deterministic timestamps.
    pub(crate) fn sign_claims(&self, claims: &Claims) -> Result<String> {
        let header = serde_json::to_vec(&HEADER).context("failed to serialize token header")?;
        let payload = serde_json::to_vec(claims).context("failed to serialize token claims")?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|err| anyhow!("failed to key token signer: {err}"))?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    fn verify_at(&self, token: &str, now: i64) -> Option<Claims> {
        let (header, payload, signature) = split_segments(token)?;

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()).ok()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());

        let presented = URL_SAFE_NO_PAD.decode(signature.as_bytes()).ok()?;
        mac.verify_slice(&presented).ok()?;

        decode_claims(payload, now)
    }
}

impl TokenVerifier for TokenCodec {
    fn verify(&self, token: &str) -> Option<Claims> {
        self.verify_at(token, now_unix_seconds())
    }
}
