//! Access/refresh pair issuance and rotation.

use anyhow::Result;

use super::{Claims, Identity, TokenCodec, TokenVerifier};

/// A freshly minted access/refresh pair.
#[derive(Clone, Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Mints short-lived access and long-lived refresh tokens from an identity
/// claim set, and rotates pairs on refresh.
///
/// Rotation is reissue-only: the scheme is stateless, so a prior refresh
/// token stays redeemable until its expiry. Callers needing hard revocation
/// must layer a denylist on top.
pub struct SessionIssuer {
    codec: TokenCodec,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(codec: TokenCodec, access_ttl_seconds: i64, refresh_ttl_seconds: i64) -> Self {
        Self {
            codec,
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_access(&self, identity: &Identity) -> Result<String> {
        self.codec.sign(identity, self.access_ttl_seconds)
    }

    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_refresh(&self, identity: &Identity) -> Result<String> {
        self.codec.sign(identity, self.refresh_ttl_seconds)
    }

    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue_access(identity)?,
            refresh: self.issue_refresh(identity)?,
        })
    }

    /// Verify an access token through the main codec backend.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Claims> {
        self.codec.verify(token)
    }

    /// Exchange a refresh token for a brand-new pair carrying the same
    /// identity claims. `Ok(None)` means the presented token was invalid or
    /// expired and the caller must require a full re-login.
    ///
    /// # Errors
    /// Returns an error only when minting the replacement pair fails.
    pub fn rotate(&self, refresh_token: &str) -> Result<Option<TokenPair>> {
        let Some(claims) = self.codec.verify(refresh_token) else {
            return Ok(None);
        };
        let pair = self.issue_pair(&claims.identity())?;
        Ok(Some(pair))
    }
}
