//! Email delivery abstraction.
//!
//! Auth flows hand a recipient and a raw one-time token to an [`EmailSender`];
//! the sender builds the link and delivers it. Delivery is best-effort by
//! design: callers log failures and move on, they never retry or roll back
//! the triggering mutation.
//!
//! The default sender for local dev is [`LogEmailSender`], which logs and
//! returns `Ok(())`. When a mail endpoint and API key are configured,
//! [`HttpEmailSender`] posts the message as JSON to that endpoint.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::info;

/// Email delivery seam used by registration, resend, and password reset.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver the verification link for a fresh raw token.
    async fn send_verification_email(&self, to: &str, name: &str, raw_token: &str) -> Result<()>;
    /// Deliver the password-reset link for a fresh raw token.
    async fn send_password_reset_email(&self, to: &str, name: &str, raw_token: &str)
    -> Result<()>;
}

/// Build the verification link included in outbound emails.
#[must_use]
pub fn build_verify_url(public_base_url: &str, token: &str) -> String {
    let base = public_base_url.trim_end_matches('/');
    format!("{base}/verify-email?token={token}")
}

/// Build the password-reset link included in outbound emails.
#[must_use]
pub fn build_reset_url(public_base_url: &str, token: &str) -> String {
    let base = public_base_url.trim_end_matches('/');
    format!("{base}/reset-password?token={token}")
}

/// Local dev sender that logs the link instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender {
    public_base_url: String,
}

impl LogEmailSender {
    #[must_use]
    pub fn new(public_base_url: String) -> Self {
        Self { public_base_url }
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_verification_email(&self, to: &str, name: &str, raw_token: &str) -> Result<()> {
        info!(
            to_email = %to,
            name = %name,
            url = %build_verify_url(&self.public_base_url, raw_token),
            "verification email send stub"
        );
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        name: &str,
        raw_token: &str,
    ) -> Result<()> {
        info!(
            to_email = %to,
            name = %name,
            url = %build_reset_url(&self.public_base_url, raw_token),
            "password reset email send stub"
        );
        Ok(())
    }
}

/// Sender that posts messages to an HTTP mail endpoint.
pub struct HttpEmailSender {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    public_base_url: String,
}

impl HttpEmailSender {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: String, api_key: SecretString, public_base_url: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build mail HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            public_base_url,
        })
    }

    async fn deliver(&self, to: &str, subject: &str, html: String) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .context("mail endpoint request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("mail endpoint rejected message: {status}"));
        }
        Ok(())
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send_verification_email(&self, to: &str, name: &str, raw_token: &str) -> Result<()> {
        let url = build_verify_url(&self.public_base_url, raw_token);
        let html = format!(
            "<p>Hi {name},</p>\
             <p>Welcome to Demando. Confirm your email address within 24 hours:</p>\
             <p><a href=\"{url}\">Verify your email</a></p>"
        );
        self.deliver(to, "Verify your Demando account", html).await
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        name: &str,
        raw_token: &str,
    ) -> Result<()> {
        let url = build_reset_url(&self.public_base_url, raw_token);
        let html = format!(
            "<p>Hi {name},</p>\
             <p>Someone requested a password reset for your account. The link \
             expires in one hour; ignore this email if it wasn't you.</p>\
             <p><a href=\"{url}\">Reset your password</a></p>"
        );
        self.deliver(to, "Reset your Demando password", html).await
    }
}
