//! Order confirmation email delivery via SMTP.
//!
//! [`SmtpNotifier`] wraps the `lettre` async SMTP transport. Configuration
//! comes from environment variables; if `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and the service runs without a
//! notifier (buyers still download through their token; only the email is
//! skipped).

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for confirmation email failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@beatstore.local";

/// Configuration for the SMTP notifier.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable        | Required | Default                   |
    /// |-----------------|----------|---------------------------|
    /// | `SMTP_HOST`     | yes      | —                         |
    /// | `SMTP_PORT`     | no       | `587`                     |
    /// | `SMTP_FROM`     | no       | `noreply@beatstore.local` |
    /// | `SMTP_USER`     | no       | —                         |
    /// | `SMTP_PASSWORD` | no       | —                         |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Message content
// ---------------------------------------------------------------------------

/// One purchased line item, as shown in the order summary.
#[derive(Debug, Clone)]
pub struct PurchaseLine {
    pub title: String,
    pub license_type: String,
    pub price_cents: i64,
}

/// A generated license document to attach.
#[derive(Debug, Clone)]
pub struct LicenseAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Everything needed to send one confirmation email.
#[derive(Debug, Clone)]
pub struct PurchaseEmail {
    pub to: String,
    pub customer_name: Option<String>,
    /// Full download URL (public base URL + token path).
    pub download_url: String,
    pub lines: Vec<PurchaseLine>,
    pub total_cents: i64,
    pub attachments: Vec<LicenseAttachment>,
}

/// Render the plain-text body of a confirmation email.
pub fn render_body(email: &PurchaseEmail) -> String {
    let name = email.customer_name.as_deref().unwrap_or("there");

    let mut body = String::new();
    body.push_str(&format!("Hey {name},\n\n"));
    body.push_str("Thank you for your purchase. Your beats are ready to download:\n\n");
    body.push_str(&format!("  {}\n\n", email.download_url));
    body.push_str("The link is valid for a limited time and number of downloads.\n\n");
    body.push_str("Order summary\n");
    body.push_str("-------------\n");
    for line in &email.lines {
        body.push_str(&format!(
            "  {} - {} - {}\n",
            line.title,
            line.license_type,
            format_usd(line.price_cents)
        ));
    }
    body.push_str(&format!("\nTotal: {}\n\n", format_usd(email.total_cents)));
    if !email.attachments.is_empty() {
        body.push_str("Your license agreement is attached as PDF.\n\n");
    }
    body.push_str("If you have any questions, reply to this email.\n");
    body
}

/// Cents to `$12.34`.
fn format_usd(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Capability to send the order confirmation. Fulfillment depends on this
/// seam, not on SMTP.
#[async_trait]
pub trait PurchaseNotifier: Send + Sync {
    async fn send_confirmation(&self, email: &PurchaseEmail) -> Result<(), NotifyError>;
}

/// Sends confirmation emails over SMTP.
pub struct SmtpNotifier {
    config: EmailConfig,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PurchaseNotifier for SmtpNotifier {
    async fn send_confirmation(&self, email: &PurchaseEmail) -> Result<(), NotifyError> {
        use lettre::message::header::ContentType;
        use lettre::message::{Attachment, MultiPart, SinglePart};
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

        let mut multipart = MultiPart::mixed().singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(render_body(email)),
        );
        for attachment in &email.attachments {
            multipart = multipart.singlepart(
                Attachment::new(attachment.filename.clone()).body(
                    attachment.bytes.clone(),
                    ContentType::parse("application/pdf").expect("static MIME type is valid"),
                ),
            );
        }

        let message = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(email.to.parse()?)
            .subject("Your Beat Purchase - Download Ready")
            .multipart(multipart)
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(message).await?;

        tracing::info!(to = %email.to, items = email.lines.len(), "Confirmation email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
