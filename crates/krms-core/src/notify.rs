// ── Email notifier stage ──
//
// One message to every recipient: plain-text and HTML renderings of the
// summary as alternatives, with the spreadsheet attached.

use std::path::Path;
use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::config::EmailConfig;
use crate::error::CoreError;
use crate::model::Summary;
use crate::report::html::{render_html, render_text};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn mailbox(addr: &str) -> Result<Mailbox, CoreError> {
    addr.parse()
        .map_err(|e| CoreError::email(format!("invalid address {addr:?}: {e}")))
}

/// Build the report message. Reads the attachment from disk.
pub fn compose(
    email: &EmailConfig,
    summary: &Summary,
    attachment: &Path,
) -> Result<Message, CoreError> {
    let bytes = std::fs::read(attachment).map_err(|e| {
        CoreError::email(format!("cannot read attachment {}: {e}", attachment.display()))
    })?;
    let filename = attachment
        .file_name()
        .map_or_else(|| "devices.xlsx".into(), |n| n.to_string_lossy().into_owned());
    let content_type = ContentType::parse(XLSX_MIME).map_err(CoreError::email)?;

    let mut builder = Message::builder()
        .from(mailbox(&email.from)?)
        .subject(email.subject.clone());
    for to in &email.to {
        builder = builder.to(mailbox(to)?);
    }

    builder
        .multipart(
            MultiPart::mixed()
                .multipart(MultiPart::alternative_plain_html(
                    render_text(summary).map_err(CoreError::email)?,
                    render_html(summary).map_err(CoreError::email)?,
                ))
                .singlepart(Attachment::new(filename).body(bytes, content_type)),
        )
        .map_err(CoreError::email)
}

fn transport(
    email: &EmailConfig,
    timeout: Duration,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, CoreError> {
    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&email.server)
        .port(email.port)
        .timeout(Some(timeout));

    if email.starttls {
        let params = TlsParameters::new(email.server.clone()).map_err(CoreError::email)?;
        builder = builder.tls(Tls::Required(params));
    }
    if let Some(ref login) = email.login {
        builder = builder.credentials(Credentials::new(
            login.username.clone(),
            login.password.expose_secret().to_owned(),
        ));
    }

    Ok(builder.build())
}

/// Compose and send the report in one SMTP session.
pub async fn send_report(
    email: &EmailConfig,
    summary: &Summary,
    attachment: &Path,
    timeout: Duration,
) -> Result<(), CoreError> {
    let message = compose(email, summary, attachment)?;
    let mailer = transport(email, timeout)?;

    debug!(
        server = %email.server,
        port = email.port,
        starttls = email.starttls,
        login = email.login.is_some(),
        "connecting to SMTP server"
    );
    let response = mailer.send(message).await.map_err(CoreError::email)?;
    info!(
        recipients = email.to.len(),
        code = %response.code(),
        "report email sent"
    );
    Ok(())
}
