//! SMTP delivery through a STARTTLS relay.
//!
//! Addresses are parsed when the notifier is built, so a bad sender or
//! recipient is a startup error rather than a lost report.

use crate::{Notifier, NotifyError, Report};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Relay endpoint, credentials, and envelope. Values are redacted in `Debug`.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &"<REDACTED>")
            .field("password", &"<REDACTED>")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::Address {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&settings.from)?;
        let to = settings
            .to
            .iter()
            .map(|a| parse_mailbox(a))
            .collect::<Result<Vec<_>, _>>()?;
        if to.is_empty() {
            return Err(NotifyError::Build("no recipients configured".to_string()));
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }

    fn build_message(&self, report: &Report) -> Result<Message, NotifyError> {
        build_message(&self.from, &self.to, report)
    }
}

pub(crate) fn build_message(
    from: &Mailbox,
    to: &[Mailbox],
    report: &Report,
) -> Result<Message, NotifyError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(report.subject.clone())
        .header(ContentType::TEXT_HTML);
    for rcpt in to {
        builder = builder.to(rcpt.clone());
    }
    builder
        .body(report.html.clone())
        .map_err(|e| NotifyError::Build(e.to_string()))
}

#[async_trait::async_trait]
impl Notifier for SmtpNotifier {
    fn channel_name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, report: &Report) -> Result<(), NotifyError> {
        let message = self.build_message(report)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}
