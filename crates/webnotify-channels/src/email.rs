//! Email channel — SMTP submission via `lettre`.
//!
//! One plain-text message per notification with the fixed subject
//! `Notification`, sent to a single recipient through an authenticated relay
//! (PLAIN mechanism). Port 465 uses implicit TLS; every other port must
//! upgrade with STARTTLS. A relay that does not offer STARTTLS is refused
//! before any credentials are sent.
//!
//! The SMTP exchange runs as its own task. `notify` returns on whichever
//! comes first: the task's result or the context finishing. In the latter
//! case the task keeps running detached and its result is dropped.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use webnotify_core::config::NotifierConfig;
use webnotify_core::error::BoxError;
use webnotify_core::utils::truncate_string;
use webnotify_core::{ChannelKind, Context, NotifyError};

use crate::base::Sender;

// ─────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────

/// Subject line of every notification email.
pub const NOTIFICATION_SUBJECT: &str = "Notification";

/// SMTPS port (TLS from the first byte).
const IMPLICIT_TLS_PORT: u16 = 465;

// ─────────────────────────────────────────────
// Transport seam
// ─────────────────────────────────────────────

/// A fully addressed message, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Something that can submit an `OutgoingMail`.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), BoxError>;
}

/// Authenticated SMTP submission through lettre.
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish()
    }
}

impl SmtpMailer {
    pub fn new(host: &str, port: u16, username: &str, password: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn from_config(config: &NotifierConfig) -> Self {
        Self::new(
            &config.smtp_host,
            config.smtp_port,
            &config.smtp_username,
            &config.smtp_password,
        )
    }

    /// Build the lettre message: `From`, `To`, `Subject`, plain-text body.
    fn build_message(mail: OutgoingMail) -> Result<lettre::Message, BoxError> {
        use lettre::message::{header::ContentType, Mailbox};

        let from: Mailbox = mail
            .from
            .parse()
            .map_err(|e| format!("invalid from address '{}': {}", mail.from, e))?;
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| format!("invalid to address '{}': {}", mail.to, e))?;

        let message = lettre::Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)?;
        Ok(message)
    }

    /// Build the SMTP transport for this relay.
    fn transport(
        &self,
    ) -> Result<lettre::AsyncSmtpTransport<lettre::Tokio1Executor>, BoxError> {
        use lettre::transport::smtp::authentication::{Credentials, Mechanism};
        use lettre::transport::smtp::client::{Tls, TlsParameters};
        use lettre::{AsyncSmtpTransport, Tokio1Executor};

        let params = TlsParameters::new(self.host.clone())?;
        let tls = if self.port == IMPLICIT_TLS_PORT {
            Tls::Wrapper(params)
        } else {
            Tls::Required(params)
        };

        let creds = Credentials::new(self.username.clone(), self.password.clone());

        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(self.host.as_str())
                .port(self.port)
                .tls(tls)
                .credentials(creds)
                .authentication(vec![Mechanism::Plain])
                .build(),
        )
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), BoxError> {
        use lettre::AsyncTransport;

        let message = Self::build_message(mail)?;
        let transport = self.transport()?;
        transport.send(message).await?;
        Ok(())
    }
}

// ─────────────────────────────────────────────
// EmailSender
// ─────────────────────────────────────────────

/// Sends every notification to one configured recipient.
pub struct EmailSender {
    from: String,
    to: String,
    /// Relay `host:port`, for logs.
    relay: String,
    transport: Arc<dyn MailTransport>,
}

impl std::fmt::Debug for EmailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSender")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("relay", &self.relay)
            .finish()
    }
}

impl EmailSender {
    /// Create a sender that submits through the configured SMTP relay.
    ///
    /// The caller is expected to have checked `config.is_valid_email()`.
    pub fn new(config: &NotifierConfig) -> Self {
        Self::with_transport(config, Arc::new(SmtpMailer::from_config(config)))
    }

    /// Create a sender with a custom transport.
    pub fn with_transport(config: &NotifierConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            from: config.from_email.clone(),
            to: config.to_email.clone(),
            relay: format!("{}:{}", config.smtp_host, config.smtp_port),
            transport,
        }
    }

    /// Address the notification.
    fn compose(&self, message: &str) -> OutgoingMail {
        OutgoingMail {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: NOTIFICATION_SUBJECT.to_string(),
            body: message.to_string(),
        }
    }
}

#[async_trait]
impl Sender for EmailSender {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn notify(&self, ctx: &Context, message: &str) -> Result<(), NotifyError> {
        if let Some(reason) = ctx.err() {
            debug!(to = %self.to, reason = %reason, "email not started, context already done");
            return Err(NotifyError::SendCancelled {
                channel: ChannelKind::Email,
                source: reason,
            });
        }

        debug!(
            to = %self.to,
            relay = %self.relay,
            preview = %truncate_string(message, 60),
            "email send requested"
        );

        let mail = self.compose(message);
        let transport = Arc::clone(&self.transport);
        let mut handle = tokio::spawn(async move { transport.send(mail).await });

        tokio::select! {
            biased;

            joined = &mut handle => match joined {
                Ok(Ok(())) => {
                    info!(to = %self.to, relay = %self.relay, "email sent");
                    Ok(())
                }
                Ok(Err(e)) => {
                    error!(to = %self.to, relay = %self.relay, error = %e, "SMTP send failed");
                    Err(NotifyError::delivery(ChannelKind::Email, e))
                }
                Err(e) => {
                    error!(to = %self.to, error = %e, "SMTP task failed");
                    Err(NotifyError::delivery(ChannelKind::Email, e.to_string()))
                }
            },

            reason = ctx.done() => {
                // Dropping the handle detaches the task; its result is discarded.
                warn!(
                    to = %self.to,
                    reason = %reason,
                    "email wait abandoned, SMTP exchange continues in background"
                );
                Err(NotifyError::SendCancelled {
                    channel: ChannelKind::Email,
                    source: reason,
                })
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;
    use webnotify_core::ContextError;

    /// Records every mail; optionally slow or failing.
    #[derive(Default)]
    struct RecordingTransport {
        delay: Duration,
        fail_with: Option<&'static str>,
        attempts: AtomicUsize,
        delivered: Mutex<Vec<OutgoingMail>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, mail: OutgoingMail) -> Result<(), BoxError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if let Some(msg) = self.fail_with {
                return Err(msg.into());
            }
            self.delivered.lock().await.push(mail);
            Ok(())
        }
    }

    fn make_config() -> NotifierConfig {
        NotifierConfig {
            smtp_host: "smtp.example.com".into(),
            smtp_port: 587,
            smtp_username: "bot@example.com".into(),
            smtp_password: "password".into(),
            from_email: "bot@example.com".into(),
            to_email: "ops@example.com".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_notify_composes_notification_mail() {
        let transport = Arc::new(RecordingTransport::default());
        let sender = EmailSender::with_transport(&make_config(), transport.clone());

        sender
            .notify(&Context::background(), "Backup finished")
            .await
            .unwrap();

        let delivered = transport.delivered.lock().await;
        assert_eq!(
            delivered.as_slice(),
            [OutgoingMail {
                from: "bot@example.com".into(),
                to: "ops@example.com".into(),
                subject: "Notification".into(),
                body: "Backup finished".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_delivery_failed() {
        let transport = Arc::new(RecordingTransport {
            fail_with: Some("535 5.7.8 authentication failed"),
            ..Default::default()
        });
        let sender = EmailSender::with_transport(&make_config(), transport.clone());

        let err = sender.notify(&Context::background(), "hi").await.unwrap_err();
        assert!(matches!(
            err,
            NotifyError::DeliveryFailed { channel: ChannelKind::Email, .. }
        ));
        assert!(err.to_string().contains("authentication failed"));
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pre_cancelled_context_does_not_send() {
        let transport = Arc::new(RecordingTransport::default());
        let sender = EmailSender::with_transport(&make_config(), transport.clone());

        let ctx = Context::background();
        ctx.cancel();

        let err = sender.notify(&ctx, "hi").await.unwrap_err();
        assert!(matches!(
            err,
            NotifyError::SendCancelled { source: ContextError::Canceled, .. }
        ));
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_abandons_wait_but_send_completes_in_background() {
        let transport = Arc::new(RecordingTransport {
            delay: Duration::from_secs(10),
            ..Default::default()
        });
        let sender = EmailSender::with_transport(&make_config(), transport.clone());

        let ctx = Context::with_timeout(Duration::from_millis(100));
        let start = tokio::time::Instant::now();
        let err = sender.notify(&ctx, "slow relay").await.unwrap_err();

        assert!(matches!(
            err,
            NotifyError::SendCancelled { source: ContextError::DeadlineExceeded, .. }
        ));
        assert!(start.elapsed() < Duration::from_secs(1));

        // The detached exchange still runs to completion.
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(transport.delivered.lock().await.len(), 1);
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let mail = OutgoingMail {
            from: "not an address".into(),
            to: "ops@example.com".into(),
            subject: NOTIFICATION_SUBJECT.into(),
            body: "x".into(),
        };
        let err = SmtpMailer::build_message(mail).unwrap_err();
        assert!(err.to_string().contains("invalid from address"));
    }

    #[test]
    fn test_build_message_headers() {
        let mail = OutgoingMail {
            from: "bot@example.com".into(),
            to: "ops@example.com".into(),
            subject: NOTIFICATION_SUBJECT.into(),
            body: "Disk almost full".into(),
        };
        let message = SmtpMailer::build_message(mail).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("Subject: Notification"));
        assert!(raw.contains("Disk almost full"));
    }

    #[test]
    fn test_debug_hides_password() {
        let mailer = SmtpMailer::from_config(&make_config());
        assert!(!format!("{:?}", mailer).contains("password"));
    }

    /// Minimal SMTP server that never offers STARTTLS. Returns every
    /// command line it received once the client hangs up.
    async fn plaintext_relay() -> (u16, tokio::task::JoinHandle<Vec<String>>) {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read).lines();
            let mut received = Vec::new();

            write.write_all(b"220 relay.test ESMTP\r\n").await.unwrap();
            while let Ok(Some(line)) = lines.next_line().await {
                let reply = if line.starts_with("EHLO") {
                    "250-relay.test\r\n250 AUTH PLAIN\r\n"
                } else if line.starts_with("AUTH") {
                    "235 2.7.0 accepted\r\n"
                } else if line.starts_with("QUIT") {
                    "221 bye\r\n"
                } else {
                    "250 ok\r\n"
                };
                received.push(line);
                if write.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
            received
        });

        (port, handle)
    }

    #[tokio::test]
    async fn test_relay_without_starttls_never_sees_credentials() {
        let (port, relay) = plaintext_relay().await;
        let mut config = make_config();
        config.smtp_host = "127.0.0.1".into();
        config.smtp_port = port;
        let sender = EmailSender::new(&config);

        let err = tokio::time::timeout(
            Duration::from_secs(10),
            sender.notify(&Context::background(), "hi"),
        )
        .await
        .unwrap()
        .unwrap_err();
        assert!(matches!(
            err,
            NotifyError::DeliveryFailed { channel: ChannelKind::Email, .. }
        ));

        let received = tokio::time::timeout(Duration::from_secs(10), relay)
            .await
            .unwrap()
            .unwrap();
        assert!(received.iter().any(|l| l.starts_with("EHLO")));
        assert!(received.iter().all(|l| !l.starts_with("AUTH")));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_delivery_failed() {
        let mut config = make_config();
        config.smtp_host = "127.0.0.1".into();
        config.smtp_port = 9;
        let sender = EmailSender::new(&config);

        let err = sender.notify(&Context::background(), "hi").await.unwrap_err();
        assert!(matches!(
            err,
            NotifyError::DeliveryFailed { channel: ChannelKind::Email, .. }
        ));
    }
}
