use std::collections::HashMap;

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpSettings;
use crate::errors::InternalError;
use crate::errors::internal::EmailError;

pub const PASSWORD_RESET_OTP_TEMPLATE: &str = "password_reset_otp";

/// Outgoing mail collaborator
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Render `template` with `variables` and deliver it to `recipient`
    async fn send(
        &self,
        template: &str,
        recipient: &str,
        variables: &HashMap<String, String>,
    ) -> Result<(), InternalError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

fn variable<'a>(variables: &'a HashMap<String, String>, key: &str) -> Result<&'a str, EmailError> {
    variables
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| EmailError::Build(format!("missing template variable '{}'", key)))
}

/// Render a known template into subject and plain-text body
pub fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> Result<RenderedEmail, EmailError> {
    match template {
        PASSWORD_RESET_OTP_TEMPLATE => {
            let name = variables.get("name").map(String::as_str).unwrap_or("there");
            let otp = variable(variables, "otp")?;
            let minutes = variable(variables, "expires_in_minutes")?;
            Ok(RenderedEmail {
                subject: "Password reset code".to_string(),
                body: format!(
                    "Hello {name},\n\n\
                     Use the following code to reset your password:\n\n\
                     {otp}\n\n\
                     The code is valid for {minutes} minutes. If you did not request a \
                     password reset, you can ignore this email.\n"
                ),
            })
        }
        other => Err(EmailError::UnknownTemplate(other.to_string())),
    }
}

/// Delivers mail through an SMTP relay
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(settings: &SmtpSettings, from: &str) -> Result<Self, InternalError> {
        let from = from.parse::<Mailbox>().map_err(|e| EmailError::Address {
            address: from.to_string(),
            reason: e.to_string(),
        })?;

        // Port 465 speaks implicit TLS, everything else upgrades with STARTTLS
        let builder = if settings.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|e| EmailError::Transport(e.to_string()))?
        .port(settings.port);

        let builder = match (&settings.username, &settings.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(
        &self,
        template: &str,
        recipient: &str,
        variables: &HashMap<String, String>,
    ) -> Result<(), InternalError> {
        let rendered = render_template(template, variables)?;
        let to = recipient.parse::<Mailbox>().map_err(|e| EmailError::Address {
            address: recipient.to_string(),
            reason: e.to_string(),
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(rendered.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(rendered.body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        tracing::info!("Sent '{}' email to {}", template, recipient);
        Ok(())
    }
}

/// Used when no SMTP relay is configured; renders but never delivers
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(
        &self,
        template: &str,
        recipient: &str,
        variables: &HashMap<String, String>,
    ) -> Result<(), InternalError> {
        render_template(template, variables)?;
        tracing::warn!(
            "SMTP is not configured; '{}' email for {} was not delivered",
            template,
            recipient
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn otp_variables() -> HashMap<String, String> {
        HashMap::from([
            ("name".to_string(), "Ayu".to_string()),
            ("otp".to_string(), "123456".to_string()),
            ("expires_in_minutes".to_string(), "10".to_string()),
        ])
    }

    #[test]
    fn test_password_reset_template_contains_code_and_window() {
        let rendered = render_template(PASSWORD_RESET_OTP_TEMPLATE, &otp_variables()).unwrap();
        assert!(rendered.body.contains("123456"));
        assert!(rendered.body.contains("10 minutes"));
        assert!(rendered.body.contains("Hello Ayu"));
    }

    #[test]
    fn test_unknown_template_is_rejected() {
        match render_template("welcome", &otp_variables()) {
            Err(EmailError::UnknownTemplate(name)) => assert_eq!(name, "welcome"),
            other => panic!("Expected UnknownTemplate, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_variable_is_a_build_error() {
        let mut variables = otp_variables();
        variables.remove("otp");
        assert!(matches!(
            render_template(PASSWORD_RESET_OTP_TEMPLATE, &variables),
            Err(EmailError::Build(_))
        ));
    }

    #[tokio::test]
    async fn test_log_sender_accepts_known_template() {
        let sender = LogEmailSender;
        sender
            .send(PASSWORD_RESET_OTP_TEMPLATE, "ayu@example.com", &otp_variables())
            .await
            .unwrap();
    }

    #[test]
    fn test_smtp_sender_rejects_invalid_from_address() {
        let settings = SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: None,
            password: None,
        };
        assert!(SmtpEmailSender::new(&settings, "not an address").is_err());
    }
}
