use sendgrid::SGClient;
use sendgrid::{Destination, Mail};
use std::env;
use tracing::{error, info, warn};

/// Outbound channel clients for the delivery worker. Either credential set
/// may be absent, in which case that channel degrades to logged mock mode —
/// useful in development and in CI.
#[derive(Clone)]
pub struct AlertNotifier {
    sendgrid_client: Option<SGClient>,
    twilio_client: Option<twilio::Client>,
    sms_from: String,
    email_from: String,
}

impl AlertNotifier {
    pub fn new() -> Self {
        let sendgrid_api_key = env::var("TWILIO_SENDGRID_API_KEY").ok();
        let twilio_account_sid = env::var("TWILIO_ACCOUNT_SID").ok();
        let twilio_auth_token = env::var("TWILIO_AUTH_TOKEN").ok();
        let sms_from = env::var("TWILIO_SMS_FROM_NUMBER").unwrap_or_default();
        let email_from = env::var("NOTIFICATION_EMAIL_FROM")
            .unwrap_or_else(|_| "alerts@zonepulse.io".to_string());

        let sendgrid_client = sendgrid_api_key.map(SGClient::new);

        let twilio_client = if let (Some(sid), Some(token)) = (twilio_account_sid, twilio_auth_token)
        {
            Some(twilio::Client::new(&sid, &token))
        } else {
            None
        };

        if sendgrid_client.is_none() {
            warn!("⚠️ SendGrid API key not found. Email notifications will be mocked.");
        }
        if twilio_client.is_none() {
            warn!("⚠️ Twilio credentials not found. SMS notifications will be mocked.");
        }

        Self {
            sendgrid_client,
            twilio_client,
            sms_from,
            email_from,
        }
    }

    pub async fn send_email(&self, to_email: &str, subject: &str, body: &str) -> Result<(), String> {
        let Some(client) = &self.sendgrid_client else {
            info!("(Mock) 📧 Would send email to: {}", to_email);
            info!("(Mock) Subject: {}", subject);
            crate::metrics::increment_notifications_sent("email");
            return Ok(());
        };

        // The sendgrid client is blocking; its Mail borrows, so everything
        // moves into the blocking task.
        let to_email = to_email.to_string();
        let subject = subject.to_string();
        let body = body.to_string();
        let email_from = self.email_from.clone();
        let client = client.clone();
        let to_email_log = to_email.clone();

        match tokio::task::spawn_blocking(move || {
            let mail = Mail::new()
                .add_to(Destination {
                    address: &to_email,
                    name: "Facilities Manager",
                })
                .add_from(&email_from)
                .add_subject(&subject)
                .add_html(&body);
            client.send(mail)
        })
        .await
        {
            Ok(Ok(_)) => {
                info!("✅ Email sent successfully to {}", to_email_log);
                crate::metrics::increment_notifications_sent("email");
                Ok(())
            }
            Ok(Err(e)) => {
                error!("❌ Failed to send email: {}", e);
                crate::metrics::increment_notifications_failed("email");
                Err(format!("SendGrid Error: {}", e))
            }
            Err(e) => Err(format!("Task Join Error: {}", e)),
        }
    }

    pub async fn send_sms(&self, to_number: &str, body: &str) -> Result<(), String> {
        let Some(client) = &self.twilio_client else {
            info!("(Mock) 📱 Would send SMS to: {}", to_number);
            info!("(Mock) Body: {}", body);
            crate::metrics::increment_notifications_sent("sms");
            return Ok(());
        };

        if self.sms_from.is_empty() {
            return Err("TWILIO_SMS_FROM_NUMBER not set".to_string());
        }

        match client
            .send_message(twilio::OutboundMessage::new(&self.sms_from, to_number, body))
            .await
        {
            Ok(_) => {
                info!("✅ SMS sent successfully to {}", to_number);
                crate::metrics::increment_notifications_sent("sms");
                Ok(())
            }
            Err(e) => {
                error!("❌ Failed to send SMS: {}", e);
                crate::metrics::increment_notifications_failed("sms");
                Err(format!("Twilio Error: {}", e))
            }
        }
    }
}

impl Default for AlertNotifier {
    fn default() -> Self {
        Self::new()
    }
}
