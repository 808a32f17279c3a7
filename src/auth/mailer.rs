use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};

use crate::config::SmtpConfig;

pub fn reset_email_body(raw_token: &str) -> String {
    format!(
        "Hello,\n\n\
        A password reset was requested for your Tourbook account.\n\n\
        Submit a PATCH request with your new password and its confirmation to:\n\n\
        /api/v1/auth/reset-password/{raw_token}\n\n\
        This token will expire in 10 minutes.\n\n\
        If you did not request a reset, you can ignore this email and your \
        password will remain unchanged.\n"
    )
}

/// Delivers the raw reset token over SMTP. Blocking; callers run it on a
/// blocking task.
pub fn send_reset_email(smtp: &SmtpConfig, to: &str, raw_token: &str) -> anyhow::Result<()> {
    let email = Message::builder()
        .from(smtp.from.parse()?)
        .to(to.parse()?)
        .subject("Your password reset token (valid for 10 minutes)")
        .header(ContentType::TEXT_PLAIN)
        .body(reset_email_body(raw_token))?;

    let mailer = SmtpTransport::relay(&smtp.host)?
        .credentials(Credentials::new(
            smtp.username.clone(),
            smtp.password.clone(),
        ))
        .build();

    mailer.send(&email)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_email_contains_token_and_expiry() {
        let body = reset_email_body("abc123def456");
        assert!(body.contains("abc123def456"));
        assert!(body.contains("expire in 10 minutes"));
        assert!(body.contains("did not request a reset"));
    }
}
