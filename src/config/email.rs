// src/config/email.rs
use crate::error::ConfigError;

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// SMTP credentials and recipients, read from the environment only.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender: String,
    pub password: String,
    pub recipients: Vec<String>,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipients", &self.recipients)
            .finish()
    }
}

impl EmailConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Every missing variable is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let get = |key: &str| lookup(key).ok().filter(|v| !v.trim().is_empty());

        let sender = get("SENDER_EMAIL");
        let password = get("SENDER_PASSWORD");
        let recipients = get("RECIPIENT_EMAIL");

        let mut missing = Vec::new();
        for (key, v) in [
            ("SENDER_EMAIL", &sender),
            ("SENDER_PASSWORD", &password),
            ("RECIPIENT_EMAIL", &recipients),
        ] {
            if v.is_none() {
                missing.push(key.to_string());
            }
        }
        let (Some(sender), Some(password), Some(recipients)) = (sender, password, recipients)
        else {
            return Err(ConfigError::MissingEnvVars(missing));
        };

        let recipients: Vec<String> = recipients
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if recipients.is_empty() {
            return Err(ConfigError::InvalidEnvVar {
                var: "RECIPIENT_EMAIL".into(),
                reason: "no addresses".into(),
            });
        }

        let smtp_host = get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string());
        let smtp_port = match get("SMTP_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidEnvVar {
                var: "SMTP_PORT".into(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            smtp_host,
            smtp_port,
            sender: sender.trim().to_string(),
            password,
            recipients,
        })
    }
}
