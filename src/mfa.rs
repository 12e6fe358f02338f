use async_trait::async_trait;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

use crate::error::AwsxError;

#[async_trait]
pub trait ReadMfaToken {
    async fn read_mfa_token(&self, mfa_serial: &str) -> anyhow::Result<String>;
}

#[async_trait]
impl<T: ReadMfaToken + Sync + ?Sized> ReadMfaToken for &T {
    async fn read_mfa_token(&self, mfa_serial: &str) -> anyhow::Result<String> {
        (**self).read_mfa_token(mfa_serial).await
    }
}

pub struct TerminalMfaTokenReader;

#[async_trait]
impl ReadMfaToken for TerminalMfaTokenReader {
    async fn read_mfa_token(&self, mfa_serial: &str) -> anyhow::Result<String> {
        let prompt = format!("MFA token for {}", mfa_serial);
        let code = tokio::task::spawn_blocking(move || {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .validate_with(|code: &String| validate_token_code(code))
                .interact_text()
        })
        .await?
        .map_err(|e| match e {
            dialoguer::Error::IO(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                anyhow::Error::new(AwsxError::Cancelled)
            }
            dialoguer::Error::IO(e) => anyhow::Error::new(e),
        })?;

        Ok(code.trim().to_string())
    }
}

pub struct StaticMfaTokenReader {
    token: String,
}

impl<S: Into<String>> From<S> for StaticMfaTokenReader {
    fn from(s: S) -> Self {
        StaticMfaTokenReader { token: s.into() }
    }
}

#[async_trait]
impl ReadMfaToken for StaticMfaTokenReader {
    async fn read_mfa_token(&self, _mfa_serial: &str) -> anyhow::Result<String> {
        validate_token_code(&self.token).map_err(|e| anyhow::anyhow!(e))?;
        Ok(self.token.clone())
    }
}

/// MFA codes are six digits.
pub fn validate_token_code(code: &str) -> Result<(), String> {
    let code = code.trim();
    if code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err("MFA token must be 6 digits".to_string())
    }
}
