//! Credential sources for request signing

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::signer::Credential;

pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Supplies credentials for each signing operation.
///
/// The client asks once per signed request and never caches the answer, so
/// rotating providers take effect on the next call.
#[async_trait]
pub trait CredentialProvider: Send + Sync + std::fmt::Debug {
    async fn credential(&self) -> Result<Credential>;

    /// Human-readable source name
    fn name(&self) -> &'static str;
}

/// Fixed credentials supplied by the caller
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn credential(&self) -> Result<Credential> {
        Ok(self.credential.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Reads the standard `AWS_*` variables on every call
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    pub fn new() -> Self {
        Self
    }
}

fn read_var(variable: &'static str) -> Result<Option<String>> {
    match std::env::var(variable) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => {
            tracing::warn!(variable, error = %e, "Unreadable credential variable");
            Err(Error::MissingCredential { variable })
        }
    }
}

fn require_var(variable: &'static str) -> Result<String> {
    read_var(variable)?.ok_or(Error::MissingCredential { variable })
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn credential(&self) -> Result<Credential> {
        let access_key_id = require_var(ENV_ACCESS_KEY_ID)?;
        let secret_access_key = require_var(ENV_SECRET_ACCESS_KEY)?;
        let mut credential = Credential::new(access_key_id, secret_access_key);
        if let Some(token) = read_var(ENV_SESSION_TOKEN)? {
            credential = credential.with_session_token(token);
        }
        tracing::debug!(
            access_key_id = %credential.access_key_id,
            has_session_token = credential.session_token.is_some(),
            "Loaded credentials from environment"
        );
        Ok(credential)
    }

    fn name(&self) -> &'static str {
        "env"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_returns_credential() {
        let provider = StaticCredentialProvider::new(
            Credential::new("AKID", "secret").with_session_token("token"),
        );
        let cred = provider.credential().await.unwrap();
        assert_eq!(cred.access_key_id, "AKID");
        assert_eq!(cred.secret_access_key(), "secret");
        assert_eq!(cred.session_token.as_deref(), Some("token"));
        assert_eq!(provider.name(), "static");
    }

    // Single test so the process-wide variables are not raced by siblings
    #[tokio::test]
    async fn test_env_provider() {
        let provider = EnvCredentialProvider::new();
        assert_eq!(provider.name(), "env");

        unsafe {
            std::env::remove_var(ENV_ACCESS_KEY_ID);
            std::env::remove_var(ENV_SECRET_ACCESS_KEY);
            std::env::remove_var(ENV_SESSION_TOKEN);
        }
        let err = provider.credential().await.unwrap_err();
        assert!(matches!(
            err,
            Error::MissingCredential {
                variable: ENV_ACCESS_KEY_ID
            }
        ));

        unsafe { std::env::set_var(ENV_ACCESS_KEY_ID, "AKIDENV") };
        let err = provider.credential().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing credential: AWS_SECRET_ACCESS_KEY is not set"
        );

        unsafe { std::env::set_var(ENV_SECRET_ACCESS_KEY, "envsecret") };
        let cred = provider.credential().await.unwrap();
        assert_eq!(cred.access_key_id, "AKIDENV");
        assert_eq!(cred.secret_access_key(), "envsecret");
        assert!(cred.session_token.is_none());

        unsafe { std::env::set_var(ENV_SESSION_TOKEN, "envtoken") };
        let cred = provider.credential().await.unwrap();
        assert_eq!(cred.session_token.as_deref(), Some("envtoken"));

        unsafe {
            std::env::remove_var(ENV_ACCESS_KEY_ID);
            std::env::remove_var(ENV_SECRET_ACCESS_KEY);
            std::env::remove_var(ENV_SESSION_TOKEN);
        }
    }
}
