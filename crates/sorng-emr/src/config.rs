//! Session configuration, credential resolution, and endpoint derivation.
//!
//! Credentials are taken from the explicit [`SessionConfig`] fields first and
//! fall back to an injected [`CredentialSource`]. The process environment is
//! only read when the caller passes an [`EnvCredentialSource`].

use serde::{Deserialize, Serialize};

use crate::error::{EmrError, EmrResult};

/// Region used when the configuration does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Environment variable holding the fallback access key id.
pub const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";

/// Environment variable holding the fallback secret access key.
pub const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";

// ── Credentials ─────────────────────────────────────────────────────────

/// Resolved, non-empty access key pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
        }
    }
}

// Keep the secret out of debug output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// A fallback provider consulted for whichever key the config leaves out.
pub trait CredentialSource {
    fn access_key_id(&self) -> Option<String>;
    fn secret_access_key(&self) -> Option<String>;
}

/// Reads `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialSource;

impl CredentialSource for EnvCredentialSource {
    fn access_key_id(&self) -> Option<String> {
        std::env::var(ACCESS_KEY_ENV).ok()
    }

    fn secret_access_key(&self) -> Option<String> {
        std::env::var(SECRET_KEY_ENV).ok()
    }
}

/// Fixed fallback values.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialSource {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl StaticCredentialSource {
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: Some(access_key_id.to_string()),
            secret_access_key: Some(secret_access_key.to_string()),
        }
    }
}

impl CredentialSource for StaticCredentialSource {
    fn access_key_id(&self) -> Option<String> {
        self.access_key_id.clone()
    }

    fn secret_access_key(&self) -> Option<String> {
        self.secret_access_key.clone()
    }
}

// ── Session configuration ───────────────────────────────────────────────

fn default_secure() -> bool {
    true
}

/// Everything needed to build an [`EmrSession`](crate::client::EmrSession).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Explicit access key id; falls back to the credential source.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Explicit secret access key; falls back to the credential source.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// AWS region. `None` means [`DEFAULT_REGION`]; a blank value is an error.
    #[serde(default)]
    pub region: Option<String>,
    /// Use `https` (default) or plain `http`.
    #[serde(default = "default_secure")]
    pub secure: bool,
    /// Replaces the derived endpoint host (LocalStack and similar).
    #[serde(default)]
    pub endpoint_override: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            region: None,
            secure: true,
            endpoint_override: None,
        }
    }
}

impl SessionConfig {
    /// Config with explicit credentials and the default region.
    pub fn with_keys(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: Some(access_key_id.to_string()),
            secret_access_key: Some(secret_access_key.to_string()),
            ..Self::default()
        }
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Resolve the region, rejecting a blank explicit value.
    pub fn resolve_region(&self) -> EmrResult<String> {
        match self.region {
            None => Ok(DEFAULT_REGION.to_string()),
            Some(ref r) if r.trim().is_empty() => Err(EmrError::missing_region()),
            Some(ref r) => Ok(r.trim().to_string()),
        }
    }

    /// Resolve both keys, consulting `fallback` for whichever is missing.
    pub fn resolve_credentials(
        &self,
        fallback: Option<&dyn CredentialSource>,
    ) -> EmrResult<Credentials> {
        let access = non_empty(self.access_key_id.clone())
            .or_else(|| fallback.and_then(|s| non_empty(s.access_key_id())))
            .ok_or_else(|| {
                EmrError::missing_credentials(format!(
                    "Please provide an access key or set {}.",
                    ACCESS_KEY_ENV
                ))
            })?;
        let secret = non_empty(self.secret_access_key.clone())
            .or_else(|| fallback.and_then(|s| non_empty(s.secret_access_key())))
            .ok_or_else(|| {
                EmrError::missing_credentials(format!(
                    "Please provide a secret key or set {}.",
                    SECRET_KEY_ENV
                ))
            })?;
        Ok(Credentials {
            access_key_id: access,
            secret_access_key: secret,
        })
    }

    pub fn protocol(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// The EMR endpoint host for a region: `elasticmapreduce.{region}.amazonaws.com`.
pub fn endpoint_host(region: &str) -> String {
    format!("elasticmapreduce.{}.amazonaws.com", region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_defaults_when_absent() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.resolve_region().unwrap(), "us-east-1");
    }

    #[test]
    fn blank_region_is_an_error() {
        let cfg = SessionConfig::default().region("  ");
        let err = cfg.resolve_region().unwrap_err();
        assert_eq!(err.kind, crate::error::EmrErrorKind::MissingRegion);
    }

    #[test]
    fn host_for_region() {
        assert_eq!(
            endpoint_host("eu-west-1"),
            "elasticmapreduce.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn explicit_credentials_win_over_fallback() {
        let cfg = SessionConfig::with_keys("AKIDEXPLICIT", "explicit-secret");
        let fallback = StaticCredentialSource::new("AKIDFALLBACK", "fallback-secret");
        let creds = cfg.resolve_credentials(Some(&fallback)).unwrap();
        assert_eq!(creds.access_key_id, "AKIDEXPLICIT");
        assert_eq!(creds.secret_access_key, "explicit-secret");
    }

    #[test]
    fn fallback_fills_each_missing_key() {
        let cfg = SessionConfig {
            access_key_id: Some("AKIDEXPLICIT".into()),
            ..SessionConfig::default()
        };
        let fallback = StaticCredentialSource::new("AKIDFALLBACK", "fallback-secret");
        let creds = cfg.resolve_credentials(Some(&fallback)).unwrap();
        assert_eq!(creds.access_key_id, "AKIDEXPLICIT");
        assert_eq!(creds.secret_access_key, "fallback-secret");
    }

    #[test]
    fn missing_access_key() {
        let err = SessionConfig::default().resolve_credentials(None).unwrap_err();
        assert_eq!(err.kind, crate::error::EmrErrorKind::MissingCredentials);
        assert!(err.message.contains("AWS_ACCESS_KEY_ID"));
    }

    #[test]
    fn missing_secret_key() {
        let fallback = StaticCredentialSource {
            access_key_id: Some("AKID".into()),
            secret_access_key: None,
        };
        let err = SessionConfig::default()
            .resolve_credentials(Some(&fallback))
            .unwrap_err();
        assert!(err.message.contains("AWS_SECRET_ACCESS_KEY"));
    }

    #[test]
    fn empty_explicit_key_counts_as_missing() {
        let cfg = SessionConfig::with_keys("", "secret");
        assert!(cfg.resolve_credentials(None).is_err());
    }

    #[test]
    fn protocol_follows_secure_flag() {
        assert_eq!(SessionConfig::default().protocol(), "https");
        assert_eq!(SessionConfig::default().secure(false).protocol(), "http");
    }

    #[test]
    fn config_deserialises_with_defaults() {
        let cfg: SessionConfig = serde_json::from_str(r#"{"region":"us-west-2"}"#).unwrap();
        assert!(cfg.secure);
        assert_eq!(cfg.region.as_deref(), Some("us-west-2"));
        assert!(cfg.access_key_id.is_none());
    }

    #[test]
    fn credentials_debug_redacts_secret() {
        let creds = Credentials::new("AKID", "super-secret");
        let dbg = format!("{:?}", creds);
        assert!(dbg.contains("AKID"));
        assert!(!dbg.contains("super-secret"));
    }
}
