//! EMR session: resolved credentials and endpoint, plus the signed submit path.
//!
//! `submit` runs one request end to end:
//! marshal the parameter tree, sign it, POST it through the
//! [`HttpTransport`], and translate a non-2xx reply into an [`EmrError`].

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{endpoint_host, CredentialSource, EnvCredentialSource, SessionConfig};
use crate::error::{EmrError, EmrErrorKind, EmrResult};
use crate::params::{marshal, ParamMap};
use crate::signing::SigV2Signer;
use crate::xml::ErrorDocument;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// The outbound HTTP collaborator. Non-2xx replies are returned, not raised;
/// only transport failures are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync + std::fmt::Debug {
    async fn post_form(&self, url: &str, body: String) -> EmrResult<HttpResponse>;
}

/// [`HttpTransport`] over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    user_agent: String,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(http)
    }

    pub fn with_client(http: Client) -> Self {
        Self {
            http,
            user_agent: "SortOfRemoteNG/1.0 emr-client/0.1".to_string(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_form(&self, url: &str, body: String) -> EmrResult<HttpResponse> {
        let resp = self
            .http
            .post(url)
            .header("content-type", FORM_CONTENT_TYPE)
            .header("user-agent", &self.user_agent)
            .body(body)
            .send()
            .await
            .map_err(EmrError::from)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(EmrError::from)?;
        Ok(HttpResponse { status, body })
    }
}

// ── Session ─────────────────────────────────────────────────────────────

/// Resolved credentials and endpoint. Never mutated after construction.
#[derive(Clone)]
pub struct EmrSession {
    access_key: String,
    secret_key: String,
    region: String,
    host: String,
    protocol: &'static str,
    transport: Arc<dyn HttpTransport>,
}

impl EmrSession {
    /// Build a session over the default reqwest transport.
    ///
    /// `fallback` supplies whichever key `config` leaves out.
    pub fn new(config: SessionConfig, fallback: Option<&dyn CredentialSource>) -> EmrResult<Self> {
        Self::with_transport(config, fallback, Arc::new(ReqwestTransport::new()))
    }

    /// Like [`new`](Self::new), falling back to `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`.
    pub fn from_env(config: SessionConfig) -> EmrResult<Self> {
        Self::new(config, Some(&EnvCredentialSource))
    }

    pub fn with_transport(
        config: SessionConfig,
        fallback: Option<&dyn CredentialSource>,
        transport: Arc<dyn HttpTransport>,
    ) -> EmrResult<Self> {
        let region = config.resolve_region()?;
        let credentials = config.resolve_credentials(fallback)?;
        let host = match config.endpoint_override {
            Some(ref host) if !host.trim().is_empty() => host.trim().to_string(),
            _ => endpoint_host(&region),
        };
        Ok(Self {
            access_key: credentials.access_key_id,
            secret_key: credentials.secret_access_key,
            region,
            host,
            protocol: config.protocol(),
            transport,
        })
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn protocol(&self) -> &str {
        self.protocol
    }

    /// `{protocol}://{host}/`
    pub fn url(&self) -> String {
        format!("{}://{}/", self.protocol, self.host)
    }

    pub fn signer(&self) -> SigV2Signer {
        SigV2Signer::new(&self.access_key, &self.secret_key, &self.host)
    }

    /// Sign and POST `params`, returning the response body on 2xx.
    ///
    /// 4xx replies become [`EmrErrorKind::InvalidArgument`] carrying the
    /// provider's message; any other non-2xx becomes
    /// [`EmrErrorKind::ServiceError`].
    pub async fn submit(&self, params: &ParamMap) -> EmrResult<String> {
        let flat = marshal(params)?;
        let signed = self.signer().sign_params(&flat, Utc::now());
        log::debug!(
            "EMR {} -> {} ({} signed params)",
            flat.get("Action").map(String::as_str).unwrap_or("<no action>"),
            self.host,
            signed.params.len()
        );

        let response = self.transport.post_form(&self.url(), signed.body).await?;
        if (200..300).contains(&response.status) {
            return Ok(response.body);
        }
        Err(translate_error(&response))
    }
}

/// Turn a non-2xx reply into an [`EmrError`].
fn translate_error(response: &HttpResponse) -> EmrError {
    let kind = if (400..500).contains(&response.status) {
        EmrErrorKind::InvalidArgument
    } else {
        EmrErrorKind::ServiceError
    };
    let doc = ErrorDocument::parse(&response.body);
    let message = if doc.message.is_empty() {
        log::warn!(
            "EMR returned HTTP {} without an error document",
            response.status
        );
        format!("HTTP {}", response.status)
    } else {
        doc.message
    };

    let mut err = EmrError::new(kind, message).with_status(response.status);
    if !doc.code.is_empty() {
        err = err.with_code(doc.code);
    }
    if !doc.request_id.is_empty() {
        err = err.with_request_id(doc.request_id);
    }
    log::warn!("EMR request rejected: {}", err);
    err
}

impl PartialEq for EmrSession {
    fn eq(&self, other: &Self) -> bool {
        self.access_key == other.access_key
            && self.secret_key == other.secret_key
            && self.host == other.host
            && self.protocol == other.protocol
    }
}

impl Eq for EmrSession {}

impl std::fmt::Debug for EmrSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmrSession")
            .field("access_key", &self.access_key)
            .field("region", &self.region)
            .field("host", &self.host)
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

/// In-memory transport for tests: records each request and replays a canned reply.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct RecordingTransport {
    reply: EmrResult<HttpResponse>,
    pub requests: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingTransport {
    pub fn replying(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
            requests: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn failing(err: EmrError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(err),
            requests: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn recorded(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Decoded `key -> value` pairs of the single recorded body.
    pub fn last_params(&self) -> std::collections::BTreeMap<String, String> {
        let (_, body) = self.recorded().pop().unwrap();
        body.split('&')
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap();
                let decode = |s: &str| {
                    percent_encoding::percent_decode_str(s)
                        .decode_utf8()
                        .unwrap()
                        .to_string()
                };
                (decode(k), decode(v))
            })
            .collect()
    }
}

#[cfg(test)]
#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn post_form(&self, url: &str, body: String) -> EmrResult<HttpResponse> {
        self.requests.lock().unwrap().push((url.to_string(), body));
        self.reply.clone()
    }
}
