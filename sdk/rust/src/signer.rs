//! AWS Signature Version 4 request signing
//!
//! Signs with `SignedHeaders=host` only: the canonical request covers the
//! method, path, canonical query, host header and body digest. The timestamp
//! comes from an injected [`Clock`] so signatures are reproducible.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, SubsecRound, Utc};
use hmac::{Hmac, Mac};
use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{Error, Result};
use crate::escape::aws_canonical_query;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const DATE_HEADER: &str = "X-Amz-Date";
pub const SECURITY_TOKEN_HEADER: &str = "X-Amz-Security-Token";

const SCOPE_TERMINATOR: &str = "aws4_request";
const SIGNED_HEADERS: &str = "host";

/// Access key pair with optional session token
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_key_id: String,
    secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credential {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Time source for signing
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock UTC time truncated to whole seconds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Region and service a signature is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningScope {
    pub region: String,
    pub service: String,
}

impl SigningScope {
    /// Derive the scope from a `<prefix>.<region>.<service>.amazonaws.com` host
    pub fn from_host(host: &str) -> Result<Self> {
        static HOST_RE: OnceLock<Regex> = OnceLock::new();
        let re = HOST_RE.get_or_init(|| {
            Regex::new(r"^[^.]+\.(?P<region>[^.]+)\.(?P<service>[^.]+)\.amazonaws\.com$")
                .expect("Invalid regex")
        });

        let caps = re.captures(host).ok_or_else(|| Error::MalformedHost {
            host: host.to_string(),
        })?;
        Ok(Self {
            region: caps["region"].to_string(),
            service: caps["service"].to_string(),
        })
    }
}

/// Headers produced by signing a request
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub security_token: Option<String>,
}

impl SignatureHeaders {
    /// `(name, value)` pairs in emission order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (AUTHORIZATION_HEADER, Some(self.authorization.as_str())),
            (DATE_HEADER, Some(self.amz_date.as_str())),
            (SECURITY_TOKEN_HEADER, self.security_token.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
    }
}

impl fmt::Debug for SignatureHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureHeaders")
            .field("authorization", &self.authorization)
            .field("amz_date", &self.amz_date)
            .field(
                "security_token",
                &self.security_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// A request prepared for signing at a fixed instant
#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: String,
    url: Url,
    host: String,
    body: Vec<u8>,
    timestamp: DateTime<Utc>,
    scope: SigningScope,
}

impl SignedRequest {
    pub fn new(
        method: &str,
        url: &str,
        body: impl Into<Vec<u8>>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let url = Url::parse(url)?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::MalformedHost {
                host: String::new(),
            })?
            .to_string();
        let scope = SigningScope::from_host(&host)?;

        Ok(Self {
            method: method.to_uppercase(),
            url,
            host,
            body: body.into(),
            timestamp: timestamp.trunc_subsecs(0),
            scope,
        })
    }

    pub fn scope(&self) -> &SigningScope {
        &self.scope
    }

    /// ISO 8601 basic timestamp, e.g. `20150830T123600Z`
    pub fn amz_date(&self) -> String {
        self.timestamp.format("%Y%m%dT%H%M%SZ").to_string()
    }

    fn date_stamp(&self) -> String {
        self.timestamp.format("%Y%m%d").to_string()
    }

    /// `yyyymmdd/region/service/aws4_request`
    pub fn credential_scope(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.date_stamp(),
            self.scope.region,
            self.scope.service,
            SCOPE_TERMINATOR
        )
    }

    pub fn canonical_request(&self) -> String {
        [
            self.method.clone(),
            self.url.path().to_string(),
            aws_canonical_query(self.url.query().unwrap_or("")),
            format!("host:{}\n", self.host),
            SIGNED_HEADERS.to_string(),
            hex::encode(Sha256::digest(&self.body)),
        ]
        .join("\n")
    }

    pub fn string_to_sign(&self) -> String {
        let canonical = self.canonical_request();
        tracing::trace!(canonical_request = %canonical, "Built canonical request");
        [
            ALGORITHM.to_string(),
            self.amz_date(),
            self.credential_scope(),
            hex::encode(Sha256::digest(canonical.as_bytes())),
        ]
        .join("\n")
    }

    /// Derive the per-request signing key from the secret
    pub fn signing_key(&self, secret_access_key: &str) -> Vec<u8> {
        let k_date = hmac_sha256(
            format!("AWS4{}", secret_access_key).as_bytes(),
            self.date_stamp().as_bytes(),
        );
        let k_region = hmac_sha256(&k_date, self.scope.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.scope.service.as_bytes());
        hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
    }

    /// Hex-encoded signature
    pub fn signature(&self, credential: &Credential) -> String {
        let key = self.signing_key(credential.secret_access_key());
        hex::encode(hmac_sha256(&key, self.string_to_sign().as_bytes()))
    }

    pub fn headers(&self, credential: &Credential) -> SignatureHeaders {
        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            credential.access_key_id,
            self.credential_scope(),
            SIGNED_HEADERS,
            self.signature(credential)
        );
        SignatureHeaders {
            authorization,
            amz_date: self.amz_date(),
            security_token: credential.session_token.clone(),
        }
    }
}

/// Sign `method url` with `body` at the clock's current time
pub fn sign(
    method: &str,
    url: &str,
    body: &[u8],
    credential: &Credential,
    clock: &dyn Clock,
) -> Result<SignatureHeaders> {
    let request = SignedRequest::new(method, url, body, clock.now())?;
    tracing::debug!(
        method = %request.method,
        host = %request.host,
        scope = %request.credential_scope(),
        "Signing request"
    );
    Ok(request.headers(credential))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
