//! S3 object store over the REST API.
//!
//! Whole-object GET/PUT against one bucket/key, signed with SigV4. AWS proper
//! uses virtual-hosted addressing; a custom endpoint (MinIO, localstack, R2)
//! switches to path-style.

use super::sigv4::{sha256_hex, Signer};
use super::{ObjectStore, StoreError};
use crate::uri::encode_path;
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Access key pair plus optional STS session token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env` with a custom variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Some(Self {
            access_key_id: get("AWS_ACCESS_KEY_ID")?,
            secret_access_key: get("AWS_SECRET_ACCESS_KEY")?,
            session_token: get("AWS_SESSION_TOKEN"),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where the artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
    pub region: String,
    /// Custom endpoint such as `http://localhost:9000`; enables path-style URLs.
    pub endpoint: Option<String>,
}

pub struct S3Store {
    client: Client,
    location: S3Location,
    credentials: Option<Credentials>,
    url: Url,
    host: String,
    canonical_uri: String,
}

impl S3Store {
    /// Build a store. Missing credentials are not an error here; every request
    /// fails with `MissingCredentials` instead.
    pub fn new(
        location: S3Location,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let key = encode_path(location.key.trim_start_matches('/'), true);

        let (url, canonical_uri) = match &location.endpoint {
            Some(endpoint) => {
                let path = format!("/{}/{key}", encode_path(&location.bucket, false));
                let base = endpoint.trim_end_matches('/');
                (format!("{base}{path}"), path)
            }
            None => {
                let path = format!("/{key}");
                (
                    format!(
                        "https://{}.s3.{}.amazonaws.com{path}",
                        location.bucket, location.region
                    ),
                    path,
                )
            }
        };
        let url = Url::parse(&url).map_err(|e| StoreError::InvalidEndpoint(format!("{url}: {e}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{h}:{p}"),
            (Some(h), None) => h.to_string(),
            (None, _) => return Err(StoreError::InvalidEndpoint(format!("{url}: no host"))),
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            location,
            credentials,
            url,
            host,
            canonical_uri,
        })
    }

    pub fn s3_location(&self) -> &S3Location {
        &self.location
    }

    /// Request URL (exposed for diagnostics).
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn send(
        &self,
        method: Method,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<Response, StoreError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(StoreError::MissingCredentials)?;

        let amz_date = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let payload_hash = sha256_hex(&body);

        let mut signed: Vec<(&str, &str)> = vec![
            ("host", self.host.as_str()),
            ("x-amz-content-sha256", payload_hash.as_str()),
            ("x-amz-date", amz_date.as_str()),
        ];
        if let Some(token) = &creds.session_token {
            signed.push(("x-amz-security-token", token.as_str()));
        }

        let signer = Signer {
            access_key_id: &creds.access_key_id,
            secret_access_key: &creds.secret_access_key,
            region: &self.location.region,
            service: "s3",
        };
        let authorization = signer.authorization(
            method.as_str(),
            &self.canonical_uri,
            "",
            &signed,
            &payload_hash,
            &amz_date,
        );

        debug!("{method} {}", self.url);
        let mut req = self
            .client
            .request(method, self.url.clone())
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date)
            .header(AUTHORIZATION, authorization);
        if let Some(token) = &creds.session_token {
            req = req.header("x-amz-security-token", token);
        }
        if let Some(ct) = content_type {
            req = req.header(CONTENT_TYPE, ct);
        }

        req.body(body)
            .send()
            .map_err(|e| StoreError::Network(e.to_string()))
    }

    fn status_error(&self, resp: Response) -> StoreError {
        let status = resp.status();
        match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(self.location()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Auth {
                location: self.location(),
                status: status.as_u16(),
            },
            _ => {
                let body = resp.text().unwrap_or_default();
                StoreError::Http {
                    status: status.as_u16(),
                    location: self.location(),
                    message: body.chars().take(200).collect(),
                }
            }
        }
    }
}

impl ObjectStore for S3Store {
    fn location(&self) -> String {
        format!("s3://{}/{}", self.location.bucket, self.location.key)
    }

    fn get(&self) -> Result<Vec<u8>, StoreError> {
        let resp = self.send(Method::GET, Vec::new(), None)?;
        if !resp.status().is_success() {
            return Err(self.status_error(resp));
        }
        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| StoreError::Network(e.to_string()))
    }

    fn put(&self, bytes: &[u8], content_type: &str) -> Result<(), StoreError> {
        let resp = self.send(Method::PUT, bytes.to_vec(), Some(content_type))?;
        if !resp.status().is_success() {
            return Err(self.status_error(resp));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn location(endpoint: Option<&str>) -> S3Location {
        S3Location {
            bucket: "chian-macro-data".into(),
            key: "macroresult.csv".into(),
            region: "ap-east-1".into(),
            endpoint: endpoint.map(String::from),
        }
    }

    #[test]
    fn virtual_hosted_url_for_aws() {
        let store = S3Store::new(location(None), None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            store.url().as_str(),
            "https://chian-macro-data.s3.ap-east-1.amazonaws.com/macroresult.csv"
        );
        assert_eq!(store.host, "chian-macro-data.s3.ap-east-1.amazonaws.com");
        assert_eq!(store.canonical_uri, "/macroresult.csv");
        assert_eq!(store.location(), "s3://chian-macro-data/macroresult.csv");
    }

    #[test]
    fn path_style_url_for_custom_endpoint() {
        let store = S3Store::new(
            location(Some("http://localhost:9000/")),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            store.url().as_str(),
            "http://localhost:9000/chian-macro-data/macroresult.csv"
        );
        assert_eq!(store.host, "localhost:9000");
        assert_eq!(store.canonical_uri, "/chian-macro-data/macroresult.csv");
    }

    #[test]
    fn bad_endpoint_is_rejected() {
        let result = S3Store::new(location(Some("not a url")), None, Duration::from_secs(5));
        assert!(matches!(result, Err(StoreError::InvalidEndpoint(_))));
    }

    #[test]
    fn requests_without_credentials_fail_before_network() {
        let store = S3Store::new(location(None), None, Duration::from_secs(5)).unwrap();
        assert!(matches!(store.get(), Err(StoreError::MissingCredentials)));
        assert!(matches!(
            store.put(b"x", "text/csv"),
            Err(StoreError::MissingCredentials)
        ));
    }

    #[test]
    fn credentials_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("AWS_ACCESS_KEY_ID", "AKID"),
            ("AWS_SECRET_ACCESS_KEY", "hunter2"),
            ("AWS_SESSION_TOKEN", ""),
        ]
        .into_iter()
        .collect();
        let creds = Credentials::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.access_key_id, "AKID");
        assert_eq!(creds.session_token, None);
        assert!(!format!("{creds:?}").contains("hunter2"));

        let missing = Credentials::from_lookup(|k| {
            (k == "AWS_ACCESS_KEY_ID").then(|| "AKID".to_string())
        });
        assert!(missing.is_none());
    }
}
