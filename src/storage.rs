//! Object-storage collaborator.
//!
//! The retrieval core needs exactly two primitives from its backend:
//! "does this object exist" and "fetch this object's bytes". Both are
//! expressed through the [`ObjectStore`] trait so the query engine can be
//! driven by a real S3-compatible backend in production and an in-memory
//! map in tests.
//!
//! [`S3Store`] talks to the S3 REST API directly with AWS Signature V4
//! authentication, using only pure-Rust dependencies (`hmac`, `sha2`) for
//! signing. Custom endpoints (MinIO, LocalStack) are supported via
//! path-style addressing.
//!
//! Credentials are read from environment variables:
//! - `AWS_ACCESS_KEY_ID` — required
//! - `AWS_SECRET_ACCESS_KEY` — required
//! - `AWS_SESSION_TOKEN` — optional (temporary credentials)

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::StorageError;

/// Minimal object-storage interface consumed by the retrieval core.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether an object exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Fetches an object's full contents. Fails with
    /// [`StorageError::NotFound`] if the key does not exist — including
    /// when it vanished between an `exists` check and this call.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

type HmacSha256 = Hmac<Sha256>;

// ============ S3-compatible store ============

/// AWS credentials loaded from environment variables.
struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl AwsCredentials {
    fn from_env() -> Result<Self, StorageError> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID").map_err(|_| {
            StorageError::Backend("AWS_ACCESS_KEY_ID environment variable not set".to_string())
        })?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY").map_err(|_| {
            StorageError::Backend("AWS_SECRET_ACCESS_KEY environment variable not set".to_string())
        })?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }
}

/// S3-compatible object store using signed REST requests.
pub struct S3Store {
    config: StorageConfig,
    creds: AwsCredentials,
    client: reqwest::Client,
}

impl S3Store {
    /// Builds a store from configuration, reading credentials from the
    /// environment. The per-request timeout bounds every `exists` and
    /// `fetch` call.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let creds = AwsCredentials::from_env()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(Self {
            config,
            creds,
            client,
        })
    }

    /// Resolves (scheme, host, canonical URI path) for an object key.
    ///
    /// With a custom endpoint, path-style addressing is used
    /// (`/{bucket}/{key}`); otherwise virtual-hosted addressing
    /// (`{bucket}.s3.{region}.amazonaws.com/{key}`).
    fn object_location(&self, key: &str) -> (String, String, String) {
        let encoded_key: String = key.split('/').map(uri_encode).collect::<Vec<_>>().join("/");

        match self.config.endpoint_url {
            Some(ref endpoint) => {
                let scheme = if endpoint.starts_with("http://") {
                    "http"
                } else {
                    "https"
                };
                let host = endpoint
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/')
                    .to_string();
                let path = format!("/{}/{}", uri_encode(&self.config.bucket), encoded_key);
                (scheme.to_string(), host, path)
            }
            None => {
                let host = format!(
                    "{}.s3.{}.amazonaws.com",
                    self.config.bucket, self.config.region
                );
                ("https".to_string(), host, format!("/{}", encoded_key))
            }
        }
    }

    /// Builds a SigV4-signed request with an empty payload.
    fn signed_request(&self, method: reqwest::Method, key: &str) -> reqwest::RequestBuilder {
        let (scheme, host, canonical_uri) = self.object_location(key);
        let url = format!("{}://{}{}", scheme, host, canonical_uri);

        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let payload_hash = hex_sha256(b"");

        let mut headers = vec![
            ("host".to_string(), host),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(ref token) = self.creds.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers: String = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v))
            .collect();

        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method.as_str(),
            canonical_uri,
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = derive_signing_key(
            &self.creds.secret_access_key,
            &date_stamp,
            &self.config.region,
            "s3",
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.creds.access_key_id, credential_scope, signed_headers, signature
        );

        let mut req = self
            .client
            .request(method, &url)
            .header("Authorization", &authorization)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date);

        if let Some(ref token) = self.creds.session_token {
            req = req.header("x-amz-security-token", token);
        }

        req
    }
}

fn map_request_error(key: &str, err: reqwest::Error) -> StorageError {
    if err.is_timeout() {
        StorageError::Timeout(format!("request for '{}' timed out: {}", key, err))
    } else {
        StorageError::Backend(format!("request for '{}' failed: {}", key, err))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let resp = self
            .signed_request(reqwest::Method::HEAD, key)
            .send()
            .await
            .map_err(|e| map_request_error(key, e))?;

        let status = resp.status();
        debug!(key, %status, "HEAD object");

        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(StorageError::Backend(format!(
                "HEAD '{}' failed (HTTP {})",
                key, status
            )))
        }
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let resp = self
            .signed_request(reqwest::Method::GET, key)
            .send()
            .await
            .map_err(|e| map_request_error(key, e))?;

        let status = resp.status();
        debug!(key, %status, "GET object");

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            return Err(StorageError::Backend(format!(
                "GET '{}' failed (HTTP {})",
                key, status
            )));
        }

        let bytes = resp.bytes().await.map_err(|e| map_request_error(key, e))?;
        Ok(bytes.to_vec())
    }
}

// ============ AWS SigV4 helpers ============

/// Compute the hex-encoded SHA-256 hash of data.
fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute HMAC-SHA256 of data with the given key.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Compute hex-encoded HMAC-SHA256.
fn hex_hmac_sha256(key: &[u8], data: &[u8]) -> String {
    hex::encode(hmac_sha256(key, data))
}

/// Derive the AWS SigV4 signing key for a given date, region, and service.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, dateStamp)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// URI-encode a string per RFC 3986 (used in SigV4 canonical requests).
///
/// Encodes all characters except unreserved characters:
/// `A-Z a-z 0-9 - _ . ~`
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

// ============ In-memory store ============

/// In-memory object store for tests. Keys map directly to byte buffers.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object, replacing any previous contents at `key`.
    pub fn put(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.objects
            .write()
            .expect("memory store lock poisoned")
            .insert(key.into(), bytes.into());
    }

    /// Removes an object, used to simulate the vanish-between-calls race.
    pub fn remove(&self, key: &str) {
        self.objects
            .write()
            .expect("memory store lock poisoned")
            .remove(key);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self
            .objects
            .read()
            .expect("memory store lock poisoned")
            .contains_key(key))
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .expect("memory store lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.put("a/b/c.csv", b"payload".to_vec());

        assert!(store.exists("a/b/c.csv").await.unwrap());
        assert!(!store.exists("a/b/d.csv").await.unwrap());
        assert_eq!(store.fetch("a/b/c.csv").await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_memory_store_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.fetch("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(key) if key == "nope"));
    }

    #[test]
    fn test_derive_signing_key_matches_aws_doc_vector() {
        // Known-answer vector from the AWS SigV4 documentation.
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20150830",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn test_uri_encode_preserves_unreserved() {
        assert_eq!(uri_encode("dockan-1_a.b~c"), "dockan-1_a.b~c");
        assert_eq!(uri_encode("a b"), "a%20b");
        assert_eq!(uri_encode("å"), "%C3%A5");
    }

    fn test_store(endpoint: Option<&str>) -> S3Store {
        S3Store {
            config: StorageConfig {
                endpoint_url: endpoint.map(str::to_string),
                region: "eu-north-1".to_string(),
                bucket: "iotbackend".to_string(),
                timeout_secs: 30,
            },
            creds: AwsCredentials {
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: None,
            },
            client: reqwest::Client::new(),
        }
    }

    #[test]
    fn test_virtual_hosted_location() {
        let store = test_store(None);
        let (scheme, host, path) = store.object_location("dockan/humidity/2019-01-10.csv");
        assert_eq!(scheme, "https");
        assert_eq!(host, "iotbackend.s3.eu-north-1.amazonaws.com");
        assert_eq!(path, "/dockan/humidity/2019-01-10.csv");
    }

    #[test]
    fn test_path_style_location_for_custom_endpoint() {
        let store = test_store(Some("http://localhost:9000"));
        let (scheme, host, path) = store.object_location("metadata.csv");
        assert_eq!(scheme, "http");
        assert_eq!(host, "localhost:9000");
        assert_eq!(path, "/iotbackend/metadata.csv");
    }
}
