//! Firebase Storage adapter
//!
//! Uploads go through the v0 REST endpoint as a single multipart request:
//! a JSON metadata part followed by the media part. The returned download
//! token is turned into a public `alt=media` URL.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ports::{ObjectMetadata, ObjectStore, StorageError};

/// Firebase Storage API base URL
const API_BASE_URL: &str = "https://firebasestorage.googleapis.com";

// Request types for the Storage API

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResourceRequest<'a> {
    name: &'a str,
    content_type: &'a str,
    metadata: BTreeMap<&'static str, &'a str>,
}

// Response types for the Storage API

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource {
    name: String,
    download_tokens: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Object store backed by a Firebase Storage bucket
pub struct FirebaseStorage {
    base_url: String,
    bucket: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl FirebaseStorage {
    /// Create a store for `bucket`, optionally authenticated with an ID token
    pub fn new(bucket: impl Into<String>, auth_token: Option<String>) -> Self {
        Self::with_base_url(API_BASE_URL, bucket, auth_token)
    }

    /// Create a store that talks to another endpoint (emulator or test server)
    pub fn with_base_url(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            bucket: bucket.into(),
            auth_token,
            client: reqwest::Client::new(),
        }
    }

    /// `{base}/v0/b/{bucket}/o[/{object}]`
    fn object_url(&self, object: Option<&str>) -> Result<Url, StorageError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StorageError::RequestFailed(format!("Invalid base URL: {}", e)))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StorageError::RequestFailed(format!("Invalid base URL: {}", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend(["v0", "b", self.bucket.as_str(), "o"]);
            if let Some(object) = object {
                // One segment, so the slashes in the path are percent-encoded
                segments.push(object);
            }
        }
        Ok(url)
    }

    fn upload_url(&self, path: &str) -> Result<Url, StorageError> {
        let mut url = self.object_url(None)?;
        url.query_pairs_mut().append_pair("name", path);
        Ok(url)
    }

    /// Public URL of an object, authorized by its download token
    fn download_url(&self, path: &str, token: &str) -> Result<String, StorageError> {
        let mut url = self.object_url(Some(path))?;
        url.query_pairs_mut()
            .append_pair("alt", "media")
            .append_pair("token", token);
        Ok(url.into())
    }

    /// Build the `multipart/related` body: metadata JSON, then the media bytes
    fn multipart_body(
        boundary: &str,
        path: &str,
        bytes: &[u8],
        metadata: &ObjectMetadata,
    ) -> Result<Vec<u8>, StorageError> {
        let resource = ObjectResourceRequest {
            name: path,
            content_type: &metadata.content_type,
            metadata: BTreeMap::from([
                ("level", metadata.level.as_str()),
                ("origin", metadata.origin.as_str()),
            ]),
        };
        let json = serde_json::to_vec(&resource)
            .map_err(|e| StorageError::RequestFailed(format!("Invalid metadata: {}", e)))?;

        let mut body = Vec::with_capacity(bytes.len() + json.len() + 256);
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=utf-8\r\n\r\n");
        body.extend_from_slice(&json);
        body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", metadata.content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--", boundary).as_bytes());
        Ok(body)
    }

    /// Best-effort extraction of the backend's error message
    fn error_message(body: &str) -> String {
        serde_json::from_str::<ErrorResponse>(body)
            .map(|r| r.error.message)
            .unwrap_or_else(|_| body.trim().to_string())
    }
}

#[async_trait]
impl ObjectStore for FirebaseStorage {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<String, StorageError> {
        let url = self.upload_url(path)?;
        let boundary = uuid::Uuid::new_v4().simple().to_string();
        let body = Self::multipart_body(&boundary, path, &bytes, metadata)?;

        let mut request = self
            .client
            .post(url)
            .header("X-Goog-Upload-Protocol", "multipart")
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = Self::error_message(&error_text);
            return Err(match status {
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                    StorageError::Rejected(message)
                }
                _ => StorageError::Rejected(format!("HTTP {}: {}", status, message)),
            });
        }

        let resource: ObjectResource = response
            .json()
            .await
            .map_err(|e| StorageError::ParseError(e.to_string()))?;

        let token = resource
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| StorageError::ParseError("response has no download token".into()))?;

        debug!(object = %resource.name, bytes = bytes.len(), "object stored");
        self.download_url(&resource.name, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::AudioOrigin;
    use crate::domain::audio_item::Level;

    fn metadata() -> ObjectMetadata {
        ObjectMetadata {
            content_type: "audio/flac".into(),
            level: Level::B2,
            origin: AudioOrigin::Recording,
        }
    }

    #[test]
    fn upload_url_carries_name_query() {
        let store = FirebaseStorage::new("nivelver.appspot.com", None);
        let url = store.upload_url("audio/B2/x.flac").unwrap();

        assert_eq!(
            url.as_str(),
            "https://firebasestorage.googleapis.com/v0/b/nivelver.appspot.com/o?name=audio%2FB2%2Fx.flac"
        );
    }

    #[test]
    fn download_url_encodes_object_path() {
        let store = FirebaseStorage::with_base_url("http://127.0.0.1:9199/", "bucket", None);
        let url = store.download_url("audio/A1/a b.wav", "tok").unwrap();

        assert_eq!(
            url,
            "http://127.0.0.1:9199/v0/b/bucket/o/audio%2FA1%2Fa%20b.wav?alt=media&token=tok"
        );
    }

    #[test]
    fn multipart_body_has_metadata_then_media() {
        let body =
            FirebaseStorage::multipart_body("BOUNDARY", "audio/B2/x.flac", b"fLaC", &metadata())
                .unwrap();
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with("--BOUNDARY\r\nContent-Type: application/json"));
        assert!(text.contains(r#""contentType":"audio/flac""#));
        assert!(text.contains(r#""level":"B2""#));
        assert!(text.contains(r#""origin":"recording""#));
        assert!(text.contains("Content-Type: audio/flac\r\n\r\nfLaC\r\n--BOUNDARY--"));
    }

    #[test]
    fn error_message_prefers_api_message() {
        let body = r#"{"error":{"code":403,"message":"Permission denied."}}"#;
        assert_eq!(FirebaseStorage::error_message(body), "Permission denied.");
        assert_eq!(FirebaseStorage::error_message(" bad gateway "), "bad gateway");
    }
}
