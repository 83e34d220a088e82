//! Cloud Firestore document store adapter
//!
//! Talks to the Firestore v1 REST API. Records are serialized with serde
//! and re-wrapped in Firestore's typed value envelope on the way out.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::debug;

use crate::application::ports::{DocumentStore, PersistenceError};
use crate::domain::audio_item::{AudioItemRecord, StoredAudioItem};

/// Firestore API base URL
const API_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Database every project gets by default
const DATABASE: &str = "(default)";

// Wire types for the Firestore API

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct MapValue {
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::NullValue(()),
            Json::Bool(b) => Value::BooleanValue(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::IntegerValue(i.to_string()),
                None => Value::DoubleValue(n.as_f64().unwrap_or_default()),
            },
            Json::String(s) => Value::StringValue(s),
            Json::Array(items) => Value::ArrayValue(ArrayValue {
                values: items.into_iter().map(Value::from).collect(),
            }),
            Json::Object(map) => Value::MapValue(MapValue {
                fields: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            }),
        }
    }
}

impl From<Value> for Json {
    fn from(value: Value) -> Self {
        match value {
            Value::NullValue(()) => Json::Null,
            Value::BooleanValue(b) => Json::Bool(b),
            Value::IntegerValue(s) => s.parse::<i64>().map(Json::from).unwrap_or(Json::String(s)),
            Value::DoubleValue(f) => serde_json::Number::from_f64(f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::TimestampValue(s) | Value::StringValue(s) => Json::String(s),
            Value::ArrayValue(array) => Json::Array(array.values.into_iter().map(Json::from).collect()),
            Value::MapValue(map) => Json::Object(
                map.fields
                    .into_iter()
                    .map(|(k, v)| (k, Json::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Document store backed by Cloud Firestore
pub struct FirestoreDocumentStore {
    base_url: String,
    project_id: String,
    api_key: Option<String>,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl FirestoreDocumentStore {
    pub fn new(
        project_id: impl Into<String>,
        api_key: Option<String>,
        auth_token: Option<String>,
    ) -> Self {
        Self::with_base_url(API_BASE_URL, project_id, api_key, auth_token)
    }

    /// Create a store that talks to another endpoint (emulator or test server)
    pub fn with_base_url(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        api_key: Option<String>,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            project_id: project_id.into(),
            api_key,
            auth_token,
            client: reqwest::Client::new(),
        }
    }

    /// `{base}/projects/{project}/databases/(default)/documents/{collection}[/{id}]`
    fn documents_url(&self, collection: &str, id: Option<&str>) -> Result<Url, PersistenceError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PersistenceError::RequestFailed(format!("Invalid base URL: {}", e)))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                PersistenceError::RequestFailed(format!("Invalid base URL: {}", self.base_url))
            })?;
            segments.pop_if_empty().extend([
                "projects",
                self.project_id.as_str(),
                "databases",
                DATABASE,
                "documents",
                collection,
            ]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(request: RequestBuilder) -> Result<Response, PersistenceError> {
        request
            .send()
            .await
            .map_err(|e| PersistenceError::RequestFailed(e.to_string()))
    }

    /// Map a non-success response onto the port's error kinds
    async fn error_for(response: Response) -> PersistenceError {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorResponse>(&error_text)
            .map(|r| r.error.message)
            .unwrap_or_else(|_| error_text.trim().to_string());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                PersistenceError::PermissionDenied(message)
            }
            StatusCode::NOT_FOUND => PersistenceError::NotFound(message),
            _ => PersistenceError::ApiError(format!("HTTP {}: {}", status, message)),
        }
    }

    fn encode(record: &AudioItemRecord) -> Result<Document, PersistenceError> {
        let json = serde_json::to_value(record)
            .map_err(|e| PersistenceError::ParseError(e.to_string()))?;
        let Json::Object(map) = json else {
            return Err(PersistenceError::ParseError(
                "record did not serialize to a map".into(),
            ));
        };
        Ok(Document {
            name: None,
            fields: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
        })
    }

    fn decode(document: Document) -> Result<StoredAudioItem, PersistenceError> {
        let id = document
            .name
            .as_deref()
            .and_then(|name| name.rsplit('/').next())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PersistenceError::ParseError("document has no name".into()))?
            .to_string();

        let fields = Json::Object(
            document
                .fields
                .into_iter()
                .map(|(k, v)| (k, Json::from(v)))
                .collect(),
        );
        let record = serde_json::from_value::<AudioItemRecord>(fields)
            .map_err(|e| PersistenceError::ParseError(format!("document {}: {}", id, e)))?;

        Ok(StoredAudioItem { id, record })
    }

    async fn read_document(response: Response) -> Result<Document, PersistenceError> {
        response
            .json()
            .await
            .map_err(|e| PersistenceError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn create(
        &self,
        collection: &str,
        record: &AudioItemRecord,
    ) -> Result<String, PersistenceError> {
        let url = self.documents_url(collection, None)?;
        let body = Self::encode(record)?;

        let response = Self::send(self.request(Method::POST, url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let stored = Self::decode(Self::read_document(response).await?)?;
        debug!(collection, id = %stored.id, "document created");
        Ok(stored.id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        record: &AudioItemRecord,
    ) -> Result<(), PersistenceError> {
        let mut url = self.documents_url(collection, Some(id))?;
        // Fail instead of silently creating a document under a stale id
        url.query_pairs_mut()
            .append_pair("currentDocument.exists", "true");
        let body = Self::encode(record)?;

        let response = Self::send(self.request(Method::PATCH, url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(match Self::error_for(response).await {
                PersistenceError::NotFound(_) => PersistenceError::NotFound(id.to_string()),
                other => other,
            });
        }

        debug!(collection, id, "document updated");
        Ok(())
    }

    async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<StoredAudioItem>, PersistenceError> {
        let url = self.documents_url(collection, Some(id))?;

        let response = Self::send(self.request(Method::GET, url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        Self::decode(Self::read_document(response).await?).map(Some)
    }
}
