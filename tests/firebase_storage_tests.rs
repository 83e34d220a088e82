//! Firebase Storage adapter tests against a mock server

use nivelver_admin::application::ports::{AudioOrigin, ObjectMetadata, ObjectStore, StorageError};
use nivelver_admin::domain::audio_item::Level;
use nivelver_admin::infrastructure::FirebaseStorage;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUCKET: &str = "nivelver.appspot.com";

fn metadata() -> ObjectMetadata {
    ObjectMetadata {
        content_type: "audio/wav".to_string(),
        level: Level::A2,
        origin: AudioOrigin::Recording,
    }
}

#[tokio::test]
async fn upload_returns_tokenized_download_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v0/b/{}/o", BUCKET)))
        .and(query_param("name", "audio/A2/clip.wav"))
        .and(header("X-Goog-Upload-Protocol", "multipart"))
        .and(header("Authorization", "Bearer id-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "audio/A2/clip.wav",
            "bucket": BUCKET,
            "contentType": "audio/wav",
            "size": "4",
            "downloadTokens": "tok-1,tok-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = FirebaseStorage::with_base_url(server.uri(), BUCKET, Some("id-token".into()));
    let url = store
        .put_object("audio/A2/clip.wav", b"RIFF".to_vec(), &metadata())
        .await
        .unwrap();

    assert_eq!(
        url,
        format!(
            "{}/v0/b/{}/o/audio%2FA2%2Fclip.wav?alt=media&token=tok-1",
            server.uri(),
            BUCKET
        )
    );
}

#[tokio::test]
async fn request_body_carries_metadata_and_media() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_exists("Content-Type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "audio/A2/clip.wav",
            "downloadTokens": "tok"
        })))
        .mount(&server)
        .await;

    let store = FirebaseStorage::with_base_url(server.uri(), BUCKET, None);
    store
        .put_object("audio/A2/clip.wav", b"PCMDATA".to_vec(), &metadata())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    let content_type = request.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/related; boundary="));
    assert!(request.headers.get("authorization").is_none());

    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains(r#""name":"audio/A2/clip.wav""#));
    assert!(body.contains(r#""level":"A2""#));
    assert!(body.contains("PCMDATA"));
}

#[tokio::test]
async fn forbidden_upload_carries_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": { "code": 403, "message": "Permission denied." }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = FirebaseStorage::with_base_url(server.uri(), BUCKET, None);
    let result = store
        .put_object("audio/A2/clip.wav", vec![1, 2, 3], &metadata())
        .await;

    assert_eq!(
        result,
        Err(StorageError::Rejected("Permission denied.".to_string()))
    );
}

#[tokio::test]
async fn server_error_includes_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let store = FirebaseStorage::with_base_url(server.uri(), BUCKET, None);
    let err = store
        .put_object("audio/A2/clip.wav", vec![1], &metadata())
        .await
        .unwrap_err();

    let StorageError::Rejected(message) = err else {
        panic!("Expected Rejected, got {:?}", err);
    };
    assert!(message.contains("503"));
    assert!(message.contains("backend unavailable"));
}

#[tokio::test]
async fn missing_download_token_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "audio/A2/x.wav" })),
        )
        .mount(&server)
        .await;

    let store = FirebaseStorage::with_base_url(server.uri(), BUCKET, None);
    let result = store.put_object("audio/A2/x.wav", vec![1], &metadata()).await;

    assert!(matches!(result, Err(StorageError::ParseError(_))));
}

#[tokio::test]
async fn unreachable_server_is_a_request_failure() {
    let store = FirebaseStorage::with_base_url("http://127.0.0.1:9", BUCKET, None);
    let result = store.put_object("audio/A2/x.wav", vec![1], &metadata()).await;

    assert!(matches!(result, Err(StorageError::RequestFailed(_))));
}
