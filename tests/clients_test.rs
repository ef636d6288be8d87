//! 增强服务客户端测试（wiremock 模拟远端服务）

use enrich_batch::clients::{
    CaptioningClient, DocumentPayload, EnrichmentClient, FaceClient, OcrClient,
};
use enrich_batch::models::{FaceMatch, StepResult};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload() -> DocumentPayload {
    DocumentPayload::new("scan-001.jpg", b"fake image bytes".to_vec())
}

async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(response)
        .expect(1)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_caption_success_is_cleaned() {
    let server = serve(
        "/caption",
        ResponseTemplate::new(200).set_body_json(json!({
            "caption": "a dog dog, running on the beach",
            "tags": ["dog", "beach"]
        })),
    )
    .await;
    let client = CaptioningClient::with_url(
        reqwest::Client::new(),
        format!("{}/caption", server.uri()),
    );

    let result = client.invoke(&payload()).await.unwrap();
    assert_eq!(
        result,
        StepResult::Caption {
            text: "a dog, running on the beach".to_string(),
            tags: vec!["dog".to_string(), "beach".to_string()],
        }
    );
}

#[tokio::test]
async fn test_empty_caption_is_permanent() {
    let server = serve(
        "/caption",
        ResponseTemplate::new(200).set_body_json(json!({ "caption": "  " })),
    )
    .await;
    let client = CaptioningClient::with_url(
        reqwest::Client::new(),
        format!("{}/caption", server.uri()),
    );

    let err = client.invoke(&payload()).await.unwrap_err();
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_ocr_success_and_empty_text() {
    let server = serve(
        "/ocr",
        ResponseTemplate::new(200).set_body_json(json!({ "text": "  INVOICE 42\n" })),
    )
    .await;
    let client = OcrClient::with_url(reqwest::Client::new(), format!("{}/ocr", server.uri()));
    assert_eq!(
        client.invoke(&payload()).await.unwrap(),
        StepResult::Ocr("INVOICE 42".to_string())
    );

    let empty = serve(
        "/ocr",
        ResponseTemplate::new(200).set_body_json(json!({ "text": "" })),
    )
    .await;
    let client = OcrClient::with_url(reqwest::Client::new(), format!("{}/ocr", empty.uri()));
    assert_eq!(
        client.invoke(&payload()).await.unwrap(),
        StepResult::Ocr(String::new())
    );
}

#[tokio::test]
async fn test_face_success() {
    let server = serve(
        "/faces",
        ResponseTemplate::new(200).set_body_json(json!({
            "faces": [
                { "name": "Grace Hopper", "confidence": 0.97 },
                { "name": "Unknown" }
            ]
        })),
    )
    .await;
    let client = FaceClient::with_url(reqwest::Client::new(), format!("{}/faces", server.uri()));

    let result = client.invoke(&payload()).await.unwrap();
    assert_eq!(
        result,
        StepResult::Faces(vec![
            FaceMatch {
                name: "Grace Hopper".to_string(),
                confidence: Some(0.97),
            },
            FaceMatch {
                name: "Unknown".to_string(),
                confidence: None,
            },
        ])
    );
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let server = serve("/ocr", ResponseTemplate::new(503).set_body_string("overloaded")).await;
    let client = OcrClient::with_url(reqwest::Client::new(), format!("{}/ocr", server.uri()));

    let err = client.invoke(&payload()).await.unwrap_err();
    assert!(err.is_transient());
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_client_error_is_permanent() {
    let server = serve(
        "/faces",
        ResponseTemplate::new(422).set_body_string("unsupported image format"),
    )
    .await;
    let client = FaceClient::with_url(reqwest::Client::new(), format!("{}/faces", server.uri()));

    let err = client.invoke(&payload()).await.unwrap_err();
    assert!(!err.is_transient());
    assert!(err.to_string().contains("422"));
}

#[tokio::test]
async fn test_missing_faces_key_means_no_faces() {
    let server = serve("/faces", ResponseTemplate::new(200).set_body_json(json!({}))).await;
    let client = FaceClient::with_url(reqwest::Client::new(), format!("{}/faces", server.uri()));

    assert_eq!(
        client.invoke(&payload()).await.unwrap(),
        StepResult::Faces(vec![])
    );
}

#[tokio::test]
async fn test_malformed_json_is_permanent() {
    let server = serve(
        "/faces",
        ResponseTemplate::new(200).set_body_json(json!({ "faces": "x" })),
    )
    .await;
    let client = FaceClient::with_url(reqwest::Client::new(), format!("{}/faces", server.uri()));

    let err = client.invoke(&payload()).await.unwrap_err();
    assert!(!err.is_transient());

    let server = serve("/ocr", ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;
    let client = OcrClient::with_url(reqwest::Client::new(), format!("{}/ocr", server.uri()));

    let err = client.invoke(&payload()).await.unwrap_err();
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_unreachable_service_is_transient() {
    // 启动后立即关闭，端口不再监听
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let client = OcrClient::with_url(reqwest::Client::new(), format!("{}/ocr", uri));

    let err = client.invoke(&payload()).await.unwrap_err();
    assert!(err.is_transient());
}
